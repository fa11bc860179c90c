// Copyright 2022 Datafuse Labs.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The narrow external-interface traits the source operator consumes
//! from the inverted-index reader and the query planner (§6). These
//! are out-of-scope collaborators; the core only depends on the shapes
//! named here.

use common_exception::Result;

/// One segment ("leaf") of an index shard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafContext {
    pub ord: usize,
    pub max_doc: u32,
}

/// Scores (here: only matches, since the core always rewrites with
/// `CompleteNoScores`) documents within one leaf, advancing in bulk.
pub trait BulkScorer {
    /// Collects doc ids in `[start, end)` that match, feeding each to
    /// `collector`. Returns the next undone position, which equals
    /// `end` when every candidate in `[start, end)` has been visited.
    fn collect(&mut self, start: u32, end: u32, collector: &mut dyn FnMut(u32)) -> Result<u32>;
}

/// A query rewritten against a reader, ready to produce per-leaf
/// scorers (§6 "Query").
pub trait Weight {
    fn bulk_scorer(&self, leaf: &LeafContext) -> Result<Option<Box<dyn BulkScorer>>>;
}

/// Selects scoring behavior when building a [`Weight`]. The source
/// operator only ever asks for `CompleteNoScores` (§4.3 step 1):
/// constant-score, no relevance computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreMode {
    CompleteNoScores,
}

/// An opaque, rewriteable query value (§6 "Query (consumed)").
pub trait Query {
    fn rewrite(&self, reader: &dyn IndexReader) -> Result<Box<dyn Query>>;
    fn create_weight(&self, reader: &dyn IndexReader, mode: ScoreMode) -> Result<Box<dyn Weight>>;
}

/// The inverted-index reader the source operator scans (§6 "Index
/// reader (consumed)").
pub trait IndexReader {
    fn leaves(&self) -> &[LeafContext];

    fn max_doc(&self) -> u32 {
        self.leaves().iter().map(|leaf| leaf.max_doc).sum()
    }
}
