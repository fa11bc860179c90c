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

mod slicing;

pub use slicing::doc_slice;
pub use slicing::segment_slice;
pub use slicing::PartialLeafRange;
pub use slicing::MAX_DOCS_PER_SLICE;
pub use slicing::MAX_SEGMENTS_PER_SLICE;

use std::sync::Arc;

use common_datablocks::Block;
use common_datablocks::Page;
use common_datablocks::Scalar;
use common_exception::ErrorCode;
use common_exception::Result;
use common_pipeline::Operator;

use crate::reader::BulkScorer;
use crate::reader::IndexReader;
use crate::reader::LeafContext;
use crate::reader::Query;
use crate::reader::ScoreMode;
use crate::reader::Weight;

/// `16 KiB / 4 bytes per doc id` (§4.3).
pub const DEFAULT_MAX_PAGE_SIZE: usize = 16384 / 4;

/// Config for constructing a [`SourceOperator`] — the "operator
/// factory surface" of §6.
#[derive(Clone, Copy, Debug)]
pub struct SourceConfig {
    pub shard_id: u32,
    pub max_page_size: usize,
}

impl SourceConfig {
    pub fn new(shard_id: u32) -> Self {
        SourceConfig {
            shard_id,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }
}

enum State {
    Unweighted,
    /// Looking for a bulk scorer over `slice[slice_idx]`.
    Scanning,
    Emitting {
        scorer: Box<dyn BulkScorer>,
        cursor: u32,
    },
    Done,
}

/// Converts matched document ids from an inverted-index reader into
/// pages (§4.3). A `SourceOperator` is bound to one disjoint document
/// slice; parallel execution comes from running one `SourceOperator`
/// per slice in its own pipeline (§5).
pub struct SourceOperator {
    reader: Arc<dyn IndexReader>,
    query: Box<dyn Query>,
    config: SourceConfig,
    slice: Vec<PartialLeafRange>,
    slice_idx: usize,
    weight: Option<Arc<dyn Weight>>,
    state: State,
    buffer: Vec<i64>,
    closed: bool,
}

impl SourceOperator {
    pub fn create(
        reader: Arc<dyn IndexReader>,
        query: Box<dyn Query>,
        slice: Vec<PartialLeafRange>,
        config: SourceConfig,
    ) -> Self {
        SourceOperator {
            reader,
            query,
            config,
            slice,
            slice_idx: 0,
            weight: None,
            state: State::Unweighted,
            buffer: Vec::with_capacity(config.max_page_size),
            closed: false,
        }
    }

    fn min_page_size(&self) -> usize {
        self.config.max_page_size / 2
    }

    /// Replaces the work assigned to this (not-yet-scanned) source.
    /// Fails once the weight has been realized (§4.3 "Slicing is a
    /// one-shot partition").
    pub fn assign_slice(&mut self, slice: Vec<PartialLeafRange>) -> Result<()> {
        if !matches!(self.state, State::Unweighted) {
            return Err(ErrorCode::ContractViolation(
                "cannot re-slice a source whose weight is already realized",
            ));
        }
        self.slice = slice;
        Ok(())
    }

    fn leaf_context(&self, leaf_ord: usize) -> Result<LeafContext> {
        self.reader
            .leaves()
            .iter()
            .find(|l| l.ord == leaf_ord)
            .copied()
            .ok_or_else(|| ErrorCode::ReaderIo(format!("no such leaf ordinal {}", leaf_ord)))
    }

    fn realize_weight(&mut self) -> Result<()> {
        let rewritten = self.query.rewrite(self.reader.as_ref())?;
        let weight = rewritten.create_weight(self.reader.as_ref(), ScoreMode::CompleteNoScores)?;
        self.weight = Some(Arc::from(weight));
        Ok(())
    }

    fn flush(&mut self, leaf_ord: usize) -> Result<Page> {
        let doc_ids = std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.config.max_page_size),
        );
        let n = doc_ids.len();
        Page::try_create(vec![
            Block::Long(doc_ids),
            Block::Constant(Scalar::Long(leaf_ord as i64), n),
            Block::Constant(Scalar::Long(self.config.shard_id as i64), n),
        ])
    }
}

impl Operator for SourceOperator {
    fn name(&self) -> &'static str {
        "source"
    }

    fn is_finished(&self) -> bool {
        matches!(self.state, State::Done)
    }

    fn get_output(&mut self) -> Result<Option<Page>> {
        loop {
            match &self.state {
                State::Done => return Ok(None),
                State::Unweighted => {
                    self.realize_weight()?;
                    self.state = State::Scanning;
                }
                State::Scanning => {
                    if self.slice_idx >= self.slice.len() {
                        self.state = State::Done;
                        continue;
                    }
                    let partial = self.slice[self.slice_idx];
                    let leaf = self.leaf_context(partial.leaf_ord)?;
                    let weight = self.weight.clone().expect("weight realized above");
                    match weight.bulk_scorer(&leaf)? {
                        None => {
                            self.slice_idx += 1;
                        }
                        Some(scorer) => {
                            self.state = State::Emitting {
                                scorer,
                                cursor: partial.min_doc,
                            };
                        }
                    }
                }
                State::Emitting { .. } => {
                    let partial = self.slice[self.slice_idx];
                    let next_cursor = {
                        let (scorer, cursor) = match &mut self.state {
                            State::Emitting { scorer, cursor } => (scorer, cursor),
                            _ => unreachable!(),
                        };
                        let remaining_capacity = self.config.max_page_size - self.buffer.len();
                        let end = cursor
                            .saturating_add(remaining_capacity as u32)
                            .min(partial.max_doc);

                        let mut collected = Vec::new();
                        let next =
                            scorer.collect(*cursor, end, &mut |doc| collected.push(doc as i64))?;
                        self.buffer.extend(collected);
                        next
                    };

                    let leaf_exhausted = next_cursor >= partial.max_doc;
                    let at_capacity = self.buffer.len() >= self.config.max_page_size;
                    let should_flush =
                        leaf_exhausted || at_capacity || self.buffer.len() >= self.min_page_size();

                    if leaf_exhausted {
                        self.slice_idx += 1;
                        self.state = State::Scanning;
                    } else if let State::Emitting { cursor, .. } = &mut self.state {
                        *cursor = next_cursor;
                    }

                    if should_flush {
                        return Ok(Some(self.flush(partial.leaf_ord)?));
                    }
                }
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            tracing::warn!("source operator closed twice; ignoring");
            return Ok(());
        }
        self.closed = true;
        self.state = State::Done;
        Ok(())
    }
}
