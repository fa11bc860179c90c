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

use std::sync::Arc;

use common_exception::Result;
use common_pipeline::Operator;
use pretty_assertions::assert_eq;
use qcore::source::doc_slice;
use qcore::BulkScorer;
use qcore::IndexReader;
use qcore::LeafContext;
use qcore::Query;
use qcore::ScoreMode;
use qcore::SourceConfig;
use qcore::SourceOperator;
use qcore::Weight;

struct FixedReader {
    leaves: Vec<LeafContext>,
}

impl IndexReader for FixedReader {
    fn leaves(&self) -> &[LeafContext] {
        &self.leaves
    }
}

/// Matches every document in `[start, end)`, as `COMPLETE_NO_SCORES`
/// never needs a relevance computation.
struct MatchAllScorer;

impl BulkScorer for MatchAllScorer {
    fn collect(&mut self, start: u32, end: u32, collector: &mut dyn FnMut(u32)) -> Result<u32> {
        for doc in start..end {
            collector(doc);
        }
        Ok(end)
    }
}

struct MatchAllWeight;
impl Weight for MatchAllWeight {
    fn bulk_scorer(&self, _leaf: &LeafContext) -> Result<Option<Box<dyn BulkScorer>>> {
        Ok(Some(Box::new(MatchAllScorer)))
    }
}

struct MatchAllQuery;
impl Query for MatchAllQuery {
    fn rewrite(&self, _reader: &dyn IndexReader) -> Result<Box<dyn Query>> {
        Ok(Box::new(MatchAllQuery))
    }

    fn create_weight(&self, _reader: &dyn IndexReader, _mode: ScoreMode) -> Result<Box<dyn Weight>> {
        Ok(Box::new(MatchAllWeight))
    }
}

struct EmptyWeight;
impl Weight for EmptyWeight {
    fn bulk_scorer(&self, _leaf: &LeafContext) -> Result<Option<Box<dyn BulkScorer>>> {
        Ok(None)
    }
}

struct EmptyQuery;
impl Query for EmptyQuery {
    fn rewrite(&self, _reader: &dyn IndexReader) -> Result<Box<dyn Query>> {
        Ok(Box::new(EmptyQuery))
    }

    fn create_weight(&self, _reader: &dyn IndexReader, _mode: ScoreMode) -> Result<Box<dyn Weight>> {
        Ok(Box::new(EmptyWeight))
    }
}

#[test]
fn test_source_empty_query_emits_no_pages() {
    let reader: Arc<dyn IndexReader> = Arc::new(FixedReader {
        leaves: vec![
            LeafContext { ord: 0, max_doc: 400 },
            LeafContext { ord: 1, max_doc: 300 },
            LeafContext { ord: 2, max_doc: 300 },
        ],
    });
    let slice = doc_slice(reader.as_ref(), 1).unwrap().remove(0);
    let mut source = SourceOperator::create(
        reader,
        Box::new(EmptyQuery),
        slice,
        SourceConfig::new(0),
    );

    let first = source.get_output().unwrap();
    assert!(first.is_none());
    assert!(source.is_finished());
}

#[test]
fn test_source_match_all_pages_at_max_page_size() {
    let reader: Arc<dyn IndexReader> = Arc::new(FixedReader {
        leaves: vec![LeafContext {
            ord: 0,
            max_doc: 1000,
        }],
    });
    let slice = doc_slice(reader.as_ref(), 1).unwrap().remove(0);
    let mut source = SourceOperator::create(
        reader,
        Box::new(MatchAllQuery),
        slice,
        SourceConfig::new(7).with_max_page_size(256),
    );

    let mut sizes = Vec::new();
    let mut total_docs = Vec::new();
    while let Some(page) = source.get_output().unwrap() {
        sizes.push(page.get_position_count());
        let doc_ids = page.get_block(0).unwrap();
        for pos in 0..page.get_position_count() {
            total_docs.push(doc_ids.get_long(pos).unwrap());
        }
        assert_eq!(page.get_block(1).unwrap().get_long(0).unwrap(), 0);
        assert_eq!(page.get_block(2).unwrap().get_long(0).unwrap(), 7);
    }

    assert_eq!(sizes, vec![256, 256, 256, 232]);
    assert_eq!(total_docs, (0..1000).collect::<Vec<i64>>());
    assert!(source.is_finished());
}

#[test]
fn test_assign_slice_after_weight_realized_is_contract_violation() {
    let reader: Arc<dyn IndexReader> = Arc::new(FixedReader {
        leaves: vec![LeafContext { ord: 0, max_doc: 10 }],
    });
    let slice = doc_slice(reader.as_ref(), 1).unwrap().remove(0);
    let mut source = SourceOperator::create(
        reader,
        Box::new(MatchAllQuery),
        slice.clone(),
        SourceConfig::new(0),
    );
    source.get_output().unwrap();
    let err = source.assign_slice(slice).unwrap_err();
    assert_eq!(err.code(), 1001);
}
