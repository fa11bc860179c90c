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

//! The columnar push-pull query-execution core: the source operator
//! over an inverted-index reader, the aggregation subsystem, and
//! top-N, all composed through `common_pipeline::Operator`.

pub mod aggregate;
pub mod reader;
pub mod source;
pub mod topn;

pub use aggregate::AggregatorMode;
pub use aggregate::AvgFn;
pub use aggregate::CountFn;
pub use aggregate::GroupingAggregator;
pub use aggregate::GroupingAggregatorConfig;
pub use aggregate::MaxFn;
pub use aggregate::MinFn;
pub use aggregate::ScalarAggregateFunction;
pub use aggregate::ScalarAggregator;
pub use aggregate::ScalarAggregatorConfig;
pub use aggregate::SumFn;
pub use reader::BulkScorer;
pub use reader::IndexReader;
pub use reader::LeafContext;
pub use reader::Query;
pub use reader::ScoreMode;
pub use reader::Weight;
pub use source::SourceConfig;
pub use source::SourceOperator;
pub use topn::TopNConfig;
pub use topn::TopNOperator;
