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

//! The aggregation subsystem (§4.5–§4.7): per-state serializers,
//! single-group scalar aggregators and the group-id-keyed grouping
//! aggregator built on top of the same aggregate functions.

mod grouping;
mod scalar;
mod state;

pub use grouping::GroupingAggregator;
pub use grouping::GroupingAggregatorConfig;
pub use scalar::AggregatorMode;
pub use scalar::AvgFn;
pub use scalar::CountFn;
pub use scalar::MaxFn;
pub use scalar::MinFn;
pub use scalar::ScalarAggregateFunction;
pub use scalar::ScalarAggregator;
pub use scalar::ScalarAggregatorConfig;
pub use scalar::SumFn;
pub use state::CountStateSerializer;
pub use state::DoubleStateSerializer;
pub use state::SumCountState;
pub use state::SumCountStateSerializer;
