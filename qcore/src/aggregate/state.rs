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

//! Concrete aggregator states and their [`StateSerializer`]s (§4.5).
//! Every encoding here is little-endian, fixed-width, no padding.

use common_datablocks::StateSerializer;

/// Serializes a bare `f64` state — used by Max, Min and Sum.
#[derive(Clone, Copy, Debug, Default)]
pub struct DoubleStateSerializer;

impl StateSerializer for DoubleStateSerializer {
    type State = f64;

    fn size(&self) -> usize {
        8
    }

    fn serialize(&self, state: &f64, buf: &mut Vec<u8>) -> usize {
        buf.extend_from_slice(&state.to_le_bytes());
        8
    }

    fn deserialize(&self, buf: &[u8]) -> f64 {
        f64::from_le_bytes(buf[0..8].try_into().expect("8-byte double state record"))
    }
}

/// Serializes a bare `i64` state — used by Count.
#[derive(Clone, Copy, Debug, Default)]
pub struct CountStateSerializer;

impl StateSerializer for CountStateSerializer {
    type State = i64;

    fn size(&self) -> usize {
        8
    }

    fn serialize(&self, state: &i64, buf: &mut Vec<u8>) -> usize {
        buf.extend_from_slice(&state.to_le_bytes());
        8
    }

    fn deserialize(&self, buf: &[u8]) -> i64 {
        i64::from_le_bytes(buf[0..8].try_into().expect("8-byte count state record"))
    }
}

/// The `(sum, count)` pair backing Avg.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SumCountState {
    pub sum: f64,
    pub count: i64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SumCountStateSerializer;

impl StateSerializer for SumCountStateSerializer {
    type State = SumCountState;

    fn size(&self) -> usize {
        16
    }

    fn serialize(&self, state: &SumCountState, buf: &mut Vec<u8>) -> usize {
        buf.extend_from_slice(&state.sum.to_le_bytes());
        buf.extend_from_slice(&state.count.to_le_bytes());
        16
    }

    fn deserialize(&self, buf: &[u8]) -> SumCountState {
        let sum = f64::from_le_bytes(buf[0..8].try_into().expect("sum half of record"));
        let count = i64::from_le_bytes(buf[8..16].try_into().expect("count half of record"));
        SumCountState { sum, count }
    }
}
