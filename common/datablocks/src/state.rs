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

/// Converts an aggregator state to and from a fixed-width byte record
/// (§4.5). The encoding is little-endian, natural width, no padding;
/// `size()` defines the wire format for cross-node partial aggregation
/// and must stay stable for a state type across a major version.
pub trait StateSerializer {
    type State;

    /// Fixed byte width of one serialized record.
    fn size(&self) -> usize;

    /// Writes exactly `size()` bytes into `buf`. Returns the number of
    /// bytes written.
    fn serialize(&self, state: &Self::State, buf: &mut Vec<u8>) -> usize;

    /// Reads exactly `size()` bytes from `buf` and materializes a state.
    fn deserialize(&self, buf: &[u8]) -> Self::State;
}
