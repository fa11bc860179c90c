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

use common_exception::ErrorCode;
use common_exception::Result;
use serde::Deserialize;
use serde::Serialize;

/// A single logical value, used by [`Block::Constant`] and as the generic
/// return type of [`Block::get_object`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Int(i32),
    Long(i64),
    Double(f64),
}

/// An immutable, fixed-length, single-typed columnar vector (§3).
///
/// Subtype dispatch over an open `Block` hierarchy becomes a tagged
/// variant here (§9): accessors match on the tag and a mismatched
/// accessor call is a [`ErrorCode::ContractViolation`], not a panic.
#[derive(Clone, Debug)]
pub enum Block {
    Int(Vec<i32>),
    Long(Vec<i64>),
    Double(Vec<f64>),
    /// A single value broadcast over `position_count` positions.
    Constant(Scalar, usize),
    /// `position_count * item_size` bytes of serialized aggregator
    /// state, one fixed-size record per position (§4.5, §9).
    AggState {
        bytes: Vec<u8>,
        item_size: usize,
        tag: &'static str,
    },
}

impl Block {
    pub fn position_count(&self) -> usize {
        match self {
            Block::Int(v) => v.len(),
            Block::Long(v) => v.len(),
            Block::Double(v) => v.len(),
            Block::Constant(_, len) => *len,
            Block::AggState {
                bytes, item_size, ..
            } => {
                if *item_size == 0 {
                    0
                } else {
                    bytes.len() / item_size
                }
            }
        }
    }

    fn check_position(&self, pos: usize) -> Result<()> {
        if pos >= self.position_count() {
            return Err(ErrorCode::ContractViolation(format!(
                "position {} out of range for block of length {}",
                pos,
                self.position_count()
            )));
        }
        Ok(())
    }

    pub fn get_int(&self, pos: usize) -> Result<i32> {
        self.check_position(pos)?;
        match self {
            Block::Int(v) => Ok(v[pos]),
            Block::Constant(Scalar::Int(v), _) => Ok(*v),
            _ => Err(ErrorCode::ContractViolation(
                "get_int called on a block that is not Int-typed",
            )),
        }
    }

    pub fn get_long(&self, pos: usize) -> Result<i64> {
        self.check_position(pos)?;
        match self {
            Block::Long(v) => Ok(v[pos]),
            Block::Constant(Scalar::Long(v), _) => Ok(*v),
            _ => Err(ErrorCode::ContractViolation(
                "get_long called on a block that is not Long-typed",
            )),
        }
    }

    pub fn get_double(&self, pos: usize) -> Result<f64> {
        self.check_position(pos)?;
        match self {
            Block::Double(v) => Ok(v[pos]),
            Block::Constant(Scalar::Double(v), _) => Ok(*v),
            _ => Err(ErrorCode::ContractViolation(
                "get_double called on a block that is not Double-typed",
            )),
        }
    }

    /// Generic, boxed-style access: works across every primitive and
    /// constant variant, returning the value behind a small tagged
    /// [`Scalar`] rather than a `Box<dyn Any>`.
    pub fn get_object(&self, pos: usize) -> Result<Scalar> {
        self.check_position(pos)?;
        match self {
            Block::Int(v) => Ok(Scalar::Int(v[pos])),
            Block::Long(v) => Ok(Scalar::Long(v[pos])),
            Block::Double(v) => Ok(Scalar::Double(v[pos])),
            Block::Constant(v, _) => Ok(*v),
            Block::AggState { .. } => Err(ErrorCode::ContractViolation(
                "get_object called on an aggregator-state block; use agg_state_bytes",
            )),
        }
    }

    /// Raw bytes of the serialized state record at `pos`, for a caller
    /// holding the matching [`crate::StateSerializer`].
    pub fn agg_state_bytes(&self, pos: usize) -> Result<&[u8]> {
        self.check_position(pos)?;
        match self {
            Block::AggState {
                bytes, item_size, ..
            } => {
                let offset = pos * item_size;
                Ok(&bytes[offset..offset + item_size])
            }
            _ => Err(ErrorCode::ContractViolation(
                "agg_state_bytes called on a block that is not an aggregator-state block",
            )),
        }
    }

    pub fn agg_state_tag(&self) -> Result<&'static str> {
        match self {
            Block::AggState { tag, .. } => Ok(tag),
            _ => Err(ErrorCode::ContractViolation(
                "agg_state_tag called on a block that is not an aggregator-state block",
            )),
        }
    }

    pub fn is_agg_state(&self) -> bool {
        matches!(self, Block::AggState { .. })
    }
}

/// Builds an [`Block::AggState`] block one record at a time.
///
/// The first record observed fixes `item_size`; any later record of a
/// different length is a [`ErrorCode::VariableSizeState`] (§7), since an
/// aggregator-state block stores fixed-size records only (§3).
pub struct AggStateBlockBuilder {
    bytes: Vec<u8>,
    item_size: Option<usize>,
    tag: &'static str,
    positions: usize,
}

impl AggStateBlockBuilder {
    pub fn with_capacity(tag: &'static str, capacity: usize) -> Self {
        AggStateBlockBuilder {
            bytes: Vec::with_capacity(capacity),
            item_size: None,
            tag,
            positions: 0,
        }
    }

    pub fn push_record(&mut self, record: &[u8]) -> Result<()> {
        match self.item_size {
            None => self.item_size = Some(record.len()),
            Some(size) if size != record.len() => {
                return Err(ErrorCode::VariableSizeState(format!(
                    "aggregator-state record of size {} does not match established size {}",
                    record.len(),
                    size
                )));
            }
            Some(_) => {}
        }
        self.bytes.extend_from_slice(record);
        self.positions += 1;
        Ok(())
    }

    /// Snapshots the growing buffer into an immutable block (§5,
    /// "copy-of at build time") so readers never race a still-growing
    /// builder.
    pub fn build(self) -> Block {
        Block::AggState {
            bytes: self.bytes,
            item_size: self.item_size.unwrap_or(0),
            tag: self.tag,
        }
    }

    pub fn len(&self) -> usize {
        self.positions
    }

    pub fn is_empty(&self) -> bool {
        self.positions == 0
    }
}
