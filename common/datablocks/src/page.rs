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

use crate::Block;

/// An ordered tuple of blocks all sharing the same `position_count`
/// (§3). Pages are value-like and exist only while in flight between
/// two operators (§3 "Lifecycles").
#[derive(Clone, Debug)]
pub struct Page {
    blocks: Vec<Block>,
    position_count: usize,
}

impl Page {
    /// Builds a page from blocks that must already share one row
    /// count; a mismatch is a contract violation rather than a silent
    /// truncation.
    pub fn try_create(blocks: Vec<Block>) -> Result<Page> {
        let position_count = blocks.first().map(|b| b.position_count()).unwrap_or(0);
        for block in &blocks {
            if block.position_count() != position_count {
                return Err(ErrorCode::ContractViolation(format!(
                    "page blocks disagree on position_count: {} vs {}",
                    block.position_count(),
                    position_count
                )));
            }
        }
        Ok(Page {
            blocks,
            position_count,
        })
    }

    pub fn empty() -> Page {
        Page {
            blocks: vec![],
            position_count: 0,
        }
    }

    pub fn get_position_count(&self) -> usize {
        self.position_count
    }

    pub fn get_block(&self, channel: usize) -> Result<&Block> {
        self.blocks.get(channel).ok_or_else(|| {
            ErrorCode::ContractViolation(format!(
                "channel {} out of range for page with {} blocks",
                channel,
                self.blocks.len()
            ))
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn channel_count(&self) -> usize {
        self.blocks.len()
    }

    /// Extracts position `i` from every block, forming a new page of
    /// row count 1 (§3, §4.2).
    pub fn get_row(&self, i: usize) -> Result<Page> {
        if i >= self.position_count {
            return Err(ErrorCode::ContractViolation(format!(
                "row {} out of range for page of length {}",
                i, self.position_count
            )));
        }
        let row_blocks = self
            .blocks
            .iter()
            .map(|block| slice_single(block, i))
            .collect::<Result<Vec<_>>>()?;
        Page::try_create(row_blocks)
    }
}

fn slice_single(block: &Block, pos: usize) -> Result<Block> {
    Ok(match block {
        Block::Int(_) => Block::Int(vec![block.get_int(pos)?]),
        Block::Long(_) => Block::Long(vec![block.get_long(pos)?]),
        Block::Double(_) => Block::Double(vec![block.get_double(pos)?]),
        Block::Constant(value, _) => Block::Constant(*value, 1),
        Block::AggState {
            item_size, tag, ..
        } => Block::AggState {
            bytes: block.agg_state_bytes(pos)?.to_vec(),
            item_size: *item_size,
            tag,
        },
    })
}
