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

//! Bounded-heap top-N (§4.4). Keeps the `k` best single-row pages by a
//! long-typed sort channel, evicting its current worst-kept row as a
//! better one arrives.
//!
//! §9 flags an observed bug in the source: a comparator returning
//! `a > b` for "less than" when `ascending` is true, which makes the
//! heap keep the *largest* k on an ascending request. This
//! implementation takes the semantically correct reading instead —
//! ascending top-N returns the k smallest.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use common_datablocks::Page;
use common_exception::ErrorCode;
use common_exception::Result;
use common_pipeline::Operator;

pub struct TopNConfig {
    pub sort_channel: usize,
    pub ascending: bool,
    pub top_count: usize,
}

impl TopNConfig {
    pub fn new(sort_channel: usize, ascending: bool, top_count: usize) -> Self {
        TopNConfig {
            sort_channel,
            ascending,
            top_count,
        }
    }
}

/// One kept row, ordered so that `BinaryHeap`'s max-root always
/// exposes the current *worst* kept row — the one a better candidate
/// should displace.
///
/// - Ascending top-N keeps the k smallest: the worst kept row is the
///   largest, so ordering by key directly makes `BinaryHeap`'s max
///   the worst kept (a plain max-heap on value).
/// - Descending top-N keeps the k largest: the worst kept row is the
///   smallest, so the key ordering is reversed (a min-heap on value,
///   realized as a max-heap on the negated comparison).
struct Entry {
    key: i64,
    ascending: bool,
    row: Page,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        let natural = self.key.cmp(&other.key);
        if self.ascending {
            natural
        } else {
            natural.reverse()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    NeedsInput,
    HasOutput,
    Finished,
}

/// Bounded min/max heap over single-row pages (§4.4). State machine:
/// `NeedsInput -> HasOutput -> Finished`, monotonic.
pub struct TopNOperator {
    sort_channel: usize,
    ascending: bool,
    top_count: usize,
    heap: BinaryHeap<Entry>,
    state: RunState,
    closed: bool,
}

impl TopNOperator {
    pub fn create(config: TopNConfig) -> Result<Self> {
        if config.top_count == 0 {
            return Err(ErrorCode::BadArguments("top_count must be >= 1"));
        }
        Ok(TopNOperator {
            sort_channel: config.sort_channel,
            ascending: config.ascending,
            top_count: config.top_count,
            heap: BinaryHeap::with_capacity(config.top_count),
            state: RunState::NeedsInput,
            closed: false,
        })
    }

    fn offer(&mut self, row: Page) -> Result<()> {
        let key = row.get_block(self.sort_channel)?.get_long(0)?;
        let candidate = Entry {
            key,
            ascending: self.ascending,
            row,
        };

        if self.heap.len() < self.top_count {
            self.heap.push(candidate);
            return Ok(());
        }

        // `peek` is the current worst kept row; a candidate that sorts
        // before it (per this heap's Ord) dominates and displaces it.
        if let Some(worst) = self.heap.peek() {
            if candidate < *worst {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
        Ok(())
    }

    pub fn add_page(&mut self, page: &Page) -> Result<()> {
        for pos in 0..page.get_position_count() {
            self.offer(page.get_row(pos)?)?;
        }
        Ok(())
    }
}

impl Operator for TopNOperator {
    fn name(&self) -> &'static str {
        "top_n"
    }

    fn needs_input(&self) -> bool {
        matches!(self.state, RunState::NeedsInput)
    }

    fn add_input(&mut self, page: Page) -> Result<()> {
        if !self.needs_input() {
            return Err(ErrorCode::ContractViolation(
                "add_input called while needs_input() == false",
            ));
        }
        self.add_page(&page)
    }

    fn finish(&mut self) -> Result<()> {
        self.state = match self.state {
            RunState::NeedsInput => RunState::HasOutput,
            _ => RunState::Finished,
        };
        Ok(())
    }

    fn is_finished(&self) -> bool {
        matches!(self.state, RunState::Finished)
    }

    fn get_output(&mut self) -> Result<Option<Page>> {
        if !matches!(self.state, RunState::HasOutput) {
            return Ok(None);
        }
        let popped = self.heap.pop();
        // Detect emptiness in the same call that pops the last row,
        // not on a following call: the driver treats "no output and
        // not finished" as a deadlock, so a sink must flip to
        // `Finished` the instant it has nothing left to give.
        if self.heap.is_empty() {
            self.state = RunState::Finished;
        }
        Ok(popped.map(|entry| entry.row))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            tracing::warn!("top-n operator closed twice; ignoring");
            return Ok(());
        }
        self.closed = true;
        self.heap.clear();
        Ok(())
    }
}
