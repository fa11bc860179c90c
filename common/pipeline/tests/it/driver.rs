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

use std::sync::atomic::Ordering;

use common_datablocks::Block;
use common_datablocks::Page;
use common_exception::Result;
use common_pipeline::Driver;
use common_pipeline::Operator;
use pretty_assertions::assert_eq;

/// Emits `remaining` one-row pages of the value `next`, then finishes.
struct CountingSource {
    next: i64,
    remaining: usize,
}

impl Operator for CountingSource {
    fn name(&self) -> &'static str {
        "counting_source"
    }

    fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    fn get_output(&mut self) -> Result<Option<Page>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let page = Page::try_create(vec![Block::Long(vec![self.next])])?;
        self.next += 1;
        self.remaining -= 1;
        Ok(Some(page))
    }
}

/// Passes pages through unchanged, doubling every value on channel 0.
struct DoublingTransform {
    finished: bool,
    pending: Option<Page>,
}

impl Operator for DoublingTransform {
    fn name(&self) -> &'static str {
        "doubling_transform"
    }

    fn needs_input(&self) -> bool {
        self.pending.is_none() && !self.finished
    }

    fn add_input(&mut self, page: Page) -> Result<()> {
        let doubled = page.get_block(0)?.get_long(0)? * 2;
        self.pending = Some(Page::try_create(vec![Block::Long(vec![doubled])])?);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished && self.pending.is_none()
    }

    fn get_output(&mut self) -> Result<Option<Page>> {
        Ok(self.pending.take())
    }
}

/// Collects everything handed to it and reports itself finished once
/// told so. Its `get_output` never produces anything of its own; the
/// driver collects pages from whichever operator sits last in the
/// chain, so tests read the sink's pass-through buffer back out.
struct BufferingSink {
    finished: bool,
    buffered: Vec<Page>,
}

impl Operator for BufferingSink {
    fn name(&self) -> &'static str {
        "buffering_sink"
    }

    fn needs_input(&self) -> bool {
        !self.finished
    }

    fn add_input(&mut self, page: Page) -> Result<()> {
        self.buffered.push(page);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished && self.buffered.is_empty()
    }

    fn get_output(&mut self) -> Result<Option<Page>> {
        if self.buffered.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.buffered.remove(0)))
    }
}

#[test]
fn test_driver_moves_pages_end_to_end_in_order() -> Result<()> {
    let operators: Vec<Box<dyn Operator>> = vec![
        Box::new(CountingSource {
            next: 1,
            remaining: 3,
        }),
        Box::new(DoublingTransform {
            finished: false,
            pending: None,
        }),
        Box::new(BufferingSink {
            finished: false,
            buffered: vec![],
        }),
    ];

    let mut driver = Driver::create(operators);
    let pages = driver.run_to_completion()?;

    let values: Vec<i64> = pages
        .iter()
        .map(|p| p.get_block(0).unwrap().get_long(0).unwrap())
        .collect();
    assert_eq!(values, vec![2, 4, 6]);

    let stats = driver.stats();
    assert_eq!(stats.rows_emitted, 3);
    Ok(())
}

#[test]
fn test_driver_respects_cancellation_flag() -> Result<()> {
    let operators: Vec<Box<dyn Operator>> = vec![
        Box::new(CountingSource {
            next: 1,
            remaining: 1_000_000,
        }),
        Box::new(BufferingSink {
            finished: false,
            buffered: vec![],
        }),
    ];

    let mut driver = Driver::create(operators);
    let flag = driver.cancellation_flag();
    flag.store(true, Ordering::Relaxed);

    let result = driver.run_to_completion();
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().code(), 1005);
    Ok(())
}
