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

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common_datablocks::Page;
use common_exception::ErrorCode;
use common_exception::Result;

use crate::operator::Operator;

/// Row/page counters the driver accumulates while running a pipeline
/// to completion. Ambient observability only; the core persists
/// nothing (§6) and exports no metrics of its own.
#[derive(Default, Debug, Clone, Copy)]
pub struct DriverStats {
    pub pages_through: u64,
    pub rows_through: u64,
    pub pages_emitted: u64,
    pub rows_emitted: u64,
}

/// The single-threaded cooperative loop that advances a linear chain
/// of operators (§4.1, §5). `operators[0]` is the source,
/// `operators[last]` is the sink; parallelism comes from running
/// multiple independent `Driver`s, never from concurrency inside one.
pub struct Driver {
    operators: Vec<Box<dyn Operator>>,
    cancelled: Arc<AtomicBool>,
    stats: DriverStats,
    closed: bool,
}

impl Driver {
    pub fn create(operators: Vec<Box<dyn Operator>>) -> Driver {
        Driver {
            operators,
            cancelled: Arc::new(AtomicBool::new(false)),
            stats: DriverStats::default(),
            closed: false,
        }
    }

    /// A handle the caller can flip from another thread to cooperatively
    /// cancel this driver between polls (§5 "Cancellation & timeouts").
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Drives the pipeline to completion, returning every page the
    /// sink produced, in order (§5 "Ordering guarantees").
    pub fn run_to_completion(&mut self) -> Result<Vec<Page>> {
        let mut output = Vec::new();
        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                tracing::info!("driver cancelled, closing all operators");
                self.close_all()?;
                return Err(ErrorCode::Cancelled("driver observed cancellation"));
            }

            if self.sink_is_finished() {
                break;
            }

            let progressed = self.advance()?;

            if let Some(page) = self.pull_sink_output()? {
                self.stats.pages_emitted += 1;
                self.stats.rows_emitted += page.get_position_count() as u64;
                output.push(page);
                continue;
            }

            if !progressed {
                return Err(ErrorCode::Internal(
                    "driver made no progress and the sink is not finished",
                ));
            }
        }

        // Drain any output the sink produced on the step that flipped
        // it to finished.
        while let Some(page) = self.pull_sink_output()? {
            self.stats.pages_emitted += 1;
            self.stats.rows_emitted += page.get_position_count() as u64;
            output.push(page);
        }

        self.close_all()?;
        Ok(output)
    }

    fn sink_is_finished(&self) -> bool {
        self.operators
            .last()
            .map(|op| op.is_finished())
            .unwrap_or(true)
    }

    fn pull_sink_output(&mut self) -> Result<Option<Page>> {
        match self.operators.last_mut() {
            Some(sink) => sink.get_output(),
            None => Ok(None),
        }
    }

    /// One backward sweep across adjacent operator pairs: for each
    /// `(upstream, downstream)` pair, if downstream needs input, either
    /// finish it (upstream drained) or hand it a page pulled from
    /// upstream. Mirrors §4.1's "try to drain the sink, else ask the
    /// previous operator for a page, and so on".
    fn advance(&mut self) -> Result<bool> {
        let n = self.operators.len();
        let mut progressed = false;

        for i in (0..n.saturating_sub(1)).rev() {
            if !self.operators[i + 1].needs_input() {
                continue;
            }

            if self.operators[i].is_finished() {
                self.operators[i + 1].finish()?;
                progressed = true;
                continue;
            }

            if let Some(page) = self.operators[i].get_output()? {
                self.stats.pages_through += 1;
                self.stats.rows_through += page.get_position_count() as u64;
                self.operators[i + 1].add_input(page)?;
                progressed = true;
            }
        }

        Ok(progressed)
    }

    fn close_all(&mut self) -> Result<()> {
        if self.closed {
            tracing::warn!("driver closed twice; ignoring the second call");
            return Ok(());
        }
        self.closed = true;
        for op in &mut self.operators {
            op.close()?;
        }
        Ok(())
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close_all();
        }
    }
}
