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

//! Multi-group aggregation keyed by a group-id block (§4.7): one
//! state slot per group, growing on demand.

use common_datablocks::AggStateBlockBuilder;
use common_datablocks::Block;
use common_datablocks::Page;
use common_datablocks::StateSerializer;
use common_exception::ErrorCode;
use common_exception::Result;
use common_pipeline::Operator;

use crate::aggregate::scalar::AggregatorMode;
use crate::aggregate::scalar::ScalarAggregateFunction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    NeedsInput,
    HasOutput,
    Finished,
}

pub struct GroupingAggregatorConfig {
    pub group_id_channel: usize,
    pub input_channel: usize,
    pub mode: AggregatorMode,
}

impl GroupingAggregatorConfig {
    pub fn new(group_id_channel: usize, input_channel: usize, mode: AggregatorMode) -> Self {
        GroupingAggregatorConfig {
            group_id_channel,
            input_channel,
            mode,
        }
    }
}

/// Drives one [`ScalarAggregateFunction`] across many groups, keyed by
/// a dense `Vec<F::State>` indexed by group id (§3 "Group id", §4.7).
pub struct GroupingAggregator<F: ScalarAggregateFunction> {
    states: Vec<F::State>,
    serializer: F::Serializer,
    group_id_channel: usize,
    input_channel: usize,
    mode: AggregatorMode,
    run_state: RunState,
    closed: bool,
}

impl<F: ScalarAggregateFunction> GroupingAggregator<F> {
    pub fn create(config: GroupingAggregatorConfig) -> Self {
        GroupingAggregator {
            states: Vec::new(),
            serializer: F::Serializer::default(),
            group_id_channel: config.group_id_channel,
            input_channel: config.input_channel,
            mode: config.mode,
            run_state: RunState::NeedsInput,
            closed: false,
        }
    }

    /// Ensures slots `0..=group_id` exist, initializing any newly
    /// created slot to the aggregator's identity (§4.7).
    pub fn ensure_capacity(&mut self, group_id: usize) {
        if group_id >= self.states.len() {
            self.states.resize(group_id + 1, F::identity());
        }
    }

    pub fn process_page(&mut self, page: &Page) -> Result<()> {
        let group_ids = page.get_block(self.group_id_channel)?;
        let values = page.get_block(self.input_channel)?;
        let n = page.get_position_count();

        if self.mode.is_input_partial() {
            if !values.is_agg_state() {
                return Err(ErrorCode::ModeMismatch(
                    "grouping aggregator in partial-input mode received a non-aggregator-state value block",
                ));
            }
            for pos in 0..n {
                let group_id = group_ids.get_long(pos)? as usize;
                self.ensure_capacity(group_id);
                let bytes = values.agg_state_bytes(pos)?;
                let other = self.serializer.deserialize(bytes);
                F::combine(&mut self.states[group_id], &other);
            }
        } else {
            if values.is_agg_state() {
                return Err(ErrorCode::ModeMismatch(
                    "grouping aggregator in raw-input mode received an aggregator-state value block",
                ));
            }
            for pos in 0..n {
                let group_id = group_ids.get_long(pos)? as usize;
                self.ensure_capacity(group_id);
                let value = crate::aggregate::scalar::scalar_to_f64(values.get_object(pos)?);
                F::fold_value(&mut self.states[group_id], value);
            }
        }
        Ok(())
    }

    /// Emits either an intermediate block (positions = groups, values
    /// = serialized states) or a final block (positions = groups,
    /// values = finalized scalars), per the mode's output side (§4.7).
    pub fn evaluate(&self) -> Block {
        if self.mode.is_output_partial() {
            let mut builder = AggStateBlockBuilder::with_capacity(F::TAG, self.states.len() * self.serializer.size());
            let mut buf = Vec::with_capacity(self.serializer.size());
            for state in &self.states {
                buf.clear();
                self.serializer.serialize(state, &mut buf);
                builder
                    .push_record(&buf)
                    .expect("every record is serialized at the same fixed size");
            }
            builder.build()
        } else {
            let finalized: Vec<Block> = self.states.iter().map(F::finalize).collect();
            concat_single_position_blocks(finalized)
        }
    }
}

/// Glues together the single-position blocks `F::finalize` emits per
/// group into one block carrying one position per group.
fn concat_single_position_blocks(blocks: Vec<Block>) -> Block {
    if blocks.iter().all(|b| matches!(b, Block::Long(_))) {
        let values = blocks
            .iter()
            .map(|b| b.get_long(0).expect("finalize emits exactly one position"))
            .collect();
        Block::Long(values)
    } else {
        let values = blocks
            .iter()
            .map(|b| b.get_double(0).expect("finalize emits exactly one position"))
            .collect();
        Block::Double(values)
    }
}

impl<F: ScalarAggregateFunction> Operator for GroupingAggregator<F> {
    fn name(&self) -> &'static str {
        "grouping_aggregator"
    }

    fn needs_input(&self) -> bool {
        matches!(self.run_state, RunState::NeedsInput)
    }

    fn add_input(&mut self, page: Page) -> Result<()> {
        if !self.needs_input() {
            return Err(ErrorCode::ContractViolation(
                "add_input called while needs_input() == false",
            ));
        }
        self.process_page(&page)
    }

    fn finish(&mut self) -> Result<()> {
        match self.run_state {
            RunState::NeedsInput => {
                self.run_state = RunState::HasOutput;
                Ok(())
            }
            _ => Err(ErrorCode::ContractViolation("finish() called more than once")),
        }
    }

    fn is_finished(&self) -> bool {
        matches!(self.run_state, RunState::Finished)
    }

    fn get_output(&mut self) -> Result<Option<Page>> {
        if !matches!(self.run_state, RunState::HasOutput) {
            return Ok(None);
        }
        self.run_state = RunState::Finished;
        Ok(Some(Page::try_create(vec![self.evaluate()])?))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            tracing::warn!("grouping aggregator closed twice; ignoring");
            return Ok(());
        }
        self.closed = true;
        Ok(())
    }
}
