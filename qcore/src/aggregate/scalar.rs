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

//! Single-group aggregates (§4.6): Max, Min, Sum, Count, Avg, and the
//! `ScalarAggregator<F>` pipeline-breaker operator that drives one of
//! them through a mode.

use common_datablocks::AggStateBlockBuilder;
use common_datablocks::Block;
use common_datablocks::Page;
use common_datablocks::Scalar;
use common_datablocks::StateSerializer;
use common_exception::ErrorCode;
use common_exception::Result;
use common_pipeline::Operator;

use crate::aggregate::state::CountStateSerializer;
use crate::aggregate::state::DoubleStateSerializer;
use crate::aggregate::state::SumCountState;
use crate::aggregate::state::SumCountStateSerializer;

/// Selects input/output partiality for an aggregator instance (§4.6
/// "Aggregator mode"). Fixed per instance by the planner; the core
/// only consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregatorMode {
    /// Single-stage: raw values in, the finalized scalar out.
    RawToFinal,
    /// Local pre-aggregation: raw values in, a serialized partial state out.
    RawToPartial,
    /// Intermediate combine: partial states in, a (combined) partial state out.
    PartialToPartial,
    /// Final combine: partial states in, the finalized scalar out.
    PartialToFinal,
}

impl AggregatorMode {
    pub fn is_input_partial(&self) -> bool {
        matches!(self, AggregatorMode::PartialToPartial | AggregatorMode::PartialToFinal)
    }

    pub fn is_output_partial(&self) -> bool {
        matches!(self, AggregatorMode::RawToPartial | AggregatorMode::PartialToPartial)
    }
}

/// The associative, commutative combine rule behind one scalar
/// aggregate function (§4.6). Non-commutative aggregates (first/last)
/// are out of scope.
pub trait ScalarAggregateFunction {
    type State: Copy;
    type Serializer: StateSerializer<State = Self::State> + Default;

    /// Names the state kind carried in an `AggState` block's tag (§3).
    const TAG: &'static str;

    /// The identity of `combine`, e.g. `NEG_INFINITY` for Max (§9: not
    /// `Double::MIN_VALUE`, which is merely the smallest positive double).
    fn identity() -> Self::State;

    fn combine(acc: &mut Self::State, other: &Self::State);

    /// Folds one raw value (already widened to `f64`) into the state.
    fn fold_value(acc: &mut Self::State, value: f64);

    fn finalize(acc: &Self::State) -> Block;
}

pub(crate) fn scalar_to_f64(value: Scalar) -> f64 {
    match value {
        Scalar::Int(v) => v as f64,
        Scalar::Long(v) => v as f64,
        Scalar::Double(v) => v,
    }
}

/// Folds every position of a raw (non-aggregator-state) block into
/// `acc` via `F::fold_value`. Shared by the scalar and grouping
/// aggregators.
pub(crate) fn fold_block<F: ScalarAggregateFunction>(acc: &mut F::State, block: &Block) -> Result<()> {
    if block.is_agg_state() {
        return Err(ErrorCode::ModeMismatch(
            "add_raw_input received an aggregator-state block; this aggregator's mode expects raw input",
        ));
    }
    for pos in 0..block.position_count() {
        F::fold_value(acc, scalar_to_f64(block.get_object(pos)?));
    }
    Ok(())
}

pub struct MaxFn;
impl ScalarAggregateFunction for MaxFn {
    type State = f64;
    type Serializer = DoubleStateSerializer;
    const TAG: &'static str = "max";

    fn identity() -> f64 {
        f64::NEG_INFINITY
    }

    fn combine(acc: &mut f64, other: &f64) {
        if *other > *acc {
            *acc = *other;
        }
    }

    fn fold_value(acc: &mut f64, value: f64) {
        if value > *acc {
            *acc = value;
        }
    }

    fn finalize(acc: &f64) -> Block {
        Block::Double(vec![*acc])
    }
}

pub struct MinFn;
impl ScalarAggregateFunction for MinFn {
    type State = f64;
    type Serializer = DoubleStateSerializer;
    const TAG: &'static str = "min";

    fn identity() -> f64 {
        f64::INFINITY
    }

    fn combine(acc: &mut f64, other: &f64) {
        if *other < *acc {
            *acc = *other;
        }
    }

    fn fold_value(acc: &mut f64, value: f64) {
        if value < *acc {
            *acc = value;
        }
    }

    fn finalize(acc: &f64) -> Block {
        Block::Double(vec![*acc])
    }
}

pub struct SumFn;
impl ScalarAggregateFunction for SumFn {
    type State = f64;
    type Serializer = DoubleStateSerializer;
    const TAG: &'static str = "sum";

    fn identity() -> f64 {
        0.0
    }

    fn combine(acc: &mut f64, other: &f64) {
        *acc += *other;
    }

    fn fold_value(acc: &mut f64, value: f64) {
        *acc += value;
    }

    fn finalize(acc: &f64) -> Block {
        Block::Double(vec![*acc])
    }
}

pub struct CountFn;
impl ScalarAggregateFunction for CountFn {
    type State = i64;
    type Serializer = CountStateSerializer;
    const TAG: &'static str = "count";

    fn identity() -> i64 {
        0
    }

    fn combine(acc: &mut i64, other: &i64) {
        *acc += *other;
    }

    fn fold_value(acc: &mut i64, _value: f64) {
        *acc += 1;
    }

    fn finalize(acc: &i64) -> Block {
        Block::Long(vec![*acc])
    }
}

pub struct AvgFn;
impl ScalarAggregateFunction for AvgFn {
    type State = SumCountState;
    type Serializer = SumCountStateSerializer;
    const TAG: &'static str = "avg";

    fn identity() -> SumCountState {
        SumCountState { sum: 0.0, count: 0 }
    }

    fn combine(acc: &mut SumCountState, other: &SumCountState) {
        acc.sum += other.sum;
        acc.count += other.count;
    }

    fn fold_value(acc: &mut SumCountState, value: f64) {
        acc.sum += value;
        acc.count += 1;
    }

    fn finalize(acc: &SumCountState) -> Block {
        let avg = if acc.count == 0 {
            0.0
        } else {
            acc.sum / acc.count as f64
        };
        Block::Double(vec![avg])
    }
}

/// Drives a single [`ScalarAggregateFunction`] through a mode (§4.6),
/// as the sole pipeline-breaker of a non-grouped query. Reused as the
/// building block the grouping aggregator (§4.7) folds per group.
pub struct ScalarAggregatorConfig {
    pub input_channel: usize,
    pub mode: AggregatorMode,
}

impl ScalarAggregatorConfig {
    pub fn new(input_channel: usize, mode: AggregatorMode) -> Self {
        ScalarAggregatorConfig { input_channel, mode }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    NeedsInput,
    HasOutput,
    Finished,
}

pub struct ScalarAggregator<F: ScalarAggregateFunction> {
    accumulator: F::State,
    serializer: F::Serializer,
    input_channel: usize,
    mode: AggregatorMode,
    state: RunState,
    closed: bool,
}

impl<F: ScalarAggregateFunction> ScalarAggregator<F> {
    pub fn create(config: ScalarAggregatorConfig) -> Self {
        ScalarAggregator {
            accumulator: F::identity(),
            serializer: F::Serializer::default(),
            input_channel: config.input_channel,
            mode: config.mode,
            state: RunState::NeedsInput,
            closed: false,
        }
    }

    /// Consumes raw values from the declared input channel, folding
    /// them into the state (§4.6). Errs if this aggregator's mode
    /// expects partial input.
    pub fn add_raw_input(&mut self, page: &Page) -> Result<()> {
        if self.mode.is_input_partial() {
            return Err(ErrorCode::ModeMismatch(
                "add_raw_input called on an aggregator in partial-input mode",
            ));
        }
        let block = page.get_block(self.input_channel)?;
        fold_block::<F>(&mut self.accumulator, block)
    }

    /// Consumes a block of serialized states, merging each into the
    /// accumulator. Errs if the block is not an aggregator-state block.
    pub fn add_intermediate_input(&mut self, block: &Block) -> Result<()> {
        if !block.is_agg_state() {
            return Err(ErrorCode::ModeMismatch(
                "add_intermediate_input received a block that is not an aggregator-state block",
            ));
        }
        for pos in 0..block.position_count() {
            let bytes = block.agg_state_bytes(pos)?;
            let other = self.serializer.deserialize(bytes);
            F::combine(&mut self.accumulator, &other);
        }
        Ok(())
    }

    /// Emits a single-position aggregator-state block with the current
    /// state's serialization (§4.6, used when mode has partial output).
    pub fn evaluate_intermediate(&self) -> Block {
        let mut builder = AggStateBlockBuilder::with_capacity(F::TAG, self.serializer.size());
        let mut buf = Vec::with_capacity(self.serializer.size());
        self.serializer.serialize(&self.accumulator, &mut buf);
        builder
            .push_record(&buf)
            .expect("single record always matches its own freshly-established size");
        builder.build()
    }

    /// Emits a single-position primitive block carrying the finalized
    /// scalar (§4.6, used when mode has final output).
    pub fn evaluate_final(&self) -> Block {
        F::finalize(&self.accumulator)
    }

    fn evaluate(&self) -> Block {
        if self.mode.is_output_partial() {
            self.evaluate_intermediate()
        } else {
            self.evaluate_final()
        }
    }
}

impl<F: ScalarAggregateFunction> Operator for ScalarAggregator<F> {
    fn name(&self) -> &'static str {
        "scalar_aggregator"
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
        if self.mode.is_input_partial() {
            let block = page.get_block(self.input_channel)?;
            self.add_intermediate_input(block)
        } else {
            self.add_raw_input(&page)
        }
    }

    fn finish(&mut self) -> Result<()> {
        match self.state {
            RunState::NeedsInput => {
                self.state = RunState::HasOutput;
                Ok(())
            }
            _ => Err(ErrorCode::ContractViolation("finish() called more than once")),
        }
    }

    fn is_finished(&self) -> bool {
        matches!(self.state, RunState::Finished)
    }

    fn get_output(&mut self) -> Result<Option<Page>> {
        if !matches!(self.state, RunState::HasOutput) {
            return Ok(None);
        }
        self.state = RunState::Finished;
        Ok(Some(Page::try_create(vec![self.evaluate()])?))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            tracing::warn!("scalar aggregator closed twice; ignoring");
            return Ok(());
        }
        self.closed = true;
        Ok(())
    }
}
