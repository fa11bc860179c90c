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

use common_datablocks::Page;
use common_exception::ErrorCode;
use common_exception::Result;

/// The push/pull contract every operator in a pipeline implements
/// (§4.1). The driver composes operators by calling these methods; it
/// never reaches into an operator's internals.
///
/// Default methods match a **source** operator's shape: it never
/// accepts input, so `add_input` and `finish` are contract violations
/// unless an implementation overrides them. Streaming and
/// pipeline-breaker operators (aggregator, top-N) override
/// `needs_input`, `add_input` and `finish`.
pub trait Operator {
    fn name(&self) -> &'static str;

    /// Whether the operator can accept another page right now.
    fn needs_input(&self) -> bool {
        false
    }

    /// Hand a page to the operator. Only legal when `needs_input()` is
    /// true.
    fn add_input(&mut self, _page: Page) -> Result<()> {
        Err(ErrorCode::ContractViolation(format!(
            "{} never accepts input",
            self.name()
        )))
    }

    /// Signal no more inputs. Legal once.
    fn finish(&mut self) -> Result<()> {
        Err(ErrorCode::ContractViolation(format!(
            "{} finishes on its own; finish() is a contract violation",
            self.name()
        )))
    }

    /// Whether the operator is fully drained.
    fn is_finished(&self) -> bool;

    /// Pull zero or one output page. Returns `Ok(None)` if not ready
    /// rather than blocking.
    fn get_output(&mut self) -> Result<Option<Page>>;

    /// Release held resources. The driver calls this exactly once per
    /// operator, including on cancellation (§5).
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
