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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

/// A pipeline-fatal error, tagged with a stable numeric code so it survives
/// a hop across the wire between partial and final aggregation nodes.
///
/// The code values are part of the cross-node contract (§6 "Aggregator
/// wire format" travels alongside these), so existing variants never
/// change their code once released.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode {
    code: u16,
    message: String,
}

impl std::error::Error for ErrorCode {}

impl ErrorCode {
    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Code: {}, displayText = {}.", self.code, self.message)
    }
}

macro_rules! build_exceptions {
    ($($(#[$meta:meta])* $name:ident($code:expr)),* $(,)?) => {
        impl ErrorCode {
            $(
                $(#[$meta])*
                pub fn $name(message: impl Into<String>) -> ErrorCode {
                    ErrorCode {
                        code: $code,
                        message: message.into(),
                    }
                }
            )*
        }
    };
}

build_exceptions! {
    /// An operator's push/pull contract was violated: `add_input` while
    /// `needs_input()` is false, `finish()` called twice, slicing a
    /// source whose weight is already realized, or an out-of-range
    /// block access.
    ContractViolation(1001),
    /// An aggregator-state builder observed a serialized record whose
    /// byte length differs from the first-observed size.
    VariableSizeState(1002),
    /// `add_intermediate_input` received a block that is not an
    /// aggregator-state block, or `add_raw_input` was called on an
    /// aggregator in partial-input mode.
    ModeMismatch(1003),
    /// The underlying index reader failed to produce leaves, scorers,
    /// or doc ids.
    ReaderIo(1004),
    /// The driver observed cooperative cancellation.
    Cancelled(1005),
    /// Caller-supplied arguments are invalid (e.g. `top_count == 0`).
    BadArguments(1006),
    /// A condition the code assumes can never happen did.
    Internal(1007),
}

pub type Result<T> = std::result::Result<T, ErrorCode>;

impl From<std::io::Error> for ErrorCode {
    fn from(err: std::io::Error) -> Self {
        ErrorCode::ReaderIo(err.to_string())
    }
}
