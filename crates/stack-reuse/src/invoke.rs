use std::fmt;

use primitive_types::H160;

use crate::{CallResult, Host, Message, StatusCode};

/// Classification of a creation or call result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionOutcome {
    /// Execution finished normally.
    Success,
    /// Execution reverted explicitly.
    Revert,
    /// Any other failure, such as an invalid instruction.
    OtherFailure(StatusCode),
}

impl From<StatusCode> for ExecutionOutcome {
    fn from(status: StatusCode) -> Self {
        match status {
            StatusCode::Success => Self::Success,
            StatusCode::Revert => Self::Revert,
            other => Self::OtherFailure(other),
        }
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => formatter.write_str("success"),
            Self::Revert => formatter.write_str("revert"),
            Self::OtherFailure(status) => write!(formatter, "failure (status {status})"),
        }
    }
}

/// Calls the account at `address` once with empty input.
pub fn invoke<H: Host + ?Sized>(host: &mut H, address: H160, gas: i64) -> CallResult {
    let message = Message {
        gas,
        ..Message::call(address)
    };
    host.call(&message)
}
