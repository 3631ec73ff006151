use std::fmt;

use primitive_types::{H160, U256};

use crate::PlatformVersion;

/// Kind of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Executes the code of an existing account.
    Call,
    /// Executes the input as init code and installs its output as a new account's code.
    Create,
}

/// Request to run code on a [`Host`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Gas available to the execution.
    pub gas: i64,
    /// Callee of a [`MessageKind::Call`]; ignored for creations.
    pub destination: Option<H160>,
    /// Call data, or init code for creations.
    pub input: Vec<u8>,
    /// Call or creation.
    pub kind: MessageKind,
}

impl Message {
    /// Gas used for every message the oracle sends. Gas exhaustion must never be the reason two
    /// configurations behave differently.
    pub const MAX_GAS: i64 = i64::MAX;

    /// Creation message running `init_code` with maximal gas.
    pub fn create(init_code: Vec<u8>) -> Self {
        Self {
            gas: Self::MAX_GAS,
            destination: None,
            input: init_code,
            kind: MessageKind::Create,
        }
    }

    /// Call to `destination` with empty input and maximal gas.
    pub fn call(destination: H160) -> Self {
        Self {
            gas: Self::MAX_GAS,
            destination: Some(destination),
            input: vec![],
            kind: MessageKind::Call,
        }
    }
}

/// Execution status reported by a [`Host`]. The numeric codes follow EVMC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // variants mirror the EVMC status codes one to one
pub enum StatusCode {
    Success,
    Failure,
    Revert,
    OutOfGas,
    InvalidInstruction,
    UndefinedInstruction,
    StackOverflow,
    StackUnderflow,
    BadJumpDestination,
    InvalidMemoryAccess,
    CallDepthExceeded,
    StaticModeViolation,
    ContractValidationFailure,
    ArgumentOutOfRange,
    InternalError,
    Rejected,
    OutOfMemory,
}

impl StatusCode {
    /// EVMC numeric value of this status.
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Revert => 2,
            Self::OutOfGas => 3,
            Self::InvalidInstruction => 4,
            Self::UndefinedInstruction => 5,
            Self::StackOverflow => 6,
            Self::StackUnderflow => 7,
            Self::BadJumpDestination => 8,
            Self::InvalidMemoryAccess => 9,
            Self::CallDepthExceeded => 10,
            Self::StaticModeViolation => 11,
            Self::ContractValidationFailure => 13,
            Self::ArgumentOutOfRange => 14,
            Self::InternalError => -1,
            Self::Rejected => -2,
            Self::OutOfMemory => -3,
        }
    }

    /// Returns `true` for [`StatusCode::Success`].
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.code())
    }
}

/// What a [`Host`] returns for a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    /// How execution ended.
    pub status: StatusCode,
    /// Unspent gas. Zero after exceptional halts.
    pub gas_left: i64,
    /// Address of the new account for successful creations; zero otherwise.
    pub create_address: H160,
    /// Return or revert data.
    pub output: Vec<u8>,
}

/// Virtual machine host executing byte-code against an in-memory world.
///
/// The host is reused across fuzz iterations, but its contents are scoped to one iteration:
/// the oracle calls [`Self::reset()`] before doing anything else.
pub trait Host {
    /// Drops all accounts and selects the revision used by subsequent messages.
    fn reset(&mut self, version: PlatformVersion);

    /// Executes a call or a creation.
    fn call(&mut self, message: &Message) -> CallResult;

    /// Iterates over the persistent storage of `address`. The order is unspecified.
    fn storage_at(&self, address: H160) -> impl Iterator<Item = (U256, U256)> + '_;
}
