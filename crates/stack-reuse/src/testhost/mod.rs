//! In-memory [`Host`] implementation for tests and local fuzzing.
//!
//! Accounts only have code, a nonce and storage. Creations and calls are executed by a small EVM
//! interpreter that understands the instructions the reference compiler and the deployment
//! preamble emit.

use std::collections::BTreeMap;

use primitive_types::{H160, U256};
use sha3::{Digest, Keccak256};

use self::interpreter::{Frame, FrameEnd};
use crate::{CallResult, Host, Message, MessageKind, PlatformVersion, StatusCode};

mod interpreter;

/// Maximum size of deployed code since EIP-170.
pub const MAX_CODE_SIZE: usize = 0x6000;

/// Code deposit cost per byte of deployed code.
const CREATE_DATA_GAS: i64 = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Account {
    nonce: u64,
    code: Vec<u8>,
    storage: BTreeMap<U256, U256>,
}

/// Test [`Host`] implementation.
#[derive(Debug, Clone)]
pub struct TestHost {
    version: PlatformVersion,
    sender: H160,
    accounts: BTreeMap<H160, Account>,
}

impl TestHost {
    /// Creates an empty host for `version`.
    pub fn new(version: PlatformVersion) -> Self {
        Self {
            version,
            sender: H160::zero(),
            accounts: BTreeMap::new(),
        }
    }

    /// Revision currently executed.
    pub fn version(&self) -> PlatformVersion {
        self.version
    }

    /// Code installed at `address`, if the account exists.
    pub fn code_at(&self, address: H160) -> Option<&[u8]> {
        self.accounts
            .get(&address)
            .map(|account| account.code.as_slice())
    }

    /// Number of accounts created since the last reset.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn create(&mut self, message: &Message) -> CallResult {
        let nonce = {
            let sender = self.accounts.entry(self.sender).or_default();
            let nonce = sender.nonce;
            sender.nonce += 1;
            nonce
        };
        let address = create_address(self.sender, nonce);

        let mut storage = BTreeMap::new();
        let end = Frame::new(
            self.version,
            &message.input,
            &[],
            &mut storage,
            message.gas,
        )
        .run();

        match end {
            FrameEnd::Return { output, gas_left } => {
                if self.version.has_code_size_limit() && output.len() > MAX_CODE_SIZE {
                    return failure(StatusCode::OutOfGas);
                }
                let deposit = i64::try_from(output.len())
                    .ok()
                    .and_then(|len| len.checked_mul(CREATE_DATA_GAS));
                let Some(gas_left) = deposit.and_then(|cost| gas_left.checked_sub(cost)) else {
                    return failure(StatusCode::OutOfGas);
                };

                self.accounts.insert(
                    address,
                    Account {
                        nonce: 1,
                        code: output,
                        storage,
                    },
                );
                CallResult {
                    status: StatusCode::Success,
                    gas_left,
                    create_address: address,
                    output: vec![],
                }
            }
            FrameEnd::Revert { output, gas_left } => CallResult {
                status: StatusCode::Revert,
                gas_left,
                create_address: H160::zero(),
                output,
            },
            FrameEnd::Halt(status) => failure(status),
        }
    }

    fn call_account(&mut self, message: &Message) -> CallResult {
        let Some(account) = message
            .destination
            .and_then(|destination| self.accounts.get_mut(&destination))
        else {
            // Calling an empty account succeeds without doing anything.
            return CallResult {
                status: StatusCode::Success,
                gas_left: message.gas,
                create_address: H160::zero(),
                output: vec![],
            };
        };

        // Storage is only committed if the frame succeeds.
        let mut storage = account.storage.clone();
        let end = Frame::new(
            self.version,
            &account.code,
            &message.input,
            &mut storage,
            message.gas,
        )
        .run();

        match end {
            FrameEnd::Return { output, gas_left } => {
                account.storage = storage;
                CallResult {
                    status: StatusCode::Success,
                    gas_left,
                    create_address: H160::zero(),
                    output,
                }
            }
            FrameEnd::Revert { output, gas_left } => CallResult {
                status: StatusCode::Revert,
                gas_left,
                create_address: H160::zero(),
                output,
            },
            FrameEnd::Halt(status) => failure(status),
        }
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new(PlatformVersion::default())
    }
}

impl Host for TestHost {
    fn reset(&mut self, version: PlatformVersion) {
        self.version = version;
        self.accounts.clear();
    }

    fn call(&mut self, message: &Message) -> CallResult {
        match message.kind {
            MessageKind::Create => self.create(message),
            MessageKind::Call => self.call_account(message),
        }
    }

    fn storage_at(&self, address: H160) -> impl Iterator<Item = (U256, U256)> + '_ {
        self.accounts
            .get(&address)
            .into_iter()
            .flat_map(|account| account.storage.iter().map(|(&key, &value)| (key, value)))
    }
}

fn failure(status: StatusCode) -> CallResult {
    CallResult {
        status,
        gas_left: 0,
        create_address: H160::zero(),
        output: vec![],
    }
}

/// Address of the account created by `sender` with the given nonce.
///
/// This hashes the raw concatenation rather than the RLP encoding, which is enough to keep
/// addresses distinct and deterministic.
pub fn create_address(sender: H160, nonce: u64) -> H160 {
    let mut hasher = Keccak256::new();
    hasher.update(sender.as_bytes());
    hasher.update(nonce.to_be_bytes());
    H160::from_slice(&hasher.finalize()[12..])
}
