//! # Stack-reuse oracle interfaces
//!
//! This crate defines the seams between the differential oracle and the three heavyweight
//! collaborators it drives. The oracle never depends on a concrete grammar, compiler or VM;
//! it is generic over the traits declared here.
//!
//! - [`ProgramGenerator`] turns a structured fuzz value into a [`GeneratedProgram`].
//! - [`Compiler`] turns program text into byte-code under a set of [`OptimizerSettings`].
//! - [`Host`] runs byte-code with a create / call / storage-read ABI.
//!
//! ## Implementing a host
//!
//! A host owns all account state of one fuzz iteration. [`Host::reset()`] is called at the start
//! of every iteration and must drop everything the previous iteration left behind.
//!
//! ```
//! use primitive_types::{H160, U256};
//! use stack_reuse_interface::{CallResult, Host, Message, PlatformVersion, StatusCode};
//!
//! #[derive(Default)]
//! struct NullHost;
//!
//! impl Host for NullHost {
//!     fn reset(&mut self, _version: PlatformVersion) {}
//!
//!     fn call(&mut self, message: &Message) -> CallResult {
//!         CallResult {
//!             status: StatusCode::Success,
//!             gas_left: message.gas,
//!             create_address: H160::zero(),
//!             output: vec![],
//!         }
//!     }
//!
//!     fn storage_at(&self, _address: H160) -> impl Iterator<Item = (U256, U256)> + '_ {
//!         std::iter::empty()
//!     }
//! }
//!
//! let mut host = NullHost;
//! let result = host.call(&Message::create(vec![0x00]));
//! assert_eq!(result.status, StatusCode::Success);
//! ```

pub use self::{compiler_interface::*, generator_interface::*, host_interface::*};

mod compiler_interface;
mod generator_interface;
mod host_interface;
