use std::{collections::BTreeMap, ops::Range};

use primitive_types::U256;

use crate::{opcodes::*, PlatformVersion, StatusCode};

const STACK_LIMIT: usize = 1024;

/// Memory beyond this is treated as unaffordable. Real gas accounting would allow gigabytes at
/// `i64::MAX` gas.
const MEMORY_LIMIT: usize = 1 << 20;

const SLOAD_COST: i64 = 2100;
const SSTORE_SET_COST: i64 = 20_000;
const SSTORE_RESET_COST: i64 = 5000;
const COPY_WORD_COST: i64 = 3;

/// How a [`Frame`] ended.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum FrameEnd {
    Return { output: Vec<u8>, gas_left: i64 },
    Revert { output: Vec<u8>, gas_left: i64 },
    Halt(StatusCode),
}

enum Step {
    Continue,
    Return(Vec<u8>),
    Revert(Vec<u8>),
}

/// Execution of one piece of code against one account's storage.
pub(super) struct Frame<'a> {
    version: PlatformVersion,
    code: &'a [u8],
    input: &'a [u8],
    storage: &'a mut BTreeMap<U256, U256>,
    jump_destinations: Vec<bool>,
    stack: Vec<U256>,
    memory: Vec<u8>,
    gas: i64,
    pc: usize,
}

impl<'a> Frame<'a> {
    pub(super) fn new(
        version: PlatformVersion,
        code: &'a [u8],
        input: &'a [u8],
        storage: &'a mut BTreeMap<U256, U256>,
        gas: i64,
    ) -> Self {
        Self {
            version,
            code,
            input,
            storage,
            jump_destinations: jump_destinations(code),
            stack: Vec::with_capacity(STACK_LIMIT),
            memory: vec![],
            gas,
            pc: 0,
        }
    }

    pub(super) fn run(mut self) -> FrameEnd {
        loop {
            match self.step() {
                Ok(Step::Continue) => {}
                Ok(Step::Return(output)) => {
                    return FrameEnd::Return {
                        output,
                        gas_left: self.gas,
                    }
                }
                Ok(Step::Revert(output)) => {
                    return FrameEnd::Revert {
                        output,
                        gas_left: self.gas,
                    }
                }
                Err(status) => return FrameEnd::Halt(status),
            }
        }
    }

    fn step(&mut self) -> Result<Step, StatusCode> {
        // Running off the end of the code is an implicit STOP.
        let Some(&op) = self.code.get(self.pc) else {
            return Ok(Step::Return(vec![]));
        };
        self.pc += 1;
        self.charge(static_cost(op))?;

        match op {
            STOP => return Ok(Step::Return(vec![])),
            ADD => self.binary(|a, b| a.overflowing_add(b).0)?,
            MUL => self.binary(|a, b| a.overflowing_mul(b).0)?,
            SUB => self.binary(|a, b| a.overflowing_sub(b).0)?,
            DIV => self.binary(|a, b| a.checked_div(b).unwrap_or_default())?,
            MOD => self.binary(|a, b| a.checked_rem(b).unwrap_or_default())?,
            LT => self.binary(|a, b| word(a < b))?,
            GT => self.binary(|a, b| word(a > b))?,
            EQ => self.binary(|a, b| word(a == b))?,
            ISZERO => self.unary(|a| word(a.is_zero()))?,
            AND => self.binary(|a, b| a & b)?,
            OR => self.binary(|a, b| a | b)?,
            XOR => self.binary(|a, b| a ^ b)?,
            NOT => self.unary(|a| !a)?,
            SHL if self.version.has_bitwise_shifting() => {
                self.binary(|shift, value| shifted(shift).map_or(U256::zero(), |s| value << s))?;
            }
            SHR if self.version.has_bitwise_shifting() => {
                self.binary(|shift, value| shifted(shift).map_or(U256::zero(), |s| value >> s))?;
            }
            CALLDATALOAD => {
                let offset = self.pop()?;
                let mut buffer = [0; 32];
                if let Some(offset) = to_usize(offset) {
                    copy_padded(&mut buffer, self.input, offset);
                }
                self.push(U256::from_big_endian(&buffer))?;
            }
            CALLDATASIZE => self.push(self.input.len().into())?,
            CODESIZE => self.push(self.code.len().into())?,
            CODECOPY => {
                let destination = self.pop()?;
                let offset = self.pop()?;
                let size = self.pop()?;
                let range = self.expand_memory(destination, size)?;
                self.charge(copy_cost(range.len()))?;
                let offset = to_usize(offset).unwrap_or(usize::MAX);
                copy_padded(&mut self.memory[range], self.code, offset);
            }
            POP => {
                self.pop()?;
            }
            MLOAD => {
                let offset = self.pop()?;
                let range = self.expand_memory(offset, U256::from(32))?;
                let value = U256::from_big_endian(&self.memory[range]);
                self.push(value)?;
            }
            MSTORE => {
                let offset = self.pop()?;
                let value = self.pop()?;
                let range = self.expand_memory(offset, U256::from(32))?;
                value.to_big_endian(&mut self.memory[range]);
            }
            SLOAD => {
                let key = self.pop()?;
                let value = self.storage.get(&key).copied().unwrap_or_default();
                self.push(value)?;
            }
            SSTORE => {
                let key = self.pop()?;
                let value = self.pop()?;
                let current = self.storage.get(&key).copied().unwrap_or_default();
                self.charge(if current.is_zero() && !value.is_zero() {
                    SSTORE_SET_COST
                } else {
                    SSTORE_RESET_COST
                })?;
                if value.is_zero() {
                    self.storage.remove(&key);
                } else {
                    self.storage.insert(key, value);
                }
            }
            JUMP => {
                let destination = self.pop()?;
                self.jump(destination)?;
            }
            JUMPI => {
                let destination = self.pop()?;
                let condition = self.pop()?;
                if !condition.is_zero() {
                    self.jump(destination)?;
                }
            }
            PC => self.push((self.pc - 1).into())?,
            MSIZE => self.push(self.memory.len().into())?,
            GAS => self.push(U256::from(self.gas.unsigned_abs()))?,
            JUMPDEST => {}
            PUSH0 if self.version.has_push0() => self.push(U256::zero())?,
            PUSH1..=PUSH32 => {
                let len = usize::from(op - PUSH1) + 1;
                let mut buffer = [0; 32];
                copy_padded(&mut buffer[32 - len..], self.code, self.pc);
                self.pc += len;
                self.push(U256::from_big_endian(&buffer))?;
            }
            DUP1..=DUP16 => {
                let depth = usize::from(op - DUP1) + 1;
                let index = self
                    .stack
                    .len()
                    .checked_sub(depth)
                    .ok_or(StatusCode::StackUnderflow)?;
                self.push(self.stack[index])?;
            }
            SWAP1..=SWAP16 => {
                let depth = usize::from(op - SWAP1) + 1;
                let top = self.stack.len().checked_sub(1);
                let other = self.stack.len().checked_sub(depth + 1);
                let (Some(top), Some(other)) = (top, other) else {
                    return Err(StatusCode::StackUnderflow);
                };
                self.stack.swap(top, other);
            }
            RETURN => return self.output().map(Step::Return),
            REVERT if self.version.has_revert() => return self.output().map(Step::Revert),
            INVALID => return Err(StatusCode::InvalidInstruction),
            _ => return Err(StatusCode::UndefinedInstruction),
        }
        Ok(Step::Continue)
    }

    fn charge(&mut self, cost: i64) -> Result<(), StatusCode> {
        if cost > self.gas {
            return Err(StatusCode::OutOfGas);
        }
        self.gas -= cost;
        Ok(())
    }

    fn push(&mut self, value: U256) -> Result<(), StatusCode> {
        if self.stack.len() >= STACK_LIMIT {
            return Err(StatusCode::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<U256, StatusCode> {
        self.stack.pop().ok_or(StatusCode::StackUnderflow)
    }

    fn unary(&mut self, op: impl FnOnce(U256) -> U256) -> Result<(), StatusCode> {
        let a = self.pop()?;
        self.push(op(a))
    }

    /// Pops the first operand from the top of the stack, then the second.
    fn binary(&mut self, op: impl FnOnce(U256, U256) -> U256) -> Result<(), StatusCode> {
        let a = self.pop()?;
        let b = self.pop()?;
        self.push(op(a, b))
    }

    fn jump(&mut self, destination: U256) -> Result<(), StatusCode> {
        let destination = to_usize(destination)
            .filter(|&pc| self.jump_destinations.get(pc).copied().unwrap_or(false))
            .ok_or(StatusCode::BadJumpDestination)?;
        self.pc = destination;
        Ok(())
    }

    fn output(&mut self) -> Result<Vec<u8>, StatusCode> {
        let offset = self.pop()?;
        let size = self.pop()?;
        let range = self.expand_memory(offset, size)?;
        Ok(self.memory[range].to_vec())
    }

    /// Grows memory to cover `size` bytes at `offset` and charges for the growth.
    fn expand_memory(&mut self, offset: U256, size: U256) -> Result<Range<usize>, StatusCode> {
        if size.is_zero() {
            return Ok(0..0);
        }
        let (Some(offset), Some(size)) = (to_usize(offset), to_usize(size)) else {
            return Err(StatusCode::OutOfGas);
        };
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= MEMORY_LIMIT)
            .ok_or(StatusCode::OutOfGas)?;

        let words = end.div_ceil(32);
        let current_words = self.memory.len() / 32;
        if words > current_words {
            self.charge(memory_cost(words) - memory_cost(current_words))?;
            self.memory.resize(words * 32, 0);
        }
        Ok(offset..end)
    }
}

fn static_cost(op: u8) -> i64 {
    match op {
        STOP | RETURN | REVERT | INVALID => 0,
        JUMPDEST => 1,
        POP | PC | MSIZE | GAS | CODESIZE | CALLDATASIZE | PUSH0 => 2,
        MUL | DIV | MOD => 5,
        JUMP => 8,
        JUMPI => 10,
        SLOAD => SLOAD_COST,
        // Charged dynamically.
        SSTORE => 0,
        _ => 3,
    }
}

fn memory_cost(words: usize) -> i64 {
    // `words` is bounded by `MEMORY_LIMIT / 32`, so this cannot overflow.
    let words = i64::try_from(words).unwrap_or(i64::MAX / 4);
    3 * words + words * words / 512
}

fn copy_cost(len: usize) -> i64 {
    i64::try_from(len.div_ceil(32)).map_or(i64::MAX, |words| words * COPY_WORD_COST)
}

fn word(flag: bool) -> U256 {
    if flag {
        U256::one()
    } else {
        U256::zero()
    }
}

fn shifted(shift: U256) -> Option<usize> {
    to_usize(shift).filter(|&shift| shift < 256)
}

fn to_usize(value: U256) -> Option<usize> {
    if value.bits() > 64 {
        return None;
    }
    usize::try_from(value.low_u64()).ok()
}

/// Copies `source[offset..]` into `target`, padding with zeros past the end of `source`.
fn copy_padded(target: &mut [u8], source: &[u8], offset: usize) {
    let available = source.get(offset..).unwrap_or_default();
    let len = available.len().min(target.len());
    target[..len].copy_from_slice(&available[..len]);
    target[len..].fill(0);
}

/// Marks every `JUMPDEST` that is not part of push data.
fn jump_destinations(code: &[u8]) -> Vec<bool> {
    let mut destinations = vec![false; code.len()];
    let mut pc = 0;
    while pc < code.len() {
        let op = code[pc];
        if op == JUMPDEST {
            destinations[pc] = true;
        } else if (PUSH1..=PUSH32).contains(&op) {
            pc += usize::from(op - PUSH1) + 1;
        }
        pc += 1;
    }
    destinations
}
