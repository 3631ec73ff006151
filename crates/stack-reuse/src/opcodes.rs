//! EVM opcode bytes used by the reference compiler, the reference host and the deployment preamble.

#![allow(missing_docs)]

pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const MOD: u8 = 0x06;
pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const AND: u8 = 0x16;
pub const OR: u8 = 0x17;
pub const XOR: u8 = 0x18;
pub const NOT: u8 = 0x19;
pub const SHL: u8 = 0x1b;
pub const SHR: u8 = 0x1c;
pub const CALLDATALOAD: u8 = 0x35;
pub const CALLDATASIZE: u8 = 0x36;
pub const CODESIZE: u8 = 0x38;
pub const CODECOPY: u8 = 0x39;
pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const PC: u8 = 0x58;
pub const MSIZE: u8 = 0x59;
pub const GAS: u8 = 0x5a;
pub const JUMPDEST: u8 = 0x5b;
pub const PUSH0: u8 = 0x5f;
pub const PUSH1: u8 = 0x60;
pub const PUSH2: u8 = 0x61;
pub const PUSH32: u8 = 0x7f;
pub const DUP1: u8 = 0x80;
pub const DUP2: u8 = 0x81;
pub const DUP16: u8 = 0x8f;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;
pub const RETURN: u8 = 0xf3;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;

/// `DUPn` for `n` in `1..=16`.
pub fn dup(n: usize) -> Option<u8> {
    family(DUP1, 16, n)
}

/// `SWAPn` for `n` in `1..=16`.
pub fn swap(n: usize) -> Option<u8> {
    family(SWAP1, 16, n)
}

/// `PUSHn` for `n` in `1..=32`.
pub fn push(n: usize) -> Option<u8> {
    family(PUSH1, 32, n)
}

fn family(first: u8, len: u8, n: usize) -> Option<u8> {
    let offset = u8::try_from(n.checked_sub(1)?).ok()?;
    (offset < len).then(|| first + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families() {
        assert_eq!(dup(0), None);
        assert_eq!(dup(1), Some(DUP1));
        assert_eq!(dup(2), Some(DUP2));
        assert_eq!(dup(16), Some(DUP16));
        assert_eq!(dup(17), None);
        assert_eq!(swap(0), None);
        assert_eq!(swap(16), Some(SWAP16));
        assert_eq!(push(2), Some(PUSH2));
        assert_eq!(push(32), Some(PUSH32));
        assert_eq!(push(33), None);
        assert_eq!(push(usize::MAX), None);
        assert_eq!(push(33), None);
    }
}
