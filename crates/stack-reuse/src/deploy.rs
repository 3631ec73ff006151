use crate::{opcodes, CallResult, Host, Message};

/// Largest artifact the deployment preamble can describe; its length field is two bytes wide.
pub const MAX_DEPLOYED_CODE_SIZE: usize = 0xffff;

const PREAMBLE_LEN: u8 = 12;

/// Wraps `bytecode` in init code that installs it as the new account's code.
///
/// The preamble copies everything after itself to memory and returns the first
/// `bytecode.len()` bytes of it.
///
/// # Panics
///
/// Panics if `bytecode` is longer than [`MAX_DEPLOYED_CODE_SIZE`]. Truncating would deploy a
/// different program than the one that was compiled.
pub fn deployment_code(bytecode: &[u8]) -> Vec<u8> {
    assert!(
        bytecode.len() <= MAX_DEPLOYED_CODE_SIZE,
        "Deployed byte code is larger than the permissible 65535 bytes."
    );
    let [size_high, size_low] = u16::try_from(bytecode.len())
        .unwrap_or(u16::MAX)
        .to_be_bytes();

    let mut code = vec![
        opcodes::CODESIZE,
        opcodes::PUSH1,
        PREAMBLE_LEN,
        opcodes::PUSH1,
        0x00,
        opcodes::CODECOPY,
        opcodes::PUSH2,
        size_high,
        size_low,
        opcodes::PUSH1,
        0x00,
        opcodes::RETURN,
    ];
    debug_assert_eq!(code.len(), usize::from(PREAMBLE_LEN));
    code.extend_from_slice(bytecode);
    code
}

/// Creates a new account running `bytecode` and returns the host's verdict.
pub fn deploy<H: Host + ?Sized>(host: &mut H, bytecode: &[u8], gas: i64) -> CallResult {
    let message = Message {
        gas,
        ..Message::create(deployment_code(bytecode))
    };
    host.call(&message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_encodes_length_big_endian() {
        let code = deployment_code(&[0xaa; 0x1234]);
        assert_eq!(
            code[..12],
            [0x38, 0x60, 0x0c, 0x60, 0x00, 0x39, 0x61, 0x12, 0x34, 0x60, 0x00, 0xf3]
        );
        assert_eq!(code.len(), 12 + 0x1234);
        assert!(code[12..].iter().all(|&byte| byte == 0xaa));
    }

    #[test]
    fn largest_artifact_is_accepted() {
        let code = deployment_code(&vec![0; MAX_DEPLOYED_CODE_SIZE]);
        assert_eq!(code[7..9], [0xff, 0xff]);
    }

    #[test]
    #[should_panic(expected = "larger than the permissible 65535 bytes")]
    fn oversized_artifact_is_not_truncated() {
        deployment_code(&vec![0; MAX_DEPLOYED_CODE_SIZE + 1]);
    }
}
