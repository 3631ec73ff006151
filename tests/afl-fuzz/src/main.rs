use stack_reuse::{lang::AssemblyCompiler, testhost::TestHost, Oracle, Settings};
use stack_reuse_afl_fuzz::{FuzzProgram, SourceRenderer};

fn main() {
    env_logger::init();

    // Compiler and host live for the whole session; the oracle resets the host every iteration.
    let mut oracle = Oracle::new(
        AssemblyCompiler::default(),
        TestHost::default(),
        Settings::from_env(),
    );
    let mut renderer = SourceRenderer::default();

    afl::fuzz!(|data: &[u8]| {
        if let Ok(input) = arbitrary::Unstructured::new(data).arbitrary::<FuzzProgram>() {
            let verdict = oracle.fuzz_one(&mut renderer, &input);
            log::debug!("{verdict:?}");
        }
    });
}
