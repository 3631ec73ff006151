use std::{env, fs};

use pretty_assertions::assert_eq;
use stack_reuse::{
    lang::AssemblyCompiler, testhost::TestHost, Oracle, ProgramGenerator, Settings, Violation,
};
use stack_reuse_afl_fuzz::{FuzzProgram, SourceRenderer};

fn main() {
    env_logger::init();

    let filename = env::args()
        .nth(1)
        .expect("Please provide the test case to show as argument.");

    let bytes = fs::read(filename).expect("Failed to read file");

    let input: FuzzProgram = arbitrary::Unstructured::new(&bytes).arbitrary().unwrap();
    let program = SourceRenderer::default().generate(&input);

    println!("EVM version: {}", program.version);
    println!("{}", program.source);

    let mut oracle = Oracle::new(
        AssemblyCompiler::default(),
        TestHost::default(),
        Settings::default(),
    );
    match oracle.check(&program) {
        Ok(verdict) => println!("{verdict:?}"),
        // Shows a line diff of the two dumps.
        Err(Violation::StorageMismatch {
            unoptimized,
            optimized,
        }) => assert_eq!(unoptimized.as_str(), optimized.as_str()),
        Err(violation) => panic!("{violation}"),
    }
}
