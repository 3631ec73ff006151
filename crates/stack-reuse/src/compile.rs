use std::fmt;

use crate::{Compiler, OptimizerSettings, PlatformVersion, StackTooDeepError};

/// One of the two optimizer configurations the oracle compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Configuration {
    /// Stack allocation optimization disabled.
    Unoptimized,
    /// Stack allocation optimization enabled.
    Optimized,
}

impl Configuration {
    /// Optimizer settings for this configuration.
    ///
    /// Both configurations start from [`OptimizerSettings::full()`] with the optimizer pipeline
    /// turned off, so stack allocation is the only switch that differs between them.
    pub fn settings(self) -> OptimizerSettings {
        OptimizerSettings {
            run_optimizer_pipeline: false,
            optimize_stack_allocation: self == Self::Optimized,
            ..OptimizerSettings::full()
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Unoptimized => "unoptimised",
            Self::Optimized => "optimised",
        })
    }
}

/// Compiles `source` and returns its byte-code.
///
/// # Errors
///
/// Passes through [`StackTooDeepError`] so that the caller can skip the input.
///
/// # Panics
///
/// Panics if the program is rejected or no code is produced. The generator is supposed to
/// emit only valid programs, so this means generator and compiler disagree.
pub fn assemble<C: Compiler + ?Sized>(
    compiler: &mut C,
    version: PlatformVersion,
    settings: &OptimizerSettings,
    source: &str,
) -> Result<Vec<u8>, StackTooDeepError> {
    let compilation = compiler.compile(version, settings, source)?;
    let only_warnings = compilation.contains_only_warnings();
    match compilation.bytecode {
        Some(bytecode) if only_warnings => Ok(bytecode),
        _ => {
            let report = compilation
                .diagnostics
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            panic!("Proto fuzzer generated malformed program\n{report}\n{source}");
        }
    }
}
