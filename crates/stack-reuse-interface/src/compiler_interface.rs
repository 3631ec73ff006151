use std::fmt;

use crate::PlatformVersion;

/// Switches of the compiler's optimizer.
///
/// The oracle builds two instances per run that differ only in
/// [`optimize_stack_allocation`](Self::optimize_stack_allocation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerSettings {
    /// Runs the program-level optimizer pipeline before code generation.
    pub run_optimizer_pipeline: bool,
    /// Lets code generation reuse stack slots of variables that are no longer live.
    pub optimize_stack_allocation: bool,
    /// Runs the peephole optimizer on emitted code.
    pub run_peephole: bool,
    /// Merges identical code blocks.
    pub run_deduplicate: bool,
    /// Re-encodes constants to save gas or code size.
    pub run_constant_optimizer: bool,
    /// Expected number of executions per deployment; tunes the constant optimizer.
    pub expected_executions_per_deployment: usize,
}

impl OptimizerSettings {
    /// Everything off.
    pub fn minimal() -> Self {
        Self {
            run_optimizer_pipeline: false,
            optimize_stack_allocation: false,
            run_peephole: false,
            run_deduplicate: false,
            run_constant_optimizer: false,
            expected_executions_per_deployment: 200,
        }
    }

    /// Everything on. This is the baseline that the oracle derives both of its configurations from.
    pub fn full() -> Self {
        Self {
            run_optimizer_pipeline: true,
            optimize_stack_allocation: true,
            run_peephole: true,
            run_deduplicate: true,
            run_constant_optimizer: true,
            ..Self::minimal()
        }
    }
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self::minimal()
    }
}

/// Severity of a compiler [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Does not prevent code generation.
    Warning,
    /// The program is rejected.
    Error,
}

/// Message reported by parsing or analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Whether this diagnostic rejects the program.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(formatter, "Warning: {}", self.message),
            Severity::Error => write!(formatter, "Error: {}", self.message),
        }
    }
}

/// Result of a compilation that did not hit a resource limit.
///
/// A well-formed program yields bytecode and at most warnings. Anything else means the generator
/// and the compiler disagree about what a valid program is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compilation {
    /// Everything reported by parsing and analysis.
    pub diagnostics: Vec<Diagnostic>,
    /// Assembled byte-code, if code generation ran.
    pub bytecode: Option<Vec<u8>>,
}

impl Compilation {
    /// Returns `true` if no diagnostic is an error.
    pub fn contains_only_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .all(|diagnostic| diagnostic.severity == Severity::Warning)
    }
}

/// Code generation could not fit all live values into the reachable part of the stack.
///
/// This is a resource limit, not a compiler defect: it depends on the program size and on the
/// stack allocation strategy, so it may hit one optimizer configuration and not the other.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("variable `{variable}` is {depth} slots deep, too deep to reach")]
pub struct StackTooDeepError {
    /// Variable that could not be reached.
    pub variable: String,
    /// Distance from the top of the stack, where 1 is the top itself.
    pub depth: usize,
}

/// Compiler front end: parsing, analysis, optimization and code generation.
pub trait Compiler {
    /// Compiles `source` for `version` with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`StackTooDeepError`] if stack allocation ran out of reachable slots. Malformed
    /// programs are *not* errors; they are reported through [`Compilation::diagnostics`].
    fn compile(
        &mut self,
        version: PlatformVersion,
        settings: &OptimizerSettings,
        source: &str,
    ) -> Result<Compilation, StackTooDeepError>;
}
