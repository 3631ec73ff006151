//! Reference compiler for a small strict-assembly dialect.
//!
//! Programs are a single block of statements:
//!
//! ```text
//! {
//!     let x := 1
//!     let y
//!     y := add(x, 0x20)
//!     if lt(x, y) { sstore(x, y) }
//!     pop(sload(x))
//! }
//! ```
//!
//! Every builtin maps to one EVM instruction. Builtins without a result (`sstore`, `pop`,
//! `revert`) form expression statements; every other value has to be bound or consumed.
//!
//! [`AssemblyCompiler`] keeps every variable on the stack. The
//! [`optimize_stack_allocation`](crate::OptimizerSettings::optimize_stack_allocation) switch
//! controls whether slots of dead variables are released early, which is the behavior the
//! [`Oracle`](crate::Oracle) tests.

use crate::{
    Compilation, Compiler, Diagnostic, OptimizerSettings, PlatformVersion, Severity,
    StackTooDeepError,
};

use self::{analysis::analyze, codegen::CodeGenerator, fold::fold_block, interner::Interner};

mod analysis;
mod ast;
mod codegen;
mod fold;
mod interner;
mod lexer;
mod parser;

/// [`Compiler`] for the strict-assembly dialect described in the [module docs](self).
///
/// Identifiers are interned per call, so nothing carries over from one compilation to the next.
#[derive(Debug, Default, Clone)]
pub struct AssemblyCompiler {
    compilations: usize,
}

impl AssemblyCompiler {
    /// Number of `compile` calls so far, including failed ones.
    pub fn compilations(&self) -> usize {
        self.compilations
    }
}

impl Compiler for AssemblyCompiler {
    fn compile(
        &mut self,
        version: PlatformVersion,
        settings: &OptimizerSettings,
        source: &str,
    ) -> Result<Compilation, StackTooDeepError> {
        self.compilations += 1;
        let mut interner = Interner::default();

        let mut program = match parser::parse(source, &mut interner) {
            Ok(program) => program,
            Err(diagnostic) => {
                return Ok(Compilation {
                    diagnostics: vec![diagnostic],
                    bytecode: None,
                })
            }
        };
        let mut diagnostics = analyze(&program, &interner, version);
        if diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
        {
            return Ok(Compilation {
                diagnostics,
                bytecode: None,
            });
        }

        if settings.run_optimizer_pipeline {
            fold_block(&mut program);
        }
        let bytecode = CodeGenerator::new(&interner, version, settings.optimize_stack_allocation)
            .generate(&program)?;
        log::trace!(
            "compiled {} identifiers into {} bytes of code",
            interner.len(),
            bytecode.len()
        );

        if bytecode.len() > usize::from(u16::MAX) {
            diagnostics.push(Diagnostic::error(format!(
                "code size of {} bytes exceeds the jump range",
                bytecode.len()
            )));
            return Ok(Compilation {
                diagnostics,
                bytecode: None,
            });
        }
        Ok(Compilation {
            diagnostics,
            bytecode: Some(bytecode),
        })
    }
}
