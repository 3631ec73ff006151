//! Differential oracle for a compiler's stack allocation optimization.
//!
//! One [`GeneratedProgram`] is compiled twice, once per [`Configuration`]. Both artifacts are
//! deployed on a [`Host`], called once with empty input, and their persistent storage is captured
//! as a [`StorageSnapshot`]. The [`Oracle`] requires both runs to agree; any disagreement is an
//! optimizer bug and aborts the process so that the enclosing fuzz engine keeps the input.
//!
//! Inputs the oracle cannot judge are skipped silently (see [`SkipReason`]). Inputs that show
//! the collaborators disagree about what a valid program is abort as well, since nothing useful
//! can be learned from them.

pub use stack_reuse_interface::{
    CallResult, Compilation, Compiler, Diagnostic, GeneratedProgram, Host, Message, MessageKind,
    OptimizerSettings, PlatformVersion, ProgramGenerator, Severity, StackTooDeepError, StatusCode,
};

pub use self::{
    compile::{assemble, Configuration},
    deploy::{deploy, deployment_code, MAX_DEPLOYED_CODE_SIZE},
    invoke::{invoke, ExecutionOutcome},
    materializer::{Materializer, MAX_SOURCE_LEN},
    oracle::{Oracle, SkipReason, Stage, Verdict, Violation},
    settings::{RevertPolicy, Settings, DUMP_PATH_VAR},
    snapshot::StorageSnapshot,
};

mod compile;
mod deploy;
mod invoke;
pub mod lang;
mod materializer;
pub mod opcodes;
mod oracle;
mod settings;
mod snapshot;
pub mod testhost;
