use crate::{
    compile::{assemble, Configuration},
    deploy::deploy,
    invoke::{invoke, ExecutionOutcome},
    materializer::Materializer,
    snapshot::StorageSnapshot,
    CallResult, Compiler, GeneratedProgram, Host, PlatformVersion, ProgramGenerator,
    RevertPolicy, Settings, StatusCode,
};

/// Position of the oracle in its per-iteration state machine.
///
/// The stage is only advanced, never rewound, within one iteration, so after an early
/// termination it tells how far the iteration got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum Stage {
    Start,
    Generated,
    CompiledBase,
    DeployedBase,
    InvokedBase,
    SnapshottedBase,
    CompiledOpt,
    DeployedOpt,
    InvokedOpt,
    SnapshottedOpt,
    Compared,
}

impl Stage {
    fn compiled(configuration: Configuration) -> Self {
        match configuration {
            Configuration::Unoptimized => Self::CompiledBase,
            Configuration::Optimized => Self::CompiledOpt,
        }
    }

    fn deployed(configuration: Configuration) -> Self {
        match configuration {
            Configuration::Unoptimized => Self::DeployedBase,
            Configuration::Optimized => Self::DeployedOpt,
        }
    }

    fn invoked(configuration: Configuration) -> Self {
        match configuration {
            Configuration::Unoptimized => Self::InvokedBase,
            Configuration::Optimized => Self::InvokedOpt,
        }
    }

    fn snapshotted(configuration: Configuration) -> Self {
        match configuration {
            Configuration::Unoptimized => Self::SnapshottedBase,
            Configuration::Optimized => Self::SnapshottedOpt,
        }
    }
}

/// Why an input was abandoned without a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The source text exceeds the size limit.
    SourceTooLarge,
    /// The compiler ran out of reachable stack slots.
    StackTooDeep(Configuration),
    /// The unoptimized artifact could not be deployed.
    BaseCreationFailed(StatusCode),
}

/// Result of an iteration that did not find a bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Both configurations left identical storage behind.
    Pass(StorageSnapshot),
    /// The input could not be judged.
    Skipped(SkipReason),
}

/// Observable difference between the two configurations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// The optimized artifact failed to deploy although the unoptimized one deployed fine.
    #[error("Optimized contract creation failed with status {status}")]
    OptimizedCreationFailed {
        /// Status of the failed creation.
        status: StatusCode,
    },
    /// An invocation reverted.
    #[error("Invocation of the {configuration} contract reverted")]
    Reverted {
        /// Configuration whose invocation reverted.
        configuration: Configuration,
    },
    /// The invocations ended differently.
    #[error("Invocation outcomes differ: {unoptimized} (unoptimised) vs {optimized} (optimised)")]
    OutcomeMismatch {
        /// Outcome of the unoptimized invocation.
        unoptimized: ExecutionOutcome,
        /// Outcome of the optimized invocation.
        optimized: ExecutionOutcome,
    },
    /// The storage dumps differ.
    #[error(
        "Storage of unoptimised and optimised stack reused code do not match.\n\
         Unoptimised storage\n{unoptimized}\nOptimised storage\n{optimized}"
    )]
    StorageMismatch {
        /// Storage left by the unoptimized artifact.
        unoptimized: StorageSnapshot,
        /// Storage left by the optimized artifact.
        optimized: StorageSnapshot,
    },
}

/// Everything observed while running one configuration.
#[derive(Debug)]
struct Execution {
    outcome: ExecutionOutcome,
    snapshot: StorageSnapshot,
}

enum Interrupt {
    Skip(SkipReason),
    Violation(Violation),
}

impl From<Violation> for Interrupt {
    fn from(violation: Violation) -> Self {
        Self::Violation(violation)
    }
}

/// Equivalence oracle comparing both [`Configuration`]s of a program.
///
/// The compiler and host are owned for the lifetime of the oracle; the host is reset at the start
/// of every iteration.
#[derive(Debug)]
pub struct Oracle<C, H> {
    compiler: C,
    host: H,
    settings: Settings,
    stage: Stage,
}

impl<C: Compiler, H: Host> Oracle<C, H> {
    /// Creates an oracle driving the given collaborators.
    pub fn new(compiler: C, host: H, settings: Settings) -> Self {
        Self {
            compiler,
            host,
            settings,
            stage: Stage::Start,
        }
    }

    /// Stage reached by the latest iteration.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Settings this oracle runs with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Provides a reference to the compiler.
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Provides a reference to the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Materializes a program from fuzz input and runs it.
    ///
    /// # Panics
    ///
    /// Panics on any [`Violation`], and if the collaborators violate their contracts.
    pub fn fuzz_one<G: ProgramGenerator>(
        &mut self,
        generator: &mut G,
        input: &G::Input,
    ) -> Verdict {
        self.stage = Stage::Start;
        let Some(program) = Materializer::from(&self.settings).materialize(generator, input) else {
            self.stage = Stage::Generated;
            return Verdict::Skipped(SkipReason::SourceTooLarge);
        };
        self.run(&program)
    }

    /// Runs a program through both configurations.
    ///
    /// # Panics
    ///
    /// Panics on any [`Violation`], and if the collaborators violate their contracts.
    pub fn run(&mut self, program: &GeneratedProgram) -> Verdict {
        match self.check(program) {
            Ok(verdict) => verdict,
            Err(violation) => panic!("{violation}"),
        }
    }

    /// Runs a program through both configurations and reports violations as errors.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] if the two configurations behave differently.
    ///
    /// # Panics
    ///
    /// Panics if the compiler rejects the program or produces oversized byte-code.
    pub fn check(&mut self, program: &GeneratedProgram) -> Result<Verdict, Violation> {
        self.host.reset(program.version);
        self.stage = Stage::Generated;

        if program.source.len() > self.settings.max_source_len {
            return Ok(Verdict::Skipped(SkipReason::SourceTooLarge));
        }

        let base = match self.execute(program, Configuration::Unoptimized) {
            Ok(execution) => execution,
            Err(Interrupt::Skip(reason)) => return Ok(Verdict::Skipped(reason)),
            Err(Interrupt::Violation(violation)) => return Err(violation),
        };
        let optimized = match self.execute(program, Configuration::Optimized) {
            Ok(execution) => execution,
            Err(Interrupt::Skip(reason)) => return Ok(Verdict::Skipped(reason)),
            Err(Interrupt::Violation(violation)) => return Err(violation),
        };

        self.stage = Stage::Compared;
        if self.settings.print_diagnostics {
            println!("Unoptimised storage");
            println!("{}", base.snapshot);
            println!("Optimised storage");
            println!("{}", optimized.snapshot);
        }

        if base.outcome != optimized.outcome {
            return Err(Violation::OutcomeMismatch {
                unoptimized: base.outcome,
                optimized: optimized.outcome,
            });
        }
        if base.snapshot != optimized.snapshot {
            return Err(Violation::StorageMismatch {
                unoptimized: base.snapshot,
                optimized: optimized.snapshot,
            });
        }
        log::trace!("storage matches for {} program", program.version);
        Ok(Verdict::Pass(base.snapshot))
    }

    fn execute(
        &mut self,
        program: &GeneratedProgram,
        configuration: Configuration,
    ) -> Result<Execution, Interrupt> {
        let bytecode = assemble(
            &mut self.compiler,
            program.version,
            &configuration.settings(),
            &program.source,
        )
        .map_err(|err| {
            log::debug!("skipping input, {configuration} compilation: {err}");
            Interrupt::Skip(SkipReason::StackTooDeep(configuration))
        })?;
        self.stage = Stage::compiled(configuration);

        let deployment = deploy(&mut self.host, &bytecode, self.settings.gas);
        if self.settings.print_diagnostics {
            print_deployment(program.version, &bytecode, &deployment);
        }
        if !deployment.status.is_success() {
            return Err(match configuration {
                Configuration::Unoptimized => {
                    log::debug!("skipping input, base creation failed: {}", deployment.status);
                    Interrupt::Skip(SkipReason::BaseCreationFailed(deployment.status))
                }
                Configuration::Optimized => Violation::OptimizedCreationFailed {
                    status: deployment.status,
                }
                .into(),
            });
        }
        self.stage = Stage::deployed(configuration);

        let address = deployment.create_address;
        let call = invoke(&mut self.host, address, self.settings.gas);
        let outcome = ExecutionOutcome::from(call.status);
        self.stage = Stage::invoked(configuration);
        if outcome == ExecutionOutcome::Revert
            && self.settings.revert_policy == RevertPolicy::NeverRevert
        {
            return Err(Violation::Reverted { configuration }.into());
        }

        let snapshot = StorageSnapshot::capture(&self.host, address);
        self.stage = Stage::snapshotted(configuration);
        Ok(Execution { outcome, snapshot })
    }
}

fn print_deployment(version: PlatformVersion, bytecode: &[u8], result: &CallResult) {
    println!("EVM version: {}", version.name());
    println!("{}", hex::encode(bytecode));
    println!("Gas left: {}", result.gas_left);
    println!("Status code: {}", result.status);
    println!("Create Address: {:?}", result.create_address);
}
