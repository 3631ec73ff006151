use std::{fs, path::PathBuf};

use crate::{GeneratedProgram, ProgramGenerator, Settings};

/// Source texts longer than this are not worth the compile time and tend to exceed the
/// optimizer's stack limits for reasons unrelated to stack reuse.
pub const MAX_SOURCE_LEN: usize = 1200;

/// Turns structured fuzz input into a [`GeneratedProgram`] and decides whether it is worth running.
#[derive(Debug, Clone)]
pub struct Materializer {
    dump_path: Option<PathBuf>,
    max_source_len: usize,
}

impl Materializer {
    /// Creates a materializer with an explicit dump path and size limit.
    pub fn new(dump_path: Option<PathBuf>, max_source_len: usize) -> Self {
        Self {
            dump_path,
            max_source_len,
        }
    }

    /// Runs the generator and returns the program unless it is too large.
    ///
    /// If a dump path is configured, the source is written there first, so that it survives even if
    /// the process aborts later in the iteration.
    pub fn materialize<G: ProgramGenerator>(
        &self,
        generator: &mut G,
        input: &G::Input,
    ) -> Option<GeneratedProgram> {
        let program = generator.generate(input);

        if let Some(path) = &self.dump_path {
            if let Err(err) = fs::write(path, &program.source) {
                log::warn!("failed to dump program to {}: {err}", path.display());
            }
        }

        if program.source.len() > self.max_source_len {
            log::debug!(
                "skipping program of {} bytes (limit {})",
                program.source.len(),
                self.max_source_len
            );
            return None;
        }
        Some(program)
    }
}

impl From<&Settings> for Materializer {
    fn from(settings: &Settings) -> Self {
        Self::new(settings.dump_path.clone(), settings.max_source_len)
    }
}
