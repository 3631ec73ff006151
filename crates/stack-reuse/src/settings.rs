use std::{env, path::PathBuf};

use crate::{materializer::MAX_SOURCE_LEN, Message};

/// Environment variable naming the file every generated program is written to before it is
/// compiled.
pub const DUMP_PATH_VAR: &str = "PROTO_FUZZER_DUMP_PATH";

/// How the [`Oracle`](crate::Oracle) treats reverting invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevertPolicy {
    /// Any revert is a violation. Correct for generators that never produce reverting code.
    #[default]
    NeverRevert,
    /// A revert is accepted as long as both configurations revert.
    Symmetric,
}

/// [`Oracle`](crate::Oracle) settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// File that receives the source text of each iteration, overwritten every time.
    pub dump_path: Option<PathBuf>,
    /// Programs with longer source text are skipped.
    pub max_source_len: usize,
    /// Gas given to every creation and call.
    pub gas: i64,
    /// Whether reverting invocations are violations.
    pub revert_policy: RevertPolicy,
    /// Prints byte-code, statuses and storage dumps of every iteration to stdout.
    pub print_diagnostics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dump_path: None,
            max_source_len: MAX_SOURCE_LEN,
            gas: Message::MAX_GAS,
            revert_policy: RevertPolicy::default(),
            print_diagnostics: true,
        }
    }
}

impl Settings {
    /// Default settings with the dump path taken from [`DUMP_PATH_VAR`].
    pub fn from_env() -> Self {
        Self {
            dump_path: env::var_os(DUMP_PATH_VAR).map(PathBuf::from),
            ..Self::default()
        }
    }
}
