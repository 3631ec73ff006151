use std::fmt;

/// Target platform revision a program is compiled for and executed under.
///
/// Revisions are ordered; later revisions are supersets of earlier ones as far as the
/// instructions used by the oracle are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[allow(missing_docs)] // revision names are self-explanatory
pub enum PlatformVersion {
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    London,
    Paris,
    #[default]
    Shanghai,
    Cancun,
}

impl PlatformVersion {
    /// All known revisions, oldest first.
    pub const ALL: [Self; 12] = [
        Self::Homestead,
        Self::TangerineWhistle,
        Self::SpuriousDragon,
        Self::Byzantium,
        Self::Constantinople,
        Self::Petersburg,
        Self::Istanbul,
        Self::Berlin,
        Self::London,
        Self::Paris,
        Self::Shanghai,
        Self::Cancun,
    ];

    /// Lower-case revision name as used on the command line of most EVM tooling.
    pub fn name(self) -> &'static str {
        match self {
            Self::Homestead => "homestead",
            Self::TangerineWhistle => "tangerineWhistle",
            Self::SpuriousDragon => "spuriousDragon",
            Self::Byzantium => "byzantium",
            Self::Constantinople => "constantinople",
            Self::Petersburg => "petersburg",
            Self::Istanbul => "istanbul",
            Self::Berlin => "berlin",
            Self::London => "london",
            Self::Paris => "paris",
            Self::Shanghai => "shanghai",
            Self::Cancun => "cancun",
        }
    }

    /// `REVERT` is available (EIP-140).
    pub fn has_revert(self) -> bool {
        self >= Self::Byzantium
    }

    /// `SHL` and `SHR` are available (EIP-145).
    pub fn has_bitwise_shifting(self) -> bool {
        self >= Self::Constantinople
    }

    /// `PUSH0` is available (EIP-3855).
    pub fn has_push0(self) -> bool {
        self >= Self::Shanghai
    }

    /// Deployed code is limited in size (EIP-170).
    pub fn has_code_size_limit(self) -> bool {
        self >= Self::SpuriousDragon
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Program text produced by a [`ProgramGenerator`] together with the platform version it targets.
///
/// Both compiler invocations of one oracle run see this exact value, which is what makes their
/// outputs comparable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProgram {
    /// Program source text.
    pub source: String,
    /// Revision to compile for and execute under.
    pub version: PlatformVersion,
}

/// Grammar-driven program generator.
///
/// The oracle treats the generator as a black box: any input must map to syntactically valid
/// program text. A generator that emits malformed programs is a broken collaborator and makes the
/// oracle abort.
pub trait ProgramGenerator {
    /// Structured fuzz value the generator consumes.
    type Input: ?Sized;

    /// Materializes a program from the structured input.
    fn generate(&mut self, input: &Self::Input) -> GeneratedProgram;
}
