use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidSprintConfig,
    InvalidTeamEntry,
    EmptyTeam,
    MissingColumns,
    MalformedTable,
    InvalidVoteRange,
    FileReadFailed,
    FileWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidSprintConfig => "E1002",
            Self::InvalidTeamEntry => "E1003",
            Self::EmptyTeam => "E1004",
            Self::MissingColumns => "E2001",
            Self::MalformedTable => "E2002",
            Self::InvalidVoteRange => "E3001",
            Self::FileReadFailed => "E5001",
            Self::FileWriteFailed => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidSprintConfig => "Invalid sprint parameters",
            Self::InvalidTeamEntry => "Invalid team roster entry",
            Self::EmptyTeam => "No team members configured",
            Self::MissingColumns => "Required task columns missing",
            Self::MalformedTable => "Malformed task table",
            Self::InvalidVoteRange => "Invalid vote range",
            Self::FileReadFailed => "File read failed",
            Self::FileWriteFailed => "File write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint surfaced next to the error.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .cadence/config.toml and retry."),
            Self::InvalidSprintConfig => {
                Some("Sprint duration, count, days per week and hours per day must all be >= 1.")
            }
            Self::InvalidTeamEntry => Some("Use one `Name,Capacity` pair per line with capacity > 0."),
            Self::EmptyTeam => Some("Pass --member Name=Hours, --team FILE, or add a [team] table."),
            Self::MissingColumns => {
                Some("The task CSV needs ID, Title, Priority and Original Estimates columns.")
            }
            Self::MalformedTable => Some("Check the CSV for unbalanced quotes or ragged rows."),
            Self::InvalidVoteRange => Some("Use --min-votes <= --max-votes."),
            Self::FileReadFailed => Some("Check the path and read permissions."),
            Self::FileWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while loading and validating planning inputs.
#[derive(Debug, thiserror::Error)]
pub enum CadenceError {
    #[error("missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("malformed task table: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("invalid team entry on line {line}: {reason}")]
    InvalidTeamEntry { line: usize, reason: String },

    #[error("team has no members")]
    EmptyTeam,

    #[error("invalid sprint parameters: {reason}")]
    InvalidSprintConfig { reason: String },

    #[error("min votes {min} exceeds max votes {max}")]
    InvalidVoteRange { min: i64, max: i64 },
}

impl CadenceError {
    /// The stable code that classifies this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Schema { .. } => ErrorCode::MissingColumns,
            Self::Csv(_) => ErrorCode::MalformedTable,
            Self::Io { .. } => ErrorCode::FileReadFailed,
            Self::Write { .. } => ErrorCode::FileWriteFailed,
            Self::Config { .. } => ErrorCode::ConfigParseError,
            Self::InvalidTeamEntry { .. } => ErrorCode::InvalidTeamEntry,
            Self::EmptyTeam => ErrorCode::EmptyTeam,
            Self::InvalidSprintConfig { .. } => ErrorCode::InvalidSprintConfig,
            Self::InvalidVoteRange { .. } => ErrorCode::InvalidVoteRange,
        }
    }

    /// Remediation text for terminal output.
    #[must_use]
    pub fn suggestion(&self) -> String {
        self.error_code()
            .hint()
            .unwrap_or_else(|| self.error_code().message())
            .to_string()
    }
}
