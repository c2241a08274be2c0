use std::fmt;

/// Machine-readable error codes for CLI and agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    StoreOpenFailed,
    TaskNotFound,
    AmbiguousId,
    InvalidEnumValue,
    UnknownLedgerId,
    RowValidationFailed,
    StoreWriteFailed,
    NoBackupFound,
    EmbeddingUnavailable,
    ExtractionFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::StoreOpenFailed => "E1002",
            Self::TaskNotFound => "E2001",
            Self::AmbiguousId => "E2002",
            Self::InvalidEnumValue => "E2003",
            Self::UnknownLedgerId => "E2004",
            Self::RowValidationFailed => "E3001",
            Self::StoreWriteFailed => "E5001",
            Self::NoBackupFound => "E5002",
            Self::EmbeddingUnavailable => "E6001",
            Self::ExtractionFailed => "E6002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::StoreOpenFailed => "Task store could not be opened",
            Self::TaskNotFound => "Task not found",
            Self::AmbiguousId => "Ambiguous task ID",
            Self::InvalidEnumValue => "Invalid kind/priority/status value",
            Self::UnknownLedgerId => "Diff references a task missing from the ledger",
            Self::RowValidationFailed => "Row failed validation and was skipped",
            Self::StoreWriteFailed => "Task store write failed",
            Self::NoBackupFound => "No backup snapshot exists",
            Self::EmbeddingUnavailable => "Embedding service unavailable",
            Self::ExtractionFailed => "Task extraction service failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in sprig/config.toml and retry."),
            Self::StoreOpenFailed => Some("Check the --db path and file permissions."),
            Self::TaskNotFound => None,
            Self::AmbiguousId => Some("Use a longer ID prefix to disambiguate."),
            Self::InvalidEnumValue => Some("Use one of the documented kind/priority values."),
            Self::UnknownLedgerId => {
                Some("Reload the ledger before building a diff; ids must come from it.")
            }
            Self::RowValidationFailed => Some("Give the row a non-empty name and resubmit."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::NoBackupFound => Some("Run `sprig backup` before `sprig restore`."),
            Self::EmbeddingUnavailable => {
                Some("Verify the embedding endpoint and API key, then retry.")
            }
            Self::ExtractionFailed => {
                Some("Verify the extraction endpoint and API key, then retry.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::StoreOpenFailed,
            ErrorCode::TaskNotFound,
            ErrorCode::AmbiguousId,
            ErrorCode::InvalidEnumValue,
            ErrorCode::UnknownLedgerId,
            ErrorCode::RowValidationFailed,
            ErrorCode::StoreWriteFailed,
            ErrorCode::NoBackupFound,
            ErrorCode::EmbeddingUnavailable,
            ErrorCode::ExtractionFailed,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::UnknownLedgerId.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }
}
