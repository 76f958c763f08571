// Error taxonomy for loading and querying the repository
//
// File-level and record-level malformation are errors. Expected absence
// (zero enrollments, empty gap sets) is never an error.

use thiserror::Error;

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Input source cannot be opened or found; its phase is skipped
    #[error("Source not found: {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },

    /// Field count mismatch; aborts the rest of the phase
    #[error("'{location}' has {found} fields on line {line} but expected {expected}")]
    MalformedRecord {
        location: String,
        line: u64,
        found: usize,
        expected: usize,
    },

    /// Line that exists but cannot be decoded; aborts the rest of the phase
    #[error("'{location}' line {line} cannot be read: {reason}")]
    UnreadableRecord {
        location: String,
        line: u64,
        reason: String,
    },

    /// Grade pointing at a student or instructor that was never loaded
    #[error("No {kind} found with cwid {id}")]
    DanglingReference { kind: &'static str, id: String },

    /// Direct lookup of a key that is not in the registry
    #[error("Unknown {kind}: {key}")]
    UnknownKey { kind: &'static str, key: String },

    #[error("Unknown requirement flag '{flag}' for major {major}")]
    UnknownRequirementFlag { major: String, flag: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl RepositoryError {
    pub fn unknown_student(cwid: &str) -> Self {
        RepositoryError::UnknownKey {
            kind: "student",
            key: cwid.to_string(),
        }
    }

    pub fn unknown_instructor(cwid: &str) -> Self {
        RepositoryError::UnknownKey {
            kind: "instructor",
            key: cwid.to_string(),
        }
    }

    pub fn unknown_major(name: &str) -> Self {
        RepositoryError::UnknownKey {
            kind: "major",
            key: name.to_string(),
        }
    }

    /// True for errors that stop a whole load phase
    pub fn aborts_phase(&self) -> bool {
        matches!(
            self,
            RepositoryError::SourceUnavailable { .. }
                | RepositoryError::MalformedRecord { .. }
                | RepositoryError::UnreadableRecord { .. }
                | RepositoryError::Database(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_message() {
        let err = RepositoryError::MalformedRecord {
            location: "students.txt".to_string(),
            line: 4,
            found: 2,
            expected: 3,
        };

        assert_eq!(
            err.to_string(),
            "'students.txt' has 2 fields on line 4 but expected 3"
        );
        assert!(err.aborts_phase());
    }

    #[test]
    fn test_dangling_reference_does_not_abort() {
        let err = RepositoryError::DanglingReference {
            kind: "student",
            id: "99999".to_string(),
        };

        assert_eq!(err.to_string(), "No student found with cwid 99999");
        assert!(!err.aborts_phase());
        assert!(!RepositoryError::unknown_major("EE").aborts_phase());
    }
}
