// University Repository - Core Library
// Exposes all modules for use in CLI, web server, and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod grade;
pub mod reader;
pub mod render;
pub mod repository;
pub mod source;

#[cfg(feature = "tui")]
pub mod ui;

#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use config::{RepositoryConfig, DEFAULT_NAME};
pub use db::{count_rows, import_directory, setup_database, ImportStats};
pub use entities::{
    CourseEnrollment, CourseGrade, Instructor, InstructorRegistry, InstructorSummaryRow, Major,
    MajorCatalog, MajorDetails, RemainingGap, RequirementStatus, Student, StudentRegistry,
};
pub use error::{RepositoryError, Result};
pub use grade::{is_valid_grade, GradeRecord};
pub use reader::FieldReader;
pub use repository::{LoadPhase, LoadReport, PhaseOutcome, Repository, StudentSummary};
pub use source::{FileSource, RecordSource, RecordStream, SqliteSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
