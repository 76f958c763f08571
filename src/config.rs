// Repository configuration

use std::env;
use std::path::PathBuf;

pub const DEFAULT_NAME: &str = "Stevens";

/// How a repository is constructed from flat files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Display name of the university
    pub name: String,
    /// Directory containing the four data files; `None` means the current directory
    pub source_dir: Option<PathBuf>,
    /// Print the summary tables once loaded
    pub pretty_print: bool,
}

impl RepositoryConfig {
    pub fn new(name: impl Into<String>, source_dir: Option<PathBuf>, pretty_print: bool) -> Self {
        RepositoryConfig {
            name: name.into(),
            source_dir,
            pretty_print,
        }
    }

    /// Directory the data files are read from
    pub fn resolved_dir(&self) -> PathBuf {
        match &self.source_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NAME, None, false)
    }
}
