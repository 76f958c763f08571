// Major Catalog - required and elective course sets per major

use crate::error::{RepositoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

// ============================================================================
// REQUIREMENT STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequirementStatus {
    Required,
    Elective,
}

impl RequirementStatus {
    /// Flag as written in the majors file
    pub fn flag(&self) -> &'static str {
        match self {
            RequirementStatus::Required => "R",
            RequirementStatus::Elective => "E",
        }
    }
}

impl FromStr for RequirementStatus {
    type Err = String;

    fn from_str(flag: &str) -> std::result::Result<Self, Self::Err> {
        match flag.to_ascii_uppercase().as_str() {
            "R" | "REQUIRED" => Ok(RequirementStatus::Required),
            "E" | "ELECTIVE" => Ok(RequirementStatus::Elective),
            _ => Err(flag.to_string()),
        }
    }
}

// ============================================================================
// MAJOR
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Major {
    name: String,
    required: BTreeSet<String>,
    electives: BTreeSet<String>,
}

impl Major {
    pub fn new(name: String) -> Self {
        Major {
            name,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    pub fn electives(&self) -> &BTreeSet<String> {
        &self.electives
    }

    pub fn courses(&self, status: RequirementStatus) -> &BTreeSet<String> {
        match status {
            RequirementStatus::Required => &self.required,
            RequirementStatus::Elective => &self.electives,
        }
    }

    pub fn add_course(&mut self, status: RequirementStatus, course: String) {
        match status {
            RequirementStatus::Required => self.required.insert(course),
            RequirementStatus::Elective => self.electives.insert(course),
        };
    }

    pub fn details(&self) -> MajorDetails {
        MajorDetails {
            major: self.name.clone(),
            required: self.required.iter().cloned().collect(),
            electives: self.electives.iter().cloned().collect(),
        }
    }
}

/// Summary row: major name with sorted required and elective lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorDetails {
    pub major: String,
    pub required: Vec<String>,
    pub electives: Vec<String>,
}

// ============================================================================
// MAJOR CATALOG
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MajorCatalog {
    majors: BTreeMap<String, Major>,
}

impl MajorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `course` under `flag` for `major`, creating the major if new
    pub fn add_course_requirement(&mut self, major: &str, flag: &str, course: String) -> Result<()> {
        let status = flag
            .parse::<RequirementStatus>()
            .map_err(|flag| RepositoryError::UnknownRequirementFlag {
                major: major.to_string(),
                flag,
            })?;

        self.majors
            .entry(major.to_string())
            .or_insert_with(|| Major::new(major.to_string()))
            .add_course(status, course);

        Ok(())
    }

    /// Non-inserting lookup
    pub fn get(&self, name: &str) -> Option<&Major> {
        self.majors.get(name)
    }

    pub fn major(&self, name: &str) -> Result<&Major> {
        self.get(name)
            .ok_or_else(|| RepositoryError::unknown_major(name))
    }

    pub fn requirements_of(&self, name: &str) -> Result<&BTreeSet<String>> {
        self.major(name).map(Major::required)
    }

    pub fn electives_of(&self, name: &str) -> Result<&BTreeSet<String>> {
        self.major(name).map(Major::electives)
    }

    pub fn majors(&self) -> &BTreeMap<String, Major> {
        &self.majors
    }

    /// Lazy (major, required, electives) rows
    pub fn details(&self) -> impl Iterator<Item = MajorDetails> + '_ {
        self.majors.values().map(Major::details)
    }

    pub fn len(&self) -> usize {
        self.majors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.majors.is_empty()
    }
}
