// Instructor Entity + Registry
//
// Enrollment counters only ever go up during a load.

use crate::error::{RepositoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// INSTRUCTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEnrollment {
    pub course: String,
    pub students: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    cwid: String,
    name: String,
    department: String,
    courses: Vec<CourseEnrollment>,
}

impl Instructor {
    pub fn new(cwid: String, name: String, department: String) -> Self {
        Instructor {
            cwid,
            name,
            department,
            courses: Vec::new(),
        }
    }

    pub fn cwid(&self) -> &str {
        &self.cwid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn change_department(&mut self, department: String) {
        self.department = department;
    }

    /// Count one more student in `course`
    pub fn add_student(&mut self, course: String) {
        match self.courses.iter_mut().find(|c| c.course == course) {
            Some(entry) => entry.students += 1,
            None => self.courses.push(CourseEnrollment { course, students: 1 }),
        }
    }

    /// Students counted for `course`, 0 when the course was never recorded
    pub fn course_enrollments(&self, course: &str) -> u32 {
        self.courses
            .iter()
            .find(|c| c.course == course)
            .map_or(0, |c| c.students)
    }

    pub fn courses_taught(&self) -> Vec<&str> {
        self.courses.iter().map(|c| c.course.as_str()).collect()
    }

    pub fn enrollments(&self) -> &[CourseEnrollment] {
        &self.courses
    }

    /// One summary row per course, in first-seen order
    pub fn summary_rows(&self) -> impl Iterator<Item = InstructorSummaryRow> + '_ {
        self.courses.iter().map(move |c| InstructorSummaryRow {
            cwid: self.cwid.clone(),
            name: self.name.clone(),
            department: self.department.clone(),
            course: c.course.clone(),
            students: c.students,
        })
    }
}

impl fmt::Display for Instructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cwid | {} | name | {} | department | {}",
            self.cwid, self.name, self.department
        )
    }
}

/// Flattened (instructor, course) row shared by the in-memory and SQL summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorSummaryRow {
    pub cwid: String,
    pub name: String,
    pub department: String,
    pub course: String,
    pub students: u32,
}

// ============================================================================
// INSTRUCTOR REGISTRY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct InstructorRegistry {
    instructors: BTreeMap<String, Instructor>,
}

impl InstructorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an instructor; an existing record with the same CWID is
    /// replaced and returned
    pub fn add_instructor(&mut self, instructor: Instructor) -> Option<Instructor> {
        self.instructors.insert(instructor.cwid.clone(), instructor)
    }

    /// Count one enrollment for an already loaded instructor
    pub fn record_enrollment(&mut self, cwid: &str, course: String) -> Result<()> {
        let instructor = self
            .instructors
            .get_mut(cwid)
            .ok_or_else(|| RepositoryError::DanglingReference {
                kind: "instructor",
                id: cwid.to_string(),
            })?;

        instructor.add_student(course);
        Ok(())
    }

    /// Non-inserting lookup
    pub fn get(&self, cwid: &str) -> Option<&Instructor> {
        self.instructors.get(cwid)
    }

    pub fn instructor(&self, cwid: &str) -> Result<&Instructor> {
        self.get(cwid)
            .ok_or_else(|| RepositoryError::unknown_instructor(cwid))
    }

    /// 0 for unknown instructors as well as unknown courses
    pub fn enrollment_count(&self, cwid: &str, course: &str) -> u32 {
        self.get(cwid).map_or(0, |i| i.course_enrollments(course))
    }

    pub fn courses_taught(&self, cwid: &str) -> Result<Vec<&str>> {
        self.instructor(cwid).map(Instructor::courses_taught)
    }

    pub fn instructors(&self) -> &BTreeMap<String, Instructor> {
        &self.instructors
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instructor> {
        self.instructors.values()
    }

    pub fn len(&self) -> usize {
        self.instructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructors.is_empty()
    }
}
