// Student Entity + Registry
//
// A student accumulates course -> grade associations in first-seen order.
// The CWID is assigned once at creation and never changes.

use super::major::MajorCatalog;
use crate::error::{RepositoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// STUDENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseGrade {
    pub course: String,
    /// `None` until a grade is recorded for the course
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    cwid: String,
    name: String,
    major: String,
    courses: Vec<CourseGrade>,
}

impl Student {
    pub fn new(cwid: String, name: String, major: String) -> Self {
        Student {
            cwid,
            name,
            major,
            courses: Vec::new(),
        }
    }

    pub fn cwid(&self) -> &str {
        &self.cwid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn major(&self) -> &str {
        &self.major
    }

    pub fn change_major(&mut self, major: String) {
        self.major = major;
    }

    fn position(&self, course: &str) -> Option<usize> {
        self.courses.iter().position(|c| c.course == course)
    }

    /// Record a course with no grade yet; an existing entry is left alone
    pub fn add_course(&mut self, course: String) {
        if self.position(&course).is_none() {
            self.courses.push(CourseGrade { course, grade: None });
        }
    }

    /// Record (or overwrite) the grade for a course, keeping first-seen order
    pub fn add_course_grade(&mut self, course: String, grade: String) {
        match self.position(&course) {
            Some(i) => self.courses[i].grade = Some(grade),
            None => self.courses.push(CourseGrade {
                course,
                grade: Some(grade),
            }),
        }
    }

    pub fn grade_for(&self, course: &str) -> Option<&str> {
        self.position(course)
            .and_then(|i| self.courses[i].grade.as_deref())
    }

    pub fn course_grades(&self) -> &[CourseGrade] {
        &self.courses
    }

    /// Course names in the order they were first recorded
    pub fn courses_taken(&self) -> Vec<&str> {
        self.courses.iter().map(|c| c.course.as_str()).collect()
    }

    /// Sorted copy of the course names, used by the summaries
    pub fn completed_courses(&self) -> Vec<String> {
        let mut courses: Vec<String> = self.courses.iter().map(|c| c.course.clone()).collect();
        courses.sort();
        courses
    }

    /// Required and elective courses of this student's major still missing.
    ///
    /// Electives come back as `None` once any elective of the major has
    /// been completed, no matter how many remain. An unknown major counts
    /// as a major with no requirements.
    pub fn remaining_gap(&self, catalog: &MajorCatalog) -> RemainingGap {
        let taken: BTreeSet<&str> = self.courses.iter().map(|c| c.course.as_str()).collect();

        let (required, electives) = match catalog.get(&self.major) {
            Some(major) => (major.required(), major.electives()),
            None => return RemainingGap::default(),
        };

        let remaining_required: BTreeSet<String> = required
            .iter()
            .filter(|c| !taken.contains(c.as_str()))
            .cloned()
            .collect();

        let remaining_electives: BTreeSet<String> = electives
            .iter()
            .filter(|c| !taken.contains(c.as_str()))
            .cloned()
            .collect();

        let electives = if remaining_electives.len() < electives.len() {
            None
        } else {
            Some(remaining_electives)
        };

        RemainingGap {
            required: remaining_required,
            electives,
        }
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cwid | {} | name | {} | major | {}",
            self.cwid, self.name, self.major
        )
    }
}

/// Courses of a major a student has not completed yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingGap {
    pub required: BTreeSet<String>,
    /// `None` when the elective requirement is satisfied
    pub electives: Option<BTreeSet<String>>,
}

impl Default for RemainingGap {
    fn default() -> Self {
        RemainingGap {
            required: BTreeSet::new(),
            electives: Some(BTreeSet::new()),
        }
    }
}

// ============================================================================
// STUDENT REGISTRY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct StudentRegistry {
    students: BTreeMap<String, Student>,
}

impl StudentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a student; an existing record with the same CWID is replaced
    /// and returned
    pub fn add_student(&mut self, student: Student) -> Option<Student> {
        self.students.insert(student.cwid.clone(), student)
    }

    /// Attach a grade to an already loaded student
    pub fn add_grade(&mut self, cwid: &str, course: String, grade: String) -> Result<()> {
        let student = self
            .students
            .get_mut(cwid)
            .ok_or_else(|| RepositoryError::DanglingReference {
                kind: "student",
                id: cwid.to_string(),
            })?;

        student.add_course_grade(course, grade);
        Ok(())
    }

    /// Non-inserting lookup
    pub fn get(&self, cwid: &str) -> Option<&Student> {
        self.students.get(cwid)
    }

    pub fn student(&self, cwid: &str) -> Result<&Student> {
        self.get(cwid)
            .ok_or_else(|| RepositoryError::unknown_student(cwid))
    }

    pub fn courses_taken(&self, cwid: &str) -> Result<Vec<&str>> {
        self.student(cwid).map(Student::courses_taken)
    }

    pub fn remaining_gap(&self, cwid: &str, catalog: &MajorCatalog) -> Result<RemainingGap> {
        self.student(cwid).map(|s| s.remaining_gap(catalog))
    }

    pub fn students(&self) -> &BTreeMap<String, Student> {
        &self.students
    }

    pub fn iter(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(cwid: &str, major: &str) -> Student {
        Student::new(cwid.to_string(), "Jack Jones".to_string(), major.to_string())
    }

    fn sfen_catalog() -> MajorCatalog {
        let mut catalog = MajorCatalog::new();
        for (flag, course) in [
            ("R", "SSW 540"),
            ("R", "SSW 555"),
            ("R", "SSW 810"),
            ("E", "CS 501"),
            ("E", "CS 513"),
            ("E", "CS 545"),
        ] {
            catalog
                .add_course_requirement("SFEN", flag, course.to_string())
                .unwrap();
        }
        catalog
    }

    #[test]
    fn test_student_creation() {
        let s = student("10172", "SFEN");

        assert_eq!(s.cwid(), "10172");
        assert_eq!(s.major(), "SFEN");
        assert!(s.courses_taken().is_empty());
        assert_eq!(
            s.to_string(),
            "cwid | 10172 | name | Jack Jones | major | SFEN"
        );
    }

    #[test]
    fn test_courses_keep_first_seen_order() {
        let mut s = student("10172", "SFEN");
        s.add_course_grade("SSW 810".to_string(), "A".to_string());
        s.add_course_grade("CS 501".to_string(), "B".to_string());
        s.add_course_grade("SSW 810".to_string(), "A-".to_string());

        assert_eq!(s.courses_taken(), vec!["SSW 810", "CS 501"]);
        assert_eq!(s.grade_for("SSW 810"), Some("A-"));
        assert_eq!(s.completed_courses(), vec!["CS 501", "SSW 810"]);
    }

    #[test]
    fn test_add_course_without_grade() {
        let mut s = student("10172", "SFEN");
        s.add_course("SSW 555".to_string());

        assert_eq!(s.courses_taken(), vec!["SSW 555"]);
        assert_eq!(s.grade_for("SSW 555"), None);

        // Does not clobber a recorded grade
        s.add_course_grade("SSW 555".to_string(), "B+".to_string());
        s.add_course("SSW 555".to_string());
        assert_eq!(s.grade_for("SSW 555"), Some("B+"));
        assert_eq!(s.courses_taken().len(), 1);
    }

    #[test]
    fn test_change_major() {
        let mut s = student("10172", "SFEN");
        s.change_major("CS".to_string());

        assert_eq!(s.major(), "CS");
        assert_eq!(s.cwid(), "10172");
    }

    #[test]
    fn test_registry_last_write_wins() {
        let mut registry = StudentRegistry::new();
        assert!(registry.add_student(student("10172", "SFEN")).is_none());

        let replaced = registry.add_student(student("10172", "CS"));

        assert_eq!(replaced.map(|s| s.major().to_string()), Some("SFEN".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.student("10172").unwrap().major(), "CS");
    }

    #[test]
    fn test_add_grade_unknown_student_is_dangling() {
        let mut registry = StudentRegistry::new();
        registry.add_student(student("10172", "SFEN"));

        let result = registry.add_grade("99999", "SSW 555".to_string(), "A".to_string());

        assert_eq!(
            result,
            Err(RepositoryError::DanglingReference {
                kind: "student",
                id: "99999".to_string(),
            })
        );
        assert!(registry.courses_taken("10172").unwrap().is_empty());
        assert!(registry.get("99999").is_none());
    }

    #[test]
    fn test_direct_lookup_of_unknown_student() {
        let registry = StudentRegistry::new();

        assert_eq!(
            registry.courses_taken("10172"),
            Err(RepositoryError::unknown_student("10172"))
        );
    }

    #[test]
    fn test_remaining_gap_without_electives() {
        let catalog = sfen_catalog();
        let mut s = student("10172", "SFEN");
        s.add_course_grade("SSW 555".to_string(), "A".to_string());

        let gap = s.remaining_gap(&catalog);

        assert_eq!(
            gap.required,
            BTreeSet::from(["SSW 540".to_string(), "SSW 810".to_string()])
        );
        // No elective completed: the full elective set remains
        assert_eq!(gap.electives, Some(catalog.electives_of("SFEN").unwrap().clone()));
    }

    #[test]
    fn test_one_elective_satisfies_electives() {
        let catalog = sfen_catalog();
        let mut s = student("10172", "SFEN");
        s.add_course_grade("CS 501".to_string(), "B".to_string());

        let gap = s.remaining_gap(&catalog);

        // Two of three electives are still uncompleted, reported as satisfied
        assert_eq!(gap.electives, None);
        assert_eq!(gap.required.len(), 3);
    }

    #[test]
    fn test_remaining_gap_unknown_major_is_empty() {
        let catalog = sfen_catalog();
        let mut registry = StudentRegistry::new();
        registry.add_student(student("10172", "EE"));

        let gap = registry.remaining_gap("10172", &catalog).unwrap();

        assert!(gap.required.is_empty());
        assert_eq!(gap.electives, Some(BTreeSet::new()));
    }
}
