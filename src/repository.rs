// Repository - loads and cross-links the four record streams
//
// Load order is fixed: students -> instructors -> grades -> majors.
// A phase that fails is logged and skipped; later phases still run against
// whatever was loaded. After construction the repository is read-only.

use crate::config::RepositoryConfig;
use crate::entities::{
    Instructor, InstructorRegistry, InstructorSummaryRow, Major, MajorCatalog, MajorDetails,
    Student, StudentRegistry,
};
use crate::error::{RepositoryError, Result};
use crate::grade::GradeRecord;
use crate::render;
use crate::source::{FileSource, RecordSource, RecordStream};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

// ============================================================================
// LOAD LIFECYCLE
// ============================================================================

/// Forward-only load lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPhase {
    Uninitialized,
    Students,
    Instructors,
    Grades,
    Majors,
    Ready,
}

impl LoadPhase {
    pub fn next(self) -> Self {
        match self {
            LoadPhase::Uninitialized => LoadPhase::Students,
            LoadPhase::Students => LoadPhase::Instructors,
            LoadPhase::Instructors => LoadPhase::Grades,
            LoadPhase::Grades => LoadPhase::Majors,
            LoadPhase::Majors | LoadPhase::Ready => LoadPhase::Ready,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LoadPhase::Uninitialized => "uninitialized",
            LoadPhase::Students => "students",
            LoadPhase::Instructors => "instructors",
            LoadPhase::Grades => "grades",
            LoadPhase::Majors => "majors",
            LoadPhase::Ready => "ready",
        }
    }
}

/// What happened during one load phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: LoadPhase,
    /// Records applied to the registries
    pub records: usize,
    /// Grade lines dropped by the validity filter
    pub filtered: usize,
    /// Non-fatal problems (dangling references, unknown flags)
    pub warnings: Vec<String>,
    /// Error that stopped the phase early
    pub error: Option<String>,
}

impl PhaseOutcome {
    fn new(phase: LoadPhase) -> Self {
        PhaseOutcome {
            phase,
            records: 0,
            filtered: 0,
            warnings: Vec::new(),
            error: None,
        }
    }

    fn warn(&mut self, err: RepositoryError) {
        warn!(phase = self.phase.name(), "{}", err);
        self.warnings.push(err.to_string());
    }

    pub fn completed(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub phases: Vec<PhaseOutcome>,
}

impl LoadReport {
    fn new(source: String) -> Self {
        LoadReport {
            source,
            started_at: Utc::now(),
            finished_at: None,
            phases: Vec::new(),
        }
    }

    pub fn phase(&self, phase: LoadPhase) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn warning_count(&self) -> usize {
        self.phases.iter().map(|p| p.warnings.len()).sum()
    }

    /// Every phase ran to the end without warnings
    pub fn is_clean(&self) -> bool {
        self.phases
            .iter()
            .all(|p| p.completed() && p.warnings.is_empty())
    }
}

// ============================================================================
// SUMMARIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub cwid: String,
    pub name: String,
    pub major: String,
    pub completed_courses: Vec<String>,
    pub remaining_required: Vec<String>,
    /// `None` once an elective of the major is completed
    pub remaining_electives: Option<Vec<String>>,
}

// ============================================================================
// REPOSITORY
// ============================================================================

pub struct Repository {
    name: String,
    phase: LoadPhase,
    students: StudentRegistry,
    instructors: InstructorRegistry,
    majors: MajorCatalog,
    report: LoadReport,
}

impl Repository {
    /// Load from the configured directory, printing the summary tables
    /// when `pretty_print` is set
    pub fn open(config: &RepositoryConfig) -> Self {
        let source = FileSource::new(config.resolved_dir());
        let repository = Self::load(&config.name, &source);

        if config.pretty_print {
            println!("{}", render::student_table(&repository));
            println!("{}", render::instructor_table(&repository));
            println!("{}", render::major_table(&repository));
        }

        repository
    }

    /// Run all four load phases against `source`
    pub fn load(name: &str, source: &dyn RecordSource) -> Self {
        let mut repository = Repository {
            name: name.to_string(),
            phase: LoadPhase::Uninitialized,
            students: StudentRegistry::new(),
            instructors: InstructorRegistry::new(),
            majors: MajorCatalog::new(),
            report: LoadReport::new(source.describe()),
        };

        info!(repository = name, source = %source.describe(), "Loading repository");

        repository.run_phase(source.students(), |repo, [cwid, name, major], outcome| {
            if repo.students.add_student(Student::new(cwid, name, major)).is_some() {
                debug!("Replaced duplicate student record");
            }
            outcome.records += 1;
        });

        repository.run_phase(source.instructors(), |repo, [cwid, name, dept], outcome| {
            if repo.instructors.add_instructor(Instructor::new(cwid, name, dept)).is_some() {
                debug!("Replaced duplicate instructor record");
            }
            outcome.records += 1;
        });

        repository.run_phase(source.grades(), |repo, fields, outcome| {
            repo.apply_grade(GradeRecord::from_fields(fields), outcome);
        });

        repository.run_phase(source.majors(), |repo, [major, flag, course], outcome| {
            match repo.majors.add_course_requirement(&major, &flag, course) {
                Ok(()) => outcome.records += 1,
                Err(e) => outcome.warn(e),
            }
        });

        repository.phase = repository.phase.next();
        repository.report.finished_at = Some(Utc::now());

        info!(
            students = repository.students.len(),
            instructors = repository.instructors.len(),
            majors = repository.majors.len(),
            warnings = repository.report.warning_count(),
            "Repository ready"
        );

        repository
    }

    fn run_phase<const N: usize, F>(&mut self, stream: Result<RecordStream<'_, N>>, mut apply: F)
    where
        F: FnMut(&mut Self, [String; N], &mut PhaseOutcome),
    {
        self.phase = self.phase.next();
        let mut outcome = PhaseOutcome::new(self.phase);

        match stream {
            Ok(records) => {
                for record in records {
                    match record {
                        Ok(fields) => apply(self, fields, &mut outcome),
                        Err(e) => {
                            warn!(phase = self.phase.name(), "{}", e);
                            outcome.error = Some(e.to_string());
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(phase = self.phase.name(), "{}", e);
                outcome.error = Some(e.to_string());
            }
        }

        debug!(
            phase = self.phase.name(),
            records = outcome.records,
            filtered = outcome.filtered,
            "Phase finished"
        );
        self.report.phases.push(outcome);
    }

    /// Join one grade line to its student and instructor
    fn apply_grade(&mut self, grade: GradeRecord, outcome: &mut PhaseOutcome) {
        if !grade.is_valid() {
            outcome.filtered += 1;
            return;
        }

        let GradeRecord {
            student_cwid,
            course,
            grade,
            instructor_cwid,
        } = grade;

        if let Err(e) = self.students.add_grade(&student_cwid, course.clone(), grade) {
            outcome.warn(e);
        }

        if let Err(e) = self.instructors.record_enrollment(&instructor_cwid, course) {
            outcome.warn(e);
        }

        outcome.records += 1;
    }

    // ========================================================================
    // READ SURFACE
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    pub fn students(&self) -> &StudentRegistry {
        &self.students
    }

    pub fn instructors(&self) -> &InstructorRegistry {
        &self.instructors
    }

    pub fn majors(&self) -> &MajorCatalog {
        &self.majors
    }

    pub fn fetch_students(&self) -> &BTreeMap<String, Student> {
        self.students.students()
    }

    pub fn fetch_instructors(&self) -> &BTreeMap<String, Instructor> {
        self.instructors.instructors()
    }

    pub fn fetch_majors(&self) -> &BTreeMap<String, Major> {
        self.majors.majors()
    }

    /// Lazy (major, required, electives) rows
    pub fn fetch_major_details(&self) -> impl Iterator<Item = MajorDetails> + '_ {
        self.majors.details()
    }

    pub fn student(&self, cwid: &str) -> Result<&Student> {
        self.students.student(cwid)
    }

    pub fn instructor(&self, cwid: &str) -> Result<&Instructor> {
        self.instructors.instructor(cwid)
    }

    pub fn student_summary(&self) -> Vec<StudentSummary> {
        self.students
            .iter()
            .map(|student| self.summarize_student(student))
            .collect()
    }

    pub fn summarize_student(&self, student: &Student) -> StudentSummary {
        let gap = student.remaining_gap(&self.majors);

        StudentSummary {
            cwid: student.cwid().to_string(),
            name: student.name().to_string(),
            major: student.major().to_string(),
            completed_courses: student.completed_courses(),
            remaining_required: gap.required.into_iter().collect(),
            remaining_electives: gap.electives.map(|e| e.into_iter().collect()),
        }
    }

    pub fn instructor_summary(&self) -> Vec<InstructorSummaryRow> {
        self.instructors
            .iter()
            .flat_map(|instructor| instructor.summary_rows())
            .collect()
    }

    pub fn major_summary(&self) -> Vec<MajorDetails> {
        self.fetch_major_details().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{GRADES_FILE, INSTRUCTORS_FILE, MAJORS_FILE, STUDENTS_FILE};
    use std::fs;
    use tempfile::TempDir;

    const STUDENTS: &str = "CWID;Name;Major
10103;Jobs, S;SFEN
10115;Bezos, J;SFEN
10183;Musk, E;SFEN
11714;Gates, B;CS
";

    const INSTRUCTORS: &str = "CWID|Name|Dept
98764|Cohen, R|SFEN
98763|Rowland, J|SFEN
98762|Hawking, S|CS
";

    const GRADES: &str = "StudentCWID|Course|Grade|InstructorCWID
10103|SSW 810|A-|98763
10103|CS 501|B|98762
10115|SSW 810|A|98763
10115|CS 546|C-|98764
10183|SSW 555|A|98763
10183|SSW 810|A|98763
11714|SSW 810|B-|98763
11714|CS 546|A|98764
11714|CS 570|A-|98762
11714|SSW 565|F|98764
";

    const MAJORS: &str = "Major\tFlag\tCourse
SFEN\tR\tSSW 540
SFEN\tR\tSSW 555
SFEN\tR\tSSW 810
SFEN\tE\tCS 501
SFEN\tE\tCS 546
CS\tR\tCS 546
CS\tR\tCS 570
CS\tE\tSSW 565
CS\tE\tSSW 810
";

    fn write_fixture(students: &str, instructors: &str, grades: &str, majors: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (file, contents) in [
            (STUDENTS_FILE, students),
            (INSTRUCTORS_FILE, instructors),
            (GRADES_FILE, grades),
            (MAJORS_FILE, majors),
        ] {
            fs::write(dir.path().join(file), contents).unwrap();
        }
        dir
    }

    fn load(dir: &TempDir) -> Repository {
        Repository::load("Stevens", &FileSource::new(dir.path()))
    }

    #[test]
    fn test_end_to_end_single_grade() {
        let dir = write_fixture(
            "CWID;Name;Major\n10172;Jack Jones;SFEN\n",
            "CWID|Name|Dept\n98763|Dr. Lin|SFEN\n",
            "StudentCWID|Course|Grade|InstructorCWID\n10172|SSW 555|A|98763\n",
            "Major\tFlag\tCourse\nSFEN\tR\tSSW 555\n",
        );

        let repo = load(&dir);

        assert_eq!(repo.fetch_students()["10172"].courses_taken(), vec!["SSW 555"]);
        assert_eq!(repo.fetch_instructors()["98763"].course_enrollments("SSW 555"), 1);
        assert_eq!(
            repo.fetch_majors()["SFEN"].required().iter().collect::<Vec<_>>(),
            vec!["SSW 555"]
        );
        assert!(repo.load_report().is_clean());
    }

    #[test]
    fn test_student_summary_courses() {
        let dir = write_fixture(STUDENTS, INSTRUCTORS, GRADES, MAJORS);
        let repo = load(&dir);
        let students = repo.fetch_students();

        assert_eq!(students["10103"].courses_taken(), vec!["SSW 810", "CS 501"]);
        assert_eq!(students["10115"].courses_taken(), vec!["SSW 810"]);
        assert_eq!(students["10183"].courses_taken(), vec!["SSW 555", "SSW 810"]);
        assert_eq!(
            students["11714"].courses_taken(),
            vec!["SSW 810", "CS 546", "CS 570"]
        );
    }

    #[test]
    fn test_instructor_enrollments() {
        let dir = write_fixture(STUDENTS, INSTRUCTORS, GRADES, MAJORS);
        let repo = load(&dir);
        let instructors = repo.fetch_instructors();

        assert_eq!(instructors["98762"].course_enrollments("CS 501"), 1);
        assert_eq!(instructors["98764"].course_enrollments("CS 546"), 1);
        assert_eq!(instructors["98763"].course_enrollments("SSW 810"), 4);
        // Only the failing grade was recorded against SSW 565
        assert_eq!(instructors["98764"].course_enrollments("SSW 565"), 0);
        assert_eq!(repo.instructors().enrollment_count("98762", "SSW 999"), 0);
    }

    #[test]
    fn test_invalid_grades_are_filtered() {
        let dir = write_fixture(STUDENTS, INSTRUCTORS, GRADES, MAJORS);
        let repo = load(&dir);

        let grades = repo.load_report().phase(LoadPhase::Grades).unwrap();
        assert_eq!(grades.filtered, 2);
        assert_eq!(grades.records, 8);
        assert!(grades.warnings.is_empty());
        assert!(!repo.student("10115").unwrap().courses_taken().contains(&"CS 546"));
    }

    #[test]
    fn test_major_summary() {
        let dir = write_fixture(STUDENTS, INSTRUCTORS, GRADES, MAJORS);
        let repo = load(&dir);

        let details = repo.major_summary();
        assert_eq!(
            details,
            vec![
                MajorDetails {
                    major: "CS".to_string(),
                    required: vec!["CS 546".to_string(), "CS 570".to_string()],
                    electives: vec!["SSW 565".to_string(), "SSW 810".to_string()],
                },
                MajorDetails {
                    major: "SFEN".to_string(),
                    required: vec![
                        "SSW 540".to_string(),
                        "SSW 555".to_string(),
                        "SSW 810".to_string()
                    ],
                    electives: vec!["CS 501".to_string(), "CS 546".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_student_gap_analysis() {
        let dir = write_fixture(STUDENTS, INSTRUCTORS, GRADES, MAJORS);
        let repo = load(&dir);

        let summary = repo.student_summary();
        let jobs = summary.iter().find(|s| s.cwid == "10103").unwrap();
        let bezos = summary.iter().find(|s| s.cwid == "10115").unwrap();

        assert_eq!(jobs.completed_courses, vec!["CS 501", "SSW 810"]);
        assert_eq!(jobs.remaining_required, vec!["SSW 540", "SSW 555"]);
        // CS 501 is an SFEN elective
        assert_eq!(jobs.remaining_electives, None);

        assert_eq!(
            bezos.remaining_electives,
            Some(vec!["CS 501".to_string(), "CS 546".to_string()])
        );
    }

    #[test]
    fn test_dangling_references_are_dropped() {
        let dir = write_fixture(
            STUDENTS,
            INSTRUCTORS,
            "S|C|G|I\n99999|SSW 810|A|98763\n10103|SSW 810|A|11111\n",
            MAJORS,
        );
        let repo = load(&dir);

        let grades = repo.load_report().phase(LoadPhase::Grades).unwrap();
        assert_eq!(grades.warnings.len(), 2);
        assert!(grades.completed());

        // The unknown student line still counts for the known instructor
        assert_eq!(repo.instructors().enrollment_count("98763", "SSW 810"), 1);
        assert!(repo.fetch_students().get("99999").is_none());
        assert_eq!(repo.fetch_students().len(), 4);
        assert_eq!(repo.student("10103").unwrap().courses_taken(), vec!["SSW 810"]);
    }

    #[test]
    fn test_duplicate_student_overwrites() {
        let dir = write_fixture(
            "CWID;Name;Major\n10103;Jobs, S;SFEN\n10103;Jobs, Steve;CS\n",
            INSTRUCTORS,
            "",
            MAJORS,
        );
        let repo = load(&dir);

        assert_eq!(repo.fetch_students().len(), 1);
        assert_eq!(repo.student("10103").unwrap().name(), "Jobs, Steve");
    }

    #[test]
    fn test_missing_file_skips_only_that_phase() {
        let dir = write_fixture(STUDENTS, INSTRUCTORS, GRADES, MAJORS);
        fs::remove_file(dir.path().join(INSTRUCTORS_FILE)).unwrap();

        let repo = load(&dir);
        let report = repo.load_report();

        assert!(!report.phase(LoadPhase::Instructors).unwrap().completed());
        assert!(repo.fetch_instructors().is_empty());

        // Grades still reach students; every instructor reference dangles
        assert_eq!(repo.student("11714").unwrap().courses_taken().len(), 3);
        assert_eq!(report.phase(LoadPhase::Grades).unwrap().warnings.len(), 8);
        assert_eq!(repo.fetch_majors().len(), 2);
        assert_eq!(repo.phase(), LoadPhase::Ready);
    }

    #[test]
    fn test_malformed_line_aborts_rest_of_phase() {
        let dir = write_fixture(
            "CWID;Name;Major\n10103;Jobs, S;SFEN\n10115;Bezos, J\n10183;Musk, E;SFEN\n",
            INSTRUCTORS,
            GRADES,
            MAJORS,
        );
        let repo = load(&dir);

        let students = repo.load_report().phase(LoadPhase::Students).unwrap();
        assert_eq!(
            students.error.as_deref(),
            Some("'students.txt' has 2 fields on line 3 but expected 3")
        );
        assert_eq!(students.records, 1);
        assert_eq!(repo.fetch_students().len(), 1);

        // Later phases still ran
        assert_eq!(repo.fetch_instructors().len(), 3);
        assert_eq!(repo.student("10103").unwrap().courses_taken().len(), 2);
    }

    #[test]
    fn test_unknown_requirement_flag_is_skipped() {
        let dir = write_fixture(
            STUDENTS,
            INSTRUCTORS,
            GRADES,
            "Major\tFlag\tCourse\nSFEN\tR\tSSW 540\nSFEN\tX\tSSW 999\nSFEN\tE\tCS 501\n",
        );
        let repo = load(&dir);

        let majors = repo.load_report().phase(LoadPhase::Majors).unwrap();
        assert_eq!(majors.records, 2);
        assert_eq!(majors.warnings.len(), 1);
        assert_eq!(repo.majors().electives_of("SFEN").unwrap().len(), 1);
    }

    #[test]
    fn test_student_with_unknown_major() {
        let dir = write_fixture(
            "CWID;Name;Major\n10200;Lovelace, A;MATH\n",
            INSTRUCTORS,
            "S|C|G|I\n10200|SSW 810|A|98763\n",
            MAJORS,
        );
        let repo = load(&dir);

        let summary = repo.student_summary();
        assert_eq!(summary.len(), 1);
        assert!(summary[0].remaining_required.is_empty());
        assert_eq!(summary[0].remaining_electives, Some(Vec::new()));
        assert!(repo.majors().major("MATH").is_err());
    }

    #[test]
    fn test_phases_run_in_order() {
        let dir = write_fixture(STUDENTS, INSTRUCTORS, GRADES, MAJORS);
        let repo = load(&dir);

        let phases: Vec<LoadPhase> = repo.load_report().phases.iter().map(|p| p.phase).collect();
        assert_eq!(
            phases,
            vec![
                LoadPhase::Students,
                LoadPhase::Instructors,
                LoadPhase::Grades,
                LoadPhase::Majors
            ]
        );
        assert_eq!(repo.phase(), LoadPhase::Ready);
        assert_eq!(repo.name(), "Stevens");
        assert!(repo.load_report().finished_at.is_some());
    }

    #[test]
    fn test_instructor_summary_rows() {
        let dir = write_fixture(STUDENTS, INSTRUCTORS, GRADES, MAJORS);
        let repo = load(&dir);

        let rows = repo.instructor_summary();
        let rowland: Vec<_> = rows.iter().filter(|r| r.cwid == "98763").collect();

        assert_eq!(rows.len(), 5);
        assert_eq!(rowland.len(), 2);
        assert_eq!(rowland[0].course, "SSW 810");
        assert_eq!(rowland[0].students, 4);
    }

    #[test]
    fn test_summaries_are_ordered_by_cwid() {
        let dir = write_fixture(
            "CWID;Name;Major\n11714;Gates, B;CS\n10183;Musk, E;SFEN\n10103;Jobs, S;SFEN\n",
            INSTRUCTORS,
            GRADES,
            MAJORS,
        );
        let repo = load(&dir);

        let students: Vec<String> = repo.student_summary().into_iter().map(|s| s.cwid).collect();
        assert_eq!(students, vec!["10103", "10183", "11714"]);

        // instructors.txt lists 98764 first
        let instructors: Vec<String> = repo
            .instructor_summary()
            .into_iter()
            .map(|row| row.cwid)
            .collect();
        assert_eq!(instructors.first().map(String::as_str), Some("98762"));
        assert!(instructors.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_open_with_config() {
        let dir = write_fixture(STUDENTS, INSTRUCTORS, GRADES, MAJORS);
        let config = RepositoryConfig::new("Stevens", Some(dir.path().to_path_buf()), true);

        let repo = Repository::open(&config);

        assert_eq!(repo.fetch_students().len(), 4);
    }
}
