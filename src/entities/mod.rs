// Entity Models - students, instructors and the major catalog
//
// Each registry owns its records keyed by a unique identifier:
// - inserts are last-write-wins
// - `get` never inserts, direct accessors report `UnknownKey`

pub mod instructor;
pub mod major;
pub mod student;

pub use instructor::{CourseEnrollment, Instructor, InstructorRegistry, InstructorSummaryRow};
pub use major::{Major, MajorCatalog, MajorDetails, RequirementStatus};
pub use student::{CourseGrade, RemainingGap, Student, StudentRegistry};
