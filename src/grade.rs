// Grade records and the validity filter applied while joining grades

use serde::{Deserialize, Serialize};

/// Literal grade excluded even though its letter is within range
pub const EXCLUDED_GRADE: &str = "C-";

/// Highest accepted distance of the grade letter from 'A' (A, B, C)
pub const MAX_LETTER_RANK: u8 = 2;

/// Decide whether a raw grade token counts toward completion and enrollment.
///
/// Valid when the first letter (case-insensitive) is A, B or C and the token
/// is not literally `C-`. Empty tokens are invalid.
pub fn is_valid_grade(grade: &str) -> bool {
    let letter = match grade.chars().next() {
        Some(c) => c.to_ascii_uppercase(),
        None => return false,
    };

    if !letter.is_ascii_uppercase() {
        return false;
    }

    let rank = letter as u8 - b'A';
    rank <= MAX_LETTER_RANK && grade != EXCLUDED_GRADE
}

/// One line of the grades stream: the join key between students and instructors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub student_cwid: String,
    pub course: String,
    pub grade: String,
    pub instructor_cwid: String,
}

impl GradeRecord {
    pub fn from_fields([student_cwid, course, grade, instructor_cwid]: [String; 4]) -> Self {
        GradeRecord {
            student_cwid,
            course,
            grade,
            instructor_cwid,
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_grade(&self.grade)
    }
}
