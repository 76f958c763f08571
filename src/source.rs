// Record sources - where the four record streams come from
//
// The repository only sees fixed-arity field tuples, so a directory of flat
// files and a SQLite database produce the same read surface.

use crate::error::{RepositoryError, Result};
use crate::reader::{
    FieldReader, GRADES_DELIMITER, GRADES_FILE, INSTRUCTORS_DELIMITER, INSTRUCTORS_FILE,
    MAJORS_DELIMITER, MAJORS_FILE, STUDENTS_DELIMITER, STUDENTS_FILE,
};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Lazy, single-pass stream of `N`-field records
pub type RecordStream<'a, const N: usize> = Box<dyn Iterator<Item = Result<[String; N]>> + 'a>;

/// Provider of the student, instructor, grade and major streams
pub trait RecordSource {
    /// Human-readable location, used in log messages
    fn describe(&self) -> String;

    /// (cwid, name, major)
    fn students(&self) -> Result<RecordStream<'_, 3>>;

    /// (cwid, name, department)
    fn instructors(&self) -> Result<RecordStream<'_, 3>>;

    /// (student cwid, course, grade, instructor cwid)
    fn grades(&self) -> Result<RecordStream<'_, 4>>;

    /// (major, requirement flag, course)
    fn majors(&self) -> Result<RecordStream<'_, 3>>;
}

// ============================================================================
// FLAT FILES
// ============================================================================

/// Directory holding students.txt, instructors.txt, grades.txt and majors.txt,
/// each starting with a header line
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSource { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn open<const N: usize>(&self, file: &str, delimiter: u8) -> Result<RecordStream<'_, N>> {
        let reader = FieldReader::<N>::open(&self.dir.join(file), delimiter, true)?;
        Ok(Box::new(reader))
    }
}

impl RecordSource for FileSource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn students(&self) -> Result<RecordStream<'_, 3>> {
        self.open(STUDENTS_FILE, STUDENTS_DELIMITER)
    }

    fn instructors(&self) -> Result<RecordStream<'_, 3>> {
        self.open(INSTRUCTORS_FILE, INSTRUCTORS_DELIMITER)
    }

    fn grades(&self) -> Result<RecordStream<'_, 4>> {
        self.open(GRADES_FILE, GRADES_DELIMITER)
    }

    fn majors(&self) -> Result<RecordStream<'_, 3>> {
        self.open(MAJORS_FILE, MAJORS_DELIMITER)
    }
}

// ============================================================================
// SQLITE
// ============================================================================

/// Tables created by `db::setup_database` (or an equivalent legacy database)
pub struct SqliteSource {
    conn: Connection,
    location: String,
}

impl SqliteSource {
    pub fn new(conn: Connection) -> Self {
        let location = conn
            .path()
            .filter(|p| !p.is_empty())
            .unwrap_or(":memory:")
            .to_string();

        SqliteSource { conn, location }
    }

    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RepositoryError::SourceUnavailable {
                location: path.display().to_string(),
                reason: "database file does not exist".to_string(),
            });
        }

        let conn = Connection::open(path).map_err(|e| RepositoryError::SourceUnavailable {
            location: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `sql` and hand back its rows as text tuples.
    ///
    /// Rows are read up front; the statement cannot outlive this call.
    fn query<const N: usize>(&self, table: &str, sql: &str) -> Result<RecordStream<'_, N>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| sql_error(table, e))?;

        let rows = stmt
            .query_map([], |row| {
                (0..N)
                    .map(|i| row.get::<_, Value>(i).map(value_to_field))
                    .collect::<rusqlite::Result<Vec<String>>>()
            })
            .map_err(|e| sql_error(table, e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| sql_error(table, e))?;

        let table = table.to_string();
        Ok(Box::new(rows.into_iter().enumerate().map(move |(i, fields)| {
            let found = fields.len();
            <[String; N]>::try_from(fields).map_err(|_| RepositoryError::MalformedRecord {
                location: table.clone(),
                line: i as u64 + 1,
                found,
                expected: N,
            })
        })))
    }
}

impl RecordSource for SqliteSource {
    fn describe(&self) -> String {
        self.location.clone()
    }

    fn students(&self) -> Result<RecordStream<'_, 3>> {
        self.query("students", "SELECT CWID, Name, Major FROM students ORDER BY rowid")
    }

    fn instructors(&self) -> Result<RecordStream<'_, 3>> {
        self.query("instructors", "SELECT CWID, Name, Dept FROM instructors ORDER BY rowid")
    }

    fn grades(&self) -> Result<RecordStream<'_, 4>> {
        self.query(
            "grades",
            "SELECT StudentCWID, Course, Grade, InstructorCWID FROM grades ORDER BY rowid",
        )
    }

    fn majors(&self) -> Result<RecordStream<'_, 3>> {
        self.query("majors", "SELECT Major, Flag, Course FROM majors ORDER BY rowid")
    }
}

/// CWIDs may be stored as integers; NULL becomes an empty field
fn value_to_field(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.trim().to_string(),
        Value::Blob(b) => String::from_utf8_lossy(&b).trim().to_string(),
    }
}

fn sql_error(table: &str, err: rusqlite::Error) -> RepositoryError {
    let message = err.to_string();
    if message.contains("no such table") {
        RepositoryError::SourceUnavailable {
            location: table.to_string(),
            reason: message,
        }
    } else {
        RepositoryError::Database(message)
    }
}
