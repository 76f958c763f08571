use crate::entities::InstructorSummaryRow;
use crate::reader::{
    FieldReader, GRADES_DELIMITER, GRADES_FILE, INSTRUCTORS_DELIMITER, INSTRUCTORS_FILE,
    MAJORS_DELIMITER, MAJORS_FILE, STUDENTS_DELIMITER, STUDENTS_FILE,
};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Row counts copied by `import_directory`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub students: usize,
    pub instructors: usize,
    pub grades: usize,
    pub majors: usize,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            CWID TEXT PRIMARY KEY,
            Name TEXT NOT NULL,
            Major TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS instructors (
            CWID TEXT PRIMARY KEY,
            Name TEXT NOT NULL,
            Dept TEXT NOT NULL
        )",
        [],
    )?;

    // Raw grade lines, invalid grades included
    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades (
            StudentCWID TEXT NOT NULL,
            Course TEXT NOT NULL,
            Grade TEXT,
            InstructorCWID TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS majors (
            Major TEXT NOT NULL,
            Flag TEXT NOT NULL,
            Course TEXT NOT NULL,
            PRIMARY KEY (Major, Flag, Course)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_instructor ON grades(InstructorCWID, Course)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_student ON grades(StudentCWID)",
        [],
    )?;

    Ok(())
}

/// Copy the four flat files of `dir` into the tables, verbatim.
///
/// Students and instructors upsert by CWID; duplicate major entries are
/// ignored. Unlike a repository load, any bad line fails the whole import.
pub fn import_directory(conn: &Connection, dir: &Path) -> Result<ImportStats> {
    let tx = conn.unchecked_transaction()?;
    let mut stats = ImportStats::default();

    for record in FieldReader::<3>::open(&dir.join(STUDENTS_FILE), STUDENTS_DELIMITER, true)? {
        let [cwid, name, major] = record.context("Failed to read students")?;
        tx.execute(
            "INSERT OR REPLACE INTO students (CWID, Name, Major) VALUES (?1, ?2, ?3)",
            params![cwid, name, major],
        )?;
        stats.students += 1;
    }

    for record in
        FieldReader::<3>::open(&dir.join(INSTRUCTORS_FILE), INSTRUCTORS_DELIMITER, true)?
    {
        let [cwid, name, dept] = record.context("Failed to read instructors")?;
        tx.execute(
            "INSERT OR REPLACE INTO instructors (CWID, Name, Dept) VALUES (?1, ?2, ?3)",
            params![cwid, name, dept],
        )?;
        stats.instructors += 1;
    }

    for record in FieldReader::<4>::open(&dir.join(GRADES_FILE), GRADES_DELIMITER, true)? {
        let [student, course, grade, instructor] = record.context("Failed to read grades")?;
        tx.execute(
            "INSERT INTO grades (StudentCWID, Course, Grade, InstructorCWID) VALUES (?1, ?2, ?3, ?4)",
            params![student, course, grade, instructor],
        )?;
        stats.grades += 1;
    }

    for record in FieldReader::<3>::open(&dir.join(MAJORS_FILE), MAJORS_DELIMITER, true)? {
        let [major, flag, course] = record.context("Failed to read majors")?;
        stats.majors += tx.execute(
            "INSERT OR IGNORE INTO majors (Major, Flag, Course) VALUES (?1, ?2, ?3)",
            params![major, flag, course],
        )?;
    }

    tx.commit()?;

    info!(
        students = stats.students,
        instructors = stats.instructors,
        grades = stats.grades,
        majors = stats.majors,
        "Imported {}",
        dir.display()
    );

    Ok(stats)
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let sql = match table {
        "students" => "SELECT COUNT(*) FROM students",
        "instructors" => "SELECT COUNT(*) FROM instructors",
        "grades" => "SELECT COUNT(*) FROM grades",
        "majors" => "SELECT COUNT(*) FROM majors",
        other => bail!("Unknown table: {}", other),
    };

    let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;

    Ok(count)
}

/// Students per (instructor, course), counting only grades that pass the
/// validity filter (first letter A-C, not `C-`)
pub fn instructor_summary(conn: &Connection) -> Result<Vec<InstructorSummaryRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT inst.CWID, inst.Name, inst.Dept, gd.Course, COUNT(gd.StudentCWID) AS Students
             FROM grades AS gd
             JOIN instructors AS inst ON gd.InstructorCWID = inst.CWID
             WHERE gd.Grade IS NOT NULL
               AND gd.Grade <> 'C-'
               AND UPPER(SUBSTR(gd.Grade, 1, 1)) IN ('A', 'B', 'C')
             GROUP BY inst.CWID, inst.Name, inst.Dept, gd.Course
             ORDER BY inst.CWID, gd.Course",
        )
        .context("Failed to prepare instructor summary")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(InstructorSummaryRow {
                cwid: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                course: row.get(3)?,
                students: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
