// Record Reader - lazy fixed-arity field tuples from delimited text files
//
// One logical record per line, split on a single-byte delimiter. Quoting is
// disabled: a quote character is data, exactly like a plain split.

use crate::error::{RepositoryError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

// ============================================================================
// SOURCE FILES
// ============================================================================

pub const STUDENTS_FILE: &str = "students.txt";
pub const INSTRUCTORS_FILE: &str = "instructors.txt";
pub const GRADES_FILE: &str = "grades.txt";
pub const MAJORS_FILE: &str = "majors.txt";

pub const STUDENTS_DELIMITER: u8 = b';';
pub const INSTRUCTORS_DELIMITER: u8 = b'|';
pub const GRADES_DELIMITER: u8 = b'|';
pub const MAJORS_DELIMITER: u8 = b'\t';

// ============================================================================
// FIELD READER
// ============================================================================

/// Single-pass reader yielding `[String; N]` per data line.
///
/// Lines are read one at a time so reported line numbers are physical ones,
/// blank lines included. Blank lines are skipped. Each line is split by a csv
/// reader and every field is trimmed. A line that does not split into exactly
/// `N` fields yields `MalformedRecord`, an undecodable one `UnreadableRecord`;
/// either ends the iteration.
pub struct FieldReader<const N: usize> {
    file_name: String,
    lines: BufReader<File>,
    splitter: ReaderBuilder,
    buf: Vec<u8>,
    line: u64,
    finished: bool,
}

impl<const N: usize> FieldReader<N> {
    /// Open `path`, skipping the first line when `header` is set
    pub fn open(path: &Path, delimiter: u8, header: bool) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let file = File::open(path).map_err(|e| RepositoryError::SourceUnavailable {
            location: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut splitter = ReaderBuilder::new();
        splitter
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All);

        let mut reader = FieldReader {
            file_name,
            lines: BufReader::new(file),
            splitter,
            buf: Vec::new(),
            line: 0,
            finished: false,
        };

        if header {
            reader.read_line().map_err(|e| reader.unavailable(e))?;
        }

        Ok(reader)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Physical number of the line read last
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Load the next physical line into `buf` without its terminator
    fn read_line(&mut self) -> io::Result<bool> {
        self.buf.clear();
        if self.lines.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(false);
        }
        self.line += 1;
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        Ok(true)
    }

    fn unavailable(&self, err: io::Error) -> RepositoryError {
        RepositoryError::SourceUnavailable {
            location: self.file_name.clone(),
            reason: err.to_string(),
        }
    }

    fn unreadable(&self, reason: String) -> RepositoryError {
        RepositoryError::UnreadableRecord {
            location: self.file_name.clone(),
            line: self.line,
            reason,
        }
    }

    fn parse_line(&self) -> Result<[String; N]> {
        let text = std::str::from_utf8(&self.buf).map_err(|e| self.unreadable(e.to_string()))?;

        let mut record = StringRecord::new();
        self.splitter
            .from_reader(text.as_bytes())
            .read_record(&mut record)
            .map_err(|e| self.unreadable(e.to_string()))?;

        if record.len() != N {
            return Err(RepositoryError::MalformedRecord {
                location: self.file_name.clone(),
                line: self.line,
                found: record.len(),
                expected: N,
            });
        }

        Ok(std::array::from_fn(|i| record[i].to_string()))
    }
}

impl<const N: usize> Iterator for FieldReader<N> {
    type Item = Result<[String; N]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            match self.read_line() {
                Ok(true) => {}
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(self.unavailable(e)));
                }
            }

            if self.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let record = self.parse_line();
            self.finished = record.is_err();
            return Some(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_fields_and_skips_header() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            STUDENTS_FILE,
            "CWID;Name;Major\n10103;Jobs, S;SFEN\n10115; Bezos, J ;SFEN\n",
        );

        let rows: Vec<[String; 3]> = FieldReader::<3>::open(&path, STUDENTS_DELIMITER, true)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["10103", "Jobs, S", "SFEN"].map(String::from));
        // Fields are trimmed
        assert_eq!(rows[1][1], "Bezos, J");
    }

    #[test]
    fn test_without_header_first_line_is_data() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, GRADES_FILE, "10103|SSW 810|A-|98763\n");

        let rows: Vec<[String; 4]> = FieldReader::<4>::open(&path, GRADES_DELIMITER, false)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows, vec![["10103", "SSW 810", "A-", "98763"].map(String::from)]);
    }

    #[test]
    fn test_tab_delimited_majors() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, MAJORS_FILE, "Major\tFlag\tCourse\nSFEN\tR\tSSW 540\n");

        let mut reader = FieldReader::<3>::open(&path, MAJORS_DELIMITER, true).unwrap();
        let row = reader.next().unwrap().unwrap();

        assert_eq!(row, ["SFEN", "R", "SSW 540"].map(String::from));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_wrong_field_count_names_file_and_line() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            STUDENTS_FILE,
            "CWID;Name;Major\n10103;Jobs, S;SFEN\n10115;Bezos, J\n10183;Musk, E;SFEN\n",
        );

        let mut reader = FieldReader::<3>::open(&path, STUDENTS_DELIMITER, true).unwrap();

        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            RepositoryError::MalformedRecord {
                location: "students.txt".to_string(),
                line: 3,
                found: 2,
                expected: 3,
            }
        );

        // Single pass: nothing after the malformed line
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_quotes_are_plain_data() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, INSTRUCTORS_FILE, "98764|\"Cohen|SFEN\n");

        let row = FieldReader::<3>::open(&path, INSTRUCTORS_DELIMITER, false)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        assert_eq!(row[1], "\"Cohen");
    }

    #[test]
    fn test_blank_lines_are_skipped_but_counted() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            STUDENTS_FILE,
            "CWID;Name;Major\n\n10103;Jobs, S;SFEN\n   \n\r\n10115;Bezos, J;SFEN\n\n10183;Musk, E\n\n",
        );

        let mut reader = FieldReader::<3>::open(&path, STUDENTS_DELIMITER, true).unwrap();

        assert_eq!(reader.next().unwrap().unwrap()[0], "10103");
        assert_eq!(reader.line(), 3);
        assert_eq!(reader.next().unwrap().unwrap()[0], "10115");
        assert_eq!(reader.line(), 6);

        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            RepositoryError::MalformedRecord {
                location: "students.txt".to_string(),
                line: 8,
                found: 2,
                expected: 3,
            }
        );
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_trailing_blank_lines_end_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, GRADES_FILE, "S|C|G|I\n10103|SSW 810|A|98763\n\n\n");

        let rows: Vec<[String; 4]> = FieldReader::<4>::open(&path, GRADES_DELIMITER, true)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_invalid_utf8_is_unreadable_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STUDENTS_FILE);
        fs::write(&path, b"CWID;Name;Major\n\n10103;Jos\xe9;SFEN\n10115;Bezos, J;SFEN\n").unwrap();

        let mut reader = FieldReader::<3>::open(&path, STUDENTS_DELIMITER, true).unwrap();
        let err = reader.next().unwrap().unwrap_err();

        match &err {
            RepositoryError::UnreadableRecord { location, line, .. } => {
                assert_eq!(location, "students.txt");
                assert_eq!(*line, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().starts_with("'students.txt' line 3 cannot be read"));
        assert!(err.aborts_phase());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let result = FieldReader::<3>::open(&dir.path().join("nope.txt"), b';', true);

        assert!(matches!(
            result,
            Err(RepositoryError::SourceUnavailable { .. })
        ));
    }
}
