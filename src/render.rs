// Human-readable summary tables
//
// Tables are drawn with ratatui widgets into off-screen buffers, one line
// at a time, then flattened to text for stdout.

use crate::entities::{InstructorSummaryRow, MajorDetails};
use crate::repository::{Repository, StudentSummary};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table, Widget};

pub const STUDENT_FIELDS: [&str; 5] = [
    "CWID",
    "Name",
    "Completed Courses",
    "Remaining Required",
    "Remaining Electives",
];
pub const INSTRUCTOR_FIELDS: [&str; 5] = ["CWID", "Name", "Dept", "Course", "Students"];
pub const MAJOR_FIELDS: [&str; 3] = ["Dept", "Required", "Electives"];

/// Shown when the elective requirement is already satisfied
const SATISFIED: &str = "None";

pub fn join_courses(courses: &[String]) -> String {
    courses.join(", ")
}

pub fn student_row(summary: &StudentSummary) -> Vec<String> {
    vec![
        summary.cwid.clone(),
        summary.name.clone(),
        join_courses(&summary.completed_courses),
        join_courses(&summary.remaining_required),
        summary
            .remaining_electives
            .as_deref()
            .map_or_else(|| SATISFIED.to_string(), join_courses),
    ]
}

pub fn instructor_row(row: &InstructorSummaryRow) -> Vec<String> {
    vec![
        row.cwid.clone(),
        row.name.clone(),
        row.department.clone(),
        row.course.clone(),
        row.students.to_string(),
    ]
}

pub fn major_row(details: &MajorDetails) -> Vec<String> {
    vec![
        details.major.clone(),
        join_courses(&details.required),
        join_courses(&details.electives),
    ]
}

pub fn student_table(repository: &Repository) -> String {
    let rows: Vec<Vec<String>> = repository.student_summary().iter().map(student_row).collect();
    render_table(
        &format!("{} Student Summary", repository.name()),
        &STUDENT_FIELDS,
        &rows,
    )
}

pub fn instructor_table(repository: &Repository) -> String {
    instructor_rows_table(
        &format!("{} Instructor Summary", repository.name()),
        &repository.instructor_summary(),
    )
}

/// Same layout for rows coming from the repository or from SQL
pub fn instructor_rows_table(title: &str, rows: &[InstructorSummaryRow]) -> String {
    let rows: Vec<Vec<String>> = rows.iter().map(instructor_row).collect();
    render_table(title, &INSTRUCTOR_FIELDS, &rows)
}

pub fn major_table(repository: &Repository) -> String {
    let rows: Vec<Vec<String>> = repository.fetch_major_details().map(|d| major_row(&d)).collect();
    render_table(
        &format!("{} Major Summary", repository.name()),
        &MAJOR_FIELDS,
        &rows,
    )
}

/// Render a bordered table whose columns are as wide as their widest cell.
///
/// Every line is drawn into its own one-line buffer, so the row count is
/// unbounded and only a single line has to fit a `Rect`.
pub fn render_table(title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<u16> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let widest = rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            to_u16(widest)
        })
        .collect();

    let columns_width = widths.iter().map(|w| usize::from(*w)).sum::<usize>()
        + widths.len().saturating_sub(1);
    let title = format!(" {} ", title);
    let width = to_u16((columns_width + 2).max(title.chars().count() + 2));

    let mut lines = Vec::with_capacity(rows.len() + 3);

    lines.push(render_line(
        width,
        Block::default()
            .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
            .title(title.as_str()),
    ));

    let header = Row::new(headers.iter().map(|h| Cell::from(*h)))
        .style(Style::default().add_modifier(Modifier::BOLD));
    lines.push(render_row(width, &widths, header));

    for row in rows {
        let row = Row::new(row.iter().map(|cell| Cell::from(cell.as_str())));
        lines.push(render_row(width, &widths, row));
    }

    lines.push(render_line(
        width,
        Block::default().borders(Borders::BOTTOM | Borders::LEFT | Borders::RIGHT),
    ));

    lines.join("\n")
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn render_row(width: u16, widths: &[u16], row: Row<'_>) -> String {
    let table = Table::new([row], widths.iter().map(|w| Constraint::Length(*w)))
        .block(Block::default().borders(Borders::LEFT | Borders::RIGHT));
    render_line(width, table)
}

fn render_line<W: Widget>(width: u16, widget: W) -> String {
    let area = Rect::new(0, 0, width, 1);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer);
    buffer_to_text(&buffer)
}

fn buffer_to_text(buffer: &Buffer) -> String {
    buffer
        .content
        .iter()
        .map(|cell| cell.symbol())
        .collect::<String>()
        .trim_end()
        .to_string()
}
