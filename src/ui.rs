// Terminal browser for a loaded repository
//
// Three pages (students, instructors, majors), each a scrollable table with
// its own selection.

use crate::entities::{InstructorSummaryRow, MajorDetails};
use crate::render::{
    instructor_row, major_row, student_row, INSTRUCTOR_FIELDS, MAJOR_FIELDS, STUDENT_FIELDS,
};
use crate::repository::{Repository, StudentSummary};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_JUMP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Students,
    Instructors,
    Majors,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Students => Page::Instructors,
            Page::Instructors => Page::Majors,
            Page::Majors => Page::Students,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Students => Page::Majors,
            Page::Instructors => Page::Students,
            Page::Majors => Page::Instructors,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Students => "Students",
            Page::Instructors => "Instructors",
            Page::Majors => "Majors",
        }
    }
}

pub struct App {
    pub name: String,
    pub students: Vec<StudentSummary>,
    pub instructors: Vec<InstructorSummaryRow>,
    pub majors: Vec<MajorDetails>,
    pub warnings: usize,
    pub current_page: Page,
    pub student_state: TableState,
    pub instructor_state: TableState,
    pub major_state: TableState,
}

impl App {
    pub fn new(repository: &Repository) -> Self {
        let students = repository.student_summary();
        let instructors = repository.instructor_summary();
        let majors = repository.major_summary();

        Self {
            name: repository.name().to_string(),
            student_state: initial_state(students.len()),
            instructor_state: initial_state(instructors.len()),
            major_state: initial_state(majors.len()),
            students,
            instructors,
            majors,
            warnings: repository.load_report().warning_count(),
            current_page: Page::Students,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Rows on the current page
    pub fn row_count(&self) -> usize {
        match self.current_page {
            Page::Students => self.students.len(),
            Page::Instructors => self.instructors.len(),
            Page::Majors => self.majors.len(),
        }
    }

    pub fn selected(&self) -> Option<usize> {
        match self.current_page {
            Page::Students => self.student_state.selected(),
            Page::Instructors => self.instructor_state.selected(),
            Page::Majors => self.major_state.selected(),
        }
    }

    fn select(&mut self, index: Option<usize>) {
        match self.current_page {
            Page::Students => self.student_state.select(index),
            Page::Instructors => self.instructor_state.select(index),
            Page::Majors => self.major_state.select(index),
        }
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = self.selected().map_or(0, |i| (i + PAGE_JUMP).min(len - 1));
        self.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.row_count() == 0 {
            return;
        }
        let i = self.selected().map_or(0, |i| i.saturating_sub(PAGE_JUMP));
        self.select(Some(i));
    }

    pub fn first(&mut self) {
        if self.row_count() > 0 {
            self.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        let len = self.row_count();
        if len > 0 {
            self.select(Some(len - 1));
        }
    }
}

fn initial_state(len: usize) -> TableState {
    let mut state = TableState::default();
    if len > 0 {
        state.select(Some(0));
    }
    state
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => {
                    app.previous_page()
                }
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Students => render_students(f, chunks[1], app),
        Page::Instructors => render_instructors(f, chunks[1], app),
        Page::Majors => render_majors(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![Span::styled(
        format!("{}  |  ", app.name),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];

    for (i, page) in [Page::Students, Page::Instructors, Page::Majors]
        .iter()
        .enumerate()
    {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_students(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Vec<String>> = app.students.iter().map(student_row).collect();
    let widths = [
        Constraint::Length(8),
        Constraint::Length(20),
        Constraint::Percentage(30),
        Constraint::Percentage(25),
        Constraint::Percentage(25),
    ];
    let table = styled_table(" Students ", &STUDENT_FIELDS, rows, widths);
    f.render_stateful_widget(table, area, &mut app.student_state);
}

fn render_instructors(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Vec<String>> = app.instructors.iter().map(instructor_row).collect();
    let widths = [
        Constraint::Length(8),
        Constraint::Length(24),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(10),
    ];
    let table = styled_table(" Instructors ", &INSTRUCTOR_FIELDS, rows, widths);
    f.render_stateful_widget(table, area, &mut app.instructor_state);
}

fn render_majors(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Vec<String>> = app.majors.iter().map(major_row).collect();
    let widths = [
        Constraint::Length(8),
        Constraint::Percentage(45),
        Constraint::Percentage(45),
    ];
    let table = styled_table(" Majors ", &MAJOR_FIELDS, rows, widths);
    f.render_stateful_widget(table, area, &mut app.major_state);
}

fn styled_table<'a, const N: usize>(
    title: &'a str,
    headers: &[&'a str; N],
    rows: Vec<Vec<String>>,
    widths: [Constraint; N],
) -> Table<'a> {
    let header_cells = headers.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = rows.into_iter().map(|row| Row::new(row).height(1));

    Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ")
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.row_count()),
        Style::default().fg(Color::Cyan),
    )];

    if app.warnings > 0 {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Load warnings: {}", app.warnings),
            Style::default().fg(Color::Red),
        ));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Fast | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
