use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use university_repository::{
    count_rows, db, import_directory, render, setup_database, Repository, RepositoryConfig,
    SqliteSource, DEFAULT_NAME,
};

const DEFAULT_DB: &str = "university.db";

#[derive(Parser, Debug)]
#[command(name = "university-repository")]
#[command(about = "Student, instructor and major summaries from flat files", long_about = None)]
struct Cli {
    /// University name used in table titles
    #[arg(long, env = "UNIVERSITY_NAME", default_value = DEFAULT_NAME, global = true)]
    name: String,

    /// Directory holding the four data files (defaults to the current directory)
    #[arg(long, env = "UNIVERSITY_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// SQLite database to import into or read from
    #[arg(long, env = "UNIVERSITY_DB", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the student, instructor and major tables (default)
    Summary,
    /// Copy the data files into a SQLite database
    Import,
    /// Instructor summary computed in SQL
    Instructors,
    /// Browse the tables in the terminal
    Browse,
    /// Print the load report as JSON
    Report,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("university_repository=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Command::Summary) {
        Command::Summary => run_summary(&cli)?,
        Command::Import => run_import(&cli)?,
        Command::Instructors => run_instructors(&cli)?,
        Command::Browse => run_ui_mode(&cli)?,
        Command::Report => run_report(&cli)?,
    }

    Ok(())
}

fn config(cli: &Cli, pretty_print: bool) -> RepositoryConfig {
    RepositoryConfig::new(cli.name.clone(), cli.data_dir.clone(), pretty_print)
}

/// Load from `--db` when given, otherwise from the data directory
fn load_repository(cli: &Cli) -> Result<Repository> {
    match &cli.db {
        Some(db_path) => {
            let source = SqliteSource::open(db_path)?;
            Ok(Repository::load(&cli.name, &source))
        }
        None => Ok(Repository::open(&config(cli, false))),
    }
}

fn db_path(cli: &Cli) -> &Path {
    cli.db.as_deref().unwrap_or_else(|| Path::new(DEFAULT_DB))
}

fn run_summary(cli: &Cli) -> Result<()> {
    let repository = match &cli.db {
        Some(_) => {
            let repository = load_repository(cli)?;
            println!("{}", render::student_table(&repository));
            println!("{}", render::instructor_table(&repository));
            println!("{}", render::major_table(&repository));
            repository
        }
        None => Repository::open(&config(cli, true)),
    };

    let warnings = repository.load_report().warning_count();
    if warnings > 0 {
        eprintln!("⚠️  {} records were skipped while loading (see `report`)", warnings);
    }

    Ok(())
}

fn run_import(cli: &Cli) -> Result<()> {
    println!("🗄️  Data Import - flat files → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let data_dir = config(cli, false).resolved_dir();
    let db_path = db_path(cli);

    println!("\n🔧 Setting up database {:?}...", db_path);
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");

    println!("\n💾 Importing {:?}...", data_dir);
    let stats = import_directory(&conn, &data_dir)?;
    println!("✓ {} students", stats.students);
    println!("✓ {} instructors", stats.instructors);
    println!("✓ {} grades", stats.grades);
    println!("✓ {} major requirements", stats.majors);

    println!("\n🔍 Verifying database...");
    for table in ["students", "instructors", "grades", "majors"] {
        println!("✓ {} contains {} rows", table, count_rows(&conn, table)?);
    }

    Ok(())
}

fn run_instructors(cli: &Cli) -> Result<()> {
    let db_path = db_path(cli);

    if !db_path.exists() {
        eprintln!("❌ Database not found at {:?}", db_path);
        eprintln!("   Run: university-repository import --db {:?}", db_path);
        eprintln!("   to import the data files first.");
        std::process::exit(1);
    }

    let conn = Connection::open(db_path)?;
    let rows = db::instructor_summary(&conn)?;

    println!(
        "{}",
        render::instructor_rows_table(&format!("{} Instructor Summary", cli.name), &rows)
    );

    Ok(())
}

fn run_report(cli: &Cli) -> Result<()> {
    let repository = load_repository(cli)?;
    println!("{}", serde_json::to_string_pretty(repository.load_report())?);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(cli: &Cli) -> Result<()> {
    use university_repository::ui;

    let repository = load_repository(cli)?;
    let mut app = ui::App::new(&repository);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_cli: &Cli) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web server: cargo run --bin university-server --features server");
    std::process::exit(1);
}
