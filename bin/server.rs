// University Repository - Web Server
// REST API + instructor summary page with Axum

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use university_repository::web::{router, AppState};
use university_repository::{FileSource, Repository, SqliteSource, DEFAULT_NAME};

#[derive(Parser, Debug)]
#[command(name = "university-server")]
#[command(about = "Serve a university repository over HTTP", long_about = None)]
struct Args {
    /// University name shown on the pages
    #[arg(long, env = "UNIVERSITY_NAME", default_value = DEFAULT_NAME)]
    name: String,

    /// Directory holding students.txt, instructors.txt, grades.txt and majors.txt
    #[arg(long, env = "UNIVERSITY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// SQLite database produced by `university-repository import`; wins over --data-dir
    #[arg(long, env = "UNIVERSITY_DB")]
    db: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    port: u16,
}

/// Where the repository is loaded from
#[derive(Debug, PartialEq, Eq)]
enum DataSource {
    Database(PathBuf),
    /// `None` means the current directory
    Directory(Option<PathBuf>),
}

impl Args {
    fn data_source(&self) -> DataSource {
        match (&self.db, &self.data_dir) {
            (Some(db), _) => DataSource::Database(db.clone()),
            (None, dir) => DataSource::Directory(dir.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("university_repository=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    println!("🌐 {} Repository - Web Server", args.name);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let repository = match args.data_source() {
        DataSource::Database(db_path) => {
            if !db_path.exists() {
                eprintln!("❌ Database not found at {:?}", db_path);
                eprintln!("   Run: university-repository import --db {:?}", db_path);
                eprintln!("   to import the data files first.");
                std::process::exit(1);
            }
            Repository::load(&args.name, &SqliteSource::open(&db_path)?)
        }
        DataSource::Directory(dir) => {
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            Repository::load(&args.name, &FileSource::new(dir))
        }
    };

    let report = repository.load_report();
    println!("✓ Loaded from {}", report.source);
    println!(
        "✓ {} students, {} instructors, {} majors ({} warnings)",
        repository.fetch_students().len(),
        repository.fetch_instructors().len(),
        repository.fetch_majors().len(),
        report.warning_count()
    );

    let app = router(AppState::new(repository));

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "Server listening");
    println!("\n🚀 Server running on http://localhost:{}", args.port);
    println!("   Page: http://localhost:{}/instructor_summary", args.port);
    println!("   API:  http://localhost:{}/api/instructors", args.port);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
