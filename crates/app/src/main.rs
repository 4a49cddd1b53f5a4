//! `lms` command-line driver over the progress and assessment services.

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lms_core::model::{CourseId, LessonId, QuizId, Submission, UserId};
use lms_core::report::{ReportQuery, ReportSort, SortDirection};
use lms_core::scoring::{ScoringPolicy, TextMatch};
use services::{AppServices, Clock};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod output;

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
    InvalidAnswers { reason: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidAnswers { reason } => write!(f, "invalid --answers value: {reason}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Parser)]
#[command(name = "lms", version, about = "Course progress and quiz assessment")]
struct Cli {
    /// SQLite database URL or file path
    #[arg(long, global = true, env = "LMS_DB_URL", default_value = "sqlite://lms.sqlite3")]
    db: String,

    /// Fill-in-the-blank comparison: exact or normalized
    #[arg(long, global = true, env = "LMS_FILL_BLANK", default_value = "exact")]
    fill_blank: TextMatch,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and the default data
    Init,

    /// List the course catalog
    Courses,

    /// Register a student and make them the current user
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        department: String,
    },

    /// Make an existing user current
    Login {
        #[arg(long)]
        user: UserId,
    },

    /// Clear the current user
    Logout,

    /// Per-course completion of the current user
    Progress,

    /// Open a course and list its lessons for the current user
    Open {
        #[arg(long)]
        course: CourseId,
    },

    /// Mark a lesson as completed for the current user
    Complete {
        #[arg(long)]
        course: CourseId,
        #[arg(long)]
        lesson: LessonId,
    },

    /// Submit quiz answers as a JSON object keyed by question id
    Submit {
        #[arg(long)]
        course: CourseId,
        #[arg(long)]
        quiz: QuizId,
        /// e.g. '{"q1": 3, "q2": ["a", "c"]}'
        #[arg(long)]
        answers: String,
    },

    /// Print the student report table
    Report {
        /// Case-insensitive filter on name or department
        #[arg(long, default_value = "")]
        search: String,
        /// name, department, average-score, lessons-completed, last-activity
        #[arg(long)]
        sort: Option<ReportSort>,
        #[arg(long)]
        desc: bool,
    },

    /// Export the student report
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
        #[arg(long, default_value = "")]
        search: String,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Export every course or every quiz as JSON
    Catalog {
        #[arg(value_enum)]
        kind: CatalogKind,
    },

    /// Dashboard totals and recent activity
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CatalogKind {
    Courses,
    Quizzes,
}

fn report_query(search: String, sort: Option<ReportSort>, desc: bool) -> ReportQuery {
    let query = ReportQuery::search(search);
    match sort {
        Some(key) if desc => query.sorted_by(key, SortDirection::Descending),
        Some(key) => query.sorted_by(key, SortDirection::Ascending),
        None => query,
    }
}

fn parse_answers(raw: &str) -> Result<Submission, ArgsError> {
    serde_json::from_str(raw).map_err(|e| ArgsError::InvalidAnswers {
        reason: e.to_string(),
    })
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn write_output(output: Option<PathBuf>, body: &str) -> std::io::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, body)?;
            info!(path = %path.display(), bytes = body.len(), "export written");
            Ok(())
        }
        None => {
            println!("{body}");
            Ok(())
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.db.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: cli.db }.into());
    }
    let db_url = normalize_sqlite_url(&cli.db);
    prepare_sqlite_file(&db_url)?;

    let policy = ScoringPolicy {
        fill_blank: cli.fill_blank,
    };
    let app = AppServices::new_sqlite(&db_url, Clock::default_clock(), policy).await?;

    match cli.command {
        Commands::Init => {
            println!("database ready at {db_url}");
        }
        Commands::Courses => {
            let courses = app.courses().list_courses().await?;
            println!("{}", output::courses_table(&courses));
        }
        Commands::Register { name, department } => {
            let user = app.users().register_student(&name, &department).await?;
            println!("registered {} ({})", user.name(), user.id());
        }
        Commands::Login { user } => match app.users().sign_in(&user).await? {
            Some(user) => println!("signed in as {} ({})", user.name(), user.id()),
            None => eprintln!("no user with id {user}"),
        },
        Commands::Logout => {
            app.users().sign_out().await?;
            println!("signed out");
        }
        Commands::Progress => match app.progress().course_summaries().await? {
            Some(summaries) => println!("{}", output::summaries_table(&summaries)),
            None => eprintln!("no current user; register or log in first"),
        },
        Commands::Open { course } => match app.progress().open_course(&course).await? {
            Some(view) => {
                println!(
                    "{}: {}/{} lessons ({}%)",
                    view.course.title(),
                    view.completion.completed,
                    view.completion.total,
                    view.completion.percentage
                );
                println!("{}", output::lessons_table(&view.lessons()));
            }
            None => eprintln!("nothing to open: no current user or unknown course {course}"),
        },
        Commands::Complete { course, lesson } => {
            match app.progress().complete_lesson(&course, &lesson).await? {
                Some(outcome) => println!("{}", output::completion_line(outcome)),
                None => eprintln!("nothing recorded: no current user or unknown course/lesson"),
            }
        }
        Commands::Submit {
            course,
            quiz,
            answers,
        } => {
            let answers = parse_answers(&answers)?;
            match app.assessments().submit_quiz(&course, &quiz, answers).await? {
                Some(result) => println!(
                    "score {}% ({})",
                    result.score(),
                    if result.passed() { "passed" } else { "not passed" }
                ),
                None => eprintln!("nothing recorded: no current user or unknown course/quiz"),
            }
        }
        Commands::Report { search, sort, desc } => {
            let rows = app
                .reports()
                .reports(&report_query(search, sort, desc))
                .await?;
            println!("{}", output::reports_table(&rows));
        }
        Commands::Export {
            format,
            search,
            output,
        } => {
            let query = ReportQuery::search(search);
            let body = match format {
                ExportFormat::Csv => app.reports().export_csv(&query).await?,
                ExportFormat::Json => app.reports().export_json(&query).await?,
            };
            write_output(output, &body)?;
        }
        Commands::Catalog { kind } => {
            let body = match kind {
                CatalogKind::Courses => app.courses().export_json().await?,
                CatalogKind::Quizzes => app.quizzes().export_json().await?,
            };
            println!("{body}");
        }
        Commands::Stats => {
            let stats = app.reports().dashboard().await?;
            println!("{}", output::stats_table(&stats));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,services=info,storage=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
