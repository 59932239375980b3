use anyhow::{Context, Result, bail};
use api::ApiClient;
use chrono::Local;
use clap::{Parser, Subcommand};
use common::logger::init_logging;
use marker::GradingSession;
use marker::file_loader::load_sheet;
use services::courses::{CourseFilter, CoursePanel};
use services::kanban::KanbanBoard;
use services::plagiarism::{ReviewQueue, ReviewQuery, SortBy};
use services::projects::ItemStatus;
use services::reminders::deadline_text;
use std::path::PathBuf;
use std::sync::Arc;
use util::config;
use util::events::EventBus;
use util::session::{SelectedCourse, Session};

#[derive(Parser, Debug)]
#[command(name = "campus", version, about = "Campus academic-management client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the token and the selected course
    Logout,
    /// List courses (admin)
    Courses {
        /// all, active or archived
        #[arg(long, default_value = "all")]
        filter: String,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Choose the course the board is scoped to
    SelectCourse {
        id: String,
        name: String,
        #[arg(long)]
        code: Option<String>,
    },
    ClearCourse,
    /// Show the Kanban board for the selected course
    Board,
    /// Grade a submission from a grading sheet
    Grade {
        sheet: PathBuf,
        /// Release the grade to the student instead of saving a draft
        #[arg(long)]
        submit: bool,
    },
    /// List submissions flagged for plagiarism review
    Flagged {
        /// score, date or matches
        #[arg(long, default_value = "score")]
        sort: String,
        #[arg(long, default_value = "")]
        search: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logging(&config::log_file(), &config::log_level(), config::log_to_stdout());

    let cli = Cli::parse();
    let session = Session::load(config::session_file(), EventBus::new());
    let client = ApiClient::from_config(session.clone()).context("building HTTP client")?;

    match cli.command {
        Command::Login { email, password } => {
            client.login(&email, &password).await?;
            println!("Signed in as {email}");
        }
        Command::Logout => {
            client.logout()?;
            println!("Signed out");
        }
        Command::Courses { filter, search } => courses(client, &filter, &search).await?,
        Command::SelectCourse { id, name, code } => {
            session.select_course(SelectedCourse { id, name, code })?;
            println!("Course selected");
        }
        Command::ClearCourse => {
            session.clear_course()?;
            println!("Course cleared");
        }
        Command::Board => board(&client, &session).await?,
        Command::Grade { sheet, submit } => grade(&client, &session, sheet, submit).await?,
        Command::Flagged { sort, search } => flagged(&client, &sort, search).await?,
    }
    Ok(())
}

fn require_login(session: &Session) -> Result<()> {
    if !session.is_authenticated() {
        bail!("not signed in; run `campus login` first");
    }
    Ok(())
}

async fn courses(client: ApiClient, filter: &str, search: &str) -> Result<()> {
    require_login(client.session())?;
    let filter: CourseFilter = filter.parse()?;
    let mut panel = CoursePanel::new(Arc::new(client));
    panel.load().await?;

    let stats = panel.stats();
    println!(
        "{} courses ({} active, {} archived)",
        stats.total, stats.active, stats.archived
    );
    for course in panel.visible(filter, search) {
        println!(
            "{:<26} {:<40} Y{} S{} {:>2} cr  {}{}",
            course.id,
            course.course_name,
            course.year,
            course.semester,
            course.credits,
            course.lecturer_in_charge.name,
            if course.is_archived { "  [archived]" } else { "" },
        );
    }
    Ok(())
}

async fn board(client: &ApiClient, session: &Session) -> Result<()> {
    require_login(session)?;
    let projects = client.projects().await?;
    let tasks = client.tasks().await?;
    let selection = session.selected_course();
    let board = KanbanBoard::load(projects, tasks, selection.as_ref(), client).await;

    match &selection {
        Some(course) => println!("Board for {}", course.name),
        None => println!("No course selected; showing everything as To Do"),
    }
    let now = Local::now().naive_local();
    for (title, status) in [
        ("To Do", ItemStatus::Todo),
        ("In Progress", ItemStatus::InProgress),
        ("Done", ItemStatus::Done),
    ] {
        let column = board.buckets().bucket(status);
        println!("\n{title} ({})", column.len());
        for entry in column {
            let due = entry
                .item
                .deadline()
                .map(|d| deadline_text(d, now))
                .unwrap_or_default();
            println!("  [{}] {:<40} {due}", entry.item.kind(), entry.item.name());
        }
    }
    Ok(())
}

async fn grade(client: &ApiClient, session: &Session, sheet: PathBuf, submit: bool) -> Result<()> {
    require_login(session)?;
    let sheet = load_sheet(&sheet)?;
    let grading = GradingSession::from_sheet(sheet)?.with_events(session.events().clone());

    for answer in grading.answers() {
        println!(
            "{:<10} {:>5.1} / {:<3} {}",
            answer.key.to_string(),
            answer.effective_score(),
            answer.max_marks,
            if answer.is_overridden() { "(lecturer)" } else { "" },
        );
    }

    let summary = if submit {
        grading.submit(client, client).await?
    } else {
        let saved_at = grading.save_draft(client).await?;
        println!("Draft saved at {}", saved_at.with_timezone(&Local).format("%H:%M:%S"));
        grading.summary()
    };
    println!(
        "Total {:.1} / {} ({}%, {})",
        summary.scored, summary.total, summary.percentage, summary.letter
    );
    Ok(())
}

async fn flagged(client: &ApiClient, sort: &str, search: String) -> Result<()> {
    require_login(client.session())?;
    let queue = ReviewQueue::new(client.flagged_submissions().await?);
    let sort_by: SortBy = sort.parse()?;

    let stats = queue.stats();
    println!(
        "{} flagged, {} pending review ({} critical, {} high, {} medium)",
        stats.total, stats.pending_review, stats.critical, stats.high, stats.medium
    );
    let query = ReviewQuery {
        search,
        sort_by,
        ..Default::default()
    };
    for case in queue.query(&query) {
        let trend = match case.trend() {
            Some(d) if d > 0 => format!(" (+{d})"),
            Some(d) if d < 0 => format!(" ({d})"),
            _ => String::new(),
        };
        println!(
            "{:<8} {:<24} {:<36} {:>3}%{trend} {:?}",
            case.id, case.student.name, case.assignment.title, case.plagiarism_score, case.severity(),
        );
    }
    Ok(())
}
