use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use student_admin::{
    db, get_active_courses, get_all_courses, get_all_students, import_files, init_tracing,
    open_database, seed, stats,
};

/// Operator CLI: bulk import and offline reports
#[derive(Debug, Parser)]
#[command(name = "student-admin", version)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "student-admin.db", global = true)]
    database: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import courses and/or students from JSON arrays
    Import {
        #[arg(long)]
        courses: Option<PathBuf>,
        #[arg(long)]
        students: Option<PathBuf>,
    },
    /// Print the dashboard summary and course passing-rate report
    Stats,
}

fn main() -> Result<()> {
    let _log_guards = init_tracing("warn", None).context("Failed to initialise logging")?;
    let cli = Cli::parse();

    match cli.command {
        Command::Import { courses, students } => run_import(&cli.database, courses, students),
        Command::Stats => run_stats(&cli.database),
    }
}

fn run_import(
    database: &Path,
    courses: Option<PathBuf>,
    students: Option<PathBuf>,
) -> Result<()> {
    println!("📥 Importing into {}", database.display());

    let mut conn = open_database(database)
        .with_context(|| format!("Failed to open database {}", database.display()))?;

    let summary = import_files(&mut conn, courses.as_deref(), students.as_deref())
        .context("Import failed (nothing was written)")?;
    seed::ensure_not_empty(&summary).context("No input files given")?;

    println!("✓ Imported {} courses", summary.courses);
    println!("✓ Imported {} students", summary.students);
    println!(
        "✓ Database now holds {} courses, {} students",
        db::count_courses(&conn)?,
        db::count_students(&conn)?
    );

    Ok(())
}

fn run_stats(database: &Path) -> Result<()> {
    let conn = open_database(database)
        .with_context(|| format!("Failed to open database {}", database.display()))?;

    let students = get_all_students(&conn)?;
    let summary = stats::dashboard_summary(&students, &get_all_courses(&conn)?);
    let report = stats::course_passing_rates(&get_active_courses(&conn)?, &students);

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "dashboard": summary,
            "coursePassingRates": report,
        }))?
    );

    Ok(())
}
