use std::path::PathBuf;

use anyhow::Context;
use bootcamp_api::{
    config::Config,
    repository::{BootcampRepository, CourseRepository},
    seed::{SeedReport, Seeder},
    surrealdb_backend,
};
use clap::{Parser, Subcommand};
use colored::Colorize;

/// bootcamp - load or wipe the bootcamp directory sample data
#[derive(Parser)]
#[command(name = "bootcamp")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to the standard search path)
    #[arg(short, long, global = true, env = "BOOTCAMP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert the sample bootcamps and courses
    Import,
    /// Delete every bootcamp and course
    Destroy,
    /// Destroy, then import
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);

            for cause in e.chain().skip(1) {
                eprintln!("\n{} {}", "Caused by:".yellow(), cause);
            }

            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load().context("loading configuration")?,
    };

    println!(
        "{} {}",
        "Data store:".cyan(),
        surrealdb_backend::sanitize_connection_url(&config.database.url)
    );

    let db = surrealdb_backend::connect(&config.database)
        .await
        .context("connecting to the data store")?;
    let seeder = Seeder::new(BootcampRepository::new(db.clone()), CourseRepository::new(db));

    match cli.command {
        Commands::Import => {
            let report = seeder.import().await.context("importing sample data")?;
            print_report("Data imported", report);
        }
        Commands::Destroy => {
            let report = seeder.destroy().await.context("destroying data")?;
            print_report("Data destroyed", report);
        }
        Commands::Reset => {
            let report = seeder.reset().await.context("resetting data")?;
            print_report("Data reset", report);
        }
    }

    Ok(())
}

fn print_report(action: &str, report: SeedReport) {
    println!(
        "{} ({} bootcamps, {} courses)",
        action.green().bold(),
        report.bootcamps,
        report.courses
    );
}
