use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use school_admission::{
    config::{app, database},
    core::{
        bulk_delete::delete_all_admissions_for_school,
        fee_calculator::calculate_fees,
        fee_structure::resolve_fee_structure,
        repair::repair_duplicate_admission_numbers,
        session::{session_for_date, validate_session},
    },
    errors::{Error, Result},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Administrative tools for the school admission store
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create any missing tables
    InitDb,
    /// Renumber a school's approved admissions canonically
    Repair {
        /// UDISE code of the school
        #[arg(short, long)]
        school: String,
    },
    /// Delete every admission of a school
    DeleteAll {
        /// UDISE code of the school
        #[arg(short, long)]
        school: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Print the fee breakdown for a class and caste
    Fees {
        /// UDISE code of the school
        #[arg(short, long)]
        school: String,
        /// Academic session, e.g. 2024-2025 (defaults to the current one)
        #[arg(long)]
        session: Option<String>,
        /// Class label, e.g. "9" or "11 Science"
        #[arg(short, long)]
        class: String,
        /// Caste category
        #[arg(long, default_value = "general")]
        caste: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    let args = Args::parse();

    // 3. Load the application configuration
    let config = app::load_app_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    // 4. Connect to the store and make sure tables exist
    let db = database::create_connection(&config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;

    match args.command {
        Command::InitDb => info!("Database initialized"),
        Command::Repair { school } => {
            let report = repair_duplicate_admission_numbers(&db, &school, config.batch_limit)
                .await
                .inspect_err(|e| error!("Repair failed: {e}"))?;
            println!(
                "Updated {} admission numbers in {} batches",
                report.updated_count,
                report.batches.len()
            );
        }
        Command::DeleteAll { school, yes } => {
            if !yes {
                return Err(Error::InvalidInput {
                    message: "refusing to delete without --yes".to_string(),
                });
            }
            let report = delete_all_admissions_for_school(&db, &school, config.batch_limit)
                .await
                .inspect_err(|e| error!("Bulk deletion failed: {e}"))?;
            println!(
                "Deleted {} admissions in {} batches",
                report.deleted_count,
                report.batches.len()
            );
        }
        Command::Fees {
            school,
            session,
            class,
            caste,
        } => {
            let session = session
                .unwrap_or_else(|| session_for_date(chrono::Utc::now().date_naive()));
            validate_session(&session)?;
            let heads = resolve_fee_structure(&db, &school, &session).await;
            let breakdown = calculate_fees(&class, &caste, &heads);

            println!("Fees for class {class} ({caste}), session {session}");
            println!("Student Fund");
            for line in &breakdown.student_fund_items {
                println!("  {:<20} {:>6}", line.name, line.amount);
            }
            println!("  {:<20} {:>6}", "Total", breakdown.student_fund_total);
            println!("Development Fund");
            for line in &breakdown.development_fund_items {
                println!("  {:<20} {:>6}", line.name, line.amount);
            }
            println!("  {:<20} {:>6}", "Total", breakdown.development_fund_total);
            println!("Total fee: {}", breakdown.total_fee);
        }
    }

    Ok(())
}
