//! CoachERP CLI
//!
//! Command-line interface for CoachERP - tutoring institute records with
//! Google Drive sync.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use coacherp_core::{AppStore, Config, SnapshotStore};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "coacherp")]
#[command(about = "CoachERP - tutoring institute records with Google Drive sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage students
    Student {
        #[command(subcommand)]
        command: StudentCommands,
    },
    /// Record and inspect fee payments
    Payment {
        #[command(subcommand)]
        command: PaymentCommands,
    },
    /// Manage team members
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },
    /// Manage batches
    Batch {
        #[command(subcommand)]
        command: BatchCommands,
    },
    /// Show headline figures and collections
    Dashboard,
    /// Authorize Google Drive access and pull the remote document
    Connect,
    /// Revoke Drive access
    Disconnect,
    /// Push the local state to the remote document now
    Sync,
    /// Show configuration, counts, and sync setup
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum StudentCommands {
    /// Enroll a new student
    Add {
        /// Student name
        name: String,
        /// Guardian name
        #[arg(long)]
        guardian: String,
        /// Contact number
        #[arg(long)]
        contact: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Batch label
        #[arg(long)]
        batch: String,
        /// Total fees
        #[arg(long)]
        fees: f64,
        /// Discount
        #[arg(long, default_value_t = 0.0)]
        discount: f64,
    },
    /// List students
    #[command(alias = "ls")]
    List {
        /// Filter by batch label
        #[arg(long)]
        batch: Option<String>,
    },
    /// Show a student and their ledger
    Show {
        /// Student id (e.g. CE2024001)
        id: String,
    },
    /// Change a student's status
    SetStatus {
        /// Student id
        id: String,
        /// New status: active or left
        status: String,
    },
    /// Bulk-enroll students from a JSON file (array of records)
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum PaymentCommands {
    /// Record a payment
    Add {
        /// Student id
        student_id: String,
        /// Amount paid
        amount: f64,
        /// Payment mode: cash, card, upi, or cheque
        #[arg(long, default_value = "upi")]
        mode: String,
        /// Attach a receipt image
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Show a student's ledger, newest first
    #[command(alias = "ls")]
    List {
        /// Student id
        student_id: String,
        /// Earliest date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,
        /// Latest date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,
        /// Payment mode filter
        #[arg(long)]
        mode: Option<String>,
        /// Minimum amount
        #[arg(long)]
        min: Option<f64>,
        /// Maximum amount
        #[arg(long)]
        max: Option<f64>,
    },
}

#[derive(Subcommand)]
enum TeamCommands {
    /// Add a team member
    Add {
        /// Member name
        name: String,
        /// Role description
        role: String,
    },
    /// Remove a team member
    #[command(alias = "rm")]
    Remove {
        /// Member id (e.g. TM001)
        id: String,
    },
    /// List team members
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
enum BatchCommands {
    /// Add a batch
    Add {
        /// Batch name
        name: String,
    },
    /// Remove a batch (students keep their label)
    #[command(alias = "rm")]
    Remove {
        /// Batch name
        name: String,
    },
    /// List batches
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, file_name, client_id, access_token)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config management doesn't need the snapshot
    if let Commands::Config { command } = &cli.command {
        return commands::config::handle(command.clone(), &output);
    }

    let config = Config::load()?;
    let snapshots = SnapshotStore::new(config.clone());
    let store = Arc::new(Mutex::new(AppStore::with_state(
        snapshots.load_or_default()?,
    )));

    let is_write = matches!(
        &cli.command,
        Commands::Student {
            command: StudentCommands::Add { .. } | StudentCommands::SetStatus { .. }
                | StudentCommands::Import { .. }
        } | Commands::Payment {
            command: PaymentCommands::Add { .. }
        } | Commands::Team {
            command: TeamCommands::Add { .. } | TeamCommands::Remove { .. }
        } | Commands::Batch {
            command: BatchCommands::Add { .. } | BatchCommands::Remove { .. }
        }
    );

    match cli.command {
        Commands::Student { command } => handle_student(command, &store, &output).await?,
        Commands::Payment { command } => handle_payment(command, &store, &output).await?,
        Commands::Team { command } => handle_team(command, &store, &output).await?,
        Commands::Batch { command } => handle_batch(command, &store, &output).await?,
        Commands::Dashboard => commands::dashboard::show(&store, &output).await?,
        Commands::Connect => {
            commands::account::connect(&config, &snapshots, &store, &output).await?
        }
        Commands::Disconnect => commands::account::disconnect(&config, &output).await?,
        Commands::Sync => commands::account::sync(&config, &store, &output).await?,
        Commands::Status => commands::account::status(&config, &store, &output).await?,
        Commands::Config { .. } => unreachable!(), // Handled above
    }

    if is_write {
        snapshots.save(&store.lock().await.snapshot())?;
    }

    Ok(())
}

async fn handle_student(
    command: StudentCommands,
    store: &Arc<Mutex<AppStore>>,
    output: &Output,
) -> Result<()> {
    match command {
        StudentCommands::Add {
            name,
            guardian,
            contact,
            email,
            batch,
            fees,
            discount,
        } => {
            commands::student::add(
                store, name, guardian, contact, email, batch, fees, discount, output,
            )
            .await
        }
        StudentCommands::List { batch } => commands::student::list(store, batch, output).await,
        StudentCommands::Show { id } => commands::student::show(store, id, output).await,
        StudentCommands::SetStatus { id, status } => {
            commands::student::set_status(store, id, status, output).await
        }
        StudentCommands::Import { file } => commands::student::import(store, file, output).await,
    }
}

async fn handle_payment(
    command: PaymentCommands,
    store: &Arc<Mutex<AppStore>>,
    output: &Output,
) -> Result<()> {
    match command {
        PaymentCommands::Add {
            student_id,
            amount,
            mode,
            image,
        } => commands::payment::add(store, student_id, amount, mode, image, output).await,
        PaymentCommands::List {
            student_id,
            from,
            to,
            mode,
            min,
            max,
        } => commands::payment::list(store, student_id, from, to, mode, min, max, output).await,
    }
}

async fn handle_team(
    command: TeamCommands,
    store: &Arc<Mutex<AppStore>>,
    output: &Output,
) -> Result<()> {
    match command {
        TeamCommands::Add { name, role } => commands::team::add(store, name, role, output).await,
        TeamCommands::Remove { id } => commands::team::remove(store, id, output).await,
        TeamCommands::List => commands::team::list(store, output).await,
    }
}

async fn handle_batch(
    command: BatchCommands,
    store: &Arc<Mutex<AppStore>>,
    output: &Output,
) -> Result<()> {
    match command {
        BatchCommands::Add { name } => commands::batch::add(store, name, output).await,
        BatchCommands::Remove { name } => commands::batch::remove(store, name, output).await,
        BatchCommands::List => commands::batch::list(store, output).await,
    }
}
