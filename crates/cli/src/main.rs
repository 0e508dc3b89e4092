//! QAcart CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! qacart-cli migrate
//!
//! # Mirror the course catalog from a YAML file
//! qacart-cli seed courses catalog.yaml
//!
//! # Revoke a certificate
//! qacart-cli certificate revoke user-1_playwright --reason "chargeback"
//!
//! # Remove progress for a deleted user
//! qacart-cli progress purge --user user-1
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "qacart-cli")]
#[command(author, version, about = "QAcart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage issued certificates
    Certificate {
        #[command(subcommand)]
        action: CertificateAction,
    },
    /// Maintain progress records
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert courses from a YAML file
    Courses {
        /// Path to the YAML file
        file: String,
    },
}

#[derive(Subcommand)]
enum CertificateAction {
    /// Revoke a certificate by ID
    Revoke {
        /// Certificate ID (`{user_id}_{course_id}`)
        id: String,

        /// Reason recorded on the certificate
        #[arg(short, long)]
        reason: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProgressAction {
    /// Delete progress records for a user or a course
    Purge {
        /// Identity-provider user ID
        #[arg(long, conflicts_with = "course")]
        user: Option<String>,

        /// Catalog course ID
        #[arg(long)]
        course: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Courses { file } => commands::seed::courses(&file).await?,
        },
        Commands::Certificate { action } => match action {
            CertificateAction::Revoke { id, reason } => {
                commands::certificate::revoke(&id, reason).await?;
            }
        },
        Commands::Progress { action } => match action {
            ProgressAction::Purge { user, course } => {
                commands::progress::purge(user, course).await?;
            }
        },
    }
    Ok(())
}
