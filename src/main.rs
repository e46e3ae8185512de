use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sendonce::common::config::{load_config, ConfigOverrides};
use sendonce::common::{config_commands, progress_channel};
use sendonce::errors::{ConsumptionError, InitiationError, InspectionError};
use sendonce::output;
use sendonce::transfer::{
    LocalFile, ScanStatus, Token, TokenState, TransferClient, TransferSession,
};
use sendonce::utils::security::{sanitize_filename, unique_path};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sendonce")]
#[command(about = "Share a file through a single-use link", version)]
struct Cli {
    /// Override the configured service base URL
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and print its single-use share link
    Send {
        #[arg(help = "Path to file to send")]
        file: PathBuf,
        /// Hours until the link expires (server default when omitted)
        #[arg(long, value_name = "HOURS")]
        ttl_hours: Option<u32>,
    },
    /// Show transfer metadata without spending the link
    Info {
        #[arg(help = "Share link or bare token")]
        link: String,
    },
    /// Download a transfer. This spends the link permanently.
    Fetch {
        #[arg(help = "Share link or bare token")]
        link: String,
        /// Directory to save into (defaults to the current directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved config file path
    Path,
    /// Print current config file contents
    Show,
    /// Reset config to defaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        base_url: cli.base_url.clone(),
    };

    let outcome = match cli.command {
        Commands::Send { file, ttl_hours } => run_send(&overrides, &file, ttl_hours).await,
        Commands::Info { link } => run_info(&overrides, &link).await,
        Commands::Fetch { link, output } => run_fetch(&overrides, &link, output).await,
        Commands::Config { command } => run_config(command),
    };

    if let Err(e) = outcome {
        output::status_err(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn client_from(overrides: &ConfigOverrides) -> Result<TransferClient> {
    let config = load_config(overrides)?;
    TransferClient::new(&config.service_root(), config.service.timeout_secs)
}

async fn run_send(overrides: &ConfigOverrides, path: &PathBuf, ttl_hours: Option<u32>) -> Result<()> {
    let client = client_from(overrides)?;

    let file = LocalFile::open(path).await?;
    println!(
        "Sending {} ({})",
        file.filename,
        output::human_size(file.size_bytes)
    );

    let (tx, mut rx) = progress_channel();
    let bar = output::upload_bar();
    let bar_task = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(pct) = rx.recv().await {
                bar.set_position(u64::from(pct));
            }
        })
    };

    let result = client.initiate(&file, ttl_hours, Some(tx)).await;
    let _ = bar_task.await;

    match result {
        Ok(descriptor) => {
            bar.finish_and_clear();
            output::status_ok("Upload complete");
            println!();
            println!("  Share link: {}", descriptor.shareable_link);
            println!("  Expires:    {}", format_time(&descriptor.expires_at));
            println!(
                "  File:       {} ({}, {})",
                descriptor.filename,
                output::human_size(descriptor.size_bytes),
                descriptor.mime_type
            );
            println!();
            output::status_warn("The link works exactly once, then the file is gone.");
            Ok(())
        }
        Err(e @ InitiationError::TooLarge { .. }) => {
            bar.finish_and_clear();
            anyhow::bail!("{e}");
        }
        Err(InitiationError::SubmissionFailed(reason)) => {
            bar.finish_and_clear();
            anyhow::bail!("upload failed: {reason}. A retry starts a fresh upload.");
        }
    }
}

async fn run_info(overrides: &ConfigOverrides, link: &str) -> Result<()> {
    let client = client_from(overrides)?;
    let token = Token::parse(link)?;

    match client.inspect(&token).await {
        Ok(session) => {
            print_session(&session);
            Ok(())
        }
        Err(InspectionError::NotFound) => {
            anyhow::bail!("no transfer exists for this link")
        }
        Err(InspectionError::Gone(reason)) => {
            anyhow::bail!("{reason}")
        }
        Err(InspectionError::Unknown(reason)) => {
            anyhow::bail!("could not reach the transfer service: {reason}")
        }
    }
}

async fn run_fetch(
    overrides: &ConfigOverrides,
    link: &str,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let client = client_from(overrides)?;
    let token = Token::parse(link)?;

    // Probe first so the user sees what they are about to spend the link on.
    let inspected = client.inspect(&token).await;
    let state = TokenState::Uninspected.apply_inspect(&inspected);

    let session = match &state {
        TokenState::Available(session) => session.clone(),
        TokenState::NotFound => anyhow::bail!("no transfer exists for this link"),
        TokenState::Gone(reason) => anyhow::bail!("{reason}"),
        TokenState::Uninspected | TokenState::Consumed => {
            let reason = match inspected {
                Err(InspectionError::Unknown(reason)) => reason,
                _ => "unexpected inspection result".to_string(),
            };
            anyhow::bail!("could not reach the transfer service: {reason}");
        }
    };

    print_session(&session);
    println!();

    // Metadata can say unavailable even on a 200; don't spend a request on it
    if !state.can_consume() {
        anyhow::bail!("the service reports this transfer is no longer available");
    }

    let spinner = output::spinner("Downloading…");
    let consumed = client.consume(&token).await;
    let state = state.apply_consume(&consumed);
    tracing::debug!(?state, "token state after consume");

    match consumed {
        Ok(payload) => {
            let dir = output_dir.unwrap_or_else(|| PathBuf::from("."));
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Cannot create {}", dir.display()))?;

            let filename = sanitize_filename(&session.filename);
            let dest = unique_path(&dir, &filename);

            match payload.save_to(&dest).await {
                Ok(written) => {
                    output::finish_spinner_success(
                        &spinner,
                        &format!("Saved {} ({})", dest.display(), output::human_size(written)),
                    );
                    output::status_warn("The link is now spent; the file was removed server-side.");
                    Ok(())
                }
                Err(e) => {
                    // The token was spent the moment the retrieval succeeded;
                    // a failed local save has no recovery path.
                    output::finish_spinner_error(&spinner, "Could not write the payload to disk");
                    anyhow::bail!(
                        "{e:#}. The link was already spent server-side, so the file cannot be fetched again."
                    );
                }
            }
        }
        Err(ConsumptionError::Gone(reason)) => {
            // Expected race: someone else (or expiry) got there between the
            // probe and the download. Same terminal handling either way.
            output::finish_spinner_error(&spinner, &reason);
            std::process::exit(1);
        }
        Err(ConsumptionError::Unknown(reason)) => {
            output::finish_spinner_error(&spinner, "Download failed");
            anyhow::bail!("{reason}. The link may still be valid; you can try again.");
        }
    }
}

fn run_config(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => config_commands::run_config_path(),
        ConfigCommands::Show => config_commands::run_config_show(),
        ConfigCommands::Reset { yes } => config_commands::run_config_reset(yes).map(|_| ()),
    }
}

fn print_session(session: &TransferSession) {
    println!(
        "  File:      {} ({}, {})",
        session.filename,
        output::human_size(session.size_bytes),
        session.mime_type
    );
    println!("  Uploaded:  {}", format_time(&session.uploaded_at));
    println!("  Expires:   {}", format_time(&session.expires_at));

    match &session.scan_status {
        ScanStatus::Clean => output::status_ok("Scan: file is clean"),
        ScanStatus::Other(raw) => output::status_warn(&format!("Scan: {raw}")),
    }

    if session.is_available {
        output::status_ok("Available for one download");
    } else {
        output::status_warn("No longer available");
    }
}

fn format_time(time: &chrono::DateTime<chrono::Utc>) -> String {
    time.format("%Y-%m-%d %H:%M UTC").to_string()
}
