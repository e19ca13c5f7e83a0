//! CLI binary for payslip-relay.
//!
//! A thin shim over the library crate: maps CLI flags to `RelayConfig`,
//! wires up the store, ledger, and transport, then runs one of three modes
//! (extract-only, ingest, serve).

use anyhow::{Context, Result};
use clap::Parser;
use payslip_relay::{
    bot::poll, config::DEFAULT_API_BASE, extract, ingest_dir, normalize_lines, BaleTransport,
    BotHandler, DocumentSource, JsonStore, PdfSource, RelayConfig, VerificationLedger,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract one payslip and print the record as JSON
  payslip-relay --extract-only payslip.pdf --json

  # Ingest a directory of payslips into a persistent store
  payslip-relay --ingest ./payslips --store records.json

  # Ingest with push notifications, then serve the bot
  export BOT_TOKEN=123:abc
  payslip-relay --ingest ./payslips --serve \
      --store records.json --ledger employees.csv

  # Serve only, against a self-hosted gateway
  payslip-relay --serve --store records.json --ledger employees.csv \
      --api-base https://gateway.example.com

LEDGER FORMAT:
  A CSV file with a header line followed by two-column rows:
    national_id,personnel_number
    1234567890,4521

ENVIRONMENT VARIABLES:
  BOT_TOKEN                Bot token issued by the chat platform
  PAYSLIP_API_BASE         Chat API base URL
  PAYSLIP_STORE            Record store JSON file
  PAYSLIP_LEDGER           Verification ledger CSV file
  PAYSLIP_COOLDOWN_DAYS    Retrieval cooldown in days
  PAYSLIP_POLL_TIMEOUT     getUpdates long-poll timeout in seconds
"#;

/// Extract payroll records from Persian payslip PDFs and deliver them to
/// verified recipients over a chat bot.
#[derive(Parser, Debug)]
#[command(
    name = "payslip-relay",
    version,
    about = "Extract payroll records from payslip PDFs and deliver them over a chat bot",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Extract one PDF and print the record; no storage, no delivery.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["ingest", "serve"])]
    extract_only: Option<PathBuf>,

    /// Ingest every *.pdf in this directory.
    #[arg(long, value_name = "DIR")]
    ingest: Option<PathBuf>,

    /// Run the bot polling loop (after any ingestion).
    #[arg(long)]
    serve: bool,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Record store JSON file; omitted means a non-persistent in-memory store.
    #[arg(long, env = "PAYSLIP_STORE", value_name = "FILE")]
    store: Option<PathBuf>,

    /// Verification ledger CSV. Required with --serve.
    #[arg(long, env = "PAYSLIP_LEDGER", value_name = "FILE")]
    ledger: Option<PathBuf>,

    /// Bot token. Required with --serve; enables push notifications
    /// during ingestion.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Chat API base URL.
    #[arg(long, env = "PAYSLIP_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Retrieval cooldown in days.
    #[arg(long, env = "PAYSLIP_COOLDOWN_DAYS", default_value_t = 28)]
    cooldown_days: i64,

    /// getUpdates long-poll timeout in seconds (1-300).
    #[arg(long, env = "PAYSLIP_POLL_TIMEOUT", default_value_t = 30)]
    poll_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAYSLIP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAYSLIP_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Extract-only mode ────────────────────────────────────────────────
    if let Some(ref file) = cli.extract_only {
        let text = PdfSource
            .open_text(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let record = extract(&normalize_lines(&text));

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&record).context("failed to serialise record")?
            );
        } else {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for (label, value) in [
                ("Name", &record.name),
                ("Family name", &record.family_name),
                ("National id", &record.national_id),
                ("Personnel number", &record.personnel_number),
                ("Insurance number", &record.insurance_number),
                ("Employer", &record.employer),
                ("Year", &record.year),
                ("Month", &record.month),
                ("Working days", &record.working_days),
                ("Base salary", &record.base_salary),
                ("Housing allowance", &record.housing_allowance),
                ("Food allowance", &record.food_allowance),
                ("Gross salary", &record.gross_salary),
                ("Employee insurance", &record.employee_insurance),
                ("Food expense", &record.food_expense),
                ("Total deductions", &record.total_deductions),
                ("Net payment", &record.net_payment),
                ("Net payment (words)", &record.net_payment_text),
            ] {
                if let Some(v) = value {
                    writeln!(out, "{label:<20} {v}").context("failed to write to stdout")?;
                }
            }
        }
        return Ok(());
    }

    if cli.ingest.is_none() && !cli.serve {
        anyhow::bail!("nothing to do: pass --extract-only, --ingest, or --serve");
    }

    // ── Shared plumbing ──────────────────────────────────────────────────
    let store = match &cli.store {
        Some(path) => JsonStore::open(path)
            .with_context(|| format!("failed to open record store {}", path.display()))?,
        None => JsonStore::in_memory(),
    };

    let transport = match &cli.token {
        Some(token) => {
            let config: RelayConfig = RelayConfig::builder()
                .bot_token(token)
                .api_base(&cli.api_base)
                .cooldown_days(cli.cooldown_days)
                .poll_timeout_secs(cli.poll_timeout)
                .build()
                .context("invalid configuration")?;
            Some((BaleTransport::new(&config).context("failed to build transport")?, config))
        }
        None => None,
    };

    // ── Ingest ───────────────────────────────────────────────────────────
    if let Some(ref dir) = cli.ingest {
        let report = ingest_dir(
            dir,
            &PdfSource,
            &store,
            transport.as_ref().map(|(t, _)| t),
        )
        .await
        .with_context(|| format!("ingestion of {} failed", dir.display()))?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialise report")?
            );
        } else if !cli.quiet {
            eprintln!(
                "ingested {}/{} files ({} skipped, {} pushed)",
                report.ingested, report.scanned, report.skipped, report.notified
            );
        }
    }

    // ── Serve ────────────────────────────────────────────────────────────
    if cli.serve {
        let (transport, config) = transport
            .context("--serve requires a bot token (--token or BOT_TOKEN)")?;
        let ledger_path = cli
            .ledger
            .as_ref()
            .context("--serve requires a verification ledger (--ledger)")?;
        let ledger = VerificationLedger::load(ledger_path)
            .with_context(|| format!("failed to load ledger {}", ledger_path.display()))?;

        let handler = BotHandler::new(store, ledger, config.cooldown);
        poll::run(&handler, &transport).await;
    }

    Ok(())
}
