//! CLI entry point for `ezgmail`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use ezgmail::auth::{self, secret::ClientSecret};
use ezgmail::config::{self, Config};
use ezgmail::model::message::Message;
use ezgmail::search::query::{Folder, SearchCriteria};
use ezgmail::search::GmailService;

#[derive(Parser)]
#[command(
    name = "ezgmail",
    version,
    about = "Search a Gmail mailbox, read messages and download attachments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Google client-secret JSON file (defaults to the configured path)
    #[arg(long, global = true, env = "EZGMAIL_CREDENTIALS", value_name = "FILE")]
    credentials: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize read-only access and cache the token
    Auth,
    /// Print the ids of matching messages
    List {
        #[command(flatten)]
        filters: Filters,
        #[arg(long)]
        json: bool,
    },
    /// Fetch and show matching messages
    Search {
        #[command(flatten)]
        filters: Filters,
        #[arg(long)]
        json: bool,
    },
    /// Download the attachments of matching messages
    Attachments {
        #[command(flatten)]
        filters: Filters,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Search filters shared by the listing commands.
#[derive(Args, Debug, Clone, Default)]
struct Filters {
    /// Sender
    #[arg(long, value_name = "ADDR")]
    from: Option<String>,
    /// Recipient
    #[arg(long, value_name = "ADDR")]
    to: Option<String>,
    /// Received before this date (YYYY/MM/DD)
    #[arg(long, value_name = "DATE")]
    older: Option<String>,
    /// Received after this date (YYYY/MM/DD)
    #[arg(long, value_name = "DATE")]
    newer: Option<String>,
    /// Older than a period (e.g. 2d, 3m, 1y)
    #[arg(long, value_name = "PERIOD")]
    older_than: Option<String>,
    /// Newer than a period (e.g. 2d, 3m, 1y)
    #[arg(long, value_name = "PERIOD")]
    newer_than: Option<String>,
    /// Subject contains
    #[arg(long)]
    subject: Option<String>,
    /// Folder: inbox, sent, trash, spam or anywhere
    #[arg(long = "in", value_name = "FOLDER")]
    folder: Option<Folder>,
    /// Larger than (e.g. 5M)
    #[arg(long, value_name = "SIZE")]
    larger: Option<String>,
    /// Smaller than (e.g. 100K)
    #[arg(long, value_name = "SIZE")]
    smaller: Option<String>,
    /// Attachment filename
    #[arg(long)]
    filename: Option<String>,
    /// Free-text search
    #[arg(long = "match", value_name = "TEXT")]
    matching: Option<String>,
    /// Exact phrase, quote it yourself: --match-exact '"due today"'
    #[arg(long, value_name = "TEXT")]
    match_exact: Option<String>,
    /// Only messages with attachments
    #[arg(long)]
    has_attachment: bool,
    /// Page size (defaults to the configured value)
    #[arg(short = 'n', long, value_name = "N")]
    max_results: Option<u32>,
    /// Label id
    #[arg(long, value_name = "ID")]
    label: Option<String>,
}

impl Filters {
    fn to_criteria(&self, config: &Config) -> SearchCriteria {
        let mut c = SearchCriteria::new();
        c.max_results(self.max_results.unwrap_or(config.account.max_results))
            .has_attachment(self.has_attachment);

        if let Some(ref v) = self.from {
            c.from(v.as_str());
        }
        if let Some(ref v) = self.to {
            c.to(v.as_str());
        }
        if let Some(ref v) = self.older {
            c.older_than_date(v.as_str());
        }
        if let Some(ref v) = self.newer {
            c.newer_than_date(v.as_str());
        }
        if let Some(ref v) = self.older_than {
            c.older_than(v.as_str());
        }
        if let Some(ref v) = self.newer_than {
            c.newer_than(v.as_str());
        }
        if let Some(ref v) = self.subject {
            c.subject(v.as_str());
        }
        if let Some(ref v) = self.larger {
            c.larger_than(v.as_str());
        }
        if let Some(ref v) = self.smaller {
            c.smaller_than(v.as_str());
        }
        if let Some(ref v) = self.filename {
            c.filename(v.as_str());
        }
        if let Some(ref v) = self.matching {
            c.matching(v.as_str());
        }
        if let Some(ref v) = self.match_exact {
            c.matching_exact(v.as_str());
        }
        if let Some(ref v) = self.label {
            c.label(v.as_str());
        }
        if let Some(folder) = self.folder {
            c.in_folder(folder);
        }
        c
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let credentials = cli
        .credentials
        .clone()
        .unwrap_or_else(|| config.account.credentials_path.clone());

    match cli.command {
        Commands::Auth => cmd_auth(&credentials, &config),
        Commands::List { filters, json } => cmd_list(&credentials, &config, &filters, json),
        Commands::Search { filters, json } => cmd_search(&credentials, &config, &filters, json),
        Commands::Attachments { filters, output } => {
            cmd_attachments(&credentials, &config, &filters, &output)
        }
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "ezgmail.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn connect(credentials: &Path, config: &Config) -> anyhow::Result<GmailService> {
    GmailService::from_credentials(credentials, config)
        .with_context(|| format!("Unable to connect using {}", credentials.display()))
}

/// Run the authorization flow (or validate the cached token).
fn cmd_auth(credentials: &Path, config: &Config) -> anyhow::Result<()> {
    let secret = ClientSecret::from_file(credentials)?;
    let cache_path = config::token_cache_path(config)
        .context("Could not determine the token cache path")?;
    let client = auth::TokenClient::new(secret, config.api.timeout());
    let token = auth::authorize(&client, &cache_path)?;
    println!("  Token cached at {}", cache_path.display());
    if let Some(expiry) = token.expiry {
        println!("  Access token valid until {}", expiry.to_rfc3339());
    }
    Ok(())
}

/// Print matching message ids.
fn cmd_list(
    credentials: &Path,
    config: &Config,
    filters: &Filters,
    json: bool,
) -> anyhow::Result<()> {
    let service = connect(credentials, config)?;
    let criteria = filters.to_criteria(config);
    let ids = service.list_ids(&criteria)?;

    if json {
        let output = serde_json::json!({
            "query": criteria.render(),
            "result_count": ids.len(),
            "ids": ids,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for id in &ids {
            println!("{id}");
        }
    }
    Ok(())
}

/// Fetch, parse and print matching messages.
fn cmd_search(
    credentials: &Path,
    config: &Config,
    filters: &Filters,
    json: bool,
) -> anyhow::Result<()> {
    let service = connect(credentials, config)?;
    let criteria = filters.to_criteria(config);
    let messages = fetch_with_progress(&service, &criteria)?;

    if json {
        print_messages_json(&messages)?;
    } else {
        print_messages_table(&messages);
    }
    Ok(())
}

/// Download every attachment of the matching messages.
fn cmd_attachments(
    credentials: &Path,
    config: &Config,
    filters: &Filters,
    output: &Path,
) -> anyhow::Result<()> {
    let service = connect(credentials, config)?;
    let mut criteria = filters.to_criteria(config);
    criteria.has_attachment(true);
    let messages = fetch_with_progress(&service, &criteria)?;

    let with_att = messages.iter().filter(|m| m.has_attachments()).count();
    if with_att == 0 {
        println!("  No messages with attachments found.");
        return Ok(());
    }
    println!("  Downloading attachments from {with_att} message(s)");

    let pb = progress_bar(messages.len() as u64, "Downloading");
    let paths = ezgmail::export::attachment::export_bulk_attachments(
        &messages,
        output,
        &|current, _total| {
            pb.set_position(current as u64);
        },
    )?;
    pb.finish_and_clear();

    println!(
        "  Saved {} attachment(s) to {}",
        paths.len(),
        output.display()
    );
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "ezgmail", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} {label} [{{bar:40.cyan/blue}}] {{pos}}/{{len}}"
            ))
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb
}

fn fetch_with_progress(
    service: &GmailService,
    criteria: &SearchCriteria,
) -> anyhow::Result<Vec<Message>> {
    let pb = progress_bar(0, "Fetching");
    let messages = service.get_messages_with_progress(
        criteria,
        Some(&|current, total| {
            pb.set_length(total as u64);
            pb.set_position(current as u64);
        }),
    );
    pb.finish_and_clear();
    Ok(messages?)
}

/// Print messages as a human-readable table.
fn print_messages_table(messages: &[Message]) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {} message(s)", messages.len());
    println!();

    if messages.is_empty() {
        return;
    }

    println!(
        "  {:<4} {:<18} {:<48} {:<5} {:<5} {:>4}",
        "#", "Id", "Subject", "Text", "HTML", "Att"
    );
    println!("  {}", "-".repeat(88));

    for (i, msg) in messages.iter().enumerate() {
        let subject: String = msg.subject().chars().take(47).collect();
        println!(
            "  {:<4} {:<18} {:<48} {:<5} {:<5} {:>4}",
            i + 1,
            msg.id(),
            subject,
            yes_no(msg.has_body_text()),
            yes_no(msg.has_body_html()),
            msg.attachments().len()
        );
        for att in msg.attachments() {
            println!(
                "  {:<4} {:<18} └ {} ({}, {})",
                "",
                "",
                att.filename(),
                att.mime_type(),
                format_size(att.size(), BINARY)
            );
        }
    }
    println!();
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "-"
    }
}

/// Print messages as JSON.
fn print_messages_json(messages: &[Message]) -> anyhow::Result<()> {
    let items: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "id": m.id(),
                "thread_id": m.raw().thread_id,
                "message_id": m.message_id(),
                "subject": m.subject(),
                "snippet": m.raw().snippet,
                "labels": m.raw().label_ids,
                "body_text": m.text_lossy(),
                "body_html": m.html_lossy(),
                "mime_flow": m.mime_flow(),
                "attachments": m.attachments().iter().map(|a| serde_json::json!({
                    "attachment_id": a.attachment_id(),
                    "filename": a.filename(),
                    "mime_type": a.mime_type(),
                    "size": a.size(),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    let output = serde_json::json!({
        "result_count": messages.len(),
        "messages": items,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
