//! Credlog CLI - Command-line interface for credential registry topics

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use credlog::prelude::*;
use std::path::{Path, PathBuf};

mod commands;

#[derive(Parser)]
#[command(name = "credlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Where topic messages come from
    #[arg(short, long, value_enum, default_value_t = Backend::Mirror)]
    backend: Backend,

    /// Directory of the file backend
    #[arg(short, long, default_value = "./data/topics")]
    data_dir: PathBuf,

    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Mirror node REST API (read-only)
    Mirror,
    /// Local JSON-lines topic files
    File,
}

#[derive(Subcommand)]
enum Commands {
    /// Institution queries
    #[command(subcommand)]
    Institutions(InstitutionCommands),

    /// Credential form queries
    #[command(subcommand)]
    Forms(FormCommands),

    /// Form submission queries
    #[command(subcommand)]
    Submissions(SubmissionCommands),

    /// Dump a topic with each message decoded
    Messages {
        /// Topic id (shard.realm.num)
        topic: TopicId,

        /// Read direction
        #[arg(short, long, default_value = "asc")]
        order: Order,
    },

    /// Append an event to a topic (file backend only)
    Submit {
        /// Event kind, e.g. INSTITUTION_REGISTRATION
        kind: String,

        /// Event payload as JSON
        #[arg(long)]
        data: String,

        /// Target topic; defaults to the topic the registry uses for the kind
        #[arg(long)]
        topic: Option<TopicId>,

        /// Institution DID whose forms topic receives FORM_* events
        #[arg(long)]
        institution: Option<String>,
    },
}

#[derive(Subcommand)]
enum InstitutionCommands {
    /// List current institutions
    List {
        /// Only institutions registered by this account
        #[arg(long)]
        owner: Option<String>,
    },

    /// Show one institution by DID or id
    Show { key: String },
}

#[derive(Subcommand)]
enum FormCommands {
    /// List the forms of an institution
    List { institution_did: String },
}

#[derive(Subcommand)]
enum SubmissionCommands {
    /// List submissions against a form
    List { form_id: String },
}

fn open_registry(backend: Backend, data_dir: &Path, config: RegistryConfig) -> Result<Registry> {
    tracing::debug!(
        backend = ?backend,
        data_dir = %data_dir.display(),
        institution_topic = %config.topics.institution_topic,
        "Opening registry"
    );
    match backend {
        Backend::Mirror => Registry::mirror(config).context("Failed to create mirror node client"),
        Backend::File => {
            let log = FileTopicLog::open(FileTopicLogConfig::new(data_dir))
                .with_context(|| format!("Failed to open topic log at {}", data_dir.display()))?;
            Ok(Registry::with_log(Arc::new(log), config))
        }
    }
}

fn load_config() -> Result<RegistryConfig> {
    RegistryConfig::from_env().context("Failed to load configuration from environment")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Institutions(cmd) => {
            let registry = open_registry(cli.backend, &cli.data_dir, load_config()?)?;
            commands::institutions::execute(&registry, cmd, cli.json).await?;
        }
        Commands::Forms(FormCommands::List { institution_did }) => {
            let registry = open_registry(cli.backend, &cli.data_dir, load_config()?)?;
            commands::forms::execute(&registry, &institution_did, cli.json).await?;
        }
        Commands::Submissions(SubmissionCommands::List { form_id }) => {
            let registry = open_registry(cli.backend, &cli.data_dir, load_config()?)?;
            commands::submissions::execute(&registry, &form_id, cli.json).await?;
        }
        Commands::Messages { topic, order } => {
            // Viewing a topic needs no registry topics; fall back to the one being read
            let config = RegistryConfig::from_vars(|key| {
                std::env::var(key)
                    .ok()
                    .or_else(|| (key == "CREDLOG_INSTITUTION_TOPIC_ID").then(|| topic.to_string()))
            })
            .context("Failed to load configuration from environment")?;
            let registry = open_registry(cli.backend, &cli.data_dir, config)?;
            commands::messages::execute(&registry, &topic, order, cli.json).await?;
        }
        Commands::Submit {
            kind,
            data,
            topic,
            institution,
        } => {
            if cli.backend != Backend::File {
                anyhow::bail!("submit needs --backend file; the mirror node is read-only");
            }
            let registry = open_registry(cli.backend, &cli.data_dir, load_config()?)?;
            commands::submit::execute(&registry, &kind, &data, topic, institution.as_deref())
                .await?;
        }
    }

    Ok(())
}
