use anyhow::Result;
use clap::{Parser, Subcommand};
use git_time_machine::{Config, LoadRequest, SearchRequest, TimeMachineClient, ToolChainKind};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Debug, Parser)]
#[command(name = "git-time-machine")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Load git history into a time-partitioned vector store and search it")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "GIT_TIME_MACHINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Clone a repository and load its full history
    Load {
        /// Repository URL (or a path with --local)
        repo_url: String,

        /// Branch to clone [default: loader.default_branch]
        #[arg(long)]
        branch: Option<String>,

        /// Comma-separated tool chains: langchain, llamaindex
        /// [default: loader.default_tool_chains]
        #[arg(long)]
        toolchains: Option<String>,

        /// Open REPO_URL as a local repository instead of cloning
        #[arg(long)]
        local: bool,

        /// Build an ANN index on each table afterwards
        #[arg(long)]
        create_index: bool,

        /// Number of concurrent ranges [default: loader.max_threads]
        #[arg(long)]
        max_threads: Option<usize>,
    },

    /// Print the catalog as JSON
    Catalog {
        /// Only this tool chain, as a repo_url -> table map
        #[arg(long)]
        toolchain: Option<ToolChainKind>,
    },

    /// Search a loaded repository and print matches as JSON
    Search {
        repo_url: String,

        query: String,

        #[arg(long, default_value = "langchain")]
        toolchain: ToolChainKind,

        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Lower bound (RFC 3339, YYYY-MM-DD or Unix seconds)
        #[arg(long)]
        since: Option<String>,

        /// Upper bound, inclusive
        #[arg(long)]
        until: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials usually live in .env next to the working directory
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Load {
            repo_url,
            branch,
            toolchains,
            local,
            create_index,
            max_threads,
        } => {
            let tool_chains = ToolChainKind::parse_list(
                toolchains
                    .as_deref()
                    .unwrap_or(&config.loader.default_tool_chains),
            )?;
            let request = LoadRequest {
                repo_url,
                branch: branch.unwrap_or_else(|| config.loader.default_branch.clone()),
                tool_chains,
                local,
                create_index,
                max_threads,
            };

            let client = TimeMachineClient::new(config).await?;
            let summary = client.load(request).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);

            if !summary.is_complete() {
                anyhow::bail!(
                    "{} of {} ranges failed: {}",
                    summary.failed_ranges.len(),
                    summary.failed_ranges.len() + summary.ranges.len(),
                    summary.failed_ranges.join(", ")
                );
            }
        }
        Commands::Catalog { toolchain } => {
            let catalog = git_time_machine::catalog::Catalog::open(&config.storage.catalog_path)?;
            let output = match toolchain {
                Some(kind) => serde_json::to_string_pretty(&catalog.read(kind)?)?,
                None => serde_json::to_string_pretty(&catalog.entries()?)?,
            };
            println!("{}", output);
        }
        Commands::Search {
            repo_url,
            query,
            toolchain,
            limit,
            since,
            until,
        } => {
            let client = TimeMachineClient::new(config).await?;
            let response = client
                .search(SearchRequest {
                    repo_url,
                    query,
                    tool_chain: toolchain,
                    limit,
                    since,
                    until,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
