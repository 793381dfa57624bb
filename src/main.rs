//! gitbom-cve: search CVEs for build artifacts through a gitBOM hash graph

use anyhow::{Context, Result};
use clap::{ArgAction, ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use gitbom_cve::{
    cli,
    config::{self, AppConfig, SearchConfig, SearchQuery, Validatable},
    graph::DocumentMode,
    pipeline::exit_codes,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gitbom-cve")]
#[command(version)]
#[command(
    about = "Search the CVE database and gitBOM database for binary files or CVEs",
    long_about = None
)]
#[command(after_help = "EXIT CODES:
    0  Success
    2  CVEs found (with --fail-on-cve)
    3  Error occurred

EXAMPLES:
    # CVEs for a binary, resolving its embedded .bom identifier
    gitbom-cve search -d cve_db.json -b .gitbom -f build/app

    # CVEs for checksums using a raw checksum database
    gitbom-cve search -d cve_db.json -r bomsh_raw_checksums.json -c <blob-id>,<blob-id>

    # Blob checksums vulnerable to a CVE
    gitbom-cve search -d cve_db.json -b .gitbom -e CVE-2018-0734")]
struct Cli {
    /// Verbose output, can be supplied multiple times
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to config file (default: auto-discover .gitbom-cve.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search CVEs for files, checksums or gitBOM ids, or checksums for CVEs
    Search(SearchArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .gitbom-cve.yaml in the current directory
    Init,
}

#[derive(Args)]
#[command(group(ArgGroup::new("query").multiple(false)))]
struct SearchArgs {
    /// CVE database file, with git blob ID to CVE mappings
    #[arg(short = 'd', long, env = "GITBOM_CVE_DB")]
    cve_db: Option<PathBuf>,

    /// Raw checksum database file generated by the build tracer
    #[arg(short = 'r', long)]
    raw_checksums: Option<PathBuf>,

    /// gitBOM repository directory
    #[arg(short = 'b', long, env = "GITBOM_DIR")]
    bom_dir: Option<PathBuf>,

    /// JSON database with metadata for file checksums
    #[arg(short = 'm', long)]
    metadata_db: Option<PathBuf>,

    /// Comma-separated CVEs to search vulnerable git blob IDs for
    #[arg(short = 'e', long, value_delimiter = ',', group = "query")]
    cves: Vec<String>,

    /// Comma-separated git blob IDs or checksums to search CVEs for
    #[arg(short = 'c', long, value_delimiter = ',', group = "query")]
    checksums: Vec<String>,

    /// Comma-separated files to search CVEs for
    #[arg(short = 'f', long, value_delimiter = ',', group = "query")]
    files: Vec<PathBuf>,

    /// Comma-separated gitBOM ids to search CVEs for
    #[arg(short = 'g', long, value_delimiter = ',', group = "query")]
    bom_ids: Vec<String>,

    /// Scratch directory (default: system temp dir)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Output JSON file for the search result
    #[arg(short = 'j', long)]
    jsonfile: Option<PathBuf>,

    /// How gitBOM documents become hash tree nodes
    #[arg(long, value_enum)]
    document_mode: Option<DocumentMode>,

    /// Exit with code 2 if any CVE is found
    #[arg(long)]
    fail_on_cve: bool,
}

impl SearchArgs {
    fn query(&self) -> Option<SearchQuery> {
        if !self.files.is_empty() {
            Some(SearchQuery::Files(self.files.clone()))
        } else if !self.checksums.is_empty() {
            Some(SearchQuery::Checksums(self.checksums.clone()))
        } else if !self.cves.is_empty() {
            Some(SearchQuery::Cves(self.cves.clone()))
        } else if !self.bom_ids.is_empty() {
            Some(SearchQuery::BomIds(self.bom_ids.clone()))
        } else {
            None
        }
    }

    fn overrides(&self, quiet: bool) -> AppConfig {
        AppConfig::builder()
            .cve_db(self.cve_db.clone())
            .raw_checksums(self.raw_checksums.clone())
            .bom_dir(self.bom_dir.clone())
            .metadata_db(self.metadata_db.clone())
            .output_file(self.jsonfile.clone())
            .quiet(quiet)
            .fail_on_cve(self.fail_on_cve)
            .document_mode(self.document_mode)
            .work_dir(self.work_dir.clone())
            .build()
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for the result
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::ERROR
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Search(args) => {
            let (app, loaded_from) =
                AppConfig::from_file_with_overrides(cli.config.as_deref(), &args.overrides(cli.quiet));
            if let Some(path) = &loaded_from {
                tracing::debug!("Loaded config from {}", path.display());
            }
            let config = SearchConfig::from_app_config(app, args.query(), cli.verbose);

            let errors = config.validate();
            if !errors.is_empty() {
                for error in &errors {
                    eprintln!("{error}");
                }
                eprintln!();
                let mut command = Cli::command();
                if let Some(search) = command.find_subcommand_mut("search") {
                    search.print_help()?;
                }
                return Ok(exit_codes::ERROR);
            }

            tracing::debug!(
                "Command line: {}",
                std::env::args().collect::<Vec<_>>().join(" ")
            );
            cli::run_search(config)
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "gitbom-cve", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = config::generate_json_schema().context("failed to generate schema")?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => {
                    println!("{schema}");
                }
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let (app, loaded_from) = config::load_or_default(cli.config.as_deref());
                if let Some(path) = &loaded_from {
                    eprintln!("# Loaded from: {}", path.display());
                } else {
                    eprintln!("# No config file found; showing defaults");
                }
                let yaml = serde_yaml::to_string(&app).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Path => {
                let search_paths: [Option<String>; 3] = [
                    std::env::current_dir()
                        .ok()
                        .map(|p| p.display().to_string()),
                    dirs::config_dir().map(|p| p.join("gitbom-cve").display().to_string()),
                    dirs::home_dir().map(|p| p.display().to_string()),
                ];
                eprintln!("Config file search paths (in order):");
                for path in search_paths.into_iter().flatten() {
                    eprintln!("  {path}");
                }
                eprintln!();
                match config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".gitbom-cve.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                std::fs::write(&target, config::generate_example_config())
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(exit_codes::SUCCESS)
            }
        },
    }
}
