use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codescribe::cli::ProviderOverrides;
use codescribe::cli::commands;
use codescribe::cli::commands::generate::GenerateOptions;
use codescribe::{DocType, ProviderKind};

/// Parse doc type from string
fn parse_doc_type(s: &str) -> Result<DocType, String> {
    s.parse::<DocType>().map_err(|e| e.message)
}

#[derive(Parser)]
#[command(name = "codescribe")]
#[command(
    version,
    about = "AI documentation generator with structural analysis and quality scoring"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate documentation for a source file
    Generate {
        #[arg(help = "Source file to document")]
        file: PathBuf,
        #[arg(
            long,
            short = 't',
            default_value = "README",
            help = "Doc type: README, JSDOC, API, ARCHITECTURE, OPENAPI"
        )]
        doc_type: String,
        #[arg(long, short, help = "Source language (default: detected from extension)")]
        language: Option<String>,
        #[arg(long, help = "LLM provider (anthropic, openai, ollama)")]
        provider: Option<ProviderKind>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Print chunks as they arrive")]
        stream: bool,
        #[arg(long, help = "Print the full result as JSON")]
        json: bool,
        #[arg(long, help = "Sample request (enables prompt caching)")]
        sample: bool,
        #[arg(long, short, help = "Write documentation to this file")]
        output: Option<PathBuf>,
    },

    /// Show the structural analysis of a source file
    Analyze {
        #[arg(help = "Source file to analyze")]
        file: PathBuf,
        #[arg(long, short, help = "Source language (default: detected from extension)")]
        language: Option<String>,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },

    /// Score existing documentation against its source
    Score {
        #[arg(help = "Documentation file to score")]
        doc: PathBuf,
        #[arg(long, short, help = "Source file the documentation describes")]
        source: PathBuf,
        #[arg(long, short = 't', default_value = "README", value_parser = parse_doc_type, help = "Doc type: README, JSDOC, API, ARCHITECTURE, OPENAPI")]
        doc_type: DocType,
        #[arg(long, short, help = "Source language (default: detected from extension)")]
        language: Option<String>,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Output as JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mcodescribe encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    // Logs go to stderr so stdout carries only documentation or JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            file,
            doc_type,
            language,
            provider,
            model,
            stream,
            json,
            sample,
            output,
        } => {
            commands::generate::run(GenerateOptions {
                file,
                doc_type,
                language,
                overrides: ProviderOverrides { provider, model },
                stream,
                json,
                sample,
                output,
            })?;
        }
        Commands::Analyze {
            file,
            language,
            json,
        } => {
            commands::analyze::run(&file, language.as_deref(), json)?;
        }
        Commands::Score {
            doc,
            source,
            doc_type,
            language,
            json,
        } => {
            commands::score::run(&doc, &source, doc_type, language.as_deref(), json)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => commands::config::show(json)?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { global, force } => commands::config::init(global, force)?,
        },
    }

    Ok(())
}
