use anyhow::{Context, Result};
use caselink::cli::output::{print_previews, print_run_summary, OutputFormat};
use caselink::{vocab, Config, Linker, Preview, Segmenter, VocabularyIndex};
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "caselink")]
#[command(
    version,
    about = "Create lowercase and CamelCase symlinks for every file",
    long_about = None
)]
struct Cli {
    /// Path to handle (repeat for several)
    #[arg(short, long, action = ArgAction::Append, value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Vocabulary file (word list, or a compiled .fst)
    #[arg(short = 'y', long, global = true, env = "CASELINK_VOCABULARY")]
    vocabulary: Option<PathBuf>,

    /// Do not overwrite symlink if exists
    #[arg(short = 'w', long)]
    not_overwrite: bool,

    /// Do not fail on filesystem errors
    #[arg(short = 'e', long)]
    skip_errors: bool,

    /// Log what would be linked without touching the filesystem
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Maximum CamelCase aliases per file
    #[arg(long, value_name = "N", global = true)]
    max_candidates: Option<usize>,

    /// Exit with code 0 even if some files could not be handled
    #[arg(long)]
    no_fail: bool,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Show the aliases filenames would receive
    Preview {
        /// File names (not paths)
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Vocabulary management
    Vocab {
        #[command(subcommand)]
        action: VocabCommands,
    },
}

#[derive(Parser, Debug)]
enum VocabCommands {
    /// Compile a word list into an FST vocabulary
    Build {
        /// Word list, one word per line
        input: PathBuf,
        /// Output file (defaults to the data directory)
        output: Option<PathBuf>,
    },
    /// Show vocabulary info
    Info {
        /// Vocabulary file (defaults to the configured one)
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "caselink", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load(
        cli.vocabulary.clone(),
        cli.not_overwrite,
        cli.skip_errors,
        cli.max_candidates,
    )?;

    if let Some(command) = cli.command {
        return handle_command(command, &config, !cli.no_color, cli.format);
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No paths specified. Use --help for usage information.");
    }

    let vocabulary = load_vocabulary(&config)?;
    let segmenter = Segmenter::new(&vocabulary).with_min_word_len(config.min_word_len);
    let linker = Linker::new(segmenter, config.link_options(cli.dry_run));

    let report = linker.run(&cli.paths)?;
    print_run_summary(&report, !cli.no_color, cli.format, cli.dry_run)?;

    if report.has_problems() && !cli.no_fail {
        std::process::exit(1);
    }

    Ok(())
}

fn handle_command(
    command: Commands,
    config: &Config,
    colored: bool,
    format: OutputFormat,
) -> Result<()> {
    match command {
        Commands::Preview { names } => {
            let vocabulary = load_vocabulary(config)?;
            let segmenter = Segmenter::new(&vocabulary).with_min_word_len(config.min_word_len);
            let previews: Vec<Preview> = names
                .iter()
                .map(|name| Preview::of(name, &segmenter, config.max_candidates))
                .collect();
            print_previews(&previews, colored, format)?;
        }
        Commands::Vocab { action } => match action {
            VocabCommands::Build { input, output } => {
                vocab::manager::build(&input, output.as_deref(), colored)?;
            }
            VocabCommands::Info { path } => {
                let path = match path {
                    Some(path) => path,
                    None => config.vocabulary_path()?,
                };
                vocab::manager::show_info(&path, colored)?;
            }
        },
    }
    Ok(())
}

fn load_vocabulary(config: &Config) -> Result<VocabularyIndex> {
    let path = config.vocabulary_path()?;
    let vocabulary = VocabularyIndex::load(&path)
        .with_context(|| format!("Failed to load vocabulary: {}", path.display()))?;

    info!("Loaded {} words from {}", vocabulary.len(), path.display());
    debug!("Minimum word length {}", config.min_word_len);
    Ok(vocabulary)
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
