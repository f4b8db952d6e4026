//! nbmd CLI - Notebook to markdown conversion tool
//!
//! Converts Jupyter notebooks to markdown, labels output blocks, and strips
//! percent-format headers from exported markdown.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::{BatchConfig, Config, ConvertConfig, StripConfig, DEFAULT_CONFIG};
use nbmd_markdown::{
    convert_notebook_file, read_markdown_file, ConvertOptions, ExportOptions, HeaderStripper,
    OutputRelabeler, RelabelOptions, StripOptions,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Prefix of single-file conversion output names
const CONVERT_OUTPUT_PREFIX: &str = "to-markdown-";
/// Suffix appended to the stem of stripped markdown files
const STRIP_OUTPUT_SUFFIX: &str = "-processed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Default `env_logger` filter for this verbosity; `RUST_LOG` overrides it
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "debug",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "nbmd",
    about = "Convert Jupyter notebooks to markdown",
    long_about = "Convert Jupyter notebooks to markdown and post-process the result.\n\
                  \n\
                  Output blocks following a code fence are labeled with an OUTPUT line;\n\
                  percent-format headers (# %%) can be stripped from exported markdown.",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a notebook to markdown and label its output blocks
    #[command(long_about = "Convert a notebook to markdown and label its output blocks.\n\
                      \n\
                      Without -o the result is written next to the input as\n\
                      to-markdown-<name>.md. Defaults can be set via .nbmd.toml.")]
    Convert {
        /// Notebook file (.ipynb)
        input: PathBuf,

        /// Output markdown file
        #[arg(short, long, conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Write markdown to stdout instead of a file
        #[arg(long)]
        stdout: bool,

        /// Skip output-block relabeling
        #[arg(long)]
        no_relabel: bool,

        /// Fence language for code cells (defaults to the notebook language)
        #[arg(long)]
        language: Option<String>,

        /// Label written above output blocks
        #[arg(long)]
        label: Option<String>,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
    },

    /// Convert every notebook in a directory
    #[command(long_about = "Convert every .ipynb file in INPUT_DIR to OUTPUT_DIR/<name>.md.\n\
                      \n\
                      Batch conversion does not relabel output blocks unless --relabel\n\
                      is given. Existing outputs are skipped unless --force is given.")]
    Batch {
        /// Directory containing notebooks
        input_dir: PathBuf,

        /// Directory for markdown files (created if missing)
        output_dir: PathBuf,

        /// Label output blocks as `convert` does
        #[arg(long)]
        relabel: bool,

        /// Keep converting after a notebook fails
        #[arg(long)]
        continue_on_error: bool,

        /// Fence language for code cells
        #[arg(long)]
        language: Option<String>,

        /// Overwrite existing output files
        #[arg(short, long)]
        force: bool,
    },

    /// Label output blocks in an already exported markdown file
    Relabel {
        /// Markdown file
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Label written above output blocks
        #[arg(long)]
        label: Option<String>,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
    },

    /// Strip percent-format headers (# %%, # %% [markdown], # ...) from markdown
    #[command(long_about = "Strip percent-format headers from markdown.\n\
                      \n\
                      Without -o the result is written next to the input as\n\
                      <name>-processed.md.")]
    Strip {
        /// Markdown file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Language of the empty block that replaces `# %%` delimiters
        #[arg(long)]
        language: Option<String>,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
    },

    /// Manage .nbmd.toml configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show the merged configuration
    Show,
    /// Create a .nbmd.toml with commented defaults
    Init {
        /// Create in the home directory (~/.nbmd.toml) instead of the current directory
        #[arg(long)]
        user: bool,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.log_filter()))
        .target(env_logger::Target::Stderr)
        .init();

    let (user_config, project_config) = Config::discover_configs();
    let config = Config::merge(user_config, project_config);

    match args.command {
        Commands::Convert {
            input,
            output,
            stdout,
            no_relabel,
            language,
            label,
            force,
        } => {
            let defaults = config.convert.unwrap_or_default();
            let relabel = !no_relabel && defaults.relabel.unwrap_or(true);
            let options = convert_options(&defaults, language, label, relabel);
            let target = if stdout {
                None
            } else {
                Some(output.unwrap_or_else(|| default_convert_output(&input)))
            };
            convert_command(&input, target.as_deref(), &options, force, verbosity)
        }
        Commands::Batch {
            input_dir,
            output_dir,
            relabel,
            continue_on_error,
            language,
            force,
        } => {
            let batch_defaults = config.batch.unwrap_or_default();
            let convert_defaults = config.convert.unwrap_or_default();
            let relabel = relabel || batch_defaults.relabel.unwrap_or(false);
            let options = convert_options(&convert_defaults, language, None, relabel);
            batch_command(
                &input_dir,
                &output_dir,
                &options,
                &batch_defaults,
                continue_on_error,
                force,
                verbosity,
            )
        }
        Commands::Relabel {
            input,
            output,
            label,
            force,
        } => {
            let defaults = config.convert.unwrap_or_default();
            let label = label.or(defaults.label);
            relabel_command(&input, output.as_deref(), label, force, verbosity)
        }
        Commands::Strip {
            input,
            output,
            language,
            force,
        } => {
            let defaults = config.strip.unwrap_or_default();
            let target = output.unwrap_or_else(|| default_strip_output(&input));
            strip_command(&input, &target, language, &defaults, force, verbosity)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => config_show(&config),
            ConfigAction::Init { user, force } => config_init(user, force, verbosity),
        },
    }
}

/// Resolve conversion options with precedence: CLI > config > defaults.
/// `relabel` is already resolved by the caller.
fn convert_options(
    defaults: &ConvertConfig,
    language: Option<String>,
    label: Option<String>,
    relabel: bool,
) -> ConvertOptions {
    let label = label.or_else(|| defaults.label.clone());

    ConvertOptions {
        export: ExportOptions {
            language: language.or_else(|| defaults.language.clone()),
        },
        relabel: relabel.then(|| relabel_options(label)),
    }
}

fn relabel_options(label: Option<String>) -> RelabelOptions {
    let mut options = RelabelOptions::default();
    if let Some(label) = label {
        options.label = label;
    }
    options
}

/// `dir/report.ipynb` -> `dir/to-markdown-report.md`
fn default_convert_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    input.with_file_name(format!(
        "{CONVERT_OUTPUT_PREFIX}{}.md",
        stem.to_string_lossy()
    ))
}

/// `dir/notes.md` -> `dir/notes-processed.md`
fn default_strip_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let ext = input
        .extension()
        .map_or_else(|| "md".to_string(), |e| e.to_string_lossy().into_owned());
    input.with_file_name(format!(
        "{}{STRIP_OUTPUT_SUFFIX}.{ext}",
        stem.to_string_lossy()
    ))
}

/// `out/` + `in/report.ipynb` -> `out/report.md`
fn batch_output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    output_dir.join(format!("{}.md", stem.to_string_lossy()))
}

/// Write `content` to `path`, refusing to replace an existing file unless `force`
fn write_output(path: &Path, content: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Output file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}

fn write_stdout(content: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")
}

fn convert_command(
    input: &Path,
    output: Option<&Path>,
    options: &ConvertOptions,
    force: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let conversion = convert_notebook_file(input, options)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    match output {
        Some(path) => {
            write_output(path, &conversion.markdown, force)?;
            if verbosity.should_show_output() {
                let labels = conversion.relabel.map_or(0, |r| r.total());
                eprintln!(
                    "{} {} -> {} ({} cells, {} output labels)",
                    "✓".green().bold(),
                    input.display(),
                    path.display(),
                    conversion.cells,
                    labels
                );
            }
            Ok(())
        }
        None => write_stdout(&conversion.markdown),
    }
}

fn batch_command(
    input_dir: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
    config: &BatchConfig,
    continue_on_error: bool,
    force: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let continue_on_error = continue_on_error || config.continue_on_error.unwrap_or(false);

    if !input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", input_dir.display());
    }

    if !output_dir.exists() {
        fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;
    }
    if !output_dir.is_dir() {
        anyhow::bail!("Output path is not a directory: {}", output_dir.display());
    }

    let inputs = discover_notebooks(input_dir)?;
    if inputs.is_empty() {
        anyhow::bail!("No .ipynb files found in {}", input_dir.display());
    }

    let total = inputs.len();
    if verbosity.should_show_output() {
        eprintln!(
            "{} Processing {} notebooks{}...",
            "Info:".blue().bold(),
            total.to_string().cyan(),
            if options.relabel.is_some() {
                " (relabeling outputs)"
            } else {
                ""
            }
        );
    }

    let start = Instant::now();
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;

    for input in &inputs {
        let output_path = batch_output_path(output_dir, input);

        if output_path.exists() && !force {
            log::info!("Skipping {}: output exists", input.display());
            skipped += 1;
            continue;
        }

        let result = convert_notebook_file(input, options)
            .with_context(|| format!("Failed to convert {}", input.display()))
            .and_then(|conversion| write_output(&output_path, &conversion.markdown, true));

        match result {
            Ok(()) => {
                succeeded += 1;
                log::debug!("Wrote {}", output_path.display());
            }
            Err(e) if continue_on_error => {
                failed += 1;
                eprintln!("{} {e:#}", "Error:".red().bold());
            }
            Err(e) => return Err(e),
        }
    }

    if verbosity.should_show_output() {
        eprintln!("\n{}", "=== Batch Conversion Summary ===".bold());
        eprintln!("{:<16} {}", "Total files:", total.to_string().cyan());
        eprintln!("{:<16} {}", "Succeeded:", succeeded.to_string().green());
        eprintln!(
            "{:<16} {}",
            "Failed:",
            if failed > 0 {
                failed.to_string().red()
            } else {
                failed.to_string().normal()
            }
        );
        eprintln!("{:<16} {}", "Skipped:", skipped.to_string().yellow());
        eprintln!("{:<16} {:.2}s", "Total time:", start.elapsed().as_secs_f64());
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {total} notebooks failed to convert");
    }
    Ok(())
}

/// Sorted list of `*.ipynb` files directly inside `dir`
fn discover_notebooks(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.ipynb",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let entries = glob::glob(&pattern)
        .with_context(|| format!("Invalid input directory pattern: {pattern}"))?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => log::warn!("Skipping unreadable entry: {e}"),
        }
    }
    paths.sort();
    Ok(paths)
}

fn relabel_command(
    input: &Path,
    output: Option<&Path>,
    label: Option<String>,
    force: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let text = read_markdown_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let (relabeled, report) = OutputRelabeler::new(relabel_options(label)).relabel_text(&text);

    match output {
        Some(path) => {
            write_output(path, &relabeled, force)?;
            if verbosity.should_show_output() {
                eprintln!(
                    "{} {} -> {} ({} tight, {} loose)",
                    "✓".green().bold(),
                    input.display(),
                    path.display(),
                    report.tight,
                    report.loose
                );
            }
            Ok(())
        }
        None => write_stdout(&relabeled),
    }
}

fn strip_command(
    input: &Path,
    output: &Path,
    language: Option<String>,
    config: &StripConfig,
    force: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let text = read_markdown_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let mut options = StripOptions::default();
    if let Some(language) = language.or_else(|| config.language.clone()) {
        options.code_language = language;
    }
    let stripped = HeaderStripper::new(options).strip_text(&text);

    write_output(output, &stripped, force)?;
    if verbosity.should_show_output() {
        eprintln!(
            "{} {} -> {}",
            "✓".green().bold(),
            input.display(),
            output.display()
        );
    }
    Ok(())
}

fn config_show(config: &Config) -> Result<()> {
    let toml = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    if toml.trim().is_empty() {
        println!("# No configuration found (built-in defaults in use)");
    } else {
        println!("{toml}");
    }
    Ok(())
}

fn config_init(user: bool, force: bool, verbosity: Verbosity) -> Result<()> {
    let config_path = if user {
        config::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
    } else {
        config::project_config_path()
    };

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            config_path.display()
        );
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
    if verbosity.should_show_output() {
        eprintln!(
            "{} Created {}",
            "✓".green().bold(),
            config_path.display()
        );
    }
    Ok(())
}
