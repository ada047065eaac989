use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use svelte_highlight_preprocess::config::{load_from_path, HighlightConfig, CONFIG_FILE_NAME};
use svelte_highlight_preprocess::{Highlight, MarkupInput, Processed};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "svelte-highlight")]
#[command(about = "Format and syntax-highlight annotated <pre> blocks in Svelte components", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./highlight.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess components and print or write the result
    Process {
        /// Files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Rewrite files in place instead of printing them
        #[arg(short, long)]
        write: bool,

        /// Write a source map next to each file as <file>.map
        #[arg(short, long)]
        map: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Report diagnostics without writing; exits non-zero if any were found
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List the accepted data-language values
    Languages,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // check prints diagnostics itself
    let default_level = match cli.command {
        Commands::Check { .. } => "error",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let highlight = build_preprocessor(cli.config.as_deref())?;

    match cli.command {
        Commands::Process {
            paths,
            write,
            map,
            diff,
        } => cmd_process(&highlight, &paths, write, map, diff),

        Commands::Check { paths } => cmd_check(&highlight, &paths),

        Commands::Languages => cmd_languages(&highlight),
    }
}

/// Load the explicit config, or `highlight.toml` from the working directory.
fn build_preprocessor(config: Option<&Path>) -> Result<Highlight> {
    let config = match config {
        Some(path) => load_from_path(path)?,
        None if Path::new(CONFIG_FILE_NAME).is_file() => load_from_path(CONFIG_FILE_NAME)?,
        None => HighlightConfig::default(),
    };
    let options = config.to_options()?;
    Ok(Highlight::new(options))
}

/// Expand directories to the `.svelte` files they contain.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.exists() {
            anyhow::bail!("No such file or directory: {}", path.display());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("svelte")
            {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

fn run_file(highlight: &Highlight, file: &Path) -> Result<(String, Option<Processed>)> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let filename = file.to_string_lossy();
    let processed = highlight
        .markup(MarkupInput::new(&content, Some(filename.as_ref())))
        .with_context(|| format!("failed to preprocess {}", file.display()))?;
    Ok((content, processed))
}

/// Helper: Show unified diff between original and processed content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!(
        "{}",
        format!("+++ {} (highlighted)", file.display()).dimmed()
    );

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_process(
    highlight: &Highlight,
    paths: &[PathBuf],
    write: bool,
    map: bool,
    show_diff: bool,
) -> Result<()> {
    let files = collect_files(paths)?;
    let mut rewritten = 0;
    let mut skipped = 0;

    for file in &files {
        let (content, processed) = run_file(highlight, file)?;
        let Some(processed) = processed else {
            eprintln!("{}", format!("Skipped {}", file.display()).dimmed());
            skipped += 1;
            continue;
        };

        if show_diff && processed.code != content {
            display_diff(file, &content, &processed.code);
        }

        if write {
            if processed.code != content {
                fs::write(file, &processed.code)
                    .with_context(|| format!("failed to write {}", file.display()))?;
                rewritten += 1;
            }
        } else if !show_diff {
            print!("{}", processed.code);
        }

        if map {
            let mut map_path = file.clone().into_os_string();
            map_path.push(".map");
            fs::write(&map_path, processed.map.to_json()?)
                .with_context(|| format!("failed to write source map for {}", file.display()))?;
        }
    }

    if write {
        eprintln!(
            "{} {} rewritten, {} skipped",
            "Done:".bold(),
            format!("{rewritten}").green(),
            format!("{skipped}").cyan()
        );
    }
    Ok(())
}

fn cmd_check(highlight: &Highlight, paths: &[PathBuf]) -> Result<()> {
    let files = collect_files(paths)?;
    let mut blocks = 0;
    let mut diagnostics = 0;

    for file in &files {
        let (_, processed) = run_file(highlight, file)?;
        let Some(processed) = processed else {
            continue;
        };

        blocks += processed.blocks.len();
        diagnostics += processed.diagnostics.len();
        for diagnostic in &processed.diagnostics {
            println!("{}", diagnostic.to_string().yellow());
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} files", files.len());
    println!("  {} code blocks", format!("{blocks}").green());
    println!("  {} diagnostics", format!("{diagnostics}").yellow());

    if diagnostics > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_languages(highlight: &Highlight) -> Result<()> {
    for language in highlight.languages().iter() {
        println!("{language}");
    }
    Ok(())
}
