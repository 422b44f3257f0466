use super::index::{is_compiled, VocabularyIndex};
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Where `vocab build` writes when no output path is given.
pub fn default_compiled_path() -> Result<PathBuf> {
    let data_dir = crate::config::Config::data_dir().context("Failed to get data directory")?;
    fs::create_dir_all(&data_dir).context("Failed to create data directory")?;
    Ok(data_dir.join("vocabulary.fst"))
}

/// Compile a text word list into an FST vocabulary.
pub fn build(input: &Path, output: Option<&Path>, colored_output: bool) -> Result<PathBuf> {
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_compiled_path()?,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.set_message(format!("Reading {}...", input.display()));

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read word list: {}", input.display()))?;

    pb.set_message("Building vocabulary...");
    let count = VocabularyIndex::build_to_path(content.lines(), &output)
        .with_context(|| format!("Failed to build vocabulary: {}", output.display()))?;
    pb.finish_and_clear();

    if colored_output {
        println!(
            "{} Compiled {} words into {}",
            "✓".green().bold(),
            count.to_string().yellow(),
            output.display().to_string().cyan()
        );
    } else {
        println!("✓ Compiled {} words into {}", count, output.display());
    }

    Ok(output)
}

pub fn show_info(path: &Path, colored_output: bool) -> Result<()> {
    if !path.exists() {
        if colored_output {
            println!(
                "{} Vocabulary {} not found.",
                "✗".red().bold(),
                path.display().to_string().yellow()
            );
        } else {
            println!("✗ Vocabulary {} not found.", path.display());
        }
        return Ok(());
    }

    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
    let format = if is_compiled(path) {
        "FST (Finite State Transducer)"
    } else {
        "Plain text, one word per line"
    };

    let title = format!("Vocabulary: {}", path.display());
    if colored_output {
        println!("{}", title.bold());
    } else {
        println!("{}", title);
    }
    println!("  Size: {} KB", metadata.len() / 1024);
    println!("  Format: {}", format);

    match VocabularyIndex::load(path) {
        Ok(vocab) => println!("  Words: {}", vocab.len()),
        Err(e) if colored_output => println!("  {}: {}", "Error loading vocabulary".red(), e),
        Err(e) => println!("  Error loading vocabulary: {}", e),
    }

    Ok(())
}
