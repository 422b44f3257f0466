use crate::{LinkReport, Preview};
use anyhow::Result;
use colored::*;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_previews(previews: &[Preview], colored_output: bool, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            print_text_previews(previews, colored_output);
            Ok(())
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(previews)?);
            Ok(())
        }
    }
}

fn print_text_previews(previews: &[Preview], colored_output: bool) {
    for preview in previews {
        if colored_output {
            println!("{}", preview.filename.bold().underline());
            println!("  {} {}", "lower".dimmed(), preview.lower);
        } else {
            println!("{}", preview.filename);
            println!("  lower {}", preview.lower);
        }

        for name in &preview.camel {
            if colored_output {
                println!("  {} {}", "camel".dimmed(), name.green());
            } else {
                println!("  camel {}", name);
            }
        }

        if let Some(error) = &preview.error {
            if colored_output {
                println!("  {} {}", "✗".red().bold(), error.red());
            } else {
                println!("  ✗ {}", error);
            }
        }
    }
}

pub fn print_run_summary(
    report: &LinkReport,
    colored: bool,
    format: OutputFormat,
    dry_run: bool,
) -> Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let file_word = if report.files_seen == 1 { "file" } else { "files" };
    let created_word = if dry_run { "to create" } else { "created" };

    println!();
    if colored {
        println!(
            "{} {} {}, {} links {}, {} replaced, {} kept",
            "✓".green().bold(),
            report.files_seen.to_string().bold(),
            file_word,
            report.links_created.to_string().green().bold(),
            created_word,
            report.links_replaced,
            report.links_kept
        );
    } else {
        println!(
            "✓ {} {}, {} links {}, {} replaced, {} kept",
            report.files_seen,
            file_word,
            report.links_created,
            created_word,
            report.links_replaced,
            report.links_kept
        );
    }

    for name in &report.unsegmented {
        if colored {
            println!("{} {} {}", "✗".red().bold(), "not segmented:".yellow(), name);
        } else {
            println!("✗ not segmented: {}", name);
        }
    }

    for failure in &report.failures {
        if colored {
            println!(
                "{} {} {}",
                "✗".red().bold(),
                failure.path.display().to_string().red(),
                failure.reason.dimmed()
            );
        } else {
            println!("✗ {} {}", failure.path.display(), failure.reason);
        }
    }

    Ok(())
}
