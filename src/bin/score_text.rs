//! Score the readability of a text from the command line.
//!
//! Usage:
//!   score-text [--lang xx] [text...]
//!   echo "Some text." | score-text --lang es
//!
//! With no text arguments the text is read from stdin. The report is printed
//! as pretty JSON. No translation provider or API key is needed.

use anyhow::{Context, Result};
use health_text_pipeline::i18n::LanguageCatalog;
use health_text_pipeline::readability::ReadabilityScorer;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, PartialEq)]
struct Options {
    language: String,
    text: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut language = "en".to_string();
    let mut words = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--lang" | "-l" => {
                language = iter
                    .next()
                    .context("--lang requires a language code")?
                    .trim()
                    .to_lowercase();
            }
            _ => words.push(arg.as_str()),
        }
    }

    Ok(Options {
        language,
        text: (!words.is_empty()).then(|| words.join(" ")),
    })
}

fn print_usage() {
    eprintln!("Usage: score-text [--lang xx] [text...]");
    eprintln!();
    eprintln!("Reads from stdin when no text is given.");
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("health_text_pipeline=warn".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_usage();
        return Ok(());
    }

    let options = parse_args(&args)?;
    let text = match options.text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            buffer
        }
    };

    let catalog = Arc::new(LanguageCatalog::new());
    if !catalog.is_supported(&options.language) {
        anyhow::bail!("Unsupported language: {}", options.language);
    }

    debug!("Scoring {} characters as {}", text.len(), options.language);
    let report = ReadabilityScorer::new(catalog).analyze(&text, &options.language);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
