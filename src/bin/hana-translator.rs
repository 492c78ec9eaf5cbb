//! hana-translator: T-SQL to SAP HANA SQL
//!
//! # Usage
//!
//! ```bash
//! # Translate a file
//! hana-translator script.sql
//!
//! # From stdin, indented, without dbo
//! cat script.sql | hana-translator --pretty --remove-dbo
//!
//! # Machine-readable report
//! hana-translator script.sql --json
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use colored::*;
use hana_translator::config::CONFIG_ENV;
use hana_translator::prelude::*;

#[derive(Parser)]
#[command(name = "hana-translator")]
#[command(version)]
#[command(about = "Translate T-SQL scripts into SAP HANA SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    hana-translator script.sql
    echo 'select top 5 * from dbo.OITM' | hana-translator --remove-dbo
    hana-translator script.sql --pretty --summary")]
struct Cli {
    /// T-SQL file to translate; stdin when absent or `-`
    input: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Write the translation to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Indented output
    #[arg(long, conflicts_with = "plain")]
    pretty: bool,

    /// One statement per line
    #[arg(long)]
    plain: bool,

    /// Do not write notes into the output
    #[arg(long)]
    no_comments: bool,

    /// Drop the default schema from object names
    #[arg(long, conflicts_with = "keep_dbo")]
    remove_dbo: bool,

    /// Keep the default schema in object names
    #[arg(long)]
    keep_dbo: bool,

    /// Print the note summary to stderr
    #[arg(short, long)]
    summary: bool,

    /// Print a JSON report (text, summary, catalog) instead of the text
    #[arg(long, conflicts_with = "tree")]
    json: bool,

    /// Print the translated tree instead of the text
    #[arg(long)]
    tree: bool,

    /// Exit with status 2 when the translation has errors
    #[arg(long)]
    strict: bool,
}

impl Cli {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("cannot load config {}", path.display()))?,
            None => Config::load()?,
        };
        if self.pretty {
            config.format_output = true;
        }
        if self.plain {
            config.format_output = false;
        }
        if self.no_comments {
            config.translation_comments = false;
        }
        if self.remove_dbo {
            config.remove_default_schema = true;
        }
        if self.keep_dbo {
            config.remove_default_schema = false;
        }
        Ok(config)
    }

    fn source(&self) -> anyhow::Result<String> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display())),
            _ => {
                let mut source = String::new();
                std::io::stdin()
                    .read_to_string(&mut source)
                    .context("cannot read stdin")?;
                Ok(source)
            }
        }
    }

    fn emit(&self, text: &str) -> anyhow::Result<()> {
        match &self.output {
            Some(path) => {
                std::fs::write(path, format!("{}\n", text))
                    .with_context(|| format!("cannot write {}", path.display()))?;
                eprintln!("{} Wrote {}", "✓".green(), path.display().to_string().cyan());
            }
            None => println!("{}", text),
        }
        Ok(())
    }
}

fn print_summary(summary: &Summary) {
    let errors = if summary.errors == 0 {
        summary.errors.to_string().green()
    } else {
        summary.errors.to_string().red().bold()
    };
    eprintln!("{} {}", "Statements:".dimmed(), summary.statements);
    eprintln!("{} {}", "Errors:".dimmed(), errors);
    for category in &summary.categories {
        let label = format!("{} ({})", category.category.label(), category.count);
        let label = if category.category.is_error() {
            label.red()
        } else {
            label.yellow()
        };
        eprintln!("{}", label);
        for message in &category.messages {
            if message.count > 1 {
                eprintln!("    {} {}", message.text, format!("(x{})", message.count).dimmed());
            } else {
                eprintln!("    {}", message.text);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    let source = cli.source()?;
    let translator = Translator::new(config);

    if cli.tree {
        let translated = translator.translate_tree(&source)?;
        cli.emit(translated.tree.dump(translated.root).trim_end())?;
        return Ok(());
    }

    let translation = match translator.translate(&source) {
        Ok(translation) => translation,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    if cli.json {
        cli.emit(&serde_json::to_string_pretty(&translation)?)?;
    } else {
        cli.emit(&translation.text)?;
    }
    if cli.summary {
        print_summary(&translation.summary);
    }
    if cli.strict && !translation.is_clean() {
        std::process::exit(2);
    }
    Ok(())
}
