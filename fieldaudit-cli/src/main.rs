use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

use fieldaudit_core::{run_audit, AuditConfig, Backend, CompressionLevel};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Compression {
    None,
    Fast,
    Default,
    Best,
}

impl From<Compression> for CompressionLevel {
    fn from(c: Compression) -> Self {
        match c {
            Compression::None => CompressionLevel::None,
            Compression::Fast => CompressionLevel::Fast,
            Compression::Default => CompressionLevel::Default,
            Compression::Best => CompressionLevel::Best,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CodecBackend {
    /// Built-in package reader and writer
    Minimal,
    /// calamine and rust_xlsxwriter (needs the `library-backend` feature)
    Library,
}

impl From<CodecBackend> for Backend {
    fn from(b: CodecBackend) -> Self {
        match b {
            CodecBackend::Minimal => Backend::Minimal,
            CodecBackend::Library => Backend::Library,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workbook holding the fields to audit
    #[arg(long, short = 's')]
    source: Option<PathBuf>,

    /// Sheet of the source workbook
    #[arg(long)]
    source_sheet: Option<String>,

    /// Workbook holding the data index
    #[arg(long, short = 'i')]
    index: Option<PathBuf>,

    /// Sheet of the data index (first sheet when omitted)
    #[arg(long)]
    index_sheet: Option<String>,

    /// Output workbook path
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Sheet name of the output workbook
    #[arg(long)]
    output_sheet: Option<String>,

    /// Source column holding field names
    #[arg(long)]
    api_column: Option<String>,

    /// Data index column holding known names
    #[arg(long)]
    index_column: Option<String>,

    /// Compression of the written package
    #[arg(long, value_enum, default_value = "default")]
    compression: Compression,

    /// Codec used to read and write workbooks
    #[arg(long, value_enum, default_value = "minimal")]
    backend: CodecBackend,

    /// More log output (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> AuditConfig {
        let mut config = AuditConfig::new().with_compression(self.compression.into());
        if let Some(path) = &self.source {
            config.source_path = path.clone();
        }
        if let Some(sheet) = &self.source_sheet {
            config.source_sheet = sheet.clone();
        }
        if let Some(path) = &self.index {
            config.index_path = path.clone();
        }
        if self.index_sheet.is_some() {
            config.index_sheet = self.index_sheet.clone();
        }
        if let Some(path) = &self.output {
            config.output_path = path.clone();
        }
        if let Some(sheet) = &self.output_sheet {
            config.output_sheet = sheet.clone();
        }
        if let Some(column) = &self.api_column {
            config = config.with_api_column(column.as_str());
        }
        if let Some(column) = &self.index_column {
            config = config.with_index_column(column.as_str());
        }
        config
    }

    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins over the flags.
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let config = cli.config();
    let codec = Backend::from(cli.backend)
        .codec(config.compression)
        .context("Failed to select codec")?;

    let summary = run_audit(codec.as_ref(), &config).with_context(|| {
        format!(
            "Audit of {} against {} failed",
            config.source_path.display(),
            config.index_path.display()
        )
    })?;

    println!("Governance audit created: {}", summary.output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_config() {
        let cli = Cli::parse_from(["fieldaudit"]);
        assert_eq!(cli.config(), AuditConfig::default());
        assert_eq!(cli.log_level(), LevelFilter::Info);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "fieldaudit",
            "-s",
            "fields.xlsx",
            "--source-sheet",
            "Fields",
            "-i",
            "index.xlsx",
            "--index-sheet",
            "Attributes",
            "-o",
            "audit.xlsx",
            "--api-column",
            "API Name",
            "--compression",
            "best",
            "-vv",
        ]);
        let config = cli.config();
        assert_eq!(config.source_path, PathBuf::from("fields.xlsx"));
        assert_eq!(config.source_sheet, "Fields");
        assert_eq!(config.index_sheet.as_deref(), Some("Attributes"));
        assert_eq!(config.output_path, PathBuf::from("audit.xlsx"));
        assert_eq!(config.output_sheet, "Governance Audit");
        assert_eq!(config.api_column, "API Name");
        assert_eq!(config.index_column, "Name");
        assert_eq!(config.compression, CompressionLevel::Best);
        assert_eq!(cli.log_level(), LevelFilter::Trace);
    }
}
