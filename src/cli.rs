use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::session::SessionHandle;

pub const STATE_DIR_ENV: &str = "TABLE_RECONCILE_STATE_DIR";
pub const DEFAULT_STATE_DIR: &str = ".table-reconcile";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile overlapping CSV and spreadsheet exports into one record per entity",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read and normalize one or more CSV/spreadsheet files into a session
    Ingest(IngestArgs),
    /// Infer a join key and merge every ingested table into one record per key
    Combine(CombineArgs),
    /// Summarize the merged dataset: breakdowns, carbon factor stats, due activities
    Dashboard(DashboardArgs),
    /// Write the merged dataset to CSV, TSV or XLSX
    Export(ExportArgs),
    /// List the files ingested into a session and how their headers were mapped
    Status(StatusArgs),
    /// Discard a session and everything ingested into it
    Reset(StatusArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    /// Session handle grouping ingested files
    #[arg(short = 's', long = "session", default_value_t = SessionHandle::default())]
    pub session: SessionHandle,
    /// Directory holding session state
    #[arg(long = "state-dir", env = STATE_DIR_ENV, default_value = DEFAULT_STATE_DIR)]
    pub state_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Input files (.csv, .tsv, .txt, .xlsx, .xlsm, .xls, .xlsb, .ods)
    #[arg(short = 'i', long = "input", required = true, num_args = 1.., action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Start a fresh session with a generated handle instead of --session
    #[arg(long = "new-session", conflicts_with = "session")]
    pub new_session: bool,
    /// Merge profile (YAML) adding header aliases
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Delimiter for text inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of text inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CombineArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Merge profile (YAML) with key candidates and display fields
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Join key candidate, highest priority first; repeat for fallbacks (`--key customer,name`)
    #[arg(short = 'k', long = "key", value_parser = crate::keys::parse_key_set, action = clap::ArgAction::Append)]
    pub keys: Vec<Vec<String>>,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Number of sample rows to display
    #[arg(long, default_value_t = 200)]
    pub rows: usize,
    /// Emit the dashboard as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum ExportFormat {
    Csv,
    Tsv,
    Xlsx,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Output file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Output format (inferred from the output extension when omitted)
    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,
    /// Rewrite next_activity_due_date values as YYYY-MM-DD where they parse
    #[arg(long = "normalize-dates")]
    pub normalize_dates: bool,
    /// Character encoding for CSV/TSV output (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub session: SessionArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_delimiter_accepts_names_and_single_chars() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("pipe"), Ok(b'|'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
    }

    #[test]
    fn combine_parses_key_candidates() {
        let cli = Cli::try_parse_from([
            "table-reconcile",
            "combine",
            "--key",
            "vendor_code",
            "--key",
            "customer, name",
        ])
        .unwrap();
        let Commands::Combine(args) = cli.command else {
            panic!("expected combine");
        };
        assert_eq!(
            args.keys,
            vec![
                vec!["vendor_code".to_string()],
                vec!["customer".to_string(), "name".to_string()],
            ]
        );
        assert_eq!(args.session.session.as_str(), "default");
    }
}
