//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Decode StatFin / PxWeb tables into per-municipality values
#[derive(Parser, Debug)]
#[command(name = "pxcube")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog: a built-in name or a YAML file
    #[arg(short, long, global = true, default_value = crate::catalogs::DEFAULT_CATALOG)]
    pub catalog: PathBuf,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List catalog datasets
    Datasets,

    /// Validate the catalog
    Validate,

    /// Show the table metadata of a dataset
    Metadata {
        /// Dataset name
        dataset: String,

        /// Look up the value code for this text (e.g. a municipality name)
        #[arg(long, requires = "variable")]
        find: Option<String>,

        /// Variable to search with --find
        #[arg(long)]
        variable: Option<String>,
    },

    /// Fetch and decode datasets
    Fetch {
        /// Dataset names (empty = all)
        datasets: Vec<String>,

        /// Serve fallback data without contacting the API
        #[arg(long)]
        offline: bool,
    },

    /// Decode a saved response body
    Decode {
        /// Dataset name
        dataset: String,

        /// File containing the PxWeb or JSON-stat2 response
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from(["pxcube", "fetch", "unemployment", "elections", "--offline"])
            .unwrap();
        assert_eq!(cli.catalog, PathBuf::from("statfin"));
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Fetch { datasets, offline } => {
                assert_eq!(datasets, vec!["unemployment", "elections"]);
                assert!(offline);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pxcube",
            "decode",
            "births_deaths",
            "--input",
            "body.json",
            "--catalog",
            "./my.yaml",
            "--format",
            "pretty",
        ])
        .unwrap();
        assert_eq!(cli.catalog, PathBuf::from("./my.yaml"));
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert!(matches!(cli.command, Commands::Decode { .. }));
    }

    #[test]
    fn test_find_requires_variable() {
        assert!(Cli::try_parse_from(["pxcube", "metadata", "births", "--find", "Helsinki"]).is_err());
        assert!(Cli::try_parse_from([
            "pxcube", "metadata", "births", "--find", "Helsinki", "--variable", "Alue"
        ])
        .is_ok());
    }
}
