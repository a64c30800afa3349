//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use gallery_core::query::Era;

/// Browse a museum collection from the terminal.
///
/// Results are printed as JSON on stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "gallery")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/gallery/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Collection API root, overriding the config file
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Delay before each record fetch in milliseconds (0 to disable, max 60000)
    #[arg(long, value_name = "N", global = true, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub pacing_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search by free text and print one page of results
    Search {
        /// Search term
        term: String,

        /// Department identifier (0 for any)
        #[arg(short, long, default_value_t = 0)]
        department: u32,

        /// Era: before1500, 1500-1800, after1800 or all (alias unconstrained)
        #[arg(short, long, default_value_t = Era::Unconstrained)]
        era: Era,

        /// Page to print (1-based)
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        page: u64,
    },

    /// Print a random selection of records
    Random {
        /// Number of records to draw (1-200)
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..=200))]
        count: Option<u64>,

        /// Draw from a search listing instead of the full catalog
        #[arg(long, value_name = "TERM")]
        query: Option<String>,
    },

    /// Print a single record
    Object {
        /// Record identifier
        id: u64,
    },

    /// List departments
    Departments,

    /// Print the featured selection
    Featured,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_search_defaults() {
        let args = Args::try_parse_from(["gallery", "search", "sunflowers"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(
            args.command,
            Command::Search {
                term: "sunflowers".to_string(),
                department: 0,
                era: Era::Unconstrained,
                page: 1,
            }
        );
    }

    #[test]
    fn test_cli_search_all_options() {
        let args = Args::try_parse_from([
            "gallery", "search", "armor", "-d", "4", "--era", "1500-1800", "--page", "2",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Search {
                term: "armor".to_string(),
                department: 4,
                era: Era::From1500To1800,
                page: 2,
            }
        );
    }

    #[test]
    fn test_cli_unknown_era_rejected() {
        let err = Args::try_parse_from(["gallery", "search", "x", "--era", "renaissance"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_unconstrained_era_accepted() {
        let args = Args::try_parse_from(["gallery", "search", "x", "--era", "unconstrained"])
            .unwrap();
        assert!(matches!(
            args.command,
            Command::Search {
                era: Era::Unconstrained,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_page_zero_rejected() {
        let err = Args::try_parse_from(["gallery", "search", "x", "--page", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["gallery", "-v", "departments"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["gallery", "departments", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["gallery", "--quiet", "featured"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_global_overrides() {
        let args = Args::try_parse_from([
            "gallery",
            "--config",
            "/tmp/gallery.toml",
            "--base-url",
            "http://localhost:8080/v1",
            "--pacing-ms",
            "0",
            "object",
            "436535",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/gallery.toml")));
        assert_eq!(args.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(args.pacing_ms, Some(0));
        assert_eq!(args.command, Command::Object { id: 436_535 });
    }

    #[test]
    fn test_cli_pacing_over_max_rejected() {
        let err = Args::try_parse_from(["gallery", "--pacing-ms", "60001", "featured"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_random_options() {
        let args = Args::try_parse_from(["gallery", "random"]).unwrap();
        assert_eq!(
            args.command,
            Command::Random {
                count: None,
                query: None
            }
        );

        let args =
            Args::try_parse_from(["gallery", "random", "-n", "5", "--query", "cats"]).unwrap();
        assert_eq!(
            args.command,
            Command::Random {
                count: Some(5),
                query: Some("cats".to_string())
            }
        );

        let err = Args::try_parse_from(["gallery", "random", "-n", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_missing_subcommand_is_error() {
        let err = Args::try_parse_from(["gallery"]).unwrap_err();
        assert!(matches!(
            err.kind(),
            clap::error::ErrorKind::MissingSubcommand
                | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        ));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["gallery", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["gallery", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
