use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to config.yaml (defaults to $KB_BASE_PATH/config.yaml
    /// or ~/.local/share/kb/config.yaml)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Rank knowledge base documents against a query
    Search {
        query: String,

        /// Maximum number of results
        #[clap(short, long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[clap(long, default_value = "false")]
        json: bool,
    },
    /// Answer a question from the knowledge base
    Ask {
        query: String,

        /// Print concepts, results and answer as JSON
        #[clap(long, default_value = "false")]
        json: bool,
    },
    /// Print the key concepts of a query
    Concepts { query: String },
    /// Highlight the key concepts of a query within text
    Highlight {
        text: String,

        /// Query whose concepts are highlighted
        #[clap(short, long)]
        query: String,
    },
    /// Show one document
    Show {
        id: String,

        /// Highlight this query's concepts in the document
        #[clap(short, long)]
        query: Option<String>,
    },
    /// List every document
    List {},
    /// List suggested topics
    Topics {},
    /// Start the HTTP server
    Serve {
        /// Address to listen on (overrides server.bind)
        #[clap(short, long)]
        bind: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let args = Args::parse_from(["kb", "search", "time dilation", "--limit", "3"]);
        match args.command {
            Command::Search { query, limit, json } => {
                assert_eq!(query, "time dilation");
                assert_eq!(limit, Some(3));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(args.config.is_none());
    }

    #[test]
    fn test_parse_global_config() {
        let args = Args::parse_from(["kb", "topics", "--config", "/tmp/kb.yaml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/kb.yaml")));
        assert!(matches!(args.command, Command::Topics {}));
    }

    #[test]
    fn test_parse_highlight() {
        let args = Args::parse_from(["kb", "highlight", "-q", "light cones", "Light cones tilt"]);
        match args.command {
            Command::Highlight { text, query } => {
                assert_eq!(text, "Light cones tilt");
                assert_eq!(query, "light cones");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
