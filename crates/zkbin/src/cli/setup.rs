use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zkbin", bin_name = "zkbin", version, disable_help_subcommand = true)]
#[command(about = "Inspect and maintain a zkbin data directory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to zkbin.toml in the OS config directory)
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Data directory, overriding the configuration
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Delete expired pastes, converting legacy records on the way
    Purge {
        /// Maximum number of expired pastes to delete
        #[arg(long, value_name = "N")]
        batch: Option<usize>,
    },

    /// List all paste ids
    #[command(alias = "ls")]
    List,

    /// Print a paste and its comments as JSON
    Show {
        /// Paste id (16 hex characters)
        id: String,
    },

    /// Delete a paste and its comments
    #[command(alias = "rm")]
    Delete {
        /// Paste id (16 hex characters)
        id: String,
    },

    /// Read or write a namespace value
    Value {
        #[command(subcommand)]
        action: ValueCommands,
    },

    /// Print the server salt, generating it if needed
    Salt,

    /// Classify a synthetic request and print the result
    Classify {
        /// HTTP method
        #[arg(long, short = 'X', default_value = "GET")]
        method: String,

        /// Accept header
        #[arg(long)]
        accept: Option<String>,

        /// Request body
        #[arg(long)]
        body: Option<String>,

        /// Request target, query string included (e.g. "/?5b65a01b43987bc2")
        uri: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ValueCommands {
    /// Print the value stored in a namespace
    Get {
        /// salt, purge_limiter or traffic_limiter
        namespace: String,
    },

    /// Overwrite the value stored in a namespace
    Set {
        /// salt, purge_limiter or traffic_limiter
        namespace: String,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_purge_with_batch() {
        let cli = Cli::try_parse_from(["zkbin", "purge", "--batch", "5"]).unwrap();
        assert!(matches!(cli.command, Commands::Purge { batch: Some(5) }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["zkbin", "list", "--data-dir", "/tmp/x", "-v"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_value_set() {
        let cli = Cli::try_parse_from(["zkbin", "value", "set", "salt", "abc"]).unwrap();
        match cli.command {
            Commands::Value {
                action: ValueCommands::Set { namespace, value },
            } => {
                assert_eq!(namespace, "salt");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_classify_defaults_to_get() {
        let cli = Cli::try_parse_from(["zkbin", "classify", "/?5b65a01b43987bc2"]).unwrap();
        match cli.command {
            Commands::Classify { method, uri, .. } => {
                assert_eq!(method, "GET");
                assert_eq!(uri, "/?5b65a01b43987bc2");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["zkbin"]).is_err());
    }
}
