//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Planwright - business-plan intake and versioned refinement
#[derive(Parser)]
#[command(
    name = "pw",
    about = "Turn a business idea into a structured, versioned business case",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Run the question flow and generate the first plan version
    Intake {
        /// Initial business idea; prompted for interactively when omitted
        idea: Option<String>,
    },

    /// Refine a document with a natural-language instruction
    Refine {
        /// Document id
        document: String,

        /// Section to focus the refinement on
        #[arg(short, long)]
        section: Option<String>,

        /// Refinement instruction; prompted for interactively when omitted
        #[arg(short, long)]
        instruction: Option<String>,
    },

    /// Show a document's version history
    Versions {
        /// Document id
        document: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Restore an earlier version as a new latest version
    Restore {
        /// Document id
        document: String,

        /// Version number to restore
        version: i64,
    },

    /// Render a document version as markdown
    Show {
        /// Document id
        document: String,

        /// Version number; latest when omitted
        #[arg(short = 'n', long)]
        version: Option<i64>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List all documents
    Documents,
}

/// Output format for versions/show commands
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_intake() {
        let cli = Cli::parse_from(["pw", "intake"]);
        assert!(matches!(cli.command, Command::Intake { idea: None }));
    }

    #[test]
    fn test_cli_parse_intake_with_idea() {
        let cli = Cli::parse_from(["pw", "intake", "a mobile bakery"]);
        if let Command::Intake { idea } = cli.command {
            assert_eq!(idea.as_deref(), Some("a mobile bakery"));
        } else {
            panic!("Expected Intake command");
        }
    }

    #[test]
    fn test_cli_parse_refine() {
        let cli = Cli::parse_from(["pw", "refine", "doc-1", "--section", "objectives", "-i", "add a cost goal"]);
        if let Command::Refine {
            document,
            section,
            instruction,
        } = cli.command
        {
            assert_eq!(document, "doc-1");
            assert_eq!(section.as_deref(), Some("objectives"));
            assert_eq!(instruction.as_deref(), Some("add a cost goal"));
        } else {
            panic!("Expected Refine command");
        }
    }

    #[test]
    fn test_cli_parse_versions() {
        let cli = Cli::parse_from(["pw", "versions", "doc-1"]);
        assert!(matches!(cli.command, Command::Versions { .. }));
    }

    #[test]
    fn test_cli_parse_restore() {
        let cli = Cli::parse_from(["pw", "restore", "doc-1", "3"]);
        if let Command::Restore { document, version } = cli.command {
            assert_eq!(document, "doc-1");
            assert_eq!(version, 3);
        } else {
            panic!("Expected Restore command");
        }
    }

    #[test]
    fn test_cli_parse_show_with_version() {
        let cli = Cli::parse_from(["pw", "show", "doc-1", "-n", "2"]);
        if let Command::Show { version, .. } = cli.command {
            assert_eq!(version, Some(2));
        } else {
            panic!("Expected Show command");
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!(matches!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("invalid".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["pw", "-c", "/path/to/planwright.yml", "documents"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/planwright.yml")));
    }
}
