//! Command-line argument parsing for toolrunner
//!
//! Each tool is a subcommand; one process handles one invocation.

use crate::config::Config;
use crate::tools::ToolKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default caller-side timeout for `invoke`
pub const DEFAULT_INVOKE_TIMEOUT_SECS: u64 = 60;

/// toolrunner - process-per-call JSON tools for agent orchestration
#[derive(Parser, Debug)]
#[command(name = "toolrunner")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Run one tool per process: JSON request on stdin, one JSON envelope on stdout", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (warnings), -v (info), -vv (debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only on stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Stdin read deadline in milliseconds
    #[arg(long, global = true)]
    pub read_timeout_ms: Option<u64>,

    /// Execution deadline in milliseconds
    #[arg(long, global = true)]
    pub exec_timeout_ms: Option<u64>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Extract title, text and images from a Wikipedia article
    Scrape,

    /// Summarize text within a word budget
    Summarize,

    /// Translate text into a target language
    Translate,

    /// Score sentiment offline
    Sentiment,

    /// Fetch an image and resize it to a JPEG
    Resize,

    /// Print tool schemas as JSON
    Schema {
        /// Only this tool
        tool: Option<String>,
    },

    /// Invoke a tool as a child process and print its envelope
    Invoke {
        /// Tool to run
        tool: String,

        /// Request JSON object
        #[arg(long, default_value = "{}")]
        request: String,

        /// Caller-side timeout in seconds
        #[arg(long, default_value_t = DEFAULT_INVOKE_TIMEOUT_SECS)]
        timeout_secs: u64,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Apply deadline flags on top of file and environment settings
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ms) = self.read_timeout_ms {
            config.runner.read_timeout_ms = ms;
        }
        if let Some(ms) = self.exec_timeout_ms {
            config.runner.exec_timeout_ms = ms;
        }
    }
}

impl Commands {
    /// The tool this subcommand runs in-process, if any
    pub fn tool_kind(&self) -> Option<ToolKind> {
        match self {
            Commands::Scrape => Some(ToolKind::Scrape),
            Commands::Summarize => Some(ToolKind::Summarize),
            Commands::Translate => Some(ToolKind::Translate),
            Commands::Sentiment => Some(ToolKind::Sentiment),
            Commands::Resize => Some(ToolKind::Resize),
            Commands::Schema { .. } | Commands::Invoke { .. } => None,
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }
}
