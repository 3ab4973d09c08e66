//! CLI - Command-line argument parsing

use clap::{Parser, Subcommand};

/// Compass CLI
#[derive(Parser)]
#[command(name = "compassctl")]
#[command(about = "Compass - ask a question, get a plan with sources", long_about = None)]
#[command(version = compass_common::VERSION)]
pub struct Cli {
    /// Daemon URL
    #[arg(long, global = true, env = "COMPASS_URL")]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a question
    Ask {
        /// The question, as free text
        #[arg(required = true)]
        query: Vec<String>,

        /// Vision for this request (overrides the remembered one)
        #[arg(long)]
        vision: Option<String>,

        /// Ignore the remembered vision
        #[arg(long, conflicts_with = "vision")]
        no_vision: bool,

        /// Tools for this request, e.g. "search,system", "all" or "none"
        #[arg(long)]
        tools: Option<String>,

        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change remembered preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsCommands,
    },

    /// Check that the daemon is up
    Health,

    /// List tools known to the daemon
    Tools,
}

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// Print the current preferences
    Show,

    /// Remember a vision
    SetVision {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Forget the remembered vision
    ClearVision,

    /// Remember the default tools, e.g. "search,knowledge"
    SetTools { list: String },
}
