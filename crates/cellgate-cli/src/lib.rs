//! Command-line interface for the cellgate engine.

use clap::{Parser, Subcommand};

pub mod demo;

/// cellgate: two-stage admission control for cellular baseband
#[derive(Parser)]
#[command(name = "cellgate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a scripted end-to-end demonstration of both gates
    Demo(demo::DemoArgs),

    /// Print version information
    Version,
}
