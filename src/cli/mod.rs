//! CLI module for arbre.
//!
//! Subcommands:
//! - `layout`: Render a family payload to a positioned layout (JSON)
//! - `expand`: Fetch ancestors from the expand API

mod expand;
mod layout;

use clap::{Parser, Subcommand};

pub use expand::ExpandCommand;
pub use layout::LayoutCommand;

/// arbre - family tree layout engine
#[derive(Parser)]
#[command(name = "arbre")]
#[command(about = "Family tree layout engine with lazy ancestor expansion")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render a tree from a JSON payload
    Layout(LayoutCommand),

    /// Fetch ancestors of one or more persons
    Expand(ExpandCommand),
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        let config = crate::config::Config::load()?;
        match self.command {
            Command::Layout(cmd) => cmd.run(config).await,
            Command::Expand(cmd) => cmd.run(config).await,
        }
    }
}

/// Writes `value` as pretty JSON to `output`, or stdout when absent.
fn write_json<T: serde::Serialize>(
    value: &T,
    output: Option<&std::path::Path>,
) -> color_eyre::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
