use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "roundtable",
    about = "Three LLM personas discussing a topic in turn"
)]
pub struct CliArgs {
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the conversation API (default).
    Serve {
        /// Address to bind, overrides `[server] addr`.
        #[arg(long, short = 'a')]
        addr: Option<String>,
    },
    /// Hold a conversation in the terminal.
    Play {
        /// Talk to a running server instead of calling the model directly.
        #[arg(long, short = 'r')]
        remote: Option<String>,
        /// Start with this topic instead of asking.
        #[arg(long, short = 't')]
        topic: Option<String>,
    },
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Serve { addr: None })
    }
}
