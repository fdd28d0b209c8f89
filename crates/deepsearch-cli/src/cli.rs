use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "deepsearch")]
#[command(about = "deepsearch - chat assistant with live web search")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the chat server
    Serve {
        /// Config file path (else DEEPSEARCH_CONFIG, else ~/.config/deepsearch/config.toml)
        #[arg(short = 'C', long)]
        config: Option<PathBuf>,
    },

    /// Chat with a running server from the terminal
    Chat {
        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        url: String,

        /// Bearer token for the server
        #[arg(long, env = "DEEPSEARCH_TOKEN")]
        token: Option<String>,

        /// Print tool arguments and results instead of one-line panels
        #[arg(long)]
        expand_tools: bool,
    },
}
