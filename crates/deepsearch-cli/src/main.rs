use anyhow::Result;
use clap::Parser;

use deepsearch_cli::{
    cli::{Cli, Commands},
    commands, logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Serve { config } => commands::serve::execute(config).await,
        Commands::Chat {
            url,
            token,
            expand_tools,
        } => commands::chat::execute(url, token, expand_tools).await,
    }
}
