//! Interactive terminal chat against a running server

use std::io::Write;

use anyhow::{Context, Result};
use colored::Colorize;
use deepsearch_client::{sign_in_prompt, ChatClient, ClientError, Renderer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const QUIT_COMMANDS: &[&str] = &["/quit", "/exit"];

pub async fn execute(url: String, token: Option<String>, expand_tools: bool) -> Result<()> {
    let mut client = ChatClient::new(url.clone(), token);
    let user = client
        .check_session()
        .await
        .with_context(|| format!("Could not reach {url}"))?;

    match &user {
        Some(user) => println!(
            "{} {} {}",
            "deepsearch".bright_blue().bold(),
            "signed in as".dimmed(),
            user.name.as_deref().unwrap_or(&user.id)
        ),
        None => println!("{}", sign_in_prompt()),
    }
    println!("{}", "Type a question, /quit to exit.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".bright_cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if QUIT_COMMANDS.contains(&input) {
            break;
        }

        let mut renderer = Renderer::new(expand_tools);
        let result = client
            .submit(input, |_, event| {
                let out = renderer.render(event);
                if !out.is_empty() {
                    print!("{out}");
                    let _ = std::io::stdout().flush();
                }
            })
            .await;

        match result {
            Ok(()) => debug!(status = client.status().as_str(), "Turn finished"),
            Err(ClientError::SignInRequired) => println!("{}", sign_in_prompt()),
            Err(e) => println!("{} {}", "✗".red(), e),
        }
    }

    Ok(())
}
