use std::io::{self, Read, Write};

use claude_web_api::{ClaudeWebClient, PartialResponse};
use tracing::{debug, error};

mod config;
mod logging;

use config::EnvConfig;

#[tokio::main]
async fn main() -> io::Result<()> {
    logging::init_tracing();

    let env_config = EnvConfig::from_env().map_err(io::Error::other)?;
    let prompt = prompt_from_input()?;
    if prompt.trim().is_empty() {
        return Err(io::Error::other("prompt is empty"));
    }

    let client = ClaudeWebClient::new(env_config.client_config()).map_err(io::Error::other)?;
    let outcome = stream_reply(&client, &prompt).await;

    if env_config.keep_conversation {
        let session = client.session().await;
        if let Some(conversation_id) = session.conversation_id() {
            eprintln!("conversation: {conversation_id}");
        }
    } else {
        client.teardown().await;
    }

    outcome
}

async fn stream_reply(client: &ClaudeWebClient, prompt: &str) -> io::Result<()> {
    let mut receiver = client
        .reply(prompt, &[], None)
        .await
        .map_err(io::Error::other)?;

    let mut stdout = io::stdout();
    while let Some(response) = receiver.recv().await {
        match response {
            PartialResponse::Text { text, .. } => {
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            PartialResponse::Error(err) => {
                error!(error = %err, "reply stream failed");
                writeln!(stdout)?;
                return Err(io::Error::other(err));
            }
        }
    }
    writeln!(stdout)?;
    debug!("reply complete");
    Ok(())
}

/// Prompt from the arguments, or all of stdin when there are none.
fn prompt_from_input() -> io::Result<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args.join(" "));
    }

    let mut prompt = String::new();
    io::stdin().read_to_string(&mut prompt)?;
    Ok(prompt)
}
