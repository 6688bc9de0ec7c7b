//! Minimal terminal chat against a running PulseSG backend.
//!
//! ```sh
//! PULSE_API_URL=http://localhost:8000 PULSE_TOKEN=... cargo run --example chat
//! ```

use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use pulse_client::credentials::CredentialsProvider;
use pulse_client::{
    Anonymous, ClientConfig, ConversationStore, PulseClient, SessionCallbacks, StaticToken,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let base_url =
        std::env::var("PULSE_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let credentials: Arc<dyn CredentialsProvider> = match std::env::var("PULSE_TOKEN") {
        Ok(token) => Arc::new(StaticToken::new(token)),
        Err(_) => Arc::new(Anonymous),
    };

    let client = PulseClient::new(ClientConfig::with_base_url(base_url), credentials)?;
    let store = ConversationStore::new();

    print!("> ");
    io::stdout().flush()?;
    for line in io::stdin().lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            let callbacks = SessionCallbacks {
                on_content: Some(Box::new(|delta, _full| {
                    print!("{delta}");
                    let _ = io::stdout().flush();
                })),
                ..SessionCallbacks::default()
            };

            match client.send_message(&store, &line, None, callbacks).await {
                Ok(result) => {
                    println!();
                    if result.completed_without_done {
                        eprintln!("(stream ended without an explicit completion record)");
                    }
                }
                Err(err) => eprintln!("error: {err}"),
            }
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}
