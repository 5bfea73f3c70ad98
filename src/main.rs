use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use confab::api::HttpBackend;
use confab::config::ClientConfig;
use confab::models::{CurrentUser, ThreadKey};
use confab::services::conversations::ConversationFetcher;
use confab::services::session::ChatSession;
use confab::services::thread::ThreadView;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env()?;
    let backend = Arc::new(HttpBackend::new(config.base_url.clone())?);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => list_conversations(backend).await,
        [project, counterpart] => {
            let project_id = project.parse().context("Invalid project id")?;
            let counterpart_id = counterpart.parse().context("Invalid counterpart id")?;
            chat(backend, config, ThreadKey::new(project_id, counterpart_id)).await
        }
        _ => bail!("Usage: confab [<project-id> <counterpart-id>]"),
    }
}

async fn list_conversations(backend: Arc<HttpBackend>) -> Result<()> {
    let fetcher = ConversationFetcher::new(backend);
    fetcher.fetch().await;

    let view = fetcher.snapshot();
    if let Some(error) = &view.error {
        bail!("Could not load conversations: {}", error);
    }

    if view.conversations.is_empty() {
        println!("No conversations yet.");
        return Ok(());
    }

    for summary in &view.conversations {
        println!(
            "project {:>6}  {:<20} [{:>2} unread]  {}",
            summary.project_id, summary.counterpart_name, summary.unread_count, summary.last_message
        );
    }
    Ok(())
}

async fn chat(backend: Arc<HttpBackend>, config: ClientConfig, key: ThreadKey) -> Result<()> {
    let user = current_user_from_env()?;
    let user_id = user.id;

    // The nominal counterpart doubles as the receiver here; a PM-initiated
    // thread would resolve the actual account id from its summary instead.
    let session = ChatSession::open(
        backend,
        user,
        key,
        key.counterpart_id,
        config.poll_interval,
    );

    let mut view = session.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            render(&view.borrow_and_update(), user_id);
            if view.changed().await.is_err() {
                break;
            }
        }
    });

    println!("Connected. Type a message and press enter; /quit to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line == "/quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }
        if let Err(e) = session.send(&line).await {
            println!("!! {}", e);
        }
    }

    session.shutdown().await;
    printer.abort();
    Ok(())
}

fn current_user_from_env() -> Result<CurrentUser> {
    let id = std::env::var("CONFAB_USER_ID")
        .context("CONFAB_USER_ID is not set")?
        .parse()
        .context("Invalid CONFAB_USER_ID")?;
    let display_name =
        std::env::var("CONFAB_USER_NAME").unwrap_or_else(|_| "me".to_string());
    Ok(CurrentUser { id, display_name })
}

fn render(view: &ThreadView, user_id: i64) {
    if view.messages.is_empty() && view.error.is_none() {
        return;
    }

    println!("----");
    for message in &view.messages {
        let tag = if message.sender_id == user_id {
            "you"
        } else {
            message.sender_name.as_str()
        };
        let pending = if message.is_placeholder() { " …" } else { "" };
        println!(
            "[{}] {}: {}{}",
            message.created_at.format("%H:%M"),
            tag,
            message.content,
            pending
        );
    }
    if let Some(error) = &view.error {
        println!("(refresh failed: {})", error);
    }
}
