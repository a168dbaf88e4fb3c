use anyhow::Result;
use chat_stream::transports::reqwest::ReqwestTransport;
use chat_stream::types::ProductCard;
use chat_stream::{
    ChatClientConfig, ChatError, Conversation, DisplayMessage, NormalizedItem, Role,
    SessionObserver, SessionState,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

// Run with:
//   CHAT_API_BASE=https://chat.example.com CHAT_CLIENT_SLUG=acme cargo run -p stream-chat
// Optional:
//   CHAT_SESSION_ID=...   resume an existing session and print its history
//   RUST_LOG=chat_stream=debug

/// Prints the reply as it grows. Text deltas are written in place, other
/// items get one line each.
struct Printer {
    shown: usize,
    partial: usize,
}

impl Printer {
    fn starting_at(shown: usize) -> Self {
        Self { shown, partial: 0 }
    }
}

impl SessionObserver for Printer {
    fn on_data(&mut self, transcript: &[DisplayMessage]) {
        while self.shown < transcript.len() {
            let msg = &transcript[self.shown];
            let last = self.shown + 1 == transcript.len();
            match &msg.kind {
                _ if msg.role == Role::User => {}
                NormalizedItem::Text { content } => {
                    print!("{}", &content[self.partial..]);
                    self.partial = content.len();
                    if last {
                        let _ = std::io::stdout().flush();
                        return;
                    }
                    println!();
                }
                other => println!("{}", describe(other)),
            }
            self.shown += 1;
            self.partial = 0;
        }
    }

    fn on_session_id(&mut self, session_id: &str) {
        eprintln!("\n[session] {session_id}");
    }

    fn on_complete(&mut self) {
        println!();
    }

    fn on_error(&mut self, error: &ChatError) {
        eprintln!("\n[error] {}", error.format_details());
    }
}

fn describe(item: &NormalizedItem) -> String {
    match item {
        NormalizedItem::Text { content } => content.clone(),
        NormalizedItem::Button { label, action, .. } => format!("[{label}] -> {action}"),
        NormalizedItem::ProductCard {
            data: ProductCard {
                title,
                price,
                link_url,
                ..
            },
        } => format!("[product] {title} {price} {link_url}"),
        NormalizedItem::MapCard { data } => format!("[map] {} {}", data.title, data.link_url),
    }
}

fn print_transcript(transcript: &[DisplayMessage]) {
    for msg in transcript {
        let who = match msg.role {
            Role::User => "you",
            Role::Assistant => "bot",
        };
        println!("{who}> {}", describe(&msg.kind));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = ChatClientConfig::from_env()?;
    let mut chat = match std::env::var("CHAT_SESSION_ID") {
        Ok(sid) if !sid.trim().is_empty() => Conversation::with_reqwest(config, sid.trim()),
        _ => {
            let http = ReqwestTransport::new(&config.transport);
            Conversation::with_new_session(config, http)
        }
    };
    eprintln!("[session] {}", chat.session_id());

    let history = chat.load_history().await?;
    print_transcript(history);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let cancel = chat.cancel_handle();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.close();
            }
        });

        print!("bot> ");
        let printer = Printer::starting_at(chat.transcript().len());
        let state = chat.send(&line, printer).await?;
        ctrl_c.abort();
        match state {
            SessionState::Completed => {}
            // the notice was already printed through on_data
            SessionState::Errored => println!(),
            other => eprintln!("\n[{other:?}]"),
        }
    }
    Ok(())
}
