use std::io::Write;

use leilao_chat::config::{ChatConfig, OutputFormat};
use leilao_chat::delivery::DeliveryEvent;
use leilao_chat::markup::classify;
use leilao_chat::math::MathDelegate;
use leilao_chat::render::render_message;
use leilao_chat::service::ChatService;
use leilao_chat::store::{ConversationBackend, InMemoryBackend};
use leilao_chat::transport::{ChatTransport, EchoTransport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};

const PREVIEW_CHARS: usize = 40;
const HELP: &str = "comandos: /nova, /lista, /abrir <id>, /renomear <título>, /apagar, /limpar";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leilao_chat=debug".into()),
        )
        .init();

    let config = ChatConfig::from_env();
    info!(?config, "Configuration loaded");
    let output = config.output;
    let transport = EchoTransport::new(config.echo_latency);

    let mut service = ChatService::new(transport, InMemoryBackend::default(), config);
    service.bootstrap().await?;
    let mut events = service.events();
    let math = MathDelegate::default();

    eprintln!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = 0usize;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    service.cancel_reveal();
                    break;
                };
                if !service.is_revealing() {
                    shown = 0;
                }
                handle_line(&mut service, line.trim()).await;
            }
            Some(signal) = service.next_signal(), if service.is_revealing() => {
                service.apply_signal(signal).await;
                let view = service.view();
                if view.revealed.len() > shown {
                    eprint!("{}", &view.revealed[shown..]);
                    std::io::stderr().flush()?;
                    shown = view.revealed.len();
                }
            }
        }
        print_committed(&mut events, output, &math)?;
    }

    info!("Session ended");
    Ok(())
}

async fn handle_line<T: ChatTransport, B: ConversationBackend>(
    service: &mut ChatService<T, B>,
    line: &str,
) {
    let (command, argument) = match line.split_once(' ') {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };
    let active = service.store().active_id().map(str::to_string);

    let result = match (command, active) {
        ("", _) => Ok(()),
        ("/nova", _) => {
            service.create_conversation();
            Ok(())
        }
        ("/lista", _) => {
            for conversation in service.store().conversations() {
                let last =
                    conversation.last_message().map(|m| preview(&m.content)).unwrap_or_default();
                eprintln!(
                    "{}  {} ({} mensagens) {last}",
                    conversation.id,
                    conversation.title,
                    conversation.messages.len()
                );
            }
            Ok(())
        }
        ("/abrir", _) => service.select_conversation(argument).await,
        ("/renomear", Some(id)) => service.rename_conversation(&id, argument).await,
        ("/apagar", Some(id)) => service.delete_conversation(&id).await,
        ("/limpar", _) => service.clear_conversations().await,
        ("/renomear" | "/apagar", None) => {
            eprintln!("nenhuma conversa ativa");
            Ok(())
        }
        (other, _) if other.starts_with('/') => {
            eprintln!("{HELP}");
            Ok(())
        }
        _ => service.submit(line, &[]).await.map(|_| ()),
    };

    if let Err(e) = result {
        warn!("Command failed: {e}");
        eprintln!("erro: {e}");
    }
}

/// First line of a message, cut to a short preview.
fn preview(content: &str) -> String {
    let line = content.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        format!("{}…", line.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        line.to_string()
    }
}

fn print_committed(
    events: &mut broadcast::Receiver<DeliveryEvent>,
    output: OutputFormat,
    math: &MathDelegate,
) -> anyhow::Result<()> {
    while let Ok(event) = events.try_recv() {
        let DeliveryEvent::Committed(message) = event else {
            continue;
        };
        eprintln!();
        match output {
            OutputFormat::Html => println!("{}", render_message(&message.content, math)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&classify(&message.content))?),
        }
    }
    Ok(())
}
