mod common;

use std::time::Duration;

use common::{committed, drain, seeded_service, ScriptedTransport};
use leilao_chat::delivery::Phase;
use leilao_chat::models::{Conversation, Message, MessageRole};
use leilao_chat::store::ConversationBackend;
use pretty_assertions::assert_eq;

fn stored(id: &str, title: &str, question: &str) -> Conversation {
    Conversation::new(id.to_string(), title.to_string())
        .with_message(Message::new(MessageRole::User, question.to_string()))
}

fn seed() -> Vec<Conversation> {
    vec![
        stored("c-edital", "Edital do lote 7", "Qual o prazo?"),
        stored("c-matricula", "Matrícula", "Tem penhora?"),
    ]
}

#[tokio::test(start_paused = true)]
async fn bootstrap_loads_the_list_without_an_active_conversation() {
    let mut chat = seeded_service(ScriptedTransport::default(), seed());
    chat.bootstrap().await.expect("bootstrap");

    let ids: Vec<&str> = chat.store().conversations().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c-edital", "c-matricula"]);
    assert_eq!(chat.store().active_id(), None);
    assert_eq!(chat.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn bootstrap_cancels_a_running_reveal() {
    let mut chat = seeded_service(ScriptedTransport::replying(&["resposta longa"]), seed());
    let mut events = chat.events();
    chat.submit("Pergunta nova", &[]).await.expect("submit");
    let signal = chat.next_signal().await.expect("tick");
    chat.apply_signal(signal).await;

    chat.bootstrap().await.expect("bootstrap");
    assert_eq!(chat.phase(), Phase::Idle);
    assert!(!chat.is_revealing());
    assert_eq!(chat.next_signal().await, None);
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(committed(&drain(&mut events)).is_empty());
    assert_eq!(chat.store().active_id(), None);
    // Created conversation plus the two seeded ones; nothing was persisted
    // for the cancelled reply.
    assert_eq!(chat.store().conversations().len(), 3);
    assert!(chat.store().conversations()[0].messages.is_empty());
}

#[tokio::test(start_paused = true)]
async fn selecting_the_active_conversation_is_a_no_op() {
    let mut chat = seeded_service(ScriptedTransport::default(), seed());
    chat.bootstrap().await.expect("bootstrap");
    chat.select_conversation("c-edital").await.expect("select");

    // The backend changes behind the store's back; reselecting must not fetch.
    chat.backend().rename_conversation("c-edital", "Renomeado fora").await.expect("rename");
    chat.select_conversation("c-edital").await.expect("reselect");
    assert_eq!(chat.store().active().expect("active").title, "Edital do lote 7");

    // Switching away and back fetches and replaces the local copy.
    chat.select_conversation("c-matricula").await.expect("select other");
    chat.select_conversation("c-edital").await.expect("select back");
    let active = chat.store().active().expect("active");
    assert_eq!(active.title, "Renomeado fora");
    assert_eq!(active.messages.len(), 1);
    assert_eq!(chat.store().conversations().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn selecting_an_unknown_conversation_keeps_the_current_one() {
    let mut chat = seeded_service(ScriptedTransport::default(), seed());
    chat.bootstrap().await.expect("bootstrap");
    chat.select_conversation("c-edital").await.expect("select");

    let err = chat.select_conversation("c-sumiu").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(chat.store().active_id(), Some("c-edital"));
}

#[tokio::test(start_paused = true)]
async fn switching_conversation_mid_reveal_cancels_it() {
    let mut chat = seeded_service(ScriptedTransport::replying(&["uma resposta comprida"]), seed());
    let mut events = chat.events();
    chat.bootstrap().await.expect("bootstrap");
    chat.submit("Vale a pena?", &[]).await.expect("submit");
    let owner = chat.store().active_id().expect("owner").to_string();
    for _ in 0..4 {
        let signal = chat.next_signal().await.expect("tick");
        chat.apply_signal(signal).await;
    }

    chat.select_conversation("c-matricula").await.expect("select");
    assert_eq!(chat.phase(), Phase::Idle);
    assert_eq!(chat.next_signal().await, None);
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(committed(&drain(&mut events)).is_empty());
    assert_eq!(chat.store().active_id(), Some("c-matricula"));
    let owner = chat.store().get(&owner).expect("owner kept");
    assert_eq!(owner.messages.len(), 1);
    assert_eq!(owner.messages[0].content, "Vale a pena?");
    assert_eq!(chat.view().revealed, "");
}

#[tokio::test(start_paused = true)]
async fn rename_rejects_blank_titles_and_updates_both_sides() {
    let mut chat = seeded_service(ScriptedTransport::default(), seed());
    chat.bootstrap().await.expect("bootstrap");

    let err = chat.rename_conversation("c-edital", "   ").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(chat.store().get("c-edital").expect("kept").title, "Edital do lote 7");

    chat.rename_conversation("c-edital", "  Lote 7 (revisado)  ").await.expect("rename");
    assert_eq!(chat.store().get("c-edital").expect("kept").title, "Lote 7 (revisado)");
    let remote = chat.backend().fetch_conversation("c-edital").await.expect("fetch");
    assert_eq!(remote.title, "Lote 7 (revisado)");

    assert!(chat.rename_conversation("c-sumiu", "x").await.unwrap_err().is_not_found());
}

#[tokio::test(start_paused = true)]
async fn clear_empties_store_and_backend() {
    let mut chat = seeded_service(ScriptedTransport::replying(&["resposta"]), seed());
    let mut events = chat.events();
    chat.bootstrap().await.expect("bootstrap");
    chat.submit("Mais um lote", &[]).await.expect("submit");
    assert!(chat.is_revealing());

    chat.clear_conversations().await.expect("clear");
    assert_eq!(chat.phase(), Phase::Idle);
    assert!(chat.store().conversations().is_empty());
    assert_eq!(chat.store().active_id(), None);
    assert!(chat.backend().stored().is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(committed(&drain(&mut events)).is_empty());
}
