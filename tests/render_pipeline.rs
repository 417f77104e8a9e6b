use leilao_chat::config::ChatConfig;
use leilao_chat::markup::{classify, BlockRole, SegmentKind};
use leilao_chat::math::MathDelegate;
use leilao_chat::render::render_message;
use leilao_chat::service::ChatService;
use leilao_chat::store::InMemoryBackend;
use leilao_chat::transport::EchoTransport;
use pretty_assertions::assert_eq;

const AUCTION_REPLY: &str = "## Análise do lote【3:0†edital.pdf】\n\n\
**Resumo**: imóvel com lance inicial de R$ 250.000,00.\n\n\
1. Avaliação: R$ 400.000,00\n2. Desconto: 37,5%\n\n\
---\n\n\
- Ocupado\n- Nota 4/5\n\n\
Item | Valor\n---|---\nLance | R$ 250.000,00\n\n\
$\\frac{250}{400}$ do valor de avaliação.";

#[test]
fn auction_reply_is_classified_in_order() {
    let blocks = classify(AUCTION_REPLY);
    let roles: Vec<&str> = blocks
        .iter()
        .map(|block| match &block.role {
            BlockRole::Heading { .. } => "heading",
            BlockRole::LabeledSection { .. } => "labeledSection",
            BlockRole::OrderedList { .. } => "orderedList",
            BlockRole::BulletList { .. } => "bulletList",
            BlockRole::Table { .. } => "table",
            BlockRole::Paragraph { .. } => "paragraph",
            BlockRole::IndentedParagraph { .. } => "indentedParagraph",
            BlockRole::Math { .. } => "math",
        })
        .collect();
    assert_eq!(
        roles,
        vec!["heading", "labeledSection", "orderedList", "bulletList", "table", "paragraph"]
    );

    let BlockRole::Heading { level, content } = &blocks[0].role else {
        panic!("expected heading, got {:?}", blocks[0].role);
    };
    assert_eq!(*level, 2);
    assert_eq!(content.raw, "Análise do lote");

    let BlockRole::OrderedList { items, .. } = &blocks[2].role else {
        panic!("expected ordered list");
    };
    assert_eq!(items[1].segments[1].kind, SegmentKind::Percent);
    assert_eq!(items[1].segments[1].content, "37,5%");
}

#[test]
fn auction_reply_renders_to_html() {
    let html = render_message(AUCTION_REPLY, &MathDelegate::default());
    assert!(html.starts_with(r#"<div class="chat-message"><h2>Análise do lote</h2>"#), "{html}");
    assert!(html.contains(r#"<span class="money">R$ 400.000,00</span>"#));
    assert!(html.contains(r#"<span class="rating">4/5</span>"#));
    assert!(html.contains(r#"<table class="chat-table">"#));
    assert!(html.contains(r#"<span class="math math-inline">"#));
    assert!(!html.contains("edital.pdf"));
    assert!(!html.contains("<hr"));
}

#[test]
fn blocks_serialize_with_type_tags() {
    let blocks = classify("# Lote 7");
    let json = serde_json::to_value(&blocks).expect("serializable");
    assert_eq!(json[0]["role"]["type"], "heading");
    assert_eq!(json[0]["role"]["level"], 1);
    assert_eq!(json[0]["role"]["content"]["segments"][0]["kind"]["type"], "text");
}

#[tokio::test(start_paused = true)]
async fn echo_reply_renders_after_commit() {
    let mut chat =
        ChatService::new(EchoTransport::default(), InMemoryBackend::default(), ChatConfig::default());
    chat.submit("Quanto custa 50% de R$ 1.000,00?", &[]).await.expect("submit");
    let reply = chat.drive_reveal().await.expect("committed");

    let html = render_message(&reply.content, &MathDelegate::default());
    assert!(html.contains("<h2>Resposta</h2>"), "{html}");
    assert!(html.contains(r#"<span class="money">R$ 1.500,00</span>"#));
    assert!(html.contains(r#"<span class="percent">10%</span>"#));
    assert!(html.contains(r#"<span class="math math-display">"#));
    assert!(!html.contains("math-error"), "{html}");
}
