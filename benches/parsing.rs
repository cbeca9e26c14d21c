use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;
use std::sync::Arc;

use ezgmail::api::{ListMessagesResponse, ListRequest, MessagePartBody, RawMessage};
use ezgmail::error::{GmailError, Result};
use ezgmail::model::attachment::AttachmentSource;
use ezgmail::search::query::SearchCriteria;
use ezgmail::transport::MailTransport;

struct Offline;

impl MailTransport for Offline {
    fn list_messages(&self, _: &str, _: &ListRequest) -> Result<ListMessagesResponse> {
        Err(GmailError::Config("offline".into()))
    }
    fn get_message(&self, _: &str, _: &str) -> Result<RawMessage> {
        Err(GmailError::Config("offline".into()))
    }
    fn get_attachment(&self, _: &str, _: &str, _: &str) -> Result<MessagePartBody> {
        Err(GmailError::Config("offline".into()))
    }
}

fn bench_parse_message(c: &mut Criterion) {
    let fixture_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("nested_alternative.json");
    let json = std::fs::read_to_string(fixture_path).unwrap();
    let raw: RawMessage = serde_json::from_str(&json).unwrap();
    let source = AttachmentSource::new(Arc::new(Offline), "me");

    c.bench_function("parse_nested_message", |b| {
        b.iter(|| ezgmail::parser::mime::parse_message(raw.clone(), &source))
    });
}

fn bench_render_query(c: &mut Criterion) {
    let mut criteria = SearchCriteria::new();
    criteria
        .from("alice@example.com")
        .newer_than("7d")
        .subject("quarterly report")
        .in_inbox()
        .has_attachment(true);

    c.bench_function("render_query", |b| b.iter(|| criteria.render()));
}

criterion_group!(benches, bench_parse_message, bench_render_query);
criterion_main!(benches);
