use crate::streaming_sse::{decode_block, EventDecoder, EventKind, RawEventBlock};

#[test]
fn data_only_block_defaults_to_message() {
    let ev = decode_block("data: hello world").expect("event");
    assert_eq!(ev.event_name, "message");
    assert_eq!(ev.data, "hello world");
    assert_eq!(ev.kind(), EventKind::Message);
}

#[test]
fn named_event_is_trimmed() {
    let ev = decode_block("event:   sid  \ndata: abc-123").expect("event");
    assert_eq!(ev.event_name, "sid");
    assert_eq!(ev.kind(), EventKind::SessionId);
    assert_eq!(ev.data, "abc-123");
}

#[test]
fn unknown_event_names_use_the_message_path() {
    let ev = decode_block("event: progress\ndata: 50").expect("event");
    assert_eq!(ev.event_name, "progress");
    assert_eq!(ev.kind(), EventKind::Message);
}

#[test]
fn empty_event_name_falls_back_to_default() {
    let ev = decode_block("event:\ndata: x").expect("event");
    assert_eq!(ev.event_name, "message");
}

#[test]
fn split_payload_reassembles_without_separator() {
    let whole = r#"{"type":"text","content":"Hello there"}"#;
    let split = "data: {\"type\":\"text\",\ndata: \"content\":\"Hello there\"}";
    let a = decode_block(&format!("data: {whole}")).expect("whole");
    let b = decode_block(split).expect("split");
    assert_eq!(a.data, b.data);
    let parsed: serde_json::Value = serde_json::from_str(&b.data).expect("json");
    assert_eq!(parsed["content"], "Hello there");
}

#[test]
fn block_without_data_yields_nothing() {
    assert_eq!(decode_block(""), None);
    assert_eq!(decode_block("event: sid"), None);
    assert_eq!(decode_block(": keep-alive"), None);
}

#[test]
fn unknown_fields_are_ignored() {
    let ev = decode_block("id: 7\nretry: 100\ndata: x\nfoo: bar").expect("event");
    assert_eq!(ev, RawEventBlock::message("x"));
}

#[test]
fn decoder_combines_framing_and_decoding() {
    let mut decoder = EventDecoder::new();
    let first = decoder.push(b"data: one\n\n\n\nevent: sid\nda");
    assert_eq!(first, vec![RawEventBlock::message("one")]);
    let rest = decoder.push(b"ta: s-1\n\n");
    assert_eq!(
        rest,
        vec![RawEventBlock {
            event_name: "sid".into(),
            data: "s-1".into(),
        }]
    );
}

#[test]
fn decoder_skips_empty_blocks() {
    let mut decoder = EventDecoder::new();
    let events = decoder.push(b"\n\n\n\ndata: a\n\n");
    assert_eq!(events, vec![RawEventBlock::message("a")]);
}
