use chat_stream::streaming_sse::EventDecoder;
use chat_stream::transcript::{normalize_payload, reduce, Payload};
use chat_stream::types::DisplayMessage;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

fn reply_body(deltas: usize) -> Vec<u8> {
    let mut out = String::new();
    out.push_str("event: sid\ndata: bench-session\n\n");
    for i in 0..deltas {
        out.push_str(&format!(
            "data: {{\"type\":\"text\",\"content\":\"token {i} \"}}\n\n"
        ));
        if i % 64 == 63 {
            out.push_str(
                "data: [{\"type\":\"button\",\"label\":\"Vedi\",\"action\":\"/p\"},\n\
                 data: {\"type\":\"product_card\",\"data\":{\"title\":\"X\",\"price\":\"10\"}}]\n\n",
            );
        }
    }
    out.push_str("data: [END]\n\n");
    out.into_bytes()
}

fn bench_decode(c: &mut Criterion) {
    let body = reply_body(1024);
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(body.len() as u64));

    for chunk_size in [16usize, 512, 8192] {
        group.bench_function(format!("chunks_{chunk_size}"), |b| {
            b.iter(|| {
                let mut decoder = EventDecoder::new();
                let mut blocks = 0usize;
                for chunk in body.chunks(chunk_size) {
                    blocks += decoder.push(black_box(chunk)).len();
                }
                decoder.finish();
                blocks
            })
        });
    }
    group.finish();
}

fn bench_reduce(c: &mut Criterion) {
    let body = reply_body(1024);
    let mut decoder = EventDecoder::new();
    let payloads: Vec<String> = decoder.push(&body).into_iter().map(|b| b.data).collect();

    c.bench_function("normalize_and_reduce", |b| {
        b.iter_batched(
            || payloads.clone(),
            |payloads| {
                let mut transcript: Vec<DisplayMessage> = Vec::new();
                for payload in payloads {
                    if let Payload::Items(items) = normalize_payload(&payload) {
                        transcript = reduce(&transcript, items);
                    }
                }
                transcript
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_decode, bench_reduce);
criterion_main!(benches);
