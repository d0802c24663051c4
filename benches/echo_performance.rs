use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use framecho::common::spawn_test_server;
use framecho::stream::StreamConfig;
use framecho::{EchoClient, FrameCodec, TcpEchoClient};
use tokio::runtime::Runtime;
use tokio_util::codec::{Decoder, Encoder};

fn bench_echo_throughput(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let server = rt
        .block_on(spawn_test_server(StreamConfig::default()))
        .unwrap();
    let addr = server.addr;

    let mut group = c.benchmark_group("echo_throughput");

    for size in [64, 256, 1024, 4096, 16384] {
        let message = "X".repeat(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("persistent_connection", size), &message, |b, message| {
            let mut client = rt.block_on(TcpEchoClient::connect(addr)).unwrap();
            b.iter(|| {
                let response = rt.block_on(client.echo_string(black_box(message))).unwrap();
                assert_eq!(response.len(), message.len() + framecho::SUFFIX.len());
            });
        });
    }

    group.finish();
    rt.block_on(server.shutdown()).unwrap();
}

fn bench_connection_churn(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let server = rt
        .block_on(spawn_test_server(StreamConfig::default()))
        .unwrap();
    let addr = server.addr;
    let message = "A".repeat(128);

    c.bench_function("connect_echo_disconnect", |b| {
        b.to_async(&rt).iter(|| async {
            let mut client = TcpEchoClient::connect(addr).await.unwrap();
            black_box(client.echo_string(&message).await.unwrap())
        });
    });

    rt.block_on(server.shutdown()).unwrap();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_codec");

    for size in [128, 4096, 65536] {
        let payload = vec![b'Z'; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encode_decode", size), &payload, |b, payload| {
            let mut codec = FrameCodec::default();
            let mut buf = BytesMut::with_capacity(size + 4);
            b.iter(|| {
                codec.encode(black_box(&payload[..]), &mut buf).unwrap();
                black_box(codec.decode(&mut buf).unwrap().unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_echo_throughput, bench_connection_churn, bench_codec);
criterion_main!(benches);
