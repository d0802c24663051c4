use color_eyre::eyre::Result;
use framecho::common::{spawn_test_server, TestServer};
use framecho::stream::{ClientConfigBuilder, StreamConfig};
use framecho::{EchoClient, TcpEchoClient, SUFFIX};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn start(config: StreamConfig) -> Result<TestServer> {
    Ok(spawn_test_server(config).await?)
}

/// Writes a raw request frame without going through the client
async fn send_frame(stream: &mut TcpStream, payload: &[u8]) -> Result<()> {
    stream.write_all(&(payload.len() as u32).to_le_bytes()).await?;
    stream.write_all(payload).await?;
    Ok(())
}

async fn read_frame(stream: &mut TcpStream) -> Result<Vec<u8>> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    let mut payload = vec![0u8; u32::from_le_bytes(header) as usize];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Reads until the server closes the stream, returning everything it sent
async fn read_until_closed(stream: &mut TcpStream) -> Result<Vec<u8>> {
    let mut received = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut received))
        .await??;
    Ok(received)
}

async fn connect(addr: SocketAddr) -> Result<TcpStream> {
    Ok(TcpStream::connect(addr).await?)
}

#[tokio::test]
async fn test_echo_appends_suffix() -> Result<()> {
    let server = start(StreamConfig::default()).await?;

    let mut client = TcpEchoClient::connect(server.addr).await?;
    let response = client.echo_string("HELLO123").await?;
    assert_eq!(response, "HELLO123 from echo server");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_raw_wire_format() -> Result<()> {
    let server = start(StreamConfig::default()).await?;
    let mut stream = connect(server.addr).await?;

    send_frame(&mut stream, b"ABC").await?;

    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    assert_eq!(u32::from_le_bytes(header) as usize, 3 + SUFFIX.len());

    let mut payload = vec![0u8; 3 + SUFFIX.len()];
    stream.read_exact(&mut payload).await?;
    assert_eq!(payload, b"ABC from echo server");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_zero_length_message() -> Result<()> {
    let server = start(StreamConfig::default()).await?;
    let mut stream = connect(server.addr).await?;

    send_frame(&mut stream, b"").await?;
    let payload = read_frame(&mut stream).await?;
    assert_eq!(payload, SUFFIX.as_bytes());
    assert_eq!(payload.len(), 17);

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_multibyte_utf8_message() -> Result<()> {
    let server = start(StreamConfig::default()).await?;

    let mut client = TcpEchoClient::connect(server.addr).await?;
    let response = client.echo_string("héllo wörld ✓").await?;
    assert_eq!(response, "héllo wörld ✓ from echo server");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_sequential_exchanges_on_one_connection() -> Result<()> {
    let server = start(StreamConfig::default()).await?;

    let mut client = TcpEchoClient::connect(server.addr).await?;
    for i in 0..10 {
        let message = format!("message {i}");
        assert_eq!(client.echo_string(&message).await?, format!("{message}{SUFFIX}"));
    }

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_pipelined_frames_in_one_write() -> Result<()> {
    let server = start(StreamConfig::default()).await?;
    let mut stream = connect(server.addr).await?;

    let mut batch = Vec::new();
    for payload in [&b"one"[..], b"two"] {
        batch.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        batch.extend_from_slice(payload);
    }
    stream.write_all(&batch).await?;

    assert_eq!(read_frame(&mut stream).await?, b"one from echo server");
    assert_eq!(read_frame(&mut stream).await?, b"two from echo server");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_payload_split_across_writes() -> Result<()> {
    let server = start(StreamConfig::default()).await?;
    let mut stream = connect(server.addr).await?;

    let message = b"delivered in pieces";
    stream.write_all(&(message.len() as u32).to_le_bytes()[..1]).await?;
    tokio::time::sleep(Duration::from_millis(20)).await;
    stream.write_all(&(message.len() as u32).to_le_bytes()[1..]).await?;
    for chunk in message.chunks(4) {
        stream.write_all(chunk).await?;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(read_frame(&mut stream).await?, b"delivered in pieces from echo server");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_truncated_frame_closes_without_response() -> Result<()> {
    let server = start(StreamConfig::default()).await?;
    let mut stream = connect(server.addr).await?;

    stream.write_all(&100u32.to_le_bytes()).await?;
    stream.write_all(b"only a few bytes").await?;
    stream.shutdown().await?;

    assert!(read_until_closed(&mut stream).await?.is_empty());

    // The server keeps serving
    let mut client = TcpEchoClient::connect(server.addr).await?;
    assert_eq!(client.echo_string("still up").await?, "still up from echo server");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_partial_length_prefix_closes_without_response() -> Result<()> {
    let server = start(StreamConfig::default()).await?;

    for prefix_len in 1..4 {
        let mut stream = connect(server.addr).await?;
        stream.write_all(&7u32.to_le_bytes()[..prefix_len]).await?;
        stream.shutdown().await?;

        assert!(read_until_closed(&mut stream).await?.is_empty());
    }

    let mut client = TcpEchoClient::connect(server.addr).await?;
    assert_eq!(client.echo_string("still up").await?, "still up from echo server");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_invalid_utf8_closes_only_that_connection() -> Result<()> {
    let server = start(StreamConfig::default()).await?;

    let mut healthy = TcpEchoClient::connect(server.addr).await?;
    assert_eq!(healthy.echo_string("before").await?, "before from echo server");

    let mut stream = connect(server.addr).await?;
    send_frame(&mut stream, &[0xff, 0xfe, 0xfd]).await?;
    assert!(read_until_closed(&mut stream).await?.is_empty());

    // The concurrent connection is unaffected
    assert_eq!(healthy.echo_string("after").await?, "after from echo server");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_oversized_frame_rejected() -> Result<()> {
    let server = start(StreamConfig::default().with_max_frame_size(64)).await?;
    let mut stream = connect(server.addr).await?;

    // Only the prefix is sent; the server must not wait for the payload
    stream.write_all(&65u32.to_le_bytes()).await?;
    assert!(read_until_closed(&mut stream).await?.is_empty());

    let mut client = TcpEchoClient::connect(server.addr).await?;
    let at_limit = "x".repeat(64);
    assert_eq!(client.echo_string(&at_limit).await?, format!("{at_limit}{SUFFIX}"));

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_idle_timeout_closes_stalled_connection() -> Result<()> {
    let server = start(StreamConfig::default().with_idle_timeout(Duration::from_millis(200))).await?;
    let mut stream = connect(server.addr).await?;

    // Promise a payload and never deliver it
    stream.write_all(&16u32.to_le_bytes()).await?;

    let started = std::time::Instant::now();
    assert!(read_until_closed(&mut stream).await?.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(150));

    let mut client = TcpEchoClient::connect(server.addr).await?;
    assert_eq!(client.echo_string("alive").await?, "alive from echo server");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_client_reports_closed_connection() -> Result<()> {
    let server = start(StreamConfig::default().with_max_frame_size(8)).await?;

    let config = ClientConfigBuilder::new()
        .read_timeout(Duration::from_secs(2))
        .build();
    let mut client = TcpEchoClient::connect_with_config(server.addr, config).await?;
    assert!(client.echo_string("far too long for the limit").await.is_err());

    server.shutdown().await?;
    Ok(())
}
