//! Unit tests for the async AGI readers.
//!
//! Covers:
//! - single read returns one chunk and stops at 1024 bytes
//! - blank-line terminated block in one or several chunks
//! - partial text returned with the error when the stream fails or closes
//! - partial variables parsed when `read_variables` fails
//! - optional size guard on the accumulator

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};

use agi_link::agi::{
    read_once, read_until_blank_line, read_variables, BlockReader, READ_CHUNK_SIZE,
};

/// Stream that replays a fixed list of read results, then reports EOF.
struct Scripted {
    steps: VecDeque<io::Result<Vec<u8>>>,
    reads: usize,
}

impl Scripted {
    fn new(steps: Vec<io::Result<Vec<u8>>>) -> Self {
        Self {
            steps: steps.into(),
            reads: 0,
        }
    }

    fn chunks(chunks: &[&str]) -> Self {
        Self::new(
            chunks
                .iter()
                .map(|c| Ok(c.as_bytes().to_vec()))
                .collect(),
        )
    }
}

impl AsyncRead for Scripted {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.reads += 1;
        match self.steps.pop_front() {
            Some(Ok(bytes)) => {
                buf.put_slice(&bytes);
                Poll::Ready(Ok(()))
            }
            Some(Err(err)) => Poll::Ready(Err(err)),
            None => Poll::Ready(Ok(())),
        }
    }
}

fn reset() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")
}

// ── read_once ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn read_once_returns_single_chunk() {
    let mut stream = Scripted::chunks(&["200 result=1\n", "ignored"]);

    let text = read_once(&mut stream).await.expect("read succeeds");

    assert_eq!(text, "200 result=1\n");
    assert_eq!(stream.reads, 1, "exactly one underlying read");
}

#[tokio::test]
async fn read_once_caps_at_chunk_size() {
    let (mut client, mut server) = tokio::io::duplex(8 * READ_CHUNK_SIZE);
    let payload = "x".repeat(READ_CHUNK_SIZE + 100);
    client.write_all(payload.as_bytes()).await.expect("write");

    let first = read_once(&mut server).await.expect("first read");
    let second = read_once(&mut server).await.expect("second read");

    assert_eq!(first.len(), READ_CHUNK_SIZE);
    assert_eq!(second.len(), 100);
}

#[tokio::test]
async fn read_once_on_closed_stream_is_unexpected_eof() {
    let mut stream = Scripted::new(Vec::new());

    let err = read_once(&mut stream)
        .await
        .expect_err("closed stream errors");

    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[tokio::test]
async fn read_once_passes_error_through_unchanged() {
    let mut stream = Scripted::new(vec![Err(reset())]);

    let err = read_once(&mut stream).await.expect_err("read fails");

    assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    assert_eq!(err.to_string(), "reset by peer");
}

#[tokio::test]
async fn read_once_replaces_invalid_utf8() {
    let mut stream = Scripted::new(vec![Ok(vec![b'o', b'k', 0xFF])]);

    let text = read_once(&mut stream).await.expect("read succeeds");

    assert_eq!(text, "ok\u{FFFD}");
}

// ── read_until_blank_line ────────────────────────────────────────────────────

#[tokio::test]
async fn block_in_one_chunk_is_returned_whole() {
    let (mut client, mut server) = tokio::io::duplex(1024);
    client.write_all(b"k1: v1\n\n").await.expect("write");

    let text = read_until_blank_line(&mut server)
        .await
        .expect("block read");

    assert_eq!(text, "k1: v1\n\n");
}

#[tokio::test]
async fn block_spread_over_chunks_is_accumulated() {
    let mut stream = Scripted::chunks(&["agi_network: yes\nagi_d", "nid: 100\n", "\n"]);

    let text = read_until_blank_line(&mut stream)
        .await
        .expect("block read");

    assert_eq!(text, "agi_network: yes\nagi_dnid: 100\n\n");
    assert_eq!(stream.reads, 3);
}

#[tokio::test]
async fn reading_stops_at_terminator_and_leaves_rest_unread() {
    let mut stream = Scripted::chunks(&["a: 1\n\n", "200 result=0\n"]);

    read_until_blank_line(&mut stream)
        .await
        .expect("block read");

    assert_eq!(stream.reads, 1);
    assert_eq!(stream.steps.len(), 1, "following chunk is not consumed");
}

#[tokio::test]
async fn partial_text_is_kept_when_stream_closes() {
    let (mut client, mut server) = tokio::io::duplex(1024);
    client.write_all(b"partial").await.expect("write");
    drop(client);

    let partial = read_until_blank_line(&mut server)
        .await
        .expect_err("close before terminator is an error");

    assert_eq!(partial.data, "partial");
    assert_eq!(partial.kind(), io::ErrorKind::UnexpectedEof);
}

#[tokio::test]
async fn partial_text_is_kept_when_read_fails() {
    let mut stream = Scripted::new(vec![Ok(b"a: 1\nb: ".to_vec()), Err(reset())]);

    let partial = read_until_blank_line(&mut stream)
        .await
        .expect_err("read failure propagates");

    assert_eq!(partial.data, "a: 1\nb: ");
    assert_eq!(partial.kind(), io::ErrorKind::ConnectionReset);
}

#[tokio::test]
async fn immediate_failure_yields_empty_partial_text() {
    let mut stream = Scripted::new(vec![Err(io::Error::from(io::ErrorKind::TimedOut))]);

    let partial = read_until_blank_line(&mut stream)
        .await
        .expect_err("timeout");

    assert!(partial.data.is_empty());
    assert_eq!(partial.kind(), io::ErrorKind::TimedOut);
}

// ── read_variables ───────────────────────────────────────────────────────────

#[tokio::test]
async fn read_variables_parses_complete_block() {
    let mut stream = Scripted::chunks(&["k1: v1\n\n"]);

    let vars = read_variables(&mut stream).await.expect("variables read");

    assert_eq!(vars.len(), 1);
    assert_eq!(vars["k1"], "v1");
}

#[tokio::test]
async fn read_variables_parses_partial_text_on_failure() {
    let mut stream = Scripted::chunks(&["agi_dnid: 100\nagi_chan"]);

    let partial = read_variables(&mut stream)
        .await
        .expect_err("stream closes before terminator");

    assert_eq!(partial.data.len(), 1);
    assert_eq!(partial.data["agi_dnid"], "100");
    assert_eq!(partial.kind(), io::ErrorKind::UnexpectedEof);
}

// ── BlockReader size guard ───────────────────────────────────────────────────

#[test]
fn default_reader_is_unbounded() {
    assert_eq!(BlockReader::new().max_len(), None);
    assert_eq!(BlockReader::default(), BlockReader::new());
    assert_eq!(BlockReader::with_max_len(64).max_len(), Some(64));
}

#[tokio::test]
async fn bounded_reader_accepts_block_within_limit() {
    let mut stream = Scripted::chunks(&["a: 1\n", "\n"]);

    let text = BlockReader::with_max_len(6)
        .read_block(&mut stream)
        .await
        .expect("block fits");

    assert_eq!(text, "a: 1\n\n");
}

#[tokio::test]
async fn bounded_reader_rejects_oversized_block() {
    let mut stream = Scripted::chunks(&["a: 1\n", "b: 2\n", "\n"]);

    let partial = BlockReader::with_max_len(8)
        .read_variables(&mut stream)
        .await
        .expect_err("block exceeds limit");

    assert_eq!(partial.kind(), io::ErrorKind::InvalidData);
    assert_eq!(partial.data.len(), 1, "only the chunk within the limit");
    assert_eq!(partial.data["a"], "1");
}
