//! Byte Channel Coverage Tests
//!
//! Covers:
//! - Round-trip, flush visibility, and end-of-stream
//! - Backpressure between a suspended writer and a draining reader
//! - Close-with-cause, cancel, and `copy_and_close`

use pipenet::base::PipeError;
use pipenet::channel::{byte_channel, copy_and_close};

#[tokio::test]
async fn test_round_trip_then_eof() {
    let (mut tx, mut rx) = byte_channel(64);
    tx.write_fully(b"hello").await.unwrap();
    tx.flush();

    let mut buf = [0u8; 5];
    assert_eq!(rx.read_available(&mut buf).await.unwrap(), Some(5));
    assert_eq!(&buf, b"hello");

    tx.close(None);
    assert_eq!(rx.read_available(&mut buf).await.unwrap(), None);
}

#[tokio::test]
async fn test_flush_gates_visibility() {
    let (mut tx, rx) = byte_channel(64);
    tx.write_available(b"abc").await.unwrap();
    assert_eq!(rx.available_for_read(), 0);

    tx.flush();
    assert_eq!(rx.available_for_read(), 3);
}

#[tokio::test]
async fn test_reaching_capacity_flushes_implicitly() {
    let (mut tx, rx) = byte_channel(4);
    assert_eq!(tx.write_available(b"hello").await.unwrap(), 4);
    // The buffer hit capacity, so the accepted bytes became visible.
    assert_eq!(rx.available_for_read(), 4);
}

#[tokio::test]
async fn test_backpressure_unblocks_deterministically() {
    let (mut tx, mut rx) = byte_channel(4);
    let writer = tokio::spawn(async move {
        tx.write_fully(b"12345").await.unwrap();
        tx.close(None);
    });

    // Let the writer run until it parks on the full buffer.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!writer.is_finished());

    // Draining one byte must wake the writer; no byte is lost or
    // duplicated.
    let mut one = [0u8; 1];
    assert_eq!(rx.read_available(&mut one).await.unwrap(), Some(1));
    assert_eq!(&one, b"1");

    let rest = rx.read_remaining().await.unwrap();
    assert_eq!(&rest[..], b"2345");
    writer.await.unwrap();
}

#[tokio::test]
async fn test_graceful_close_drains_before_eof() {
    let (mut tx, mut rx) = byte_channel(64);
    tx.write_fully(b"tail").await.unwrap();
    // No explicit flush: close makes the bytes visible.
    tx.close(None);

    let mut buf = [0u8; 16];
    assert_eq!(rx.read_available(&mut buf).await.unwrap(), Some(4));
    assert_eq!(&buf[..4], b"tail");
    assert_eq!(rx.read_available(&mut buf).await.unwrap(), None);
    assert!(rx.is_closed_for_read());
}

#[tokio::test]
async fn test_close_with_cause_fails_suspended_read() {
    let (mut tx, mut rx) = byte_channel(8);
    let reader = tokio::spawn(async move {
        let mut buf = [0u8; 4];
        rx.read_available(&mut buf).await
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    tx.close(Some(PipeError::Transport("connection reset".into())));
    assert_eq!(
        reader.await.unwrap(),
        Err(PipeError::Transport("connection reset".into()))
    );
}

#[tokio::test]
async fn test_cause_close_discards_buffered_bytes() {
    let (mut tx, mut rx) = byte_channel(64);
    tx.write_fully(b"buffered").await.unwrap();
    tx.flush();
    tx.close(Some(PipeError::Transport("late failure".into())));

    // The cause wins over the already-flushed bytes.
    let mut buf = [0u8; 8];
    assert_eq!(
        rx.read_available(&mut buf).await,
        Err(PipeError::Transport("late failure".into()))
    );
}

#[tokio::test]
async fn test_read_fully_fails_on_short_stream() {
    let (mut tx, mut rx) = byte_channel(64);
    tx.write_fully(b"abc").await.unwrap();
    tx.close(None);

    let mut buf = [0u8; 5];
    assert_eq!(
        rx.read_fully(&mut buf).await,
        Err(PipeError::UnexpectedEndOfStream { expected: 2 })
    );
}

#[tokio::test]
async fn test_read_fully_spans_multiple_flushes() {
    let (mut tx, mut rx) = byte_channel(4);
    let writer = tokio::spawn(async move {
        for chunk in [&b"ab"[..], &b"cd"[..], &b"ef"[..]] {
            tx.write_fully(chunk).await.unwrap();
            tx.flush();
        }
        tx
    });

    let mut buf = [0u8; 6];
    rx.read_fully(&mut buf).await.unwrap();
    assert_eq!(&buf, b"abcdef");
    writer.await.unwrap();
}

#[tokio::test]
async fn test_read_remaining_collects_until_close() {
    let (mut tx, mut rx) = byte_channel(8);
    let writer = tokio::spawn(async move {
        tx.write_fully(b"first ").await.unwrap();
        tx.flush();
        tx.write_fully(b"second").await.unwrap();
        tx.close(None);
    });

    let all = rx.read_remaining().await.unwrap();
    assert_eq!(&all[..], b"first second");
    writer.await.unwrap();
}

#[tokio::test]
async fn test_cancel_fails_both_ends() {
    let (mut tx, mut rx) = byte_channel(64);
    tx.write_fully(b"pending").await.unwrap();
    tx.flush();

    rx.cancel(None);
    assert_eq!(
        tx.write_fully(b"more").await,
        Err(PipeError::ChannelCancelled)
    );
    let mut buf = [0u8; 4];
    assert_eq!(
        rx.read_available(&mut buf).await,
        Err(PipeError::ChannelCancelled)
    );
    assert!(tx.is_closed_for_write());
}

#[tokio::test]
async fn test_cancel_with_cause_fails_suspended_writer() {
    let (mut tx, mut rx) = byte_channel(2);
    let writer = tokio::spawn(async move { tx.write_fully(b"overflow").await });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    rx.cancel(Some(PipeError::Transport("peer gone".into())));
    assert_eq!(
        writer.await.unwrap(),
        Err(PipeError::Transport("peer gone".into()))
    );
}

#[tokio::test]
async fn test_copy_and_close_streams_everything() {
    let (mut upstream_tx, mut upstream_rx) = byte_channel(4);
    let (mut downstream_tx, mut downstream_rx) = byte_channel(4);

    let producer = tokio::spawn(async move {
        upstream_tx.write_fully(b"streamed body").await.unwrap();
        upstream_tx.close(None);
    });
    let pump = tokio::spawn(async move {
        copy_and_close(&mut upstream_rx, &mut downstream_tx).await
    });

    let body = downstream_rx.read_remaining().await.unwrap();
    assert_eq!(&body[..], b"streamed body");
    assert_eq!(pump.await.unwrap().unwrap(), 13);
    producer.await.unwrap();
}

#[tokio::test]
async fn test_copy_and_close_propagates_cause() {
    let (mut upstream_tx, mut upstream_rx) = byte_channel(4);
    let (mut downstream_tx, mut downstream_rx) = byte_channel(64);

    let pump = tokio::spawn(async move {
        copy_and_close(&mut upstream_rx, &mut downstream_tx).await
    });
    tokio::task::yield_now().await;
    upstream_tx.close(Some(PipeError::Transport("upstream died".into())));

    assert_eq!(
        pump.await.unwrap(),
        Err(PipeError::Transport("upstream died".into()))
    );
    assert_eq!(
        downstream_rx.read_remaining().await,
        Err(PipeError::Transport("upstream died".into()))
    );
}
