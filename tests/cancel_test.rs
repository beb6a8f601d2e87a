//! Cancellation and Cross-Task Failure Coverage Tests
//!
//! Covers:
//! - Cancelling a call mid-chain via close-with-cause
//! - Task abort leaving channels consistent
//! - Writer/reader task builders propagating outcomes as close causes

use async_trait::async_trait;
use pipenet::base::context::IoResultExt;
use pipenet::base::PipeError;
use pipenet::channel::{byte_channel, tasks, ByteReadChannel};
use pipenet::pipeline::{Interceptor, Phase, Pipeline, PipelineContext};

/// A call whose body arrives over a byte channel.
#[derive(Debug)]
struct StreamingCall {
    body: Option<ByteReadChannel>,
}

/// Drains the call body into the subject before proceeding.
struct ReadBody;

#[async_trait]
impl Interceptor<Vec<u8>, StreamingCall> for ReadBody {
    async fn run(&self, cx: &mut PipelineContext<Vec<u8>, StreamingCall>) -> Result<(), PipeError> {
        let mut rx = cx.call_mut().body.take().expect("body already consumed");
        let body = rx.read_remaining().await?;
        cx.subject_mut().extend_from_slice(&body);
        cx.proceed().await
    }
}

#[tokio::test]
async fn test_cancelling_call_unblocks_execute_with_cause() {
    let phase = Phase::new("Receive");
    let mut pipeline = Pipeline::new([phase.clone()]);
    pipeline.intercept(&phase, ReadBody).unwrap();

    let (mut tx, rx) = byte_channel(16);
    let call = StreamingCall { body: Some(rx) };
    let execution = tokio::spawn(async move { pipeline.execute(call, Vec::new()).await });

    // Let the interceptor park on the empty body channel, then cancel the
    // call from the producing side.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tx.close(Some(PipeError::CallCancelled));

    let err = execution.await.unwrap().unwrap_err();
    assert_eq!(err, PipeError::CallCancelled);
    assert!(err.is_cancellation());
}

#[tokio::test]
async fn test_transport_failure_reaches_execute() {
    let phase = Phase::new("Receive");
    let mut pipeline = Pipeline::new([phase.clone()]);
    pipeline.intercept(&phase, ReadBody).unwrap();

    let (mut tx, rx) = byte_channel(16);
    tx.write_fully(b"partial").await.unwrap();
    tx.flush();
    tx.close(Some(PipeError::Transport("connection reset".into())));

    let call = StreamingCall { body: Some(rx) };
    let err = pipeline.execute(call, Vec::new()).await.unwrap_err();
    assert_eq!(err, PipeError::Transport("connection reset".into()));
    assert!(!err.is_cancellation());
}

#[tokio::test]
async fn test_task_abort_leaves_channel_consistent() {
    let (mut tx, mut rx) = byte_channel(4);
    let writer = tokio::spawn(async move { tx.write_fully(b"123456789").await });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    writer.abort();
    let join = writer.await;
    assert!(join.unwrap_err().is_cancelled());

    // The bytes flushed before the abort drain normally; the dropped
    // writer half then closes the channel.
    let drained = rx.read_remaining().await.unwrap();
    assert_eq!(&drained[..], b"1234");
}

#[tokio::test]
async fn test_writer_task_streams_then_closes() {
    let (mut rx, task) = tasks::writer(8, |mut tx| async move {
        tx.write_fully(b"hello world").await?;
        Ok(())
    });

    let body = rx.read_remaining().await.unwrap();
    assert_eq!(&body[..], b"hello world");
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_writer_task_failure_becomes_close_cause() {
    let (mut rx, task) = tasks::writer(64, |mut tx| async move {
        tx.write_fully(b"partial").await?;
        tx.flush();
        Err(PipeError::application("disk full"))
    });

    assert_eq!(
        task.await.unwrap(),
        Err(PipeError::application("disk full"))
    );
    // The reader observes the cause, not end-of-stream.
    assert_eq!(
        rx.read_remaining().await,
        Err(PipeError::application("disk full"))
    );
}

#[tokio::test]
async fn test_writer_task_abort_closes_with_cancellation() {
    let (mut rx, task) = tasks::writer(2, |mut tx| async move {
        // Nobody drains, so this parks at capacity.
        tx.write_fully(&[0u8; 1024]).await?;
        Ok(())
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    let err = rx.read_remaining().await.unwrap_err();
    assert_eq!(err, PipeError::CallCancelled);
    assert!(err.is_cancellation());
}

#[tokio::test]
async fn test_reader_task_failure_fails_producer() {
    let (mut tx, task) = tasks::reader(4, |mut rx| async move {
        let mut buf = [0u8; 2];
        rx.read_available(&mut buf).await?;
        Err(PipeError::application("quota exceeded"))
    });

    tx.write_fully(b"zz").await.unwrap();
    tx.flush();

    assert_eq!(
        task.await.unwrap(),
        Err(PipeError::application("quota exceeded"))
    );
    assert_eq!(
        tx.write_fully(b"more").await,
        Err(PipeError::application("quota exceeded"))
    );
}

/// Responds by spawning a dedicated writer task for the body while the
/// chain continues.
struct RespondWithBody;

#[async_trait]
impl Interceptor<Option<ByteReadChannel>, ()> for RespondWithBody {
    async fn run(
        &self,
        cx: &mut PipelineContext<Option<ByteReadChannel>, ()>,
    ) -> Result<(), PipeError> {
        let (rx, _task) = tasks::writer(16, |mut tx| async move {
            tx.write_fully(b"response body").await?;
            Ok(())
        });
        *cx.subject_mut() = Some(rx);
        cx.proceed().await
    }
}

#[tokio::test]
async fn test_interceptor_spawns_body_writer_task() {
    let phase = Phase::new("Call");
    let mut pipeline = Pipeline::new([phase.clone()]);
    pipeline.intercept(&phase, RespondWithBody).unwrap();

    let execution = pipeline.execute((), None).await.unwrap();
    let mut rx = execution.subject.expect("interceptor attached a body");
    let body = rx.read_remaining().await.unwrap();
    assert_eq!(&body[..], b"response body");
}

#[tokio::test]
async fn test_engine_error_becomes_close_cause() {
    let (mut tx, mut rx) = byte_channel(16);

    // An engine converts its native IO failure before closing.
    let engine = tokio::spawn(async move {
        let read: Result<usize, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset by peer",
        ));
        if let Err(cause) = read.transport_context("10.0.0.1:443") {
            tx.close(Some(cause));
        }
    });
    engine.await.unwrap();

    match rx.read_remaining().await.unwrap_err() {
        PipeError::Transport(msg) => {
            assert!(msg.contains("10.0.0.1:443"));
            assert!(msg.contains("reset by peer"));
        }
        other => panic!("Expected Transport, got {other:?}"),
    }
}
