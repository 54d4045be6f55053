use std::{
    io::IoSlice,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use ackbuf::{BufferError, Done, Notifier, PullOptions, PullOutcome, PullStatus, Region, Status, StreamBuffer};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Notifier recording every status it receives.
fn recording() -> (Notifier, Arc<Mutex<Vec<Status>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let c_log = log.clone();
    let notifier = Notifier::new(move |status| c_log.lock().unwrap().push(status));
    (notifier, log)
}

#[test]
fn consume_waits_for_read() {
    init_logging();
    let (notifier, log) = recording();
    let mut buffer = StreamBuffer::new();
    buffer.push([vec![0u8; 100]], Some(notifier)).unwrap();

    // 1. Nothing read: nothing acknowledged
    assert_eq!(buffer.consume(100), 0);
    assert_eq!(buffer.length(), 100);

    // 2. Read, then acknowledge
    assert_eq!(buffer.seek(100), 100);
    assert_eq!(buffer.consume(100), 100);
    assert_eq!(buffer.length(), 0);
    assert_eq!(*log.lock().unwrap(), vec![Status::Ok]);
}

#[test]
fn shared_notifier_with_partial_read() {
    init_logging();
    let (notifier, log) = recording();
    let mut buffer = StreamBuffer::new();
    buffer.push([vec![0u8; 26], vec![1u8; 26]], Some(notifier)).unwrap();

    assert_eq!(buffer.seek(2), 2);
    assert_eq!(buffer.remaining(), 50);
    assert_eq!(buffer.length(), 52);

    // 1. Acknowledgement is clamped to the read cursor
    assert_eq!(buffer.consume(25), 2);
    assert_eq!(buffer.length(), 50);

    // 2. Read the rest, then acknowledge it
    assert_eq!(buffer.seek(50), 50);
    assert_eq!(buffer.consume(25), 25);
    assert_eq!(buffer.length(), 25);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(buffer.consume(25), 25);
    assert_eq!(buffer.length(), 0);
    assert_eq!(*log.lock().unwrap(), vec![Status::Ok]);
}

#[test]
fn shared_notifier_fully_read() {
    init_logging();
    let (notifier, log) = recording();
    let mut buffer = StreamBuffer::new();
    buffer.push([vec![0u8; 26], vec![1u8; 26]], Some(notifier)).unwrap();
    buffer.seek(52);

    for (amount, length) in [(25, 27), (25, 2), (2, 0)] {
        assert_eq!(buffer.consume(amount), amount);
        assert_eq!(buffer.length(), length);
    }
    assert_eq!(*log.lock().unwrap(), vec![Status::Ok]);
}

#[test]
fn notifier_fires_on_last_eviction() {
    init_logging();
    let (notifier, log) = recording();
    let mut buffer = StreamBuffer::new();
    buffer.push([vec![0u8; 50], vec![1u8; 50]], Some(notifier)).unwrap();
    buffer.seek(100);

    for length in [75, 50, 25] {
        assert_eq!(buffer.consume(25), 25);
        assert_eq!(buffer.length(), length);
        assert!(log.lock().unwrap().is_empty());
    }
    assert_eq!(buffer.consume(25), 25);
    assert_eq!(buffer.length(), 0);
    assert_eq!(*log.lock().unwrap(), vec![Status::Ok]);
}

#[test]
fn cancel_after_partial_acknowledgement() {
    init_logging();
    let (notifier, log) = recording();
    let mut buffer = StreamBuffer::new();
    buffer.push([vec![0u8; 50], vec![1u8; 50]], Some(notifier)).unwrap();

    buffer.seek(25);
    assert_eq!(buffer.consume(25), 25);
    assert_eq!(buffer.length(), 75);

    buffer.cancel();
    assert_eq!(buffer.length(), 0);
    assert_eq!(buffer.remaining(), 0);
    assert_eq!(*log.lock().unwrap(), vec![Status::Cancelled]);
    assert_eq!(buffer.push(["late"], None), Err(BufferError::AlreadyCancelled));
}

#[test]
fn sync_end_pull() {
    init_logging();
    let mut buffer = StreamBuffer::new();
    buffer.push([vec![0xAAu8; 100]], None).unwrap();
    buffer.end();
    assert_eq!(buffer.remaining(), 100);

    let calls = Arc::new(AtomicUsize::new(0));
    let c_calls = calls.clone();
    let outcome = buffer
        .pull(PullOptions::SYNC | PullOptions::END, 2, move |status, slices, done| {
            c_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(status, PullStatus::End);
            assert_eq!(slices.len(), 1);
            assert!(slices[0].iter().all(|&b| b == 0xAA));
            done.complete(100).unwrap();
        })
        .unwrap();

    assert_eq!(outcome, PullOutcome::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(buffer.remaining(), 0);

    assert_eq!(buffer.consume(50), 50);
    assert_eq!(buffer.length(), 50);
    assert_eq!(buffer.consume(50), 50);
    assert_eq!(buffer.length(), 0);
}

#[test]
fn ownership_transfer() {
    init_logging();
    let mut a = StreamBuffer::new();
    a.push([vec![0u8; 100]], None).unwrap();
    assert_eq!(a.length(), 100);

    let b = a.take();
    assert_eq!(a.length(), 0);
    assert_eq!(b.length(), 100);
}

#[test]
fn pull_zero_copy() {
    init_logging();
    let region: Region = vec![1u8, 2, 3, 4, 5, 6].into();
    let address = region.as_ptr() as usize;

    let mut buffer = StreamBuffer::new();
    buffer.push([region.view(..3).unwrap(), region.view(3..).unwrap()], None).unwrap();
    drop(region);

    let (sender, receiver) = std::sync::mpsc::channel();
    buffer
        .pull(PullOptions::SYNC, 8, move |_, slices, done| {
            let pointers: Vec<usize> = slices.iter().map(|s| s.as_ptr() as usize).collect();
            sender.send(pointers).unwrap();
            done.complete(6).unwrap();
        })
        .unwrap();

    // Descriptors point into the pushed memory
    assert_eq!(receiver.recv().unwrap(), vec![address, address + 3]);
}

/// Transport-side continuation: copies what it is offered into a packet.
fn packet(
    size: usize,
    sender: mpsc::UnboundedSender<(PullStatus, Vec<u8>)>,
) -> impl for<'a> FnOnce(PullStatus, &[IoSlice<'a>], Done<'a>) + Send + 'static {
    move |status, slices, done| {
        let mut data = Vec::with_capacity(size);
        for slice in slices {
            let take = (size - data.len()).min(slice.len());
            data.extend_from_slice(&slice[..take]);
        }
        done.complete(data.len()).unwrap();
        let _ = sender.send((status, data));
    }
}

enum Command {
    Push(Vec<u8>, Notifier),
    End,
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn producer_and_transport() {
    init_logging();
    const MESSAGES: usize = 64;
    const PACKET: usize = 100;

    let (commands, mut inbox) = mpsc::unbounded_channel::<Command>();

    // Transport task: owns the buffer, builds packets and acknowledges them
    let transport = tokio::spawn(async move {
        let mut buffer = StreamBuffer::builder().id(1).build();
        let (packets, mut outbox) = mpsc::unbounded_channel();
        let mut received = Vec::new();
        loop {
            if !buffer.is_pull_pending() {
                let outcome = buffer
                    .pull(PullOptions::NONE, 4, packet(PACKET, packets.clone()))
                    .unwrap();
                if outcome == PullOutcome::Suspended {
                    match inbox.recv().await {
                        Some(Command::Push(data, notifier)) => buffer.push([data], Some(notifier)).unwrap(),
                        Some(Command::End) | None => buffer.end(),
                    }
                }
            }

            while let Ok((status, data)) = outbox.try_recv() {
                // Every packet is acknowledged as soon as it is built
                buffer.consume(data.len() as u64);
                received.extend(data);
                if matches!(status, PullStatus::End | PullStatus::EmptyEnd) {
                    assert_eq!(buffer.length(), 0);
                    return received;
                }
            }
        }
    });

    // Producer: push messages and wait for each acknowledgement
    let mut expected = Vec::new();
    for i in 0..MESSAGES {
        let message = vec![i as u8; 10 + i * 7];
        expected.extend_from_slice(&message);
        let (notifier, acked) = Notifier::channel();
        commands.send(Command::Push(message, notifier)).unwrap();
        assert_eq!(acked.await.unwrap(), Status::Ok);
    }
    commands.send(Command::End).unwrap();

    let received = transport.await.unwrap();
    assert_eq!(received, expected);
}

#[tokio::test]
async fn cancel_resolves_everything() {
    init_logging();
    let mut buffer = StreamBuffer::new();
    let (first, first_acked) = Notifier::channel();
    let (second, second_acked) = Notifier::channel();
    buffer.push(["abc", "def"], Some(first)).unwrap();
    buffer.push(["ghi"], Some(second)).unwrap();
    buffer.seek(9);

    let (sender, pulled) = oneshot::channel();
    let outcome = buffer
        .pull(PullOptions::NONE, 4, move |status, slices, done| {
            assert!(slices.is_empty());
            done.complete(0).unwrap();
            let _ = sender.send(status);
        })
        .unwrap();
    assert_eq!(outcome, PullOutcome::Suspended);

    drop(buffer);
    assert_eq!(first_acked.await.unwrap(), Status::Cancelled);
    assert_eq!(second_acked.await.unwrap(), Status::Cancelled);
    assert_eq!(pulled.await.unwrap(), PullStatus::Cancelled);
}
