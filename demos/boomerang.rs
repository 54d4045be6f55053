use std::{io::Write, time::Duration};

use ackbuf::{Notifier, PullOptions, StreamBuffer, collections::Boomerang};
use clap::Parser;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let Args { count, interval } = Args::parse();

    let mut stream = StreamBuffer::builder().id(1).build();

    // Create a reusable buffer for serialization
    let mut buffer = Vec::new();
    let mut interval = tokio::time::interval(Duration::from_secs_f32(interval));
    for counter in 0..count {
        interval.tick().await;

        // Serialize the value into the buffer
        buffer
            .write_fmt(format_args!("[{counter:4?}] Hello, World!"))
            .unwrap();

        // The buffer comes back once the stream evicts it after acknowledgement,
        // so there is no need to allocate a new one every time.
        let (region, boomerang) = Boomerang::new(buffer);
        let (notifier, acked) = Notifier::channel();
        stream.push([region], Some(notifier)).unwrap();

        // Build a packet out of the unread bytes
        stream
            .pull(PullOptions::SYNC, 4, |status, slices, done| {
                let len: usize = slices.iter().map(|s| s.len()).sum();
                for slice in slices {
                    println!(">> {status:?} {}", String::from_utf8_lossy(slice));
                }
                done.complete(len).unwrap();
            })
            .unwrap();

        // The peer acknowledges the packet
        stream.consume(stream.length());
        println!("<< {}", acked.await.unwrap());

        // Take the buffer back and clear it for the next message
        buffer = boomerang.await.unwrap();
        buffer.clear();
    }

    stream.end();
}

#[derive(Debug, Parser)]
struct Args {
    #[arg(short, long, default_value = "10")]
    count: u32,
    #[arg(short, long, default_value = "1.0")]
    interval: f32,
}
