use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use ackbuf::{Notifier, PullOptions, PullOutcome, Region, StreamBuffer};
use ackbuf_bench::Counters;
use clap::Parser;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let Args {
        size,
        regions,
        packet,
        interval,
    } = Args::parse();
    let regions = regions.max(1);
    let packet = packet.max(1);

    static COUNTERS: Counters = Counters {
        packets: AtomicUsize::new(0),
        bytes: AtomicUsize::new(0),
        acked: AtomicUsize::new(0),
    };
    tokio::spawn(ackbuf_bench::stats_loop(&COUNTERS, Duration::from_secs_f32(interval)));

    let mut buffer = StreamBuffer::builder().max_regions(regions).build();
    let payload = Region::from(vec![0x42u8; size]);
    let step = size.div_ceil(regions).max(1);
    loop {
        // Producer: one submission per payload, split in `regions` views
        let views = (0..size)
            .step_by(step)
            .filter_map(|start| payload.view(start..(start + step).min(size)));
        let notifier = Notifier::new(|status| {
            if status.is_ok() {
                COUNTERS.acked.fetch_add(1, Ordering::Relaxed);
            }
        });
        buffer.push(views, Some(notifier)).unwrap();

        // Transport: packetize everything, then acknowledge it
        while buffer.remaining() > 0 {
            let outcome = buffer
                .pull_default(PullOptions::SYNC, move |_, slices, done| {
                    let mut len = 0;
                    for slice in slices {
                        len += slice.len().min(packet - len);
                    }
                    COUNTERS.packets.fetch_add(1, Ordering::Relaxed);
                    COUNTERS.bytes.fetch_add(len, Ordering::Relaxed);
                    done.complete(len).unwrap();
                })
                .unwrap();
            assert_eq!(outcome, PullOutcome::Completed);
        }
        buffer.consume(buffer.length());
        tokio::task::yield_now().await;
    }
}

#[derive(Debug, Parser)]
struct Args {
    /// Size of each submission in bytes.
    #[arg(short, long)]
    size: usize,
    /// Number of regions each submission is split into.
    #[arg(short, long, default_value = "4")]
    regions: usize,
    /// Maximum packet payload in bytes.
    #[arg(short, long, default_value = "1200")]
    packet: usize,
    #[arg(short, long, default_value = "1.0")]
    interval: f32,
}
