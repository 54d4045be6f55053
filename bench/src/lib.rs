use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

/// Counters shared between a benchmark loop and [`stats_loop`].
#[derive(Debug, Default)]
pub struct Counters {
    pub packets: AtomicUsize,
    pub bytes: AtomicUsize,
    pub acked: AtomicUsize,
}

pub async fn stats_loop(counters: &'static Counters, interval: Duration) {
    // Stats reporting loop
    let mut tot_packets = 0;

    tokio::time::sleep(interval).await;
    let mut loop_interval = tokio::time::interval(interval);
    loop {
        loop_interval.tick().await;

        macro_rules! xps {
            ($x:expr) => {
                $x as f32 / interval.as_secs_f32()
            };
        }

        let packets = counters.packets.swap(0, Ordering::Relaxed);
        let bytes = counters.bytes.swap(0, Ordering::Relaxed);
        let acked = counters.acked.swap(0, Ordering::Relaxed);
        tot_packets += packets;

        let avg_bytes = if packets != 0 { bytes / packets } else { 0 };
        let gbps = (8 * bytes) as f64 / 1_000_000_000.0;

        println!(
            "[{:12}]  {:8} pkt/s  {:5} B/pkt  {:8} ack/s  {:.3} Gb/s",
            tot_packets,
            xps!(packets),
            avg_bytes,
            xps!(acked),
            xps!(gbps)
        );
    }
}
