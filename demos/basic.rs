// Demo: a scroll loop with measurement feedback and slot recycling.
use virtual_window::{Virtualizer, VirtualizerOptions};

fn main() {
    let opts = VirtualizerOptions::new(1_000_000, 20).with_buffer(3);
    let mut v = Virtualizer::new(opts).expect("valid options");
    let viewport = 600;

    for scroll in [0u64, 150, 400, 10_000_000, 10_000_120] {
        let window = v.compute_window(scroll, viewport);

        // Pretend every third row wraps onto a second line once laid out.
        let mut measured = Vec::new();
        v.for_each_window_item(window, |item| {
            if item.index % 3 == 0 && !item.measured {
                measured.push((item.index, 40));
            }
        });
        v.record_measurements(measured);

        let mut reused = 0;
        v.sync_pool(window, |_, slot| reused += usize::from(slot.hit));

        println!(
            "scroll={scroll} window={}..={} first_offset={} reused={reused} total={}",
            window.start_index,
            window.end_index,
            v.cumulative_offset(window.start_index),
            v.total_size()
        );
    }

    let stats = v.pool_stats();
    println!(
        "pool: total={} hits={} misses={} hit_rate={:.2} mode={:?}",
        stats.total,
        stats.hits,
        stats.misses,
        stats.hit_rate,
        v.index_mode()
    );
}
