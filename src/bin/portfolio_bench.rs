// bin/portfolio_bench.rs
//
// Times the portfolio tree and the performance heap under bulk buys and sells.

#[macro_use]
extern crate bma_benchmark;

use peak_alloc::PeakAlloc;

use stock_portfolio::{PerformanceHeap, Portfolio};

#[global_allocator]
static PEAK_ALLOC: PeakAlloc = PeakAlloc;

const SYMBOLS: u64 = 100_000;

fn symbol(i: u64) -> String {
    // Spread keys so inserts do not arrive in sorted order.
    format!("S{:08}", i.wrapping_mul(2_654_435_761) % 100_000_000)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let symbols: Vec<String> = (0..SYMBOLS).map(symbol).collect();
    let mut portfolio = Portfolio::new();
    let mut performance = PerformanceHeap::new();

    staged_benchmark_start!("insert");
    for (i, s) in symbols.iter().enumerate() {
        portfolio.insert_or_merge(s, 10, 100.0 + (i % 50) as f64)?;
    }
    staged_benchmark_finish_current!(SYMBOLS as u32);

    staged_benchmark_start!("merge");
    for s in &symbols {
        portfolio.insert_or_merge(s, 5, 120.0)?;
    }
    staged_benchmark_finish_current!(SYMBOLS as u32);

    staged_benchmark_start!("search");
    for s in &symbols {
        if portfolio.search(s).is_none() {
            anyhow::bail!("{} missing after insert", s);
        }
    }
    staged_benchmark_finish_current!(SYMBOLS as u32);

    staged_benchmark_start!("sell");
    for s in &symbols {
        let before = portfolio.reduce(s, 15)?;
        performance.insert(s, 15, before.realized_profit(15, 110.0))?;
    }
    staged_benchmark_finish_current!(SYMBOLS as u32);

    staged_benchmark_start!("sorted_view");
    let ranked = performance.sorted_view();
    staged_benchmark_finish_current!(1);

    staged_benchmark_print!();
    println!(
        "tree emptied: {}, trades ranked: {}, peak memory: {:.2} MB",
        portfolio.is_empty(),
        ranked.len(),
        PEAK_ALLOC.peak_usage_as_mb()
    );
    Ok(())
}
