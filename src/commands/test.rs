//! Test command implementation.
//!
//! Runs collection cycles and displays the resulting group table.

use process_group_exporter::{CancelToken, GroupAggregate, Snapshot};

use crate::config::Config;
use crate::state::build_collector;

/// Groups shown per iteration unless `--verbose` is given.
const DEFAULT_ROWS: usize = 20;

/// Runs `iterations` collection cycles and prints each snapshot.
pub fn command_test(
    iterations: usize,
    verbose: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧪 Process Group Exporter - Test Mode");
    println!("=====================================");
    println!("Root supervisor: {}", config.root_supervisor());

    let collector = build_collector(config);

    for iteration in 1..=iterations {
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let snapshot = collector.collect_snapshot(&CancelToken::default())?;
        print_snapshot(&snapshot, verbose);
    }

    println!("\n✅ Test completed successfully");
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot, verbose: bool) {
    let stats = snapshot.stats();
    println!(
        "   ⏱️  Collection duration: {:.2}ms",
        snapshot.duration().as_secs_f64() * 1000.0
    );
    println!("   📁 Enumerated: {} processes", stats.enumerated);
    println!("   📊 Aggregated: {} processes into {} groups", stats.aggregated, snapshot.groups().len());
    println!(
        "   ❌ Errors: name={} ancestor={} cpu={} memory={}",
        stats.name_errors, stats.ancestor_errors, stats.cpu_errors, stats.memory_errors
    );

    let mut groups: Vec<&GroupAggregate> = snapshot.groups().iter().collect();
    groups.sort_by(|a, b| b.totals.cpu_seconds.total_cmp(&a.totals.cpu_seconds));
    let limit = if verbose { groups.len() } else { DEFAULT_ROWS };

    println!();
    println!(
        "   {:<28} {:<28} {:>6} {:>12} {:>8}",
        "NAME", "PARENT", "PROCS", "CPU (s)", "MEM %"
    );
    for g in groups.iter().take(limit) {
        println!(
            "   {:<28} {:<28} {:>6} {:>12.2} {:>8.2}",
            g.key.name, g.key.parent, g.totals.processes, g.totals.cpu_seconds, g.totals.memory_percent
        );
    }
    if groups.len() > limit {
        println!("   ... {} more groups (use --verbose)", groups.len() - limit);
    }
}
