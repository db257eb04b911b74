//! Cache statistics rendering.

use console::style;

use poilayer::cache::CacheStats;

/// Print cache statistics for the current process.
pub fn print_stats(stats: &CacheStats) {
    println!("{}", style("Result cache").bold());
    println!("  Entries: {} of {}", stats.size, stats.max_size);
    println!("  TTL:     {}s", stats.ttl.as_secs());
}
