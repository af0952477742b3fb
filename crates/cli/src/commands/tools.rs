//! Tool registry status listing.

use anyhow::Result;

pub fn run() -> Result<()> {
    let registry = super::build_registry();

    println!("{:<18} {:<10} {:<9} last error", "tool", "available", "failures");
    for status in registry.status() {
        println!(
            "{:<18} {:<10} {:<9} {}",
            status.name,
            if status.available { "yes" } else { "no" },
            status.failure_count,
            status.last_error.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
