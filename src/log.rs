use std::time::Duration;

/// Helper function for displaying the greeting data for a pruning run
pub fn pruning_greeting(
    dimension: usize,
    max_cuts: Option<usize>,
    num_batches: usize,
) {
    println!("\n# Pruning");
    println!("- Dimension: {dimension}");
    match max_cuts {
        Some(capacity) => println!("- Capacity: {capacity}"),
        None => println!("- Capacity: unbounded"),
    }
    println!("- Batches: {num_batches}");
}

/// Helper function for displaying the admission table header
pub fn admission_table_header() {
    println!(
        "{0: ^10} | {1: ^10} | {2: ^10} | {3: ^10} | {4: ^10}",
        "batch", "offered", "admitted", "rejected", "kept"
    )
}

/// Helper function for displaying a divider for the admission table
pub fn admission_table_divider() {
    println!("------------------------------------------------------------")
}

/// Helper function for displaying a row of admission results for
/// the admission table
pub fn admission_table_row(
    batch: usize,
    offered: usize,
    admitted: usize,
    rejected: usize,
    kept: usize,
) {
    println!(
        "{0: >10} | {1: >10} | {2: >10} | {3: >10} | {4: >10}",
        batch, offered, admitted, rejected, kept
    )
}

pub fn pruning_duration(time: Duration) {
    println!("\nPruning time: {:.2} s", time.as_millis() as f64 / 1000.0)
}
