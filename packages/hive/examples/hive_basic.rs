//! Basic usage of the `hive` crate:
//!
//! * Creating a hive.
//! * Adding items.
//! * Retrieving and modifying items.
//! * Removing items while walking the hive.
//!
//! Run with `RUST_LOG=debug` to see block allocations logged as the hive grows.

use hive::Hive;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut hive = Hive::<String>::new();

    // Inserting an item gives you a cursor that you can later use to look up the item again.
    let alice = hive.emplace("Alice".to_string());
    let bob = hive.emplace("Bob".to_string());
    let charlie = hive.emplace("Charlie".to_string());

    println!(
        "Hive contains {} items, with an auto-adjusting capacity of {}",
        hive.len(),
        hive.capacity()
    );

    // The cursor of Bob stays valid until Bob is removed, no matter what else happens.
    if let Some(name) = hive.get(bob) {
        println!("Retrieved item: {name}");
    }

    hive.erase(charlie);

    // Modify an item in place. Its address does not change.
    if let Some(name) = hive.get_mut(alice) {
        name.push_str(" Smith");
    }

    // Fill up a few blocks and then thin them out again while walking the hive.
    for index in 0..100 {
        hive.emplace(format!("Worker {index}"));
    }

    let mut cursor = hive.begin();
    while let Some(name) = hive.get(cursor) {
        cursor = if name.ends_with('3') {
            hive.erase(cursor)
        } else {
            hive.advance(cursor)
        };
    }

    println!(
        "After thinning the hive contains {} items, with a capacity of {}",
        hive.len(),
        hive.capacity()
    );

    // Freed slots are reused before the hive grows again.
    let dave = hive.emplace("Dave".to_string());
    println!(
        "Dave moved into a recycled slot, capacity is still {}: {}",
        hive.capacity(),
        hive.get(dave).map_or("<missing>", String::as_str)
    );

    for name in hive.iter().take(3) {
        println!("First items: {name}");
    }
}
