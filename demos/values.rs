//! Converting Rust values to and from BearML values.
//!
//! Run with: cargo run --example values

use bearml::{element, from_str, to_string, to_string_with_policy, visualize, FormatPolicy};
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Limits {
    cpu: u8,
    memory: String,
    hosts: Vec<String>,
    note: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let limits = Limits {
        cpu: 2,
        memory: "1G".to_string(),
        hosts: vec!["alpha".to_string(), "beta".to_string()],
        note: Some("first line\nsecond line".to_string()),
    };

    let expanded = to_string(&limits)?;
    println!("Expanded:\n{expanded}\n");

    let compact = to_string_with_policy(&limits, &FormatPolicy::compact())?;
    println!("Compact:\n{compact}\n");

    assert_eq!(from_str::<Limits>(&expanded)?, limits);
    assert_eq!(from_str::<Limits>(&compact)?, limits);

    let built = element!({"cpu": 2, "tags": ["a", null]});
    println!("Built with element!: {}", visualize(&built, &FormatPolicy::compact()));

    Ok(())
}
