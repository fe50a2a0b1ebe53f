//! Build script for fullprice
//!
//! Stamps each compilation with a sequence number and a UTC timestamp so the
//! exported data and the status tool can say which build produced them.

use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn next_build_number(counter: &Path) -> u64 {
    let previous = fs::read_to_string(counter)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);
    previous + 1
}

fn main() {
    println!("cargo:rerun-if-changed=src");

    let counter = Path::new(COUNTER_FILE);
    let build_number = next_build_number(counter);

    if let Err(e) = fs::write(counter, build_number.to_string()) {
        println!("cargo:warning=could not persist {}: {}", COUNTER_FILE, e);
    }

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=FULLPRICE_BUILD_NUMBER={}", build_number);
    println!("cargo:rustc-env=FULLPRICE_BUILD_TIMESTAMP={}", timestamp);
}
