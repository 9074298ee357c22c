//! Working with Value and dynamic collections.
//!
//! Run with: cargo run --example dynamic_values

use chrono::{TimeZone, Utc};
use jsonplan::{hash, json, to_string, to_string_pretty, Map, Reflect, Value};
use num_bigint::BigInt;
use std::collections::HashMap;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let config = json!({
        "host": "localhost",
        "port": 8080,
        "features": ["auth", "logging", "metrics"],
        "debug": true
    });

    println!("Config:\n{}\n", to_string_pretty(&config)?);

    if let Value::Object(obj) = &config {
        if let Some(Value::String(host)) = obj.get("host") {
            println!("Accessing field 'host': {}", host);
        }
        if let Some(port) = obj.get("port").and_then(Value::as_i64) {
            println!("Accessing field 'port': {}", port);
        }
    }

    // Timestamps and big integers are encoded as themselves.
    let mut event = Map::new();
    event.insert(
        "at".to_string(),
        Value::from(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().ok_or("bad date")?),
    );
    event.insert(
        "total".to_string(),
        Value::from(BigInt::from(u64::MAX) * 1000),
    );
    println!("Event: {}\n", to_string(&Value::Object(event))?);

    // Heterogeneous values resolve their concrete type on every encode.
    let row: Vec<Box<dyn Reflect>> = vec![Box::new(1u8), Box::new("two".to_string()), Box::new(vec![3.5f64])];
    println!("Row: {}\n", to_string(&row)?);

    // Hashes ignore object key order.
    let a = json!({ "x": 1, "y": [true] });
    let b = json!({ "y": [true], "x": 1 });
    assert_eq!(hash(&a), hash(&b));
    println!("✓ Key order does not change the hash");

    let counts: HashMap<String, u32> = [("b".to_string(), 2), ("a".to_string(), 1)].into();
    println!("Sorted map: {}", to_string(&counts)?);

    Ok(())
}
