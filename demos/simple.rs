//! Encoding plain structs with field tags.
//!
//! Run with: cargo run --example simple

use jsonplan::{reflect_struct, to_string, to_string_pretty, EncodeOptions};
use serde::Deserialize;
use std::error::Error;

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: String,
    #[serde(default)]
    nickname: Option<String>,
}

reflect_struct!(User {
    id: u32,
    name: String,
    email: String,
    nickname: Option<String> = "nickname,omitempty",
});

fn main() -> Result<(), Box<dyn Error>> {
    let users = vec![
        User {
            id: 42,
            name: "Alice Johnson".to_string(),
            email: "alice@example.com".to_string(),
            nickname: Some("ali".to_string()),
        },
        User {
            id: 43,
            name: "Bob Smith".to_string(),
            email: "bob@example.com".to_string(),
            nickname: None,
        },
    ];

    let json = to_string(&users)?;
    println!("Compact:\n{}\n", json);
    println!("Pretty:\n{}\n", to_string_pretty(&users)?);

    let fastest = jsonplan::to_string_with_options(&users, &EncodeOptions::fastest())?;
    println!("Fastest preset:\n{}\n", fastest);

    // Any JSON reader accepts the output.
    let users_back: Vec<User> = serde_json::from_str(&json)?;
    assert_eq!(users, users_back);
    println!("✓ serde_json decodes the output");

    println!("Structural hash: {:016x}", jsonplan::hash(&users));

    Ok(())
}
