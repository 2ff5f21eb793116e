//! Editing a configuration file in place.
//!
//! Run with: cargo run --example edit_config

use bearml::Document;
use std::error::Error;

const SOURCE: &str = "\
# where the service listens
[p]
port:    8080

>> database <<
  # connection string
  url: postgres://db:5432/app
  replicas:
    - db-1
    - db-2
";

fn main() -> Result<(), Box<dyn Error>> {
    let mut doc = Document::parse(SOURCE)?;

    let port: u16 = doc.get_value(&[], "p")?;
    println!("port = {port}");

    doc.change_value(&[], "port", &9090)?;
    doc.change_comment(&["database"], "url", "primary database")?;
    doc.add_key_value(&["database"], "timeout", &30)?;

    println!("Edited document:\n{doc}");

    let reparsed = Document::parse(&doc.to_string())?;
    assert_eq!(reparsed.get_value::<u16>(&[], "port")?, 9090);
    assert_eq!(reparsed.get_value::<u32>(&["database"], "timeout")?, 30);
    println!("✓ Round-trip successful");

    Ok(())
}
