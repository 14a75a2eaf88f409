// Example: keep only the fields you need from a large response
//
// cargo run --example filter_demo

use pooljson::{DeserializationError, DeserializeOptions, Document, Filter};

const FORECAST: &str = r#"{
    "city": {"name": "Paris", "country": "FR", "population": 2148000},
    "list": [
        {"dt": 1581498000, "main": {"temp": 3.23, "humidity": 81}, "weather": [{"main": "Clouds"}]},
        {"dt": 1581508800, "main": {"temp": 6.09, "humidity": 74}, "weather": [{"main": "Rain"}]},
        {"dt": 1581519600, "main": {"temp": 6.81, "humidity": 70}, "weather": [{"main": "Clouds"}]}
    ],
    "cnt": 3
}"#;

fn main() -> Result<(), DeserializationError> {
    // Describe the wanted shape; `true` keeps a whole subtree
    let mut filter = Document::new([0u8; 128]);
    filter.deserialize_str(
        r#"{"city": {"name": true}, "list": [{"dt": true, "main": {"temp": true}}]}"#,
        DeserializeOptions::new(),
    )?;

    let mut unfiltered = Document::new([0u8; 1024]);
    let full = unfiltered.deserialize_str(FORECAST, DeserializeOptions::new())?;

    let mut doc = Document::new([0u8; 256]);
    let options = DeserializeOptions::new().with_filter(Filter::new(filter.root()));
    let used = doc.deserialize_str(FORECAST, options)?;

    println!("Filtered: {}", doc.root());
    println!("Pool bytes: {} filtered vs {} unfiltered", used, full);

    // Array filters are positional: only the first forecast entry is kept
    for entry in doc.root().get("list").elements() {
        println!(
            "{}: {} C",
            entry.get("dt").as_int(),
            entry.get("main").get("temp").as_f64()
        );
    }
    Ok(())
}
