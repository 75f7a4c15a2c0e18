use std::fs;

fn main() {
    // Validate the built-in templates at compile time
    let templates_path = "src/templates.toml";
    println!("cargo:rerun-if-changed={}", templates_path);

    let content = fs::read_to_string(templates_path).expect("Failed to read templates.toml");

    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("Invalid templates.toml: {}", e),
    };

    match table.get("templates").and_then(|t| t.as_table()) {
        Some(templates) if templates.contains_key("custom") => {}
        _ => panic!("templates.toml must define [templates.custom]"),
    }
}
