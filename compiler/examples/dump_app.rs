//! Demonstrates compiling the reference catalog and printing a document.
//!
//! Run with: `cargo run --example dump_app -p chainform`

use chainform::{compile_with_diagnostics, samples, Member, Unit};

fn main() {
    let units = match samples::catalog() {
        Ok(units) => units,
        Err(e) => {
            eprintln!("failed to build catalog: {e}");
            std::process::exit(1);
        }
    };

    for unit in &units {
        let uri = unit.uri().map_or_else(String::new, ToString::to_string);
        let members = unit.members();
        let methods = members
            .iter()
            .filter(|(_, m)| matches!(m, Member::Method(_)))
            .count();

        println!(
            "  {:8} {:16} {:>2} members, {:>2} methods, {:>2} exports",
            unit.kind().to_string(),
            uri,
            members.len(),
            methods,
            unit.exports().len(),
        );
    }

    println!();

    // Compile the first unit and print its document in full.
    let Some(unit) = units.first() else {
        return;
    };
    match compile_with_diagnostics(unit.as_ref()) {
        Ok(compilation) => {
            for diagnostic in &compilation.diagnostics.entries {
                println!("{diagnostic}");
            }
            let json = serde_json::to_string_pretty(&compilation.document)
                .unwrap_or_else(|e| format!("JSON error: {e}"));
            println!("{} ({} bytes):", compilation.document.key(), json.len());
            println!("{json}");
        }
        Err(e) => {
            eprintln!("compile failed: {e}");
            std::process::exit(1);
        }
    }
}
