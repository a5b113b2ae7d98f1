//! Machine-readable output for `--format json`.

use serde::Serialize;

use crate::OutputFormat;

/// Print `value` as pretty JSON on stdout.
///
/// Text output is written by each command itself, so this only acts on
/// [`OutputFormat::Json`].
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Json = format {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        }
    }
}
