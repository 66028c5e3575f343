//! JSON output on stdout.

use std::io::Write;

use serde::Serialize;

/// Pretty-print `value` as JSON followed by a newline.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)
}
