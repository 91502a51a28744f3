use std::path::Path;

use pdflayer::{ExtractOptions, Pdf};

/// Print a fatal error to stderr and map it to exit code 1.
pub fn fail(err: impl std::fmt::Display) -> i32 {
    eprintln!("Error: {err}");
    1
}

/// Fail early with a friendly message when `file` does not exist.
pub fn ensure_exists(file: &Path) -> Result<(), i32> {
    if file.exists() {
        Ok(())
    } else {
        Err(fail(format_args!("file not found: {}", file.display())))
    }
}

/// Open a PDF file with user-friendly error messages.
pub fn open_pdf(file: &Path, options: ExtractOptions) -> Result<Pdf, i32> {
    ensure_exists(file)?;
    Pdf::open_file(file, Some(options)).map_err(fail)
}

/// Print `value` as compact or pretty JSON on stdout.
pub fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), i32> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    let out = out.map_err(fail)?;
    println!("{out}");
    Ok(())
}
