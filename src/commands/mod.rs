use std::fs;
use std::io::{self, Write};

pub mod read;
pub mod repl;
pub mod tokens;

/// Load program source from `--file` or from positional parts joined with spaces.
/// On failure the error is already printed and the exit code is returned.
pub(crate) fn load_source(program: &str, file: Option<String>, code: Vec<String>) -> Result<String, i32> {
    match file {
        Some(path) => fs::read_to_string(&path).map_err(|e| {
            eprintln!("{program}: failed to read source file as UTF-8: {e}");
            let _ = io::stderr().flush();
            1
        }),
        None => Ok(code.join(" ")),
    }
}
