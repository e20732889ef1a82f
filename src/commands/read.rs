use clap::Args;
use std::io::{self, Write};
use crate::cli_util::{execute_source, RunOptions};
use crate::commands::load_source;
use crate::config::{InterpreterConfig, RunLimits};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct ReadArgs {
    /// Print a step-by-step table of operations instead of producing output
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Print the final pointer and non-zero memory cells to stderr
    #[arg(long = "dump")]
    pub dump: bool,

    /// Read Buffalo source from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Source parts, joined with spaces
    #[arg(value_name = "code", trailing_var_arg = true)]
    pub code: Vec<String>,

    /// Tape length in cells (fallback BUFFALO_MEMORY_SIZE, then buffalo.toml; default 256)
    #[arg(long = "memory-size", value_name = "N")]
    pub memory_size: Option<usize>,

    /// Maximum loop nesting depth, 0 for unlimited (fallback BUFFALO_MAX_LOOP_DEPTH; default 2500)
    #[arg(long = "max-loop-depth", value_name = "N")]
    pub max_loop_depth: Option<usize>,

    /// Wall-clock timeout in milliseconds (fallback BUFFALO_TIMEOUT_MS; default 2_000)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps before abort (fallback BUFFALO_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<usize>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: ReadArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let ReadArgs {
        debug,
        dump,
        file,
        code,
        memory_size,
        max_loop_depth,
        timeout_ms,
        max_steps,
        ..
    } = args;

    if file.is_none() && code.is_empty() {
        usage_and_exit(program, 2);
    }

    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let source = match load_source(program, file, code) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let opts = RunOptions {
        config: InterpreterConfig::resolve(memory_size, max_loop_depth),
        limits: RunLimits::resolve(timeout_ms, max_steps),
        debug,
        dump,
    };

    execute_source(Some(program), &source, opts)
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} read [--debug|-d] [--dump] "<code>"
  {0} read [--debug|-d] [--dump] --file <PATH>

Options:
  --file,  -f <PATH>      Read Buffalo source from PATH instead of positional "<code>"
  --debug, -d             Print a step-by-step table of operations instead of producing output
  --dump                  Print the final pointer and non-zero cells to stderr
  --memory-size <N>       Tape length in cells (default 256, at most 16777216)
  --max-loop-depth <N>    Maximum loop nesting, 0 for unlimited (default 2500)
  --timeout <MS>          Wall-clock timeout in milliseconds (default 2000)
  --max-steps <N>         Abort after N tokens have been executed
  --help,  -h             Show this help

Notes:
- `Buffalo Buffalo` increments the current cell, `buffalo buffalo` decrements it.
- `buffalo Buffalo` moves right, `Buffalo buffalo` moves left.
- `.` prints the current cell; `(` ... `)` repeats while the cell tested at `(` is non-zero.
- Any other text is a comment. Text after the last recognised token is ignored.

Examples:
- Print byte 2:
    {0} read "Buffalo Buffalo Buffalo Buffalo."
- Load a program from a file:
    {0} read --file ./program.buf
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
