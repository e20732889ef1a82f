use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use crate::config::{InterpreterConfig, RunLimits};
use crate::{tokenize, BuffaloError, Execution, Interpreter, Program, StepControl};

// Loop frames recurse; give deeply nested programs room before the depth guard trips.
const WORKER_STACK_BYTES: usize = 64 * 1024 * 1024;

/// How a source buffer should be executed by [`execute_source`].
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub config: InterpreterConfig,
    pub limits: RunLimits,
    pub debug: bool,
    pub dump: bool,
}

/// Tokenize and run `source` on a worker thread with cooperative cancellation.
/// - Program output bytes stream to stdout as they are produced.
/// - Errors and abort messages go to stderr.
/// - A newline is always written to stdout afterwards so the next prompt or
///   shell line starts at column 0.
///
/// Returns the process exit code: 0 on success, 1 on any failure.
pub fn execute_source(program: Option<&str>, source: &str, opts: RunOptions) -> i32 {
    let tokens = tokenize(source);

    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<(Result<(), BuffaloError>, Execution)>();
    let tokens_owned = tokens.clone();
    let cancel_clone = cancel.clone();
    let RunOptions { config, limits, debug, dump } = opts;

    let spawned = thread::Builder::new()
        .name("buffalo-run".to_string())
        .stack_size(WORKER_STACK_BYTES)
        .spawn(move || {
            let mut interpreter = Interpreter::with_config(tokens_owned, config);
            interpreter.set_output_sink(|bytes| {
                let mut out = io::stdout().lock();
                let _ = out.write_all(bytes);
                let _ = out.flush();
            });
            let ctrl = StepControl::new(limits.max_steps, cancel_clone);
            let res = if debug {
                interpreter.run_debug_with_control(ctrl)
            } else {
                interpreter.run_with_control(ctrl)
            };
            let _ = tx.send((res, interpreter.into_execution()));
        });

    if let Err(e) = spawned {
        let msg = format!("failed to start interpreter thread: {e}");
        match program {
            Some(p) => eprintln!("{p}: {msg}"),
            None => eprintln!("{msg}"),
        }
        let _ = io::stderr().flush();
        return 1;
    }

    let timeout = Duration::from_millis(limits.timeout_ms);
    let exit_code = match rx.recv_timeout(timeout) {
        Ok((result, execution)) => {
            let code = match result {
                Ok(()) => 0,
                Err(BuffaloError::Canceled) => {
                    eprintln!("Execution aborted: wall-clock timeout exceeded ({} ms)", limits.timeout_ms);
                    1
                }
                Err(err) => {
                    print_run_error(program, source, &tokens, &err);
                    1
                }
            };
            if dump {
                print_state_dump(&execution);
            }
            code
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.store(true, Ordering::Relaxed);
            eprintln!("Execution aborted: wall-clock timeout exceeded ({} ms)", limits.timeout_ms);
            1
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let msg = "interpreter thread stopped without reporting a result";
            match program {
                Some(p) => eprintln!("{p}: {msg}"),
                None => eprintln!("{msg}"),
            }
            1
        }
    };
    let _ = io::stderr().flush();

    println!();
    let _ = io::stdout().flush();
    exit_code
}

/// Pretty-print a run error with caret positioning under the offending token.
/// If `program` is `Some("buffalo")`, prefix messages with "buffalo: ..." for CLI read mode
pub fn print_run_error(program: Option<&str>, source: &str, tokens: &Program, err: &BuffaloError) {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    match err {
        BuffaloError::UnmatchedLoopEnd { ip } => {
            let msg = prefix_program("Runtime error: unmatched loop end ')'");
            print_error_with_context(&msg, source, tokens, *ip);
        }
        BuffaloError::LoopDepthExceeded { ip, limit } => {
            let msg = prefix_program(&format!("Runtime error: loop nesting exceeds {limit} levels"));
            print_error_with_context(&msg, source, tokens, *ip);
        }
        BuffaloError::MemoryAllocation { .. } => {
            eprintln!("{}", prefix_program(&format!("Configuration error: {err}")));
            let _ = io::stderr().flush();
        }
        BuffaloError::StepLimitExceeded { .. } | BuffaloError::Canceled => {
            eprintln!("{}", prefix_program(&err.to_string()));
            let _ = io::stderr().flush();
        }
    }
}

/// Print a concise error with token index and, when the token's source span
/// is known, a caret context window, working with UTF-8 by slicing using char
/// indices.
pub fn print_error_with_context(prefix: &str, source: &str, tokens: &Program, ip: usize) {
    eprintln!("{prefix} at token {ip}");

    let Some(span) = tokens.span(ip) else {
        let _ = io::stderr().flush();
        return;
    };
    let pos = source.get(..span.start).map_or(0, |s| s.chars().count());

    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let total_chars = source.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let start_byte = char_to_byte_index(source, start_char);
    let end_byte = char_to_byte_index(source, end_char);
    // Newlines would break the caret alignment
    let slice: String = source[start_byte..end_byte]
        .chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect();

    eprintln!("  {}", slice);

    let caret_offset_chars = pos.saturating_sub(start_char);
    eprintln!("  {}^", " ".repeat(caret_offset_chars));
    let _ = io::stderr().flush();
}

/// Print final pointer and every non-zero cell to stderr.
pub fn print_state_dump(execution: &Execution) {
    eprintln!("pointer: {}", execution.pointer);
    let cells: Vec<String> = execution
        .memory
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0)
        .map(|(i, v)| format!("[{i}]={v}"))
        .collect();
    if cells.is_empty() {
        eprintln!("memory: all {} cells are 0", execution.memory.len());
    } else {
        eprintln!("memory: {}", cells.join(" "));
    }
    let _ = io::stderr().flush();
}

/// Convert a char index into a byte index in the given UTF-8 string.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map_or(s.len(), |(byte_idx, _)| byte_idx)
}
