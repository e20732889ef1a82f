use std::io::{self, IsTerminal, Write};
use clap::Args;

use crate::cli_util::RunOptions;
use crate::config::{InterpreterConfig, RunLimits};
use crate::repl::{execute_bare_once, repl_loop, select_mode, ModeFlagOverride, ReplMode};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct ReplArgs {
    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    pub bare: bool,

    /// Force interactive mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    pub editor: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

impl ReplArgs {
    pub fn mode_flag(&self) -> ModeFlagOverride {
        if self.bare {
            ModeFlagOverride::Bare
        } else if self.editor {
            ModeFlagOverride::Editor
        } else {
            ModeFlagOverride::None
        }
    }
}

/// `buffalo repl`, and `buffalo` with no subcommand.
pub fn run(program: &str, help: bool, mode_flag: ModeFlagOverride) -> i32 {
    if help {
        usage_and_exit(program, 0);
    }

    let mode = match select_mode(mode_flag) {
        Ok(m) => m,
        Err(msg) => return fail(program, &msg),
    };

    if let Err(e) = ctrlc::set_handler(exit_on_interrupt) {
        return fail(program, &format!("failed to set ctrl+c handler: {e}"));
    }

    let opts = RunOptions {
        config: InterpreterConfig::resolve(None, None),
        limits: RunLimits::resolve(None, None),
        debug: false,
        dump: false,
    };

    let result = match mode {
        ReplMode::Editor => {
            if io::stderr().is_terminal() {
                eprintln!("Buffalo REPL. Ctrl+D runs the buffer, :help lists commands, Ctrl+C quits.");
            }
            repl_loop(opts)
        }
        ReplMode::Bare => execute_bare_once(opts),
    };

    match result {
        Ok(()) => 0,
        Err(e) => fail(program, &format!("REPL error: {e}")),
    }
}

fn exit_on_interrupt() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    std::process::exit(0);
}

fn fail(program: &str, msg: &str) -> i32 {
    eprintln!("{program}: {msg}");
    let _ = io::stderr().flush();
    1
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} repl [--bare|--editor]
  {0}

Options:
  --bare        Read the whole of stdin as one program and run it once
  --editor      Line editor with highlighting (stdin must be a TTY)
  --help, -h    Show this help

Without a flag, BUFFALO_REPL_MODE=bare|editor decides; otherwise the editor
is used when stdin is a TTY.

Editor mode:
  Enter adds a line, Ctrl+D (Ctrl+Z on Windows) runs the buffer, Ctrl+C quits.
  Each run gets a fresh tape; output is followed by a newline.
  BUFFALO_REPL_ONCE=1 quits after the first run.

Meta commands (a line holding only the command):
  :exit     Quit (code 0)
  :help     List meta commands
  :reset    Bare: drop the source read so far. Editor: forget the last program
  :dump     Bare: print the source read so far. Editor: print the last program
Any other line starting with ":" is program text, as in `{0} read`.

Tape size, loop depth, timeout and step limit come from the BUFFALO_* variables
and buffalo.toml, as for `{0} read`.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
