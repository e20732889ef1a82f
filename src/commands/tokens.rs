use clap::Args;
use std::io::{self, Write};
use crate::commands::load_source;
use crate::tokenize;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct TokensArgs {
    /// Read Buffalo source from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Source parts, joined with spaces
    #[arg(value_name = "code", trailing_var_arg = true)]
    pub code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: TokensArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let TokensArgs { file, code, .. } = args;

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

    let tokens = tokenize(&source);
    let mut out = io::stdout().lock();
    for (i, token) in tokens.iter().enumerate() {
        let written = match tokens.span(i) {
            Some(span) => writeln!(out, "{i:>4}  {:>5}..{:<5}  {token}", span.start, span.end),
            None => writeln!(out, "{i:>4}  {token}"),
        };
        if written.is_err() {
            return 1;
        }
    }
    let _ = out.flush();
    0
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} tokens "<code>"
  {0} tokens --file <PATH>

Options:
  --file,  -f <PATH>  Read Buffalo source from PATH instead of positional "<code>"
  --help,  -h         Show this help

Description:
  Prints the token stream one token per line: index, source byte range, token.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
