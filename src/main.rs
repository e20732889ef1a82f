use buffalo_lang::commands::{read, repl, tokens};
use buffalo_lang::repl::ModeFlagOverride;
use clap::{Parser, Subcommand};
use std::env;
use std::io::{self, Write};

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} read   [--debug|-d] [--dump] "<code>"       # Run Buffalo source (args are joined with spaces)
  {0} read   [--debug|-d] [--dump] --file <PATH>  # Run Buffalo source loaded from file
  {0} tokens "<code>" | --file <PATH>             # Print the token stream
  {0} repl   [--bare|--editor]                    # Start a Buffalo REPL (read-eval-print loop)
  {0}                                             # Same as `repl`

Run "{0} <subcommand> --help" for more info.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "buffalo", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Read(read::ReadArgs),
    Tokens(tokens::TokensArgs),
    Repl(repl::ReplArgs),
}

fn main() {
    // Program name is only used for help and error prefixes
    let program = env::args().next().unwrap_or_else(|| String::from("buffalo"));

    let cli = Cli::parse();

    if cli.help {
        print_top_usage_and_exit(&program, 0);
    }

    let code = match cli.command {
        Some(Command::Read(args)) => read::run(&program, args),
        Some(Command::Tokens(args)) => tokens::run(&program, args),
        Some(Command::Repl(args)) => {
            let mode = args.mode_flag();
            repl::run(&program, args.help, mode)
        }
        None => repl::run(&program, false, ModeFlagOverride::None),
    };

    std::process::exit(code);
}
