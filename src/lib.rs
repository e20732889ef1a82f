//! A Buffalo language tokenizer and interpreter.
//!
//! Buffalo programs are written with two words, `Buffalo` and `buffalo`, an
//! output symbol `.`, and loop delimiters `(` and `)`. Everything else is a
//! comment.
//!
//! Features and behaviors:
//! - Source text is segmented by matching literals at the trailing edge of an
//!   accumulating buffer; text between literals becomes trimmed comments and
//!   text after the last literal is dropped.
//! - Words are decoded in pairs into four operations: increment cell,
//!   decrement cell, move right, move left.
//! - The memory tape (default 256 cells) is initialized to 0; cells and the
//!   pointer saturate at their bounds instead of wrapping.
//! - Output `.` appends the byte at the current cell.
//! - Loops repeat while the cell under the pointer at `(` is non-zero when
//!   `)` is reached; a `)` outside any loop is a fatal error.
//!
//! Quick start:
//!
//! ```
//! use buffalo_lang::Interpreter;
//!
//! let mut interpreter = Interpreter::from_source("Buffalo Buffalo Buffalo Buffalo.");
//! interpreter.run().expect("program should run");
//! assert_eq!(interpreter.output(), &[2]);
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod interpreter;
pub mod repl;
pub mod token;
pub mod tokenizer;

pub use config::InterpreterConfig;
pub use interpreter::{
    interpret, BuffaloError, Execution, Interpreter, Pending, Primitive, RunContext, StepControl,
    Word, MAX_MEMORY_SIZE,
};
pub use token::{Program, Token, TokenKind};
pub use tokenizer::{tokenize, Tokenizer};
