//! The Buffalo execution engine.
//!
//! A run operates on a byte tape (256 cells by default) with a single data
//! pointer and a pending-word register:
//! - Tape cells start at 0 and saturate at 0 and 255; they never wrap.
//! - The pointer saturates at both ends of the tape.
//! - Word tokens are decoded in pairs: `Buffalo Buffalo` increments the
//!   current cell, `buffalo buffalo` decrements it, `buffalo Buffalo` moves
//!   the pointer right and `Buffalo buffalo` moves it left.
//! - `.` appends the current cell to the output.
//! - `(` opens a loop testing the cell the pointer is on when it is entered;
//!   the test happens at every `)`, which repeats the body while that cell is
//!   non-zero.
//! - A `)` outside any loop is fatal.
//!
//! ```
//! use buffalo_lang::{interpret, tokenize};
//!
//! let program = tokenize("Buffalo Buffalo.");
//! let execution = interpret(&program, 256).expect("program should run");
//! assert_eq!(execution.output, vec![1]);
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::config::InterpreterConfig;
use crate::token::{Program, TokenKind};
use crate::tokenizer::tokenize;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum BuffaloError {
    /// A `)` was reached with no enclosing `(`.
    #[error("Unmatched loop end ')' at token {ip}")]
    UnmatchedLoopEnd { ip: usize },

    /// Loops were nested deeper than the configured limit.
    #[error("Loop nesting exceeds {limit} levels at token {ip}")]
    LoopDepthExceeded { ip: usize, limit: usize },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (e.g., timeout)
    #[error("Execution aborted: cancelled")]
    Canceled,

    /// The tape could not be allocated.
    #[error("cannot allocate a tape of {size} cells (limit {max})", max = MAX_MEMORY_SIZE)]
    MemoryAllocation { size: usize },
}

/// Largest tape a run will allocate.
pub const MAX_MEMORY_SIZE: usize = 1 << 24;

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// A word token as seen by the pair decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    Upper,
    Lower,
}

/// The four tape operations a word pair can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    IncrementCell,
    DecrementCell,
    AdvancePointer,
    RetreatPointer,
}

/// Which word, if any, is waiting for a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pending {
    #[default]
    Idle,
    Upper,
    Lower,
}

impl Pending {
    /// Feed one word into the register. Returns the next state and the
    /// primitive the pair fires, if the word completed a pair.
    pub fn accept(self, word: Word) -> (Pending, Option<Primitive>) {
        match (self, word) {
            (Pending::Idle, Word::Upper) => (Pending::Upper, None),
            (Pending::Idle, Word::Lower) => (Pending::Lower, None),
            (Pending::Upper, Word::Upper) => (Pending::Idle, Some(Primitive::IncrementCell)),
            (Pending::Lower, Word::Upper) => (Pending::Idle, Some(Primitive::AdvancePointer)),
            (Pending::Lower, Word::Lower) => (Pending::Idle, Some(Primitive::DecrementCell)),
            (Pending::Upper, Word::Lower) => (Pending::Idle, Some(Primitive::RetreatPointer)),
        }
    }
}

/// All state owned by a single run. Created fresh every time a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunContext {
    pub memory: Vec<u8>,
    pub pointer: usize,
    pub pending: Pending,
    pub output: Vec<u8>,
    steps: usize,
}

impl RunContext {
    /// A zeroed tape of `memory_size` cells (at least one). Sizes above
    /// [`MAX_MEMORY_SIZE`], or ones the allocator refuses, are an error.
    pub fn new(memory_size: usize) -> Result<Self, BuffaloError> {
        let size = memory_size.max(1);
        if size > MAX_MEMORY_SIZE {
            return Err(BuffaloError::MemoryAllocation { size });
        }
        let mut memory = Vec::new();
        memory
            .try_reserve_exact(size)
            .map_err(|_| BuffaloError::MemoryAllocation { size })?;
        memory.resize(size, 0);

        Ok(Self { memory, ..Self::default() })
    }

    pub fn cell(&self) -> u8 {
        self.memory[self.pointer]
    }

    /// Apply a primitive with saturating bounds.
    pub fn apply(&mut self, op: Primitive) {
        let last = self.memory.len() - 1;
        match op {
            Primitive::IncrementCell => {
                self.memory[self.pointer] = self.memory[self.pointer].saturating_add(1);
            }
            Primitive::DecrementCell => {
                self.memory[self.pointer] = self.memory[self.pointer].saturating_sub(1);
            }
            Primitive::AdvancePointer => self.pointer = (self.pointer + 1).min(last),
            Primitive::RetreatPointer => self.pointer = self.pointer.saturating_sub(1),
        }
    }
}

/// The observable result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: Vec<u8>,
    pub memory: Vec<u8>,
    pub pointer: usize,
}

impl Execution {
    /// Output decoded one byte per char (Latin-1).
    pub fn output_string(&self) -> String {
        self.output.iter().map(|&b| b as char).collect()
    }
}

/// A Buffalo interpreter bound to one program.
///
/// State from the most recent run, successful or not, stays readable through
/// [`Interpreter::output`], [`Interpreter::memory`] and [`Interpreter::pointer`].
/// The tape is allocated when a run starts; before the first run it is empty.
pub struct Interpreter {
    program: Program,
    config: InterpreterConfig,
    context: RunContext,
    debug: bool,
    control: Option<StepControl>,
    output_sink: Option<Box<dyn Fn(&[u8]) + Send + Sync>>,
}

impl Interpreter {
    /// Create an interpreter for `program` with the default 256-cell tape.
    pub fn new(program: Program) -> Self {
        Self::with_config(program, InterpreterConfig::default())
    }

    pub fn with_config(program: Program, config: InterpreterConfig) -> Self {
        Self {
            program,
            config,
            context: RunContext::default(),
            debug: false,
            control: None,
            output_sink: None,
        }
    }

    /// Tokenize `source` and bind the result.
    pub fn from_source(source: &str) -> Self {
        Self::new(tokenize(source))
    }

    /// Provide an output sink. When set, every `.` also sends its byte to this
    /// sink as it happens. Debug runs never call the sink.
    pub fn set_output_sink<F>(&mut self, sink: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.output_sink = Some(Box::new(sink));
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config(&self) -> InterpreterConfig {
        self.config
    }

    pub fn output(&self) -> &[u8] {
        &self.context.output
    }

    pub fn memory(&self) -> &[u8] {
        &self.context.memory
    }

    pub fn pointer(&self) -> usize {
        self.context.pointer
    }

    pub fn pending(&self) -> Pending {
        self.context.pending
    }

    /// Snapshot of the most recent run.
    pub fn execution(&self) -> Execution {
        Execution {
            output: self.context.output.clone(),
            memory: self.context.memory.clone(),
            pointer: self.context.pointer,
        }
    }

    pub fn into_execution(self) -> Execution {
        let RunContext { memory, pointer, output, .. } = self.context;
        Execution { output, memory, pointer }
    }

    /// Execute the program until completion.
    pub fn run(&mut self) -> Result<(), BuffaloError> {
        self.execute(false, None)
    }

    /// Debug-run the program, printing a step-by-step table of operations.
    /// State advances exactly as in a real run, but output bytes are only
    /// recorded, never sent to the sink.
    pub fn run_debug(&mut self) -> Result<(), BuffaloError> {
        self.execute(true, None)
    }

    /// Execute with cooperative cancellation and optional step limit.
    pub fn run_with_control(&mut self, step_control: StepControl) -> Result<(), BuffaloError> {
        self.execute(false, Some(step_control))
    }

    /// Debug-run with cooperative cancellation and optional step limit.
    pub fn run_debug_with_control(&mut self, step_control: StepControl) -> Result<(), BuffaloError> {
        self.execute(true, Some(step_control))
    }

    fn execute(&mut self, debug: bool, control: Option<StepControl>) -> Result<(), BuffaloError> {
        self.context = RunContext::new(self.config.memory_size)?;
        self.debug = debug;
        self.control = control;

        if debug {
            println!("STEP | IP  | PTR | CELL | TOKEN     | ACTION");
            println!("-----+-----+-----+------+-----------+------------------------------------------------");
        }

        let result = self.evaluate(0, None, 0).map(|_| ());
        self.control = None;
        result
    }

    /// Evaluate one frame starting at `start`. `loop_test` is the cell tested
    /// at `)`; `None` for the top level. Returns the position of the `)` that
    /// ended the frame, or the program length when the scan ran off the end.
    fn evaluate(&mut self, start: usize, loop_test: Option<usize>, depth: usize) -> Result<usize, BuffaloError> {
        let mut pos = start;

        while let Some(kind) = self.program.kind(pos) {
            self.tick()?;
            let before = (self.context.pointer, self.context.cell());

            match kind {
                TokenKind::LoopBegin => {
                    if let Some(limit) = self.config.max_loop_depth {
                        if depth >= limit {
                            return Err(BuffaloError::LoopDepthExceeded { ip: pos, limit });
                        }
                    }
                    let test = self.context.pointer;
                    self.trace(pos, kind, before, || format!("Enter loop testing cell[{test}]"));
                    let end = self.evaluate(pos + 1, Some(test), depth + 1)?;
                    pos = end + 1;
                    continue;
                }
                TokenKind::LoopEnd => {
                    let Some(test) = loop_test else {
                        return Err(BuffaloError::UnmatchedLoopEnd { ip: pos });
                    };
                    let value = self.context.memory[test];
                    if value == 0 {
                        self.trace(pos, kind, before, || format!("cell[{test}] is 0; exit loop"));
                        return Ok(pos);
                    }
                    self.trace(pos, kind, before, || {
                        format!("cell[{test}] is {value}; repeat from IP {start}")
                    });
                    pos = start;
                    continue;
                }
                TokenKind::Output => {
                    let byte = self.context.cell();
                    self.context.output.push(byte);
                    if self.debug {
                        self.trace(pos, kind, before, || {
                            format!("Output byte {byte} (suppressed in debug)")
                        });
                    } else if let Some(sink) = self.output_sink.as_ref() {
                        (sink)(&[byte]);
                    }
                }
                TokenKind::WordUpper => self.word(pos, kind, before, Word::Upper),
                TokenKind::WordLower => self.word(pos, kind, before, Word::Lower),
                TokenKind::Comment => self.trace(pos, kind, before, || "Comment".to_string()),
            }

            pos += 1;
        }

        Ok(self.program.len())
    }

    fn word(&mut self, pos: usize, kind: TokenKind, before: (usize, u8), word: Word) {
        let (next, fired) = self.context.pending.accept(word);
        self.context.pending = next;

        let Some(op) = fired else {
            self.trace(pos, kind, before, || format!("Pending {word:?} word"));
            return;
        };

        self.context.apply(op);
        let (ptr, cell) = (self.context.pointer, self.context.cell());
        self.trace(pos, kind, before, || match op {
            Primitive::IncrementCell => format!("Increment cell[{ptr}] from {} to {cell}", before.1),
            Primitive::DecrementCell => format!("Decrement cell[{ptr}] from {} to {cell}", before.1),
            Primitive::AdvancePointer | Primitive::RetreatPointer => {
                format!("Moved pointer head to index {ptr}")
            }
        });
    }

    fn tick(&mut self) -> Result<(), BuffaloError> {
        if let Some(ctrl) = self.control.as_ref() {
            if ctrl.cancel_flag.load(Ordering::Relaxed) {
                return Err(BuffaloError::Canceled);
            }
            if let Some(max) = ctrl.max_steps {
                if self.context.steps >= max {
                    return Err(BuffaloError::StepLimitExceeded { limit: max });
                }
            }
        }
        self.context.steps += 1;
        Ok(())
    }

    fn trace<F>(&self, pos: usize, kind: TokenKind, before: (usize, u8), action: F)
    where
        F: FnOnce() -> String,
    {
        if !self.debug {
            return;
        }
        println!(
            "{:<4} | {:<3} | {:<3} | {:<4} | {:<9} | {}",
            self.context.steps - 1,
            pos,
            before.0,
            before.1,
            format!("{kind:?}"),
            action()
        );
    }
}

/// Run `program` on a fresh tape of `memory_size` cells.
pub fn interpret(program: &Program, memory_size: usize) -> Result<Execution, BuffaloError> {
    let config = InterpreterConfig::default().with_memory_size(memory_size);
    let mut interpreter = Interpreter::with_config(program.clone(), config);
    interpreter.run()?;
    Ok(interpreter.into_execution())
}
