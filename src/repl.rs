use std::env;
use std::io::{self, IsTerminal, Write};
use reedline::{Signal, DefaultPrompt, DefaultPromptSegment, HistoryItem, Highlighter, StyledText};
use nu_ansi_term::{Color, Style};
use crate::cli_util::{self, RunOptions};
use crate::{tokenize, TokenKind};

/// Commands recognised on lines starting with `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Help,
    Reset,
    Dump,
}

/// Parse a meta command line. Anything other than the four known commands is
/// `None`; `:` is ordinary comment text to the tokenizer, so such lines stay
/// part of the program.
pub fn parse_meta(line: &str) -> Option<MetaCommand> {
    let cmd = line.trim().strip_prefix(':')?;
    match cmd.trim() {
        "exit" | "quit" => Some(MetaCommand::Exit),
        "help" => Some(MetaCommand::Help),
        "reset" => Some(MetaCommand::Reset),
        "dump" => Some(MetaCommand::Dump),
        _ => None,
    }
}

/// A `:word` line that is not a meta command, most likely a typo.
fn misspelled_meta(line: &str) -> Option<&str> {
    let word = line.trim().strip_prefix(':')?;
    let looks_like_command = !word.is_empty() && word.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    (looks_like_command && parse_meta(line).is_none()).then_some(word)
}

fn warn_if_misspelled(line: &str) {
    if let Some(word) = misspelled_meta(line) {
        eprintln!("note: :{word} is not a meta command; kept as program text (try :help)");
        let _ = io::stderr().flush();
    }
}

fn print_meta_help(mode: ReplMode) {
    let (reset, dump) = match mode {
        ReplMode::Bare => ("Drop the source read so far", "Print the source read so far to stdout"),
        ReplMode::Editor => ("Forget the last executed program", "Print the last executed program to stdout"),
    };
    eprintln!(
        r#"Meta commands (a line holding only the command)
  :exit            Exit immediately (code 0)
  :help            Show this help
  :reset           {reset}
  :dump            {dump}
Other lines starting with ":" are program text."#
    );
    let _ = io::stderr().flush();
}

fn once_requested() -> bool {
    env::var("BUFFALO_REPL_ONCE").ok().as_deref() == Some("1")
}

/// What editor mode keeps between submissions. Each submission is a whole
/// program, so `:reset` and `:dump` act on the last one that was executed.
#[derive(Debug, Default)]
struct EditorSession {
    last: String,
}

impl EditorSession {
    /// Apply a meta command; `false` means the session should end.
    fn meta<W: Write>(&mut self, cmd: MetaCommand, out: &mut W) -> io::Result<bool> {
        match cmd {
            MetaCommand::Exit => return Ok(false),
            MetaCommand::Help => print_meta_help(ReplMode::Editor),
            MetaCommand::Reset => self.last.clear(),
            MetaCommand::Dump if self.last.is_empty() => {}
            MetaCommand::Dump => {
                writeln!(out, "{}", self.last)?;
                out.flush()?;
            }
        }
        Ok(true)
    }
}

pub fn repl_loop(opts: RunOptions) -> io::Result<()> {
    let mut editor = init_line_editor()?;
    let mut session = EditorSession::default();

    loop {
        let Some(submission) = read_submission_interactive(&mut editor)? else {
            // EOF or editor closed. End the session cleanly to avoid hanging when stdin is closed
            println!();
            io::stdout().flush()?;
            return Ok(());
        };

        let trimmed = submission.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_meta(trimmed) {
            Some(cmd) => {
                if !session.meta(cmd, &mut io::stdout())? {
                    return Ok(());
                }
            }
            None => {
                warn_if_misspelled(trimmed);
                session.last = trimmed.to_string();
                if tokenize(trimmed).has_instructions() {
                    cli_util::execute_source(None, trimmed, opts);
                }
                if once_requested() {
                    return Ok(());
                }
            }
        }
    }
}

fn init_line_editor() -> io::Result<reedline::Reedline> {
    use reedline::{
        default_emacs_keybindings, EditCommand, Emacs, FileBackedHistory, KeyCode, KeyModifiers,
        Reedline, ReedlineEvent,
    };

    // Start from default emacs-like bindings and adjust:
    // - Enter -> InsertNewLine (do not submit)
    // - Ctrl+D -> Submit
    // - Ctrl+Z -> Submit (for Windows)
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Edit(vec![EditCommand::InsertNewline]));
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('z'), ReedlineEvent::Submit);

    // Up/down move within the current multiline buffer; Alt/Ctrl+Up/Down browse history.
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Down, ReedlineEvent::NextHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Down, ReedlineEvent::NextHistory);

    let history = FileBackedHistory::new(1_000)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(BuffaloHighlighter::new_catppuccin_mocha()))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

pub fn read_submission<R: io::BufRead>(stdin: &mut R) -> Option<String> {
    let mut buffer = String::new();
    match stdin.read_to_string(&mut buffer) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buffer),
    }
}

fn read_submission_interactive(editor: &mut reedline::Reedline) -> io::Result<Option<String>> {
    let prompt = DefaultPrompt::new(DefaultPromptSegment::Basic("buffalo".to_string()), DefaultPromptSegment::Empty);

    match editor.read_line(&prompt) {
        Ok(Signal::Success(buffer)) => {
            // One history item per submitted program
            if !buffer.trim().is_empty() {
                let _ = editor.history_mut().save(HistoryItem::from_command_line(buffer.clone()));
            }
            Ok(Some(buffer))
        }
        Ok(Signal::CtrlC) => Ok(None),
        Ok(Signal::CtrlD) => Ok(None),
        Err(e) => {
            eprintln!("repl: editor error: {e}");
            let _ = io::stderr().flush();
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    select_mode_with(flag, env::var("BUFFALO_REPL_MODE").ok(), io::stdin().is_terminal())
}

fn select_mode_with(flag: ModeFlagOverride, env_mode: Option<String>, stdin_tty: bool) -> Result<ReplMode, String> {
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !stdin_tty {
                return Err("cannot start editor: stdin is not a TTY (use --bare or BUFFALO_REPL_MODE=bare)".to_string());
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    if let Some(val) = env_mode {
        return match val.trim().to_ascii_lowercase().as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" if stdin_tty => Ok(ReplMode::Editor),
            "editor" => Err("cannot start editor: stdin is not a TTY (use BUFFALO_REPL_MODE=bare)".to_string()),
            _ => Err(format!("invalid BUFFALO_REPL_MODE value: {val}, must be 'bare' or 'editor'")),
        };
    }

    if stdin_tty { Ok(ReplMode::Editor) } else { Ok(ReplMode::Bare) }
}

/// Result of splitting a bare-mode script into source and meta commands.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BareScript {
    /// Source left in the buffer when input ended.
    pub source: String,
    /// True when `:exit` was seen; nothing after it runs.
    pub exited: bool,
}

/// Apply meta commands line by line. `:dump` writes the buffer so far to `out`.
pub fn process_bare_input<W: Write>(input: &str, out: &mut W) -> io::Result<BareScript> {
    let mut script = BareScript::default();

    for line in input.split_inclusive('\n') {
        match parse_meta(line) {
            None => {
                warn_if_misspelled(line);
                script.source.push_str(line);
            }
            Some(MetaCommand::Exit) => {
                script.exited = true;
                break;
            }
            Some(MetaCommand::Help) => print_meta_help(ReplMode::Bare),
            Some(MetaCommand::Reset) => script.source.clear(),
            Some(MetaCommand::Dump) => {
                writeln!(out, "{}", script.source.trim_end())?;
                out.flush()?;
            }
        }
    }

    Ok(script)
}

/// Bare mode: read stdin until EOF, apply meta commands, execute once.
pub fn execute_bare_once(opts: RunOptions) -> io::Result<()> {
    let mut locked = io::BufReader::new(io::stdin().lock());
    let Some(input) = read_submission(&mut locked) else { return Ok(()) };

    let script = process_bare_input(&input, &mut io::stdout())?;
    if script.exited {
        return Ok(());
    }

    let trimmed = script.source.trim();
    if !trimmed.is_empty() && tokenize(trimmed).has_instructions() {
        cli_util::execute_source(None, trimmed, opts);
    }
    Ok(())
}

struct BuffaloHighlighter {
    word_upper: Style,
    word_lower: Style,
    output: Style,
    loop_delim: Style,
    comment: Style,
    pending: Style,
}

impl BuffaloHighlighter {
    fn new_catppuccin_mocha() -> Self {
        // Catppuccin Mocha accents
        let green = Color::Rgb(166, 227, 161);
        let red = Color::Rgb(243, 139, 168);
        let yellow = Color::Rgb(249, 226, 175);
        let mauve = Color::Rgb(203, 166, 247);
        let overlay1 = Color::Rgb(127, 132, 156);
        let surface2 = Color::Rgb(108, 112, 134);

        Self {
            word_upper: Style::new().fg(green).bold(),
            word_lower: Style::new().fg(red).bold(),
            output: Style::new().fg(yellow).bold(),
            loop_delim: Style::new().fg(mauve).bold(),
            comment: Style::new().fg(overlay1).italic(),
            pending: Style::new().fg(surface2),
        }
    }

    fn style_for(&self, kind: TokenKind) -> Style {
        match kind {
            TokenKind::WordUpper => self.word_upper,
            TokenKind::WordLower => self.word_lower,
            TokenKind::Output => self.output,
            TokenKind::LoopBegin | TokenKind::LoopEnd => self.loop_delim,
            TokenKind::Comment => self.comment,
        }
    }

    /// Split `line` into styled segments using the tokenizer's spans.
    fn segments<'a>(&self, line: &'a str) -> Vec<(Style, &'a str)> {
        let program = tokenize(line);
        let mut out = Vec::new();
        let mut cursor = 0;

        for (i, token) in program.iter().enumerate() {
            let Some(span) = program.span(i) else { continue };
            if span.start > cursor {
                out.push((self.pending, &line[cursor..span.start]));
            }
            out.push((self.style_for(token.kind()), &line[span.clone()]));
            cursor = span.end;
        }
        if cursor < line.len() {
            out.push((self.pending, &line[cursor..]));
        }
        out
    }
}

impl Highlighter for BuffaloHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        for (style, text) in self.segments(line) {
            styled.push((style, text.to_string()));
        }
        styled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_submission_reads_until_eof_multiple_lines() {
        let input = b"Buffalo\nBuffalo.\n";
        let mut cursor = Cursor::new(&input[..]);
        let got = read_submission(&mut cursor);
        assert_eq!(got.as_deref(), Some("Buffalo\nBuffalo.\n"));
    }

    #[test]
    fn read_submission_empty_returns_none() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let got = read_submission(&mut cursor);
        assert!(got.is_none());
    }

    #[test]
    fn meta_commands_parse() {
        assert_eq!(parse_meta(":exit\n"), Some(MetaCommand::Exit));
        assert_eq!(parse_meta("  :help"), Some(MetaCommand::Help));
        assert_eq!(parse_meta(":bogus"), None);
        assert_eq!(parse_meta("Buffalo :exit"), None);
        assert_eq!(parse_meta(":: Buffalo Buffalo."), None);
    }

    #[test]
    fn only_bare_words_are_flagged_as_misspelled_commands() {
        assert_eq!(misspelled_meta(":exti"), Some("exti"));
        assert_eq!(misspelled_meta(":dump"), None);
        assert_eq!(misspelled_meta(":: Buffalo Buffalo."), None);
        assert_eq!(misspelled_meta("Buffalo"), None);
    }

    #[test]
    fn bare_input_applies_reset_and_exit() {
        let mut out = Vec::new();
        let script = process_bare_input("buffalo\n:reset\nBuffalo Buffalo.\n:dump\n", &mut out).unwrap();
        assert_eq!(script.source, "Buffalo Buffalo.\n");
        assert!(!script.exited);
        assert_eq!(String::from_utf8(out).unwrap(), "Buffalo Buffalo.\n");

        let script = process_bare_input("Buffalo\n:exit\nBuffalo.\n", &mut Vec::new()).unwrap();
        assert!(script.exited);
        assert_eq!(script.source, "Buffalo\n");
    }

    #[test]
    fn editor_dump_and_reset_act_on_the_last_program() {
        let mut session = EditorSession { last: "Buffalo Buffalo.".to_string() };
        let mut out = Vec::new();
        assert!(session.meta(MetaCommand::Dump, &mut out).unwrap());
        assert!(session.meta(MetaCommand::Reset, &mut out).unwrap());
        assert!(session.meta(MetaCommand::Dump, &mut out).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "Buffalo Buffalo.\n");
        assert!(!session.meta(MetaCommand::Exit, &mut Vec::new()).unwrap());
    }

    #[test]
    fn colon_lines_that_are_not_commands_stay_in_the_source() {
        let input = ":: Buffalo Buffalo.\n: note (\n:reset me\n";
        let script = process_bare_input(input, &mut Vec::new()).unwrap();
        assert_eq!(script.source, input);
        assert!(!script.exited);
    }

    #[test]
    fn mode_flags_override_env_and_tty() {
        assert_eq!(select_mode_with(ModeFlagOverride::Bare, Some("editor".into()), true), Ok(ReplMode::Bare));
        assert!(select_mode_with(ModeFlagOverride::Editor, None, false).is_err());
        assert_eq!(select_mode_with(ModeFlagOverride::None, Some("BARE".into()), true), Ok(ReplMode::Bare));
        assert!(select_mode_with(ModeFlagOverride::None, Some("vim".into()), true).is_err());
        assert_eq!(select_mode_with(ModeFlagOverride::None, None, true), Ok(ReplMode::Editor));
        assert_eq!(select_mode_with(ModeFlagOverride::None, None, false), Ok(ReplMode::Bare));
    }

    #[test]
    fn highlighter_segments_cover_the_whole_line() {
        let h = BuffaloHighlighter::new_catppuccin_mocha();
        let line = "  say Buffalo (buffalo) . tail";
        let segments = h.segments(line);
        let rebuilt: String = segments.iter().map(|(_, t)| *t).collect();
        assert_eq!(rebuilt, line);
        assert!(segments.iter().any(|(s, t)| *t == "Buffalo" && *s == h.word_upper));
        assert_eq!(segments.last().map(|(_, t)| *t), Some(" tail"));
    }
}
