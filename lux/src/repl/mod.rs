//! REPL (Read-Eval-Print Loop) for LUX

use crate::config::Config;
use crate::error::report_error;
use crate::interp::Interpreter;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const CONTINUATION_PROMPT: &str = ". ";
const HISTORY_FILE: &str = ".lux_history";

/// What happened to a line handed to [`Repl::feed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// Every buffered statement ran
    Done,
    /// The buffer ends inside a statement; more input is needed
    NeedMore,
    /// A statement failed and the buffer was discarded
    Failed,
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    interpreter: Interpreter,
    history_path: Option<PathBuf>,
    /// Lines of a statement that is not finished yet
    pending: String,
}

impl Repl {
    /// Create a new REPL
    pub fn new(config: &Config) -> RlResult<Self> {
        let mut repl = Repl {
            editor: DefaultEditor::new()?,
            interpreter: Interpreter::new(config),
            history_path: dirs_home().map(|h| h.join(HISTORY_FILE)),
            pending: String::new(),
        };

        if let Some(ref path) = repl.history_path
            && repl.editor.load_history(path).is_err()
        {
            log::debug!("no history at {}", path.display());
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("LUX {}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            let prompt = if self.pending.is_empty() { PROMPT } else { CONTINUATION_PROMPT };
            match self.editor.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() && self.pending.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(trimmed);

                    if self.pending.is_empty() && trimmed.starts_with(':') {
                        if self.handle_command(trimmed) {
                            break;
                        }
                        continue;
                    }

                    self.feed(&line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    self.pending.clear();
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path
            && let Err(e) = self.editor.save_history(path)
        {
            log::warn!("cannot save history to {}: {e}", path.display());
        }

        Ok(())
    }

    /// Appends `line` to the buffer and runs it once it holds complete
    /// statements
    pub fn feed(&mut self, line: &str) -> Feed {
        self.pending.push_str(line);
        self.pending.push('\n');

        match self.interpreter.run_source(&self.pending) {
            Ok(()) => {
                self.pending.clear();
                Feed::Done
            }
            Err(e) if e.is_incomplete() => Feed::NeedMore,
            Err(e) => {
                report_error("<repl>", &self.pending, &e);
                self.pending.clear();
                Feed::Failed
            }
        }
    }

    /// Handle REPL commands (starting with :)
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                self.print_help();
                false
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            ":symbols" | ":s" => {
                for line in self.symbol_lines() {
                    println!("{line}");
                }
                false
            }
            ":stats" => {
                for line in self.stats_lines() {
                    println!("{line}");
                }
                false
            }
            ":marks" => {
                let marks = self.interpreter.symbols().marks();
                println!(
                    "{} of {} marks in use, {} dropped, compile depth {}",
                    marks.len(),
                    marks.capacity(),
                    marks.dropped(),
                    self.interpreter.symbols().compile_depth()
                );
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    fn symbol_lines(&self) -> Vec<String> {
        let symbols = self.interpreter.symbols();
        symbols.dump().iter().map(|info| symbols.describe(info.handle)).collect()
    }

    fn stats_lines(&self) -> Vec<String> {
        let stats = self.interpreter.symbols().stats();
        let mut lines: Vec<String> = stats
            .ranges
            .iter()
            .map(|r| format!("{:<16} {:>6} / {:<6} next {}", r.range.name(), r.live, r.capacity, r.cursor))
            .collect();
        for (class, count) in &stats.classes {
            lines.push(format!("{:<16} {count:>6}", class.name()));
        }
        lines.push(format!("marks {} (dropped {}), pending {}", stats.marks, stats.marks_dropped, stats.pending));
        lines
    }

    /// Print help message
    fn print_help(&self) {
        println!("LUX REPL Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit the REPL");
        println!("  :clear          Clear the screen");
        println!("  :symbols, :s    List live symbols");
        println!("  :stats          Show arena usage per range and class");
        println!("  :marks          Show the temporary mark stack");
        println!();
        println!("You can enter:");
        println!("  - Assignments: x = indgen(5) * 2");
        println!("  - Statements: print, x(1:3)");
        println!("  - Definitions: func sq(n) ... endfunc (continued over several lines)");
        println!("  - Includes: @file");
    }
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var_os("USERPROFILE").map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl() -> Repl {
        let config = Config::default();
        let mut repl = Repl::new(&config).unwrap();
        repl.interpreter = Interpreter::capturing(&config);
        repl
    }

    #[test]
    fn test_handle_command_quit() {
        let mut repl = repl();
        assert!(repl.handle_command(":quit"));
        assert!(repl.handle_command(":q"));
        assert!(repl.handle_command(":exit"));
    }

    #[test]
    fn test_handle_command_non_quitting() {
        let mut repl = repl();
        for cmd in [":help", ":clear", ":symbols", ":stats", ":marks", ":bogus"] {
            assert!(!repl.handle_command(cmd), "{cmd} should not quit");
        }
    }

    #[test]
    fn test_feed_single_line() {
        let mut repl = repl();
        assert_eq!(repl.feed("print, 6 * 7"), Feed::Done);
        assert_eq!(repl.interpreter.take_output(), vec!["42"]);
        assert!(repl.pending.is_empty());
    }

    #[test]
    fn test_feed_accumulates_routine() {
        let mut repl = repl();
        assert_eq!(repl.feed("func twice(n)"), Feed::NeedMore);
        assert_eq!(repl.feed("  return, n * 2"), Feed::NeedMore);
        assert_eq!(repl.feed("endfunc"), Feed::Done);
        assert_eq!(repl.feed("print, twice(21)"), Feed::Done);
        assert_eq!(repl.interpreter.take_output(), vec!["42"]);
    }

    #[test]
    fn test_feed_error_clears_buffer() {
        let mut repl = repl();
        assert_eq!(repl.feed("print, nosuch"), Feed::Failed);
        assert!(repl.pending.is_empty());
        assert_eq!(repl.feed("print, 1"), Feed::Done);
    }

    #[test]
    fn test_symbol_lines_lists_variables() {
        let mut repl = repl();
        repl.feed("answer = 42");
        let lines = repl.symbol_lines();
        assert!(lines.iter().any(|l| l.contains("ANSWER") && l.ends_with("42")), "{lines:?}");
    }

    #[test]
    fn test_stats_lines_cover_every_range() {
        let repl = repl();
        let lines = repl.stats_lines();
        for range in crate::symbol::RangeKind::ALL {
            assert!(lines.iter().any(|l| l.starts_with(range.name())), "{range:?}");
        }
    }

    #[test]
    fn test_dirs_home_returns_some() {
        // HOME or USERPROFILE is normally set
        assert!(dirs_home().is_some());
    }
}
