//! The character-stream I/O bridge.
//!
//! The machine emits and consumes single characters, but the outside
//! world is line-oriented: output is buffered and flushed to a
//! [`LineSink`] once per completed line, input is pulled from a
//! [`LineSource`] one full line at a time and drained character by
//! character. Both collaborators are injected, so tests substitute
//! recording and scripted implementations.

use crate::machine::Word;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Receives one completed output line, without its trailing newline.
pub trait LineSink {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Produces one full input line, including its trailing newline.
pub trait LineSource {
    fn read_line(&mut self) -> io::Result<String>;
}

/// Production sink bound to the process's stdout.
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{line}")?;
        handle.flush()
    }
}

/// Production source bound to the process's stdin.
pub struct StdinSource;

impl LineSource for StdinSource {
    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let bytes = io::stdin().lock().read_line(&mut line)?;
        if bytes == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed while the machine was waiting for input",
            ));
        }
        Ok(line)
    }
}

/// The bridge between the machine's character stream and line I/O.
pub struct Console {
    sink: Box<dyn LineSink>,
    source: Box<dyn LineSource>,
    out_buf: String,
    pending: VecDeque<char>,
}

impl Console {
    /// Create a console over the given collaborators.
    pub fn new(sink: Box<dyn LineSink>, source: Box<dyn LineSource>) -> Self {
        Self {
            sink,
            source,
            out_buf: String::new(),
            pending: VecDeque::new(),
        }
    }

    /// Create a console bound to the process's standard streams.
    pub fn stdio() -> Self {
        Self::new(Box::new(StdoutSink), Box::new(StdinSource))
    }

    /// Emit one character code.
    ///
    /// Characters accumulate in the line buffer; a newline flushes the
    /// buffered content (without the newline) to the sink exactly once
    /// and clears the buffer.
    pub fn emit(&mut self, code: Word) -> io::Result<()> {
        let c = char::from_u32(u32::from(code)).unwrap_or(char::REPLACEMENT_CHARACTER);
        if c == '\n' {
            self.sink.write_line(&self.out_buf)?;
            self.out_buf.clear();
        } else {
            self.out_buf.push(c);
        }
        Ok(())
    }

    /// Yield the next input character code.
    ///
    /// Refills the pending buffer with one full line from the source
    /// when it is empty. This is the machine's only suspension point:
    /// the call blocks until the source produces a line.
    pub fn next_input_char(&mut self) -> io::Result<Word> {
        if self.pending.is_empty() {
            let line = self.source.read_line()?;
            self.pending.extend(line.chars());
        }
        let c = self.pending.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "input source returned an empty line")
        })?;
        Ok((c as u32 & 0x7FFF) as Word)
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("out_buf", &self.out_buf)
            .field("pending_chars", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingSink(Rc<RefCell<Vec<String>>>);

    impl LineSink for RecordingSink {
        fn write_line(&mut self, line: &str) -> io::Result<()> {
            self.0.borrow_mut().push(line.to_string());
            Ok(())
        }
    }

    struct ScriptedSource(VecDeque<String>);

    impl LineSource for ScriptedSource {
        fn read_line(&mut self) -> io::Result<String> {
            self.0.pop_front().ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted")
            })
        }
    }

    fn recording_console(input_lines: &[&str]) -> (Console, Rc<RefCell<Vec<String>>>) {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let source = ScriptedSource(input_lines.iter().map(|l| l.to_string()).collect());
        let console = Console::new(Box::new(RecordingSink(Rc::clone(&lines))), Box::new(source));
        (console, lines)
    }

    #[test]
    fn test_emit_flushes_on_newline() {
        let (mut console, lines) = recording_console(&[]);

        for code in [b'F', b'O', b'O', b'\n', b'B', b'A', b'R', b'\n'] {
            console.emit(Word::from(code)).unwrap();
        }

        assert_eq!(*lines.borrow(), vec!["FOO".to_string(), "BAR".to_string()]);
        assert!(console.out_buf.is_empty());
    }

    #[test]
    fn test_emit_holds_partial_line() {
        let (mut console, lines) = recording_console(&[]);

        console.emit(Word::from(b'H')).unwrap();
        console.emit(Word::from(b'i')).unwrap();

        assert!(lines.borrow().is_empty());
        assert_eq!(console.out_buf, "Hi");
    }

    #[test]
    fn test_input_drains_one_line_at_a_time() {
        let (mut console, _) = recording_console(&["ab\n", "c\n"]);

        assert_eq!(console.next_input_char().unwrap(), Word::from(b'a'));
        assert_eq!(console.next_input_char().unwrap(), Word::from(b'b'));
        assert_eq!(console.next_input_char().unwrap(), Word::from(b'\n'));
        // Buffer exhausted, the second line is fetched on demand
        assert_eq!(console.next_input_char().unwrap(), Word::from(b'c'));
        assert_eq!(console.next_input_char().unwrap(), Word::from(b'\n'));
    }

    #[test]
    fn test_input_exhausted_source_is_an_error() {
        let (mut console, _) = recording_console(&[]);
        assert!(console.next_input_char().is_err());
    }
}
