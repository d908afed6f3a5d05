//! The editing session: command dispatch and the read-eval loop
//!
//! All state that commands share lives here: the buffer, the active pattern,
//! the remembered filename and the input and output streams.

use crate::address::Range;
use crate::buffer::Buffer;
use crate::command::{self, Command, ParsedCommand, Statement};
use crate::config::Config;
use crate::error::{CommandError, EdError, EdResult};
use crate::pattern::{ActivePattern, RegexFlavor};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

/// Behavior switches taken from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Written before each command is read; empty for none
    pub prompt: String,
    /// Explain each error right after its `?`
    pub verbose_errors: bool,
    /// Report line counts after reading and writing files
    pub show_counts: bool,
    pub flavor: RegexFlavor,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            verbose_errors: false,
            show_counts: true,
            flavor: RegexFlavor::default(),
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            prompt: config.editor.prompt.clone(),
            verbose_errors: config.editor.verbose_errors,
            show_counts: config.editor.show_counts,
            flavor: config.regex.flavor,
        }
    }
}

pub struct Session<R, W> {
    input: R,
    output: W,
    pub(crate) buffer: Buffer,
    pub(crate) active: ActivePattern,
    filename: Option<String>,
    options: SessionOptions,
    last_error: Option<String>,
    running: bool,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W, options: SessionOptions) -> Self {
        Self {
            input,
            output,
            buffer: Buffer::new(),
            active: ActivePattern::new(options.flavor),
            filename: None,
            options,
            last_error: None,
            running: true,
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The remembered filename.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Whether `q` has been seen.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Load the file named on the command line. The name is remembered even
    /// when reading fails; the failure is reported like any command error.
    pub fn open(&mut self, path: &str) -> EdResult<()> {
        self.filename = Some(path.to_string());
        if let Err(e) = self.read_file(0, path) {
            self.report(e)?;
        }
        self.output.flush()?;
        Ok(())
    }

    /// Read and run commands until `q`.
    ///
    /// Returns `Err(EdError::InputExhausted)` when input ends first.
    pub fn run(&mut self) -> EdResult<()> {
        while self.running {
            self.write_prompt()?;
            let line = self.read_line()?;
            self.execute_line(&line)?;
            self.output.flush()?;
        }
        Ok(())
    }

    /// Run one command line. Command failures are reported and swallowed;
    /// only input exhaustion and a broken output stream escape.
    pub fn execute_line(&mut self, line: &str) -> EdResult<()> {
        let saved = self.buffer.current();
        match self.execute_statement(line) {
            Ok(()) => Ok(()),
            Err(EdError::Command(e)) => {
                self.report(e)?;
                self.buffer.set_current(saved);
                Ok(())
            }
            Err(EdError::InputExhausted) => Err(EdError::InputExhausted),
        }
    }

    fn execute_statement(&mut self, line: &str) -> EdResult<()> {
        let text = line.strip_suffix('\n').unwrap_or(line);
        match command::parse_statement(text)? {
            Statement::Single(cmd) => self.execute(&cmd, false),
            Statement::Global(global) => self.run_global(&global),
        }
    }

    /// Dispatch one parsed command.
    pub(crate) fn execute(&mut self, cmd: &ParsedCommand, under_global: bool) -> EdResult<()> {
        let mut range = cmd.addresses.resolve(&mut self.buffer, &mut self.active)?;
        let cur = self.buffer.current();
        let last = self.buffer.last_line();
        debug!(
            command = %cmd.command.name(),
            line1 = range.line1,
            line2 = range.line2,
            nlines = range.nlines,
            under_global,
            "dispatch"
        );

        match &cmd.command {
            Command::Print => {
                range.set_default(cur, cur)?;
                self.print_lines(range.line1, range.line2, false)?;
            }
            Command::Number => {
                range.set_default(cur, cur)?;
                self.print_lines(range.line1, range.line2, true)?;
            }
            Command::Null => {
                if range.nlines == 0 {
                    range.line2 = self.buffer.next_line(cur);
                }
                self.print_lines(range.line2, range.line2, false)?;
            }
            Command::Quit => {
                forbid_under_global('q', under_global)?;
                require_no_address(&range)?;
                self.running = false;
            }
            Command::Append => {
                forbid_under_global('a', under_global)?;
                self.append(range.line2)?;
            }
            Command::Change => {
                forbid_under_global('c', under_global)?;
                range.set_default(cur, cur)?;
                self.buffer.delete(range.line1, range.line2);
                self.append(range.line1 - 1)?;
            }
            Command::Delete => {
                range.set_default(cur, cur)?;
                self.buffer.delete(range.line1, range.line2);
                let next = self.buffer.next_line(self.buffer.current());
                if next != 0 {
                    self.buffer.set_current(next);
                }
            }
            Command::Insert => {
                forbid_under_global('i', under_global)?;
                self.append(range.line2.saturating_sub(1))?;
            }
            Command::LineNumber => {
                writeln!(self.output, "{}", range.line2)?;
            }
            Command::Move { destination } => {
                let line3 = destination.resolve(&self.buffer, &mut self.active)?;
                range.set_default(cur, cur)?;
                self.move_lines(range, line3)?;
            }
            Command::Substitute(substitution) => {
                range.set_default(cur, cur)?;
                substitution.apply(&mut self.buffer, &mut self.active, range, under_global)?;
            }
            Command::Edit(name) => {
                require_no_address(&range)?;
                let path = self.resolve_filename(name.as_deref())?;
                self.filename = Some(path.clone());
                let reader = open_for_reading(&path)?;
                self.buffer.clear();
                self.load_lines(reader, 0, &path)?;
            }
            Command::Filename(name) => {
                require_no_address(&range)?;
                let path = self.resolve_filename(name.as_deref())?;
                writeln!(self.output, "{}", path)?;
                self.filename = Some(path);
            }
            Command::Read(name) => {
                let path = self.resolve_filename(name.as_deref())?;
                self.read_file(range.line2, &path)?;
            }
            Command::Write(name) => {
                let path = self.resolve_filename(name.as_deref())?;
                range.set_default(1, last)?;
                self.write_file(range.line1, range.line2, &path)?;
            }
            Command::Explain => {
                if let Some(message) = &self.last_error {
                    writeln!(self.output, "{}", message)?;
                }
            }
            Command::ToggleExplain => {
                self.options.verbose_errors = !self.options.verbose_errors;
                if self.options.verbose_errors {
                    if let Some(message) = &self.last_error {
                        writeln!(self.output, "{}", message)?;
                    }
                }
            }
        }

        let cur = self.buffer.current();
        if cmd.print && cur > 0 {
            self.print_lines(cur, cur, false)?;
        }
        Ok(())
    }

    fn report(&mut self, error: CommandError) -> EdResult<()> {
        debug!(error = %error, "command failed");
        writeln!(self.output, "?")?;
        if self.options.verbose_errors {
            writeln!(self.output, "{}", error)?;
        }
        self.last_error = Some(error.to_string());
        Ok(())
    }

    fn write_prompt(&mut self) -> io::Result<()> {
        if !self.options.prompt.is_empty() {
            write!(self.output, "{}", self.options.prompt)?;
            self.output.flush()?;
        }
        Ok(())
    }

    /// Read one terminated line. End of input, a read error or a final line
    /// without its terminator all end the session.
    fn read_line(&mut self) -> EdResult<String> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|_| EdError::InputExhausted)?;
        if read == 0 || !line.ends_with('\n') {
            return Err(EdError::InputExhausted);
        }
        if line.ends_with("\r\n") {
            line.truncate(line.len() - 2);
            line.push('\n');
        }
        Ok(line)
    }

    /// Read lines until a lone `.` and put them after line `after`.
    fn append(&mut self, after: usize) -> EdResult<()> {
        self.buffer.set_current(after);
        loop {
            let line = self.read_line()?;
            if line == ".\n" {
                return Ok(());
            }
            self.buffer.put_text(line);
        }
    }

    fn print_lines(&mut self, n1: usize, n2: usize, numbered: bool) -> Result<(), CommandError> {
        if n1 == 0 {
            return Err(CommandError::InvalidAddress);
        }
        for (n, text) in (n1..=n2).zip(self.buffer.texts(n1, n2)) {
            if numbered {
                write!(self.output, "{}\t", n)?;
            }
            self.output.write_all(text.as_bytes())?;
        }
        self.buffer.set_current(n2);
        Ok(())
    }

    fn move_lines(&mut self, range: Range, line3: usize) -> Result<(), CommandError> {
        if range.line1 <= line3 && line3 < range.line2 {
            return Err(CommandError::InvalidDestination);
        }
        self.buffer.block_move(range.line1, range.line2, line3);
        let current = if line3 >= range.line2 {
            line3
        } else {
            line3 + (range.line2 - range.line1 + 1)
        };
        self.buffer.set_current(current);
        Ok(())
    }

    /// Pick the file a command works on. A given name becomes the remembered
    /// one if nothing is remembered yet.
    fn resolve_filename(&mut self, name: Option<&str>) -> Result<String, CommandError> {
        match name {
            Some(name) => {
                if self.filename.is_none() {
                    self.filename = Some(name.to_string());
                }
                Ok(name.to_string())
            }
            None => self.filename.clone().ok_or(CommandError::NoFilename),
        }
    }

    fn read_file(&mut self, after: usize, path: &str) -> Result<(), CommandError> {
        let reader = open_for_reading(path)?;
        self.load_lines(reader, after, path)
    }

    /// Put every line from `reader` after line `after` and report the count.
    fn load_lines(&mut self, mut reader: impl BufRead, after: usize, path: &str) -> Result<(), CommandError> {
        self.buffer.set_current(after);
        let mut count = 0usize;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).map_err(|e| file_error(path, e))? == 0 {
                break;
            }
            if !line.ends_with('\n') {
                line.push('\n');
            }
            self.buffer.put_text(std::mem::take(&mut line));
            count += 1;
        }

        debug!(path, count, after, "read file");
        if self.options.show_counts {
            writeln!(self.output, "{}", count)?;
        }
        Ok(())
    }

    fn write_file(&mut self, n1: usize, n2: usize, path: &str) -> Result<(), CommandError> {
        let to_file_error = |source: io::Error| file_error(path, source);
        let mut writer = BufWriter::new(File::create(path).map_err(to_file_error)?);
        for text in self.buffer.texts(n1, n2) {
            writer.write_all(text.as_bytes()).map_err(to_file_error)?;
        }
        writer.flush().map_err(to_file_error)?;

        let count = n2 - n1 + 1;
        debug!(path, count, "wrote file");
        if self.options.show_counts {
            writeln!(self.output, "{}", count)?;
        }
        Ok(())
    }
}

fn file_error(path: &str, source: io::Error) -> CommandError {
    CommandError::File {
        path: PathBuf::from(path),
        source,
    }
}

fn open_for_reading(path: &str) -> Result<BufReader<File>, CommandError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| file_error(path, e))
}

fn forbid_under_global(name: char, under_global: bool) -> Result<(), CommandError> {
    if under_global {
        Err(CommandError::NotInGlobal(name))
    } else {
        Ok(())
    }
}

fn require_no_address(range: &Range) -> Result<(), CommandError> {
    if range.nlines == 0 {
        Ok(())
    } else {
        Err(CommandError::InvalidAddress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(input: &str, lines: &[&str]) -> Session<Cursor<Vec<u8>>, Vec<u8>> {
        let mut session = Session::new(
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            SessionOptions::default(),
        );
        for line in lines {
            session.buffer.put_text(line.to_string());
        }
        session
    }

    fn contents<R: BufRead>(session: &Session<R, Vec<u8>>) -> Vec<String> {
        let buffer = session.buffer();
        (1..=buffer.last_line()).map(|n| buffer.get(n).to_string()).collect()
    }

    fn output(session: Session<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(session.into_output()).unwrap()
    }

    #[test]
    fn test_move_to_head() {
        let mut s = session("", &["a\n", "b\n", "c\n"]);
        s.buffer.set_current(1);
        s.execute_line("2m0\n").unwrap();
        assert_eq!(contents(&s), vec!["b\n", "a\n", "c\n"]);
        assert_eq!(s.buffer().current(), 1);
    }

    #[test]
    fn test_move_forward_sets_current_to_destination() {
        let mut s = session("", &["a\n", "b\n", "c\n", "d\n"]);
        s.execute_line("1,2m3\n").unwrap();
        assert_eq!(contents(&s), vec!["c\n", "a\n", "b\n", "d\n"]);
        assert_eq!(s.buffer().current(), 3);
    }

    #[test]
    fn test_move_into_itself_fails() {
        let mut s = session("", &["a\n", "b\n", "c\n"]);
        s.buffer.set_current(3);
        s.execute_line("1,3m1\n").unwrap();
        assert_eq!(contents(&s), vec!["a\n", "b\n", "c\n"]);
        assert_eq!(s.buffer().current(), 3);
        assert_eq!(output(s), "?\n");
    }

    #[test]
    fn test_move_onto_itself_keeps_current_valid() {
        let mut s = session("", &["a\n", "b\n"]);
        s.execute_line("2m2\n").unwrap();
        assert_eq!(s.buffer().current(), 2);
    }

    #[test]
    fn test_substitute_range() {
        let mut s = session("", &["cat\n", "bat\n"]);
        s.execute_line("1,2s/a/X/\n").unwrap();
        assert_eq!(contents(&s), vec!["cXt\n", "bXt\n"]);
        assert_eq!(output(s), "");
    }

    #[test]
    fn test_substitute_without_match_reports() {
        let mut s = session("", &["cat\n"]);
        s.execute_line("s/z/y/\n").unwrap();
        assert_eq!(output(s), "?\n");
    }

    #[test]
    fn test_identity_substitute_reports_and_keeps_current() {
        let mut s = session("", &["cat\n", "dog\n", "x\n"]);
        s.execute_line("1\n").unwrap();
        s.execute_line("2s/o/o/\n").unwrap();
        assert_eq!(contents(&s), vec!["cat\n", "dog\n", "x\n"]);
        assert_eq!(s.buffer().current(), 1);
        assert_eq!(output(s), "cat\n?\n");
    }

    #[test]
    fn test_identity_substitute_under_global_succeeds() {
        let mut s = session("", &["cat\n", "dog\n", "x\n"]);
        s.execute_line("g/o/s/o/o/\n").unwrap();
        assert_eq!(contents(&s), vec!["cat\n", "dog\n", "x\n"]);
        assert_eq!(output(s), "");
    }

    #[test]
    fn test_global_delete() {
        let mut s = session("", &["abc\n", "xyz\n", "bcd\n"]);
        s.execute_line("g/b/d\n").unwrap();
        assert_eq!(contents(&s), vec!["xyz\n"]);
    }

    #[test]
    fn test_invert_global_delete() {
        let mut s = session("", &["abc\n", "xyz\n", "bcd\n"]);
        s.execute_line("x/b/d\n").unwrap();
        assert_eq!(contents(&s), vec!["abc\n", "bcd\n"]);
    }

    #[test]
    fn test_global_substitute_and_print() {
        let mut s = session("", &["one\n", "two\n", "three\n"]);
        s.execute_line("g/o/s/o/0/gp\n").unwrap();
        assert_eq!(contents(&s), vec!["0ne\n", "tw0\n", "three\n"]);
        assert_eq!(output(s), "0ne\ntw0\n");
    }

    #[test]
    fn test_global_move_reverses_buffer() {
        let mut s = session("", &["1\n", "2\n", "3\n"]);
        s.execute_line("g/^/m0\n").unwrap();
        assert_eq!(contents(&s), vec!["3\n", "2\n", "1\n"]);
    }

    #[test]
    fn test_global_rejects_append() {
        let mut s = session("x\n.\n", &["a\n"]);
        s.execute_line("g/a/a\n").unwrap();
        assert_eq!(contents(&s), vec!["a\n"]);
        assert_eq!(output(s), "?\n");
    }

    #[test]
    fn test_global_rejects_quit() {
        let mut s = session("", &["a\n"]);
        s.execute_line("g/a/q\n").unwrap();
        assert!(s.is_running());
    }

    #[test]
    fn test_append_on_empty_buffer() {
        let mut s = session("one\ntwo\n.\n", &[]);
        s.execute_line("0a\n").unwrap();
        assert_eq!(contents(&s), vec!["one\n", "two\n"]);
        assert_eq!(s.buffer().current(), 2);
    }

    #[test]
    fn test_insert_before_line() {
        let mut s = session("new\n.\n", &["a\n", "b\n"]);
        s.execute_line("2i\n").unwrap();
        assert_eq!(contents(&s), vec!["a\n", "new\n", "b\n"]);
        assert_eq!(s.buffer().current(), 2);
    }

    #[test]
    fn test_change_range() {
        let mut s = session("X\n.\n", &["a\n", "b\n", "c\n"]);
        s.execute_line("1,2c\n").unwrap();
        assert_eq!(contents(&s), vec!["X\n", "c\n"]);
        assert_eq!(s.buffer().current(), 1);
    }

    #[test]
    fn test_append_hits_end_of_input() {
        let mut s = session("one\n", &[]);
        assert!(matches!(s.execute_line("a\n"), Err(EdError::InputExhausted)));
    }

    #[test]
    fn test_delete_moves_to_next_line() {
        let mut s = session("", &["a\n", "b\n", "c\n"]);
        s.execute_line("2d\n").unwrap();
        assert_eq!(s.buffer().current(), 2);
        s.execute_line("$d\n").unwrap();
        assert_eq!(s.buffer().current(), 1);
    }

    #[test]
    fn test_delete_with_print_flag() {
        let mut s = session("", &["a\n", "b\n", "c\n"]);
        s.execute_line("1dp\n").unwrap();
        assert_eq!(output(s), "b\n");
    }

    #[test]
    fn test_print_and_number() {
        let mut s = session("", &["a\n", "b\n"]);
        s.execute_line("1,2p\n").unwrap();
        s.execute_line("1n\n").unwrap();
        s.execute_line("=\n").unwrap();
        assert_eq!(output(s), "a\nb\n1\ta\n1\n");
    }

    #[test]
    fn test_null_command_prints_next_line() {
        let mut s = session("", &["a\n", "b\n"]);
        s.buffer.set_current(1);
        s.execute_line("\n").unwrap();
        s.execute_line("\n").unwrap();
        assert_eq!(output(s), "b\n?\n");
    }

    #[test]
    fn test_failure_restores_current_line() {
        let mut s = session("", &["a\n", "b\n", "c\n"]);
        s.buffer.set_current(1);
        s.execute_line("3;/nomatch/p\n").unwrap();
        assert_eq!(s.buffer().current(), 1);
    }

    #[test]
    fn test_quit_stops_session() {
        let mut s = session("p\n", &["a\n"]);
        s.execute_line("q\n").unwrap();
        assert!(!s.is_running());
        s.run().unwrap();
    }

    #[test]
    fn test_quit_with_address_fails() {
        let mut s = session("", &["a\n"]);
        s.execute_line("1q\n").unwrap();
        assert!(s.is_running());
    }

    #[test]
    fn test_explain_last_error() {
        let mut s = session("", &["a\n"]);
        s.execute_line("9p\n").unwrap();
        s.execute_line("h\n").unwrap();
        assert_eq!(output(s), "?\nInvalid address\n");
    }

    #[test]
    fn test_toggle_verbose_errors() {
        let mut s = session("", &["a\n"]);
        s.execute_line("H\n").unwrap();
        s.execute_line("Z\n").unwrap();
        assert_eq!(output(s), "?\nUnknown command: Z\n");
    }

    #[test]
    fn test_run_ends_on_exhausted_input() {
        let mut s = session("1p\n", &["a\n"]);
        assert!(matches!(s.run(), Err(EdError::InputExhausted)));
        assert_eq!(output(s), "a\n");
    }

    #[test]
    fn test_partial_last_line_is_exhaustion() {
        let mut s = session("1p", &["a\n"]);
        assert!(matches!(s.run(), Err(EdError::InputExhausted)));
        assert_eq!(output(s), "");
    }

    #[test]
    fn test_prompt_is_written() {
        let mut s = Session::new(
            Cursor::new(b"q\n".to_vec()),
            Vec::new(),
            SessionOptions {
                prompt: "*".to_string(),
                ..SessionOptions::default()
            },
        );
        s.run().unwrap();
        assert_eq!(String::from_utf8(s.into_output()).unwrap(), "*");
    }

    #[test]
    fn test_edit_missing_file_keeps_buffer() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");
        let mut s = session("", &["keep\n"]);
        s.execute_line(&format!("e {}\n", missing.display())).unwrap();
        assert_eq!(contents(&s), vec!["keep\n"]);
        assert_eq!(s.buffer().current(), 1);
        assert_eq!(output(s), "?\n");
    }

    #[test]
    fn test_filename_without_name_fails() {
        let mut s = session("", &["a\n"]);
        s.execute_line("f\n").unwrap();
        s.execute_line("f notes.txt\n").unwrap();
        s.execute_line("f\n").unwrap();
        assert_eq!(s.filename(), Some("notes.txt"));
        assert_eq!(output(s), "?\nnotes.txt\nnotes.txt\n");
    }
}
