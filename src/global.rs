//! Global commands: `g/re/cmd` and `x/re/cmd`
//!
//! Lines in the range are marked first, then the command runs once per marked
//! line with that line current. Marks travel with their lines, so commands
//! that delete or move lines never cause a line to be visited twice.

use crate::address::{AddressList, Cursor, Range};
use crate::buffer::Buffer;
use crate::command::{self, ParsedCommand};
use crate::error::{CommandError, EdResult};
use crate::pattern;
use crate::session::Session;
use regex::Regex;
use std::io::{BufRead, Write};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalCommand {
    pub addresses: AddressList,
    /// `x`: act on lines that do not match
    pub invert: bool,
    pub pattern: String,
    pub delimiter: char,
    /// Command replayed on each marked line
    pub body: ParsedCommand,
}

impl GlobalCommand {
    /// Parse from the `g` or `x` onwards.
    pub fn parse(addresses: AddressList, cur: &mut Cursor<'_>) -> Result<Self, CommandError> {
        let invert = match cur.bump() {
            Some('g') => false,
            Some('x') => true,
            other => {
                return Err(CommandError::Syntax(format!(
                    "Expected global command, found {:?}",
                    other
                )));
            }
        };

        cur.skip_blanks();
        let delimiter = cur
            .bump()
            .ok_or_else(|| CommandError::Syntax("Missing pattern delimiter".to_string()))?;
        let pattern = cur
            .take_delimited(delimiter)
            .ok_or_else(|| CommandError::Syntax(format!("Missing closing '{}'", delimiter)))?;

        let body = if cur.rest().trim_matches([' ', '\t']).is_empty() {
            ParsedCommand::print()
        } else {
            command::parse_addressed_command(cur)?
        };

        Ok(Self {
            addresses,
            invert,
            pattern: pattern.to_string(),
            delimiter,
            body,
        })
    }
}

/// Mark lines in `range` that match (or, inverted, do not match) `regex`
/// and clear every other mark. Returns the number of marked lines.
pub fn mark_lines(buffer: &mut Buffer, regex: &Regex, range: Range, invert: bool) -> usize {
    let mut marked = 0;
    for n in 1..=buffer.last_line() {
        let in_range = (range.line1..=range.line2).contains(&n);
        let mark = in_range && pattern::matches_line(regex, buffer.get(n)) != invert;
        buffer.set_mark(n, mark);
        if mark {
            marked += 1;
        }
    }
    marked
}

impl<R: BufRead, W: Write> Session<R, W> {
    /// Run a global command. Any failing iteration ends the loop and fails
    /// the whole command.
    pub(crate) fn run_global(&mut self, global: &GlobalCommand) -> EdResult<()> {
        let mut range = global.addresses.resolve(&mut self.buffer, &mut self.active)?;
        range.set_default(1, self.buffer.last_line())?;

        let source = pattern::unescape_delimiter(&global.pattern, global.delimiter);
        let regex = self.active.set(&source, false)?;
        let marked = mark_lines(&mut self.buffer, regex, range, global.invert);
        debug!(marked, invert = global.invert, command = %global.body.command.name(), "global marked lines");

        let mut n = range.line1;
        let mut idle = 0;
        while idle <= self.buffer.last_line() {
            if n != 0 && n <= self.buffer.last_line() && self.buffer.mark(n) {
                self.buffer.set_mark(n, false);
                self.buffer.set_current(n);
                trace!(line = n, "global replay");
                self.execute(&global.body, true)?;
                idle = 0;
            } else {
                n = self.buffer.next_line(n);
                idle += 1;
            }
        }
        Ok(())
    }
}
