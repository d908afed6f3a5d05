//! Line addressing
//!
//! An address list is parsed into [`Address`] tokens first and resolved
//! against the buffer afterwards, one term at a time, since `;` moves the
//! current line between terms and `/re/` searches start from it.

use crate::buffer::Buffer;
use crate::error::CommandError;
use crate::pattern::{self, ActivePattern};
use regex::Regex;

/// The unconsumed part of a command line.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    pub fn rest(&self) -> &'a str {
        self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    /// Consume `c` if it is next.
    pub fn eat(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    pub fn skip_blanks(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t']);
    }

    /// Consume a run of decimal digits.
    pub fn take_number(&mut self) -> Result<Option<usize>, CommandError> {
        let len = self.rest.bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 {
            return Ok(None);
        }
        let (digits, rest) = self.rest.split_at(len);
        self.rest = rest;
        digits
            .parse()
            .map(Some)
            .map_err(|_| CommandError::InvalidAddress)
    }

    /// Consume `+N` or `-N`. A sign without digits is left alone.
    pub fn take_offset(&mut self) -> Result<Option<isize>, CommandError> {
        let mut chars = self.rest.chars();
        let sign = match chars.next() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return Ok(None),
        };
        if !chars.next().is_some_and(|c| c.is_ascii_digit()) {
            return Ok(None);
        }
        self.bump();
        let magnitude = self.take_number()?.unwrap_or(0);
        let magnitude = isize::try_from(magnitude).map_err(|_| CommandError::InvalidAddress)?;
        Ok(Some(sign * magnitude))
    }

    /// Consume text up to an unescaped `delim` and the delimiter itself.
    ///
    /// Escapes are kept in the returned text. With `\` as the delimiter only
    /// a doubled backslash counts as escaped. Returns `None` and consumes
    /// nothing when the closing delimiter is missing.
    pub fn take_delimited(&mut self, delim: char) -> Option<&'a str> {
        let rest = self.rest;
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                if delim == '\\' {
                    if rest[i + 1..].starts_with('\\') {
                        chars.next();
                        continue;
                    }
                    return Some(self.split_off(i, c));
                }
                chars.next();
                continue;
            }
            if c == delim {
                return Some(self.split_off(i, c));
            }
        }
        None
    }

    fn split_off(&mut self, at: usize, delim: char) -> &'a str {
        let taken = &self.rest[..at];
        self.rest = &self.rest[at + delim.len_utf8()..];
        taken
    }
}

/// The base of one address term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressTerm {
    /// Literal line number
    Line(usize),
    /// `.`
    Current,
    /// `$`
    Last,
    /// `/re/` or `\re\`; both scan forward from the current line
    Search { pattern: String, delimiter: char },
}

/// A term with its optional `+N`/`-N` offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub term: AddressTerm,
    pub offset: isize,
}

impl Address {
    pub fn new(term: AddressTerm) -> Self {
        Self { term, offset: 0 }
    }

    /// Parse one address term. `Ok(None)` means no term starts here.
    pub fn parse(cur: &mut Cursor<'_>) -> Result<Option<Self>, CommandError> {
        cur.skip_blanks();
        let term = match cur.peek() {
            Some(c) if c.is_ascii_digit() => match cur.take_number()? {
                Some(n) => AddressTerm::Line(n),
                None => return Ok(None),
            },
            Some('.') => {
                cur.bump();
                AddressTerm::Current
            }
            Some('$') => {
                cur.bump();
                AddressTerm::Last
            }
            Some(delimiter @ ('/' | '\\')) => {
                cur.bump();
                let pattern = cur.take_delimited(delimiter).ok_or_else(|| {
                    CommandError::Syntax(format!("Missing closing '{}' in address", delimiter))
                })?;
                AddressTerm::Search {
                    pattern: pattern.to_string(),
                    delimiter,
                }
            }
            _ => return Ok(None),
        };

        cur.skip_blanks();
        let offset = cur.take_offset()?.unwrap_or(0);
        Ok(Some(Self { term, offset }))
    }

    /// Resolve to a line number in `0..=last_line`.
    pub fn resolve(&self, buffer: &Buffer, active: &mut ActivePattern) -> Result<usize, CommandError> {
        let base = match &self.term {
            AddressTerm::Line(n) => *n,
            AddressTerm::Current => buffer.current(),
            AddressTerm::Last => buffer.last_line(),
            AddressTerm::Search { pattern, delimiter } => {
                let source = pattern::unescape_delimiter(pattern, *delimiter);
                let regex = active.set(&source, false)?;
                scan_forward(buffer, regex).ok_or(CommandError::NoMatch)?
            }
        };

        let line = base
            .checked_add_signed(self.offset)
            .ok_or(CommandError::InvalidAddress)?;
        if line > buffer.last_line() {
            return Err(CommandError::InvalidAddress);
        }
        Ok(line)
    }
}

/// Search forward from the line after the current one, wrapping around and
/// ending with the current line itself.
pub fn scan_forward(buffer: &Buffer, regex: &Regex) -> Option<usize> {
    let start = buffer.current();
    let mut n = start;
    loop {
        n = buffer.next_line(n);
        if n != 0 && pattern::matches_line(regex, buffer.get(n)) {
            return Some(n);
        }
        if n == start {
            return None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `,`
    Comma,
    /// `;` also makes the address current before the next term
    Semicolon,
    /// Nothing followed
    End,
}

/// Address terms in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressList {
    items: Vec<(Address, Separator)>,
}

impl AddressList {
    pub fn parse(cur: &mut Cursor<'_>) -> Result<Self, CommandError> {
        let mut items = Vec::new();
        while let Some(address) = Address::parse(cur)? {
            let separator = if cur.eat(';') {
                Separator::Semicolon
            } else if cur.eat(',') {
                Separator::Comma
            } else {
                Separator::End
            };
            items.push((address, separator));
            if separator == Separator::End {
                break;
            }
        }
        Ok(Self { items })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolve every term, keeping only the last two.
    pub fn resolve(&self, buffer: &mut Buffer, active: &mut ActivePattern) -> Result<Range, CommandError> {
        let mut range = Range::default();
        for (address, separator) in &self.items {
            let line = address.resolve(buffer, active)?;
            range.line1 = range.line2;
            range.line2 = line;
            range.nlines += 1;
            if *separator == Separator::Semicolon {
                buffer.set_current(line);
            }
        }

        range.nlines = range.nlines.min(2);
        if range.nlines == 0 {
            range.line2 = buffer.current();
        }
        if range.nlines <= 1 {
            range.line1 = range.line2;
        }
        Ok(range)
    }
}

/// A resolved line range and how many addresses produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    pub line1: usize,
    pub line2: usize,
    pub nlines: usize,
}

impl Range {
    /// Fill in defaults when no address was given, then require
    /// `0 < line1 <= line2`.
    pub fn set_default(&mut self, def1: usize, def2: usize) -> Result<(), CommandError> {
        if self.nlines == 0 {
            self.line1 = def1;
            self.line2 = def2;
        }
        if self.line2 < self.line1 || self.line1 == 0 {
            return Err(CommandError::InvalidRange);
        }
        Ok(())
    }
}
