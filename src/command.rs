//! Command line parsing
//!
//! A line is parsed in full before anything runs: an address list, then
//! either a `g`/`x` global prefix or a single command with its arguments.

use crate::address::{Address, AddressList, Cursor};
use crate::error::CommandError;
use crate::global::GlobalCommand;
use crate::substitute::Substitution;

/// Single-character editor commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `p` - print the range
    Print,
    /// `n` - print the range with line numbers
    Number,
    /// Empty command - print the next line
    Null,
    /// `q`
    Quit,
    /// `a` - read lines and append them after the addressed line
    Append,
    /// `c` - replace the range with lines read from input
    Change,
    /// `d`
    Delete,
    /// `i` - read lines and insert them before the addressed line
    Insert,
    /// `=` - print the addressed line number
    LineNumber,
    /// `m` - move the range after `destination`
    Move { destination: Address },
    /// `s`
    Substitute(Substitution),
    /// `e` - replace the buffer with a file
    Edit(Option<String>),
    /// `f` - show or set the remembered filename
    Filename(Option<String>),
    /// `r` - read a file after the addressed line
    Read(Option<String>),
    /// `w` - write the range to a file
    Write(Option<String>),
    /// `h` - explain the last error
    Explain,
    /// `H` - toggle explaining errors as they happen
    ToggleExplain,
}

impl Command {
    /// The character that introduced the command.
    pub fn name(&self) -> char {
        match self {
            Command::Print => 'p',
            Command::Number => 'n',
            Command::Null => ' ',
            Command::Quit => 'q',
            Command::Append => 'a',
            Command::Change => 'c',
            Command::Delete => 'd',
            Command::Insert => 'i',
            Command::LineNumber => '=',
            Command::Move { .. } => 'm',
            Command::Substitute(_) => 's',
            Command::Edit(_) => 'e',
            Command::Filename(_) => 'f',
            Command::Read(_) => 'r',
            Command::Write(_) => 'w',
            Command::Explain => 'h',
            Command::ToggleExplain => 'H',
        }
    }
}

/// A command with its addresses and trailing `p` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub addresses: AddressList,
    pub command: Command,
    pub print: bool,
}

impl ParsedCommand {
    /// A bare `p`, the command a global runs when none is given.
    pub fn print() -> Self {
        Self {
            addresses: AddressList::default(),
            command: Command::Print,
            print: false,
        }
    }
}

/// One input line, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Single(ParsedCommand),
    Global(GlobalCommand),
}

/// Parse a command line with its terminator already removed.
pub fn parse_statement(line: &str) -> Result<Statement, CommandError> {
    let mut cur = Cursor::new(line);
    let addresses = AddressList::parse(&mut cur)?;
    if matches!(cur.peek(), Some('g' | 'x')) {
        return GlobalCommand::parse(addresses, &mut cur).map(Statement::Global);
    }
    parse_command(addresses, &mut cur).map(Statement::Single)
}

/// Parse an address list followed by a single command.
pub fn parse_addressed_command(cur: &mut Cursor<'_>) -> Result<ParsedCommand, CommandError> {
    let addresses = AddressList::parse(cur)?;
    parse_command(addresses, cur)
}

fn parse_command(addresses: AddressList, cur: &mut Cursor<'_>) -> Result<ParsedCommand, CommandError> {
    let Some(c) = cur.bump() else {
        return Ok(ParsedCommand {
            addresses,
            command: Command::Null,
            print: false,
        });
    };

    let mut print = false;
    let command = match c {
        'p' => Command::Print,
        'n' => Command::Number,
        'q' => Command::Quit,
        'a' => Command::Append,
        'c' => Command::Change,
        'i' => Command::Insert,
        'h' => Command::Explain,
        'H' => Command::ToggleExplain,
        'd' => {
            print = take_print_flag(cur);
            Command::Delete
        }
        '=' => {
            print = take_print_flag(cur);
            Command::LineNumber
        }
        'm' => {
            let destination = Address::parse(cur)?
                .ok_or_else(|| CommandError::Syntax("Missing destination address".to_string()))?;
            print = take_print_flag(cur);
            Command::Move { destination }
        }
        's' => {
            let substitution = Substitution::parse(cur)?;
            print = take_print_flag(cur);
            Command::Substitute(substitution)
        }
        'e' => Command::Edit(parse_filename(cur)?),
        'f' => Command::Filename(parse_filename(cur)?),
        'r' => Command::Read(parse_filename(cur)?),
        'w' => Command::Write(parse_filename(cur)?),
        other => return Err(CommandError::UnknownCommand(other)),
    };

    expect_end(cur)?;
    Ok(ParsedCommand {
        addresses,
        command,
        print,
    })
}

fn take_print_flag(cur: &mut Cursor<'_>) -> bool {
    cur.skip_blanks();
    cur.eat('p')
}

fn expect_end(cur: &mut Cursor<'_>) -> Result<(), CommandError> {
    cur.skip_blanks();
    if cur.is_empty() {
        Ok(())
    } else {
        Err(CommandError::Syntax(format!("Unexpected text: {}", cur.rest())))
    }
}

/// Parse an optional filename: blanks, then the name, then nothing else.
/// A backslash before a space keeps the space in the name.
fn parse_filename(cur: &mut Cursor<'_>) -> Result<Option<String>, CommandError> {
    if cur.rest().trim_matches([' ', '\t']).is_empty() {
        cur.skip_blanks();
        return Ok(None);
    }
    if !cur.rest().starts_with([' ', '\t']) {
        return Err(CommandError::Syntax("Expected blank before filename".to_string()));
    }

    cur.skip_blanks();
    let mut name = String::new();
    while let Some(c) = cur.peek() {
        match c {
            '\\' if cur.rest()[1..].starts_with(' ') => {
                cur.bump();
                cur.bump();
                name.push(' ');
            }
            ' ' | '\t' => break,
            _ => {
                cur.bump();
                name.push(c);
            }
        }
    }
    Ok(Some(name))
}
