//! The `s` command: parse `s/pattern/replacement/flags` and apply it to a range.

use crate::address::{Cursor, Range};
use crate::buffer::Buffer;
use crate::error::CommandError;
use crate::pattern::{self, ActivePattern};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Pattern as written, escapes included; empty reuses the active pattern
    pub pattern: String,
    /// Replacement as written, ed syntax
    pub replacement: String,
    pub delimiter: char,
    /// `g` - every match in the line instead of the first
    pub global: bool,
    /// `i` - case-insensitive
    pub case_insensitive: bool,
}

impl Substitution {
    /// Parse everything after the `s`, up to but not including a trailing `p`.
    pub fn parse(cur: &mut Cursor<'_>) -> Result<Self, CommandError> {
        let delimiter = match cur.bump() {
            Some(c) if !matches!(c, ' ' | '\t' | '\n') => c,
            _ => return Err(CommandError::Syntax("Missing pattern delimiter".to_string())),
        };
        let missing = || CommandError::Syntax(format!("Missing closing '{}'", delimiter));
        let pattern = cur.take_delimited(delimiter).ok_or_else(missing)?;
        let replacement = cur.take_delimited(delimiter).ok_or_else(missing)?;

        let mut global = false;
        let mut case_insensitive = false;
        loop {
            match cur.peek() {
                Some('g') if !global => global = true,
                Some('i') if !case_insensitive => case_insensitive = true,
                _ => break,
            }
            cur.bump();
        }

        Ok(Self {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            delimiter,
            global,
            case_insensitive,
        })
    }

    /// Apply to every line in `range`, returning how many lines changed.
    ///
    /// Only lines whose text actually changes are replaced. Changing nothing
    /// is an error unless running under a global command, whose marking
    /// already found a match on the line.
    pub fn apply(
        &self,
        buffer: &mut Buffer,
        active: &mut ActivePattern,
        range: Range,
        under_global: bool,
    ) -> Result<usize, CommandError> {
        let source = pattern::unescape_delimiter(&self.pattern, self.delimiter);
        let regex = active.set(&source, self.case_insensitive)?;
        let template = pattern::replacement_template(&self.replacement);

        let mut changed = 0;
        for line in range.line1..=range.line2 {
            let new_text = {
                let text = buffer.get(line);
                let body = pattern::body(text);
                let replaced = if self.global {
                    regex.replace_all(body, template.as_str())
                } else {
                    regex.replace(body, template.as_str())
                };
                if replaced == body {
                    continue;
                }
                format!("{}{}", replaced, &text[body.len()..])
            };

            buffer.delete(line, line);
            // Insert after the preceding line, which is 0 for line 1.
            buffer.set_current(line - 1);
            buffer.put_text(new_text);
            changed += 1;
        }

        debug!(changed, line1 = range.line1, line2 = range.line2, "substitution applied");
        if changed == 0 && !under_global {
            return Err(CommandError::NoMatch);
        }
        Ok(changed)
    }
}
