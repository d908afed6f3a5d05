//! Pattern handling
//!
//! Holds the active pattern shared by `/re/` addresses, `s` and `g`/`x`, and
//! translates pattern and replacement syntax into what the `regex` crate
//! understands.

use crate::error::CommandError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegexFlavor {
    /// Basic Regular Expressions (classic ed)
    BRE,
    /// Extended Regular Expressions
    ERE,
    /// Perl-style syntax as accepted by the regex crate
    #[default]
    PCRE,
}

/// The last compiled pattern, reused whenever a command gives an empty one.
#[derive(Debug, Clone)]
pub struct ActivePattern {
    flavor: RegexFlavor,
    regex: Option<Regex>,
}

impl ActivePattern {
    pub fn new(flavor: RegexFlavor) -> Self {
        Self { flavor, regex: None }
    }

    pub fn flavor(&self) -> RegexFlavor {
        self.flavor
    }

    /// The active pattern, if one was ever set.
    pub fn current(&self) -> Result<&Regex, CommandError> {
        self.regex.as_ref().ok_or(CommandError::NoPreviousPattern)
    }

    /// Compile `source` and make it active. An empty source keeps the
    /// existing pattern.
    pub fn set(&mut self, source: &str, case_insensitive: bool) -> Result<&Regex, CommandError> {
        if source.is_empty() {
            return self.current();
        }
        let regex: &Regex = self.regex.insert(compile(source, self.flavor, case_insensitive)?);
        Ok(regex)
    }
}

/// Compile a pattern written in `flavor` syntax.
pub fn compile(source: &str, flavor: RegexFlavor, case_insensitive: bool) -> Result<Regex, CommandError> {
    let translated = match flavor {
        RegexFlavor::BRE => translate_bre(source),
        RegexFlavor::ERE | RegexFlavor::PCRE => source.to_string(),
    };
    trace!(pattern = source, translated = %translated, "compiling pattern");

    RegexBuilder::new(&translated)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| CommandError::BadPattern {
            pattern: source.to_string(),
            message: e.to_string(),
        })
}

/// Line text without its terminator; patterns never see the `\n`.
pub fn body(text: &str) -> &str {
    text.strip_suffix('\n').unwrap_or(text)
}

pub fn matches_line(regex: &Regex, text: &str) -> bool {
    regex.is_match(body(text))
}

/// Translate BRE syntax into regex crate syntax.
///
/// Escaped `( ) { } + ? |` become operators while the bare characters become
/// literals. `\<` and `\>` map to word boundaries.
pub fn translate_bre(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(op @ ('(' | ')' | '{' | '}' | '+' | '?' | '|')) => out.push(op),
                Some('<' | '>') => out.push_str(r"\b"),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push_str(r"\\"),
            },
            '(' | ')' | '{' | '}' | '+' | '?' | '|' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    out
}

/// Strip the escape from an embedded delimiter so `/a\/b/` searches for `a/b`.
///
/// Delimiters that are regex metacharacters stay escaped, keeping them literal.
pub fn unescape_delimiter(raw: &str, delim: char) -> String {
    if delim == '\\' || regex_syntax_meta(delim) {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&delim) {
            continue;
        }
        out.push(c);
    }
    out
}

fn regex_syntax_meta(c: char) -> bool {
    matches!(
        c,
        '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#' | '&' | '-' | '~'
    )
}

/// Turn a replacement into a regex crate template.
///
/// `&` and `$&` are the whole match; `\1`..`\9` and `$1`..`$9` are groups.
/// `\&`, `\\`, `$$` and an escaped delimiter are literals, as is any other `$`.
pub fn replacement_template(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(d @ '1'..='9') => push_group(&mut out, d),
                Some('$') => out.push_str("$$"),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            '&' => out.push_str("${0}"),
            '$' => match chars.peek().copied() {
                Some(d @ '1'..='9') => {
                    chars.next();
                    push_group(&mut out, d);
                }
                Some('&') => {
                    chars.next();
                    out.push_str("${0}");
                }
                Some('$') => {
                    chars.next();
                    out.push_str("$$");
                }
                _ => out.push_str("$$"),
            },
            _ => out.push(c),
        }
    }

    out
}

fn push_group(out: &mut String, digit: char) {
    out.push_str("${");
    out.push(digit);
    out.push('}');
}
