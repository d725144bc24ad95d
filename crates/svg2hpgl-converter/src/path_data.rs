//! Lexer for SVG path data and number lists
//!
//! Handles the compact forms real files use: `M10-5`, `0.5.5` (two numbers),
//! `1e-3`, and arc flags packed without separators (`a1 1 0 0110 10`).

use svg2hpgl_core::MalformedPathError;

/// Characters that start a path command.
const COMMANDS: &str = "MmLlHhVvCcSsQqTtAaZz";

pub(crate) struct PathLexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> PathLexer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    /// Skip whitespace and commas.
    fn skip_separators(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || c == ',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    pub(crate) fn at_end(&mut self) -> bool {
        self.skip_separators();
        self.pos >= self.src.len()
    }

    /// Whether the next token looks like the start of a number.
    pub(crate) fn at_number(&mut self) -> bool {
        self.skip_separators();
        matches!(self.peek(), Some(c) if c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
    }

    /// Consume a command letter if one is next.
    ///
    /// Returns `Ok(None)` at end of input or when a number follows.
    pub(crate) fn next_command(&mut self) -> Result<Option<char>, MalformedPathError> {
        if self.at_end() || self.at_number() {
            return Ok(None);
        }
        match self.peek() {
            Some(c) if COMMANDS.contains(c) => {
                self.pos += 1;
                Ok(Some(c))
            }
            Some(c) => Err(self.unexpected(c)),
            None => Ok(None),
        }
    }

    fn unexpected(&self, found: char) -> MalformedPathError {
        MalformedPathError::UnexpectedCharacter {
            offset: self.pos,
            found,
        }
    }

    pub(crate) fn number(&mut self) -> Result<f64, MalformedPathError> {
        self.skip_separators();
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut end = start;

        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let int_start = end;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        let mut digits = end - int_start;
        if bytes.get(end) == Some(&b'.') {
            end += 1;
            let frac_start = end;
            while bytes.get(end).is_some_and(u8::is_ascii_digit) {
                end += 1;
            }
            digits += end - frac_start;
        }

        if digits == 0 {
            return Err(self.invalid_number(start));
        }

        // Exponent only when digits actually follow
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
                exp_end += 1;
            }
            if bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
                while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
                    exp_end += 1;
                }
                end = exp_end;
            }
        }

        let value = self.src[start..end]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid_number(start))?;
        self.pos = end;
        Ok(value)
    }

    fn invalid_number(&self, start: usize) -> MalformedPathError {
        let token: String = self.src[start..]
            .chars()
            .take_while(|c| !c.is_ascii_whitespace() && *c != ',')
            .take(16)
            .collect();
        MalformedPathError::InvalidNumber {
            offset: start,
            token,
        }
    }

    /// Single-character arc flag.
    pub(crate) fn flag(&mut self) -> Result<bool, MalformedPathError> {
        self.skip_separators();
        match self.peek() {
            Some('0') => {
                self.pos += 1;
                Ok(false)
            }
            Some('1') => {
                self.pos += 1;
                Ok(true)
            }
            Some(found) => Err(MalformedPathError::InvalidFlag {
                offset: self.pos,
                found,
            }),
            None => Err(MalformedPathError::InvalidFlag {
                offset: self.pos,
                found: ' ',
            }),
        }
    }
}

/// Parse a whitespace/comma separated list of numbers.
pub fn parse_number_list(src: &str) -> Result<Vec<f64>, MalformedPathError> {
    let mut lexer = PathLexer::new(src);
    let mut values = Vec::new();
    while !lexer.at_end() {
        if !lexer.at_number() {
            let offset = lexer.pos;
            let found = lexer.peek().unwrap_or(' ');
            return Err(MalformedPathError::UnexpectedCharacter { offset, found });
        }
        values.push(lexer.number()?);
    }
    Ok(values)
}
