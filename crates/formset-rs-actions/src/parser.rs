//! Action expression parser.
//!
//! A hand-written PEG parser for the grammar
//!
//! ```text
//! Actions   := _ Chain (_ "!~" _ Chain)? _ EOF
//! Chain     := Function (_ "->" _ Function)*
//! Function  := KeyString (_ "(" _ ArgList? _ ")")?
//! ArgList   := Argument (_ "," _ Argument)*
//! Argument  := Object | Array | String | Number | Literal | NestedCall | DataPath
//! Literal   := "true" | "false" | "null"
//! NestedCall:= KeyString _ "(" _ ArgList? _ ")"
//! DataPath  := KeyString ("." KeyString)*          -> getDataValue([...])
//! KeyString := [A-Za-z_$][A-Za-z0-9_$]*
//! ```
//!
//! Objects, arrays, strings and numbers follow JSON, with strings accepting
//! both quote styles. Every failed match records what was expected at its
//! position; on failure the rightmost position and its expectations form the
//! [`ParseError`].

use std::collections::BTreeMap;

use formset_rs_core::error::ParseError;

use crate::ast::{ActionCall, ActionChain, ArgumentValue, ParseResult};

/// Parses an action expression into its success and reject chains.
///
/// # Examples
///
/// ```
/// use formset_rs_actions::parser::parse;
///
/// let result = parse("disable -> submit() !~ enable()").unwrap();
/// assert_eq!(result.success_chain.len(), 2);
/// assert_eq!(result.reject_chain[0].name, "enable");
/// ```
pub fn parse(input: &str) -> Result<ParseResult, ParseError> {
    let mut parser = Parser::new(input);
    parser.actions().ok_or_else(|| parser.error())
}

/// Deepest nesting of arrays, objects and value-function calls accepted
/// inside an argument list.
pub const MAX_DEPTH: usize = 128;

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    fail_pos: usize,
    expected: Vec<String>,
    depth: usize,
}

impl<'a> Parser<'a> {
    const fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            fail_pos: 0,
            expected: Vec::new(),
            depth: 0,
        }
    }

    fn error(&self) -> ParseError {
        let found = self.src[self.fail_pos..].chars().next();
        ParseError::new(self.src, self.fail_pos, self.expected.clone(), found)
    }

    // ── Primitives ───────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn fail_at(&mut self, pos: usize, what: &str) {
        if pos > self.fail_pos {
            self.fail_pos = pos;
            self.expected.clear();
        }
        if pos == self.fail_pos {
            self.expected.push(what.to_string());
        }
    }

    fn fail(&mut self, what: &str) {
        self.fail_at(self.pos, what);
    }

    /// Runs `parse` one nesting level deeper. Past [`MAX_DEPTH`] the parse
    /// fails at the current position, whatever failed further left.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.depth >= MAX_DEPTH {
            self.fail_pos = self.pos;
            self.expected = vec![format!("nesting depth <= {MAX_DEPTH}")];
            return None;
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n')) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, literal: &str) -> bool {
        if self.src[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            self.fail(&format!("\"{literal}\""));
            false
        }
    }

    /// Tries `_ literal`; on a miss the position is left before the whitespace.
    fn eat_after_ws(&mut self, literal: &str) -> bool {
        let save = self.pos;
        self.skip_ws();
        if self.eat(literal) {
            true
        } else {
            self.pos = save;
            false
        }
    }

    // ── Top level ────────────────────────────────────────────────────

    fn actions(&mut self) -> Option<ParseResult> {
        self.skip_ws();
        let success_chain = self.chain()?;

        let reject_chain = if self.eat_after_ws("!~") {
            self.skip_ws();
            self.chain()?
        } else {
            Vec::new()
        };

        self.skip_ws();
        if self.pos < self.src.len() {
            self.fail("end of input");
            return None;
        }

        Some(ParseResult {
            success_chain,
            reject_chain,
        })
    }

    fn chain(&mut self) -> Option<ActionChain> {
        let mut chain = vec![self.function()?];
        while self.eat_after_ws("->") {
            self.skip_ws();
            chain.push(self.function()?);
        }
        Some(chain)
    }

    fn function(&mut self) -> Option<ActionCall> {
        let name = self.identifier()?;
        let args = if self.eat_after_ws("(") {
            self.argument_list_rest(")")?
        } else {
            Vec::new()
        };
        Some(ActionCall { name, args })
    }

    fn identifier(&mut self) -> Option<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                self.pos += 1;
            }
            _ => {
                self.fail("identifier");
                return None;
            }
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            self.pos += 1;
        }
        Some(self.src[start..self.pos].to_string())
    }

    /// Parses `_ ArgList? _ close` after an opening bracket has been consumed.
    fn argument_list_rest(&mut self, close: &str) -> Option<Vec<ArgumentValue>> {
        self.skip_ws();
        if self.eat(close) {
            return Some(Vec::new());
        }

        let mut args = vec![self.argument()?];
        while self.eat_after_ws(",") {
            self.skip_ws();
            args.push(self.argument()?);
        }

        self.skip_ws();
        if self.eat(close) {
            Some(args)
        } else {
            None
        }
    }

    // ── Arguments ────────────────────────────────────────────────────

    fn argument(&mut self) -> Option<ArgumentValue> {
        match self.peek() {
            Some('{') => self.nested(Self::object),
            Some('[') => self.nested(|p| {
                p.pos += 1;
                p.argument_list_rest("]").map(ArgumentValue::Array)
            }),
            Some('"' | '\'') => self.string().map(ArgumentValue::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number().map(ArgumentValue::Number),
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => self.named_argument(),
            _ => {
                for what in ["number", "string", "\"[\"", "\"{\"", "identifier"] {
                    self.fail(what);
                }
                None
            }
        }
    }

    /// An argument starting with an identifier: a nested call, a keyword
    /// literal, or a data path.
    fn named_argument(&mut self) -> Option<ArgumentValue> {
        let first = self.identifier()?;

        if self.eat_after_ws("(") {
            let args = self.nested(|p| p.argument_list_rest(")"))?;
            return Some(ArgumentValue::Call(ActionCall { name: first, args }));
        }

        let mut segments = vec![first];
        while self.eat(".") {
            segments.push(self.identifier()?);
        }

        if segments.len() == 1 {
            match segments[0].as_str() {
                "true" => return Some(ArgumentValue::Boolean(true)),
                "false" => return Some(ArgumentValue::Boolean(false)),
                "null" => return Some(ArgumentValue::Null),
                _ => {}
            }
        }
        Some(ArgumentValue::data_path(segments))
    }

    fn object(&mut self) -> Option<ArgumentValue> {
        self.pos += 1; // '{'
        self.skip_ws();
        let mut map = BTreeMap::new();
        if self.eat("}") {
            return Some(ArgumentValue::Object(map));
        }

        loop {
            let key = match self.peek() {
                Some('"' | '\'') => self.string()?,
                _ => {
                    self.fail("string");
                    self.identifier()?
                }
            };
            self.skip_ws();
            if !self.eat(":") {
                return None;
            }
            self.skip_ws();
            let value = self.argument()?;
            map.insert(key, value);

            if !self.eat_after_ws(",") {
                break;
            }
            self.skip_ws();
        }

        self.skip_ws();
        if self.eat("}") {
            Some(ArgumentValue::Object(map))
        } else {
            None
        }
    }

    fn string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            let ch = if let Some(ch) = self.peek() {
                ch
            } else {
                self.fail(&format!("\"{quote}\""));
                return None;
            };
            if ch == quote {
                self.pos += 1;
                return Some(out);
            }
            if ch == '\\' {
                self.pos += 1;
                out.push(self.escape()?);
            } else {
                self.pos += ch.len_utf8();
                out.push(ch);
            }
        }
    }

    fn escape(&mut self) -> Option<char> {
        let ch = match self.peek() {
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('/') => '/',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => {
                self.pos += 1;
                return self.unicode_escape();
            }
            _ => {
                self.fail("escape sequence");
                return None;
            }
        };
        self.pos += 1;
        Some(ch)
    }

    /// Parses the `XXXX` of `\uXXXX`, combining a surrogate pair when a high
    /// surrogate is followed by `\uXXXX` holding the low half.
    fn unicode_escape(&mut self) -> Option<char> {
        let high = self.hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return self.scalar(high);
        }

        let pair_start = self.pos;
        if self.src[self.pos..].starts_with("\\u") {
            self.pos += 2;
            let low = self.hex4()?;
            if (0xDC00..0xE000).contains(&low) {
                return self.scalar(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00));
            }
        }
        self.fail_at(pair_start, "low surrogate escape");
        None
    }

    fn scalar(&mut self, code: u32) -> Option<char> {
        let ch = char::from_u32(code);
        if ch.is_none() {
            self.fail("unicode scalar value");
        }
        ch
    }

    fn hex4(&mut self) -> Option<u32> {
        let mut value = 0;
        for _ in 0..4 {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    value = value * 16 + digit;
                    self.pos += 1;
                }
                None => {
                    self.fail("hexadecimal digit");
                    return None;
                }
            }
        }
        Some(value)
    }

    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }

        match self.peek() {
            Some('0') => self.pos += 1,
            Some(c) if c.is_ascii_digit() => self.digits(),
            _ => {
                self.fail("digit");
                return None;
            }
        }

        // Fraction and exponent are optional; a dangling '.' or 'e' is left
        // unconsumed so the caller reports it.
        if self.peek() == Some('.') {
            if self.src[self.pos + 1..].starts_with(|c: char| c.is_ascii_digit()) {
                self.pos += 1;
                self.digits();
            } else {
                self.fail_at(self.pos + 1, "digit");
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.digits();
            } else {
                self.fail("digit");
                self.pos = save;
            }
        }

        if let Ok(value) = self.src[start..self.pos].parse::<f64>() {
            Some(value)
        } else {
            self.fail_at(start, "number");
            None
        }
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }
}
