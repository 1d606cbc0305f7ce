//! Console line tokenizer.
//!
//! Grammar:
//!
//! ```text
//! line     := name (WS verb)? (WS default)? (WS argument)*
//! default  := '"' text '"' | word
//! argument := ("--" | "-") ident (WS value)?
//! value    := '"' text '"' | run of characters other than '-' and '"'
//! ```
//!
//! Quoted text may not contain quotes, CR, or LF. Argument names are
//! lower-cased. Repeated argument names are kept; rejecting them is the
//! binder's job.

use crate::error::DispatchError;

/// One tokenized console line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInvocation {
    /// Command name as typed.
    pub command: String,
    /// Verb as typed, or empty.
    pub verb: String,
    /// Unnamed value following the verb, or empty.
    pub default_value: String,
    /// `(lower-cased name, raw value)` in line order. May contain repeats.
    pub arguments: Vec<(String, String)>,
}

impl ParsedInvocation {
    /// Build the argument map, rejecting repeated names.
    pub fn argument_map(&self) -> Result<Arguments, DispatchError> {
        let mut map = Arguments::default();
        for (name, value) in &self.arguments {
            if map.contains(name) {
                return Err(DispatchError::DuplicateArgument(name.clone()));
            }
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Result of tokenizing a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tokenized {
    Invocation(ParsedInvocation),
    /// The line did not parse but asked for `--help`.
    GlobalHelp,
}

/// Ordered map of argument name to raw value with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    entries: Vec<(String, String)>,
}

impl Arguments {
    /// Insert or replace `name`.
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Tokenize one console line.
pub fn tokenize(line: &str) -> Result<Tokenized, DispatchError> {
    match Scanner::new(line).invocation() {
        Some(parsed) => Ok(Tokenized::Invocation(parsed)),
        None if line.contains("--help") => Ok(Tokenized::GlobalHelp),
        None => Err(DispatchError::Syntax),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c == '-' || c == '.'
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(line: &str) -> Self {
        Self {
            chars: line.trim().chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Consume whitespace; true if any was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    /// True at end of input or before whitespace.
    fn at_boundary(&self) -> bool {
        self.peek().is_none_or(char::is_whitespace)
    }

    fn ident(&mut self) -> Option<String> {
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    /// A double-quoted string; the cursor is on the opening quote.
    fn quoted(&mut self) -> Option<String> {
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek()? {
                '"' => break,
                '\r' | '\n' => return None,
                _ => self.pos += 1,
            }
        }
        let text = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        self.at_boundary().then_some(text)
    }

    /// A whitespace-free word that does not start with '-' or '"'.
    fn word(&mut self) -> Option<String> {
        match self.peek() {
            None | Some('-') | Some('"') => return None,
            _ => {},
        }
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && c != '"')
        {
            self.pos += 1;
        }
        if self.peek() == Some('"') {
            return None;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    /// An argument value: quoted text, or a run of non-dash, non-quote characters.
    fn value(&mut self) -> Option<String> {
        if self.peek() == Some('"') {
            return self.quoted();
        }
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '-' && c != '"') {
            self.pos += 1;
        }
        let run: String = self.chars[start..self.pos].iter().collect();
        match self.peek() {
            None => Some(run.trim_end().to_string()),
            // The run must end in whitespace before the next argument.
            Some('-') if run.ends_with(char::is_whitespace) => Some(run.trim_end().to_string()),
            _ => None,
        }
    }

    fn invocation(mut self) -> Option<ParsedInvocation> {
        let command = self.ident()?;
        if !self.at_boundary() {
            return None;
        }
        let mut parsed = ParsedInvocation {
            command,
            ..ParsedInvocation::default()
        };

        self.skip_ws();
        // Verb, then the unnamed default value.
        match self.peek() {
            Some('"') => parsed.default_value = self.quoted()?,
            Some('-') | None => {},
            Some(_) => {
                let word = self.word()?;
                if word.chars().next().is_some_and(is_ident_start) && word.chars().all(is_ident_char)
                {
                    parsed.verb = word;
                    self.skip_ws();
                    match self.peek() {
                        Some('"') => parsed.default_value = self.quoted()?,
                        Some('-') | None => {},
                        Some(_) => parsed.default_value = self.word()?,
                    }
                } else {
                    parsed.default_value = word;
                }
            },
        }

        loop {
            self.skip_ws();
            if self.at_end() {
                break;
            }
            if self.peek() != Some('-') {
                return None;
            }
            self.pos += 1;
            if self.peek() == Some('-') {
                self.pos += 1;
            }
            let name = self.ident()?.to_lowercase();
            if !self.at_boundary() {
                return None;
            }
            let mark = self.pos;
            self.skip_ws();
            let value = match self.peek() {
                None => String::new(),
                Some('-') => {
                    self.pos = mark;
                    String::new()
                },
                Some(_) => self.value()?,
            };
            parsed.arguments.push((name, value));
        }
        Some(parsed)
    }
}
