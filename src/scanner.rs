// Lexer for the circuit definition language.
// Translates the raw file into positioned tokens the parser consumes.
// The whole file is held as lines so diagnostics can quote the source.

use crate::names::{NameId, Names};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The four reserved section keywords.
static KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "DEVICE",
    "CONNECT",
    "MONITOR",
    "END",
};

/// Lexical token classification.
///
/// Name tokens are subclassified after reading: all uppercase letters is
/// `NameCaps`, uppercase letters plus at least one digit is
/// `NameCapsNum`, anything else alphanumeric is `NameAlnum`. The grammar
/// keys on these subtypes (port names must be caps / caps+digits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comma,
    Dot,
    Semicolon,
    ConnectionOp,
    Keyword,
    Number,
    OpenParen,
    CloseParen,
    Eof,
    NameCaps,
    NameCapsNum,
    NameAlnum,
    /// Unrecognised character. Carries position so the parser can still
    /// point at it; the character itself is consumed.
    Invalid,
}

impl TokenKind {
    /// True for the three name subtypes (not keywords).
    #[inline]
    #[must_use]
    pub fn is_name(self) -> bool {
        matches!(
            self,
            TokenKind::NameCaps | TokenKind::NameCapsNum | TokenKind::NameAlnum
        )
    }
}

/// One lexical token with its source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Interned id for identifier-like tokens (names and keywords).
    pub name: Option<NameId>,
    /// Literal value for number tokens; round-trips the digits exactly.
    pub value: Option<u32>,
    /// 0-based line of the first character.
    pub line: usize,
    /// 1-based column of the first character.
    pub col: usize,
}

impl Token {
    fn at(kind: TokenKind, line: usize, col: usize) -> Self {
        Token {
            kind,
            name: None,
            value: None,
            line,
            col,
        }
    }
}

/// Failure to read the circuit file. Fatal: the caller reports it and
/// exits nonzero.
#[derive(Debug, thiserror::Error)]
#[error("failed to open {} for reading: {source}", path.display())]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Reads a circuit definition file and hands out tokens one at a time.
///
/// Once the input is exhausted every further call returns the same EOF
/// token. The scanner keeps all source lines for diagnostic printing;
/// `line` accesses them by 0-based index.
pub struct Scanner {
    path: PathBuf,
    lines: Vec<String>,
    line: usize,
    col: usize,
    eof: Option<Token>,
}

impl Scanner {
    /// Opens `path` and buffers its contents. Opening failures are
    /// returned, not printed; the binary treats them as fatal.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let text = fs::read_to_string(path).map_err(|source| ScanError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_source(path, &text))
    }

    /// Builds a scanner over in-memory source, attributing diagnostics
    /// to `path`. Used by tests and the fuzz target.
    #[must_use]
    pub fn from_source(path: &Path, text: &str) -> Self {
        // Keep line terminators out; positions are (line, column) pairs.
        let lines: Vec<String> = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        Scanner {
            path: path.to_path_buf(),
            lines,
            line: 0,
            col: 0,
            eof: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source line by 0-based index, for diagnostic quoting.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty_file(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    /// Current character, or `None` at end of input.
    fn peek(&self) -> Option<char> {
        let line = self.lines.get(self.line)?;
        match line.as_bytes().get(self.col) {
            Some(_) => line[self.col..].chars().next(),
            // Between lines: the split swallowed a '\n'.
            None => {
                if self.line + 1 < self.lines.len() {
                    Some('\n')
                } else {
                    None
                }
            }
        }
    }

    fn advance(&mut self) {
        if let Some(line) = self.lines.get(self.line) {
            if self.col < line.len() {
                let ch_len = line[self.col..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.col += ch_len;
            } else if self.line + 1 < self.lines.len() {
                self.line += 1;
                self.col = 0;
            }
        }
    }

    fn skip_blanks_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '#' {
                // Comment runs to end of line.
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Returns the next token, interning any identifier through `names`.
    pub fn next_token(&mut self, names: &mut Names) -> Token {
        if let Some(eof) = self.eof {
            return eof;
        }
        self.skip_blanks_and_comments();

        let (line, col) = (self.line, self.col + 1);
        let Some(ch) = self.peek() else {
            // End of input: remember the position and repeat it forever.
            // An empty file reports line 0, column 0.
            let tok = if self.lines.is_empty() {
                Token::at(TokenKind::Eof, 0, 0)
            } else {
                Token::at(TokenKind::Eof, line, col)
            };
            self.eof = Some(tok);
            return tok;
        };

        if ch.is_ascii_alphabetic() {
            return self.read_name(names, line, col);
        }
        if ch.is_ascii_digit() {
            return self.read_number(line, col);
        }

        self.advance();
        let kind = match ch {
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::ConnectionOp
                } else {
                    TokenKind::Invalid
                }
            }
            _ => TokenKind::Invalid,
        };
        Token::at(kind, line, col)
    }

    fn read_name(&mut self, names: &mut Names, line: usize, col: usize) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = if KEYWORDS.contains(text.as_str()) {
            TokenKind::Keyword
        } else {
            classify_name(&text)
        };
        let mut tok = Token::at(kind, line, col);
        tok.name = names.intern(&text);
        tok
    }

    fn read_number(&mut self, line: usize, col: usize) -> Token {
        let mut value: u32 = 0;
        while let Some(ch) = self.peek() {
            if let Some(digit) = ch.to_digit(10) {
                value = value.saturating_mul(10).saturating_add(digit);
                self.advance();
            } else {
                break;
            }
        }
        let mut tok = Token::at(TokenKind::Number, line, col);
        tok.value = Some(value);
        tok
    }
}

/// Lexical subclassification of a non-keyword name.
fn classify_name(text: &str) -> TokenKind {
    let has_lower = text.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = text.chars().any(|c| c.is_ascii_digit());
    if has_lower {
        TokenKind::NameAlnum
    } else if has_digit {
        TokenKind::NameCapsNum
    } else {
        TokenKind::NameCaps
    }
}
