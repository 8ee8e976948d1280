use std::fmt;

use logos::Logos;

use crate::error::SyntaxError;

/// A position in script source.
///
/// `index` is a byte offset; `line` and `column` are 1-based, with columns
/// counted in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    /// Byte offset into the source.
    pub index: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl Location {
    /// Create a location.
    pub fn new(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The kind of a script token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Module or function name.
    Identifier,
    /// Numeric literal, optionally negative and decimal.
    Number,
    /// `true` or `false`.
    Boolean,
    /// `#rgb` or `#rrggbb`, always lowercased.
    HexColor,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// A newline or `;`.
    StatementEnd,
    /// End of input. Always the last token.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identifier => "identifier",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::HexColor => "hex color",
            Self::Dot => "'.'",
            Self::Comma => "','",
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::StatementEnd => "end of statement",
            Self::Eof => "end of input",
        };
        f.write_str(name)
    }
}

/// A lexed token with its source text and position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Source text; hex colors are lowercased, `Eof` is empty.
    pub lexeme: String,
    /// Where the token starts.
    pub location: Location,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier | TokenKind::Number | TokenKind::Boolean | TokenKind::HexColor => {
                write!(f, "'{}'", self.lexeme)
            }
            TokenKind::StatementEnd if self.lexeme == ";" => f.write_str("';'"),
            TokenKind::StatementEnd => f.write_str("newline"),
            kind => write!(f, "{kind}"),
        }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"#([^0-9a-fA-F\n][^\n]*)?")]
enum RawToken {
    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("\n")]
    #[token(";")]
    StatementEnd,

    #[token("true")]
    #[token("false")]
    Boolean,

    #[regex(r"#[0-9a-fA-F]+")]
    HexRun,

    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r"-?[0-9]+\.")]
    MalformedDecimal,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
}

/// Tracks line and column while walking forward through the source.
struct Cursor<'a> {
    source: &'a str,
    location: Location,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            location: Location::new(0, 1, 1),
        }
    }

    /// Move to `index`, which must not be behind the current position.
    fn seek(&mut self, index: usize) -> Location {
        for ch in self.source[self.location.index..index].chars() {
            if ch == '\n' {
                self.location.line += 1;
                self.location.column = 1;
            } else {
                self.location.column += 1;
            }
        }
        self.location.index = index;
        self.location
    }
}

/// Split script source into tokens.
///
/// Stops at the first invalid input. On success the last token is always
/// [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut cursor = Cursor::new(source);
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let location = cursor.seek(span.start);
        let slice = lexer.slice();

        let kind = match result {
            Ok(RawToken::Dot) => TokenKind::Dot,
            Ok(RawToken::Comma) => TokenKind::Comma,
            Ok(RawToken::LeftParen) => TokenKind::LeftParen,
            Ok(RawToken::RightParen) => TokenKind::RightParen,
            Ok(RawToken::StatementEnd) => TokenKind::StatementEnd,
            Ok(RawToken::Boolean) => TokenKind::Boolean,
            Ok(RawToken::Number) => TokenKind::Number,
            Ok(RawToken::Identifier) => TokenKind::Identifier,
            Ok(RawToken::HexRun) => {
                let digits = slice.len() - 1;
                if digits != 3 && digits != 6 {
                    return Err(SyntaxError::new("Invalid hex color literal", location));
                }
                tokens.push(Token {
                    kind: TokenKind::HexColor,
                    lexeme: slice.to_ascii_lowercase(),
                    location,
                });
                continue;
            }
            Ok(RawToken::MalformedDecimal) => {
                return Err(SyntaxError::new("Malformed decimal literal", location));
            }
            Err(()) => {
                let ch = source[span.start..].chars().next().unwrap_or_default();
                return Err(SyntaxError::new(format!("Unexpected character '{ch}'"), location));
            }
        };

        tokens.push(Token {
            kind,
            lexeme: slice.to_string(),
            location,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        location: cursor.seek(source.len()),
    });
    Ok(tokens)
}
