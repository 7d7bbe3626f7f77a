use crate::error::{PolyError, Span};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    // Keywords
    KeywordSet,
    KeywordPrint,

    // Single-character tokens
    Semicolon,
    Plus,
    Minus,
    Star,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    LParen,
    RParen,

    // Special
    EndOfInput,
    Error,
}

/// Why the lexer produced an `Error` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    UnexpectedCharacter(char),
    MalformedFloat,
    UnterminatedString,
    UnexpectedEndOfInput,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LexError::UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            LexError::MalformedFloat => write!(f, "a digit must follow the decimal point"),
            LexError::UnterminatedString => write!(f, "string literal runs past the end of the line"),
            LexError::UnexpectedEndOfInput => write!(f, "input ended in the middle of a token"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
    /// Set only on `TokenKind::Error`.
    pub error: Option<LexError>,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, span: Span) -> Self {
        Self {
            kind,
            lexeme,
            span,
            error: None,
        }
    }

    pub fn error(error: LexError, lexeme: String, span: Span) -> Self {
        Self {
            kind: TokenKind::Error,
            lexeme,
            span,
            error: Some(error),
        }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Text to show for this token in a diagnostic.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::EndOfInput => "end of input".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InIdentifier,
    InString,
    InInt,
    InFloat,
    InComment,
}

/// On-demand lexer: each call to `next_token` consumes exactly one token's
/// worth of characters.
pub struct Lexer {
    source: Vec<(usize, char)>,
    len: usize,
    current: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.char_indices().collect(),
            len: source.len(),
            current: 0,
            line: 1,
        }
    }

    /// Line the next character belongs to.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Lexes everything up front. Stops at the first lexical error.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, PolyError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            match token.kind {
                TokenKind::Error => {
                    let reason = token.error.unwrap_or(LexError::UnexpectedEndOfInput);
                    return Err(PolyError::lex_error(token.span, reason.to_string()));
                }
                TokenKind::EndOfInput => {
                    tokens.push(token);
                    return Ok(tokens);
                }
                _ => tokens.push(token),
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.scan_token();
        tracing::trace!(kind = ?token.kind, lexeme = %token.lexeme, line = token.span.line, "token");
        token
    }

    fn scan_token(&mut self) -> Token {
        let mut state = State::Start;
        let mut lexeme = String::new();
        let mut start = self.offset();
        let mut line = self.line;

        while let Some(c) = self.advance() {
            match state {
                State::Start => {
                    if c == '\n' {
                        self.line += 1;
                        continue;
                    }
                    if c.is_whitespace() {
                        continue;
                    }

                    start = self.offset() - c.len_utf8();
                    line = self.line;

                    match c {
                        c if c.is_ascii_alphabetic() => {
                            state = State::InIdentifier;
                            lexeme.push(c);
                        }
                        c if c.is_ascii_digit() => {
                            state = State::InInt;
                            lexeme.push(c);
                        }
                        '-' if self.peek().is_some_and(|next| next.is_ascii_digit()) => {
                            // Leading sign on a number
                            state = State::InInt;
                            lexeme.push(c);
                        }
                        '#' => state = State::InComment,
                        '"' => {
                            state = State::InString;
                            lexeme.push(c);
                        }
                        c => {
                            let span = Span::new(start, self.offset(), line);
                            return match single_char_kind(c) {
                                Some(kind) => Token::new(kind, c.to_string(), span),
                                None => Token::error(
                                    LexError::UnexpectedCharacter(c),
                                    c.to_string(),
                                    span,
                                ),
                            };
                        }
                    }
                }
                State::InIdentifier => {
                    if c.is_ascii_alphanumeric() {
                        lexeme.push(c);
                    } else {
                        self.put_back();
                        let kind = match lexeme.as_str() {
                            "set" => TokenKind::KeywordSet,
                            "print" => TokenKind::KeywordPrint,
                            _ => TokenKind::Identifier,
                        };
                        return Token::new(kind, lexeme, Span::new(start, self.offset(), line));
                    }
                }
                State::InString => match c {
                    '"' => {
                        lexeme.push(c);
                        return Token::new(
                            TokenKind::StringLiteral,
                            lexeme,
                            Span::new(start, self.offset(), line),
                        );
                    }
                    '\n' => {
                        let span = Span::new(start, self.offset() - 1, line);
                        self.line += 1;
                        return Token::error(LexError::UnterminatedString, lexeme, span);
                    }
                    c => lexeme.push(c),
                },
                State::InInt => {
                    if c.is_ascii_digit() {
                        lexeme.push(c);
                    } else if c == '.' {
                        lexeme.push(c);
                        if self.peek().is_some_and(|next| next.is_ascii_digit()) {
                            state = State::InFloat;
                        } else {
                            return Token::error(
                                LexError::MalformedFloat,
                                lexeme,
                                Span::new(start, self.offset(), line),
                            );
                        }
                    } else {
                        self.put_back();
                        return Token::new(
                            TokenKind::IntLiteral,
                            lexeme,
                            Span::new(start, self.offset(), line),
                        );
                    }
                }
                State::InFloat => {
                    if c.is_ascii_digit() {
                        lexeme.push(c);
                    } else {
                        self.put_back();
                        return Token::new(
                            TokenKind::FloatLiteral,
                            lexeme,
                            Span::new(start, self.offset(), line),
                        );
                    }
                }
                State::InComment => {
                    if c == '\n' {
                        self.line += 1;
                        state = State::Start;
                    }
                }
            }
        }

        match state {
            State::Start | State::InString | State::InComment => Token::new(
                TokenKind::EndOfInput,
                String::new(),
                Span::new(self.len, self.len, self.line),
            ),
            State::InIdentifier | State::InInt | State::InFloat => Token::error(
                LexError::UnexpectedEndOfInput,
                lexeme,
                Span::new(start, self.len, line),
            ),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let (_, c) = *self.source.get(self.current)?;
        self.current += 1;
        Some(c)
    }

    /// Un-reads the last character so it starts the next token.
    fn put_back(&mut self) {
        self.current -= 1;
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).map(|&(_, c)| c)
    }

    /// Byte offset of the next unread character.
    fn offset(&self) -> usize {
        self.source
            .get(self.current)
            .map_or(self.len, |&(offset, _)| offset)
    }
}

fn single_char_kind(c: char) -> Option<TokenKind> {
    let kind = match c {
        ';' => TokenKind::Semicolon,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        ',' => TokenKind::Comma,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        _ => return None,
    };
    Some(kind)
}
