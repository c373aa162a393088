//! Lexer (tokenizer) and token source for tinyj source code
//!
//! Converts raw source text into a flat [`Token`] vector, then serves it to
//! the parser one lookahead token at a time through [`TokenSource`].
//!
//! Operator tokens are grouped by class the way the grammar consumes them:
//! every assignment operator is a [`Symbol::Assign`], every relational
//! operator a [`Symbol::Rel`], and so on, with the concrete operator as the
//! payload. Recovery sets match by class, so `Symbol::Ari(AriOp::Add)` in a
//! stop set stands for "any arithmetic operator".

use super::ast::{AriOp, AssignOp, DupOp, LogOp, RelOp, SourceLocation};
use std::fmt;

/// Symbol code of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    // Literals and identifiers
    Ident,
    IntLit,
    CharLit,
    FloatLit,
    StringLit,

    // Keywords
    Int,
    Char,
    Float,
    Str,
    Void,
    Class,
    Struct,
    If,
    Else,
    While,
    Break,
    Continue,
    Return,
    True,
    False,

    // Operator classes
    Assign(AssignOp),
    Rel(RelOp),
    Log(LogOp),
    Ari(AriOp),
    Dup(DupOp),

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,

    Eof,
}

impl Symbol {
    /// True when both symbols belong to the same class, ignoring operator payloads.
    pub fn same_class(&self, other: &Symbol) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn is_prim_type(&self) -> bool {
        matches!(self, Symbol::Int | Symbol::Char | Symbol::Float | Symbol::Str)
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Symbol::IntLit | Symbol::CharLit | Symbol::FloatLit | Symbol::StringLit
        )
    }
}

/// Literal payload carried by a token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Int(i64),
    Char(u8),
    Float(f64),
    Str(String),
}

/// One lexical token.
///
/// `text` is the lexeme as written (including a folded sign on signed
/// literals), so identifiers and `true`/`false` can be labelled from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub symbol: Symbol,
    pub text: String,
    pub value: TokenValue,
    pub location: SourceLocation,
}

impl Token {
    fn new(symbol: Symbol, text: impl Into<String>, location: SourceLocation) -> Self {
        Token {
            symbol,
            text: text.into(),
            value: TokenValue::None,
            location,
        }
    }

    fn with_value(mut self, value: TokenValue) -> Self {
        self.value = value;
        self
    }

    /// Integer payload of integer and char literals, 0 otherwise
    pub fn int_value(&self) -> i64 {
        match self.value {
            TokenValue::Int(n) => n,
            TokenValue::Char(c) => c as i64,
            _ => 0,
        }
    }

    /// True for a literal whose lexeme starts with an explicit `+` or `-`
    pub fn is_signed_literal(&self) -> bool {
        self.symbol.is_literal() && (self.text.starts_with('+') || self.text.starts_with('-'))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol {
            Symbol::IntLit => write!(f, "int literal {}", self.text),
            Symbol::FloatLit => write!(f, "float literal {}", self.text),
            Symbol::CharLit => write!(f, "char literal {}", self.text),
            Symbol::StringLit => write!(f, "string literal {}", self.text),
            Symbol::Ident => write!(f, "identifier '{}'", self.text),
            Symbol::Eof => write!(f, "end of file"),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// Lexer error type
#[derive(thiserror::Error, Debug)]
#[error("Lexer error at {location}: {message}")]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lookahead interface the parser consumes.
pub trait TokenSource {
    /// The lookahead token
    fn current(&self) -> &Token;

    /// Consume the lookahead token and return it
    fn advance(&mut self) -> Token;

    /// Discard tokens until one whose class is in `stop` (or end of input) is current
    fn skip_until(&mut self, stop: &[Symbol]);
}

/// [`TokenSource`] over a pre-tokenized vector. Past the end it keeps
/// yielding the trailing `Eof` token.
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.symbol == Symbol::Eof) {
            let location = tokens
                .last()
                .map(|t| t.location)
                .unwrap_or_else(|| SourceLocation::new(1, 1));
            tokens.push(Token::new(Symbol::Eof, "", location));
        }
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn from_source(source: &str, signed_literals: bool) -> Result<Self, LexError> {
        let tokens = Lexer::new(source)
            .with_signed_literals(signed_literals)
            .tokenize()?;
        Ok(Self::new(tokens))
    }
}

impl TokenSource for TokenStream {
    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        if token.symbol != Symbol::Eof {
            self.position += 1;
        }
        log::trace!("consumed {} at {}", token, token.location);
        token
    }

    fn skip_until(&mut self, stop: &[Symbol]) {
        let start = self.position;
        loop {
            let symbol = self.current().symbol;
            if symbol == Symbol::Eof || stop.iter().any(|s| s.same_class(&symbol)) {
                break;
            }
            self.position += 1;
        }
        if self.position > start {
            log::debug!(
                "recovery skipped {} token(s), resuming at {}",
                self.position - start,
                self.current()
            );
        }
    }
}

/// Lexer for tinyj source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    signed_literals: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            signed_literals: false,
        }
    }

    /// Fold a `+`/`-` that directly precedes a digit into the numeric literal
    pub fn with_signed_literals(mut self, enabled: bool) -> Self {
        self.signed_literals = enabled;
        self
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(Token::new(Symbol::Eof, "", self.current_location()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        let op = |symbol: Symbol, text: &str| Ok(Token::new(symbol, text, loc));

        match ch {
            '"' => self.string_literal(loc),
            '\'' => self.char_literal(loc),
            '0'..='9' => self.number_literal(ch.to_string(), loc),
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.identifier_or_keyword(ch, loc)),

            '+' | '-' if self.signed_literals && self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(ch.to_string(), loc)
            }
            '+' => {
                if self.eat('+') {
                    op(Symbol::Dup(DupOp::Inc), "++")
                } else if self.eat('=') {
                    op(Symbol::Assign(AssignOp::Add), "+=")
                } else {
                    op(Symbol::Ari(AriOp::Add), "+")
                }
            }
            '-' => {
                if self.eat('-') {
                    op(Symbol::Dup(DupOp::Dec), "--")
                } else if self.eat('=') {
                    op(Symbol::Assign(AssignOp::Sub), "-=")
                } else {
                    op(Symbol::Ari(AriOp::Sub), "-")
                }
            }
            '*' => {
                if self.eat('=') {
                    op(Symbol::Assign(AssignOp::Mul), "*=")
                } else {
                    op(Symbol::Ari(AriOp::Mul), "*")
                }
            }
            '/' => {
                if self.eat('=') {
                    op(Symbol::Assign(AssignOp::Div), "/=")
                } else {
                    op(Symbol::Ari(AriOp::Div), "/")
                }
            }
            '%' => {
                if self.eat('=') {
                    op(Symbol::Assign(AssignOp::Mod), "%=")
                } else {
                    op(Symbol::Ari(AriOp::Mod), "%")
                }
            }
            '=' => {
                if self.eat('=') {
                    op(Symbol::Rel(RelOp::Eq), "==")
                } else {
                    op(Symbol::Assign(AssignOp::Assign), "=")
                }
            }
            '!' => {
                if self.eat('=') {
                    op(Symbol::Rel(RelOp::Ne), "!=")
                } else {
                    op(Symbol::Log(LogOp::Not), "!")
                }
            }
            '<' => {
                if self.eat('=') {
                    op(Symbol::Rel(RelOp::Le), "<=")
                } else {
                    op(Symbol::Rel(RelOp::Lt), "<")
                }
            }
            '>' => {
                if self.eat('=') {
                    op(Symbol::Rel(RelOp::Ge), ">=")
                } else {
                    op(Symbol::Rel(RelOp::Gt), ">")
                }
            }
            '&' if self.eat('&') => op(Symbol::Log(LogOp::And), "&&"),
            '|' if self.eat('|') => op(Symbol::Log(LogOp::Or), "||"),
            '(' => op(Symbol::LParen, "("),
            ')' => op(Symbol::RParen, ")"),
            '{' => op(Symbol::LBrace, "{"),
            '}' => op(Symbol::RBrace, "}"),
            '[' => op(Symbol::LBracket, "["),
            ']' => op(Symbol::RBracket, "]"),
            ';' => op(Symbol::Semicolon, ";"),
            ',' => op(Symbol::Comma, ","),

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    fn unescape(&mut self, context: &str) -> Result<char, LexError> {
        let escaped = self.advance().ok_or_else(|| LexError {
            message: format!("Unexpected end of file in {}", context),
            location: self.current_location(),
        })?;

        match escaped {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            '\\' => Ok('\\'),
            '"' => Ok('"'),
            '\'' => Ok('\''),
            '0' => Ok('\0'),
            _ => Err(LexError {
                message: format!("Unknown escape sequence: \\{}", escaped),
                location: self.current_location(),
            }),
        }
    }

    /// Parse string literal
    fn string_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let start = self.position - 1;
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            if ch == '"' {
                self.advance(); // consume closing quote
                let text: String = self.input[start..self.position].iter().collect();
                return Ok(Token::new(Symbol::StringLit, text, loc)
                    .with_value(TokenValue::Str(string)));
            }

            if ch == '\\' {
                self.advance();
                string.push(self.unescape("string literal")?);
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Parse character literal
    fn char_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let start = self.position - 1;
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file in character literal".to_string(),
            location: self.current_location(),
        })?;

        let value = if ch == '\\' {
            self.unescape("character literal")?
        } else {
            ch
        };

        if self.advance() != Some('\'') {
            return Err(LexError {
                message: "Expected closing quote in character literal".to_string(),
                location: self.current_location(),
            });
        }

        if !value.is_ascii() {
            return Err(LexError {
                message: format!("Character literal out of range: '{}'", value),
                location: loc,
            });
        }

        let text: String = self.input[start..self.position].iter().collect();
        Ok(Token::new(Symbol::CharLit, text, loc).with_value(TokenValue::Char(value as u8)))
    }

    /// Parse numeric literal. `text` holds what was already consumed (a digit or a sign).
    fn number_literal(&mut self, mut text: String, loc: SourceLocation) -> Result<Token, LexError> {
        self.take_digits(&mut text);

        let is_float = self.peek() == Some('.')
            && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            text.push('.');
            self.advance();
            self.take_digits(&mut text);

            let value = text.parse::<f64>().map_err(|_| LexError {
                message: format!("Invalid float literal: {}", text),
                location: loc,
            })?;
            return Ok(Token::new(Symbol::FloatLit, text, loc).with_value(TokenValue::Float(value)));
        }

        let value = text.parse::<i64>().map_err(|_| LexError {
            message: format!("Invalid integer literal: {}", text),
            location: loc,
        })?;

        Ok(Token::new(Symbol::IntLit, text, loc).with_value(TokenValue::Int(value)))
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let symbol = match ident.as_str() {
            "int" => Symbol::Int,
            "char" => Symbol::Char,
            "float" => Symbol::Float,
            "string" => Symbol::Str,
            "void" => Symbol::Void,
            "class" => Symbol::Class,
            "struct" => Symbol::Struct,
            "if" => Symbol::If,
            "else" => Symbol::Else,
            "while" => Symbol::While,
            "break" => Symbol::Break,
            "continue" => Symbol::Continue,
            "return" => Symbol::Return,
            "true" => Symbol::True,
            "false" => Symbol::False,
            _ => Symbol::Ident,
        };

        Token::new(symbol, ident, loc)
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}
