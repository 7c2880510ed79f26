//! Tickscript Lexer
//!
//! Lexical analysis for one line of Tickscript source.

use crate::error::{Result, ScriptError};
use serde::Serialize;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Tickscript token types
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Token {
    // Literals
    /// Raw numeric lexeme. Kept as text so malformed runs like `1.2.3`
    /// survive lexing and are rejected by the parser.
    Number(String),
    Identifier(String),

    // Keywords
    If,
    While,
    Var,
    Break,
    True,
    False,
    Yield,

    // Operators
    Plus,           // +
    Minus,          // -
    Star,           // *
    Slash,          // /
    Less,           // <
    Greater,        // >

    // Delimiters
    Assign,         // =
    LParen,         // (
    RParen,         // )
    LBrace,         // {
    RBrace,         // }
    Comma,          // ,

    // End of input
    EOF,
}

impl Token {
    /// The source text this token was read from
    pub fn lexeme(&self) -> &str {
        match self {
            Token::Number(text) | Token::Identifier(text) => text,
            Token::If => "if",
            Token::While => "while",
            Token::Var => "var",
            Token::Break => "break",
            Token::True => "true",
            Token::False => "false",
            Token::Yield => "yield",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Less => "<",
            Token::Greater => ">",
            Token::Assign => "=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::EOF => "",
        }
    }

    /// Name of the token kind, without any payload
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Number(_) => "Number",
            Token::Identifier(_) => "Varname",
            Token::If => "If",
            Token::While => "While",
            Token::Var => "Var",
            Token::Break => "Break",
            Token::True => "True",
            Token::False => "False",
            Token::Yield => "Yield",
            Token::Plus => "Add",
            Token::Minus => "Sub",
            Token::Star => "Mul",
            Token::Slash => "Div",
            Token::Less => "LT",
            Token::Greater => "MT",
            Token::Assign => "Equals",
            Token::LParen => "OpenParen",
            Token::RParen => "CloseParen",
            Token::LBrace => "OpenCurly",
            Token::RBrace => "CloseCurly",
            Token::Comma => "Comma",
            Token::EOF => "EOF",
        }
    }

    /// Check the token kind, ignoring any payload
    pub fn is(&self, other: &Token) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.lexeme())
    }
}

/// Tickscript lexer
pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    column: usize,
    ch: Option<char>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let ch = chars.next();
        Self {
            input: chars,
            column: 1,
            ch,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let ch = match self.ch {
            None => return Ok(Token::EOF),
            Some(ch) => ch,
        };

        let token = match ch {
            'a'..='z' | 'A'..='Z' | '_' => return Ok(self.read_identifier()),
            '0'..='9' => return Ok(self.read_number()),

            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '<' => Token::Less,
            '>' => Token::Greater,
            '=' => Token::Assign,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,

            _ => {
                return Err(ScriptError::UnknownCharacter {
                    ch,
                    column: self.column,
                })
            }
        };

        self.advance();
        Ok(token)
    }

    /// Read a number literal
    fn read_number(&mut self) -> Token {
        let mut text = String::new();

        while let Some(ch) = self.ch {
            if ch.is_ascii_digit() || ch == '.' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::Number(text)
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(ch) = self.ch {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "if" => Token::If,
            "while" => Token::While,
            "var" => Token::Var,
            "break" => Token::Break,
            "true" => Token::True,
            "false" => Token::False,
            "yield" => Token::Yield,
            _ => Token::Identifier(ident),
        }
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.ch = self.input.next();
        self.column += 1;
    }

    /// Skip whitespace
    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r' | '\n') = self.ch {
            self.advance();
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(Token::EOF) => None,
            other => Some(other),
        }
    }
}

/// Tokenize a whole line. The first unknown character aborts the line.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).collect()
}
