//! Tickscript Parser
//!
//! Line-oriented parser. Each call turns exactly one line's tokens into one
//! statement; `if`/`while` come back with an empty body that the caller
//! fills with statements parsed from later lines.
//!
//! Expressions are reduced by precedence climbing over a flat token run:
//! the heaviest operator becomes the root and its left and right slices
//! are reduced recursively. Among operators of equal weight the rightmost
//! one wins, which makes chains like `1 - 2 - 3` left-associative.

use crate::error::{Result, ScriptError};
use crate::lang::ast::*;
use crate::lang::lexer::{tokenize, Token};

/// Tickscript line parser
pub struct Parser;

/// One element of an expression run after call sites have been folded
#[derive(Debug)]
enum Piece<'t> {
    Token(&'t Token),
    Call(Expr),
}

impl Parser {
    /// Tokenize and parse a single line of source text
    pub fn parse(line: &str) -> Result<Stmt> {
        let tokens = tokenize(line)?;
        Self::parse_line(&tokens)
    }

    /// Parse one line's tokens into a statement
    pub fn parse_line(tokens: &[Token]) -> Result<Stmt> {
        let first = tokens
            .first()
            .ok_or_else(|| syntax_error("empty statement"))?;

        match first {
            Token::Identifier(name) => match tokens.get(1) {
                Some(Token::LParen) => {
                    let (inner, rest) = Self::parenthesized(tokens, 1)?;
                    Self::expect_end(rest)?;
                    Ok(Stmt::Call {
                        name: name.clone(),
                        args: Self::arguments(inner)?,
                    })
                }
                Some(Token::Assign) => Ok(Stmt::Assign {
                    name: name.clone(),
                    value: Self::expression(&tokens[2..])?,
                }),
                _ => Err(syntax_error(format!(
                    "expected '(' or '=' after '{}'",
                    name
                ))),
            },

            Token::If | Token::While => {
                if !matches!(tokens.get(1), Some(Token::LParen)) {
                    return Err(syntax_error(format!("expected '(' after '{}'", first)));
                }

                let (inner, rest) = Self::parenthesized(tokens, 1)?;

                // Headers may carry the opening brace of their body
                let rest = match rest {
                    [Token::LBrace, tail @ ..] => tail,
                    _ => rest,
                };
                Self::expect_end(rest)?;

                let condition = Self::expression(inner)?;
                let body = Vec::new();

                Ok(if matches!(first, Token::If) {
                    Stmt::If { condition, body }
                } else {
                    Stmt::While { condition, body }
                })
            }

            Token::Var => match (tokens.get(1), tokens.get(2)) {
                (Some(Token::Identifier(name)), Some(Token::Assign)) => Ok(Stmt::Var {
                    name: name.clone(),
                    initializer: Self::expression(&tokens[3..])?,
                }),
                _ => Err(syntax_error("expected 'var <name> = <expression>'")),
            },

            Token::Break => {
                Self::expect_end(&tokens[1..])?;
                Ok(Stmt::Break)
            }

            Token::Yield => {
                Self::expect_end(&tokens[1..])?;
                Ok(Stmt::Yield)
            }

            other => Err(syntax_error(format!(
                "unexpected '{}' at start of statement",
                other
            ))),
        }
    }

    /// Split the tokens after `tokens[open]` (an opening parenthesis) into
    /// the enclosed run and whatever follows the matching close.
    fn parenthesized(tokens: &[Token], open: usize) -> Result<(&[Token], &[Token])> {
        let mut depth = 0usize;

        for (i, token) in tokens.iter().enumerate().skip(open + 1) {
            match token {
                Token::LParen => depth += 1,
                Token::RParen if depth == 0 => {
                    return Ok((&tokens[open + 1..i], &tokens[i + 1..]));
                }
                Token::RParen => depth -= 1,
                _ => {}
            }
        }

        Err(syntax_error("missing ')'"))
    }

    fn expect_end(rest: &[Token]) -> Result<()> {
        match rest.first() {
            None => Ok(()),
            Some(token) => Err(syntax_error(format!(
                "unexpected '{}' after end of statement",
                token
            ))),
        }
    }

    /// Parse a call's argument list, splitting on commas outside nested calls
    fn arguments(tokens: &[Token]) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if tokens.is_empty() {
            return Ok(args);
        }

        let mut depth = 0usize;
        let mut start = 0;

        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::Comma if depth == 0 => {
                    args.push(Self::expression(&tokens[start..i])?);
                    start = i + 1;
                }
                _ => {}
            }
        }

        args.push(Self::expression(&tokens[start..])?);
        Ok(args)
    }

    /// Reduce a token run to an expression tree
    fn expression(tokens: &[Token]) -> Result<Expr> {
        let mut pieces = Vec::with_capacity(tokens.len());
        let mut i = 0;

        while i < tokens.len() {
            match (&tokens[i], tokens.get(i + 1)) {
                (Token::Identifier(name), Some(Token::LParen)) => {
                    let (inner, _) = Self::parenthesized(tokens, i + 1)?;
                    let args = Self::arguments(inner)?;
                    pieces.push(Piece::Call(Expr::Call {
                        name: name.clone(),
                        args,
                    }));
                    // name, '(', arguments, ')'
                    i += inner.len() + 3;
                }
                (token, _) => {
                    pieces.push(Piece::Token(token));
                    i += 1;
                }
            }
        }

        Self::climb(pieces)
    }

    fn climb(mut pieces: Vec<Piece<'_>>) -> Result<Expr> {
        match pieces.len() {
            0 => return Err(syntax_error("missing operand")),
            1 => {
                let piece = pieces.pop().ok_or_else(|| syntax_error("missing operand"))?;
                return Self::leaf(piece);
            }
            _ => {}
        }

        let mut best: Option<(usize, BinaryOp)> = None;
        for (i, piece) in pieces.iter().enumerate() {
            if let Piece::Token(token) = piece {
                if let Some(op) = BinaryOp::from_token(token) {
                    match best {
                        Some((_, current)) if op.weight() < current.weight() => {}
                        _ => best = Some((i, op)),
                    }
                }
            }
        }

        let (index, op) = best.ok_or_else(|| ScriptError::NoOperatorFound(describe(&pieces)))?;

        let right = pieces.split_off(index + 1);
        pieces.truncate(index);
        let left = pieces;

        Ok(Expr::Binary {
            left: Box::new(Self::climb(left)?),
            op,
            right: Box::new(Self::climb(right)?),
        })
    }

    /// Convert a single operand into an expression leaf
    fn leaf(piece: Piece<'_>) -> Result<Expr> {
        let token = match piece {
            Piece::Call(call) => return Ok(call),
            Piece::Token(token) => token,
        };

        match token {
            Token::Number(text) => {
                let value = text
                    .parse::<f64>()
                    .map_err(|_| syntax_error(format!("invalid number literal '{}'", text)))?;
                if !value.is_finite() {
                    return Err(syntax_error(format!("number literal out of range '{}'", text)));
                }
                Ok(Expr::Number(value))
            }
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Identifier(name) => Ok(Expr::Variable(name.clone())),
            other => Err(ScriptError::UnexpectedNodeKind(format!(
                "{} '{}' cannot be used as a value",
                other.kind_name(),
                other
            ))),
        }
    }
}

fn syntax_error(message: impl Into<String>) -> ScriptError {
    ScriptError::SyntaxError(message.into())
}

fn describe(pieces: &[Piece<'_>]) -> String {
    pieces
        .iter()
        .map(|piece| match piece {
            Piece::Token(token) => token.to_string(),
            Piece::Call(call) => call.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
