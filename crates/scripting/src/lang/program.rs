//! Multi-line program loading
//!
//! `Parser` only sees one line at a time. Loading a whole source text adds
//! the block structure on top: a header line opens a body, a `}` line closes
//! the innermost one.

use crate::error::{Result, ScriptError};
use crate::lang::ast::{Program, Stmt};
use crate::lang::lexer::{tokenize, Token};
use crate::lang::parser::Parser;
use tracing::debug;

impl Program {
    /// Build a program tree from source text
    pub fn load(source: &str) -> Result<Program> {
        let mut statements = Vec::new();
        // Headers whose bodies are still being filled, innermost last
        let mut open: Vec<Stmt> = Vec::new();

        for (index, line) in source.lines().enumerate() {
            let line_no = index + 1;
            let tokens = tokenize(line).map_err(|err| err.at_line(line_no))?;

            match tokens.first() {
                None => continue,
                Some(Token::RBrace) => {
                    if tokens.len() > 1 {
                        return Err(ScriptError::SyntaxError(format!(
                            "unexpected '{}' after '}}'",
                            tokens[1]
                        ))
                        .at_line(line_no));
                    }

                    let block = open.pop().ok_or_else(|| {
                        ScriptError::SyntaxError("'}' without an open block".into())
                            .at_line(line_no)
                    })?;
                    append(&mut statements, &mut open, block);
                }
                Some(_) => {
                    let stmt = Parser::parse_line(&tokens).map_err(|err| err.at_line(line_no))?;
                    if stmt.has_body() {
                        open.push(stmt);
                    } else {
                        append(&mut statements, &mut open, stmt);
                    }
                }
            }
        }

        if !open.is_empty() {
            debug!(blocks = open.len(), "closing blocks left open at end of input");
        }
        while let Some(block) = open.pop() {
            append(&mut statements, &mut open, block);
        }

        Ok(Program::new(statements))
    }
}

/// Append to the innermost open body, or the program root
fn append(statements: &mut Vec<Stmt>, open: &mut [Stmt], stmt: Stmt) {
    match open.last_mut().and_then(Stmt::body_mut) {
        Some(body) => body.push(stmt),
        None => statements.push(stmt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ast::{BinaryOp, Expr};

    #[test]
    fn test_load_flat() {
        let program = Program::load("var x = 1\n\n   \nPrint(x)\n").unwrap();
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(program.statements[0], Stmt::Var { .. }));
        assert!(Program::load("").unwrap().is_empty());
    }

    #[test]
    fn test_load_nesting() {
        let source = "\
var i = 0
while (i < 3) {
    i = i + 1
    if (i > 1)
        Print(i)
    }
    yield
}
Print(0)";
        let program = Program::load(source).unwrap();
        assert_eq!(program.statements.len(), 3);

        let body = program.statements[1].body().unwrap();
        assert_eq!(body.len(), 3);
        assert!(matches!(body[0], Stmt::Assign { .. }));
        assert_eq!(body[1].body().unwrap().len(), 1);
        assert_eq!(body[2], Stmt::Yield);

        assert_eq!(
            program.statements[2],
            Stmt::Call {
                name: "Print".into(),
                args: vec![Expr::Number(0.0)]
            }
        );
    }

    #[test]
    fn test_load_closes_open_blocks() {
        let program = Program::load("while (true)\nif (false)\nbreak").unwrap();
        assert_eq!(program.statements.len(), 1);

        let outer = program.statements[0].body().unwrap();
        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].body().unwrap(), &[Stmt::Break]);
    }

    #[test]
    fn test_display_round_trip() {
        let source = "\
var x = 20+20*2+4/2
var y = 1+2+3+4+5
while(x > y)
x = x - 10
if (Max(x, 3) < 5) {
break
}
DrawTriangle(x, y, 0.5, 1, 0, 0)
yield
}";
        let program = Program::load(source).unwrap();
        let rendered = program.to_string();

        assert!(rendered.starts_with("var x = 20 + 20 * 2 + 4 / 2\n"));
        assert!(rendered.contains("\n    if (Max(x, 3) < 5) {\n        break\n    }\n"));
        assert_eq!(Program::load(&rendered).unwrap(), program);
    }

    #[test]
    fn test_round_trip_large_literal() {
        let source = format!("var x = {}\nPrint(x)", "9".repeat(300));
        let program = Program::load(&source).unwrap();
        assert_eq!(Program::load(&program.to_string()).unwrap(), program);

        let err = Program::load(&format!("var x = {}", "9".repeat(400))).unwrap_err();
        assert!(matches!(err, ScriptError::Line { line: 1, .. }));
    }

    #[test]
    fn test_stray_close() {
        let err = Program::load("Print(1)\n}").unwrap_err();
        match err {
            ScriptError::Line { line, source } => {
                assert_eq!(line, 2);
                assert!(matches!(*source, ScriptError::SyntaxError(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(Program::load("if (true)\n} yield").is_err());
    }

    #[test]
    fn test_error_line_number() {
        let err = Program::load("var x = 1\nvar y = 2\nx = 1 +\n").unwrap_err();
        assert!(matches!(err, ScriptError::Line { line: 3, .. }));

        let err = Program::load("\n\nPrint(1 % 2)").unwrap_err();
        match err {
            ScriptError::Line { line, source } => {
                assert_eq!(line, 3);
                assert!(matches!(*source, ScriptError::UnknownCharacter { ch: '%', .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_serialize_tree() {
        let program = Program::load("var x = 1 + 2").unwrap();
        let json = serde_json::to_value(&program).unwrap();

        let expected = Expr::Binary {
            left: Box::new(Expr::Number(1.0)),
            op: BinaryOp::Add,
            right: Box::new(Expr::Number(2.0)),
        };
        assert_eq!(
            json["statements"][0]["Var"]["initializer"],
            serde_json::to_value(&expected).unwrap()
        );
        assert_eq!(json["statements"][0]["Var"]["name"], "x");
    }
}
