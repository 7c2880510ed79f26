//! Tickscript Abstract Syntax Tree
//!
//! AST nodes for Tickscript statements and expressions. The tree owns its
//! children outright; there are no back references.

use crate::lang::lexer::Token;
use serde::Serialize;
use std::fmt;

/// Tickscript expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Number literal
    Number(f64),

    /// Boolean literal
    Bool(bool),

    /// Variable reference
    Variable(String),

    /// Binary operation
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// Builtin call whose result is used as a value
    Call { name: String, args: Vec<Expr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Less,
    Greater,
}

impl BinaryOp {
    /// Map an operator token, or `None` if the token isn't an operator
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Less => Some(BinaryOp::Less),
            Token::Greater => Some(BinaryOp::Greater),
            _ => None,
        }
    }

    /// Precedence weight. Heavier operators sit closer to the root of an
    /// expression tree and are evaluated last.
    pub fn weight(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div => 0,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Less | BinaryOp::Greater => 10,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
        }
    }
}

/// Tickscript statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Builtin call used as a statement; any result is discarded
    Call { name: String, args: Vec<Expr> },

    /// Assignment to a declared variable
    Assign { name: String, value: Expr },

    /// Variable declaration
    Var { name: String, initializer: Expr },

    /// If statement
    If { condition: Expr, body: Vec<Stmt> },

    /// While loop
    While { condition: Expr, body: Vec<Stmt> },

    /// Break statement
    Break,

    /// Suspend until the host resumes
    Yield,
}

impl Stmt {
    /// Nested body of an `if`/`while`, for callers that build the tree line by line
    pub fn body_mut(&mut self) -> Option<&mut Vec<Stmt>> {
        match self {
            Stmt::If { body, .. } | Stmt::While { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&[Stmt]> {
        match self {
            Stmt::If { body, .. } | Stmt::While { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn has_body(&self) -> bool {
        self.body().is_some()
    }

    fn write_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        let indent = "    ".repeat(depth);
        match self {
            Stmt::Call { name, args } => {
                writeln!(f, "{}{}({})", indent, name, CommaList(args))
            }
            Stmt::Assign { name, value } => writeln!(f, "{}{} = {}", indent, name, value),
            Stmt::Var { name, initializer } => {
                writeln!(f, "{}var {} = {}", indent, name, initializer)
            }
            Stmt::If { condition, body } | Stmt::While { condition, body } => {
                let keyword = if matches!(self, Stmt::If { .. }) { "if" } else { "while" };
                writeln!(f, "{}{} ({}) {{", indent, keyword, condition)?;
                for stmt in body {
                    stmt.write_indented(f, depth + 1)?;
                }
                writeln!(f, "{}}}", indent)
            }
            Stmt::Break => writeln!(f, "{}break", indent),
            Stmt::Yield => writeln!(f, "{}yield", indent),
        }
    }
}

/// Program root: the top-level body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

struct CommaList<'a>(&'a [Expr]);

impl fmt::Display for CommaList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, expr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", expr)?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Variable(name) => f.write_str(name),
            Expr::Binary { left, op, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            Expr::Call { name, args } => write!(f, "{}({})", name, CommaList(args)),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for stmt in &self.statements {
            stmt.write_indented(f, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights() {
        assert!(BinaryOp::Mul.weight() < BinaryOp::Add.weight());
        assert_eq!(BinaryOp::Mul.weight(), BinaryOp::Div.weight());
        assert_eq!(BinaryOp::Add.weight(), BinaryOp::Sub.weight());
        assert!(BinaryOp::Sub.weight() < BinaryOp::Less.weight());
        assert_eq!(BinaryOp::Less.weight(), BinaryOp::Greater.weight());
    }

    #[test]
    fn test_from_token() {
        assert_eq!(BinaryOp::from_token(&Token::Slash), Some(BinaryOp::Div));
        assert_eq!(BinaryOp::from_token(&Token::Greater), Some(BinaryOp::Greater));
        assert_eq!(BinaryOp::from_token(&Token::Assign), None);
        assert_eq!(BinaryOp::from_token(&Token::Comma), None);
    }

    #[test]
    fn test_display_nested() {
        let program = Program::new(vec![
            Stmt::Var {
                name: "x".into(),
                initializer: Expr::Number(0.0),
            },
            Stmt::While {
                condition: Expr::Bool(true),
                body: vec![
                    Stmt::Call {
                        name: "Print".into(),
                        args: vec![Expr::Binary {
                            left: Box::new(Expr::Variable("x".into())),
                            op: BinaryOp::Add,
                            right: Box::new(Expr::Number(1.5)),
                        }],
                    },
                    Stmt::If {
                        condition: Expr::Call {
                            name: "Max".into(),
                            args: vec![Expr::Number(1.0), Expr::Variable("x".into())],
                        },
                        body: vec![Stmt::Break],
                    },
                    Stmt::Yield,
                ],
            },
        ]);

        let expected = "\
var x = 0
while (true) {
    Print(x + 1.5)
    if (Max(1, x)) {
        break
    }
    yield
}
";
        assert_eq!(program.to_string(), expected);
    }

    #[test]
    fn test_body_mut() {
        let mut stmt = Stmt::If {
            condition: Expr::Bool(true),
            body: Vec::new(),
        };
        stmt.body_mut().unwrap().push(Stmt::Yield);
        assert_eq!(stmt.body().unwrap(), &[Stmt::Yield]);

        let mut plain = Stmt::Break;
        assert!(plain.body_mut().is_none());
        assert!(!plain.has_body());
    }
}
