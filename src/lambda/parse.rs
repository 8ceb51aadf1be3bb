//! Recursive-descent parser for `lambda <params>: <expr>`.
//!
//! Precedence, loosest first:
//! conditional, or, and, not, comparison, + -, * / // %, unary, **,
//! postfix (call, attribute, subscript), atom.

use super::ParseError;
use super::lex::{Spanned, Token, tokenize};
use super::value::Value;

const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Const(Value),
    Name(String),
    List(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    IfElse {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Attr {
        value: Box<Expr>,
        name: String,
    },
    Index {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        value: Box<Expr>,
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
    },
}

const KEYWORDS: [&str; 8] = ["lambda", "if", "else", "and", "or", "not", "in", "is"];

pub fn parse_lambda(src: &str) -> Result<Lambda, ParseError> {
    let mut p = Parser {
        tokens: tokenize(src)?,
        pos: 0,
        depth: 0,
    };

    p.expect_keyword("lambda")?;
    let mut params: Vec<String> = Vec::new();
    if !p.eat_op(":") {
        loop {
            let (name, column) = p.expect_name()?;
            if params.contains(&name) {
                return Err(ParseError::new(
                    format!("duplicate argument '{}' in function definition", name),
                    column,
                ));
            }
            params.push(name);
            if p.eat_op(":") {
                break;
            }
            p.expect_op(",")?;
        }
    }

    let body = p.test()?;
    if p.peek() != &Token::Eof {
        return Err(p.unexpected());
    }
    Ok(Lambda { params, body })
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn column(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].column
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn unexpected(&self) -> ParseError {
        let what = match self.peek() {
            Token::Eof => "unexpected end of expression".to_string(),
            Token::Name(n) => format!("unexpected name '{}'", n),
            Token::Op(op) => format!("unexpected '{}'", op),
            Token::Str(_) => "unexpected string literal".to_string(),
            Token::Int(_) | Token::Float(_) => "unexpected number".to_string(),
        };
        ParseError::new(what, self.column())
    }

    fn is_op(&self, op: &str) -> bool {
        matches!(self.peek(), Token::Op(o) if *o == op)
    }

    fn is_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Token::Name(n) if n == kw)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.is_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.is_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), ParseError> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<(), ParseError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_name(&mut self) -> Result<(String, usize), ParseError> {
        let column = self.column();
        match self.peek() {
            Token::Name(n) if !KEYWORDS.contains(&n.as_str()) => {
                let n = n.clone();
                self.advance();
                Ok((n, column))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::new("expression nested too deeply", self.column()));
        }
        Ok(())
    }

    // test := or_test ['if' or_test 'else' test]
    fn test(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        if self.is_keyword("lambda") {
            return Err(ParseError::new(
                "nested lambda expressions are not supported",
                self.column(),
            ));
        }
        let then = self.or_test()?;
        let out = if self.eat_keyword("if") {
            let cond = self.or_test()?;
            self.expect_keyword("else")?;
            let otherwise = self.test()?;
            Expr::IfElse {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            then
        };
        self.depth -= 1;
        Ok(out)
    }

    // Left-associative chains nest one level per operator, so every loop
    // below enters once per iteration and restores the depth on exit.
    fn or_test(&mut self) -> Result<Expr, ParseError> {
        let mark = self.depth;
        let mut lhs = self.and_test()?;
        while self.eat_keyword("or") {
            self.enter()?;
            let rhs = self.and_test()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        self.depth = mark;
        Ok(lhs)
    }

    fn and_test(&mut self) -> Result<Expr, ParseError> {
        let mark = self.depth;
        let mut lhs = self.not_test()?;
        while self.eat_keyword("and") {
            self.enter()?;
            let rhs = self.not_test()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        self.depth = mark;
        Ok(lhs)
    }

    fn not_test(&mut self) -> Result<Expr, ParseError> {
        if self.eat_keyword("not") {
            self.enter()?;
            let inner = self.not_test()?;
            self.depth -= 1;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let first = self.arith()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comp_op()? {
            rest.push((op, self.arith()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn comp_op(&mut self) -> Result<Option<CmpOp>, ParseError> {
        let op = match self.peek().clone() {
            Token::Op("==") => CmpOp::Eq,
            Token::Op("!=") => CmpOp::NotEq,
            Token::Op("<") => CmpOp::Lt,
            Token::Op("<=") => CmpOp::LtE,
            Token::Op(">") => CmpOp::Gt,
            Token::Op(">=") => CmpOp::GtE,
            Token::Name(n) if n == "in" => CmpOp::In,
            Token::Name(n) if n == "is" => {
                self.advance();
                return Ok(Some(if self.eat_keyword("not") {
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }));
            }
            Token::Name(n) if n == "not" => {
                self.advance();
                self.expect_keyword("in")?;
                return Ok(Some(CmpOp::NotIn));
            }
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(op))
    }

    fn arith(&mut self) -> Result<Expr, ParseError> {
        let mark = self.depth;
        let mut lhs = self.term()?;
        loop {
            let op = if self.eat_op("+") {
                BinOp::Add
            } else if self.eat_op("-") {
                BinOp::Sub
            } else {
                self.depth = mark;
                return Ok(lhs);
            };
            self.enter()?;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mark = self.depth;
        let mut lhs = self.factor()?;
        loop {
            let op = if self.eat_op("*") {
                BinOp::Mul
            } else if self.eat_op("//") {
                BinOp::FloorDiv
            } else if self.eat_op("/") {
                BinOp::Div
            } else if self.eat_op("%") {
                BinOp::Mod
            } else {
                self.depth = mark;
                return Ok(lhs);
            };
            self.enter()?;
            let rhs = self.factor()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let op = if self.eat_op("-") {
            UnaryOp::Neg
        } else if self.eat_op("+") {
            UnaryOp::Pos
        } else {
            return self.power();
        };
        self.enter()?;
        let inner = self.factor()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(inner)))
    }

    // power := postfix ['**' factor]  (right-associative)
    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.postfix()?;
        if self.eat_op("**") {
            self.enter()?;
            let exp = self.factor()?;
            self.depth -= 1;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mark = self.depth;
        let mut expr = self.atom()?;
        loop {
            if self.is_op("(") || self.is_op("[") || self.is_op(".") {
                self.enter()?;
            }
            if self.eat_op("(") {
                let args = self.sequence(")")?;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                };
            } else if self.eat_op("[") {
                expr = self.subscript(expr)?;
            } else if self.eat_op(".") {
                let (name, _) = self.expect_name()?;
                expr = Expr::Attr {
                    value: Box::new(expr),
                    name,
                };
            } else {
                self.depth = mark;
                return Ok(expr);
            }
        }
    }

    fn subscript(&mut self, value: Expr) -> Result<Expr, ParseError> {
        let start = if self.is_op(":") {
            None
        } else {
            Some(Box::new(self.test()?))
        };
        if self.eat_op(":") {
            let stop = if self.is_op("]") {
                None
            } else {
                Some(Box::new(self.test()?))
            };
            self.expect_op("]")?;
            return Ok(Expr::Slice {
                value: Box::new(value),
                start,
                stop,
            });
        }
        self.expect_op("]")?;
        match start {
            Some(index) => Ok(Expr::Index {
                value: Box::new(value),
                index,
            }),
            None => Err(self.unexpected()),
        }
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn sequence(&mut self, close: &str) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.eat_op(close) {
            items.push(self.test()?);
            if self.is_op("=") {
                return Err(ParseError::new(
                    "keyword arguments are not supported",
                    self.column(),
                ));
            }
            if !self.eat_op(",") {
                self.expect_op(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        match self.peek().clone() {
            Token::Int(i) => {
                self.advance();
                Ok(Expr::Const(Value::Int(i)))
            }
            Token::Float(f) => {
                self.advance();
                Ok(Expr::Const(Value::Float(f)))
            }
            Token::Str(s) => {
                self.advance();
                let mut s = s;
                // Adjacent literals concatenate: 'a' 'b' == 'ab'.
                while let Token::Str(next) = self.peek() {
                    s.push_str(next);
                    self.advance();
                }
                Ok(Expr::Const(Value::Str(s)))
            }
            Token::Name(n) => match n.as_str() {
                "True" => {
                    self.advance();
                    Ok(Expr::Const(Value::Bool(true)))
                }
                "False" => {
                    self.advance();
                    Ok(Expr::Const(Value::Bool(false)))
                }
                "None" => {
                    self.advance();
                    Ok(Expr::Const(Value::None))
                }
                _ => {
                    let (name, _) = self.expect_name()?;
                    Ok(Expr::Name(name))
                }
            },
            Token::Op("(") => {
                self.advance();
                if self.eat_op(")") {
                    return Ok(Expr::List(Vec::new()));
                }
                let first = self.test()?;
                if self.eat_op(")") {
                    return Ok(first);
                }
                // Tuples evaluate as lists.
                self.expect_op(",")?;
                let mut items = vec![first];
                items.extend(self.sequence(")")?);
                Ok(Expr::List(items))
            }
            Token::Op("[") => {
                self.advance();
                Ok(Expr::List(self.sequence("]")?))
            }
            _ => Err(self.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_params() {
        assert_eq!(parse_lambda("lambda x: x").unwrap().params, vec!["x"]);
        assert_eq!(parse_lambda("lambda a, b: a").unwrap().params, vec!["a", "b"]);
        assert!(parse_lambda("lambda: 1").unwrap().params.is_empty());
    }

    #[test]
    fn precedence_binds_multiplication_tighter() {
        let lambda = parse_lambda("lambda x: 1 + 2 * 3").unwrap();
        match lambda.body {
            Expr::Binary(BinOp::Add, _, rhs) => {
                assert!(matches!(*rhs, Expr::Binary(BinOp::Mul, _, _)));
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn conditional_and_comparison_chain() {
        let lambda = parse_lambda("lambda x: 'a' if 0 < len(x) <= 3 else 'b'").unwrap();
        match lambda.body {
            Expr::IfElse { cond, .. } => match *cond {
                Expr::Compare(_, rest) => {
                    let ops: Vec<CmpOp> = rest.iter().map(|(op, _)| *op).collect();
                    assert_eq!(ops, vec![CmpOp::Lt, CmpOp::LtE]);
                }
                other => panic!("unexpected condition: {:?}", other),
            },
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn postfix_chain() {
        assert!(parse_lambda("lambda x: x.split(',')[0].strip()").is_ok());
        assert!(parse_lambda("lambda x: x[1:-1]").is_ok());
        assert!(parse_lambda("lambda x: x not in ['a', 'b']").is_ok());
        assert!(parse_lambda("lambda x: x is not None").is_ok());
    }

    #[test]
    fn syntax_errors() {
        assert!(parse_lambda("lambda x: ").is_err());
        assert!(parse_lambda("lambda x: (x").is_err());
        assert!(parse_lambda("lambda x, x: x").is_err());
        assert!(parse_lambda("lambda x: x if x").is_err());
        assert!(parse_lambda("lambda x: f(sep=',')").is_err());
        assert!(parse_lambda("lambda x: lambda y: y").is_err());
        assert!(parse_lambda("lambda x: x x").is_err());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let src = format!("lambda x: {}x{}", "(".repeat(200), ")".repeat(200));
        let err = parse_lambda(&src).unwrap_err();
        assert!(err.message.contains("nested too deeply"));
    }

    #[test]
    fn long_operator_chains_are_rejected() {
        for sep in [" + ", " * ", " or ", " and "] {
            let src = format!("lambda x: x{}", format!("{}x", sep).repeat(50_000));
            let err = parse_lambda(&src).unwrap_err();
            assert!(err.message.contains("nested too deeply"), "{}", sep);
        }
        let src = format!("lambda x: x{}", ".upper()".repeat(50_000));
        assert!(parse_lambda(&src).unwrap_err().message.contains("nested too deeply"));
        let src = format!("lambda x: x{}", "[0]".repeat(50_000));
        assert!(parse_lambda(&src).is_err());
    }

    #[test]
    fn short_chains_still_parse() {
        let src = format!("lambda x: x{}", " + x".repeat(20));
        assert!(parse_lambda(&src).is_ok());
        let src = format!("lambda x: x{}", ".strip()".repeat(20));
        assert!(parse_lambda(&src).is_ok());
        assert!(parse_lambda("lambda x: a or b or c and d and e").is_ok());
    }
}
