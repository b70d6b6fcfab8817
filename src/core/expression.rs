//! Parser for predicate and ordering text
//!
//! This is the entry point of every query engine. The text produced by
//! [`FilterNode::to_expression`](crate::core::filter::FilterNode::to_expression)
//! and [`SortDescriptor::to_expression`](crate::core::sort::SortDescriptor::to_expression)
//! is parsed back into a small AST which the stores evaluate (in memory) or
//! translate (SQL).
//!
//! Predicate grammar:
//!
//! ```text
//! predicate  := and_expr ( "or" and_expr )*
//! and_expr   := primary ( "and" primary )*
//! primary    := "(" predicate ")" | "true" | "false" | comparison
//! comparison := ident ( "." method "(" param ")" | op param )
//! op         := "=" | "==" | "!=" | "<>" | "<" | "<=" | ">" | ">="
//! param      := "@" digits
//! ```
//!
//! Ordering grammar: `term ( "," term )*` with `term := ident [ "asc" | "desc" ]`.

use crate::core::error::QueryError;
use crate::core::filter::FilterOperator;

/// Infix comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Method-style text predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMethod {
    StartsWith,
    EndsWith,
    Contains,
}

impl TextMethod {
    fn parse(name: &str) -> Option<Self> {
        [
            TextMethod::StartsWith,
            TextMethod::EndsWith,
            TextMethod::Contains,
        ]
        .into_iter()
        .find(|method| method.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextMethod::StartsWith => FilterOperator::StartsWith.rendered(),
            TextMethod::EndsWith => FilterOperator::EndsWith.rendered(),
            TextMethod::Contains => FilterOperator::Contains.rendered(),
        }
    }
}

/// Parsed predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(bool),
    Compare {
        field: String,
        op: CompareOp,
        param: usize,
    },
    Text {
        field: String,
        method: TextMethod,
        param: usize,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

/// One parsed ordering key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingTerm {
    pub field: String,
    pub descending: bool,
}

/// Parse predicate text such as `(UnitPrice > @0 and ProductName.Contains(@1))`
pub fn parse_predicate(text: &str) -> Result<Expr, QueryError> {
    let mut parser = Parser::new(tokenize(text)?);
    let expr = parser.parse_or()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse ordering text such as `UnitPrice desc, ProductID asc`
pub fn parse_ordering(text: &str) -> Result<Vec<OrderingTerm>, QueryError> {
    let mut parser = Parser::new(tokenize(text)?);
    let mut terms = Vec::new();

    loop {
        let field = parser.expect_ident("field name")?;
        let direction = match &parser.peek().token {
            Token::Ident(word) => Some(word.clone()),
            _ => None,
        };
        let descending = match direction {
            Some(word) => {
                let descending = match word.to_ascii_lowercase().as_str() {
                    "asc" | "ascending" => false,
                    "desc" | "descending" => true,
                    _ => {
                        return Err(QueryError::InvalidSortDirection {
                            field,
                            direction: word,
                        });
                    }
                };
                parser.advance();
                descending
            }
            None => false,
        };
        terms.push(OrderingTerm { field, descending });

        match parser.peek().token {
            Token::Comma => {
                parser.advance();
            }
            Token::End => break,
            _ => return Err(parser.malformed("expected ',' or end of ordering")),
        }
    }

    Ok(terms)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Dot,
    Comma,
    Ident(String),
    Param(usize),
    Op(CompareOp),
    End,
}

#[derive(Debug, Clone)]
struct Spanned {
    position: usize,
    token: Token,
}

fn malformed(position: usize, message: impl Into<String>) -> QueryError {
    QueryError::MalformedExpression {
        position,
        message: message.into(),
    }
}

fn tokenize(text: &str) -> Result<Vec<Spanned>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        chars.next();

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '.' => Token::Dot,
            ',' => Token::Comma,
            '@' => {
                let mut digits = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| malformed(position, "expected a parameter index after '@'"))?;
                Token::Param(index)
            }
            '=' => {
                chars.next_if(|&(_, n)| n == '=');
                Token::Op(CompareOp::Eq)
            }
            '!' => {
                chars
                    .next_if(|&(_, n)| n == '=')
                    .ok_or_else(|| malformed(position, "expected '=' after '!'"))?;
                Token::Op(CompareOp::Ne)
            }
            '<' => {
                if chars.next_if(|&(_, n)| n == '=').is_some() {
                    Token::Op(CompareOp::Le)
                } else if chars.next_if(|&(_, n)| n == '>').is_some() {
                    Token::Op(CompareOp::Ne)
                } else {
                    Token::Op(CompareOp::Lt)
                }
            }
            '>' => {
                if chars.next_if(|&(_, n)| n == '=').is_some() {
                    Token::Op(CompareOp::Ge)
                } else {
                    Token::Op(CompareOp::Gt)
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some(&(_, n)) = chars.peek() {
                    if !(n.is_alphanumeric() || n == '_') {
                        break;
                    }
                    ident.push(n);
                    chars.next();
                }
                Token::Ident(ident)
            }
            other => return Err(malformed(position, format!("unexpected character '{}'", other))),
        };

        tokens.push(Spanned { position, token });
    }

    tokens.push(Spanned {
        position: text.len(),
        token: Token::End,
    });
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, cursor: 0 }
    }

    // The token list always ends with `End`, and the cursor never moves past it.
    fn peek(&self) -> &Spanned {
        &self.tokens[self.cursor]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.cursor].token.clone();
        if self.cursor + 1 < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    fn malformed(&self, message: impl Into<String>) -> QueryError {
        malformed(self.peek().position, message)
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().token, Token::Ident(word) if word.eq_ignore_ascii_case(keyword))
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), QueryError> {
        if self.peek().token == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.malformed(format!("expected {}", what)))
        }
    }

    fn expect_end(&self) -> Result<(), QueryError> {
        if self.peek().token == Token::End {
            Ok(())
        } else {
            Err(self.malformed("unexpected trailing input"))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, QueryError> {
        match self.peek().token.clone() {
            Token::Ident(word) => {
                self.advance();
                Ok(word)
            }
            _ => Err(self.malformed(format!("expected {}", what))),
        }
    }

    fn expect_param(&mut self) -> Result<usize, QueryError> {
        match self.peek().token {
            Token::Param(index) => {
                self.advance();
                Ok(index)
            }
            _ => Err(self.malformed("expected a parameter reference")),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, QueryError> {
        let mut terms = vec![self.parse_and()?];
        while self.is_keyword("or") {
            self.advance();
            terms.push(self.parse_and()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Or(terms)
        })
    }

    fn parse_and(&mut self) -> Result<Expr, QueryError> {
        let mut terms = vec![self.parse_primary()?];
        while self.is_keyword("and") {
            self.advance();
            terms.push(self.parse_primary()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::And(terms)
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, QueryError> {
        if self.peek().token == Token::LParen {
            self.advance();
            let inner = self.parse_or()?;
            self.expect(Token::RParen, "')'")?;
            return Ok(inner);
        }
        if self.is_keyword("true") {
            self.advance();
            return Ok(Expr::Literal(true));
        }
        if self.is_keyword("false") {
            self.advance();
            return Ok(Expr::Literal(false));
        }

        let field = self.expect_ident("a field name or '('")?;
        match self.peek().token.clone() {
            Token::Dot => {
                self.advance();
                let position = self.peek().position;
                let name = self.expect_ident("a method name")?;
                let method = TextMethod::parse(&name)
                    .ok_or_else(|| malformed(position, format!("unknown method '{}'", name)))?;
                self.expect(Token::LParen, "'('")?;
                let param = self.expect_param()?;
                self.expect(Token::RParen, "')'")?;
                Ok(Expr::Text {
                    field,
                    method,
                    param,
                })
            }
            Token::Op(op) => {
                self.advance();
                let param = self.expect_param()?;
                Ok(Expr::Compare { field, op, param })
            }
            _ => Err(self.malformed(format!("expected a comparison after '{}'", field))),
        }
    }
}
