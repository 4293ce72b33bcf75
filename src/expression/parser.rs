use crate::expression::{
    lexer::{tokenize, Spanned, Token},
    vocabulary::{Builtin, Vocabulary},
    ExpressionError,
};

type Result<T> = std::result::Result<T, ExpressionError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    /// Builtin used as a value, e.g. the first argument of `map`.
    Function(Builtin),
    Call(Builtin, Vec<Expr>),
}

/// Parse an expression.
///
/// A parenthesised form whose head is an operator or function is read as a
/// prefix form, `(+ a b c)`. Anything else is infix, `(a + b) * c`.
/// A form that fails to read as prefix is read again as infix, so
/// `(-1 * a)` still parses.
pub fn parse(text: &str, vocabulary: &Vocabulary) -> Result<Expr> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Err(ExpressionError::Syntax {
            position: 0,
            message: "empty expression".into(),
        });
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        vocabulary,
        end: text.len(),
    };
    let expr = parser.parse_expr(0)?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.unexpected(token)),
    }
}

struct Parser<'t, 'v> {
    tokens: Vec<Spanned<'t>>,
    pos: usize,
    vocabulary: &'v Vocabulary,
    end: usize,
}

impl<'t> Parser<'t, '_> {
    fn peek(&self) -> Option<Token<'t>> {
        self.tokens.get(self.pos).map(|(_, token)| *token)
    }

    fn peek_nth(&self, n: usize) -> Option<Token<'t>> {
        self.tokens.get(self.pos + n).map(|(_, token)| *token)
    }

    fn advance(&mut self) -> Option<Token<'t>> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(at, _)| *at)
            .unwrap_or(self.end)
    }

    fn unexpected(&self, token: Token) -> ExpressionError {
        ExpressionError::Syntax {
            position: self.position(),
            message: format!("unexpected {token:?}"),
        }
    }

    fn unclosed(&self) -> ExpressionError {
        ExpressionError::Syntax {
            position: self.end,
            message: "missing closing parenthesis".into(),
        }
    }

    fn binary(&self) -> Option<(u8, Builtin)> {
        let Some(Token::Op(symbol)) = self.peek() else {
            return None;
        };
        let builtin = self.vocabulary.operator(symbol)?;
        let precedence = match builtin {
            Builtin::Or => 1,
            Builtin::And => 2,
            Builtin::Eq | Builtin::Ne | Builtin::Lt | Builtin::Le | Builtin::Gt | Builtin::Ge => 3,
            Builtin::Add | Builtin::Sub => 4,
            Builtin::Mul | Builtin::Div | Builtin::Rem => 5,
            _ => return None,
        };
        Some((precedence, builtin))
    }

    fn parse_expr(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some((precedence, builtin)) = self.binary() {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(precedence + 1)?;
            lhs = Expr::Call(builtin, vec![lhs, rhs]);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Op("-")) => {
                self.advance();
                Ok(Expr::Call(Builtin::Sub, vec![self.parse_unary()?]))
            }
            Some(Token::Op("+")) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_factor()?;
        if let Some(Token::Op("**")) = self.peek() {
            self.advance();
            // Right associative, and binds tighter than a unary minus on its left.
            let exponent = self.parse_unary()?;
            return Ok(Expr::Call(Builtin::Pow, vec![base, exponent]));
        }
        Ok(base)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Number(value)) => {
                self.advance();
                Ok(Expr::Number(value))
            }
            Some(Token::Word(word)) => {
                self.advance();
                Ok(self.word(word))
            }
            Some(Token::Open) => {
                self.advance();
                self.parse_form()
            }
            Some(token) => Err(self.unexpected(token)),
            None => Err(ExpressionError::Syntax {
                position: self.end,
                message: "unexpected end of expression".into(),
            }),
        }
    }

    fn word(&self, word: &str) -> Expr {
        if let Some(value) = self.vocabulary.constant(word) {
            Expr::Number(value)
        } else if let Some(builtin) = self.vocabulary.function(word) {
            Expr::Function(builtin)
        } else {
            Expr::Variable(word.to_string())
        }
    }

    fn head(&self) -> Option<Builtin> {
        match self.peek()? {
            Token::Op(symbol) => self.vocabulary.operator(symbol),
            Token::Word(word) => self.vocabulary.function(word),
            _ => None,
        }
    }

    /// Body of a parenthesised form, opening parenthesis already consumed.
    fn parse_form(&mut self) -> Result<Expr> {
        let start = self.pos;
        let prefix_error = match self.head() {
            Some(head) => match self.parse_prefix(head) {
                Ok(expr) => return Ok(expr),
                Err(error) => {
                    self.pos = start;
                    Some(error)
                }
            },
            None => None,
        };
        let infix = self.parse_expr(0).and_then(|expr| match self.advance() {
            Some(Token::Close) => Ok(expr),
            Some(token) => {
                self.pos -= 1;
                Err(self.unexpected(token))
            }
            None => Err(self.unclosed()),
        });
        match (infix, prefix_error) {
            (Ok(expr), _) => Ok(expr),
            (Err(_), Some(error)) => Err(error),
            (Err(error), None) => Err(error),
        }
    }

    fn parse_prefix(&mut self, head: Builtin) -> Result<Expr> {
        self.advance();
        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Close) => {
                    self.advance();
                    break;
                }
                None => return Err(self.unclosed()),
                Some(Token::Op(symbol)) if head.is_higher_order() => {
                    let builtin = self
                        .vocabulary
                        .operator(symbol)
                        .ok_or_else(|| self.unexpected(Token::Op(symbol)))?;
                    self.advance();
                    args.push(Expr::Function(builtin));
                }
                Some(Token::Op("-")) => match self.peek_nth(1) {
                    Some(Token::Number(value)) => {
                        self.pos += 2;
                        args.push(Expr::Number(-value));
                    }
                    _ => return Err(self.unexpected(Token::Op("-"))),
                },
                Some(_) => args.push(self.parse_factor()?),
            }
        }
        if !head.arity().accepts(args.len()) {
            return Err(ExpressionError::Arity {
                function: head.to_string(),
                found: args.len(),
            });
        }
        Ok(Expr::Call(head, args))
    }
}
