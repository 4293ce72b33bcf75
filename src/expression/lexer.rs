use std::{iter::Peekable, str::CharIndices};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    Open,
    Close,
    Number(f64),
    Word(&'a str),
    Op(&'a str),
    /// Character outside the grammar, kept so the parser can report it.
    Unknown(char),
}

/// Token with its byte offset in the source text.
pub type Spanned<'a> = (usize, Token<'a>);

const TWO_CHAR_OPS: &[&str] = &["**", "==", "!=", "<=", ">="];
const ONE_CHAR_OPS: &str = "+-*/%<>&|";

/// Never fails: characters outside the grammar come out as [`Token::Unknown`]
/// and are left to the parser, so identifiers can still be read from broken text.
pub fn tokenize(text: &str) -> Vec<Spanned<'_>> {
    Lexer {
        text,
        chars: text.char_indices().peekable(),
    }
    .collect()
}

struct Lexer<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn take_while(&mut self, start: usize, accept: impl Fn(char) -> bool) -> usize {
        let mut end = start;
        while let Some(&(idx, c)) = self.chars.peek() {
            if !accept(c) {
                break;
            }
            end = idx + c.len_utf8();
            self.chars.next();
        }
        end
    }

    fn number(&mut self, start: usize) -> Token<'a> {
        let mut end = self.take_while(start, |c| c.is_ascii_digit() || c == '.');
        let rest = &self.text[end..];
        let mut exponent = rest.char_indices();
        if let Some((_, 'e' | 'E')) = exponent.next() {
            let digits_at = match exponent.next() {
                Some((_, '+' | '-')) => 2,
                _ => 1,
            };
            if rest[digits_at..].starts_with(|c: char| c.is_ascii_digit()) {
                for _ in 0..digits_at {
                    self.chars.next();
                }
                end = self.take_while(end + digits_at, |c| c.is_ascii_digit());
            }
        }
        let literal = &self.text[start..end];
        literal
            .parse()
            .map(Token::Number)
            .unwrap_or(Token::Unknown('.'))
    }

    fn operator(&mut self, start: usize) -> Token<'a> {
        if let Some(op) = TWO_CHAR_OPS
            .iter()
            .find(|op| self.text[start..].starts_with(*op))
        {
            self.chars.next();
            self.chars.next();
            return Token::Op(op);
        }
        let (_, c) = self.chars.next().unwrap_or((start, ' '));
        if ONE_CHAR_OPS.contains(c) {
            Token::Op(&self.text[start..start + 1])
        } else {
            Token::Unknown(c)
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Spanned<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        let &(start, c) = self.chars.peek()?;
        let token = match c {
            '(' => {
                self.chars.next();
                Token::Open
            }
            ')' => {
                self.chars.next();
                Token::Close
            }
            c if c.is_ascii_digit() => self.number(start),
            '.' if self.text[start + 1..].starts_with(|c: char| c.is_ascii_digit()) => {
                self.number(start)
            }
            c if c.is_alphabetic() || c == '_' => {
                let end = self.take_while(start, |c| c.is_alphanumeric() || c == '_');
                Token::Word(&self.text[start..end])
            }
            _ => self.operator(start),
        };
        Some((start, token))
    }
}
