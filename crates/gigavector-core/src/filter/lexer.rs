//! Tokenizer for the filter DSL.
//!
//! Handles quoted string escapes for `\"` and `\\`, per the design notes.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    String(String),
    Number(f64),
    And,
    Or,
    Not,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    Prefix,
    Suffix,
    In,
    LParen,
    RParen,
    Comma,
}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ()> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(&c) = self.chars.peek() else {
                break;
            };
            let tok = match c {
                '(' => {
                    self.chars.next();
                    Token::LParen
                }
                ')' => {
                    self.chars.next();
                    Token::RParen
                }
                ',' => {
                    self.chars.next();
                    Token::Comma
                }
                '"' => self.lex_string()?,
                '=' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'=') {
                        self.chars.next();
                        Token::EqEq
                    } else {
                        return Err(());
                    }
                }
                '!' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'=') {
                        self.chars.next();
                        Token::Ne
                    } else {
                        return Err(());
                    }
                }
                '<' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'=') {
                        self.chars.next();
                        Token::Le
                    } else {
                        Token::Lt
                    }
                }
                '>' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'=') {
                        self.chars.next();
                        Token::Ge
                    } else {
                        Token::Gt
                    }
                }
                c if c == '-' || c == '+' || c.is_ascii_digit() => self.lex_number()?,
                c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident_or_keyword(),
                _ => return Err(()),
            };
            tokens.push(tok);
        }
        Ok(tokens)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn lex_string(&mut self) -> Result<Token, ()> {
        self.chars.next();
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(Token::String(s)),
                Some('\\') => match self.chars.next() {
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(other) => {
                        s.push('\\');
                        s.push(other);
                    }
                    None => return Err(()),
                },
                Some(c) => s.push(c),
                None => return Err(()),
            }
        }
    }

    fn lex_number(&mut self) -> Result<Token, ()> {
        let mut s = String::new();
        if matches!(self.chars.peek(), Some('-') | Some('+')) {
            s.push(self.chars.next().unwrap());
        }
        let mut saw_digit = false;
        while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
            saw_digit = true;
            s.push(self.chars.next().unwrap());
        }
        if self.chars.peek() == Some(&'.') {
            s.push(self.chars.next().unwrap());
            while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
                saw_digit = true;
                s.push(self.chars.next().unwrap());
            }
        }
        if !saw_digit {
            return Err(());
        }
        s.parse::<f64>().map(Token::Number).map_err(|_| ())
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let mut s = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_ascii_alphanumeric() || *c == '_') {
            s.push(self.chars.next().unwrap());
        }
        match s.as_str() {
            "AND" => Token::And,
            "OR" => Token::Or,
            "NOT" => Token::Not,
            "CONTAINS" => Token::Contains,
            "PREFIX" => Token::Prefix,
            "SUFFIX" => Token::Suffix,
            "IN" => Token::In,
            _ => Token::Ident(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_comparison() {
        let tokens = Lexer::new(r#"age >= 21"#).tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![Token::Ident("age".into()), Token::Ge, Token::Number(21.0)]
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(Lexer::new("!@#$").tokenize().is_err());
    }

    #[test]
    fn unterminated_string_fails() {
        assert!(Lexer::new(r#"x == "unterminated"#).tokenize().is_err());
    }
}
