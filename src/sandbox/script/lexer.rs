/*!
 * Script Lexer
 * Turns unit source text into tokens
 */

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    // Keywords
    Let,
    Fn,
    Return,
    If,
    Else,
    While,
    True,
    False,
    Null,
    Throw,
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
    // Operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "let" => TokenKind::Let,
        "fn" => TokenKind::Fn,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "throw" => TokenKind::Throw,
        _ => return None,
    })
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    tokens: Vec<Token>,
}

/// Tokenize a whole unit; the last token is always `Eof`
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<(), SyntaxError> {
        while let Some(c) = self.chars.next() {
            match c {
                '\n' => self.line += 1,
                c if c.is_whitespace() => {}
                '/' if self.chars.peek() == Some(&'/') => {
                    while let Some(&next) = self.chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                '/' if self.chars.peek() == Some(&'*') => self.block_comment()?,
                '"' | '\'' => self.string(c)?,
                c if c.is_ascii_digit() => self.number(c)?,
                c if c.is_alphabetic() || c == '_' || c == '$' => self.word(c),
                _ => self.symbol(c)?,
            }
        }
        self.push(TokenKind::Eof);
        Ok(())
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            line: self.line,
        });
    }

    fn next_is(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn block_comment(&mut self) -> Result<(), SyntaxError> {
        let start = self.line;
        self.chars.next();
        while let Some(c) = self.chars.next() {
            match c {
                '\n' => self.line += 1,
                '*' if self.next_is('/') => return Ok(()),
                _ => {}
            }
        }
        Err(SyntaxError::new(start, "unterminated block comment"))
    }

    fn string(&mut self, quote: char) -> Result<(), SyntaxError> {
        let start = self.line;
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None => return Err(SyntaxError::new(start, "unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\n') => return Err(SyntaxError::new(start, "newline in string literal")),
                Some('\\') => match self.chars.next() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('\\') => text.push('\\'),
                    Some('"') => text.push('"'),
                    Some('\'') => text.push('\''),
                    Some(other) => {
                        return Err(SyntaxError::new(
                            self.line,
                            format!("unknown escape sequence '\\{}'", other),
                        ))
                    }
                    None => return Err(SyntaxError::new(start, "unterminated string literal")),
                },
                Some(c) => text.push(c),
            }
        }
        self.push(TokenKind::Str(text));
        Ok(())
    }

    fn number(&mut self, first: char) -> Result<(), SyntaxError> {
        let mut literal = String::from(first);
        let mut seen_dot = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.chars.next();
                if c != '_' {
                    literal.push(c);
                }
            } else if c == '.' && !seen_dot {
                // `1.length` is a member access, `1.5` a fraction
                let mut lookahead = self.chars.clone();
                lookahead.next();
                if !lookahead.peek().map_or(false, |d| d.is_ascii_digit()) {
                    break;
                }
                seen_dot = true;
                self.chars.next();
                literal.push('.');
            } else {
                break;
            }
        }
        let value = literal
            .parse::<f64>()
            .map_err(|_| SyntaxError::new(self.line, format!("invalid number '{}'", literal)))?;
        self.push(TokenKind::Number(value));
        Ok(())
    }

    fn word(&mut self, first: char) {
        let mut word = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        let kind = keyword(&word).unwrap_or(TokenKind::Ident(word));
        self.push(kind);
    }

    fn symbol(&mut self, c: char) -> Result<(), SyntaxError> {
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' if self.next_is('=') => TokenKind::EqEq,
            '=' => TokenKind::Assign,
            '!' if self.next_is('=') => TokenKind::NotEq,
            '!' => TokenKind::Bang,
            '<' if self.next_is('=') => TokenKind::LessEq,
            '<' => TokenKind::Less,
            '>' if self.next_is('=') => TokenKind::GreaterEq,
            '>' => TokenKind::Greater,
            '&' if self.next_is('&') => TokenKind::AndAnd,
            '|' if self.next_is('|') => TokenKind::OrOr,
            other => {
                return Err(SyntaxError::new(
                    self.line,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        self.push(kind);
        Ok(())
    }
}
