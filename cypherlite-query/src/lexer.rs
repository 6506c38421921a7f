use crate::error::{Error, Result};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords
    Match,
    Create,
    Return,
    Where,
    And,
    Or,
    Not,

    // Symbols
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Colon,
    Semicolon,
    Comma,
    Dot,
    Equals,

    // Relationships
    LeftArrow,
    RightArrow,
    Dash,

    // Literals
    String(String),
    /// Unsigned magnitude; the parser applies a leading `-` and range-checks.
    Integer(u64),
    Float(f64),
    Boolean(bool),
    Null,

    Identifier(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
    /// Source spelling of identifiers and keywords.
    pub word: Option<String>,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token {
            token_type: TokenType::Eof,
            line: self.line,
            column: self.column,
            word: None,
        });
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();

        let start_line = self.line;
        let start_column = self.column;
        let Some(char) = self.advance() else {
            return Ok(None);
        };

        // Comments
        if char == '/' {
            if let Some(&'/') = self.chars.peek() {
                self.skip_line_comment();
                return self.next_token();
            } else if let Some(&'*') = self.chars.peek() {
                self.skip_block_comment();
                return self.next_token();
            }
        }

        if char == '\'' || char == '"' {
            return self
                .read_string(char, start_line, start_column)
                .map(Some);
        }

        if char.is_ascii_digit() {
            return self
                .read_number(char, start_line, start_column)
                .map(Some);
        }

        if char.is_alphabetic() || char == '_' {
            return Ok(Some(self.read_identifier(char, start_line, start_column)));
        }

        let token_type = match char {
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            ':' => TokenType::Colon,
            ';' => TokenType::Semicolon,
            ',' => TokenType::Comma,
            '.' => TokenType::Dot,
            '=' => TokenType::Equals,
            '-' => {
                if let Some(&'>') = self.chars.peek() {
                    self.advance();
                    TokenType::RightArrow
                } else {
                    TokenType::Dash
                }
            }
            '<' => {
                if let Some(&'-') = self.chars.peek() {
                    self.advance();
                    TokenType::LeftArrow
                } else {
                    return Err(lex_error("Unexpected character: <", start_line, start_column));
                }
            }
            _ => {
                return Err(lex_error(
                    format!("Unexpected character: {char}"),
                    start_line,
                    start_column,
                ));
            }
        };

        Ok(Some(Token {
            token_type,
            line: start_line,
            column: start_column,
            word: None,
        }))
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        char
    }

    fn skip_whitespace(&mut self) {
        while let Some(&char) = self.chars.peek() {
            if char.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        self.advance(); // consume second '/'
        while let Some(&char) = self.chars.peek() {
            if char == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // consume '*'
        while let Some(char) = self.advance() {
            if char == '*' && self.chars.peek() == Some(&'/') {
                self.advance();
                break;
            }
        }
    }

    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Result<Token> {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => {
                    let escaped = match self.advance() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(c @ ('\\' | '\'' | '"')) => c,
                        Some(other) => {
                            return Err(lex_error(
                                format!("Unknown escape sequence \\{other}"),
                                self.line,
                                self.column,
                            ));
                        }
                        None => return Err(lex_error("Unterminated string literal", line, column)),
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
                None => return Err(lex_error("Unterminated string literal", line, column)),
            }
        }
        Ok(Token {
            token_type: TokenType::String(value),
            line,
            column,
            word: None,
        })
    }

    fn read_number(&mut self, first: char, line: usize, column: usize) -> Result<Token> {
        let mut value = String::new();
        value.push(first);
        let mut has_dot = false;
        while let Some(&char) = self.chars.peek() {
            if char.is_ascii_digit() {
                value.push(char);
                self.advance();
            } else if char == '.' && !has_dot {
                // Only a float if a digit follows the dot.
                let mut lookahead = self.chars.clone();
                lookahead.next();
                if !lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                    break;
                }
                has_dot = true;
                value.push(char);
                self.advance();
            } else {
                break;
            }
        }

        let token_type = if has_dot {
            value
                .parse::<f64>()
                .map(TokenType::Float)
                .map_err(|_| lex_error(format!("Invalid number: {value}"), line, column))?
        } else {
            value
                .parse::<u64>()
                .map(TokenType::Integer)
                .map_err(|_| lex_error(format!("Integer out of range: {value}"), line, column))?
        };
        Ok(Token {
            token_type,
            line,
            column,
            word: None,
        })
    }

    fn read_identifier(&mut self, first: char, line: usize, column: usize) -> Token {
        let mut value = String::new();
        value.push(first);
        while let Some(&char) = self.chars.peek() {
            if char.is_alphanumeric() || char == '_' {
                value.push(char);
                self.advance();
            } else {
                break;
            }
        }

        let token_type = match value.to_uppercase().as_str() {
            "MATCH" => TokenType::Match,
            "CREATE" => TokenType::Create,
            "RETURN" => TokenType::Return,
            "WHERE" => TokenType::Where,
            "AND" => TokenType::And,
            "OR" => TokenType::Or,
            "NOT" => TokenType::Not,
            "TRUE" => TokenType::Boolean(true),
            "FALSE" => TokenType::Boolean(false),
            "NULL" => TokenType::Null,
            _ => TokenType::Identifier(value.clone()),
        };

        Token {
            token_type,
            line,
            column,
            word: Some(value),
        }
    }
}

fn lex_error(message: impl Into<String>, line: usize, column: usize) -> Error {
    Error::Parse {
        message: message.into(),
        line,
        column,
    }
}
