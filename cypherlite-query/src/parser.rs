use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token, TokenType};
use cypherlite_api::PropertyValue;

pub struct Parser;

impl Parser {
    pub fn parse(input: &str) -> Result<Query> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = TokenParser::new(tokens);
        parser.parse_query()
    }
}

struct TokenParser {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenParser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn parse_query(&mut self) -> Result<Query> {
        let query = if self.match_token(&TokenType::Match) {
            Query::Match(self.parse_match()?)
        } else if self.match_token(&TokenType::Create) {
            Query::Create(self.parse_create()?)
        } else {
            return Err(self.error("Expected MATCH or CREATE"));
        };

        // Ignore an optional trailing semicolon.
        self.match_token(&TokenType::Semicolon);
        if !self.is_at_end() {
            return Err(self.error(format!("Unexpected token {:?}", self.peek().token_type)));
        }
        Ok(query)
    }

    fn parse_match(&mut self) -> Result<MatchQuery> {
        let patterns = self.parse_patterns()?;
        let where_clause = if self.match_token(&TokenType::Where) {
            Some(WhereClause {
                condition: self.parse_condition()?,
            })
        } else {
            None
        };
        self.consume(&TokenType::Return, "Expected RETURN")?;
        let return_clause = self.parse_return()?;
        Ok(MatchQuery {
            patterns,
            where_clause,
            return_clause,
        })
    }

    fn parse_create(&mut self) -> Result<CreateQuery> {
        let patterns = self.parse_patterns()?;
        let return_clause = if self.match_token(&TokenType::Return) {
            Some(self.parse_return()?)
        } else {
            None
        };
        Ok(CreateQuery {
            patterns,
            return_clause,
        })
    }

    fn parse_return(&mut self) -> Result<ReturnClause> {
        let mut items: Vec<ReturnItem> = Vec::new();
        loop {
            let start = self.peek().clone();
            let mut keypath = self.parse_keypath()?;
            let designation = keypath.remove(0);
            let item = if keypath.is_empty() {
                ReturnItem::Designation(designation)
            } else {
                ReturnItem::Path {
                    designation,
                    keypath,
                }
            };
            let column = item.column_name();
            if items.iter().any(|seen| seen.column_name() == column) {
                return Err(error_at(&start, format!("Duplicate return column `{column}`")));
            }
            items.push(item);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        Ok(ReturnClause { items })
    }

    fn parse_patterns(&mut self) -> Result<Vec<NodePattern>> {
        let mut patterns = vec![self.parse_chain()?];
        while self.match_token(&TokenType::Comma) {
            patterns.push(self.parse_chain()?);
        }
        Ok(patterns)
    }

    /// `node (edge chain)?`: the rest of the chain hangs off the first node.
    fn parse_chain(&mut self) -> Result<NodePattern> {
        let mut node = self.parse_node_pattern()?;
        if self.check_relationship_start() {
            let (designation, label, direction) = self.parse_relationship_pattern()?;
            let target = self.parse_chain()?;
            node.edges.push(EdgePattern {
                designation,
                label,
                direction,
                target: Box::new(target),
            });
        }
        Ok(node)
    }

    fn check_relationship_start(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::LeftArrow | TokenType::Dash
        )
    }

    fn parse_node_pattern(&mut self) -> Result<NodePattern> {
        self.consume(&TokenType::LeftParen, "Expected '('")?;
        let designation = if self.peek_is_identifier() {
            Some(self.parse_identifier("node designation")?)
        } else {
            None
        };

        let class = if self.match_token(&TokenType::Colon) {
            Some(self.parse_identifier("node class")?)
        } else {
            None
        };

        let document = if self.check(&TokenType::LeftBrace) {
            Some(self.parse_document()?)
        } else {
            None
        };

        self.consume(&TokenType::RightParen, "Expected ')'")?;
        Ok(NodePattern {
            designation,
            class,
            document,
            edges: Vec::new(),
        })
    }

    fn parse_relationship_pattern(
        &mut self,
    ) -> Result<(Option<String>, Option<String>, EdgeDirection)> {
        let incoming = if self.match_token(&TokenType::LeftArrow) {
            true
        } else if self.match_token(&TokenType::Dash) {
            false
        } else {
            return Err(self.error("Expected relationship start"));
        };

        let mut designation = None;
        let mut label = None;
        if self.match_token(&TokenType::LeftBracket) {
            if self.peek_is_identifier() {
                designation = Some(self.parse_identifier("edge designation")?);
            }
            if self.match_token(&TokenType::Colon) {
                label = Some(self.parse_identifier("edge label")?);
            }
            self.consume(&TokenType::RightBracket, "Expected ']'")?;
        }

        let direction = if self.match_token(&TokenType::RightArrow) {
            if incoming {
                return Err(self.error("Invalid relationship direction <->"));
            }
            EdgeDirection::Outgoing
        } else if self.match_token(&TokenType::Dash) {
            if !incoming {
                return Err(self.error("Undirected relationships are not supported"));
            }
            EdgeDirection::Incoming
        } else {
            return Err(self.error("Expected '->' or '-' to close relationship"));
        };

        Ok((designation, label, direction))
    }

    fn parse_document(&mut self) -> Result<Document> {
        self.consume(&TokenType::LeftBrace, "Expected '{'")?;
        let mut document = Document::new();

        while !self.check(&TokenType::RightBrace) {
            let key = match &self.peek().token_type {
                TokenType::String(key) => {
                    let key = key.clone();
                    self.advance();
                    key
                }
                _ => self.parse_name("document key")?,
            };
            self.consume(&TokenType::Colon, "Expected ':' in document")?;
            let value = self.parse_literal()?;
            document.insert(key, value);

            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }

        self.consume(&TokenType::RightBrace, "Expected '}'")?;
        Ok(document)
    }

    fn parse_list(&mut self) -> Result<Vec<PropertyValue>> {
        self.consume(&TokenType::LeftBracket, "Expected '['")?;
        let mut items = Vec::new();
        while !self.check(&TokenType::RightBracket) {
            items.push(self.parse_literal()?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        self.consume(&TokenType::RightBracket, "Expected ']'")?;
        Ok(items)
    }

    fn parse_literal(&mut self) -> Result<PropertyValue> {
        if self.check(&TokenType::LeftBrace) {
            return Ok(PropertyValue::Map(self.parse_document()?));
        }
        if self.check(&TokenType::LeftBracket) {
            return Ok(PropertyValue::List(self.parse_list()?));
        }

        let token = self.advance().clone();
        match &token.token_type {
            TokenType::String(s) => Ok(PropertyValue::String(s.clone())),
            TokenType::Integer(magnitude) => i64::try_from(*magnitude)
                .map(PropertyValue::Int)
                .map_err(|_| error_at(&token, format!("Integer out of range: {magnitude}"))),
            TokenType::Float(f) => Ok(PropertyValue::Float(*f)),
            TokenType::Boolean(b) => Ok(PropertyValue::Bool(*b)),
            TokenType::Null => Ok(PropertyValue::Null),
            TokenType::Dash => {
                let number = self.advance().clone();
                match number.token_type {
                    TokenType::Integer(magnitude) => 0i64
                        .checked_sub_unsigned(magnitude)
                        .map(PropertyValue::Int)
                        .ok_or_else(|| {
                            error_at(&number, format!("Integer out of range: -{magnitude}"))
                        }),
                    TokenType::Float(f) => Ok(PropertyValue::Float(-f)),
                    _ => Err(error_at(&number, "Expected number after '-'")),
                }
            }
            other => Err(error_at(&token, format!("Expected literal, found {other:?}"))),
        }
    }

    /// `condition := unary (OR unary)*`, left-associative.
    fn parse_condition(&mut self) -> Result<Condition> {
        let mut left = self.parse_unary()?;
        while self.match_token(&TokenType::Or) {
            let right = self.parse_unary()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        if self.check(&TokenType::And) {
            return Err(self.error("AND is not supported in WHERE clauses"));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Condition> {
        if self.match_token(&TokenType::Not) {
            return Ok(Condition::Not(Box::new(self.parse_unary()?)));
        }
        if self.match_token(&TokenType::LeftParen) {
            let inner = self.parse_condition()?;
            self.consume(&TokenType::RightParen, "Expected ')' after condition")?;
            return Ok(inner);
        }

        let keypath = self.parse_keypath()?;
        self.consume(&TokenType::Equals, "Expected '=' in constraint")?;
        let value = self.parse_literal()?;
        Ok(Condition::Equals(Constraint { keypath, value }))
    }

    fn parse_keypath(&mut self) -> Result<Vec<String>> {
        let mut keypath = vec![self.parse_identifier("designation")?];
        while self.match_token(&TokenType::Dot) {
            keypath.push(self.parse_name("attribute name")?);
        }
        Ok(keypath)
    }

    fn parse_identifier(&mut self, ctx: &'static str) -> Result<String> {
        let token = self.advance().clone();
        match token.token_type {
            TokenType::Identifier(name) => Ok(name),
            _ => Err(error_at(&token, format!("Expected identifier for {ctx}"))),
        }
    }

    /// Attribute names and document keys may be spelled like keywords.
    fn parse_name(&mut self, ctx: &'static str) -> Result<String> {
        let token = self.advance().clone();
        match token.word {
            Some(word) => Ok(word),
            None => Err(error_at(&token, format!("Expected name for {ctx}"))),
        }
    }

    fn peek_is_identifier(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Identifier(_))
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(token_type) == std::mem::discriminant(&self.peek().token_type)
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<()> {
        if self.check(token_type) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        error_at(self.peek(), message)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    /// Returns the current token and moves past it. `Eof` is sticky.
    fn advance(&mut self) -> &Token {
        let index = self.position;
        if !self.is_at_end() {
            self.position += 1;
        }
        &self.tokens[index]
    }
}

fn error_at(token: &Token, message: impl Into<String>) -> Error {
    Error::Parse {
        message: message.into(),
        line: token.line,
        column: token.column,
    }
}
