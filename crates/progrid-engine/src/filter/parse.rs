use crate::filter::types::{CompareOp, Operand, ParseError, Predicate, Span};
use crate::value::format_text;

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Op(CompareOp),
    And,
    Or,
    In,
    Dot,
    LParen,
    RParen,
    /// The `$VAL` placeholder.
    Val,
    Number(f64),
    /// A quoted string, quotes stripped.
    Str(String),
    /// A bare word.
    Word(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    span: Span,
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
                self.bump();
            }
            let start = self.pos;
            let Some(c) = self.bump() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(start, start),
                });
                return Ok(tokens);
            };
            let kind = match c {
                '<' => self.op_or(start, CompareOp::Le, CompareOp::Lt),
                '>' => self.op_or(start, CompareOp::Ge, CompareOp::Gt),
                '=' => match self.peek_char() {
                    Some('=') => {
                        self.bump();
                        TokenKind::Op(CompareOp::Eq)
                    }
                    Some('>') => {
                        self.bump();
                        return Err(ParseError::new(
                            "unrecognized operator `=>` (use `>=`)",
                            Span::new(start, self.pos),
                        ));
                    }
                    _ => {
                        return Err(ParseError::new(
                            "unrecognized operator `=` (use `==`)",
                            Span::new(start, self.pos),
                        ));
                    }
                },
                '!' => match self.peek_char() {
                    Some('=') => {
                        self.bump();
                        TokenKind::Op(CompareOp::Ne)
                    }
                    _ => {
                        return Err(ParseError::new(
                            "unrecognized operator `!` (use `!=`)",
                            Span::new(start, self.pos),
                        ));
                    }
                },
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '.' if matches!(self.peek_char(), Some(d) if d.is_ascii_digit()) => {
                    self.number(start)?
                }
                '.' => TokenKind::Dot,
                '\'' | '"' => self.string(start, c)?,
                '$' => self.placeholder(start)?,
                ',' => {
                    return Err(ParseError::new(
                        "unexpected `,`",
                        Span::new(start, self.pos),
                    ));
                }
                _ if c.is_ascii_digit() => self.number(start)?,
                '-' | '+' if matches!(self.peek_char(), Some(d) if d.is_ascii_digit() || d == '.') =>
                {
                    self.number(start)?
                }
                _ => self.word(start),
            };
            let span = Span::new(start, self.pos);
            tokens.push(Token { kind, span });
        }
    }

    fn op_or(&mut self, _start: usize, with_eq: CompareOp, bare: CompareOp) -> TokenKind {
        if self.peek_char() == Some('=') {
            self.bump();
            TokenKind::Op(with_eq)
        } else {
            TokenKind::Op(bare)
        }
    }

    fn string(&mut self, start: usize, quote: char) -> Result<TokenKind, ParseError> {
        let content_start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == quote {
                let content = self.text[content_start..self.pos].to_string();
                self.bump();
                return Ok(TokenKind::Str(content));
            }
            self.bump();
        }
        Err(ParseError::new(
            "unterminated string literal",
            Span::new(start, self.pos),
        ))
    }

    fn placeholder(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        if self.text[self.pos..].starts_with("VAL") {
            self.pos += "VAL".len();
            Ok(TokenKind::Val)
        } else {
            Err(ParseError::new(
                "expected `$VAL`",
                Span::new(start, self.pos),
            ))
        }
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek_char() == Some('.') {
            self.bump();
            while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            self.bump();
            if matches!(self.peek_char(), Some('-') | Some('+')) {
                self.bump();
            }
            while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        let raw = &self.text[start..self.pos];
        raw.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| ParseError::new("invalid number literal", Span::new(start, self.pos)))
    }

    fn word(&mut self, start: usize) -> TokenKind {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || "<>=!()'\"$.,".contains(c) {
                break;
            }
            self.bump();
        }
        match &self.text[start..self.pos] {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "in" => TokenKind::In,
            w => TokenKind::Word(w.to_string()),
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(ParseError::new("unexpected trailing input", token.span))
        }
    }

    // `and` binds tighter than `or`, as in the expression language users
    // already know these operators from.
    fn or_chain(
        &mut self,
        term: fn(&mut Self) -> Result<Predicate, ParseError>,
    ) -> Result<Predicate, ParseError> {
        let mut left = self.and_chain(term)?;
        while self.peek().kind == TokenKind::Or {
            self.bump();
            let right = self.and_chain(term)?;
            left = Predicate::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_chain(
        &mut self,
        term: fn(&mut Self) -> Result<Predicate, ParseError>,
    ) -> Result<Predicate, ParseError> {
        let mut left = term(self)?;
        while self.peek().kind == TokenKind::And {
            self.bump();
            let right = term(self)?;
            left = Predicate::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// One `<op> operand` comparison of the comparator form.
    fn comparison(&mut self) -> Result<Predicate, ParseError> {
        let token = self.bump();
        let TokenKind::Op(op) = token.kind else {
            return Err(ParseError::new(
                "expected one of `<`, `<=`, `>`, `>=`, `==`, `!=`",
                token.span,
            ));
        };
        let operand = self.comparator_operand()?;
        Ok(Predicate::Compare { op, operand })
    }

    /// Comparator-form operands are used as written; only the value side of
    /// the comparison is normalized.
    fn comparator_operand(&mut self) -> Result<Operand, ParseError> {
        let token = self.bump();
        match token.kind {
            TokenKind::Number(n) => Ok(Operand::Number(n)),
            TokenKind::Str(s) => Ok(Operand::Text(s)),
            TokenKind::Word(w) => Ok(Operand::Text(w)),
            _ => Err(ParseError::new("expected a comparison value", token.span)),
        }
    }

    /// One term of the placeholder form: a comparison, a membership test or
    /// a method call, in either operand order where that makes sense.
    fn placeholder_term(&mut self) -> Result<Predicate, ParseError> {
        let token = self.bump();
        match token.kind {
            TokenKind::Val => {
                let next = self.bump();
                match next.kind {
                    TokenKind::Op(op) => {
                        let operand = self.placeholder_operand()?;
                        Ok(Predicate::Compare { op, operand })
                    }
                    TokenKind::Dot => self.method_call(),
                    _ => Err(ParseError::new(
                        "expected a comparison or method call after `$VAL`",
                        next.span,
                    )),
                }
            }
            TokenKind::Number(_) | TokenKind::Str(_) | TokenKind::Word(_) => {
                let literal = Self::literal_text(&token.kind);
                let next = self.bump();
                match next.kind {
                    TokenKind::Op(op) => {
                        self.expect_val()?;
                        let operand = match token.kind {
                            TokenKind::Number(n) => Operand::Number(n),
                            _ => Operand::Text(literal),
                        };
                        Ok(Predicate::Compare {
                            op: op.mirrored(),
                            operand,
                        })
                    }
                    TokenKind::In => {
                        self.expect_val()?;
                        Ok(Predicate::Contains { needle: literal })
                    }
                    _ => Err(ParseError::new(
                        "expected `in` or a comparison after the literal",
                        next.span,
                    )),
                }
            }
            _ => Err(ParseError::new("expected `$VAL` or a literal", token.span)),
        }
    }

    /// Placeholder-form literals are normalized like the value itself, so
    /// `$VAL.startswith('M')` matches `"Mario"`.
    fn placeholder_operand(&mut self) -> Result<Operand, ParseError> {
        let token = self.bump();
        match token.kind {
            TokenKind::Number(n) => Ok(Operand::Number(n)),
            TokenKind::Str(_) | TokenKind::Word(_) => {
                Ok(Operand::Text(Self::literal_text(&token.kind)))
            }
            _ => Err(ParseError::new("expected a comparison value", token.span)),
        }
    }

    fn method_call(&mut self) -> Result<Predicate, ParseError> {
        let name = self.bump();
        let TokenKind::Word(method) = &name.kind else {
            return Err(ParseError::new("expected a method name", name.span));
        };
        let method = method.clone();
        if !matches!(method.as_str(), "startswith" | "endswith") {
            return Err(ParseError::new(
                format!("unsupported method `{method}` (expected `startswith` or `endswith`)"),
                name.span,
            ));
        }
        self.expect(TokenKind::LParen, "expected `(`")?;
        let arg = self.bump();
        let literal = match arg.kind {
            TokenKind::Number(_) | TokenKind::Str(_) | TokenKind::Word(_) => {
                Self::literal_text(&arg.kind)
            }
            _ => return Err(ParseError::new("expected a literal argument", arg.span)),
        };
        self.expect(TokenKind::RParen, "expected `)`")?;
        if method == "startswith" {
            Ok(Predicate::StartsWith { prefix: literal })
        } else {
            Ok(Predicate::EndsWith { suffix: literal })
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<(), ParseError> {
        let token = self.bump();
        if token.kind == kind {
            Ok(())
        } else {
            Err(ParseError::new(message, token.span))
        }
    }

    fn expect_val(&mut self) -> Result<(), ParseError> {
        let token = self.bump();
        if token.kind == TokenKind::Val {
            Ok(())
        } else {
            Err(ParseError::new("expected `$VAL`", token.span))
        }
    }

    fn literal_text(kind: &TokenKind) -> String {
        match kind {
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Str(s) => format_text(s),
            TokenKind::Word(w) => format_text(w),
            _ => String::new(),
        }
    }
}

/// Parse a comparator-form expression (`"> 14"`, `"> 14 and <= 20"`).
pub(super) fn parse_comparator(text: &str) -> Result<Predicate, ParseError> {
    let mut parser = Parser::new(Lexer::new(text).tokenize()?);
    let predicate = parser.or_chain(Parser::comparison)?;
    parser.expect_eof()?;
    Ok(predicate)
}

/// Parse a placeholder-form expression (`"$VAL.startswith('M')"`).
pub(super) fn parse_placeholder(text: &str) -> Result<Predicate, ParseError> {
    let mut parser = Parser::new(Lexer::new(text).tokenize()?);
    let predicate = parser.or_chain(Parser::placeholder_term)?;
    parser.expect_eof()?;
    Ok(predicate)
}
