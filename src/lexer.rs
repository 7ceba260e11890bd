use crate::diagnostics::SourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Var,
    Let,
    Be,
    Fn,
    Give,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Range,
    From,
    To,
    Step,
    Pass,
    Is,
    Of,
    Points,
    True,
    False,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Int,
    Float,
    String,
    Keyword(Keyword),
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
    At,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    PlusPlus,
    MinusMinus,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    /// `and` or `&&`
    And,
    /// `or` or `||`
    Or,
    /// `not` or `!`
    Not,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// A string literal that reached end of input before its closing quote.
    UnterminatedString,
    /// Any character the grammar has no use for; reported by the parser.
    Unknown,
    Eof,
}

impl TokenKind {
    /// Tokens after which a `.` followed by a digit is a terminator, not a
    /// leading-dot float.
    fn ends_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Keyword(Keyword::True | Keyword::False | Keyword::None)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token; for strings, the unescaped contents.
    pub lexeme: String,
    pub span: SourceSpan,
}

impl Token {
    /// Human readable description used in syntax errors.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::String => format!("string \"{}\"", self.lexeme),
            TokenKind::UnterminatedString => "unterminated string literal".to_string(),
            _ => format!("`{}`", self.lexeme),
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current: usize,
    line: usize,
    peeked: Option<(usize, char)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices(),
            current: 0,
            line: 1,
            peeked: None,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = match self.peeked.take() {
            Some(pair) => Some(pair),
            None => self.chars.next(),
        };
        if let Some((idx, ch)) = next {
            self.current = idx + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
            }
        }
        next
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    /// Whether the unconsumed input starts with `text`.
    fn lookahead(&mut self, text: &str) -> bool {
        match self.peek() {
            Some((idx, _)) => self.source[idx..].starts_with(text),
            None => false,
        }
    }

    fn match_next(&mut self, expected: char) -> bool {
        match self.peek() {
            Some((_, ch)) if ch == expected => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some((_, ch)) if ch.is_whitespace() => {
                    self.bump();
                }
                Some((_, '#')) => {
                    while let Some((_, ch)) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some(_) if self.lookahead("-->") => {
                    for _ in 0..3 {
                        self.bump();
                    }
                    // An unclosed block comment swallows the rest of the input.
                    while self.peek().is_some() {
                        if self.lookahead("<--") {
                            for _ in 0..3 {
                                self.bump();
                            }
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn span_from(&self, start: usize, line: usize) -> SourceSpan {
        SourceSpan::new(start, self.current, line)
    }

    fn identifier_or_keyword(&mut self, start: usize, line: usize) -> Token {
        while let Some((_, ch)) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let lexeme = self.source[start..self.current].to_string();
        let kind = keyword_for(&lexeme).unwrap_or(TokenKind::Identifier);
        Token {
            kind,
            lexeme,
            span: self.span_from(start, line),
        }
    }

    fn digits(&mut self) {
        while let Some((_, ch)) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Whether the input continues with `.` immediately followed by a digit.
    fn at_fraction(&mut self) -> bool {
        match self.peek() {
            Some((idx, '.')) => self.source[idx + 1..]
                .chars()
                .next()
                .is_some_and(|ch| ch.is_ascii_digit()),
            _ => false,
        }
    }

    fn number_literal(&mut self, start: usize, line: usize, leading_dot: bool) -> Token {
        let mut kind = TokenKind::Int;
        if leading_dot {
            kind = TokenKind::Float;
        } else {
            self.digits();
            if self.at_fraction() {
                self.bump();
                kind = TokenKind::Float;
            }
        }
        if kind == TokenKind::Float {
            self.digits();
        }
        Token {
            kind,
            lexeme: self.source[start..self.current].replace('_', ""),
            span: self.span_from(start, line),
        }
    }

    fn string_literal(&mut self, start: usize, line: usize, quote: char) -> Token {
        let mut value = String::new();
        while let Some((_, ch)) = self.bump() {
            match ch {
                ch if ch == quote => {
                    return Token {
                        kind: TokenKind::String,
                        lexeme: value,
                        span: self.span_from(start, line),
                    };
                }
                '\\' => match self.bump() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, other)) => value.push(other),
                    None => break,
                },
                _ => value.push(ch),
            }
        }
        Token {
            kind: TokenKind::UnterminatedString,
            lexeme: self.source[start..self.current].to_string(),
            span: self.span_from(start, line),
        }
    }

    fn simple_token(&mut self, start: usize, line: usize, kind: TokenKind) -> Token {
        Token {
            kind,
            lexeme: self.source[start..self.current].to_string(),
            span: self.span_from(start, line),
        }
    }

    /// Splits `source` into tokens, always ending with `Eof`. Never fails:
    /// stray characters become `Unknown` tokens for the parser to reject.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let line = self.line;
            let (start, ch) = match self.bump() {
                Some(pair) => pair,
                None => {
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        lexeme: String::new(),
                        span: SourceSpan::new(self.current, self.current, line),
                    });
                    break;
                }
            };

            let token = match ch {
                c if c.is_alphabetic() || c == '_' => self.identifier_or_keyword(start, line),
                '0'..='9' => self.number_literal(start, line, false),
                '.' => {
                    let after_operand = tokens.last().is_some_and(|t| t.kind.ends_operand());
                    let digit_follows = self.peek().is_some_and(|(_, c)| c.is_ascii_digit());
                    if digit_follows && !after_operand {
                        self.number_literal(start, line, true)
                    } else {
                        self.simple_token(start, line, TokenKind::Dot)
                    }
                }
                '"' | '\'' => self.string_literal(start, line, ch),
                '(' => self.simple_token(start, line, TokenKind::LParen),
                ')' => self.simple_token(start, line, TokenKind::RParen),
                '{' => self.simple_token(start, line, TokenKind::LBrace),
                '}' => self.simple_token(start, line, TokenKind::RBrace),
                '[' => self.simple_token(start, line, TokenKind::LBracket),
                ']' => self.simple_token(start, line, TokenKind::RBracket),
                ',' => self.simple_token(start, line, TokenKind::Comma),
                ':' => self.simple_token(start, line, TokenKind::Colon),
                ';' => self.simple_token(start, line, TokenKind::Semicolon),
                '@' => self.simple_token(start, line, TokenKind::At),
                '^' => self.simple_token(start, line, TokenKind::Caret),
                '+' => {
                    if self.match_next('=') {
                        self.simple_token(start, line, TokenKind::PlusAssign)
                    } else if self.match_next('+') {
                        self.simple_token(start, line, TokenKind::PlusPlus)
                    } else {
                        self.simple_token(start, line, TokenKind::Plus)
                    }
                }
                '-' => {
                    if self.match_next('=') {
                        self.simple_token(start, line, TokenKind::MinusAssign)
                    } else if self.match_next('-') {
                        self.simple_token(start, line, TokenKind::MinusMinus)
                    } else {
                        self.simple_token(start, line, TokenKind::Minus)
                    }
                }
                '*' => {
                    if self.match_next('=') {
                        self.simple_token(start, line, TokenKind::StarAssign)
                    } else {
                        self.simple_token(start, line, TokenKind::Star)
                    }
                }
                '/' => {
                    if self.match_next('=') {
                        self.simple_token(start, line, TokenKind::SlashAssign)
                    } else {
                        self.simple_token(start, line, TokenKind::Slash)
                    }
                }
                '%' => {
                    if self.match_next('=') {
                        self.simple_token(start, line, TokenKind::PercentAssign)
                    } else {
                        self.simple_token(start, line, TokenKind::Percent)
                    }
                }
                '=' => {
                    if self.match_next('=') {
                        self.simple_token(start, line, TokenKind::EqualEqual)
                    } else {
                        self.simple_token(start, line, TokenKind::Assign)
                    }
                }
                '!' => {
                    if self.match_next('=') {
                        self.simple_token(start, line, TokenKind::BangEqual)
                    } else {
                        self.simple_token(start, line, TokenKind::Not)
                    }
                }
                '&' if self.match_next('&') => self.simple_token(start, line, TokenKind::And),
                '|' if self.match_next('|') => self.simple_token(start, line, TokenKind::Or),
                '<' => {
                    if self.match_next('=') {
                        self.simple_token(start, line, TokenKind::LessEqual)
                    } else {
                        self.simple_token(start, line, TokenKind::Less)
                    }
                }
                '>' => {
                    if self.match_next('=') {
                        self.simple_token(start, line, TokenKind::GreaterEqual)
                    } else {
                        self.simple_token(start, line, TokenKind::Greater)
                    }
                }
                _ => self.simple_token(start, line, TokenKind::Unknown),
            };
            tokens.push(token);
        }
        tokens
    }
}

fn keyword_for(ident: &str) -> Option<TokenKind> {
    use self::Keyword as Kw;
    let keyword = match ident {
        "var" => Kw::Var,
        "let" => Kw::Let,
        "be" => Kw::Be,
        "fn" => Kw::Fn,
        "give" => Kw::Give,
        "if" => Kw::If,
        "elif" => Kw::Elif,
        "else" => Kw::Else,
        "while" => Kw::While,
        "for" => Kw::For,
        "in" => Kw::In,
        "range" => Kw::Range,
        "from" => Kw::From,
        "to" => Kw::To,
        "step" => Kw::Step,
        "pass" => Kw::Pass,
        "is" => Kw::Is,
        "of" => Kw::Of,
        "points" => Kw::Points,
        "True" => Kw::True,
        "False" => Kw::False,
        "None" => Kw::None,
        "and" => return Some(TokenKind::And),
        "or" => return Some(TokenKind::Or),
        "not" => return Some(TokenKind::Not),
        _ => return None,
    };
    Some(TokenKind::Keyword(keyword))
}
