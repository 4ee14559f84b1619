use super::token::{scan_keyword, KeywordScan, Number, Token, TokenKind, Word};
use super::Error;
use crate::error;
use std::collections::VecDeque;
use std::iter::Peekable;
use std::str::Chars;

type Result<T> = std::result::Result<T, Error>;

/// Both lexer variants sit behind this contract and produce equivalent
/// token streams for valid input. A synthetic end-of-line token follows
/// every physical newline, and the end of input when the last line has
/// no newline of its own.
pub trait Lexer {
    fn next_token(&mut self) -> Result<Option<Token>>;

    fn tokens(&mut self) -> Result<Vec<Token>> {
        let mut tokens = vec![];
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Lex with the interpreter-faithful variant.
pub fn lex(s: &str) -> Result<Vec<Token>> {
    ModalLexer::new(s).tokens()
}

/// Lex with the interpreter-faithful variant, retaining the original
/// spelling of every numeric literal.
pub fn lex_preserving(s: &str) -> Result<Vec<Token>> {
    ModalLexer::new(s).preserve_numbers(true).tokens()
}

fn is_basic_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Character-by-character state machine matching the interpreter's own
/// lexing: explicit default, quoted-string, data, comment, number, and
/// keyword-accumulation modes. Strict about what a source byte may be.
pub struct ModalLexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    preserve: bool,
    data: bool,
    line_open: bool,
    pending: VecDeque<Token>,
}

impl<'a> ModalLexer<'a> {
    pub fn new(s: &'a str) -> ModalLexer<'a> {
        ModalLexer {
            chars: s.chars().peekable(),
            line: 1,
            preserve: false,
            data: false,
            line_open: false,
            pending: VecDeque::new(),
        }
    }

    pub fn preserve_numbers(mut self, preserve: bool) -> ModalLexer<'a> {
        self.preserve = preserve;
        self
    }

    fn eol(&mut self) -> Token {
        let token = Token::new(self.line, TokenKind::Eol);
        self.line += 1;
        self.line_open = false;
        self.data = false;
        token
    }

    fn consume_newline(&mut self) -> bool {
        match self.chars.peek() {
            Some('\n') => {
                self.chars.next();
                true
            }
            Some('\r') => {
                self.chars.next();
                if self.chars.peek() == Some(&'\n') {
                    self.chars.next();
                }
                true
            }
            _ => false,
        }
    }

    fn string(&mut self) -> Token {
        let line = self.line;
        let mut s = String::new();
        self.chars.next();
        loop {
            match self.chars.peek() {
                None | Some('\n') | Some('\r') => break,
                Some('"') => {
                    self.chars.next();
                    break;
                }
                Some(&c) => {
                    self.chars.next();
                    s.push(c);
                }
            }
        }
        Token::new(line, TokenKind::Str(s))
    }

    fn number(&mut self) -> Result<Token> {
        let line = self.line;
        let mut s = String::new();
        let mut decimal = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                s.push(c);
            } else if c == '.' && !decimal {
                decimal = true;
                s.push(c);
            } else {
                break;
            }
            self.chars.next();
        }
        let value = if s == "." {
            0.0
        } else {
            s.parse::<f64>()
                .map_err(|_| error!(SyntaxError, line; "BAD NUMBER {}", s))?
        };
        let number = if self.preserve {
            Number::preserved(value, &s)
        } else {
            Number::new(value)
        };
        Ok(Token::new(line, TokenKind::Number(number)))
    }

    /// Keyword-accumulation mode. The buffer is tested against the
    /// keyword table after every character; the first hit ends the run
    /// and splits any unmatched prefix off as an identifier.
    fn alphabetic(&mut self) -> Result<Token> {
        let line = self.line;
        let mut s = String::new();
        loop {
            let ch = match self.chars.next() {
                Some(c) => c.to_ascii_uppercase(),
                None => break,
            };
            s.push(ch);
            let pk = self.chars.peek().copied();
            match scan_keyword(&s, pk) {
                KeywordScan::Match {
                    word,
                    prefix,
                    took_peek,
                } => {
                    if took_peek {
                        self.chars.next();
                    }
                    let head = if prefix > 0 {
                        Some(Token::new(line, TokenKind::Ident(s[..prefix].to_string())))
                    } else {
                        None
                    };
                    let tail = match word {
                        Word::Rem => self.comment(),
                        Word::Data => {
                            self.data = true;
                            Token::new(line, TokenKind::Word(word))
                        }
                        _ => Token::new(line, TokenKind::Word(word)),
                    };
                    return Ok(match head {
                        Some(head) => {
                            // comment() may already have queued the
                            // end-of-line token; the tail goes first.
                            self.pending.push_front(tail);
                            head
                        }
                        None => tail,
                    });
                }
                KeywordScan::Defer => continue,
                KeywordScan::None => match pk {
                    Some(c) if c.is_ascii_alphanumeric() => continue,
                    Some(c @ '$') | Some(c @ '%') => {
                        self.chars.next();
                        s.push(c);
                        if self.chars.peek() == Some(&'(') {
                            self.chars.next();
                            s.push('(');
                        }
                        break;
                    }
                    Some('(') => {
                        self.chars.next();
                        s.push('(');
                        break;
                    }
                    _ => break,
                },
            }
        }
        Ok(Token::new(line, TokenKind::Ident(s)))
    }

    /// Comment mode: the raw remainder of the physical line is the
    /// comment text, and the end-of-line token is still produced even
    /// though the newline is consumed here.
    fn comment(&mut self) -> Token {
        let line = self.line;
        let mut s = String::new();
        loop {
            match self.chars.peek() {
                None => break,
                Some('\n') | Some('\r') => {
                    self.consume_newline();
                    break;
                }
                Some(&c) => {
                    self.chars.next();
                    s.push(c);
                }
            }
        }
        self.pending.push_back(Token::new(line, TokenKind::Eol));
        self.line += 1;
        Token::new(line, TokenKind::Comment(s))
    }

    fn directive(&mut self) -> Result<Token> {
        let line = self.line;
        self.chars.next();
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() {
                s.push(c.to_ascii_lowercase());
                self.chars.next();
            } else {
                break;
            }
        }
        if s.is_empty() {
            return Err(error!(SyntaxError, line; "EXPECTED DIRECTIVE NAME"));
        }
        Ok(Token::new(line, TokenKind::Directive(s)))
    }

    /// Data mode: everything up to the statement separator or end of
    /// line is captured verbatim, keywords included, split only around
    /// embedded strings.
    fn data_token(&mut self) -> Token {
        match self.chars.peek() {
            Some(':') => {
                self.chars.next();
                self.data = false;
                Token::new(self.line, TokenKind::Syntax(':'))
            }
            Some('"') => self.string(),
            _ => {
                let line = self.line;
                let mut s = String::new();
                while let Some(&c) = self.chars.peek() {
                    match c {
                        ':' | '\n' | '\r' | '"' | '\\' => break,
                        _ => {
                            self.chars.next();
                            s.push(c);
                        }
                    }
                }
                Token::new(line, TokenKind::Data(s))
            }
        }
    }
}

impl<'a> Lexer for ModalLexer<'a> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(token) = self.pending.pop_front() {
            if token.is_eol() {
                self.line_open = false;
                self.data = false;
            } else {
                self.line_open = true;
            }
            return Ok(Some(token));
        }
        loop {
            let pk = match self.chars.peek() {
                Some(&c) => c,
                None => {
                    if self.line_open {
                        return Ok(Some(self.eol()));
                    }
                    return Ok(None);
                }
            };
            let token = match pk {
                '\n' | '\r' => {
                    self.consume_newline();
                    return Ok(Some(self.eol()));
                }
                '\\' => {
                    self.chars.next();
                    if self.consume_newline() {
                        self.line += 1;
                        continue;
                    }
                    return Err(
                        error!(SyntaxError, self.line; "EXPECTED END OF LINE AFTER CONTINUATION"),
                    );
                }
                _ if self.data => self.data_token(),
                c if is_basic_whitespace(c) => {
                    self.chars.next();
                    continue;
                }
                '"' => self.string(),
                c if c.is_ascii_digit() || c == '.' => self.number()?,
                c if c.is_ascii_alphabetic() => self.alphabetic()?,
                '$' => self.directive()?,
                c if (' '..='~').contains(&c) => {
                    self.chars.next();
                    Token::new(self.line, TokenKind::Syntax(c))
                }
                c => {
                    return Err(
                        error!(SyntaxError, self.line; "UNEXPECTED CHARACTER '{}'", c.escape_default()),
                    )
                }
            };
            self.line_open = true;
            return Ok(Some(token));
        }
    }
}

/// What the general-purpose scanner hands up to the dialect layer.
#[derive(Debug, PartialEq, Clone)]
pub(crate) enum Lexeme {
    Word(String),
    Number(String),
    Quoted(String),
    Char(char),
    Eol,
}

/// A small general-purpose stream tokenizer: peekable characters with
/// line tracking, whitespace skipping, and raw capture for clients that
/// need it. Knows nothing about the dialect.
pub(crate) struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(s: &'a str) -> Scanner<'a> {
        Scanner {
            chars: s.chars().peekable(),
            line: 1,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    pub fn next_char(&mut self) -> Option<char> {
        self.chars.next()
    }

    pub fn consume_newline(&mut self) -> bool {
        match self.chars.peek() {
            Some('\n') => {
                self.chars.next();
                self.line += 1;
                true
            }
            Some('\r') => {
                self.chars.next();
                if self.chars.peek() == Some(&'\n') {
                    self.chars.next();
                }
                self.line += 1;
                true
            }
            _ => false,
        }
    }

    pub fn take_until(&mut self, stops: &[char]) -> String {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if stops.contains(&c) {
                break;
            }
            self.chars.next();
            s.push(c);
        }
        s
    }

    pub fn next_lexeme(&mut self) -> Result<Option<(usize, Lexeme)>> {
        loop {
            let pk = match self.chars.peek() {
                Some(&c) => c,
                None => return Ok(None),
            };
            match pk {
                '\n' | '\r' => {
                    let line = self.line;
                    self.consume_newline();
                    return Ok(Some((line, Lexeme::Eol)));
                }
                '\\' => {
                    self.chars.next();
                    if self.consume_newline() {
                        continue;
                    }
                    return Err(error!(SyntaxError, self.line; "STRAY CONTINUATION ESCAPE"));
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                    continue;
                }
                '"' => {
                    let line = self.line;
                    self.chars.next();
                    let s = self.take_until(&['"', '\n', '\r']);
                    if self.chars.peek() == Some(&'"') {
                        self.chars.next();
                    }
                    return Ok(Some((line, Lexeme::Quoted(s))));
                }
                c if c.is_ascii_digit() || c == '.' => {
                    let line = self.line;
                    let mut s = String::new();
                    let mut decimal = false;
                    while let Some(&c) = self.chars.peek() {
                        if c.is_ascii_digit() {
                            s.push(c);
                        } else if c == '.' && !decimal {
                            decimal = true;
                            s.push(c);
                        } else {
                            break;
                        }
                        self.chars.next();
                    }
                    return Ok(Some((line, Lexeme::Number(s))));
                }
                c if c.is_ascii_alphabetic() => {
                    let line = self.line;
                    let mut s = String::new();
                    while let Some(&c) = self.chars.peek() {
                        if c.is_ascii_alphanumeric() {
                            s.push(c);
                            self.chars.next();
                        } else {
                            break;
                        }
                    }
                    return Ok(Some((line, Lexeme::Word(s))));
                }
                c => {
                    let line = self.line;
                    self.chars.next();
                    return Ok(Some((line, Lexeme::Char(c))));
                }
            }
        }
    }
}

/// Dialect awareness layered over the general-purpose scanner. More
/// permissive of whitespace than the modal variant, and its diagnostics
/// are worded differently, but the token streams agree for valid input.
pub struct StreamLexer<'a> {
    scan: Scanner<'a>,
    preserve: bool,
    data: bool,
    line_open: bool,
    queue: VecDeque<Token>,
    peeked: Option<(usize, Lexeme)>,
}

impl<'a> StreamLexer<'a> {
    pub fn new(s: &'a str) -> StreamLexer<'a> {
        StreamLexer {
            scan: Scanner::new(s),
            preserve: false,
            data: false,
            line_open: false,
            queue: VecDeque::new(),
            peeked: None,
        }
    }

    pub fn preserve_numbers(mut self, preserve: bool) -> StreamLexer<'a> {
        self.preserve = preserve;
        self
    }

    fn next_lexeme(&mut self) -> Result<Option<(usize, Lexeme)>> {
        match self.peeked.take() {
            Some(l) => Ok(Some(l)),
            None => self.scan.next_lexeme(),
        }
    }

    fn peek_punct(&mut self) -> Result<Option<char>> {
        if self.peeked.is_none() {
            self.peeked = self.scan.next_lexeme()?;
        }
        match &self.peeked {
            Some((_, Lexeme::Char(c))) => Ok(Some(*c)),
            _ => Ok(None),
        }
    }

    fn number_token(&self, line: usize, spelling: &str) -> Result<Token> {
        let value = spelling
            .parse::<f64>()
            .map_err(|_| error!(SyntaxError, line; "MALFORMED NUMBER {}", spelling))?;
        let number = if self.preserve {
            Number::preserved(value, spelling)
        } else {
            Number::new(value)
        };
        Ok(Token::new(line, TokenKind::Number(number)))
    }

    /// A keyword split can leave a digit-led remainder behind
    /// (`GOTO10`): the digits are a numeric literal, not part of a
    /// name. At the end of the word the literal may continue into a
    /// `.fraction` lexeme the scanner split off.
    fn flush_run(
        &mut self,
        line: usize,
        text: &str,
        tokens: &mut Vec<Token>,
        join_fraction: bool,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        match text.find(|c: char| !c.is_ascii_digit()) {
            Some(0) => tokens.push(Token::new(line, TokenKind::Ident(text.to_string()))),
            Some(end) => {
                tokens.push(self.number_token(line, &text[..end])?);
                tokens.push(Token::new(line, TokenKind::Ident(text[end..].to_string())));
            }
            None => {
                let mut spelling = text.to_string();
                if join_fraction {
                    if self.peeked.is_none() {
                        self.peeked = self.scan.next_lexeme()?;
                    }
                    if let Some((_, Lexeme::Number(s))) = &self.peeked {
                        if s.starts_with('.') {
                            spelling.push_str(s);
                            self.peeked = None;
                        }
                    }
                }
                tokens.push(self.number_token(line, &spelling)?);
            }
        }
        Ok(())
    }

    /// One word lexeme may split into several tokens; the first is
    /// returned and the rest are queued. Multi-part keywords look one
    /// lexeme ahead and push back what they do not take.
    fn word(&mut self, line: usize, raw: String) -> Result<Token> {
        let up = raw.to_ascii_uppercase();
        let mut tokens: Vec<Token> = vec![];
        let mut iter = up.chars().peekable();
        let mut used = 0;
        let mut s = String::new();
        loop {
            let ch = match iter.next() {
                Some(c) => c,
                None => break,
            };
            used += 1;
            s.push(ch);
            let pk = match iter.peek() {
                Some(&c) => Some(c),
                None => self.peek_punct()?,
            };
            match scan_keyword(&s, pk) {
                KeywordScan::Match {
                    word,
                    prefix,
                    took_peek,
                } => {
                    if took_peek {
                        if iter.peek().is_some() {
                            iter.next();
                            used += 1;
                        } else {
                            self.next_lexeme()?;
                        }
                    }
                    if prefix > 0 {
                        let head = s[..prefix].to_string();
                        self.flush_run(line, &head, &mut tokens, false)?;
                    }
                    match word {
                        Word::Rem => {
                            let mut text = raw[used..].to_string();
                            text.push_str(&self.scan.take_until(&['\n', '\r']));
                            self.scan.consume_newline();
                            tokens.push(Token::new(line, TokenKind::Comment(text)));
                            tokens.push(Token::new(line, TokenKind::Eol));
                            let first = tokens.remove(0);
                            self.queue.extend(tokens);
                            return Ok(first);
                        }
                        Word::Data => {
                            self.data = true;
                            tokens.push(Token::new(line, TokenKind::Word(word)));
                            let mut text = raw[used..].to_string();
                            text.push_str(&self.scan.take_until(&[':', '\n', '\r', '"', '\\']));
                            if !text.is_empty() {
                                tokens.push(Token::new(line, TokenKind::Data(text)));
                            }
                            let first = tokens.remove(0);
                            self.queue.extend(tokens);
                            return Ok(first);
                        }
                        _ => tokens.push(Token::new(line, TokenKind::Word(word))),
                    }
                    s.clear();
                }
                KeywordScan::Defer => continue,
                KeywordScan::None => {
                    if iter.peek().is_some() {
                        continue;
                    }
                    let named = s.chars().next().map_or(false, |c| c.is_ascii_alphabetic());
                    if named {
                        match self.peek_punct()? {
                            Some(c @ '$') | Some(c @ '%') => {
                                self.next_lexeme()?;
                                s.push(c);
                                if self.peek_punct()? == Some('(') {
                                    self.next_lexeme()?;
                                    s.push('(');
                                }
                            }
                            Some('(') => {
                                self.next_lexeme()?;
                                s.push('(');
                            }
                            _ => {}
                        }
                    }
                    break;
                }
            }
        }
        let tail = std::mem::take(&mut s);
        self.flush_run(line, &tail, &mut tokens, true)?;
        if tokens.is_empty() {
            return Err(error!(InternalError, line; "EMPTY WORD"));
        }
        let first = tokens.remove(0);
        self.queue.extend(tokens);
        Ok(first)
    }

    fn data_token(&mut self) -> Result<Option<Token>> {
        debug_assert!(self.peeked.is_none());
        match self.scan.peek_char() {
            None => {
                self.data = false;
                if self.line_open {
                    self.line_open = false;
                    return Ok(Some(Token::new(self.scan.line(), TokenKind::Eol)));
                }
                Ok(None)
            }
            Some('\n') | Some('\r') => {
                let line = self.scan.line();
                self.scan.consume_newline();
                self.data = false;
                self.line_open = false;
                Ok(Some(Token::new(line, TokenKind::Eol)))
            }
            Some(':') => {
                self.scan.next_char();
                self.data = false;
                self.line_open = true;
                Ok(Some(Token::new(self.scan.line(), TokenKind::Syntax(':'))))
            }
            Some('"') => {
                let line = self.scan.line();
                self.scan.next_char();
                let s = self.scan.take_until(&['"', '\n', '\r']);
                if self.scan.peek_char() == Some('"') {
                    self.scan.next_char();
                }
                self.line_open = true;
                Ok(Some(Token::new(line, TokenKind::Str(s))))
            }
            Some('\\') => {
                self.scan.next_char();
                if self.scan.consume_newline() {
                    self.data_token()
                } else {
                    Err(error!(SyntaxError, self.scan.line(); "STRAY CONTINUATION ESCAPE"))
                }
            }
            Some(_) => {
                let line = self.scan.line();
                let s = self.scan.take_until(&[':', '\n', '\r', '"', '\\']);
                self.line_open = true;
                Ok(Some(Token::new(line, TokenKind::Data(s))))
            }
        }
    }
}

impl<'a> Lexer for StreamLexer<'a> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(token) = self.queue.pop_front() {
            if token.is_eol() {
                self.line_open = false;
                self.data = false;
            } else {
                self.line_open = true;
            }
            return Ok(Some(token));
        }
        if self.data && self.peeked.is_none() {
            return self.data_token();
        }
        let (line, lexeme) = match self.next_lexeme()? {
            Some(l) => l,
            None => {
                if self.line_open {
                    self.line_open = false;
                    return Ok(Some(Token::new(self.scan.line(), TokenKind::Eol)));
                }
                return Ok(None);
            }
        };
        let token = match lexeme {
            Lexeme::Eol => {
                self.line_open = false;
                self.data = false;
                return Ok(Some(Token::new(line, TokenKind::Eol)));
            }
            Lexeme::Quoted(s) => Token::new(line, TokenKind::Str(s)),
            Lexeme::Number(s) => {
                let value = if s == "." {
                    0.0
                } else {
                    s.parse::<f64>()
                        .map_err(|_| error!(SyntaxError, line; "MALFORMED NUMBER {}", s))?
                };
                let number = if self.preserve {
                    Number::preserved(value, &s)
                } else {
                    Number::new(value)
                };
                Token::new(line, TokenKind::Number(number))
            }
            Lexeme::Word(raw) => self.word(line, raw)?,
            Lexeme::Char('$') => match self.next_lexeme()? {
                Some((_, Lexeme::Word(name))) => {
                    Token::new(line, TokenKind::Directive(name.to_ascii_lowercase()))
                }
                other => {
                    self.peeked = other;
                    return Err(error!(SyntaxError, line; "THE $ MARKER REQUIRES A NAME"));
                }
            },
            Lexeme::Char(c) => Token::new(line, TokenKind::Syntax(c)),
        };
        self.line_open = true;
        Ok(Some(token))
    }
}
