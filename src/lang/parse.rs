use super::program::{Line, Program, Statement};
use super::token::{Token, TokenKind, Word};
use super::Error;
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// Build a `Program` from a lexed token stream. This is structure only:
/// line numbers and colon-delimited statements. Keyword arity and
/// expression shape are the interpreter's problem, not ours.
pub fn parse(tokens: &[Token]) -> Result<Program> {
    Parser::parse(tokens)
}

struct Parser<'a> {
    stream: std::iter::Peekable<std::slice::Iter<'a, Token>>,
}

impl<'a> Parser<'a> {
    fn parse(tokens: &'a [Token]) -> Result<Program> {
        let mut parse = Parser {
            stream: tokens.iter().peekable(),
        };
        let mut program = Program::new();
        loop {
            while let Some(token) = parse.stream.peek() {
                if token.is_eol() {
                    parse.stream.next();
                } else {
                    break;
                }
            }
            let token = match parse.stream.next() {
                Some(token) => token,
                None => return Ok(program),
            };
            let number = match token.number().and_then(|n| n.as_line_number()) {
                Some(number) => number,
                None => return Err(error!(ParseError, token.line; "EXPECTED LINE NUMBER")),
            };
            program.push(parse.line(number));
        }
    }

    /// Statements are maximal token runs split on colons; an empty run
    /// is a legal, preserved statement.
    fn line(&mut self, number: u16) -> Line {
        let mut statements = vec![];
        let mut tokens: Vec<Token> = vec![];
        loop {
            match self.stream.next() {
                None => break,
                Some(token) if token.is_eol() => break,
                Some(token) if token.is_syntax(':') => {
                    statements.push(Statement::new(std::mem::take(&mut tokens)));
                }
                Some(token) => {
                    // The dialect does not honor keyword meaning inside
                    // DATA payloads; a keyword after the DATA token is
                    // just its spelling.
                    let in_data = tokens
                        .first()
                        .map_or(false, |t| t.word() == Some(Word::Data));
                    match (&token.kind, in_data) {
                        (TokenKind::Word(word), true) => tokens.push(Token::new(
                            token.line,
                            TokenKind::Data(word.text().to_string()),
                        )),
                        _ => tokens.push(token.clone()),
                    }
                }
            }
        }
        statements.push(Statement::new(tokens));
        Line::new(number, statements)
    }
}
