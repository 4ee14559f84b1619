use super::rename::NameGenerator;
use super::rewrite::{rewrite_targets, Reassignments};
use crate::error;
use crate::lang::{Error, Line, Number, Program, Statement, Token, TokenKind, Word};
use std::collections::{HashMap, HashSet};

/// Argument positions where a numeric literal is worth hoisting: the
/// interpreter re-parses a literal on every execution but reads a bound
/// variable cheaply. Eligibility opens at these keywords (and at an
/// implied-LET statement head) and closes at GOTO/GOSUB/THEN so a line
/// number is never hoisted. This table is dialect knowledge, preserved
/// as data; it is not derivable from parsing.
const HOIST_STARTS: &[Word] = &[
    Word::For,
    Word::Call,
    Word::Plot,
    Word::Hlin,
    Word::Vlin,
    Word::Hcolor,
    Word::Hplot,
    Word::Draw,
    Word::Xdraw,
    Word::Htab,
    Word::Vtab,
    Word::Rot,
    Word::Scale,
    Word::Speed,
    Word::Color,
    Word::Poke,
    Word::Wait,
    Word::Let,
    Word::If,
    Word::On,
    Word::Print,
];

const HOIST_ENDS: &[Word] = &[Word::Goto, Word::Gosub, Word::Then];

/// Replace eligible numeric literals with fresh variables, assigned
/// once on a synthetic line 0 prepended to the program. When a line 0
/// already exists, the occupied chain 0,1,2,.. shifts up by one first,
/// with every reference following. Finding no constants is a no-op.
pub fn extract_constant_values(program: &Program) -> Result<Program, Error> {
    let mut used: HashSet<String> = HashSet::new();
    for line in program.lines() {
        for statement in &line.statements {
            for token in &statement.tokens {
                if let TokenKind::Ident(text) = &token.kind {
                    let end = text
                        .find(|c: char| !c.is_ascii_alphanumeric())
                        .unwrap_or(text.len());
                    used.insert(text[..end].to_string());
                }
            }
        }
    }
    let mut generator = NameGenerator::new(used);
    let mut constants: Vec<(Number, String)> = vec![];
    let mut names: HashMap<String, String> = HashMap::new();

    let mut out = Program::new();
    for line in program.lines() {
        let mut statements = vec![];
        for statement in &line.statements {
            statements.push(hoist_statement(
                statement,
                &mut generator,
                &mut constants,
                &mut names,
            )?);
        }
        out.push(Line::new(line.number, statements));
    }
    if constants.is_empty() {
        return Ok(out);
    }

    let numbers: HashSet<u16> = out.lines().iter().map(|l| l.number).collect();
    let mut chain: Vec<u16> = vec![];
    let mut n: u16 = 0;
    while numbers.contains(&n) {
        chain.push(n);
        n = n
            .checked_add(1)
            .ok_or_else(|| error!(OverflowError; "NO ROOM ABOVE LINE 0"))?;
    }
    if !chain.is_empty() {
        let map: Reassignments = chain.iter().map(|&c| (c, Some(c + 1))).collect();
        for line in out.lines_mut() {
            if chain.contains(&line.number) {
                line.number += 1;
            }
        }
        rewrite_targets(&mut out, &map);
    }

    let mut statements = vec![];
    for (number, name) in constants {
        statements.push(Statement::new(vec![
            Token::new(0, TokenKind::Ident(name)),
            Token::new(0, TokenKind::Syntax('=')),
            Token::new(0, TokenKind::Number(number)),
        ]));
    }
    out.insert(0, Line::new(0, statements));
    Ok(out)
}

/// An assignment whose whole right-hand side is one literal stays as it
/// is; hoisting it would only rename the literal.
fn is_trivial_assignment(tokens: &[Token]) -> bool {
    let tokens = match tokens.first() {
        Some(t) if t.word() == Some(Word::Let) => &tokens[1..],
        _ => tokens,
    };
    match tokens {
        [a, b, c] => {
            matches!(a.kind, TokenKind::Ident(_))
                && b.is_syntax('=')
                && matches!(c.kind, TokenKind::Number(_))
        }
        _ => false,
    }
}

fn hoist_statement(
    statement: &Statement,
    generator: &mut NameGenerator,
    constants: &mut Vec<(Number, String)>,
    names: &mut HashMap<String, String>,
) -> Result<Statement, Error> {
    if statement.is_directive() || is_trivial_assignment(&statement.tokens) {
        return Ok(statement.clone());
    }
    let mut eligible = matches!(
        statement.tokens.first().map(|t| &t.kind),
        Some(TokenKind::Ident(_))
    );
    let mut tokens = vec![];
    for token in &statement.tokens {
        if let Some(word) = token.word() {
            if HOIST_STARTS.contains(&word) {
                eligible = true;
            } else if HOIST_ENDS.contains(&word) {
                eligible = false;
            }
        }
        match &token.kind {
            TokenKind::Number(number) if eligible => {
                let key = Number::canonical(number.value);
                let name = match names.get(&key) {
                    Some(name) => name.clone(),
                    None => {
                        let name = generator
                            .next()
                            .ok_or_else(|| error!(PassError; "OUT OF FRESH VARIABLE NAMES"))?;
                        names.insert(key, name.clone());
                        constants.push((number.clone(), name.clone()));
                        name
                    }
                };
                tokens.push(Token::new(token.line, TokenKind::Ident(name)));
            }
            _ => tokens.push(token.clone()),
        }
    }
    Ok(Statement::new(tokens))
}
