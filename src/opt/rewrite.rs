use crate::lang::{Line, Number, Program, Statement, Token, TokenKind, Word};
use std::collections::{BTreeMap, HashSet};

/// Original line number mapped to where control now lands: the line it
/// collapsed into, or `None` when it was deleted with no surviving
/// successor (such a reference is left untouched).
pub type Reassignments = BTreeMap<u16, Option<u16>>;

/// A rewriting pass. Every method rebuilds its node; returning `None`
/// deletes the node from the rebuilt parent.
pub trait Rewriter {
    fn rewrite_line(&mut self, line: &Line) -> Option<Line> {
        let mut statements = vec![];
        for statement in &line.statements {
            if let Some(statement) = self.rewrite_statement(statement) {
                statements.push(statement);
            }
        }
        Some(Line::new(line.number, statements))
    }

    fn rewrite_statement(&mut self, statement: &Statement) -> Option<Statement> {
        let mut tokens = vec![];
        for token in &statement.tokens {
            if let Some(token) = self.rewrite_token(token) {
                tokens.push(token);
            }
        }
        Some(Statement::new(tokens))
    }

    fn rewrite_token(&mut self, token: &Token) -> Option<Token> {
        Some(token.clone())
    }
}

/// Drive a pass over a program, always building a fresh tree. A line
/// that is dropped, or whose statements all vanish, is recorded in the
/// reassignment map as pending until the next surviving line resolves
/// it; a line whose number changes is recorded immediately. When
/// anything was recorded, the fresh tree gets a reference-rewriting
/// pass so every jump target lands where its line went.
pub fn rewrite(program: &Program, pass: &mut dyn Rewriter) -> Program {
    let mut out = Program::new();
    let mut map = Reassignments::new();
    let mut pending: Vec<u16> = vec![];
    for line in program.lines() {
        match pass.rewrite_line(line) {
            Some(new) if !new.statements.is_empty() => {
                if new.number != line.number {
                    map.insert(line.number, Some(new.number));
                }
                for old in pending.drain(..) {
                    map.insert(old, Some(new.number));
                }
                out.push(new);
            }
            _ => pending.push(line.number),
        }
    }
    for old in pending.drain(..) {
        map.insert(old, None);
    }
    if !map.is_empty() {
        rewrite_targets(&mut out, &map);
    }
    out
}

fn is_trigger(word: Word) -> bool {
    matches!(
        word,
        Word::Gosub | Word::Goto | Word::Then | Word::Run | Word::List | Word::On
    )
}

/// Indices of the line-number operands in a statement: after each
/// trigger keyword, the comma-separated run of numeric literals.
/// Consuming the run in one left-to-right scan means `ON X GOTO
/// 10,20,30` rewrites every arm exactly once.
fn operand_indices(tokens: &[Token]) -> Vec<usize> {
    let mut indices = vec![];
    let mut i = 0;
    while i < tokens.len() {
        let trigger = tokens[i].word().map_or(false, is_trigger);
        i += 1;
        if !trigger {
            continue;
        }
        loop {
            match tokens.get(i) {
                Some(token) if token.number().is_some() => {
                    indices.push(i);
                    i += 1;
                }
                _ => break,
            }
            if tokens.get(i).map_or(false, |t| t.is_syntax(',')) {
                i += 1;
            } else {
                break;
            }
        }
    }
    indices
}

/// Rewrite every jump-target operand found in the reassignment map.
pub fn rewrite_targets(program: &mut Program, map: &Reassignments) {
    for line in program.lines_mut() {
        for statement in &mut line.statements {
            for i in operand_indices(&statement.tokens) {
                let replacement = {
                    let token = &statement.tokens[i];
                    let number = match token.number() {
                        Some(number) => number,
                        None => continue,
                    };
                    number
                        .as_line_number()
                        .and_then(|old| map.get(&old).copied())
                        .flatten()
                        .map(|new| {
                            let value = f64::from(new);
                            // A retargeted literal always respells
                            // canonically, preservation mode included.
                            let text = number.text.as_ref().map(|_| Number::canonical(value));
                            Token::new(token.line, TokenKind::Number(Number { value, text }))
                        })
                };
                if let Some(replacement) = replacement {
                    statement.tokens[i] = replacement;
                }
            }
        }
    }
}

/// Every line number referenced as a jump target anywhere in the
/// program. These lines must stay independently addressable.
pub fn jump_targets(program: &Program) -> HashSet<u16> {
    let mut targets = HashSet::new();
    for line in program.lines() {
        for statement in &line.statements {
            for i in operand_indices(&statement.tokens) {
                if let Some(number) = statement.tokens[i].number() {
                    if let Some(target) = number.as_line_number() {
                        targets.insert(target);
                    }
                }
            }
        }
    }
    targets
}
