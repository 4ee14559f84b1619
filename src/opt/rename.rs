use super::rewrite::{rewrite, Rewriter};
use crate::error;
use crate::lang::{Error, Program, Statement, Token, TokenKind, Word};
use std::collections::{HashMap, HashSet};

/// Deterministic short-name supply: `A..Z`, then two-character names
/// whose first character cycles A-Z while the second runs over A-Z and
/// 0-9 (`AA, BA, .. ZA, AB, .. Z9`). Names already in use and names
/// that spell a keyword are skipped.
pub struct NameGenerator {
    index: usize,
    used: HashSet<String>,
}

const SECOND: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

impl NameGenerator {
    pub fn new(used: HashSet<String>) -> NameGenerator {
        NameGenerator { index: 0, used }
    }

    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }
}

impl Iterator for NameGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if self.index >= 26 * (1 + SECOND.len()) {
                return None;
            }
            let first = (b'A' + (self.index % 26) as u8) as char;
            let mut name = String::new();
            name.push(first);
            if self.index >= 26 {
                name.push(SECOND[self.index / 26 - 1] as char);
            }
            self.index += 1;
            if self.used.contains(&name) || Word::from_text(&name).is_some() {
                continue;
            }
            self.used.insert(name.clone());
            return Some(name);
        }
    }
}

/// The alphanumeric core of an identifier, its `$`/`%` type suffix, and
/// whether it carries the glued array parenthesis.
fn split_ident(text: &str) -> (&str, &str, bool) {
    let (name, paren) = match text.strip_suffix('(') {
        Some(name) => (name, true),
        None => (text, false),
    };
    let core_end = name
        .rfind(|c: char| c == '$' || c == '%')
        .unwrap_or(name.len());
    (&name[..core_end], &name[core_end..], paren)
}

/// Every identifier whose core exceeds two characters gets a fresh
/// short name; type suffixes survive, so `SCORE` and `SCORE$` rename
/// independently. Directive statements carry parameters, not variable
/// references, and are exempt.
pub fn shorten_variable_names(program: &Program) -> Result<Program, Error> {
    let mut used: HashSet<String> = HashSet::new();
    let mut order: Vec<String> = vec![];
    let mut seen: HashSet<String> = HashSet::new();
    for line in program.lines() {
        for statement in &line.statements {
            if statement.is_directive() {
                continue;
            }
            for token in &statement.tokens {
                if let TokenKind::Ident(text) = &token.kind {
                    let (core, suffix, _) = split_ident(text);
                    used.insert(core.to_string());
                    let key = format!("{}{}", core, suffix);
                    if core.len() > 2 && seen.insert(key.clone()) {
                        order.push(key);
                    }
                }
            }
        }
    }
    let mut generator = NameGenerator::new(used);
    let mut names: HashMap<String, String> = HashMap::new();
    for key in order {
        let name = match generator.next() {
            Some(name) => name,
            None => return Err(error!(PassError; "OUT OF FRESH VARIABLE NAMES")),
        };
        names.insert(key, name);
    }
    Ok(rewrite(program, &mut Renamer { names }))
}

struct Renamer {
    names: HashMap<String, String>,
}

impl Rewriter for Renamer {
    fn rewrite_statement(&mut self, statement: &Statement) -> Option<Statement> {
        if statement.is_directive() {
            return Some(statement.clone());
        }
        let mut tokens = vec![];
        for token in &statement.tokens {
            if let Some(token) = self.rewrite_token(token) {
                tokens.push(token);
            }
        }
        Some(Statement::new(tokens))
    }

    fn rewrite_token(&mut self, token: &Token) -> Option<Token> {
        if let TokenKind::Ident(text) = &token.kind {
            let (core, suffix, paren) = split_ident(text);
            let key = format!("{}{}", core, suffix);
            if let Some(name) = self.names.get(&key) {
                let mut replacement = format!("{}{}", name, suffix);
                if paren {
                    replacement.push('(');
                }
                return Some(Token::new(token.line, TokenKind::Ident(replacement)));
            }
        }
        Some(token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{lex, parse};

    fn program(s: &str) -> Program {
        parse(&lex(s).unwrap()).unwrap()
    }

    #[test]
    fn test_generator_order() {
        let mut g = NameGenerator::new(HashSet::new());
        assert_eq!(g.next().unwrap(), "A");
        assert_eq!(g.next().unwrap(), "B");
        let rest: Vec<String> = g.collect();
        // AT, FN, GR, IF, ON, OR, TO are keywords; the generator steps
        // over them and over anything reserved up front.
        assert!(!rest.iter().any(|n| Word::from_text(n).is_some()));
        assert_eq!(rest.last().unwrap(), "Z9");
    }

    #[test]
    fn test_generator_skips_used() {
        let mut used = HashSet::new();
        used.insert("A".to_string());
        used.insert("B".to_string());
        let mut g = NameGenerator::new(used);
        assert_eq!(g.next().unwrap(), "C");
    }

    #[test]
    fn test_split_ident() {
        assert_eq!(split_ident("SCORE"), ("SCORE", "", false));
        assert_eq!(split_ident("NAME$"), ("NAME", "$", false));
        assert_eq!(split_ident("TOTAL%"), ("TOTAL", "%", false));
        assert_eq!(split_ident("GRID$("), ("GRID", "$", true));
    }

    #[test]
    fn test_rename_preserves_suffixes() {
        let p = program("10 TALLY=1:MSG$=\"HI\":MSG$(2)=MSG$\n20 PRINT TALLY;MSG$");
        let out = shorten_variable_names(&p).unwrap();
        let listing = out.to_string();
        assert_eq!(listing, "10 A=1:B$=\"HI\":B$(2)=B$\n20 PRINT A;B$\n");
    }

    #[test]
    fn test_short_names_and_directives_untouched(){
        let p = program("10 XY=1:Q=2\n20 $embed FILE=\"DATAFILE.BIN\"");
        let out = shorten_variable_names(&p).unwrap();
        assert_eq!(out, p);
    }

    #[test]
    fn test_existing_names_not_reused() {
        let p = program("10 A=1:COUNT=2");
        let out = shorten_variable_names(&p).unwrap();
        // A is taken by the source itself.
        assert_eq!(out.lines()[0].to_string(), "10 A=1:B=2");
    }
}
