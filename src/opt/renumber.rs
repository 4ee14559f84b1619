use super::rewrite::{rewrite, Rewriter};
use crate::error;
use crate::lang::{Error, Line, Program};

/// Replace every line number with a dense 0..N-1 sequence in program
/// order. The framework's reference rewriting keeps the jumps honest.
pub fn renumber(program: &Program) -> Result<Program, Error> {
    if program.len() > usize::from(u16::MAX) + 1 {
        return Err(error!(PassError; "TOO MANY LINES TO RENUMBER"));
    }
    Ok(rewrite(program, &mut Renumber { next: 0 }))
}

struct Renumber {
    next: u16,
}

impl Rewriter for Renumber {
    fn rewrite_line(&mut self, line: &Line) -> Option<Line> {
        let number = self.next;
        self.next = self.next.wrapping_add(1);
        Some(Line::new(number, line.statements.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{lex, parse};

    fn renumbered(s: &str) -> String {
        renumber(&parse(&lex(s).unwrap()).unwrap())
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_dense_sequence_with_fixed_references() {
        assert_eq!(
            renumbered("100 PRINT\n150 GOSUB 300\n300 RETURN"),
            "0 PRINT\n1 GOSUB 2\n2 RETURN\n"
        );
    }

    #[test]
    fn test_idempotent() {
        let p = parse(&lex("5 GOTO 20\n20 IF A THEN 5").unwrap()).unwrap();
        let once = renumber(&p).unwrap();
        let twice = renumber(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.to_string(), "0 GOTO 1\n1 IF A THEN 0\n");
    }
}
