use super::rewrite::{jump_targets, rewrite_targets, Reassignments};
use crate::lang::{Error, Line, Program, TokenKind, Word};
use crate::mach::line_len;
use crate::settings::Settings;

/// Folding consecutive lines into one pays off five bytes of link,
/// number, and terminator per line absorbed. Three things stop a fold:
/// a jump target must stay independently addressable, the merged line
/// must not out-grow the configured ceiling, and a line carrying a
/// terminal construct ends the run after itself (anything appended
/// after an IF would become conditional; after a comment, commentary).
/// Directive lines stay whole on both sides.
pub fn merge_lines(program: &Program, settings: &Settings) -> Result<Program, Error> {
    let targets = jump_targets(program);
    let mut out = Program::new();
    let mut map = Reassignments::new();
    let mut current: Option<Line> = None;
    for line in program.lines() {
        let unmergeable = targets.contains(&line.number) || is_directive_line(line);
        current = match current.take() {
            None => Some(line.clone()),
            Some(cur) => {
                if unmergeable {
                    out.push(cur);
                    Some(line.clone())
                } else {
                    let mut merged = cur.clone();
                    merged.statements.extend(line.statements.iter().cloned());
                    if line_len(&merged)? > settings.max_line_length {
                        out.push(cur);
                        Some(line.clone())
                    } else {
                        map.insert(line.number, Some(merged.number));
                        Some(merged)
                    }
                }
            }
        };
        if has_terminal(line) {
            if let Some(cur) = current.take() {
                out.push(cur);
            }
        }
    }
    if let Some(cur) = current.take() {
        out.push(cur);
    }
    if !map.is_empty() {
        rewrite_targets(&mut out, &map);
    }
    Ok(out)
}

fn is_directive_line(line: &Line) -> bool {
    line.statements.first().map_or(false, |s| s.is_directive())
}

fn has_terminal(line: &Line) -> bool {
    line.statements.iter().any(|statement| {
        statement.tokens.iter().any(|token| match &token.kind {
            TokenKind::Comment(_) | TokenKind::Directive(_) => true,
            TokenKind::Word(word) => matches!(
                word,
                Word::If | Word::Goto | Word::End | Word::Resume | Word::Return | Word::Stop
            ),
            _ => false,
        })
    })
}
