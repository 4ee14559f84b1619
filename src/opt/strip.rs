use super::rewrite::Rewriter;
use crate::lang::{Statement, TokenKind};

/// Deletes zero-token statements, the artifact of "::" in source. A
/// line left with no statements is deleted too, with its number
/// reassigned to the next survivor.
pub struct RemoveEmptyStatements;

impl Rewriter for RemoveEmptyStatements {
    fn rewrite_statement(&mut self, statement: &Statement) -> Option<Statement> {
        if statement.tokens.is_empty() {
            None
        } else {
            Some(statement.clone())
        }
    }
}

/// Deletes any statement whose first token is a comment.
pub struct RemoveRemStatements;

impl Rewriter for RemoveRemStatements {
    fn rewrite_statement(&mut self, statement: &Statement) -> Option<Statement> {
        match statement.tokens.first().map(|t| &t.kind) {
            Some(TokenKind::Comment(_)) => None,
            _ => Some(statement.clone()),
        }
    }
}
