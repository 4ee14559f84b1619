/*!
# Language Module

Lexical analysis and structural parsing of the BASIC dialect, and the
program tree every later stage works on.

*/

#[macro_use]
mod error;
mod lex;
mod parse;
mod program;
mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::{lex, lex_preserving, Lexer, ModalLexer, StreamLexer};
pub use parse::parse;
pub use program::{Line, Program, Statement};
pub use token::{syntax_code, text, Number, Token, TokenKind, Word};
