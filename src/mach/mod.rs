/*!
# Machine Module

The byte-code emitter that lays out the interpreter's in-memory program
image, the directives that splice generated content into it, and the
diagnostic proofreaders.

*/

mod directive;
mod emit;
mod generate;
mod proof;
mod shape;

pub use directive::{lookup as directive_lookup, Directive, DirectiveContext, Parameter};
pub use emit::{emit, line_len, Image};
pub use generate::{Generator, DEFAULT_SETTLE_LIMIT};
pub use proof::{lookup as proofreader_lookup, ProofInput, Proofreader};
pub use shape::{ShapeGenerator, ShapeTable};
