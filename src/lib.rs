//! # bastok
//!
//! A tokenizing compiler for 8-bit home computer BASIC: annotated text
//! source in, the interpreter's exact in-memory program image out.
//!
//! The pipeline is a strict sequence. The lexer turns text into a flat
//! token stream, reproducing the dialect's legacy quirks; the parser
//! builds the line/statement/token tree; an ordered chain of rewriting
//! passes shrinks the tree while keeping every jump target consistent;
//! the emitter lays out the binary, expanding directives inline with a
//! fixed-point code generator for content whose addresses depend on
//! their own length.
//!
//! ```no_run
//! use bastok::{compile, opt::Pass, settings::Settings};
//!
//! let settings = Settings::default();
//! let image = compile("10 TEXT:HOME\n20 GOTO 20", &settings, &Pass::DEFAULT_CHAIN).unwrap();
//! std::fs::write("out.tok", &image.bytes).unwrap();
//! ```

pub mod lang;
pub mod mach;
pub mod opt;
pub mod settings;

use lang::{Error, Lexer, ModalLexer};
use mach::Image;
use opt::Pass;
use settings::Settings;

/// Run the whole pipeline over one source text.
pub fn compile(source: &str, settings: &Settings, passes: &[Pass]) -> Result<Image, Error> {
    let tokens = ModalLexer::new(source)
        .preserve_numbers(settings.preserve_numbers)
        .tokens()?;
    let program = lang::parse(&tokens)?;
    settings.trace.section("parse", &program);
    let program = opt::optimize(&program, settings, passes)?;
    mach::emit(&program, settings)
}
