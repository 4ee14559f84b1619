/*!
# Optimization Module

Tree-rewriting passes over the parsed program, and the framework that
keeps every jump target consistent while lines move, merge, and vanish.

*/

mod hoist;
mod merge;
mod numbers;
mod rename;
mod renumber;
mod rewrite;
mod strip;

pub use rename::NameGenerator;
pub use rewrite::{jump_targets, rewrite, rewrite_targets, Reassignments, Rewriter};

use crate::lang::{Error, Program};
use crate::settings::Settings;

/// The pass set the command line selects from. The documented order of
/// the default chain is required for correctness, not convention:
/// hoisting after renaming keeps generated names from colliding, and
/// merging before renumbering keeps the dense sequence dense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    RemoveEmptyStatements,
    RemoveRemStatements,
    ShortenVariableNames,
    ExtractConstantValues,
    MergeLines,
    Renumber,
    ShortenNumbers,
}

impl Pass {
    pub const DEFAULT_CHAIN: [Pass; 6] = [
        Pass::RemoveEmptyStatements,
        Pass::RemoveRemStatements,
        Pass::ShortenVariableNames,
        Pass::ExtractConstantValues,
        Pass::MergeLines,
        Pass::Renumber,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pass::RemoveEmptyStatements => "remove-empty-statements",
            Pass::RemoveRemStatements => "remove-rem-statements",
            Pass::ShortenVariableNames => "shorten-variable-names",
            Pass::ExtractConstantValues => "extract-constant-values",
            Pass::MergeLines => "merge-lines",
            Pass::Renumber => "renumber",
            Pass::ShortenNumbers => "shorten-numbers",
        }
    }

    pub fn from_name(name: &str) -> Option<Pass> {
        const ALL: [Pass; 7] = [
            Pass::RemoveEmptyStatements,
            Pass::RemoveRemStatements,
            Pass::ShortenVariableNames,
            Pass::ExtractConstantValues,
            Pass::MergeLines,
            Pass::Renumber,
            Pass::ShortenNumbers,
        ];
        ALL.iter().copied().find(|p| p.name() == name)
    }

    pub fn run(self, program: &Program, settings: &Settings) -> Result<Program, Error> {
        match self {
            Pass::RemoveEmptyStatements => {
                Ok(rewrite(program, &mut strip::RemoveEmptyStatements))
            }
            Pass::RemoveRemStatements => Ok(rewrite(program, &mut strip::RemoveRemStatements)),
            Pass::ShortenVariableNames => rename::shorten_variable_names(program),
            Pass::ExtractConstantValues => hoist::extract_constant_values(program),
            Pass::MergeLines => merge::merge_lines(program, settings),
            Pass::Renumber => renumber::renumber(program),
            Pass::ShortenNumbers => numbers::shorten_numbers(program, settings),
        }
    }
}

/// Run an ordered pass chain, tracing each intermediate program to the
/// configured debug sink.
pub fn optimize(program: &Program, settings: &Settings, passes: &[Pass]) -> Result<Program, Error> {
    let mut program = program.clone();
    for pass in passes {
        program = pass.run(&program, settings)?;
        settings.trace.section(pass.name(), &program);
    }
    Ok(program)
}
