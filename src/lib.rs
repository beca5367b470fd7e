//! This crate provides the core logic for a pushdown automaton simulator.
//! It includes modules for parsing automaton definitions, building frozen automata,
//! running them with an ordered backtracking search, and managing a catalog of sample automata.

pub mod acceptance;
pub mod analyzer;
pub mod automaton;
pub mod catalog;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod stack;
pub mod trace;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the automaton, its builder and its transition table.
pub use automaton::{Automaton, AutomatonBuilder, TransitionTable};
/// Re-exports `Catalog`, `DefinitionInfo`, and `DEFINITIONS` from the catalog module.
pub use catalog::{Catalog, DefinitionInfo, DEFINITIONS};
/// Re-exports the `DefinitionLoader` struct from the loader module.
pub use loader::DefinitionLoader;
/// Re-exports the search engine and its result.
pub use machine::{Execution, PushdownMachine};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
pub use stack::Stack;
pub use trace::{AppliedTransition, Configuration, ExecutionTrace, TraceStep};
/// Re-exports the definition, verdict and error types from the types module.
pub use types::{
    AcceptanceMode, AcceptedBy, Alphabet, Definition, PdaError, RejectReason, SearchBudget,
    TransitionKey, TransitionRule, TransitionTarget, Verdict, MAX_DEFINITION_SIZE,
    MAX_SEARCH_DEPTH, MAX_SEARCH_STEPS,
};
