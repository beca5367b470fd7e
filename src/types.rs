//! This module defines the core data structures and types used throughout the pushdown automaton
//! simulator, including automaton definitions, transition rules, verdicts, and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::Rule;

/// The symbol used to display epsilon (the "consume/require/push nothing" wildcard).
pub const EPSILON_SYMBOL: char = 'ε';
/// The maximum allowed size for an automaton definition in bytes.
pub const MAX_DEFINITION_SIZE: usize = 65536; // 64KB
/// The maximum number of search calls before a run is abandoned.
pub const MAX_SEARCH_STEPS: usize = 100_000;
/// The maximum length of a single search path.
///
/// Each level of the search is a native call frame; this default stays within a 2 MB thread stack
/// in unoptimized builds.
pub const MAX_SEARCH_DEPTH: usize = 256;

/// Plain-data description of a pushdown automaton.
///
/// A definition is what the parser produces and what [`crate::Automaton::new`] consumes. It is
/// not validated by construction; validation happens in the analyzer and in the builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Definition {
    /// Human readable name of the automaton.
    pub name: String,
    /// The finite set of states, in declaration order.
    pub states: Vec<String>,
    /// The input alphabet.
    pub input_alphabet: Vec<char>,
    /// The stack alphabet.
    pub stack_alphabet: Vec<char>,
    /// The state every run starts in.
    pub initial_state: String,
    /// The accepting states.
    pub final_states: Vec<String>,
    /// How terminal configurations are judged.
    pub acceptance: AcceptanceMode,
    /// Symbol placed on the stack before a run starts. `None` starts with an empty stack.
    #[serde(default)]
    pub initial_stack_symbol: Option<char>,
    /// Transition rules in registration order.
    pub transitions: Vec<TransitionRule>,
}

impl Definition {
    /// Returns the number of distinct transition keys, i.e. rows of the transition table.
    pub fn key_count(&self) -> usize {
        let mut keys: Vec<TransitionKey> = self.transitions.iter().map(|t| t.key()).collect();
        keys.sort();
        keys.dedup();
        keys.len()
    }

    /// Checks if two or more rules share a key, which makes the automaton nondeterministic.
    ///
    /// Rules whose keys merely overlap through epsilon wildcards are not counted.
    pub fn has_shared_keys(&self) -> bool {
        self.key_count() < self.transitions.len()
    }
}

/// A single `(origin, input, stack top) -> (destination, push)` rule as written in a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub origin: String,
    /// Input symbol to consume. `None` is epsilon.
    pub input: Option<char>,
    /// Stack symbol to pop. `None` is epsilon.
    pub pop: Option<char>,
    pub destination: String,
    /// Symbols to push, deepest first.
    pub push: Vec<char>,
}

impl TransitionRule {
    pub fn key(&self) -> TransitionKey {
        TransitionKey {
            state: self.origin.clone(),
            input: self.input,
            stack: self.pop,
        }
    }

    pub fn target(&self) -> TransitionTarget {
        TransitionTarget {
            destination: self.destination.clone(),
            push: self.push.clone(),
        }
    }
}

/// The left-hand side of a transition: current state, input symbol and required stack top.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransitionKey {
    pub state: String,
    /// `None` is epsilon: the transition consumes no input.
    pub input: Option<char>,
    /// `None` is epsilon: the transition neither requires nor pops a stack symbol.
    pub stack: Option<char>,
}

impl TransitionKey {
    pub fn new(state: impl Into<String>, input: Option<char>, stack: Option<char>) -> Self {
        Self {
            state: state.into(),
            input,
            stack,
        }
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.state,
            display_symbol(self.input),
            display_symbol(self.stack)
        )
    }
}

/// The right-hand side of a transition: the next state and the symbols to push.
///
/// Pushing `s1 s2 … sn` leaves `sn` on top and `s1` deepest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionTarget {
    pub destination: String,
    pub push: Vec<char>,
}

impl TransitionTarget {
    pub fn new(destination: impl Into<String>, push: &str) -> Self {
        Self {
            destination: destination.into(),
            push: push.chars().collect(),
        }
    }
}

impl fmt::Display for TransitionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let push: String = self.push.iter().collect();
        write!(f, "({}, {})", self.destination, display_word(&push))
    }
}

/// The rule deciding whether a configuration with exhausted input is accepting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceptanceMode {
    /// Accept iff the current state is final.
    FinalStateOnly,
    /// Accept iff the stack is empty.
    EmptyStackOnly,
    /// Accept iff the state is final or the stack is empty.
    EitherFinalStateOrEmptyStack,
}

impl fmt::Display for AcceptanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AcceptanceMode::FinalStateOnly => "final-state",
            AcceptanceMode::EmptyStackOnly => "empty-stack",
            AcceptanceMode::EitherFinalStateOrEmptyStack => "either",
        };
        f.write_str(name)
    }
}

/// Which acceptance criterion held on the accepting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceptedBy {
    FinalState,
    EmptyStack,
}

impl fmt::Display for AcceptedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptedBy::FinalState => f.write_str("final state"),
            AcceptedBy::EmptyStack => f.write_str("empty stack"),
        }
    }
}

/// Why a run ended without accepting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Transitions existed but every one of them led back into a configuration already open
    /// on the path, so the remaining input could not be read.
    InputNotExhausted { cursor: usize },
    /// Input exhausted in a non-final state.
    WrongFinalState,
    /// Input exhausted with symbols left on the stack.
    StackNotEmpty,
    /// No transition applies before the input is exhausted.
    NoApplicableTransition { cursor: usize },
    /// The step, depth or time budget ran out before the search could finish.
    SearchBudgetExceeded,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InputNotExhausted { cursor } => {
                write!(f, "input not exhausted (stopped at position {cursor})")
            }
            RejectReason::WrongFinalState => f.write_str("input exhausted in a non-final state"),
            RejectReason::StackNotEmpty => f.write_str("input exhausted but stack is not empty"),
            RejectReason::NoApplicableTransition { cursor } => {
                write!(f, "no applicable transition at position {cursor}")
            }
            RejectReason::SearchBudgetExceeded => f.write_str("search budget exceeded"),
        }
    }
}

/// The outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accepted(AcceptedBy),
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// Limits applied to a single run.
///
/// `max_steps` counts search calls across all branches, `max_depth` bounds the length of a single
/// path and so the native recursion depth, `timeout` is measured from the start of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBudget {
    pub max_steps: usize,
    pub max_depth: usize,
    #[serde(default)]
    pub timeout: Option<Duration>,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_steps: MAX_SEARCH_STEPS,
            max_depth: MAX_SEARCH_DEPTH,
            timeout: None,
        }
    }
}

/// Represents various errors that can occur while defining or loading an automaton.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PdaError {
    /// A transition, the initial state or a final state names a state that was never registered.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    /// A symbol is used outside the alphabet it belongs to.
    #[error("Symbol '{symbol}' is not in the {alphabet} alphabet")]
    AlphabetViolation { symbol: char, alphabet: Alphabet },
    /// Indicates an error during the parsing of an automaton definition.
    #[error("Definition parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a structural problem with a definition.
    #[error("Definition validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}

/// The alphabet an [`PdaError::AlphabetViolation`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alphabet {
    Input,
    Stack,
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alphabet::Input => f.write_str("input"),
            Alphabet::Stack => f.write_str("stack"),
        }
    }
}

/// Renders an optional symbol, using ε for `None`.
pub fn display_symbol(symbol: Option<char>) -> char {
    symbol.unwrap_or(EPSILON_SYMBOL)
}

/// Renders a word, using ε for the empty word.
pub fn display_word(word: &str) -> String {
    if word.is_empty() {
        EPSILON_SYMBOL.to_string()
    } else {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptance_mode_serialization() {
        let mode = AcceptanceMode::EitherFinalStateOrEmptyStack;
        let json = serde_json::to_string(&mode).unwrap();
        assert_eq!(json, "\"EitherFinalStateOrEmptyStack\"");

        let back: AcceptanceMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mode);
    }

    #[test]
    fn test_transition_display() {
        let key = TransitionKey::new("q0", None, Some('X'));
        let target = TransitionTarget::new("q1", "");
        assert_eq!(format!("{key} → {target}"), "(q0, ε, X) → (q1, ε)");

        let target = TransitionTarget::new("q2", "XY");
        assert_eq!(target.to_string(), "(q2, XY)");
    }

    #[test]
    fn test_error_display() {
        let error = PdaError::AlphabetViolation {
            symbol: 'z',
            alphabet: Alphabet::Stack,
        };
        assert_eq!(error.to_string(), "Symbol 'z' is not in the stack alphabet");

        let error = PdaError::InvalidReference("unknown state 'q9'".to_string());
        assert!(error.to_string().contains("q9"));
    }

    #[test]
    fn test_key_count_ignores_repeated_keys() {
        let rule = |origin: &str, input, pop| TransitionRule {
            origin: origin.to_string(),
            input,
            pop,
            destination: "q0".to_string(),
            push: vec![],
        };
        let definition = Definition {
            name: "Keys".to_string(),
            states: vec!["q0".to_string()],
            input_alphabet: vec!['a'],
            stack_alphabet: vec![],
            initial_state: "q0".to_string(),
            final_states: vec![],
            acceptance: AcceptanceMode::EmptyStackOnly,
            initial_stack_symbol: None,
            transitions: vec![
                rule("q0", Some('a'), None),
                rule("q0", Some('a'), None),
                rule("q0", None, None),
            ],
        };
        assert_eq!(definition.key_count(), 2);
        assert!(definition.has_shared_keys());
    }
}
