//! Acceptance evaluation and rejection diagnostics for terminal configurations.

use crate::automaton::Automaton;
use crate::trace::Configuration;
use crate::types::{AcceptanceMode, AcceptedBy, RejectReason};

/// Decides whether a configuration whose input is exhausted is accepting.
///
/// Returns the criterion that held, preferring the final-state criterion when both hold, or
/// `None` if the configuration does not satisfy the automaton's acceptance mode.
pub fn evaluate(automaton: &Automaton, configuration: &Configuration) -> Option<AcceptedBy> {
    let in_final_state = automaton.is_final(&configuration.state);
    let stack_empty = configuration.stack.is_empty();

    match automaton.acceptance() {
        AcceptanceMode::FinalStateOnly => in_final_state.then_some(AcceptedBy::FinalState),
        AcceptanceMode::EmptyStackOnly => stack_empty.then_some(AcceptedBy::EmptyStack),
        AcceptanceMode::EitherFinalStateOrEmptyStack => {
            if in_final_state {
                Some(AcceptedBy::FinalState)
            } else if stack_empty {
                Some(AcceptedBy::EmptyStack)
            } else {
                None
            }
        }
    }
}

/// Explains why a dead-end configuration does not accept.
///
/// # Arguments
///
/// * `automaton` - The automaton that was run.
/// * `configuration` - The configuration the search could not continue from.
/// * `input_len` - The length of the input being read.
/// * `had_candidates` - Whether any transition applied to the configuration (all of them led to
///   configurations already open on the path).
pub fn diagnose(
    automaton: &Automaton,
    configuration: &Configuration,
    input_len: usize,
    had_candidates: bool,
) -> RejectReason {
    let cursor = configuration.cursor;
    if cursor < input_len {
        return if had_candidates {
            RejectReason::InputNotExhausted { cursor }
        } else {
            RejectReason::NoApplicableTransition { cursor }
        };
    }

    match automaton.acceptance() {
        AcceptanceMode::EmptyStackOnly => RejectReason::StackNotEmpty,
        AcceptanceMode::FinalStateOnly | AcceptanceMode::EitherFinalStateOrEmptyStack => {
            RejectReason::WrongFinalState
        }
    }
}
