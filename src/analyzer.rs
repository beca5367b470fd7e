//! This module provides functions for analyzing automaton definitions to detect malformed
//! references before an automaton is built. This includes checks for declared states, the
//! initial and final states, and the alphabets every transition draws its symbols from.

use crate::types::{Alphabet, Definition, PdaError};
use log::warn;
use std::collections::HashSet;

/// Represents various errors that can be found during the analysis of a definition.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// Indicates that the initial state is not among the declared states.
    InvalidStartState(String),
    /// Indicates final states that are not among the declared states.
    UndefinedFinalStates(Vec<String>),
    /// Indicates transitions that reference undeclared states.
    UndefinedStates(Vec<String>),
    /// Indicates a symbol used outside its alphabet.
    InvalidSymbol(char, Alphabet),
    /// Indicates structural problems with the definition (no states, duplicate states, etc.).
    StructuralError(String),
}

impl From<AnalysisError> for PdaError {
    /// Converts an `AnalysisError` into the matching `PdaError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidStartState(state) => {
                PdaError::InvalidReference(format!("Invalid start state: {}", state))
            }
            AnalysisError::UndefinedFinalStates(states) => PdaError::InvalidReference(format!(
                "Final states are not declared: {:?}",
                states
            )),
            AnalysisError::UndefinedStates(transitions) => PdaError::InvalidReference(format!(
                "Transitions reference undefined states: {:?}",
                transitions
            )),
            AnalysisError::InvalidSymbol(symbol, alphabet) => {
                PdaError::AlphabetViolation { symbol, alphabet }
            }
            AnalysisError::StructuralError(msg) => PdaError::ValidationError(msg),
        }
    }
}

/// Analyzes a given `Definition` for structural errors and invalid references.
///
/// The first error found is returned. Unreachable states are not an error; they are reported
/// through the `log` facade.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(PdaError)` for the first violated check.
pub fn analyze(definition: &Definition) -> Result<(), PdaError> {
    let errors = [
        check_structure,
        check_valid_start_state,
        check_final_states,
        check_transition_states,
        check_symbols,
    ]
    .iter()
    .filter_map(|f| f(definition).err())
    .collect::<Vec<_>>();

    if let Some(first_error) = errors.first() {
        return Err(first_error.clone().into());
    }

    let unreachable = unreachable_states(definition);
    if !unreachable.is_empty() {
        warn!(
            "'{}': states unreachable from {}: {:?}",
            definition.name, definition.initial_state, unreachable
        );
    }

    Ok(())
}

/// Checks that at least one state is declared and that no state is declared twice.
fn check_structure(definition: &Definition) -> Result<(), AnalysisError> {
    if definition.states.is_empty() {
        return Err(AnalysisError::StructuralError(
            "No states defined".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for state in &definition.states {
        if !seen.insert(state) {
            return Err(AnalysisError::StructuralError(format!(
                "State '{}' is declared more than once",
                state
            )));
        }
    }

    Ok(())
}

/// Checks whether the initial state is one of the declared states.
fn check_valid_start_state(definition: &Definition) -> Result<(), AnalysisError> {
    if !definition.states.contains(&definition.initial_state) {
        return Err(AnalysisError::InvalidStartState(
            definition.initial_state.clone(),
        ));
    }

    Ok(())
}

/// Checks that every final state is declared.
fn check_final_states(definition: &Definition) -> Result<(), AnalysisError> {
    let mut undefined: Vec<String> = definition
        .final_states
        .iter()
        .filter(|state| !definition.states.contains(state))
        .cloned()
        .collect();

    if !undefined.is_empty() {
        undefined.sort();
        undefined.dedup();
        return Err(AnalysisError::UndefinedFinalStates(undefined));
    }

    Ok(())
}

/// Checks that the origin and destination of every transition are declared states.
fn check_transition_states(definition: &Definition) -> Result<(), AnalysisError> {
    let declared: HashSet<&String> = definition.states.iter().collect();

    let mut undefined = Vec::new();
    for (i, rule) in definition.transitions.iter().enumerate() {
        for state in [&rule.origin, &rule.destination] {
            if !declared.contains(state) {
                undefined.push(format!(
                    "{}[{}] -> {}",
                    rule.origin, i, rule.destination
                ));
                break;
            }
        }
    }

    if !undefined.is_empty() {
        return Err(AnalysisError::UndefinedStates(undefined));
    }

    Ok(())
}

/// Checks that the initial stack symbol and every symbol read, popped or pushed by a transition
/// belongs to its alphabet.
fn check_symbols(definition: &Definition) -> Result<(), AnalysisError> {
    let input: HashSet<char> = definition.input_alphabet.iter().copied().collect();
    let stack: HashSet<char> = definition.stack_alphabet.iter().copied().collect();

    if let Some(symbol) = definition.initial_stack_symbol {
        if !stack.contains(&symbol) {
            return Err(AnalysisError::InvalidSymbol(symbol, Alphabet::Stack));
        }
    }

    for rule in &definition.transitions {
        if let Some(symbol) = rule.input.filter(|c| !input.contains(c)) {
            return Err(AnalysisError::InvalidSymbol(symbol, Alphabet::Input));
        }

        let mut stack_symbols = rule.pop.iter().chain(&rule.push);
        if let Some(&symbol) = stack_symbols.find(|c| !stack.contains(c)) {
            return Err(AnalysisError::InvalidSymbol(symbol, Alphabet::Stack));
        }
    }

    Ok(())
}

/// Returns the declared states no sequence of transitions leads to from the initial state,
/// sorted by name.
pub fn unreachable_states(definition: &Definition) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut queue = vec![definition.initial_state.as_str()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        for rule in &definition.transitions {
            if rule.origin == state && !visited.contains(rule.destination.as_str()) {
                queue.push(rule.destination.as_str());
            }
        }
    }

    let mut unreachable: Vec<String> = definition
        .states
        .iter()
        .filter(|state| !visited.contains(state.as_str()))
        .cloned()
        .collect();

    unreachable.sort();
    unreachable
}
