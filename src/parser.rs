//! This module provides the parser for pushdown automaton definitions, utilizing the `pest` crate.
//! It defines the grammar for `.pda` files and functions to parse the input into a `Definition`.

use crate::{
    analyzer::analyze,
    types::{AcceptanceMode, Definition, PdaError, TransitionRule, EPSILON_SYMBOL, MAX_DEFINITION_SIZE},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Derives a `PestParser` for the definition grammar in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct PdaParser;

/// Parses the given input string into a `Definition`.
///
/// This is the main entry point for parsing automaton definitions. The parsed definition is
/// analyzed before being returned, so every state and symbol reference in it is valid.
///
/// # Arguments
///
/// * `input` - A string slice containing the automaton definition.
///
/// # Returns
///
/// * `Ok(Definition)` if the input is successfully parsed and validated.
/// * `Err(PdaError::ParseError)` if there are any syntax errors.
/// * `Err(PdaError::ValidationError)` if a required section is missing.
/// * `Err(PdaError::InvalidReference)` or `Err(PdaError::AlphabetViolation)` if the analyzer
///   rejects the definition.
pub fn parse(input: &str) -> Result<Definition, PdaError> {
    if input.len() > MAX_DEFINITION_SIZE {
        return Err(PdaError::ValidationError(format!(
            "Definition is larger than {MAX_DEFINITION_SIZE} bytes"
        )));
    }

    let root = PdaParser::parse(Rule::program, input.trim())
        .map_err(|e| PdaError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| PdaError::ValidationError("Empty definition".to_string()))?;

    let definition = parse_definition(root)?;

    analyze(&definition)?;

    Ok(definition)
}

/// Parses the top-level sections of a definition from a `Pair<Rule::program>`.
fn parse_definition(pair: Pair<Rule>) -> Result<Definition, PdaError> {
    let mut name: Option<String> = None;
    let mut states: Option<Vec<String>> = None;
    let mut input_alphabet: Option<Vec<char>> = None;
    let mut stack_alphabet: Option<Vec<char>> = None;
    let mut initial_state: Option<String> = None;
    let mut final_states: Option<Vec<String>> = None;
    let mut acceptance: Option<AcceptanceMode> = None;
    let mut initial_stack_symbol: Option<char> = None;
    let mut transitions: Option<Vec<TransitionRule>> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let kind = p.as_rule();

        check_unique_section(kind, span, &mut seen)?;

        match kind {
            Rule::name => name = Some(p.into_inner().as_str().trim().to_string()),
            Rule::states => states = Some(parse_states(p)),
            Rule::input => input_alphabet = Some(parse_symbols(p)),
            Rule::stack => stack_alphabet = Some(parse_symbols(p)),
            Rule::initial => initial_state = Some(p.into_inner().as_str().to_string()),
            Rule::finals => final_states = Some(parse_states(p)),
            Rule::accept => acceptance = Some(parse_mode(p)?),
            Rule::bottom => initial_stack_symbol = parse_symbols(p).first().copied(),
            Rule::rules => transitions = Some(parse_transitions(p)?),
            _ => {} // Skip EOI
        }
    }

    let name = check_required_rule(name, "name")?;
    let states = check_required_rule(states, "states")?;
    let input_alphabet = check_required_rule(input_alphabet, "input")?;
    let acceptance = check_required_rule(acceptance, "accept")?;
    let transitions = check_required_rule(transitions, "rules")?;

    // The first declared state is the initial state unless one is named
    let initial_state = match initial_state {
        Some(state) => state,
        None => states.first().cloned().unwrap_or_default(),
    };

    Ok(Definition {
        name,
        states,
        input_alphabet,
        stack_alphabet: stack_alphabet.unwrap_or_default(),
        initial_state,
        final_states: final_states.unwrap_or_default(),
        acceptance,
        initial_stack_symbol,
        transitions,
    })
}

/// Parses a comma separated list of states from a `states` or `finals` section.
fn parse_states(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::state)
        .map(|p| p.as_str().to_string())
        .collect()
}

/// Parses a comma separated list of symbols from an `input`, `stack` or `bottom` section.
fn parse_symbols(pair: Pair<Rule>) -> Vec<char> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::symbol)
        .map(|p| parse_symbol(p.as_str()))
        .collect()
}

/// Parses the acceptance mode from a `Pair<Rule::accept>`.
fn parse_mode(pair: Pair<Rule>) -> Result<AcceptanceMode, PdaError> {
    let span = pair.as_span();
    let mode = pair.into_inner().as_str();

    match mode {
        "final-state" => Ok(AcceptanceMode::FinalStateOnly),
        "empty-stack" => Ok(AcceptanceMode::EmptyStackOnly),
        "either" => Ok(AcceptanceMode::EitherFinalStateOrEmptyStack),
        _ => Err(parse_error(
            &format!("Unsupported acceptance mode: {mode}"),
            span,
        )),
    }
}

/// Parses the rules section from a `Pair<Rule::rules>`, keeping the order rules were written in.
fn parse_transitions(pair: Pair<Rule>) -> Result<Vec<TransitionRule>, PdaError> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::rule)
        .map(parse_transition)
        .collect()
}

/// Parses a single `origin, input, pop -> destination, push` rule.
fn parse_transition(pair: Pair<Rule>) -> Result<TransitionRule, PdaError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();

    let origin = next_pair(&mut pairs, span)?.as_str().to_string();
    let input = parse_read(next_pair(&mut pairs, span)?);
    let pop = parse_read(next_pair(&mut pairs, span)?);
    let destination = next_pair(&mut pairs, span)?.as_str().to_string();
    let push = parse_push(next_pair(&mut pairs, span)?);

    Ok(TransitionRule {
        origin,
        input,
        pop,
        destination,
        push,
    })
}

/// Parses the input or pop field of a rule, mapping epsilon to `None`.
fn parse_read(pair: Pair<Rule>) -> Option<char> {
    match pair.as_rule() {
        Rule::symbol => Some(parse_symbol(pair.as_str())),
        _ => None,
    }
}

/// Parses the push field of a rule. Epsilon pushes nothing.
fn parse_push(pair: Pair<Rule>) -> Vec<char> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::symbol)
        .map(|p| parse_symbol(p.as_str()))
        .collect()
}

/// Parses a single character symbol, handling quoted and unquoted symbols.
fn parse_symbol(input: &str) -> char {
    let unquoted = input
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(input);

    unquoted.chars().next().unwrap_or(EPSILON_SYMBOL)
}

/// Returns the next pair of a rule, failing with a parse error at `span` if there is none.
fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, span: Span<'i>) -> Result<Pair<'i, Rule>, PdaError> {
    pairs
        .next()
        .ok_or_else(|| parse_error("Incomplete transition rule", span))
}

/// Creates a `PdaError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> PdaError {
    PdaError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Returns the keyword a section is declared with, or `None` if `kind` is not a section.
fn keyword(kind: Rule) -> Option<&'static str> {
    match kind {
        Rule::name => Some("name"),
        Rule::states => Some("states"),
        Rule::input => Some("input"),
        Rule::stack => Some("stack"),
        Rule::initial => Some("initial"),
        Rule::finals => Some("final"),
        Rule::accept => Some("accept"),
        Rule::bottom => Some("bottom"),
        Rule::rules => Some("rules"),
        _ => None,
    }
}

/// Checks if a given section has already been declared.
fn check_unique_section(kind: Rule, span: Span, seen: &mut HashSet<Rule>) -> Result<(), PdaError> {
    let Some(name) = keyword(kind) else {
        return Ok(());
    };

    if !seen.insert(kind) {
        return Err(parse_error(
            &format!("Duplicate \"{name}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str) -> Result<T, PdaError> {
    value.ok_or_else(|| PdaError::ValidationError(format!("Missing '{name}' section")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Alphabet;

    const BALANCED: &str = r#"
name: Balanced parentheses
states: q0
input: (, )
stack: X
accept: empty-stack
rules:
  q0, (, ε -> q0, X
  q0, ), X -> q0, ε
"#;

    #[test]
    fn test_parse_simple_definition() {
        let definition = parse(BALANCED).unwrap();

        assert_eq!(definition.name, "Balanced parentheses");
        assert_eq!(definition.states, vec!["q0"]);
        assert_eq!(definition.input_alphabet, vec!['(', ')']);
        assert_eq!(definition.stack_alphabet, vec!['X']);
        assert_eq!(definition.initial_state, "q0");
        assert!(definition.final_states.is_empty());
        assert_eq!(definition.acceptance, AcceptanceMode::EmptyStackOnly);
        assert_eq!(definition.initial_stack_symbol, None);
        assert_eq!(
            definition.transitions,
            vec![
                TransitionRule {
                    origin: "q0".into(),
                    input: Some('('),
                    pop: None,
                    destination: "q0".into(),
                    push: vec!['X'],
                },
                TransitionRule {
                    origin: "q0".into(),
                    input: Some(')'),
                    pop: Some('X'),
                    destination: "q0".into(),
                    push: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_parse_full_definition() {
        let input = r#"
# aⁿbⁿ with a bottom marker
name: a^n b^n   # trailing comment
states: q0, q1, q2
input: a, b
stack: X, Z
initial: q0
final: q2
accept: final-state
bottom: Z
rules:
  q0, a, _ -> q0, X

  # pop one X per b
  q0, b, X -> q1, _
  q1, b, X -> q1, ε
  q0, _, Z -> q2, ε
  q1, ε, Z -> q2, ε
"#;
        let definition = parse(input).unwrap();

        assert_eq!(definition.name, "a^n b^n");
        assert_eq!(definition.final_states, vec!["q2"]);
        assert_eq!(definition.acceptance, AcceptanceMode::FinalStateOnly);
        assert_eq!(definition.initial_stack_symbol, Some('Z'));
        assert_eq!(definition.transitions.len(), 5);
        assert_eq!(definition.transitions[3].input, None);
        assert_eq!(definition.transitions[3].pop, Some('Z'));
    }

    #[test]
    fn test_parse_multi_symbol_push_and_quoted_symbols() {
        let input = r#"
name: Quoted
states: q0
input: ',', '#', a
stack: A, B
accept: either
rules:
  q0, ',', ε -> q0, AB
  q0, '#', A -> q0, B A
"#;
        let definition = parse(input).unwrap();

        assert_eq!(definition.input_alphabet, vec![',', '#', 'a']);
        assert_eq!(definition.transitions[0].input, Some(','));
        assert_eq!(definition.transitions[0].push, vec!['A', 'B']);
        assert_eq!(definition.transitions[1].push, vec!['B', 'A']);
        assert_eq!(
            definition.acceptance,
            AcceptanceMode::EitherFinalStateOrEmptyStack
        );
    }

    #[test]
    fn test_initial_state_defaults_to_first_state() {
        let input = r#"
name: Default initial
states: start, other
input: a
accept: final-state
rules:
  start, a, ε -> other, ε
"#;
        let definition = parse(input).unwrap();
        assert_eq!(definition.initial_state, "start");
    }

    #[test]
    fn test_parse_duplicate_section() {
        let input = r#"
name: First Name
name: Second Name
states: q0
input: a
accept: empty-stack
rules:
  q0, a, ε -> q0, ε
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, PdaError::ParseError(_)));
        assert!(error
            .to_string()
            .contains("Duplicate \"name:\" declaration"));
    }

    #[test]
    fn test_duplicate_rules_section() {
        let input = r#"
name: Twice
states: q0
input: a
accept: empty-stack
rules:
  q0, a, ε -> q0, ε
rules:
  q0, a, ε -> q0, ε
"#;
        let error = parse(input).unwrap_err();
        assert!(error
            .to_string()
            .contains("Duplicate \"rules:\" declaration"));
    }

    #[test]
    fn test_keyword_only_names_sections() {
        assert_eq!(keyword(Rule::finals), Some("final"));
        assert_eq!(keyword(Rule::rules), Some("rules"));
        assert_eq!(keyword(Rule::rule), None);
        assert_eq!(keyword(Rule::EOI), None);
    }

    #[test]
    fn test_parse_missing_accept() {
        let input = r#"
name: Missing accept
states: q0
input: a
rules:
  q0, a, ε -> q0, ε
"#;
        let error = parse(input).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Definition validation error: Missing 'accept' section"
        );
    }

    #[test]
    fn test_parse_missing_rules() {
        let input = r#"
name: Missing rules
states: q0
input: a
accept: empty-stack
"#;
        let error = parse(input).unwrap_err();
        assert_eq!(
            error,
            PdaError::ValidationError("Missing 'rules' section".to_string())
        );
    }

    #[test]
    fn test_parse_unknown_acceptance_mode() {
        let input = r#"
name: Bad mode
states: q0
input: a
accept: sometimes
rules:
  q0, a, ε -> q0, ε
"#;
        assert!(matches!(parse(input), Err(PdaError::ParseError(_))));
    }

    #[test]
    fn test_parse_malformed_rule() {
        let input = r#"
name: Malformed
states: q0
input: a
accept: empty-stack
rules:
  q0, a -> q0, ε
"#;
        assert!(matches!(parse(input), Err(PdaError::ParseError(_))));
    }

    #[test]
    fn test_parse_rule_with_unknown_state() {
        let input = r#"
name: Unknown state
states: q0
input: a
accept: empty-stack
rules:
  q0, a, ε -> q1, ε
"#;
        assert!(matches!(parse(input), Err(PdaError::InvalidReference(_))));
    }

    #[test]
    fn test_parse_rule_with_unknown_symbol() {
        let input = r#"
name: Unknown symbol
states: q0
input: a
stack: X
accept: empty-stack
rules:
  q0, a, Y -> q0, ε
"#;
        assert_eq!(
            parse(input).unwrap_err(),
            PdaError::AlphabetViolation {
                symbol: 'Y',
                alphabet: Alphabet::Stack
            }
        );
    }

    #[test]
    fn test_parse_oversized_definition() {
        let input = "#".repeat(MAX_DEFINITION_SIZE + 1);
        assert!(matches!(parse(&input), Err(PdaError::ValidationError(_))));
    }
}
