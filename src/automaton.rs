//! This module defines the frozen [`Automaton`], its [`TransitionTable`], and the
//! [`AutomatonBuilder`] that validates every state and symbol reference while an automaton is
//! being assembled.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::machine::{Execution, PushdownMachine};
use crate::types::{
    AcceptanceMode, Alphabet, Definition, PdaError, TransitionKey, TransitionRule,
    TransitionTarget,
};

/// A nondeterministic transition relation.
///
/// Targets registered under the same key are kept in registration order, which is the order the
/// search tries them in.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    rules: HashMap<TransitionKey, Vec<TransitionTarget>>,
    order: Vec<TransitionKey>,
}

impl TransitionTable {
    fn insert(&mut self, key: TransitionKey, target: TransitionTarget) {
        match self.rules.get_mut(&key) {
            Some(targets) => targets.push(target),
            None => {
                self.order.push(key.clone());
                self.rules.insert(key, vec![target]);
            }
        }
    }

    /// Returns the targets registered under exactly this key.
    pub fn get(&self, key: &TransitionKey) -> &[TransitionTarget] {
        self.rules.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the transitions for `state` reading `input` (or nothing, when `input` is `None`),
    /// in the order the search tries them: keys requiring `top` first, then keys with an epsilon
    /// stack field.
    pub fn candidates<'a>(
        &'a self,
        state: &str,
        input: Option<char>,
        top: Option<char>,
    ) -> impl Iterator<Item = (&'a TransitionKey, &'a TransitionTarget)> + 'a {
        let mut keys = Vec::with_capacity(2);
        if top.is_some() {
            keys.push(TransitionKey::new(state, input, top));
        }
        keys.push(TransitionKey::new(state, input, None));

        keys.into_iter()
            .filter_map(move |key| self.rules.get_key_value(&key))
            .flat_map(|(key, targets)| targets.iter().map(move |target| (key, target)))
    }

    /// Returns every transition whose key matches the concrete input symbol and stack top, where
    /// an epsilon field of a key matches any value.
    ///
    /// Transitions reading `input` come before epsilon-input transitions; within each, stack
    /// specific keys come before epsilon-stack keys.
    pub fn lookup<'a>(
        &'a self,
        state: &str,
        input: Option<char>,
        top: Option<char>,
    ) -> Vec<(&'a TransitionKey, &'a TransitionTarget)> {
        let mut found: Vec<_> = match input {
            Some(_) => self.candidates(state, input, top).collect(),
            None => Vec::new(),
        };
        found.extend(self.candidates(state, None, top));
        found
    }

    /// Iterates over all transitions, keys in first-registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&TransitionKey, &TransitionTarget)> {
        self.order
            .iter()
            .flat_map(move |key| self.get(key).iter().map(move |target| (key, target)))
    }

    /// Returns the number of registered transitions.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A validated pushdown automaton. It has no mutating methods; build one with
/// [`AutomatonBuilder`] or [`Automaton::new`].
#[derive(Debug, Clone)]
pub struct Automaton {
    name: String,
    states: Vec<String>,
    input_alphabet: HashSet<char>,
    initial_state: String,
    final_states: HashSet<String>,
    acceptance: AcceptanceMode,
    initial_stack_symbol: Option<char>,
    transitions: TransitionTable,
}

impl Automaton {
    /// Builds an automaton from a [`Definition`].
    ///
    /// # Returns
    ///
    /// * `Ok(Automaton)` if every reference in the definition is valid.
    /// * `Err(PdaError::InvalidReference)` if a transition, the initial state or a final state
    ///   names an unknown state.
    /// * `Err(PdaError::AlphabetViolation)` if a transition uses a symbol outside its alphabet.
    pub fn new(definition: &Definition) -> Result<Self, PdaError> {
        let mut builder = AutomatonBuilder::new(&definition.name, definition.acceptance);

        for state in &definition.states {
            builder.add_state(state);
        }
        for &symbol in &definition.input_alphabet {
            builder.add_input_symbol(symbol);
        }
        for &symbol in &definition.stack_alphabet {
            builder.add_stack_symbol(symbol);
        }

        builder.set_initial_state(&definition.initial_state)?;
        for state in &definition.final_states {
            builder.add_final_state(state)?;
        }
        if let Some(symbol) = definition.initial_stack_symbol {
            builder.set_initial_stack_symbol(symbol)?;
        }

        for rule in &definition.transitions {
            builder.add_rule(rule)?;
        }

        builder.build()
    }

    /// Runs the automaton on `input` with the default search budget.
    pub fn run(&self, input: &str) -> Execution {
        PushdownMachine::new(self).run(input)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the states in registration order.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn is_final(&self, state: &str) -> bool {
        self.final_states.contains(state)
    }

    pub fn acceptance(&self) -> AcceptanceMode {
        self.acceptance
    }

    pub fn initial_stack_symbol(&self) -> Option<char> {
        self.initial_stack_symbol
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Returns whether `symbol` belongs to the input alphabet.
    pub fn accepts_input_symbol(&self, symbol: char) -> bool {
        self.input_alphabet.contains(&symbol)
    }

    /// Returns a copy of this automaton judged by a different acceptance mode.
    pub fn with_acceptance(&self, acceptance: AcceptanceMode) -> Self {
        Self {
            acceptance,
            ..self.clone()
        }
    }
}

/// Incrementally assembles an [`Automaton`].
///
/// States and alphabets must be registered before transitions refer to them. A failed call
/// registers nothing, so the caller can correct the input and retry.
#[derive(Debug, Clone)]
pub struct AutomatonBuilder {
    name: String,
    states: Vec<String>,
    input_alphabet: HashSet<char>,
    stack_alphabet: HashSet<char>,
    initial_state: Option<String>,
    final_states: HashSet<String>,
    acceptance: AcceptanceMode,
    initial_stack_symbol: Option<char>,
    transitions: TransitionTable,
}

impl AutomatonBuilder {
    pub fn new(name: &str, acceptance: AcceptanceMode) -> Self {
        Self {
            name: name.to_string(),
            states: Vec::new(),
            input_alphabet: HashSet::new(),
            stack_alphabet: HashSet::new(),
            initial_state: None,
            final_states: HashSet::new(),
            acceptance,
            initial_stack_symbol: None,
            transitions: TransitionTable::default(),
        }
    }

    /// Registers a state. Registering the same state twice has no effect.
    pub fn add_state(&mut self, state: &str) -> &mut Self {
        if !self.has_state(state) {
            self.states.push(state.to_string());
        }
        self
    }

    pub fn add_input_symbol(&mut self, symbol: char) -> &mut Self {
        self.input_alphabet.insert(symbol);
        self
    }

    pub fn add_stack_symbol(&mut self, symbol: char) -> &mut Self {
        self.stack_alphabet.insert(symbol);
        self
    }

    pub fn set_acceptance(&mut self, acceptance: AcceptanceMode) -> &mut Self {
        self.acceptance = acceptance;
        self
    }

    pub fn set_initial_state(&mut self, state: &str) -> Result<&mut Self, PdaError> {
        self.check_state(state)?;
        self.initial_state = Some(state.to_string());
        Ok(self)
    }

    pub fn add_final_state(&mut self, state: &str) -> Result<&mut Self, PdaError> {
        self.check_state(state)?;
        self.final_states.insert(state.to_string());
        Ok(self)
    }

    /// Sets the symbol every run starts with on the stack.
    pub fn set_initial_stack_symbol(&mut self, symbol: char) -> Result<&mut Self, PdaError> {
        self.check_stack_symbol(symbol)?;
        self.initial_stack_symbol = Some(symbol);
        Ok(self)
    }

    /// Appends a transition. Earlier registrations under the same key are kept and tried first.
    ///
    /// # Arguments
    ///
    /// * `origin` - The state the transition leaves.
    /// * `input` - The input symbol to consume, or `None` for epsilon.
    /// * `pop` - The stack symbol to pop, or `None` for epsilon.
    /// * `destination` - The state the transition enters.
    /// * `push` - The symbols to push, deepest first.
    ///
    /// # Returns
    ///
    /// * `Err(PdaError::InvalidReference)` if either state is not registered.
    /// * `Err(PdaError::AlphabetViolation)` if a symbol is outside its alphabet.
    pub fn add_transition(
        &mut self,
        origin: &str,
        input: Option<char>,
        pop: Option<char>,
        destination: &str,
        push: &str,
    ) -> Result<&mut Self, PdaError> {
        self.add_rule(&TransitionRule {
            origin: origin.to_string(),
            input,
            pop,
            destination: destination.to_string(),
            push: push.chars().collect(),
        })
    }

    /// Appends a transition given as a [`TransitionRule`].
    pub fn add_rule(&mut self, rule: &TransitionRule) -> Result<&mut Self, PdaError> {
        self.check_state(&rule.origin)?;
        self.check_state(&rule.destination)?;
        if let Some(symbol) = rule.input {
            self.check_input_symbol(symbol)?;
        }
        if let Some(symbol) = rule.pop {
            self.check_stack_symbol(symbol)?;
        }
        for &symbol in &rule.push {
            self.check_stack_symbol(symbol)?;
        }

        self.transitions.insert(rule.key(), rule.target());
        Ok(self)
    }

    /// Freezes the builder into an [`Automaton`].
    ///
    /// # Returns
    ///
    /// * `Err(PdaError::ValidationError)` if no state or no initial state was registered.
    pub fn build(self) -> Result<Automaton, PdaError> {
        if self.states.is_empty() {
            return Err(PdaError::ValidationError("No states defined".to_string()));
        }

        let initial_state = self
            .initial_state
            .ok_or_else(|| PdaError::ValidationError("Missing initial state".to_string()))?;

        debug!(
            "built automaton '{}': {} states, {} transitions, acceptance {}",
            self.name,
            self.states.len(),
            self.transitions.len(),
            self.acceptance
        );

        Ok(Automaton {
            name: self.name,
            states: self.states,
            input_alphabet: self.input_alphabet,
            initial_state,
            final_states: self.final_states,
            acceptance: self.acceptance,
            initial_stack_symbol: self.initial_stack_symbol,
            transitions: self.transitions,
        })
    }

    fn has_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }

    fn check_state(&self, state: &str) -> Result<(), PdaError> {
        if self.has_state(state) {
            Ok(())
        } else {
            Err(PdaError::InvalidReference(format!(
                "unknown state '{state}'"
            )))
        }
    }

    fn check_input_symbol(&self, symbol: char) -> Result<(), PdaError> {
        if self.input_alphabet.contains(&symbol) {
            Ok(())
        } else {
            Err(PdaError::AlphabetViolation {
                symbol,
                alphabet: Alphabet::Input,
            })
        }
    }

    fn check_stack_symbol(&self, symbol: char) -> Result<(), PdaError> {
        if self.stack_alphabet.contains(&symbol) {
            Ok(())
        } else {
            Err(PdaError::AlphabetViolation {
                symbol,
                alphabet: Alphabet::Stack,
            })
        }
    }
}
