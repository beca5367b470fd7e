//! This module defines the `PushdownMachine`, which runs an [`Automaton`] on an input word.
//!
//! A run is a depth-first backtracking search over configurations. From each configuration the
//! machine tries, in order, transitions reading the next input symbol and then epsilon-input
//! transitions; within each group, transitions requiring the current stack top come before
//! transitions with an epsilon stack field, and targets sharing a key are tried in registration
//! order. The first accepting configuration ends the search.
//!
//! Configurations already open on the current path are never entered again, so epsilon cycles
//! that change neither state, cursor nor stack terminate. Cycles that grow the stack are cut by
//! the [`SearchBudget`].

use log::{debug, trace};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

use crate::acceptance;
use crate::automaton::Automaton;
use crate::stack::Stack;
use crate::trace::{AppliedTransition, Configuration, ExecutionTrace, TraceStep};
use crate::types::{
    AcceptedBy, RejectReason, SearchBudget, TransitionKey, TransitionTarget, Verdict,
};

/// Runs a borrowed [`Automaton`] under a [`SearchBudget`].
///
/// The machine holds no per-run state; every call to [`PushdownMachine::run`] starts from the
/// initial configuration with a fresh trace.
pub struct PushdownMachine<'a> {
    automaton: &'a Automaton,
    budget: SearchBudget,
}

impl<'a> PushdownMachine<'a> {
    /// Creates a machine with the default budget.
    pub fn new(automaton: &'a Automaton) -> Self {
        Self::with_budget(automaton, SearchBudget::default())
    }

    pub fn with_budget(automaton: &'a Automaton, budget: SearchBudget) -> Self {
        Self { automaton, budget }
    }

    pub fn automaton(&self) -> &Automaton {
        self.automaton
    }

    pub fn budget(&self) -> SearchBudget {
        self.budget
    }

    /// Returns the configuration every run starts from.
    pub fn initial_configuration(&self) -> Configuration {
        let stack = match self.automaton.initial_stack_symbol() {
            Some(symbol) => Stack::new().push(&[symbol]),
            None => Stack::new(),
        };

        Configuration {
            state: self.automaton.initial_state().to_string(),
            cursor: 0,
            stack,
        }
    }

    /// Runs the automaton on `input`, one input symbol per character.
    pub fn run(&self, input: &str) -> Execution {
        let symbols: Vec<char> = input.chars().collect();
        self.run_symbols(&symbols)
    }

    /// Runs the automaton on a sequence of input symbols.
    ///
    /// # Returns
    ///
    /// An [`Execution`] holding the verdict and the trace of the path that produced it: the
    /// accepting path, the last dead end explored, or the path open when the budget ran out.
    pub fn run_symbols(&self, input: &[char]) -> Execution {
        debug!(
            "running '{}' on {:?} ({})",
            self.automaton.name(),
            input.iter().collect::<String>(),
            self.automaton.acceptance()
        );

        let mut search = Search {
            automaton: self.automaton,
            input,
            max_depth: self.budget.max_depth,
            max_steps: self.budget.max_steps,
            deadline: self.budget.timeout.map(|timeout| Instant::now() + timeout),
            path: Vec::new(),
            active: HashSet::new(),
            dead_end: None,
            steps: 0,
            depth_exceeded: false,
        };

        let outcome = search.search(self.initial_configuration(), None);
        let (verdict, steps) = match outcome {
            Ok(Some(accepted_by)) => (Verdict::Accepted(accepted_by), search.path),
            Ok(None) => {
                let (steps, reason) = search
                    .dead_end
                    .take()
                    .unwrap_or((Vec::new(), RejectReason::SearchBudgetExceeded));
                if search.depth_exceeded {
                    debug!("depth limit of {} reached", self.budget.max_depth);
                    (
                        Verdict::Rejected(RejectReason::SearchBudgetExceeded),
                        steps,
                    )
                } else {
                    (Verdict::Rejected(reason), steps)
                }
            }
            Err(exceeded) => {
                match exceeded {
                    BudgetExceeded::Steps(limit) => {
                        debug!("search abandoned after {limit} steps")
                    }
                    BudgetExceeded::Deadline => debug!("search abandoned at deadline"),
                }
                (
                    Verdict::Rejected(RejectReason::SearchBudgetExceeded),
                    search.path,
                )
            }
        };

        debug!("verdict {verdict:?} after {} search steps", search.steps);

        Execution {
            verdict,
            trace: ExecutionTrace::new(input.to_vec(), steps),
            steps: search.steps,
        }
    }
}

/// The result of a single run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Execution {
    verdict: Verdict,
    trace: ExecutionTrace,
    steps: usize,
}

impl Execution {
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn accepted(&self) -> bool {
        self.verdict.is_accepted()
    }

    /// Returns the criterion that accepted the input, if it was accepted.
    pub fn accepted_by(&self) -> Option<AcceptedBy> {
        match self.verdict {
            Verdict::Accepted(accepted_by) => Some(accepted_by),
            Verdict::Rejected(_) => None,
        }
    }

    /// Returns why the input was rejected, if it was rejected.
    pub fn reason(&self) -> Option<RejectReason> {
        match self.verdict {
            Verdict::Accepted(_) => None,
            Verdict::Rejected(reason) => Some(reason),
        }
    }

    pub fn trace(&self) -> &ExecutionTrace {
        &self.trace
    }

    /// Returns the number of configurations the search visited, across all branches.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

#[derive(Debug)]
enum BudgetExceeded {
    Steps(usize),
    Deadline,
}

/// Per-run search state. Dropped at the end of the run.
struct Search<'a> {
    automaton: &'a Automaton,
    input: &'a [char],
    max_depth: usize,
    max_steps: usize,
    deadline: Option<Instant>,
    /// Configurations on the current path, root first.
    path: Vec<TraceStep>,
    /// The same configurations, for the cycle check.
    active: HashSet<Configuration>,
    /// The most recent configuration the search could not continue from.
    dead_end: Option<(Vec<TraceStep>, RejectReason)>,
    steps: usize,
    depth_exceeded: bool,
}

/// What happened to the transitions tried from one configuration.
#[derive(Default)]
struct Expansion {
    applicable: bool,
    explored: bool,
}

impl Search<'_> {
    /// Enters `configuration` and searches every continuation from it.
    ///
    /// Returns `Ok(Some(_))` on acceptance, leaving the accepting path in `self.path`, and
    /// `Ok(None)` on a dead end, leaving `self.path` and `self.active` as they were on entry.
    fn search(
        &mut self,
        configuration: Configuration,
        transition: Option<AppliedTransition>,
    ) -> Result<Option<AcceptedBy>, BudgetExceeded> {
        self.charge()?;

        trace!(
            "{:>4} {} cursor={} stack={}",
            self.path.len(),
            configuration.state,
            configuration.cursor,
            configuration.stack
        );

        self.active.insert(configuration.clone());
        self.path.push(TraceStep {
            configuration: configuration.clone(),
            transition,
        });

        let outcome = self.expand(&configuration)?;
        if outcome.is_none() {
            self.path.pop();
            self.active.remove(&configuration);
        }

        Ok(outcome)
    }

    fn expand(
        &mut self,
        configuration: &Configuration,
    ) -> Result<Option<AcceptedBy>, BudgetExceeded> {
        // Exhausted input that does not accept yet may still be accepted after epsilon moves.
        if configuration.cursor == self.input.len() {
            if let Some(accepted_by) = acceptance::evaluate(self.automaton, configuration) {
                return Ok(Some(accepted_by));
            }
        }

        let mut expansion = Expansion::default();
        match self.input.get(configuration.cursor) {
            Some(&symbol) if self.automaton.accepts_input_symbol(symbol) => {
                if let Some(accepted_by) =
                    self.try_transitions(configuration, Some(symbol), &mut expansion)?
                {
                    return Ok(Some(accepted_by));
                }
            }
            Some(&symbol) => {
                trace!("'{symbol}' is not in the input alphabet; only epsilon moves apply");
            }
            None => {}
        }

        if let Some(accepted_by) = self.try_transitions(configuration, None, &mut expansion)? {
            return Ok(Some(accepted_by));
        }

        if !expansion.explored {
            let reason = acceptance::diagnose(
                self.automaton,
                configuration,
                self.input.len(),
                expansion.applicable,
            );
            self.dead_end = Some((self.path.clone(), reason));
        }

        Ok(None)
    }

    /// Tries the transitions reading `input` (epsilon when `None`) from `configuration`.
    fn try_transitions(
        &mut self,
        configuration: &Configuration,
        input: Option<char>,
        expansion: &mut Expansion,
    ) -> Result<Option<AcceptedBy>, BudgetExceeded> {
        let automaton = self.automaton;
        let cursor = configuration.cursor + usize::from(input.is_some());
        let candidates =
            automaton
                .transitions()
                .candidates(&configuration.state, input, configuration.stack.top());

        for (key, target) in candidates {
            let Some(stack) = apply(&configuration.stack, key, target) else {
                continue;
            };

            expansion.applicable = true;

            let next = Configuration {
                state: target.destination.clone(),
                cursor,
                stack,
            };

            if self.active.contains(&next) {
                trace!("skipping {key} → {target}: configuration already on the path");
                continue;
            }

            if self.path.len() >= self.max_depth {
                self.depth_exceeded = true;
                continue;
            }

            expansion.explored = true;

            let applied = AppliedTransition {
                key: key.clone(),
                target: target.clone(),
            };
            if let Some(accepted_by) = self.search(next, Some(applied))? {
                return Ok(Some(accepted_by));
            }
        }

        Ok(None)
    }

    /// Counts one search call against the budget.
    fn charge(&mut self) -> Result<(), BudgetExceeded> {
        self.steps += 1;

        if self.steps > self.max_steps {
            return Err(BudgetExceeded::Steps(self.max_steps));
        }

        if self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Err(BudgetExceeded::Deadline);
        }

        Ok(())
    }
}

/// Pops the key's stack symbol, if it names one, and pushes the target's symbols.
///
/// Returns `None` when the key requires a stack top the stack does not have.
fn apply(stack: &Stack, key: &TransitionKey, target: &TransitionTarget) -> Option<Stack> {
    let base = match key.stack {
        Some(symbol) if stack.top() == Some(symbol) => stack.pop()?,
        Some(_) => return None,
        None => stack.clone(),
    };

    Some(base.push(&target.push))
}
