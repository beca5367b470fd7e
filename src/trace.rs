//! Configurations and the execution trace handed to renderers.

use serde::Serialize;
use std::fmt;

use crate::stack::Stack;
use crate::types::{display_word, TransitionKey, TransitionTarget};

/// A complete snapshot of a run: current state, input position and stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Configuration {
    pub state: String,
    /// Index of the next input symbol to read.
    pub cursor: usize,
    pub stack: Stack,
}

impl Configuration {
    /// Returns the unread part of `input`.
    pub fn remaining(&self, input: &[char]) -> String {
        input.iter().skip(self.cursor).collect()
    }
}

/// The transition that led into a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedTransition {
    pub key: TransitionKey,
    pub target: TransitionTarget,
}

impl fmt::Display for AppliedTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.key, self.target)
    }
}

/// One step of a trace. The first step of every trace has no transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    pub configuration: Configuration,
    pub transition: Option<AppliedTransition>,
}

/// The path of configurations that produced a verdict, along with the input it was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionTrace {
    input: Vec<char>,
    steps: Vec<TraceStep>,
}

impl ExecutionTrace {
    pub(crate) fn new(input: Vec<char>, steps: Vec<TraceStep>) -> Self {
        Self { input, steps }
    }

    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the configuration the verdict was reached in.
    pub fn last(&self) -> Option<&Configuration> {
        self.steps.last().map(|step| &step.configuration)
    }

    /// Iterates over the applied transitions, skipping the initial step.
    pub fn transitions(&self) -> impl Iterator<Item = &AppliedTransition> {
        self.steps.iter().filter_map(|step| step.transition.as_ref())
    }

    /// Renders a configuration as `(state, remaining input, stack top first)`.
    pub fn describe(&self, configuration: &Configuration) -> String {
        format!(
            "({}, {}, {})",
            configuration.state,
            display_word(&configuration.remaining(&self.input)),
            configuration.stack
        )
    }
}

impl fmt::Display for ExecutionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if let Some(transition) = &step.transition {
                writeln!(f, "      Transition: {transition}")?;
            }
            writeln!(f, "Step {i}: {}", self.describe(&step.configuration))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_rendering() {
        let start = Configuration {
            state: "q0".to_string(),
            cursor: 0,
            stack: Stack::new(),
        };
        let next = Configuration {
            state: "q0".to_string(),
            cursor: 1,
            stack: Stack::from("X"),
        };
        let trace = ExecutionTrace::new(
            vec!['(', ')'],
            vec![
                TraceStep {
                    configuration: start,
                    transition: None,
                },
                TraceStep {
                    configuration: next,
                    transition: Some(AppliedTransition {
                        key: TransitionKey::new("q0", Some('('), None),
                        target: TransitionTarget::new("q0", "X"),
                    }),
                },
            ],
        );

        assert_eq!(
            trace.to_string(),
            "Step 0: (q0, (), ε)\n      Transition: (q0, (, ε) → (q0, X)\nStep 1: (q0, ), X)\n"
        );
        assert_eq!(trace.transitions().count(), 1);
        assert_eq!(trace.last().map(|c| c.cursor), Some(1));
    }

    #[test]
    fn test_remaining_input_when_exhausted() {
        let configuration = Configuration {
            state: "q1".to_string(),
            cursor: 3,
            stack: Stack::new(),
        };
        assert_eq!(configuration.remaining(&['a', 'b', 'c']), "");
    }
}
