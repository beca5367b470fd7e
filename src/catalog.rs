//! Sample automata embedded in the crate, listed by name and index.

use crate::types::{AcceptanceMode, Definition, PdaError};
use log::error;
use std::sync::RwLock;

// Embedded sample definitions
const DEFINITION_TEXTS: [&str; 4] = [
    include_str!("../automata/balanced-parentheses.pda"),
    include_str!("../automata/an-bn.pda"),
    include_str!("../automata/even-palindrome.pda"),
    include_str!("../automata/equal-ab.pda"),
];

lazy_static::lazy_static! {
    pub static ref DEFINITIONS: RwLock<Vec<Definition>> = RwLock::new(Vec::new());
}

pub struct Catalog;

impl Catalog {
    /// Parses the embedded definitions into [`DEFINITIONS`] unless that has already happened.
    pub fn load() -> Result<(), PdaError> {
        let loaded = DEFINITIONS
            .read()
            .map(|definitions| !definitions.is_empty())
            .map_err(|_| PdaError::FileError("Failed to acquire read lock".to_string()))?;
        if loaded {
            return Ok(());
        }

        let mut definitions = Vec::new();
        for text in DEFINITION_TEXTS {
            match crate::parser::parse(text) {
                Ok(definition) => definitions.push(definition),
                Err(e) => error!("Failed to parse embedded definition: {e}"),
            }
        }

        let mut write_guard = DEFINITIONS
            .write()
            .map_err(|_| PdaError::FileError("Failed to acquire write lock".to_string()))?;
        *write_guard = definitions;

        Ok(())
    }

    /// Get the number of available definitions
    pub fn count() -> usize {
        let _ = Self::load();

        DEFINITIONS
            .read()
            .map(|definitions| definitions.len())
            .unwrap_or(0)
    }

    /// Get a definition by its index
    pub fn get_by_index(index: usize) -> Result<Definition, PdaError> {
        let _ = Self::load();

        DEFINITIONS
            .read()
            .map_err(|_| PdaError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| {
                PdaError::ValidationError(format!("Definition index {} out of range", index))
            })
    }

    /// Get a definition by its name
    pub fn get_by_name(name: &str) -> Result<Definition, PdaError> {
        let _ = Self::load();

        DEFINITIONS
            .read()
            .map_err(|_| PdaError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|definition| definition.name == name)
            .cloned()
            .ok_or_else(|| PdaError::ValidationError(format!("Definition '{}' not found", name)))
    }

    /// List all definition names
    pub fn names() -> Vec<String> {
        let _ = Self::load();

        DEFINITIONS
            .read()
            .map(|definitions| {
                definitions
                    .iter()
                    .map(|definition| definition.name.clone())
                    .collect()
            })
            .unwrap_or_else(|_| Vec::new())
    }

    /// Summarizes the definition at `index`.
    pub fn info(index: usize) -> Result<DefinitionInfo, PdaError> {
        let definition = Self::get_by_index(index)?;

        Ok(DefinitionInfo {
            index,
            name: definition.name.clone(),
            initial_state: definition.initial_state.clone(),
            acceptance: definition.acceptance,
            state_count: definition.states.len(),
            transition_count: definition.transitions.len(),
            nondeterministic: definition.has_shared_keys(),
        })
    }

    /// Search for definitions by name, case-insensitively
    pub fn search(query: &str) -> Vec<usize> {
        let _ = Self::load();
        let query = query.to_lowercase();

        DEFINITIONS
            .read()
            .map(|definitions| {
                definitions
                    .iter()
                    .enumerate()
                    .filter(|(_, definition)| definition.name.to_lowercase().contains(&query))
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_else(|_| Vec::new())
    }

    /// Get the original text of a definition by its index
    pub fn text_by_index(index: usize) -> Result<&'static str, PdaError> {
        DEFINITION_TEXTS.get(index).copied().ok_or_else(|| {
            PdaError::ValidationError(format!("Definition text index {} out of range", index))
        })
    }
}

#[derive(Debug, Clone)]
pub struct DefinitionInfo {
    pub index: usize,
    pub name: String,
    pub initial_state: String,
    pub acceptance: AcceptanceMode,
    pub state_count: usize,
    pub transition_count: usize,
    /// Whether two rules share a key. Epsilon overlaps are not counted.
    pub nondeterministic: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;
    use crate::types::RejectReason;

    fn automaton(name: &str) -> Automaton {
        let definition = Catalog::get_by_name(name).unwrap();
        Automaton::new(&definition).unwrap()
    }

    #[test]
    fn test_all_embedded_definitions_load() {
        assert!(Catalog::load().is_ok());
        assert_eq!(Catalog::count(), DEFINITION_TEXTS.len());

        for i in 0..Catalog::count() {
            let definition = Catalog::get_by_index(i).unwrap();
            assert!(
                Automaton::new(&definition).is_ok(),
                "Definition '{}' is invalid",
                definition.name
            );
        }
    }

    #[test]
    fn test_names() {
        let names = Catalog::names();
        assert!(names.contains(&"Balanced parentheses".to_string()));
        assert!(names.contains(&"a^n b^n".to_string()));
        assert!(names.contains(&"Even palindromes".to_string()));
        assert!(names.contains(&"Equal a and b".to_string()));
    }

    #[test]
    fn test_get_by_index_and_name() {
        assert!(Catalog::get_by_index(0).is_ok());
        assert!(Catalog::get_by_index(999).is_err());
        assert!(Catalog::get_by_name("Nonexistent").is_err());
        assert!(Catalog::text_by_index(0).unwrap().contains("Balanced parentheses"));
        assert!(Catalog::text_by_index(999).is_err());
    }

    #[test]
    fn test_info() {
        let info = Catalog::info(0).unwrap();
        assert_eq!(info.index, 0);
        assert_eq!(info.name, "Balanced parentheses");
        assert_eq!(info.initial_state, "q0");
        assert_eq!(info.acceptance, AcceptanceMode::EmptyStackOnly);
        assert_eq!(info.state_count, 1);
        assert_eq!(info.transition_count, 2);
        assert!(!info.nondeterministic);

        assert!(Catalog::info(999).is_err());
    }

    #[test]
    fn test_search() {
        assert_eq!(Catalog::search("PALINDROME"), vec![2]);
        assert!(Catalog::search("nonexistent").is_empty());
    }

    #[test]
    fn test_balanced_parentheses() {
        let automaton = automaton("Balanced parentheses");

        assert!(automaton.run("(())()").accepted());
        assert_eq!(
            automaton.run("(()").reason(),
            Some(RejectReason::StackNotEmpty)
        );
        assert_eq!(
            automaton.run(")(").reason(),
            Some(RejectReason::NoApplicableTransition { cursor: 0 })
        );
    }

    #[test]
    fn test_an_bn() {
        let automaton = automaton("a^n b^n");

        assert!(automaton.run("").accepted());
        assert!(automaton.run("ab").accepted());
        assert!(automaton.run("aaabbb").accepted());
        assert!(!automaton.run("aaabb").accepted());
        assert!(!automaton.run("abab").accepted());
    }

    #[test]
    fn test_even_palindromes() {
        let automaton = automaton("Even palindromes");

        assert!(automaton.run("abbaabba").accepted());
        assert!(!automaton.run("abbab").accepted());
    }

    #[test]
    fn test_equal_a_and_b() {
        let automaton = automaton("Equal a and b");

        for word in ["", "ab", "ba", "abba", "bbaa", "babaab"] {
            assert!(automaton.run(word).accepted(), "{word} should be accepted");
        }
        for word in ["a", "aab", "bbba"] {
            assert!(!automaton.run(word).accepted(), "{word} should be rejected");
        }
    }
}
