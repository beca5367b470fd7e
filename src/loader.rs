//! This module provides the `DefinitionLoader` struct, responsible for loading automaton
//! definitions from files and strings.

use crate::parser::parse;
use crate::types::{Definition, PdaError};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of automaton definitions.
pub const DEFINITION_EXTENSION: &str = "pda";

/// `DefinitionLoader` is a utility struct for loading automaton definitions.
/// It provides methods to load definitions from individual files, from string content,
/// and to discover and load all `.pda` files within a specified directory.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Loads a single definition from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Definition)` if the file is successfully read and parsed.
    /// * `Err(PdaError::FileError)` if the file cannot be read.
    /// * Any parse or validation error otherwise.
    pub fn load_definition(path: &Path) -> Result<Definition, PdaError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PdaError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        parse(&content)
    }

    /// Loads a single definition from the provided string content.
    pub fn load_definition_from_string(content: &str) -> Result<Definition, PdaError> {
        parse(content)
    }

    /// Loads all `.pda` files from a given directory.
    ///
    /// Directories and files with other extensions are skipped. Each element of the result is
    /// either the path and definition of a loaded file or the error that prevented loading it.
    /// Results are sorted by path.
    pub fn load_definitions(directory: &Path) -> Vec<Result<(PathBuf, Definition), PdaError>> {
        if !directory.exists() {
            return vec![Err(PdaError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(PdaError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths = Vec::new();
        let mut results = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => results.push(Err(PdaError::FileError(format!(
                    "Failed to read directory entry: {}",
                    e
                )))),
            }
        }

        paths.retain(|path| {
            !path.is_dir() && path.extension().is_some_and(|ext| ext == DEFINITION_EXTENSION)
        });
        paths.sort();

        results.extend(paths.into_iter().map(|path| {
            Self::load_definition(&path)
                .map(|definition| (path.clone(), definition))
                .map_err(|e| {
                    PdaError::FileError(format!(
                        "Failed to load definition from {}: {}",
                        path.display(),
                        e
                    ))
                })
        }));

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const VALID: &str = "name: Test Automaton\nstates: q0\ninput: a\nstack: X\naccept: empty-stack\nrules:\n  q0, a, ε -> q0, ε";

    fn write_file(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_valid_definition() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.pda");
        write_file(&file_path, VALID);

        let definition = DefinitionLoader::load_definition(&file_path).unwrap();
        assert_eq!(definition.name, "Test Automaton");
        assert_eq!(definition.states, vec!["q0"]);
        assert_eq!(definition.transitions.len(), 1);
    }

    #[test]
    fn test_load_invalid_definition() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.pda");
        write_file(&file_path, "This is not a valid definition");

        assert!(DefinitionLoader::load_definition(&file_path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = DefinitionLoader::load_definition(&dir.path().join("missing.pda"));
        assert!(matches!(result, Err(PdaError::FileError(_))));
    }

    #[test]
    fn test_load_definitions_from_directory() {
        let dir = tempdir().unwrap();

        write_file(&dir.path().join("valid.pda"), VALID);
        write_file(&dir.path().join("invalid.pda"), "This is not a valid definition");
        write_file(&dir.path().join("ignored.txt"), "This file should be ignored");
        fs::create_dir(dir.path().join("nested.pda")).unwrap();

        let results = DefinitionLoader::load_definitions(dir.path());

        // Sorted by path: invalid.pda, valid.pda
        assert_eq!(results.len(), 2);
        assert!(matches!(&results[0], Err(PdaError::FileError(msg)) if msg.contains("invalid.pda")));
        assert!(matches!(&results[1], Ok((path, _)) if path.ends_with("valid.pda")));
    }

    #[test]
    fn test_load_definitions_from_missing_directory() {
        let dir = tempdir().unwrap();
        let results = DefinitionLoader::load_definitions(&dir.path().join("nope"));

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_load_definition_from_string() {
        let definition = DefinitionLoader::load_definition_from_string(VALID).unwrap();
        assert_eq!(definition.acceptance, crate::types::AcceptanceMode::EmptyStackOnly);
    }
}
