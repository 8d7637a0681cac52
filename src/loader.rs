//! This module provides the `ProgramLoader` struct, responsible for loading machine descriptors
//! from files, `.tm` text, JSON documents, and `mt:` YAML documents.

use crate::analyzer::analyze;
use crate::parser::{pair_writes, parse};
use crate::types::{
    Direction, LeftEdge, Mode, Program, Transition, TuringMachineError, DEFAULT_BLANK_SYMBOL,
    DEFAULT_STEP_BOUND, MAX_PROGRAM_SIZE,
};
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions the loader understands.
const EXTENSIONS: [&str; 4] = ["tm", "json", "yaml", "yml"];

/// A YAML descriptor: everything lives under the `mt:` root key.
#[derive(Debug, Deserialize)]
struct YamlDocument {
    mt: YamlMachine,
}

/// The `mt:` section. Symbols are YAML scalars so that `[0, 1]` reads as two symbols.
#[derive(Debug, Deserialize)]
struct YamlMachine {
    #[serde(default)]
    name: Option<String>,
    states: Vec<String>,
    input_alphabet: Vec<Value>,
    tape_alphabet: Vec<Value>,
    initial_state: String,
    #[serde(default)]
    accept_states: Vec<String>,
    #[serde(default)]
    reject_state: Option<String>,
    #[serde(default)]
    blank_symbol: Option<Value>,
    #[serde(default)]
    mode: Mode,
    #[serde(default)]
    left_edge: LeftEdge,
    #[serde(default)]
    step_bound: Option<usize>,
    transitions: Vec<YamlTransition>,
    #[serde(default)]
    inputs: Vec<Value>,
}

/// One `transitions:` entry. `read` and `write` are a symbol or a list of symbols.
#[derive(Debug, Deserialize)]
struct YamlTransition {
    state: String,
    read: Value,
    write: Value,
    #[serde(rename = "move")]
    direction: Direction,
    next: String,
}

impl YamlMachine {
    fn into_program(self) -> Result<Program, TuringMachineError> {
        let mut rules = Vec::new();

        for transition in &self.transitions {
            let reads = yaml_symbols(&transition.read)?;
            let writes = pair_writes(&reads, Some(yaml_symbols(&transition.write)?)).map_err(
                |message| {
                    TuringMachineError::YamlError(format!(
                        "{} (state {})",
                        message, transition.state
                    ))
                },
            )?;

            rules.extend(reads.into_iter().zip(writes).map(|(read, write)| Transition {
                state: transition.state.clone(),
                read,
                write,
                direction: transition.direction,
                next_state: transition.next.clone(),
            }));
        }

        Ok(Program {
            name: self.name.unwrap_or_else(|| "Unnamed machine".to_string()),
            mode: self.mode,
            left_edge: self.left_edge,
            states: self.states,
            input_alphabet: yaml_symbol_list(&self.input_alphabet)?,
            tape_alphabet: yaml_symbol_list(&self.tape_alphabet)?,
            blank: match &self.blank_symbol {
                Some(value) => yaml_symbol(value)?,
                None => DEFAULT_BLANK_SYMBOL,
            },
            initial_state: self.initial_state,
            accept_states: self.accept_states,
            reject_state: self.reject_state,
            rules,
            inputs: self
                .inputs
                .iter()
                .map(yaml_text)
                .collect::<Result<_, _>>()?,
            step_bound: self.step_bound.unwrap_or(DEFAULT_STEP_BOUND),
        })
    }
}

/// Reads a YAML scalar as text.
fn yaml_text(value: &Value) -> Result<String, TuringMachineError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(TuringMachineError::YamlError(format!(
            "Expected a scalar, found {:?}",
            other
        ))),
    }
}

/// Reads a YAML scalar as a single-character symbol.
fn yaml_symbol(value: &Value) -> Result<char, TuringMachineError> {
    let text = yaml_text(value)?;
    let mut chars = text.chars();

    match (chars.next(), chars.next()) {
        (Some(symbol), None) => Ok(symbol),
        _ => Err(TuringMachineError::YamlError(format!(
            "Symbol '{}' must be a single character",
            text
        ))),
    }
}

fn yaml_symbol_list(values: &[Value]) -> Result<Vec<char>, TuringMachineError> {
    values.iter().map(yaml_symbol).collect()
}

/// Reads either one symbol or a list of symbols.
fn yaml_symbols(value: &Value) -> Result<Vec<char>, TuringMachineError> {
    match value {
        Value::Sequence(values) => yaml_symbol_list(values),
        scalar => Ok(vec![yaml_symbol(scalar)?]),
    }
}

/// `ProgramLoader` is a utility struct for loading machine descriptors.
/// Every descriptor it returns has passed the analyzer.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single descriptor from the specified file path.
    ///
    /// The format is chosen from the extension: `.tm` for the descriptor language, `.json` for
    /// a serialized `Program`, `.yaml` or `.yml` for an `mt:` document.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is read, parsed and valid.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read or has an unknown
    ///   extension.
    /// * Any parse, JSON or descriptor error otherwise.
    pub fn load_program(path: &Path) -> Result<Program, TuringMachineError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        if !EXTENSIONS.contains(&extension) {
            return Err(TuringMachineError::FileError(format!(
                "Unsupported file type {} (expected .tm, .json, .yaml or .yml)",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        match extension {
            "json" => Self::load_program_from_json(&content),
            "yaml" | "yml" => Self::load_program_from_yaml(&content),
            _ => Self::load_program_from_string(&content),
        }
    }

    /// Loads a descriptor written in the `.tm` language.
    pub fn load_program_from_string(content: &str) -> Result<Program, TuringMachineError> {
        parse(content)
    }

    /// Loads a descriptor from a JSON document using the `Program` field names.
    pub fn load_program_from_json(content: &str) -> Result<Program, TuringMachineError> {
        check_size(content)?;

        let program: Program = serde_json::from_str(content)?;
        analyze(&program)?;

        Ok(program)
    }

    /// Loads a descriptor from a YAML document with an `mt:` root.
    ///
    /// Transitions use `state`, `read`, `write`, `move` and `next`. `read` and `write` may be
    /// lists; a single `write` symbol is used for every `read` symbol.
    pub fn load_program_from_yaml(content: &str) -> Result<Program, TuringMachineError> {
        check_size(content)?;

        let document: YamlDocument = serde_yaml::from_str(content)?;
        let program = document.mt.into_program()?;
        analyze(&program)?;

        Ok(program)
    }

    /// Loads every descriptor file (`.tm`, `.json`, `.yaml`, `.yml`) of a directory, one result
    /// per file.
    ///
    /// Subdirectories and other files are skipped. Results are sorted by path so the listing is
    /// stable across platforms.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), TuringMachineError>> {
        if !directory.exists() {
            return vec![Err(TuringMachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
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
                Ok(entry) => {
                    let path = entry.path();
                    let known = path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| EXTENSIONS.contains(&ext));

                    if path.is_file() && known {
                        paths.push(path);
                    }
                }
                Err(e) => results.push(Err(TuringMachineError::FileError(format!(
                    "Failed to read directory entry: {}",
                    e
                )))),
            }
        }

        paths.sort();

        results.extend(paths.into_iter().map(|path| {
            Self::load_program(&path)
                .map(|program| (path.clone(), program))
                .map_err(|e| {
                    TuringMachineError::FileError(format!(
                        "Failed to load program from {}: {}",
                        path.display(),
                        e
                    ))
                })
        }));

        results
    }
}

fn check_size(content: &str) -> Result<(), TuringMachineError> {
    if content.len() > MAX_PROGRAM_SIZE {
        return Err(TuringMachineError::ValidationError(format!(
            "Program too large: {} bytes (max {})",
            content.len(),
            MAX_PROGRAM_SIZE
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::TuringMachine;
    use crate::types::{Direction, Mode, Verdict};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const FLIP: &str = "name: Flip\nstates: q0, done\ninput: a, b\ntape: a, b, B\naccept: done\nrules:\n  q0:\n    a -> b, R, q0\n    B, S, done\n";

    const FLIP_JSON: &str = r#"{
  "name": "Flip",
  "states": ["q0", "done"],
  "input_alphabet": ["a", "b"],
  "tape_alphabet": ["a", "b", "B"],
  "initial_state": "q0",
  "accept_states": ["done"],
  "rules": [
    { "state": "q0", "read": "a", "write": "b", "direction": "R", "next_state": "q0" },
    { "state": "q0", "read": "B", "write": "B", "direction": "Stay", "next_state": "done" }
  ]
}"#;

    const ANBN_YAML: &str = r#"
mt:
  states: [q0, q1, q2, q3, q4]
  input_alphabet: [a, b]
  tape_alphabet: [a, b, X, Y, B]
  initial_state: q0
  accept_states: [q4]
  transitions:
    - state: q0
      read: a
      write: X
      move: R
      next: q1
    - state: q0
      read: Y
      write: Y
      move: R
      next: q3
    - state: q0
      read: B
      write: B
      move: S
      next: q4
    - state: q1
      read: [a, Y]
      write: [a, Y]
      move: R
      next: q1
    - state: q1
      read: b
      write: Y
      move: L
      next: q2
    - state: q2
      read: [a, Y]
      write: [a, Y]
      move: L
      next: q2
    - state: q2
      read: X
      write: X
      move: R
      next: q0
    - state: q3
      read: Y
      write: Y
      move: R
      next: q3
    - state: q3
      read: B
      write: B
      move: R
      next: q4
  inputs:
    - "aabb"
    - "aab"
"#;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_tm_file() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "flip.tm", FLIP);

        let program = ProgramLoader::load_program(&path).unwrap();
        assert_eq!(program.name, "Flip");
        assert_eq!(program.initial_state, "q0");
        assert_eq!(program.rules.len(), 2);
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "flip.json", FLIP_JSON);

        let program = ProgramLoader::load_program(&path).unwrap();
        assert_eq!(program.name, "Flip");
        assert_eq!(program.blank, 'B');
        assert_eq!(program.mode, Mode::Nondeterministic);
        assert_eq!(program.rules[1].direction, Direction::Stay);
        assert_eq!(program, ProgramLoader::load_program_from_string(FLIP).unwrap());
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "anbn.yaml", ANBN_YAML);

        let program = ProgramLoader::load_program(&path).unwrap();
        assert_eq!(program.name, "Unnamed machine");
        assert_eq!(program.blank, 'B');
        assert_eq!(program.inputs, vec!["aabb", "aab"]);

        let bundled = crate::programs::ProgramManager::get_program_by_name("a^n b^n").unwrap();
        assert_eq!(program.rules, bundled.rules);

        let verdicts: Vec<Verdict> = TuringMachine::new(program)
            .unwrap()
            .run_program_inputs(1)
            .into_iter()
            .map(|run| run.unwrap().verdict())
            .collect();
        assert_eq!(verdicts, vec![Verdict::Accepted, Verdict::Rejected]);
    }

    #[test]
    fn test_yaml_replicates_single_write() {
        let source = r#"
mt:
  name: Eraser
  states: [q, done]
  input_alphabet: [0, 1]
  tape_alphabet: [0, 1, _]
  blank_symbol: _
  initial_state: q
  accept_states: [done]
  transitions:
    - state: q
      read: [0, 1]
      write: _
      move: R
      next: q
    - state: q
      read: _
      write: _
      move: S
      next: done
"#;
        let program = ProgramLoader::load_program_from_yaml(source).unwrap();

        assert_eq!(program.name, "Eraser");
        assert_eq!(program.input_alphabet, vec!['0', '1']);
        assert_eq!(program.blank, '_');
        assert_eq!(program.rules.len(), 3);
        assert_eq!((program.rules[1].read, program.rules[1].write), ('1', '_'));
    }

    #[test]
    fn test_yaml_inconsistent_transition() {
        let source = ANBN_YAML.replacen("write: [a, Y]", "write: [a, Y, X]", 1);
        assert!(matches!(
            ProgramLoader::load_program_from_yaml(&source),
            Err(TuringMachineError::YamlError(message)) if message.contains("read=2, write=3")
        ));
    }

    #[test]
    fn test_yaml_errors() {
        let long_symbol = ANBN_YAML.replacen("read: b", "read: bb", 1);
        assert!(matches!(
            ProgramLoader::load_program_from_yaml(&long_symbol),
            Err(TuringMachineError::YamlError(_))
        ));

        assert!(matches!(
            ProgramLoader::load_program_from_yaml("machine:\n  states: [q]\n"),
            Err(TuringMachineError::YamlError(_))
        ));

        let undeclared = ANBN_YAML.replacen("next: q3", "next: q9", 1);
        assert!(matches!(
            ProgramLoader::load_program_from_yaml(&undeclared),
            Err(TuringMachineError::Descriptor(_))
        ));
    }

    #[test]
    fn test_json_is_validated() {
        let invalid = FLIP_JSON.replace("\"initial_state\": \"q0\"", "\"initial_state\": \"q9\"");
        assert!(matches!(
            ProgramLoader::load_program_from_json(&invalid),
            Err(TuringMachineError::Descriptor(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ProgramLoader::load_program_from_json("{ \"name\": "),
            Err(TuringMachineError::JsonError(_))
        ));
    }

    #[test]
    fn test_load_invalid_program() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "invalid.tm", "This is not a valid program");

        assert!(ProgramLoader::load_program(&path).is_err());
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "flip.txt", FLIP);

        assert!(matches!(
            ProgramLoader::load_program(&path),
            Err(TuringMachineError::FileError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = ProgramLoader::load_program(&dir.path().join("absent.tm"));
        assert!(matches!(result, Err(TuringMachineError::FileError(_))));
    }

    #[test]
    fn test_oversized_json() {
        let content = " ".repeat(MAX_PROGRAM_SIZE + 1);
        assert!(matches!(
            ProgramLoader::load_program_from_json(&content),
            Err(TuringMachineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_programs_from_directory() {
        let dir = tempdir().unwrap();

        write_file(dir.path(), "a_valid.tm", FLIP);
        write_file(dir.path(), "b_valid.json", FLIP_JSON);
        write_file(dir.path(), "c_invalid.tm", "This is not a valid program");
        write_file(dir.path(), "d_valid.yml", ANBN_YAML);
        write_file(dir.path(), "ignored.txt", "This file should be ignored");
        std::fs::create_dir(dir.path().join("nested.tm")).unwrap();

        let results = ProgramLoader::load_programs(dir.path());
        assert_eq!(results.len(), 4);

        assert!(results[0].as_ref().unwrap().0.ends_with("a_valid.tm"));
        assert!(results[1].as_ref().unwrap().0.ends_with("b_valid.json"));
        assert!(matches!(results[2], Err(TuringMachineError::FileError(_))));
        assert!(results[3].as_ref().unwrap().0.ends_with("d_valid.yml"));
    }

    #[test]
    fn test_load_programs_missing_directory() {
        let dir = tempdir().unwrap();
        let results = ProgramLoader::load_programs(&dir.path().join("absent"));

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
