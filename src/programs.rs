//! The catalog of machines bundled with the crate.

use crate::table::TransitionTable;
use crate::types::{Mode, Program, TuringMachineError};

use std::sync::RwLock;

// Bundled machine sources
const PROGRAM_TEXTS: [&str; 6] = [
    include_str!("../machines/anbn.tm"),
    include_str!("../machines/palindrome.tm"),
    include_str!("../machines/contains-pair.tm"),
    include_str!("../machines/unary-increment.tm"),
    include_str!("../machines/stay-loop.tm"),
    include_str!("../machines/endless-writer.tm"),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<Program>> = RwLock::new(Vec::new());
}

pub struct ProgramManager;

impl ProgramManager {
    /// Parses the bundled machines into the catalog, replacing its previous content.
    pub fn load() -> Result<(), TuringMachineError> {
        let programs = parse_catalog(&PROGRAM_TEXTS)?;

        let mut write_guard = PROGRAMS.write().map_err(|_| {
            TuringMachineError::FileError("Failed to acquire write lock".to_string())
        })?;
        *write_guard = programs;

        Ok(())
    }

    /// Loads the catalog unless it already holds the bundled machines.
    fn ensure_loaded() -> Result<(), TuringMachineError> {
        let loaded = PROGRAMS
            .read()
            .map(|programs| !programs.is_empty())
            .unwrap_or(false);

        if loaded {
            Ok(())
        } else {
            Self::load()
        }
    }

    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        if Self::ensure_loaded().is_err() {
            return 0;
        }

        PROGRAMS.read().map(|programs| programs.len()).unwrap_or(0)
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Program, TuringMachineError> {
        Self::ensure_loaded()?;

        PROGRAMS
            .read()
            .map_err(|_| TuringMachineError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program index {} out of range", index))
            })
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<Program, TuringMachineError> {
        Self::ensure_loaded()?;

        PROGRAMS
            .read()
            .map_err(|_| TuringMachineError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program '{}' not found", name))
            })
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        if Self::ensure_loaded().is_err() {
            return Vec::new();
        }

        PROGRAMS
            .read()
            .map(|programs| {
                programs
                    .iter()
                    .map(|program| program.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get a summary of a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, TuringMachineError> {
        let program = Self::get_program_by_index(index)?;
        let table = TransitionTable::new(&program);

        Ok(ProgramInfo {
            index,
            name: program.name.clone(),
            initial_state: program.initial_state.clone(),
            state_count: program.states.len(),
            transition_count: table.len(),
            deterministic: program.mode == Mode::Deterministic || table.is_deterministic(),
            inputs: program.inputs.clone(),
        })
    }

    /// Search for programs by name
    pub fn search_programs(query: &str) -> Vec<usize> {
        if Self::ensure_loaded().is_err() {
            return Vec::new();
        }

        let query = query.to_lowercase();
        PROGRAMS
            .read()
            .map(|programs| {
                programs
                    .iter()
                    .enumerate()
                    .filter(|(_, program)| program.name.to_lowercase().contains(&query))
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the source text of a program by its index
    pub fn get_program_text_by_index(index: usize) -> Result<&'static str, TuringMachineError> {
        PROGRAM_TEXTS.get(index).copied().ok_or_else(|| {
            TuringMachineError::ValidationError(format!(
                "Program text index {} out of range",
                index
            ))
        })
    }
}

/// Parses every source, stopping at the first one that is not a valid descriptor.
fn parse_catalog(texts: &[&str]) -> Result<Vec<Program>, TuringMachineError> {
    texts.iter().map(|text| crate::parser::parse(text)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub initial_state: String,
    pub state_count: usize,
    pub transition_count: usize,
    /// True if every `(state, symbol)` pair has at most one action.
    pub deterministic: bool,
    pub inputs: Vec<String>,
}
