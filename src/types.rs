//! This module defines the core data structures and types used throughout the Turing Machine
//! simulator, including the machine descriptor, transition rules, verdicts, and error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::DescriptorError;
use crate::Rule;

/// The default blank symbol used on the Turing Machine tape.
pub const DEFAULT_BLANK_SYMBOL: char = 'B';
/// A special symbol usable in rule definitions to refer to the machine's blank symbol.
pub const INPUT_BLANK_SYMBOL: char = '_';
/// The maximum allowed size for a machine descriptor source in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// The default number of configurations explored before a run is declared non-halting.
pub const DEFAULT_STEP_BOUND: usize = 10000;

/// A validated, read-only description of a one-tape Turing Machine together with the
/// input strings it should be run on.
///
/// Rules are kept in declaration order; the engine relies on that order to break ties
/// between competing transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    /// The name of the machine.
    pub name: String,
    /// How duplicate `(state, symbol)` rules are treated.
    #[serde(default)]
    pub mode: Mode,
    /// What a left move from position 0 does.
    #[serde(default)]
    pub left_edge: LeftEdge,
    /// All declared states, in declaration order.
    pub states: Vec<String>,
    /// Symbols allowed in input strings.
    pub input_alphabet: Vec<char>,
    /// Symbols allowed on the tape. Contains the input alphabet and the blank symbol.
    pub tape_alphabet: Vec<char>,
    /// The blank symbol.
    #[serde(default = "default_blank")]
    pub blank: char,
    /// The start state.
    pub initial_state: String,
    /// Accepting states. May be empty.
    #[serde(default)]
    pub accept_states: Vec<String>,
    /// Optional explicit reject state; reaching it kills the branch.
    #[serde(default)]
    pub reject_state: Option<String>,
    /// The transition relation as an ordered rule list.
    pub rules: Vec<Transition>,
    /// Input strings to run the machine on.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Default number of configurations explored before giving up.
    #[serde(default = "default_step_bound")]
    pub step_bound: usize,
}

fn default_blank() -> char {
    DEFAULT_BLANK_SYMBOL
}

fn default_step_bound() -> usize {
    DEFAULT_STEP_BOUND
}

impl Program {
    /// Checks whether `state` is one of the accepting states.
    pub fn is_accepting(&self, state: &str) -> bool {
        self.accept_states.iter().any(|s| s == state)
    }

    /// Checks whether `state` is the explicit reject state.
    pub fn is_rejecting(&self, state: &str) -> bool {
        self.reject_state.as_deref() == Some(state)
    }

    /// Returns the rules whose left-hand side is `state`, in declaration order.
    pub fn rules_for<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a Transition> + 'a {
        self.rules.iter().filter(move |t| t.state == state)
    }
}

/// How the validator treats several rules for the same `(state, symbol)` pair.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Several rules per pair are allowed and explored breadth-first.
    #[default]
    Nondeterministic,
    /// Duplicate pairs are a descriptor error.
    Deterministic,
}

/// The behavior of a left move from tape position 0.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LeftEdge {
    /// The tape is infinite in both directions; the head may reach negative positions.
    #[default]
    Unbounded,
    /// The head stays at position 0.
    Clamp,
    /// The branch dies.
    Die,
}

/// A single transition rule: in `state` reading `read`, write `write`, move the head in
/// `direction`, and continue in `next_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the rule applies to.
    pub state: String,
    /// The symbol under the head.
    pub read: char,
    /// The symbol written under the head.
    pub write: char,
    /// The head movement after writing.
    pub direction: Direction,
    /// The state the machine transitions to.
    pub next_state: String,
}

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    #[serde(alias = "L")]
    Left,
    /// Move the head one position to the right.
    #[serde(alias = "R")]
    Right,
    /// Keep the head in the same position.
    #[serde(alias = "S")]
    Stay,
}

impl Direction {
    /// The signed head offset of this movement.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }
}

/// The outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// An accepting configuration was reached.
    Accepted,
    /// Every branch died or was pruned within the step bound.
    Rejected,
    /// The step bound was reached before the run was decided.
    NonHalting,
}

/// Represents various errors that can occur during Turing Machine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// The machine descriptor is invalid.
    #[error("Invalid machine descriptor: {0}")]
    Descriptor(#[from] DescriptorError),
    /// An input string contains a symbol outside the input alphabet.
    #[error("Input '{input}' contains symbol '{symbol}' at position {position}, which is not in the input alphabet")]
    InputAlphabet {
        input: String,
        symbol: char,
        position: usize,
    },
    /// Indicates an error during the parsing of a machine descriptor.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a structurally incomplete descriptor, such as a missing section.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Indicates a malformed JSON descriptor.
    #[error("JSON error: {0}")]
    JsonError(String),
    /// Indicates a malformed YAML descriptor.
    #[error("YAML error: {0}")]
    YamlError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}

impl From<serde_json::Error> for TuringMachineError {
    fn from(error: serde_json::Error) -> Self {
        TuringMachineError::JsonError(error.to_string())
    }
}

impl From<serde_yaml::Error> for TuringMachineError {
    fn from(error: serde_yaml::Error) -> Self {
        TuringMachineError::YamlError(error.to_string())
    }
}
