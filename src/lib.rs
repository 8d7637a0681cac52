//! This crate provides the core logic for a one-tape, non-deterministic Turing Machine simulator.
//! It includes modules for parsing and validating machine descriptors, exploring every branch of
//! a run breadth-first, and managing a collection of bundled machines.

pub mod analyzer;
pub mod configuration;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod table;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the descriptor checks from the analyzer module.
pub use analyzer::{analyze, unreachable_states, DescriptorError};
pub use configuration::Configuration;
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the engine and its results from the machine module.
pub use machine::{simulate, Run, RunStats, TuringMachine};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
pub use table::{Action, TransitionTable};
pub use tape::{Tape, TapeWindow, MAX_WINDOW_MARGIN};
/// Re-exports the descriptor types and constants from the types module.
pub use types::{
    Direction, LeftEdge, Mode, Program, Transition, TuringMachineError, Verdict,
    DEFAULT_BLANK_SYMBOL, DEFAULT_STEP_BOUND, MAX_PROGRAM_SIZE,
};
