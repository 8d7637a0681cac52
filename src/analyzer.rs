//! This module validates machine descriptors before any simulation starts. It checks that every
//! state and symbol a descriptor refers to is declared, that the alphabets are consistent with
//! each other, and that deterministic descriptors do not define competing rules.

use crate::types::{Mode, Program, TuringMachineError};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Represents the ways a machine descriptor can be invalid.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum DescriptorError {
    /// The descriptor declares no states at all.
    #[error("No states declared")]
    NoStates,
    /// A state is declared more than once.
    #[error("States declared more than once: {0:?}")]
    DuplicateStates(Vec<String>),
    /// The start state is not a declared state.
    #[error("Start state '{0}' is not declared")]
    UndeclaredStartState(String),
    /// Some accepting states are not declared states.
    #[error("Accept states are not declared: {0:?}")]
    UndeclaredAcceptStates(Vec<String>),
    /// The reject state is not a declared state.
    #[error("Reject state '{0}' is not declared")]
    UndeclaredRejectState(String),
    /// The reject state is also listed as accepting.
    #[error("Reject state '{0}' is also an accept state")]
    RejectStateAccepts(String),
    /// The blank symbol is missing from the tape alphabet.
    #[error("Blank symbol '{0}' is not in the tape alphabet")]
    BlankNotInTapeAlphabet(char),
    /// The blank symbol is part of the input alphabet.
    #[error("Blank symbol '{0}' must not be in the input alphabet")]
    BlankInInputAlphabet(char),
    /// Some input symbols are missing from the tape alphabet.
    #[error("Input symbols are not in the tape alphabet: {0:?}")]
    InputSymbolsNotOnTape(Vec<char>),
    /// Rules refer to states that are not declared.
    #[error("Rules reference undeclared states: {0:?}")]
    UndeclaredRuleStates(Vec<String>),
    /// Rules read or write symbols outside the tape alphabet.
    #[error("Rules reference symbols outside the tape alphabet: {0:?}")]
    UndeclaredRuleSymbols(Vec<String>),
    /// A deterministic descriptor has several rules for the same pair.
    #[error("Deterministic machine has more than one rule for state '{state}' reading '{symbol}'")]
    DuplicateRule { state: String, symbol: char },
}

/// Analyzes a machine descriptor for referential and structural errors.
///
/// All checks run; the first failing one, in the order listed below, is reported.
///
/// # Returns
///
/// * `Ok(())` if the descriptor can be simulated.
/// * `Err(TuringMachineError::Descriptor)` otherwise.
pub fn analyze(program: &Program) -> Result<(), TuringMachineError> {
    let errors = [
        check_states,
        check_start_state,
        check_accept_states,
        check_reject_state,
        check_alphabets,
        check_rule_states,
        check_rule_symbols,
        check_determinism,
    ]
    .iter()
    .filter_map(|f| f(program).err())
    .collect::<Vec<_>>();

    match errors.into_iter().next() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Returns declared states that cannot be reached from the start state through any rule.
///
/// Unreachable states are legal; front-ends may report them as a warning.
pub fn unreachable_states(program: &Program) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut queue = vec![program.initial_state.as_str()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        for transition in program.rules_for(state) {
            if !visited.contains(transition.next_state.as_str()) {
                queue.push(&transition.next_state);
            }
        }
    }

    let mut unreachable: Vec<String> = program
        .states
        .iter()
        .filter(|s| !visited.contains(s.as_str()))
        .cloned()
        .collect();
    unreachable.sort();
    unreachable.dedup();
    unreachable
}

/// Checks that at least one state is declared and that no state is declared twice.
fn check_states(program: &Program) -> Result<(), DescriptorError> {
    if program.states.is_empty() {
        return Err(DescriptorError::NoStates);
    }

    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = program
        .states
        .iter()
        .filter(|s| !seen.insert(s.as_str()))
        .cloned()
        .collect();

    if !duplicates.is_empty() {
        duplicates.sort();
        duplicates.dedup();
        return Err(DescriptorError::DuplicateStates(duplicates));
    }

    Ok(())
}

fn check_start_state(program: &Program) -> Result<(), DescriptorError> {
    if !program.states.contains(&program.initial_state) {
        return Err(DescriptorError::UndeclaredStartState(
            program.initial_state.clone(),
        ));
    }

    Ok(())
}

fn check_accept_states(program: &Program) -> Result<(), DescriptorError> {
    let mut undeclared: Vec<String> = program
        .accept_states
        .iter()
        .filter(|s| !program.states.contains(s))
        .cloned()
        .collect();

    if !undeclared.is_empty() {
        undeclared.sort();
        undeclared.dedup();
        return Err(DescriptorError::UndeclaredAcceptStates(undeclared));
    }

    Ok(())
}

fn check_reject_state(program: &Program) -> Result<(), DescriptorError> {
    let Some(reject) = &program.reject_state else {
        return Ok(());
    };

    if !program.states.contains(reject) {
        return Err(DescriptorError::UndeclaredRejectState(reject.clone()));
    }

    if program.is_accepting(reject) {
        return Err(DescriptorError::RejectStateAccepts(reject.clone()));
    }

    Ok(())
}

/// Checks that the tape alphabet contains the blank and every input symbol, and that the
/// blank is not an input symbol.
fn check_alphabets(program: &Program) -> Result<(), DescriptorError> {
    if !program.tape_alphabet.contains(&program.blank) {
        return Err(DescriptorError::BlankNotInTapeAlphabet(program.blank));
    }

    if program.input_alphabet.contains(&program.blank) {
        return Err(DescriptorError::BlankInInputAlphabet(program.blank));
    }

    let mut missing: Vec<char> = program
        .input_alphabet
        .iter()
        .filter(|c| !program.tape_alphabet.contains(c))
        .cloned()
        .collect();

    if !missing.is_empty() {
        missing.sort();
        missing.dedup();
        return Err(DescriptorError::InputSymbolsNotOnTape(missing));
    }

    Ok(())
}

/// Checks that both sides of every rule name declared states.
fn check_rule_states(program: &Program) -> Result<(), DescriptorError> {
    let declared: HashSet<&str> = program.states.iter().map(String::as_str).collect();

    let mut undeclared = Vec::new();
    for (i, transition) in program.rules.iter().enumerate() {
        if !declared.contains(transition.state.as_str()) {
            undeclared.push(format!("rule {}: {}", i, transition.state));
        }
        if !declared.contains(transition.next_state.as_str()) {
            undeclared.push(format!(
                "rule {}: {} -> {}",
                i, transition.state, transition.next_state
            ));
        }
    }

    if !undeclared.is_empty() {
        return Err(DescriptorError::UndeclaredRuleStates(undeclared));
    }

    Ok(())
}

/// Checks that every rule reads and writes symbols of the tape alphabet.
fn check_rule_symbols(program: &Program) -> Result<(), DescriptorError> {
    let declared: HashSet<char> = program.tape_alphabet.iter().cloned().collect();

    let mut undeclared = Vec::new();
    for (i, transition) in program.rules.iter().enumerate() {
        for (role, symbol) in [("read", transition.read), ("write", transition.write)] {
            if !declared.contains(&symbol) {
                undeclared.push(format!(
                    "rule {} ({}): {} '{}'",
                    i, transition.state, role, symbol
                ));
            }
        }
    }

    if !undeclared.is_empty() {
        return Err(DescriptorError::UndeclaredRuleSymbols(undeclared));
    }

    Ok(())
}

/// In deterministic mode, checks that no `(state, symbol)` pair has more than one rule.
fn check_determinism(program: &Program) -> Result<(), DescriptorError> {
    if program.mode != Mode::Deterministic {
        return Ok(());
    }

    let mut counts: HashMap<(&str, char), usize> = HashMap::new();
    for transition in &program.rules {
        let count = counts
            .entry((transition.state.as_str(), transition.read))
            .or_default();
        *count += 1;
        if *count > 1 {
            return Err(DescriptorError::DuplicateRule {
                state: transition.state.clone(),
                symbol: transition.read,
            });
        }
    }

    Ok(())
}
