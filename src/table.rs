//! This module provides the `TransitionTable`, an index over a descriptor's rule list that
//! answers "which actions apply in this state reading this symbol" in declaration order.

use crate::types::{Direction, Program};
use std::collections::HashMap;

/// The right-hand side of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The symbol written under the head.
    pub write: char,
    /// The head movement after writing.
    pub direction: Direction,
    /// The state the branch continues in.
    pub next_state: String,
}

/// The transition relation of a machine, keyed by state and then by the symbol read.
///
/// Built once per machine from a validated descriptor and only queried afterwards.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    rules: HashMap<String, HashMap<char, Vec<Action>>>,
    len: usize,
}

impl TransitionTable {
    /// Indexes the descriptor's rules, keeping their declaration order per key.
    pub fn new(program: &Program) -> Self {
        let mut rules: HashMap<String, HashMap<char, Vec<Action>>> = HashMap::new();

        for transition in &program.rules {
            rules
                .entry(transition.state.clone())
                .or_default()
                .entry(transition.read)
                .or_default()
                .push(Action {
                    write: transition.write,
                    direction: transition.direction,
                    next_state: transition.next_state.clone(),
                });
        }

        Self {
            rules,
            len: program.rules.len(),
        }
    }

    /// Returns the actions applicable in `state` reading `symbol`.
    ///
    /// An empty slice means the branch has no move and dies.
    pub fn lookup(&self, state: &str, symbol: char) -> &[Action] {
        self.rules
            .get(state)
            .and_then(|by_symbol| by_symbol.get(&symbol))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the total number of actions in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the table holds no actions.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if no `(state, symbol)` pair has more than one action.
    pub fn is_deterministic(&self) -> bool {
        self.rules
            .values()
            .flat_map(HashMap::values)
            .all(|actions| actions.len() <= 1)
    }
}
