//! This module defines `Configuration`, the instantaneous description of a machine: its state,
//! its tape, the head position, and where in the exploration it was produced.

use crate::tape::{Tape, TapeWindow};

/// An immutable snapshot of one point of a run.
///
/// Configurations link to their predecessor through the parent's ordinal, which is the
/// predecessor's index in the run's trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) ordinal: usize,
    pub(crate) parent: Option<usize>,
    pub(crate) state: String,
    pub(crate) tape: Tape,
    pub(crate) head: i64,
    pub(crate) step: usize,
}

/// The part of a configuration that identifies it for loop detection.
pub(crate) type ConfigurationKey = (String, Tape, i64);

impl Configuration {
    /// Creates the configuration a run starts from.
    pub(crate) fn initial(state: &str, tape: Tape) -> Self {
        Self {
            ordinal: 0,
            parent: None,
            state: state.to_string(),
            tape,
            head: 0,
            step: 0,
        }
    }

    /// Creates a successor of `self`. The ordinal is assigned when it is explored.
    pub(crate) fn successor(&self, state: &str, tape: Tape, head: i64) -> Self {
        Self {
            ordinal: 0,
            parent: Some(self.ordinal),
            state: state.to_string(),
            tape,
            head,
            step: self.step + 1,
        }
    }

    pub(crate) fn key(&self) -> ConfigurationKey {
        (self.state.clone(), self.tape.clone(), self.head)
    }

    /// Position of this configuration in the trace.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Ordinal of the configuration this one was derived from.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    /// Number of transitions applied since the initial configuration.
    pub fn step(&self) -> usize {
        self.step
    }

    /// The symbol under the head.
    pub fn symbol(&self) -> char {
        self.tape.read(self.head)
    }

    /// The used part of the tape and the head, padded with `margin` blanks on each side.
    pub fn window(&self, margin: usize) -> TapeWindow {
        self.tape.window(self.head, margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successor_links_to_parent() {
        let tape = Tape::from_input(&['a', 'b'], 'B');
        let mut initial = Configuration::initial("q0", tape.clone());
        initial.ordinal = 3;

        let next = initial.successor("q1", tape.write(0, 'X'), 1);

        assert_eq!(next.parent(), Some(3));
        assert_eq!(next.step(), 1);
        assert_eq!(next.state(), "q1");
        assert_eq!(next.symbol(), 'b');
        assert_eq!(initial.tape().read(0), 'a');
    }

    #[test]
    fn test_key_ignores_step_and_lineage() {
        let tape = Tape::from_input(&['a'], 'B');
        let initial = Configuration::initial("q0", tape.clone());
        let looped = initial.successor("q0", tape, 0);

        assert_eq!(initial.key(), looped.key());
        assert_ne!(initial, looped);
    }

    #[test]
    fn test_window_marks_head() {
        let config = Configuration::initial("q0", Tape::from_input(&['a', 'b'], 'B'));
        let window = config.window(1);
        assert_eq!(window.symbols, vec!['B', 'a', 'b', 'B']);
        assert_eq!(window.head, 1);
    }
}
