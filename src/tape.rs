//! This module defines the `Tape`, a persistent, two-way infinite tape. Cells are stored in a
//! sparse ordered map shared between snapshots; positions that were never written hold the
//! blank symbol.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The widest blank margin `Tape::window` pads on each side.
pub const MAX_WINDOW_MARGIN: usize = 4096;

/// An immutable tape snapshot.
///
/// Blank cells are never stored, so two tapes with the same visible content are equal and hash
/// equally regardless of how they were produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tape {
    blank: char,
    cells: Arc<BTreeMap<i64, char>>,
}

/// A contiguous excerpt of a tape, as returned by [`Tape::window`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeWindow {
    /// Tape position of `symbols[0]`.
    pub offset: i64,
    /// The symbols in the window, left to right.
    pub symbols: Vec<char>,
    /// Index of the head inside `symbols`.
    pub head: usize,
}

impl Tape {
    /// Creates an all-blank tape.
    pub fn new(blank: char) -> Self {
        Self {
            blank,
            cells: Arc::new(BTreeMap::new()),
        }
    }

    /// Creates a tape holding `input` at positions `[0, len)`.
    pub fn from_input(input: &[char], blank: char) -> Self {
        let cells = input
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c != blank)
            .map(|(i, &c)| (i as i64, c))
            .collect();

        Self {
            blank,
            cells: Arc::new(cells),
        }
    }

    /// Returns the blank symbol of this tape.
    pub fn blank(&self) -> char {
        self.blank
    }

    /// Reads the symbol at `position`.
    pub fn read(&self, position: i64) -> char {
        self.cells.get(&position).copied().unwrap_or(self.blank)
    }

    /// Returns a new snapshot with `symbol` written at `position`.
    ///
    /// The receiver is left untouched. Writing the symbol that is already there returns a
    /// snapshot sharing the receiver's cells.
    pub fn write(&self, position: i64, symbol: char) -> Tape {
        if self.read(position) == symbol {
            return self.clone();
        }

        let mut cells = BTreeMap::clone(&self.cells);
        if symbol == self.blank {
            cells.remove(&position);
        } else {
            cells.insert(position, symbol);
        }

        Tape {
            blank: self.blank,
            cells: Arc::new(cells),
        }
    }

    /// Returns the lowest and highest non-blank positions, or `None` for an all-blank tape.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        let first = self.cells.keys().next()?;
        let last = self.cells.keys().next_back()?;
        Some((*first, *last))
    }

    /// Returns the number of non-blank cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if every cell is blank.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the excerpt covering every non-blank cell and `head`, extended by `margin` blank
    /// cells on each side. The margin is capped at `MAX_WINDOW_MARGIN`.
    pub fn window(&self, head: i64, margin: usize) -> TapeWindow {
        let (low, high) = match self.bounds() {
            Some((low, high)) => (low.min(head), high.max(head)),
            None => (head, head),
        };
        let margin = i64::try_from(margin.min(MAX_WINDOW_MARGIN)).unwrap_or_default();
        let (low, high) = (low.saturating_sub(margin), high.saturating_add(margin));

        TapeWindow {
            offset: low,
            symbols: (low..=high).map(|p| self.read(p)).collect(),
            head: (head - low) as usize,
        }
    }

    /// Returns the span from the first to the last non-blank cell as a string.
    pub fn content(&self) -> String {
        match self.bounds() {
            Some((low, high)) => (low..=high).map(|p| self.read(p)).collect(),
            None => String::new(),
        }
    }

    /// Returns true if both snapshots share the same cell storage.
    pub fn shares_cells_with(&self, other: &Tape) -> bool {
        Arc::ptr_eq(&self.cells, &other.cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tape(input: &str) -> Tape {
        Tape::from_input(&input.chars().collect::<Vec<_>>(), 'B')
    }

    #[test]
    fn test_read_unwritten_positions_is_blank() {
        let tape = tape("ab");
        assert_eq!(tape.read(0), 'a');
        assert_eq!(tape.read(1), 'b');
        assert_eq!(tape.read(2), 'B');
        assert_eq!(tape.read(-7), 'B');
    }

    #[test]
    fn test_write_returns_new_snapshot() {
        let original = tape("ab");
        let written = original.write(1, 'X');

        assert_eq!(original.read(1), 'b');
        assert_eq!(written.read(1), 'X');
        assert_eq!(original.content(), "ab");
        assert_eq!(written.content(), "aX");
    }

    #[test]
    fn test_write_same_symbol_shares_cells() {
        let original = tape("ab");
        let written = original.write(0, 'a');

        assert_eq!(written.read(0), 'a');
        assert!(written.shares_cells_with(&original));
        assert_eq!(written, original);
    }

    #[test]
    fn test_writing_blank_normalizes() {
        let erased = tape("ab").write(1, 'B');
        assert_eq!(erased, tape("a"));
        assert_eq!(erased.len(), 1);

        let empty = tape("a").write(0, 'B');
        assert!(empty.is_empty());
        assert_eq!(empty, Tape::new('B'));
    }

    #[test]
    fn test_input_blanks_are_not_stored() {
        let tape = tape("aBb");
        assert_eq!(tape.len(), 2);
        assert_eq!(tape.content(), "aBb");
    }

    #[test]
    fn test_negative_positions() {
        let tape = tape("a").write(-2, 'X');
        assert_eq!(tape.bounds(), Some((-2, 0)));
        assert_eq!(tape.content(), "XBa");
    }

    #[test]
    fn test_window_includes_head_and_margin() {
        let tape = tape("ab");

        let window = tape.window(0, 0);
        assert_eq!(window.symbols, vec!['a', 'b']);
        assert_eq!(window.head, 0);
        assert_eq!(window.offset, 0);

        let window = tape.window(4, 1);
        assert_eq!(window.symbols, vec!['B', 'a', 'b', 'B', 'B', 'B', 'B']);
        assert_eq!(window.offset, -1);
        assert_eq!(window.head, 5);

        let window = Tape::new('B').window(-3, 0);
        assert_eq!(window.symbols, vec!['B']);
        assert_eq!(window.offset, -3);
        assert_eq!(window.head, 0);
    }

    #[test]
    fn test_window_caps_margin() {
        let window = tape("ab").window(0, usize::MAX);

        assert_eq!(window.symbols.len(), 2 + 2 * MAX_WINDOW_MARGIN);
        assert_eq!(window.offset, -(MAX_WINDOW_MARGIN as i64));
        assert_eq!(window.head, MAX_WINDOW_MARGIN);
        assert_eq!(window.symbols[window.head], 'a');
    }

    #[test]
    fn test_content_of_empty_tape() {
        assert_eq!(Tape::new('B').content(), "");
        assert_eq!(Tape::new('B').bounds(), None);
    }
}
