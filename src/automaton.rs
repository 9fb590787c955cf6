//! Elementary cellular automaton over a fixed 256-cell state.
//!
//! The automaton uses fixed (zero) boundaries: the cells left of index 0 and
//! right of index 255 always read as 0. There is no wrap-around.

use crate::error::{ChainError, Result};
use std::fmt;

/// Number of cells in the automaton state, and bits in a digest.
pub const STATE_BITS: usize = 256;

/// An 8-entry Wolfram rule table.
///
/// Entry `n` is the next value of a cell whose `(left, center, right)`
/// neighborhood packs to `n = left << 2 | center << 1 | right`, and equals
/// bit `n` of the rule number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rule {
    number: u8,
    table: [bool; 8],
}

impl Rule {
    /// Builds the lookup table for a rule number.
    pub fn new(number: u8) -> Self {
        let mut table = [false; 8];
        for (neighborhood, entry) in table.iter_mut().enumerate() {
            *entry = (number >> neighborhood) & 1 == 1;
        }
        Rule { number, table }
    }

    /// Checked construction from a wider integer. Values above 255 are
    /// rejected rather than masked to their low byte.
    pub fn try_from_number(number: u32) -> Result<Self> {
        u8::try_from(number)
            .map(Rule::new)
            .map_err(|_| ChainError::RuleOutOfRange(number))
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn table(&self) -> [bool; 8] {
        self.table
    }

    #[inline]
    pub fn apply(&self, left: bool, center: bool, right: bool) -> bool {
        let index = ((left as usize) << 2) | ((center as usize) << 1) | right as usize;
        self.table[index]
    }
}

impl TryFrom<u32> for Rule {
    type Error = ChainError;

    fn try_from(number: u32) -> Result<Self> {
        Rule::try_from_number(number)
    }
}

/// A fixed-length row of 256 binary cells.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitState {
    cells: [bool; STATE_BITS],
}

impl BitState {
    pub fn zeroed() -> Self {
        BitState {
            cells: [false; STATE_BITS],
        }
    }

    pub fn from_cells(cells: [bool; STATE_BITS]) -> Self {
        BitState { cells }
    }

    pub fn cells(&self) -> &[bool; STATE_BITS] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.cells.get(index).copied()
    }

    pub fn count_ones(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }

    /// Number of cells that differ between two states.
    pub fn hamming_distance(&self, other: &BitState) -> usize {
        self.cells
            .iter()
            .zip(other.cells.iter())
            .filter(|(a, b)| a != b)
            .count()
    }

    /// One synchronous generation under `rule`. Pure: the receiver is left
    /// untouched and a fresh state is returned.
    pub fn evolve(&self, rule: &Rule) -> BitState {
        let mut next = [false; STATE_BITS];
        for (i, cell) in next.iter_mut().enumerate() {
            let left = i > 0 && self.cells[i - 1];
            let right = i + 1 < STATE_BITS && self.cells[i + 1];
            *cell = rule.apply(left, self.cells[i], right);
        }
        BitState { cells: next }
    }
}

impl Default for BitState {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for BitState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bits: String = self
            .cells
            .iter()
            .map(|&cell| if cell { '1' } else { '0' })
            .collect();
        write!(f, "BitState({})", bits)
    }
}

/// Renders live cells as `#` and dead cells as spaces.
impl fmt::Display for BitState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &cell in self.cells.iter() {
            f.write_str(if cell { "#" } else { " " })?;
        }
        Ok(())
    }
}

/// A rule paired with the state it is evolving.
#[derive(Debug, Clone)]
pub struct CellularAutomaton {
    rule: Rule,
    state: BitState,
    generation: usize,
}

impl CellularAutomaton {
    pub fn new(rule: Rule, initial_state: BitState) -> Self {
        CellularAutomaton {
            rule,
            state: initial_state,
            generation: 0,
        }
    }

    pub fn evolve(&mut self) {
        self.state = self.state.evolve(&self.rule);
        self.generation += 1;
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.evolve();
        }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn state(&self) -> &BitState {
        &self.state
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn into_state(self) -> BitState {
        self.state
    }
}
