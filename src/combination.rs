use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

pub const MAX_DIAL_VALUE: u8 = 15;
pub const DIAL_POSITIONS: u8 = MAX_DIAL_VALUE + 1;
pub const DEFAULT_COMBINATION: [u8; 3] = [5, 10, 15];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Combination([u8; 3]);

impl Combination {
    pub fn new(digits: [u8; 3]) -> Option<Self> {
        if digits.iter().all(|d| *d <= MAX_DIAL_VALUE) {
            Some(Self(digits))
        } else {
            None
        }
    }

    pub fn digits(&self) -> [u8; 3] {
        self.0
    }

    pub fn digit(&self, index: usize) -> u8 {
        self.0[index]
    }
}

impl Default for Combination {
    fn default() -> Self {
        Self(DEFAULT_COMBINATION)
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = [Some(self.0[0]), Some(self.0[1]), Some(self.0[2])];
        f.write_str(&format_dials(&digits))
    }
}

/// Survives a controller rebuild. Contents are only trusted after
/// [`RetainedCombination::load_or_default`] has checked them.
#[derive(Debug)]
pub struct RetainedCombination {
    digits: [AtomicU8; 3],
}

impl RetainedCombination {
    pub const fn uninitialized() -> Self {
        Self {
            digits: [AtomicU8::new(0xff), AtomicU8::new(0xff), AtomicU8::new(0xff)],
        }
    }

    pub fn with_digits(digits: [u8; 3]) -> Self {
        let cell = Self::uninitialized();
        cell.store_raw(digits);
        cell
    }

    pub fn raw(&self) -> [u8; 3] {
        [
            self.digits[0].load(Ordering::Acquire),
            self.digits[1].load(Ordering::Acquire),
            self.digits[2].load(Ordering::Acquire),
        ]
    }

    fn store_raw(&self, digits: [u8; 3]) {
        for (cell, digit) in self.digits.iter().zip(digits.iter()) {
            cell.store(*digit, Ordering::Release);
        }
    }

    pub fn store(&self, combination: Combination) {
        self.store_raw(combination.digits());
    }

    pub fn load_or_default(&self) -> (Combination, bool) {
        match Combination::new(self.raw()) {
            Some(combination) => (combination, false),
            None => {
                let combination = Combination::default();
                self.store(combination);
                (combination, true)
            }
        }
    }
}

impl Default for RetainedCombination {
    fn default() -> Self {
        Self::uninitialized()
    }
}

pub fn format_dials(cells: &[Option<u8>; 3]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .map(|cell| match cell {
            Some(value) => format!("{:02}", value),
            None => "__".to_string(),
        })
        .collect();
    parts.join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_digits() {
        assert!(Combination::new([0, 15, 7]).is_some());
        assert!(Combination::new([0, 16, 7]).is_none());
    }

    #[test]
    fn uninitialized_memory_falls_back_to_default() {
        let retained = RetainedCombination::uninitialized();
        let (combination, reset) = retained.load_or_default();
        assert!(reset);
        assert_eq!(combination.digits(), [5, 10, 15]);
        assert_eq!(retained.raw(), [5, 10, 15]);
    }

    #[test]
    fn valid_memory_is_kept() {
        let retained = RetainedCombination::with_digits([3, 7, 12]);
        let (combination, reset) = retained.load_or_default();
        assert!(!reset);
        assert_eq!(combination.digits(), [3, 7, 12]);
    }

    #[test]
    fn one_bad_digit_resets_all_three() {
        let retained = RetainedCombination::with_digits([3, 200, 12]);
        assert_eq!(retained.load_or_default().0.digits(), [5, 10, 15]);
    }

    #[test]
    fn dials_are_zero_padded_with_placeholders() {
        assert_eq!(format_dials(&[Some(5), Some(10), None]), "05-10-__");
        assert_eq!(format_dials(&[None, None, None]), "__-__-__");
        assert_eq!(Combination::default().to_string(), "05-10-15");
    }
}
