use crate::combination::{Combination, MAX_DIAL_VALUE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangePhase {
    EnteringNew,
    Confirming,
}

/// A cell is finished by a second digit or by `#` after a single digit.
/// `*` drops the half-typed digit. Anything above 15 is accepted here and
/// refused at commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeBuffers {
    new: [Option<u8>; 3],
    confirm: [Option<u8>; 3],
    phase: ChangePhase,
    fill_index: usize,
    pending: Option<u8>,
}

impl ChangeBuffers {
    pub fn new() -> Self {
        Self {
            new: [None; 3],
            confirm: [None; 3],
            phase: ChangePhase::EnteringNew,
            fill_index: 0,
            pending: None,
        }
    }

    pub fn phase(&self) -> ChangePhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.new.iter().chain(self.confirm.iter()).all(Option::is_some)
    }

    pub fn press(&mut self, key: char) -> bool {
        if self.is_complete() {
            return false;
        }
        match (key, self.pending) {
            ('0'..='9', None) => {
                self.pending = key.to_digit(10).map(|d| d as u8);
                true
            }
            ('0'..='9', Some(tens)) => {
                let units = key.to_digit(10).unwrap_or(0) as u8;
                self.finish_cell(tens * 10 + units);
                true
            }
            ('#', Some(value)) => {
                self.finish_cell(value);
                true
            }
            ('*', Some(_)) => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    fn finish_cell(&mut self, value: u8) {
        self.pending = None;
        let buffer = match self.phase {
            ChangePhase::EnteringNew => &mut self.new,
            ChangePhase::Confirming => &mut self.confirm,
        };
        buffer[self.fill_index] = Some(value);
        self.fill_index += 1;
        if self.fill_index == buffer.len() && self.phase == ChangePhase::EnteringNew {
            self.phase = ChangePhase::Confirming;
            self.fill_index = 0;
        }
    }

    pub fn commit(&self) -> Option<Combination> {
        if !self.is_complete() || self.new != self.confirm {
            return None;
        }
        let mut digits = [0u8; 3];
        for (digit, cell) in digits.iter_mut().zip(self.new.iter()) {
            match cell {
                Some(value) if *value <= MAX_DIAL_VALUE => *digit = *value,
                _ => return None,
            }
        }
        Combination::new(digits)
    }

    pub fn new_row(&self) -> String {
        self.render(ChangePhase::EnteringNew)
    }

    pub fn confirm_row(&self) -> String {
        self.render(ChangePhase::Confirming)
    }

    fn render(&self, which: ChangePhase) -> String {
        let cells = match which {
            ChangePhase::EnteringNew => &self.new,
            ChangePhase::Confirming => &self.confirm,
        };
        let parts: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match (cell, self.pending) {
                (Some(value), _) => format!("{:02}", value),
                (None, Some(tens)) if which == self.phase && i == self.fill_index => {
                    format!("{}_", tens)
                }
                _ => "__".to_string(),
            })
            .collect();
        parts.join("-")
    }
}

impl Default for ChangeBuffers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_keys(buffers: &mut ChangeBuffers, keys: &str) {
        for key in keys.chars() {
            buffers.press(key);
        }
    }

    #[test]
    fn matching_entries_commit() {
        let mut buffers = ChangeBuffers::new();
        type_keys(&mut buffers, "3#7#12");
        assert_eq!(buffers.phase(), ChangePhase::Confirming);
        type_keys(&mut buffers, "03#0712");
        assert!(buffers.is_complete());
        assert_eq!(buffers.commit().unwrap().digits(), [3, 7, 12]);
    }

    #[test]
    fn mismatch_is_refused() {
        let mut buffers = ChangeBuffers::new();
        type_keys(&mut buffers, "3#7#12");
        type_keys(&mut buffers, "3#7#13");
        assert!(buffers.commit().is_none());
    }

    #[test]
    fn incomplete_is_refused() {
        let mut buffers = ChangeBuffers::new();
        type_keys(&mut buffers, "3#7#12");
        type_keys(&mut buffers, "3#7#");
        assert!(!buffers.is_complete());
        assert!(buffers.commit().is_none());
    }

    #[test]
    fn out_of_range_is_refused() {
        let mut buffers = ChangeBuffers::new();
        type_keys(&mut buffers, "3#7#42");
        type_keys(&mut buffers, "3#7#42");
        assert!(buffers.is_complete());
        assert!(buffers.commit().is_none());
    }

    #[test]
    fn rows_show_progress() {
        let mut buffers = ChangeBuffers::new();
        assert_eq!(buffers.new_row(), "__-__-__");
        type_keys(&mut buffers, "3#1");
        assert_eq!(buffers.new_row(), "03-1_-__");
        buffers.press('*');
        assert_eq!(buffers.new_row(), "03-__-__");
        type_keys(&mut buffers, "7#12");
        type_keys(&mut buffers, "5");
        assert_eq!(buffers.new_row(), "03-07-12");
        assert_eq!(buffers.confirm_row(), "5_-__-__");
    }

    #[test]
    fn keys_after_completion_are_ignored() {
        let mut buffers = ChangeBuffers::new();
        type_keys(&mut buffers, "010203010203");
        assert!(buffers.is_complete());
        assert!(!buffers.press('9'));
        assert_eq!(buffers.commit().unwrap().digits(), [1, 2, 3]);
    }
}
