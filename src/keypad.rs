use log::{debug, error, info};
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

const KEYS: &str = "0123456789ABCD*#";

#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    Keys(Vec<char>),
    SoftReset,
}

/// A line holding only `R` asks for a soft reset. Anything else is typed
/// key by key, dropping characters the keypad does not have.
pub fn parse_line(line: &str) -> Line {
    if line.trim().eq_ignore_ascii_case("r") {
        return Line::SoftReset;
    }
    let keys = line
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|key| {
            let known = KEYS.contains(*key);
            if !known {
                debug!("Ignoring key {:?}", key);
            }
            known
        })
        .collect();
    Line::Keys(keys)
}

pub struct Keypad {
    rx: Receiver<char>,
}

impl Keypad {
    pub fn channel() -> (Sender<char>, Keypad) {
        let (tx, rx) = channel();
        (tx, Keypad { rx })
    }

    pub fn from_stdin(soft_reset: Arc<AtomicBool>) -> Keypad {
        let (tx, keypad) = Keypad::channel();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Keypad input failed {:?}", e);
                        return;
                    }
                };
                match parse_line(&line) {
                    Line::SoftReset => {
                        info!("Soft reset requested");
                        soft_reset.store(true, Ordering::Release);
                    }
                    Line::Keys(keys) => {
                        for key in keys {
                            if tx.send(key).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });
        keypad
    }

    pub fn get_keypress(&self) -> Option<char> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_delivered_once_in_order() {
        let (tx, keypad) = Keypad::channel();
        tx.send('1').unwrap();
        tx.send('#').unwrap();
        assert_eq!(keypad.get_keypress(), Some('1'));
        assert_eq!(keypad.get_keypress(), Some('#'));
        assert_eq!(keypad.get_keypress(), None);
    }

    #[test]
    fn lines_become_keypad_keys() {
        assert_eq!(parse_line("3#7b x*"), Line::Keys(vec!['3', '#', '7', 'B', '*']));
        assert_eq!(parse_line(""), Line::Keys(vec![]));
    }

    #[test]
    fn lone_r_requests_soft_reset() {
        assert_eq!(parse_line("r"), Line::SoftReset);
        assert_eq!(parse_line(" R "), Line::SoftReset);
        assert_eq!(parse_line("R1"), Line::Keys(vec!['1']));
    }
}
