use crate::hal::{
    Actuator, Clock, Controls, Display, EncoderPins, Leds, ServoCommand, SwitchPosition,
};
use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

// Queued readings, then the last one forever
pub struct ScriptedPins {
    readings: VecDeque<u8>,
    last: u8,
}

impl ScriptedPins {
    pub fn new(initial: u8) -> Self {
        Self {
            readings: VecDeque::new(),
            last: initial,
        }
    }

    pub fn push(&mut self, bits: u8) {
        self.readings.push_back(bits);
    }
}

impl EncoderPins for ScriptedPins {
    fn quadrature(&mut self) -> Result<u8> {
        if let Some(bits) = self.readings.pop_front() {
            self.last = bits;
        }
        Ok(self.last)
    }
}

#[derive(Debug)]
pub struct PanelState {
    pub left_button: bool,
    pub right_button: bool,
    pub left_switch: SwitchPosition,
    pub keys: VecDeque<char>,
    pub left_led: bool,
    pub right_led: bool,
    pub rows: BTreeMap<u8, String>,
    pub servo: Vec<ServoCommand>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            left_button: false,
            right_button: false,
            left_switch: SwitchPosition::Left,
            keys: VecDeque::new(),
            left_led: false,
            right_led: false,
            rows: BTreeMap::new(),
            servo: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockPanel {
    state: Rc<RefCell<PanelState>>,
}

impl MockPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_buttons(&self, left: bool, right: bool) {
        let mut state = self.state.borrow_mut();
        state.left_button = left;
        state.right_button = right;
    }

    pub fn set_switch(&self, position: SwitchPosition) {
        self.state.borrow_mut().left_switch = position;
    }

    pub fn type_keys(&self, keys: &str) {
        self.state.borrow_mut().keys.extend(keys.chars());
    }

    pub fn row(&self, row: u8) -> String {
        self.state
            .borrow()
            .rows
            .get(&row)
            .cloned()
            .unwrap_or_default()
    }

    pub fn leds(&self) -> (bool, bool) {
        let state = self.state.borrow();
        (state.left_led, state.right_led)
    }

    pub fn last_servo(&self) -> Option<ServoCommand> {
        self.state.borrow().servo.last().copied()
    }
}

impl Controls for MockPanel {
    fn left_button_pressed(&mut self) -> Result<bool> {
        Ok(self.state.borrow().left_button)
    }

    fn right_button_pressed(&mut self) -> Result<bool> {
        Ok(self.state.borrow().right_button)
    }

    fn left_switch_position(&mut self) -> Result<SwitchPosition> {
        Ok(self.state.borrow().left_switch)
    }

    fn get_keypress(&mut self) -> Option<char> {
        self.state.borrow_mut().keys.pop_front()
    }
}

impl Leds for MockPanel {
    fn set_left_led(&mut self, on: bool) -> Result<()> {
        self.state.borrow_mut().left_led = on;
        Ok(())
    }

    fn set_right_led(&mut self, on: bool) -> Result<()> {
        self.state.borrow_mut().right_led = on;
        Ok(())
    }
}

impl Display for MockPanel {
    fn display_string(&mut self, row: u8, text: &str) -> Result<()> {
        self.state.borrow_mut().rows.insert(row, text.to_string());
        Ok(())
    }
}

impl Actuator for MockPanel {
    fn center(&mut self) -> Result<()> {
        self.state.borrow_mut().servo.push(ServoCommand::Center);
        Ok(())
    }

    fn rotate_full_clockwise(&mut self) -> Result<()> {
        self.state.borrow_mut().servo.push(ServoCommand::FullClockwise);
        Ok(())
    }

    fn rotate_full_counterclockwise(&mut self) -> Result<()> {
        self.state
            .borrow_mut()
            .servo
            .push(ServoCommand::FullCounterClockwise);
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeClock {
    now_ms: Rc<Cell<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}
