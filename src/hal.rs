use anyhow::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchPosition {
    Left,
    Right,
}

// Full clockwise holds the mechanism locked
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServoCommand {
    Center,
    FullClockwise,
    FullCounterClockwise,
}

pub trait EncoderPins {
    /// `(B << 1) | A`
    fn quadrature(&mut self) -> Result<u8>;
}

pub trait Controls {
    fn left_button_pressed(&mut self) -> Result<bool>;
    fn right_button_pressed(&mut self) -> Result<bool>;
    fn left_switch_position(&mut self) -> Result<SwitchPosition>;
    /// Single key, edge triggered: each key press is returned once.
    fn get_keypress(&mut self) -> Option<char>;
}

pub trait Leds {
    fn set_left_led(&mut self, on: bool) -> Result<()>;
    fn set_right_led(&mut self, on: bool) -> Result<()>;
}

pub trait Display {
    fn display_string(&mut self, row: u8, text: &str) -> Result<()>;
}

pub trait Actuator {
    fn center(&mut self) -> Result<()>;
    fn rotate_full_clockwise(&mut self) -> Result<()>;
    fn rotate_full_counterclockwise(&mut self) -> Result<()>;

    fn command(&mut self, command: ServoCommand) -> Result<()> {
        match command {
            ServoCommand::Center => self.center(),
            ServoCommand::FullClockwise => self.rotate_full_clockwise(),
            ServoCommand::FullCounterClockwise => self.rotate_full_counterclockwise(),
        }
    }
}

pub trait Clock {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock {
    start: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
