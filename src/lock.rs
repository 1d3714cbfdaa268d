use crate::changing::ChangeBuffers;
use crate::combination::{format_dials, Combination, DIAL_POSITIONS};
use crate::hal::{ServoCommand, SwitchPosition};
use crate::rotary::Direction;
use log::{info, warn};

/// Times each dial has to pass its digit before the entry is accepted.
pub const REQUIRED_PASSES: [u8; 3] = [3, 2, 1];
pub const MAX_BAD_TRIES: u8 = 3;
pub const BLINK_PERIOD_MS: u64 = 250;
pub const PENALTY_MS_PER_BAD_TRY: u64 = 1000;

pub const STATUS_ROW: u8 = 0;
pub const SUB_STATUS_ROW: u8 = 1;
pub const NEW_LABEL_ROW: u8 = 2;
pub const CONFIRM_LABEL_ROW: u8 = 3;
pub const ENTRY_ROW: u8 = 4;
pub const CONFIRM_ROW: u8 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockMode {
    Locked,
    Unlocked,
    Alarmed,
    Changing(ChangeBuffers),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Display { row: u8, text: String },
    Servo(ServoCommand),
    LeftLed(bool),
    RightLed(bool),
    StoreCombination(Combination),
    /// Run the controller's initialize path again.
    Relock,
}

fn show(row: u8, text: &str) -> Effect {
    Effect::Display {
        row,
        text: text.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickInput {
    pub direction: Direction,
    pub left_button: bool,
    pub right_button: bool,
    pub left_switch: SwitchPosition,
    pub key: Option<char>,
    pub elapsed_ms: u64,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            direction: Direction::None,
            left_button: false,
            right_button: false,
            left_switch: SwitchPosition::Left,
            key: None,
            elapsed_ms: 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entry {
    values: [u8; 3],
    passes: [u8; 3],
    cursor: usize,
    started: bool,
}

impl Entry {
    pub fn values(&self) -> [u8; 3] {
        self.values
    }

    pub fn passes(&self) -> [u8; 3] {
        self.passes
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset(&mut self) {
        *self = Entry::default();
    }

    // Dials 0 and 2 count up clockwise, dial 1 counterclockwise.
    fn counting_direction(dial: usize) -> Direction {
        if dial == 1 {
            Direction::CounterClockwise
        } else {
            Direction::Clockwise
        }
    }

    pub fn turn(&mut self, direction: Direction, combination: &Combination) {
        if direction == Direction::None {
            return;
        }
        self.started = true;
        let dial = self.cursor;
        if direction == Self::counting_direction(dial) {
            self.values[dial] = (self.values[dial] + 1) % DIAL_POSITIONS;
            if self.values[dial] == combination.digit(dial) {
                self.passes[dial] = self.passes[dial].saturating_add(1);
            }
        } else if dial < 2 {
            self.values[dial + 1] = self.values[dial];
            self.passes[dial + 1] = 0;
            self.cursor += 1;
        } else {
            self.reset();
        }
    }

    pub fn matches(&self, combination: &Combination) -> bool {
        self.cursor == 2
            && self.values == combination.digits()
            && self
                .passes
                .iter()
                .zip(REQUIRED_PASSES.iter())
                .all(|(passes, required)| passes >= required)
    }

    pub fn row(&self) -> String {
        let mut cells = [None; 3];
        if self.started {
            for (i, cell) in cells.iter_mut().enumerate().take(self.cursor + 1) {
                *cell = Some(self.values[i]);
            }
        }
        format_dials(&cells)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Blink {
    accumulated_ms: u64,
    lit: bool,
}

impl Blink {
    fn lit() -> Self {
        Self {
            accumulated_ms: 0,
            lit: true,
        }
    }

    /// New LED level if it toggled during `elapsed_ms`.
    fn advance(&mut self, elapsed_ms: u64) -> Option<bool> {
        self.accumulated_ms += elapsed_ms;
        let toggles = self.accumulated_ms / BLINK_PERIOD_MS;
        self.accumulated_ms %= BLINK_PERIOD_MS;
        if toggles % 2 == 1 {
            self.lit = !self.lit;
            Some(self.lit)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct LockMachine {
    mode: LockMode,
    combination: Combination,
    entry: Entry,
    bad_tries: u8,
    penalty_remaining_ms: u64,
    blink: Blink,
    left_was_down: bool,
    right_was_down: bool,
}

impl LockMachine {
    pub fn new(combination: Combination) -> Self {
        Self {
            mode: LockMode::Locked,
            combination,
            entry: Entry::default(),
            bad_tries: 0,
            penalty_remaining_ms: 0,
            blink: Blink::default(),
            left_was_down: false,
            right_was_down: false,
        }
    }

    pub fn mode(&self) -> &LockMode {
        &self.mode
    }

    pub fn combination(&self) -> Combination {
        self.combination
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn bad_tries(&self) -> u8 {
        self.bad_tries
    }

    pub fn is_penalized(&self) -> bool {
        self.penalty_remaining_ms > 0
    }

    /// Back to LOCKED with a fresh entry, using an already validated combination.
    pub fn initialize(&mut self, combination: Combination) -> Vec<Effect> {
        self.mode = LockMode::Locked;
        self.combination = combination;
        self.bad_tries = 0;
        self.penalty_remaining_ms = 0;
        self.entry.reset();
        info!("Lock initialized, mode LOCKED");

        let mut effects = vec![Effect::Servo(ServoCommand::FullClockwise)];
        effects.extend(self.locked_screen());
        for row in [NEW_LABEL_ROW, CONFIRM_LABEL_ROW, CONFIRM_ROW].iter() {
            effects.push(show(*row, ""));
        }
        effects
    }

    fn locked_screen(&self) -> Vec<Effect> {
        vec![
            Effect::LeftLed(true),
            Effect::RightLed(false),
            show(STATUS_ROW, "LOCKED"),
            show(SUB_STATUS_ROW, ""),
            show(ENTRY_ROW, &self.entry.row()),
        ]
    }

    pub fn step(&mut self, input: &TickInput) -> Vec<Effect> {
        let left_pressed = input.left_button && !self.left_was_down;
        let right_pressed = input.right_button && !self.right_was_down;
        let both_pressed =
            input.left_button && input.right_button && (left_pressed || right_pressed);
        self.left_was_down = input.left_button;
        self.right_was_down = input.right_button;

        match self.mode {
            LockMode::Locked => self.step_locked(input, left_pressed),
            LockMode::Unlocked => self.step_unlocked(input, right_pressed, both_pressed),
            LockMode::Alarmed => self.step_alarmed(input),
            LockMode::Changing(_) => self.step_changing(input),
        }
    }

    fn step_locked(&mut self, input: &TickInput, left_pressed: bool) -> Vec<Effect> {
        if self.is_penalized() {
            return self.step_penalty(input.elapsed_ms);
        }

        let mut effects = Vec::new();
        if input.direction != Direction::None {
            self.entry.turn(input.direction, &self.combination);
            effects.push(show(ENTRY_ROW, &self.entry.row()));
        }

        if left_pressed && self.entry.cursor() == 2 {
            effects.extend(self.check_entry());
        }
        effects
    }

    fn check_entry(&mut self) -> Vec<Effect> {
        let accepted = self.entry.matches(&self.combination);
        self.entry.reset();

        if accepted {
            info!("Combination accepted, unlocking");
            self.mode = LockMode::Unlocked;
            self.bad_tries = 0;
            return self.unlocked_screen(vec![Effect::Servo(ServoCommand::FullCounterClockwise)]);
        }

        self.bad_tries += 1;
        warn!("Bad attempt #{}", self.bad_tries);
        self.blink = Blink::lit();

        if self.bad_tries >= MAX_BAD_TRIES {
            warn!("Too many bad attempts, alarm raised");
            self.mode = LockMode::Alarmed;
            return vec![
                show(STATUS_ROW, "ALERT!"),
                show(SUB_STATUS_ROW, ""),
                show(ENTRY_ROW, ""),
                Effect::LeftLed(true),
                Effect::RightLed(true),
            ];
        }

        self.penalty_remaining_ms = u64::from(self.bad_tries) * PENALTY_MS_PER_BAD_TRY;
        vec![
            show(STATUS_ROW, &format!("BAD ATTEMPT #{}", self.bad_tries)),
            show(ENTRY_ROW, &self.entry.row()),
            Effect::LeftLed(true),
            Effect::RightLed(true),
        ]
    }

    fn step_penalty(&mut self, elapsed_ms: u64) -> Vec<Effect> {
        self.penalty_remaining_ms = self.penalty_remaining_ms.saturating_sub(elapsed_ms);
        if self.penalty_remaining_ms == 0 {
            return self.locked_screen();
        }
        match self.blink.advance(elapsed_ms) {
            Some(lit) => vec![Effect::LeftLed(lit), Effect::RightLed(lit)],
            None => Vec::new(),
        }
    }

    fn unlocked_screen(&self, mut effects: Vec<Effect>) -> Vec<Effect> {
        effects.extend(vec![
            Effect::LeftLed(false),
            Effect::RightLed(true),
            show(STATUS_ROW, "OPEN"),
            show(NEW_LABEL_ROW, ""),
            show(CONFIRM_LABEL_ROW, ""),
            show(ENTRY_ROW, ""),
            show(CONFIRM_ROW, ""),
        ]);
        effects
    }

    fn step_unlocked(
        &mut self,
        input: &TickInput,
        right_pressed: bool,
        both_pressed: bool,
    ) -> Vec<Effect> {
        if both_pressed {
            info!("Manual relock");
            return vec![Effect::Relock];
        }
        if right_pressed && !input.left_button && input.left_switch == SwitchPosition::Right {
            info!("Entering combination change");
            let buffers = ChangeBuffers::new();
            let effects = vec![
                show(STATUS_ROW, "CHANGING"),
                show(SUB_STATUS_ROW, ""),
                show(NEW_LABEL_ROW, "NEW"),
                show(CONFIRM_LABEL_ROW, "CONFIRM"),
                show(ENTRY_ROW, &buffers.new_row()),
                show(CONFIRM_ROW, &buffers.confirm_row()),
            ];
            self.mode = LockMode::Changing(buffers);
            return effects;
        }
        Vec::new()
    }

    fn step_alarmed(&mut self, input: &TickInput) -> Vec<Effect> {
        match self.blink.advance(input.elapsed_ms) {
            Some(lit) => vec![Effect::LeftLed(lit), Effect::RightLed(lit)],
            None => Vec::new(),
        }
    }

    fn step_changing(&mut self, input: &TickInput) -> Vec<Effect> {
        let mut effects = Vec::new();
        let outcome = match &mut self.mode {
            LockMode::Changing(buffers) => {
                if let Some(key) = input.key {
                    if buffers.press(key) {
                        effects.push(show(ENTRY_ROW, &buffers.new_row()));
                        effects.push(show(CONFIRM_ROW, &buffers.confirm_row()));
                    }
                }
                if input.left_switch != SwitchPosition::Left {
                    return effects;
                }
                buffers.commit()
            }
            _ => return effects,
        };

        // Commit attempt: either way the buffers are dropped and the lock stays open.
        self.mode = LockMode::Unlocked;
        let effects = match outcome {
            Some(combination) => {
                info!("Combination changed to {}", combination);
                self.combination = combination;
                vec![
                    Effect::StoreCombination(combination),
                    show(SUB_STATUS_ROW, "CHANGED"),
                ]
            }
            None => {
                warn!("Combination change refused");
                vec![show(SUB_STATUS_ROW, "NO CHANGE")]
            }
        };
        self.unlocked_screen(effects)
    }
}
