use crate::combination::{Combination, RetainedCombination};
use crate::hal::{Actuator, Clock, Controls, Display, Leds};
use crate::lock::{Effect, LockMachine, LockMode, TickInput};
use crate::rotary::DirectionMailbox;
use anyhow::{Context, Result};
use log::warn;
use std::sync::Arc;

pub struct Peripherals {
    pub controls: Box<dyn Controls>,
    pub leds: Box<dyn Leds>,
    pub display: Box<dyn Display>,
    pub actuator: Box<dyn Actuator>,
    pub clock: Box<dyn Clock>,
}

pub struct LockController {
    machine: LockMachine,
    mailbox: Arc<DirectionMailbox>,
    retained: Arc<RetainedCombination>,
    peripherals: Peripherals,
    last_tick_ms: u64,
}

impl LockController {
    pub fn new(
        mailbox: Arc<DirectionMailbox>,
        retained: Arc<RetainedCombination>,
        peripherals: Peripherals,
    ) -> Self {
        let last_tick_ms = peripherals.clock.now_ms();
        Self {
            machine: LockMachine::new(Combination::default()),
            mailbox,
            retained,
            peripherals,
            last_tick_ms,
        }
    }

    /// The only way into LOCKED from outside the machine. Manual relock
    /// comes back through here too.
    pub fn initialize(&mut self) -> Result<()> {
        let (combination, reset) = self.retained.load_or_default();
        if reset {
            warn!("Retained combination out of range, restored default");
        }
        // A turn made before the reset must not count towards the new entry
        self.mailbox.get_direction();
        self.last_tick_ms = self.peripherals.clock.now_ms();

        let effects = self.machine.initialize(combination);
        self.apply(effects)
    }

    pub fn tick(&mut self) -> Result<()> {
        let now = self.peripherals.clock.now_ms();
        let elapsed_ms = now.saturating_sub(self.last_tick_ms);
        self.last_tick_ms = now;

        let controls = &mut self.peripherals.controls;
        let input = TickInput {
            direction: self.mailbox.get_direction(),
            left_button: controls
                .left_button_pressed()
                .context("could not read left button")?,
            right_button: controls
                .right_button_pressed()
                .context("could not read right button")?,
            left_switch: controls
                .left_switch_position()
                .context("could not read left switch")?,
            key: controls.get_keypress(),
            elapsed_ms,
        };

        let effects = self.machine.step(&input);
        self.apply(effects)
    }

    fn apply(&mut self, effects: Vec<Effect>) -> Result<()> {
        let peripherals = &mut self.peripherals;
        let mut relock = false;
        for effect in effects {
            match effect {
                Effect::Display { row, text } => peripherals
                    .display
                    .display_string(row, &text)
                    .with_context(|| format!("could not write display row {}", row))?,
                Effect::Servo(command) => peripherals
                    .actuator
                    .command(command)
                    .with_context(|| format!("could not move servo to {:?}", command))?,
                Effect::LeftLed(on) => peripherals.leds.set_left_led(on)?,
                Effect::RightLed(on) => peripherals.leds.set_right_led(on)?,
                Effect::StoreCombination(combination) => self.retained.store(combination),
                Effect::Relock => relock = true,
            }
        }
        if relock {
            self.initialize()?;
        }
        Ok(())
    }

    pub fn into_peripherals(self) -> Peripherals {
        self.peripherals
    }

    pub fn mode(&self) -> &LockMode {
        self.machine.mode()
    }

    pub fn bad_tries(&self) -> u8 {
        self.machine.bad_tries()
    }

    pub fn combination(&self) -> Combination {
        self.machine.combination()
    }

    pub fn mailbox(&self) -> &Arc<DirectionMailbox> {
        &self.mailbox
    }
}
