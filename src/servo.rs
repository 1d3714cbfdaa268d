use crate::hal::{Actuator, ServoCommand};
use anyhow::Result;
use log::{error, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sysfs_gpio::Pin;

pub const SIGNAL_PERIOD_US: u64 = 20_000;
pub const FULL_CLOCKWISE_US: u64 = 500;
pub const CENTER_US: u64 = 1_500;
pub const FULL_COUNTERCLOCKWISE_US: u64 = 2_500;

pub fn pulse_width_us(command: ServoCommand) -> u64 {
    match command {
        ServoCommand::FullClockwise => FULL_CLOCKWISE_US,
        ServoCommand::Center => CENTER_US,
        ServoCommand::FullCounterClockwise => FULL_COUNTERCLOCKWISE_US,
    }
}

#[derive(Clone, Debug)]
pub struct Servo {
    pulse_width_us: Arc<AtomicU64>,
}

impl Servo {
    pub fn detached() -> Self {
        Self {
            pulse_width_us: Arc::new(AtomicU64::new(CENTER_US)),
        }
    }

    pub fn spawn(pin: Pin) -> Self {
        let servo = Servo::detached();
        let width = servo.pulse_width_us.clone();
        thread::spawn(move || loop {
            let high_us = width.load(Ordering::Acquire).min(SIGNAL_PERIOD_US);
            if let Err(e) = pin.set_value(1) {
                error!("Servo pulse stopped {:?}", e);
                return;
            }
            thread::sleep(Duration::from_micros(high_us));
            if let Err(e) = pin.set_value(0) {
                error!("Servo pulse stopped {:?}", e);
                return;
            }
            thread::sleep(Duration::from_micros(SIGNAL_PERIOD_US - high_us));
        });
        servo
    }

    pub fn pulse_width(&self) -> u64 {
        self.pulse_width_us.load(Ordering::Acquire)
    }

    fn set(&self, command: ServoCommand) {
        info!("Servo {:?}", command);
        self.pulse_width_us
            .store(pulse_width_us(command), Ordering::Release);
    }
}

impl Actuator for Servo {
    fn center(&mut self) -> Result<()> {
        self.set(ServoCommand::Center);
        Ok(())
    }

    fn rotate_full_clockwise(&mut self) -> Result<()> {
        self.set(ServoCommand::FullClockwise);
        Ok(())
    }

    fn rotate_full_counterclockwise(&mut self) -> Result<()> {
        self.set(ServoCommand::FullCounterClockwise);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_select_pulse_width() {
        let mut servo = Servo::detached();
        assert_eq!(servo.pulse_width(), CENTER_US);
        servo.rotate_full_clockwise().unwrap();
        assert_eq!(servo.pulse_width(), FULL_CLOCKWISE_US);
        servo.command(ServoCommand::FullCounterClockwise).unwrap();
        assert_eq!(servo.pulse_width(), FULL_COUNTERCLOCKWISE_US);
    }
}
