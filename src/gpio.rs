//! Buttons are wired active low against pull-ups: a pressed button reads 0.
//! The switch reads 1 in its right-hand position.
use crate::hal::{Controls, EncoderPins, Leds, SwitchPosition};
use crate::keypad::Keypad;
use anyhow::{Context, Result};
use sysfs_gpio::{AsyncPinPoller, Direction, Edge, Pin};

pub fn input_pin(pin_num: u64) -> Result<Pin> {
    let pin = Pin::new(pin_num);
    pin.export()
        .with_context(|| format!("could not export GPIO pin {}", pin_num))?;
    pin.set_direction(Direction::In)
        .with_context(|| format!("could not set direction for GPIO pin {}", pin_num))?;
    Ok(pin)
}

pub fn output_pin(pin_num: u64) -> Result<Pin> {
    let pin = Pin::new(pin_num);
    pin.export()
        .with_context(|| format!("could not export GPIO pin {}", pin_num))?;
    pin.set_direction(Direction::Low)
        .with_context(|| format!("could not set direction for GPIO pin {}", pin_num))?;
    Ok(pin)
}

pub struct EncoderWipers {
    a: Pin,
    b: Pin,
}

impl EncoderWipers {
    pub fn new(a_pin: u64, b_pin: u64) -> Result<Self> {
        let a = input_pin(a_pin)?;
        let b = input_pin(b_pin)?;
        for pin in [a, b].iter() {
            pin.set_edge(Edge::BothEdges).with_context(|| {
                format!("could not set edge for GPIO pin {}", pin.get_pin_num())
            })?;
        }
        Ok(Self { a, b })
    }

    pub fn pollers(&self) -> Result<(AsyncPinPoller, AsyncPinPoller)> {
        Ok((
            self.a
                .get_async_poller()
                .context("could not poll encoder wiper A")?,
            self.b
                .get_async_poller()
                .context("could not poll encoder wiper B")?,
        ))
    }
}

impl EncoderPins for EncoderWipers {
    fn quadrature(&mut self) -> Result<u8> {
        let a = self.a.get_value().context("could not read encoder wiper A")?;
        let b = self.b.get_value().context("could not read encoder wiper B")?;
        Ok(((b & 1) << 1) | (a & 1))
    }
}

pub struct PanelPins {
    left_button: Pin,
    right_button: Pin,
    left_switch: Pin,
    keypad: Keypad,
}

impl PanelPins {
    pub fn new(
        left_button: u64,
        right_button: u64,
        left_switch: u64,
        keypad: Keypad,
    ) -> Result<Self> {
        Ok(Self {
            left_button: input_pin(left_button)?,
            right_button: input_pin(right_button)?,
            left_switch: input_pin(left_switch)?,
            keypad,
        })
    }
}

impl Controls for PanelPins {
    fn left_button_pressed(&mut self) -> Result<bool> {
        Ok(self.left_button.get_value()? == 0)
    }

    fn right_button_pressed(&mut self) -> Result<bool> {
        Ok(self.right_button.get_value()? == 0)
    }

    fn left_switch_position(&mut self) -> Result<SwitchPosition> {
        Ok(match self.left_switch.get_value()? {
            0 => SwitchPosition::Left,
            _ => SwitchPosition::Right,
        })
    }

    fn get_keypress(&mut self) -> Option<char> {
        self.keypad.get_keypress()
    }
}

pub struct LedPins {
    left: Pin,
    right: Pin,
}

impl LedPins {
    pub fn new(left: u64, right: u64) -> Result<Self> {
        Ok(Self {
            left: output_pin(left)?,
            right: output_pin(right)?,
        })
    }
}

impl Leds for LedPins {
    fn set_left_led(&mut self, on: bool) -> Result<()> {
        self.left
            .set_value(on as u8)
            .context("could not set left LED")?;
        Ok(())
    }

    fn set_right_led(&mut self, on: bool) -> Result<()> {
        self.right
            .set_value(on as u8)
            .context("could not set right LED")?;
        Ok(())
    }
}
