use crate::config::LcdPins;
use crate::hal::Display as DisplaySink;
use anyhow::{anyhow, Context, Result};
use hd44780_driver::{Cursor, CursorBlink, Display, DisplayMode, HD44780};
use linux_embedded_hal::{Delay, Pin};
use log::info;
use std::fmt::Write;
use sysfs_gpio::Direction;

pub const ROWS: usize = 6;
pub const LINE_WIDTH: usize = 20;

// DDRAM start address of each line on a 20x4 panel
const LINE_ADDRESS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

pub type Lcd = HD44780<Delay, hd44780_driver::bus::FourBitBus<Pin, Pin, Pin, Pin, Pin, Pin>>;

pub fn init_lcd(pins: &LcdPins) -> Result<Lcd> {
    let rs = Pin::new(pins.rs);
    let en = Pin::new(pins.en);

    let db0 = Pin::new(pins.d4);
    let db1 = Pin::new(pins.d5);
    let db2 = Pin::new(pins.d6);
    let db3 = Pin::new(pins.d7);

    for pin in [&rs, &en, &db0, &db1, &db2, &db3].iter() {
        pin.export()
            .with_context(|| format!("could not export LCD pin {}", pin.get_pin_num()))?;
        pin.set_direction(Direction::Low)
            .with_context(|| {
                format!("could not set direction for LCD pin {}", pin.get_pin_num())
            })?;
    }

    let mut lcd = HD44780::new_4bit(rs, en, db0, db1, db2, db3, Delay);

    lcd.reset();
    lcd.clear();
    lcd.set_display_mode(DisplayMode {
        display: Display::On,
        cursor_visibility: Cursor::Invisible,
        cursor_blink: CursorBlink::Off,
    });

    Ok(lcd)
}

// Rows 2 and 4 share line 2, rows 3 and 5 share line 3
pub fn compose_line(frame: &[String; ROWS], line: usize) -> String {
    let parts: Vec<&str> = match line {
        0 => vec![frame[0].as_str()],
        1 => vec![frame[1].as_str()],
        2 => vec![frame[2].as_str(), frame[4].as_str()],
        _ => vec![frame[3].as_str(), frame[5].as_str()],
    };
    let text = parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{:<width$.width$}", text, width = LINE_WIDTH)
}

fn physical_line(row: usize) -> usize {
    match row {
        0 | 1 => row,
        2 | 4 => 2,
        _ => 3,
    }
}

pub struct LcdDisplay {
    lcd: Lcd,
    frame: [String; ROWS],
}

impl LcdDisplay {
    pub fn new(lcd: Lcd) -> Self {
        Self {
            lcd,
            frame: Default::default(),
        }
    }
}

impl DisplaySink for LcdDisplay {
    fn display_string(&mut self, row: u8, text: &str) -> Result<()> {
        let row = row as usize;
        if row >= ROWS {
            return Err(anyhow!("display row {} out of range", row));
        }
        if self.frame[row] == text {
            return Ok(());
        }
        self.frame[row] = text.to_string();

        let line = physical_line(row);
        self.lcd.set_cursor_pos(LINE_ADDRESS[line]);
        self.lcd
            .write_str(&compose_line(&self.frame, line))
            .map_err(|_| anyhow!("could not write to the display"))
    }
}

#[derive(Default)]
pub struct LogDisplay {
    frame: [String; ROWS],
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for LogDisplay {
    fn display_string(&mut self, row: u8, text: &str) -> Result<()> {
        let slot = self
            .frame
            .get_mut(row as usize)
            .ok_or_else(|| anyhow!("display row {} out of range", row))?;
        if slot.as_str() != text {
            *slot = text.to_string();
            info!("[{}] {}", row, text);
        }
        Ok(())
    }
}
