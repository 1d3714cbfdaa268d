use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcdPins {
    pub rs: u64,
    pub en: u64,
    pub d4: u64,
    pub d5: u64,
    pub d6: u64,
    pub d7: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Lcd,
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub encoder_a: u64,
    pub encoder_b: u64,
    pub left_button: u64,
    pub right_button: u64,
    pub left_switch: u64,
    pub left_led: u64,
    pub right_led: u64,
    pub servo: u64,
    pub display: DisplayKind,
    pub lcd: LcdPins,
    pub tick_ms: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            encoder_a: 16,
            encoder_b: 17,
            left_button: 2,
            right_button: 3,
            left_switch: 4,
            left_led: 20,
            right_led: 21,
            servo: 22,
            display: DisplayKind::Lcd,
            lcd: LcdPins {
                rs: 26,
                en: 19,
                d4: 13,
                d5: 6,
                d6: 5,
                d7: 11,
            },
            tick_ms: 10,
        }
    }
}

impl Configuration {
    pub fn load_from_path(path: &str) -> Result<Configuration> {
        let f = File::open(path).with_context(|| format!("could not open {}", path))?;
        let reader = BufReader::new(f);
        let config = serde_json::from_reader(reader)
            .with_context(|| format!("could not parse configuration {}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Configuration =
            serde_json::from_str(r#"{ "servo": 18, "display": "log" }"#).unwrap();
        assert_eq!(config.servo, 18);
        assert_eq!(config.display, DisplayKind::Log);
        assert_eq!(config.encoder_a, 16);
        assert_eq!(config.tick_ms, 10);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Configuration::load_from_path("/nonexistent/combolock.json").is_err());
    }
}
