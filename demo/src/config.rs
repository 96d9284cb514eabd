use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use dotenv::var;
use lcdpack_lcd::sink::PCF8574_ADDRESS;
use lcdpack_lcd::timing::Timing;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "lcdpack.json";

/// Where the LCD bytes go.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A PCF8574 backpack on an I²C bus device.
    I2c,
    /// 8 GPIO lines wired like the expander pins, through the GPIO character device.
    Gpiod,
    /// Nowhere, the bytes are only counted. Useful without hardware.
    Memory,
}

#[derive(Debug, Error)]
#[error("unknown backend {0:?}, expected \"i2c\", \"gpiod\" or \"memory\"")]
pub struct UnknownBackend(String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "i2c" => Ok(Backend::I2c),
            "gpiod" => Ok(Backend::Gpiod),
            "memory" => Ok(Backend::Memory),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Bus timing overrides, in the smallest unit that makes sense for each.
#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct TimingConfig {
    pub enable_pulse_ns: u64,
    pub settle_us: u64,
    pub long_command_us: u64,
    pub power_on_ms: u64,
    pub reset_us: u64,
}

impl TimingConfig {
    pub fn to_timing(&self) -> Timing {
        Timing {
            enable_pulse: Duration::from_nanos(self.enable_pulse_ns),
            settle: Duration::from_micros(self.settle_us),
            long_command: Duration::from_micros(self.long_command_us),
            power_on: Duration::from_millis(self.power_on_ms),
            reset: Duration::from_micros(self.reset_us),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        let timing = Timing::default();
        TimingConfig {
            enable_pulse_ns: timing.enable_pulse.as_nanos() as u64,
            settle_us: timing.settle.as_micros() as u64,
            long_command_us: timing.long_command.as_micros() as u64,
            power_on_ms: timing.power_on.as_millis() as u64,
            reset_us: timing.reset.as_micros() as u64,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    pub rows: usize,
    pub columns: usize,
    pub backend: Backend,
    pub i2c_bus: String,
    pub i2c_address: u8,
    pub gpio_chip: String,
    /// GPIO lines connected to expander bits P0..P7: RS, RW, E, backlight, D4..D7.
    pub gpio_lines: [u32; 8],
    pub timing: TimingConfig,
    /// How many times the status screen is refreshed before exiting.
    pub cycles: u32,
}

impl Config {
    /// Gets the config file path from `LCDPACK_CONFIG`, `lcdpack.json` if unset.
    pub fn path() -> PathBuf {
        var("LCDPACK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Loads the config at `path`, or `None` if there is no file there.
    ///
    /// # Errors
    /// - [ConfigError::Io] if the file exists but can't be read.
    /// - [ConfigError::Json] if it is not a valid config.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let reader = BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rows: 2,
            columns: 16,
            backend: Backend::Memory,
            i2c_bus: "/dev/i2c-1".to_string(),
            i2c_address: PCF8574_ADDRESS,
            gpio_chip: "/dev/gpiochip0".to_string(),
            gpio_lines: [17, 27, 22, 23, 5, 6, 13, 19],
            timing: TimingConfig::default(),
            cycles: 10,
        }
    }
}
