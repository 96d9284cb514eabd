mod config;

use std::env::var;
use std::thread::sleep;
use std::time::Duration;

use dotenv::dotenv;
use lcdpack_lcd::hd44780::glyphs::{ARROW_RIGHT, RETURN_ARROW};
use lcdpack_lcd::hd44780::{CharacterLcd, CursorDirection, Geometry, Hd44780Lcd, ProgressBar};
use lcdpack_lcd::sink::{ByteSink, GpiodSink, I2cBackpack, MemorySink};
use lcdpack_lcd::timing::{ThreadDelay, Timing};
use linux_embedded_hal::I2cdev;
use log::{debug, info, warn};
use sysinfo::System;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::config::{Backend, Config};

const UNKNOWN_STR: &str = "???";

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    info!("lcdpack demo starting...");
    info!(
        "Hostname {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR)
    );

    let config_path = Config::path();
    let mut config = match Config::load(&config_path)? {
        Some(config) => config,
        None => {
            info!("No config at {}, writing the defaults", config_path.display());
            let config = Config::default();
            if let Err(err) = config.save(&config_path) {
                warn!("Failed to save the default config: {}", err);
            }
            config
        }
    };
    if let Ok(backend) = var("LCDPACK_BACKEND") {
        config.backend = backend.parse()?;
    }
    debug!("{:?}", config);

    let geometry = Geometry::new(config.rows, config.columns)?;
    let timing = config.timing.to_timing();

    match config.backend {
        Backend::I2c => {
            info!("LCD @ {} address {:#04x}", config.i2c_bus, config.i2c_address);
            let i2c = I2cdev::new(&config.i2c_bus)?;
            let backpack = I2cBackpack::new(i2c, config.i2c_address);
            run(backpack, geometry, timing, config.cycles)?;
        }
        Backend::Gpiod => {
            info!("LCD @ {} lines {:?}", config.gpio_chip, config.gpio_lines);
            let sink = GpiodSink::open(&config.gpio_chip, config.gpio_lines)?;
            debug!("{:?} initialized.", sink);
            run(sink, geometry, timing, config.cycles)?;
        }
        Backend::Memory => {
            let mut sink = MemorySink::new();
            run(&mut sink, geometry, timing, config.cycles)?;
            info!("{} bytes written to the bus", sink.bytes().len());
        }
    }

    info!("Done.");
    Ok(())
}

fn run<S: ByteSink>(sink: S, geometry: Geometry, timing: Timing, cycles: u32) -> eyre::Result<()> {
    let mut lcd = Hd44780Lcd::with_timing(sink, ThreadDelay, geometry, timing)?;

    startup_sequence(&mut lcd)?;
    for _ in 0..cycles {
        show_status(&mut lcd)?;
        sleep(Duration::from_secs(1));
    }

    lcd.close()?;
    Ok(())
}

fn startup_sequence(lcd: &mut dyn CharacterLcd) -> eyre::Result<()> {
    lcd.create_custom_character(0, &ARROW_RIGHT)?;
    lcd.create_custom_character(1, &RETURN_ARROW)?;
    lcd.write_text("lcdpack\nstarting...")?;

    let last_row = lcd.rows() - 1;
    {
        let mut bar = ProgressBar::new(&mut *lcd, last_row, CursorDirection::Right)?;
        for value in (0..=100).step_by(5) {
            bar.set_value(value)?;
            sleep(Duration::from_millis(30));
        }
    }

    lcd.display_text("\u{0}Ready", last_row, 0)?;
    sleep(Duration::from_millis(500));
    Ok(())
}

fn show_status(lcd: &mut dyn CharacterLcd) -> eyre::Result<()> {
    let columns = lcd.columns();
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let time = now.format(format_description!("[hour]:[minute]:[second]"))?;
    let uptime = System::uptime();

    let lines = [
        System::host_name().unwrap_or_else(|| UNKNOWN_STR.to_string()),
        time,
        System::kernel_version().unwrap_or_else(|| UNKNOWN_STR.to_string()),
        format!("up {}h{:02}m", uptime / 3600, uptime / 60 % 60),
    ];

    for (row, line) in lines.iter().take(lcd.rows()).enumerate() {
        let line: String = line.chars().take(columns).collect();
        lcd.display_text(&line, row, 0)?;
    }
    Ok(())
}
