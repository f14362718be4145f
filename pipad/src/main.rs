mod app;
mod config;
mod utils;

use crate::app::App;
use crate::config::Config;
use crate::utils::parse_pins;
use dotenv::dotenv;
use log::{debug, info};
use pipad_gpio::GpioDriver;
use pipad_gpio::gamepad::GamePad;
use pipad_gpio::raw::RawGpioDriver;
use std::env::var;
use std::thread;
use std::time::Duration;

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("PiPad starting...");

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };

    debug!("Initializing GPIO driver...");
    let gpio = RawGpioDriver::new_gpiomem()?;
    debug!("{:?} initialized.", gpio);

    let mut pad = GamePad::new();

    // Buttons are either on discrete pins or behind a shift register,
    // depending on which variable is set.
    if let Ok(pin_str) = var("PIPAD_BUTTON_PINS") {
        let pin_nos = parse_pins(&pin_str)?;
        info!("Buttons @ {:?}", pin_nos);

        let mut pins = Vec::with_capacity(pin_nos.len());
        for pin_no in pin_nos {
            pins.push(gpio.get_pin(pin_no)?);
        }
        pad.configure_pins(pins)?;
    } else {
        let pin_str = var("PIPAD_SHIFT_PINS")?;
        let pin_nos = parse_pins(&pin_str)?;
        let [data, clock, latch]: [usize; 3] = pin_nos
            .try_into()
            .map_err(|_| eyre::eyre!("Expected exactly 3 shift register pins (data, clock, latch)"))?;
        info!("Shift register @ Data: {}, Clock: {}, Latch: {}", data, clock, latch);

        pad.configure_shift_register(
            gpio.get_pin(data)?,
            gpio.get_pin(clock)?,
            gpio.get_pin(latch)?,
        )?;
    }

    info!("PiPad initialized.");

    let scan_interval = Duration::from_millis(config.scan_interval_ms);
    let ticks_per_read = config.ticks_per_read.max(1);
    let mut app = App::new(config, &pad);

    info!("Starting scan loop...");

    let mut tick: u32 = 0;
    loop {
        pad.scan()?;

        tick = tick.wrapping_add(1);
        if tick % ticks_per_read == 0 {
            app.update();
        }

        thread::sleep(scan_interval);
    }
}
