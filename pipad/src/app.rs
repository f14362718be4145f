//! The module for the main app state and logic.

use crate::config::Config;
use crate::utils::MaskExt;
use log::{debug, info};
use pipad_gpio::gamepad::GamePad;

/// The main app state struct.
///
/// Consumes the scanner's accumulated mask at its own pace and reports
/// every button observed pressed since the previous read; the scanner keeps
/// latching presses in between.
pub struct App<'a> {
    /// The configuration for the app.
    config: Config,
    /// The button scanner being consumed.
    pad: &'a GamePad<'a>,
    /// Running press counts, index = bit position.
    presses: [u64; 8],
}

impl<'a> App<'a> {
    /// Creates a new instance of the App.
    pub fn new(config: Config, pad: &'a GamePad<'a>) -> App<'a> {
        App {
            config,
            pad,
            presses: [0; 8],
        }
    }

    /// Takes the accumulated mask and logs every button observed pressed
    /// since the previous read. Buttons still held show up again on the
    /// next read.
    pub fn update(&mut self) {
        let pressed = self.pad.take_pressed();
        if pressed == 0 {
            return;
        }

        debug!("Pressed mask: {:#010b}", pressed);
        for i in pressed.bits() {
            self.presses[i] += 1;
            info!("{} pressed ({} so far)", self.button_name(i), self.presses[i]);
        }
    }

    fn button_name(&self, index: usize) -> &str {
        self.config
            .button_names
            .get(index)
            .map(String::as_str)
            .unwrap_or("?")
    }
}
