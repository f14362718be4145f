//! Gamepad button scanner.
//!
//! Buttons are sampled by a short periodic tick that runs independently of
//! the consuming code, so de-bouncing stays consistent and short presses are
//! not missed while the consumer is busy or sleeping. Every sample is
//! OR-ed into a latched mask; [GamePad::take_pressed] hands the mask to the
//! consumer and clears it in one atomic step.
//!
//! Buttons can be wired to discrete GPIO pins, or behind a parallel-load
//! shift register read over three wires.

mod shift;

use crate::{GpioActiveLevel, GpioBias, GpioDirection, GpioError, GpioPin, GpioResult};
use log::debug;
use shift::ShiftRegisterPins;
use std::sync::atomic::{AtomicU8, Ordering};

/// The maximum number of buttons a scanner can watch, one per mask bit.
pub const MAX_BUTTONS: usize = 8;

/// The latched pressed-button mask shared between the tick path and the
/// reader.
///
/// The tick path is the only writer and the reader clears the mask with a
/// single atomic exchange, so a tick landing in the middle of a read either
/// happens entirely before or entirely after it. No bit can be dropped by a
/// concurrent clear, and none can be returned twice.
#[derive(Debug, Default)]
pub struct PressedMask(AtomicU8);

impl PressedMask {
    /// ORs a sample into the mask.
    pub fn accumulate(&self, bits: u8) {
        self.0.fetch_or(bits, Ordering::Relaxed);
    }

    /// Returns the accumulated mask and resets it to zero in one step.
    pub fn take(&self) -> u8 {
        self.0.swap(0, Ordering::Relaxed)
    }

    fn clear(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

/// A single configured button slot: the claimed pin and the level that
/// counts as pressed, fixed when the slot is configured.
#[derive(Debug)]
struct PadInput<'a> {
    pin: Box<dyn GpioPin + 'a>,
    active: GpioActiveLevel,
}

#[derive(Debug, Default)]
enum ScanMode<'a> {
    #[default]
    Idle,
    Pins(Vec<PadInput<'a>>),
    ShiftRegister(ShiftRegisterPins<'a>),
}

/// Scans buttons for presses.
///
/// One scanner instance exists per running program; it owns its pin handles
/// for the lifetime of the current configuration and releases them on
/// reconfiguration or [GamePad::reset]. The periodic tick source calls
/// [GamePad::scan]; consumer code calls [GamePad::take_pressed] whenever it
/// gets around to it.
///
/// Reconfiguration takes `&mut self` while the scan step borrows `&self`,
/// so a tick can never observe a half-updated set of sources.
#[derive(Debug, Default)]
pub struct GamePad<'a> {
    mode: ScanMode<'a>,
    pressed: PressedMask,
}

impl<'a> GamePad<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures scanning of up to [MAX_BUTTONS] discrete pins. The slot
    /// order is the bit order of the mask returned by
    /// [GamePad::take_pressed].
    ///
    /// Each pin is switched to input if it is not one already, and gets a
    /// pull-up applied if it has no pull configured. A slot counts as
    /// pressed on low level unless its pull ends up pull-down, in which
    /// case it counts as pressed on high.
    ///
    /// Replaces any previous configuration, releasing its pins first.
    /// Presses already latched stay latched until the next read.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `pins` is empty or holds more than
    ///   [MAX_BUTTONS] handles.
    /// - `GpioError::Deinitialized` if any handle has been deinitialized.
    ///
    /// On error the previous configuration is left untouched.
    pub fn configure_pins(&mut self, pins: Vec<Box<dyn GpioPin + 'a>>) -> GpioResult<()> {
        if pins.is_empty() || pins.len() > MAX_BUTTONS {
            return Err(GpioError::InvalidArgument);
        }
        if pins.iter().any(|pin| pin.is_deinited()) {
            return Err(GpioError::Deinitialized);
        }

        // Release the previous pins before touching the new ones.
        self.mode = ScanMode::Idle;

        let mut inputs = Vec::with_capacity(pins.len());
        for mut pin in pins {
            if pin.direction() != GpioDirection::Input {
                pin.set_direction(GpioDirection::Input)?;
            }
            if pin.supports_bias() && pin.bias() == GpioBias::None {
                pin.set_bias(GpioBias::PullUp)?;
            }
            let active = match pin.bias() {
                GpioBias::PullDown => GpioActiveLevel::High,
                _ => GpioActiveLevel::Low,
            };
            inputs.push(PadInput { pin, active });
        }
        debug!("Scanning {} buttons on discrete pins.", inputs.len());
        self.mode = ScanMode::Pins(inputs);
        Ok(())
    }

    /// Configures scanning of up to [MAX_BUTTONS] buttons behind a
    /// parallel-load shift register, read over the three given pins.
    ///
    /// `data` is switched to input with no pull, `clock` to output idle low,
    /// `latch` to output idle high. Buttons behind the register are always
    /// pressed-on-low. Bit 0 of the mask is the first bit shifted out.
    ///
    /// Replaces any previous configuration, releasing its pins first.
    /// Presses already latched stay latched until the next read.
    ///
    /// # Errors
    /// - `GpioError::Deinitialized` if any handle has been deinitialized,
    ///   in which case the previous configuration is left untouched.
    pub fn configure_shift_register(
        &mut self,
        data: Box<dyn GpioPin + 'a>,
        clock: Box<dyn GpioPin + 'a>,
        latch: Box<dyn GpioPin + 'a>,
    ) -> GpioResult<()> {
        if data.is_deinited() || clock.is_deinited() || latch.is_deinited() {
            return Err(GpioError::Deinitialized);
        }

        // Release the previous pins before touching the new ones.
        self.mode = ScanMode::Idle;

        self.mode = ScanMode::ShiftRegister(ShiftRegisterPins::new(data, clock, latch)?);
        debug!("Scanning buttons behind a shift register.");
        Ok(())
    }

    /// Runs one scan step, sampling every configured button and latching
    /// the pressed ones. Called by the periodic tick source; does nothing
    /// while unconfigured.
    ///
    /// A pin failure here means a handle that was valid at configuration
    /// time stopped working underneath us; the error propagates to the tick
    /// source, which should treat it as fatal.
    pub fn scan(&self) -> GpioResult<()> {
        let sample = match &self.mode {
            ScanMode::Idle => return Ok(()),
            ScanMode::Pins(inputs) => {
                let mut sample = 0u8;
                for (i, input) in inputs.iter().enumerate() {
                    let level = input.pin.read()?;
                    if input.active.get_state(level) {
                        sample |= 1 << i;
                    }
                }
                sample
            }
            ScanMode::ShiftRegister(pins) => pins.read_byte()?,
        };
        self.pressed.accumulate(sample);
        Ok(())
    }

    /// Returns the mask of buttons pressed since the last call and clears
    /// it, in one atomic step.
    ///
    /// Bit `i` corresponds to the `i`-th configured button; bits above the
    /// configured count are always zero. Buttons still held at read time
    /// show up again on the next read, since every tick re-latches them.
    /// Returns zero while unconfigured or when nothing was pressed.
    pub fn take_pressed(&self) -> u8 {
        self.pressed.take()
    }

    /// Disables scanning, releasing all owned pins and clearing the latched
    /// mask. Idempotent.
    pub fn reset(&mut self) {
        self.mode = ScanMode::Idle;
        self.pressed.clear();
    }
}
