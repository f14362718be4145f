//! Software-implemented GPIO backend.
//!
//! Pins live entirely in memory. The driver keeps access to every pin's
//! state, so a harness can drive input levels and observe output levels
//! while the pin handles themselves are claimed elsewhere. Used by the
//! tests and for development off-target.

use crate::{GpioBias, GpioDirection, GpioDriver, GpioError, GpioPin, GpioResult};
use bitvec::vec::BitVec;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

const DRIVE_FLOATING: u8 = 0;
const DRIVE_LOW: u8 = 1;
const DRIVE_HIGH: u8 = 2;

#[derive(Debug, Default)]
struct SoftPinState {
    /// 0 = input, 1 = output.
    direction: AtomicU8,
    /// Matches the [GpioBias] variant order: 0 = none, 1 = pull-up, 2 = pull-down.
    bias: AtomicU8,
    /// Level driven onto the line from outside, [DRIVE_FLOATING] when released.
    drive: AtomicU8,
    output: AtomicBool,
    deinited: AtomicBool,
}

impl SoftPinState {
    fn direction(&self) -> GpioDirection {
        match self.direction.load(Ordering::Relaxed) {
            1 => GpioDirection::Output,
            _ => GpioDirection::Input,
        }
    }

    fn bias(&self) -> GpioBias {
        match self.bias.load(Ordering::Relaxed) {
            1 => GpioBias::PullUp,
            2 => GpioBias::PullDown,
            _ => GpioBias::None,
        }
    }

    /// Resolves the level currently on the line.
    ///
    /// An output reads back its own level. An input reads the externally
    /// driven level if there is one, otherwise the bias decides; a floating
    /// line with no pull reads low.
    fn level(&self) -> bool {
        if self.direction() == GpioDirection::Output {
            return self.output.load(Ordering::Relaxed);
        }
        match self.drive.load(Ordering::Relaxed) {
            DRIVE_LOW => false,
            DRIVE_HIGH => true,
            _ => matches!(self.bias(), GpioBias::PullUp),
        }
    }
}

pub struct SoftGpioDriver {
    pins: Vec<SoftPinState>,
    used_pins: BitVec<AtomicU8>,
}

impl SoftGpioDriver {
    pub fn new(count: usize) -> Self {
        Self {
            pins: (0..count).map(|_| SoftPinState::default()).collect(),
            used_pins: BitVec::repeat(false, count),
        }
    }

    /// Drives a level onto the line from outside, or releases it with `None`.
    ///
    /// Panics if the index is out of range.
    pub fn set_level(&self, index: usize, level: Option<bool>) {
        let drive = match level {
            None => DRIVE_FLOATING,
            Some(false) => DRIVE_LOW,
            Some(true) => DRIVE_HIGH,
        };
        self.pins[index].drive.store(drive, Ordering::Relaxed);
    }

    /// Observes the level currently on the line.
    ///
    /// Panics if the index is out of range.
    pub fn level(&self, index: usize) -> bool {
        self.pins[index].level()
    }

    /// Gets the current function of the line.
    ///
    /// Panics if the index is out of range.
    pub fn direction(&self, index: usize) -> GpioDirection {
        self.pins[index].direction()
    }

    /// Gets the current bias of the line.
    ///
    /// Panics if the index is out of range.
    pub fn bias(&self, index: usize) -> GpioBias {
        self.pins[index].bias()
    }

    /// Marks the pin as deinitialized. Handles to it keep their claim but
    /// report [GpioPin::is_deinited] and refuse further use.
    ///
    /// Panics if the index is out of range.
    pub fn deinit(&self, index: usize) {
        self.pins[index].deinited.store(true, Ordering::Relaxed);
    }
}

impl Debug for SoftGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SoftGpioDriver({})", self.pins.len())
    }
}

impl GpioDriver for SoftGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.pins.len())
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        if index >= self.pins.len() {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        self.used_pins.set_aliased(index, true);

        Ok(Box::new(SoftGpioPin {
            driver: self,
            pin_index: index,
        }))
    }
}

struct SoftGpioPin<'a> {
    driver: &'a SoftGpioDriver,
    pin_index: usize,
}

impl SoftGpioPin<'_> {
    fn state(&self) -> &SoftPinState {
        &self.driver.pins[self.pin_index]
    }

    fn check_alive(&self) -> GpioResult<()> {
        if self.is_deinited() {
            return Err(GpioError::Deinitialized);
        }
        Ok(())
    }
}

impl Debug for SoftGpioPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.driver, self.pin_index)
    }
}

impl GpioPin for SoftGpioPin<'_> {
    fn direction(&self) -> GpioDirection {
        self.state().direction()
    }

    fn set_direction(&mut self, direction: GpioDirection) -> GpioResult<()> {
        self.check_alive()?;
        let value = match direction {
            GpioDirection::Input => 0,
            GpioDirection::Output => 1,
        };
        self.state().direction.store(value, Ordering::Relaxed);
        Ok(())
    }

    fn supports_bias(&self) -> bool {
        true
    }

    fn bias(&self) -> GpioBias {
        self.state().bias()
    }

    fn set_bias(&mut self, bias: GpioBias) -> GpioResult<()> {
        self.check_alive()?;
        let value = match bias {
            GpioBias::None => 0,
            GpioBias::PullUp => 1,
            GpioBias::PullDown => 2,
        };
        self.state().bias.store(value, Ordering::Relaxed);
        Ok(())
    }

    fn read(&self) -> GpioResult<bool> {
        self.check_alive()?;
        Ok(self.state().level())
    }

    fn write(&self, value: bool) -> GpioResult<()> {
        self.check_alive()?;
        self.state().output.store(value, Ordering::Relaxed);
        Ok(())
    }

    fn is_deinited(&self) -> bool {
        self.state().deinited.load(Ordering::Relaxed)
    }
}

impl Drop for SoftGpioPin<'_> {
    fn drop(&mut self) {
        self.driver.used_pins.set_aliased(self.pin_index, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_are_exclusive_until_dropped() {
        let driver = SoftGpioDriver::new(4);

        let pin = driver.get_pin(2).unwrap();
        assert_eq!(driver.get_pin(2).unwrap_err(), GpioError::AlreadyInUse);
        drop(pin);
        assert!(driver.get_pin(2).is_ok());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let driver = SoftGpioDriver::new(4);
        assert_eq!(driver.get_pin(4).unwrap_err(), GpioError::InvalidArgument);
    }

    #[test]
    fn input_level_follows_drive_and_bias() {
        let driver = SoftGpioDriver::new(1);
        let mut pin = driver.get_pin(0).unwrap();

        pin.set_bias(GpioBias::PullUp).unwrap();
        assert!(pin.read().unwrap());
        driver.set_level(0, Some(false));
        assert!(!pin.read().unwrap());
        driver.set_level(0, None);
        assert!(pin.read().unwrap());

        pin.set_bias(GpioBias::PullDown).unwrap();
        assert!(!pin.read().unwrap());
        driver.set_level(0, Some(true));
        assert!(pin.read().unwrap());
    }

    #[test]
    fn output_level_is_observable() {
        let driver = SoftGpioDriver::new(1);
        let mut pin = driver.get_pin(0).unwrap();

        pin.set_direction(GpioDirection::Output).unwrap();
        pin.write(true).unwrap();
        assert!(driver.level(0));
        pin.write(false).unwrap();
        assert!(!driver.level(0));
    }

    #[test]
    fn deinited_pin_refuses_use() {
        let driver = SoftGpioDriver::new(1);
        let pin = driver.get_pin(0).unwrap();

        driver.deinit(0);
        assert!(pin.is_deinited());
        assert_eq!(pin.read().unwrap_err(), GpioError::Deinitialized);
        assert_eq!(pin.write(true).unwrap_err(), GpioError::Deinitialized);
    }
}
