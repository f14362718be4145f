use crate::{GpioBias, GpioDirection, GpioPin, GpioResult};
use std::thread::sleep;
use std::time::Duration;

/// Width of the latch and clock pulses driven on the shift register.
///
/// 1 µs is well above the setup and hold times of common 74HC165-class
/// parts; adjust for slower registers.
pub(crate) const PULSE_WIDTH: Duration = Duration::from_micros(1);

/// The three-wire interface of a parallel-load shift register holding up to
/// 8 button states.
///
/// The latch pin idles high and is pulsed low to capture the parallel
/// inputs into the register; the clock pin idles low and is pulsed high to
/// shift the next bit onto the data line.
#[derive(Debug)]
pub(crate) struct ShiftRegisterPins<'a> {
    data: Box<dyn GpioPin + 'a>,
    clock: Box<dyn GpioPin + 'a>,
    latch: Box<dyn GpioPin + 'a>,
}

impl<'a> ShiftRegisterPins<'a> {
    /// Binds the three pins to their roles: `data` becomes an input with no
    /// pull, `clock` an output driven low, `latch` an output driven high.
    pub(crate) fn new(
        mut data: Box<dyn GpioPin + 'a>,
        mut clock: Box<dyn GpioPin + 'a>,
        mut latch: Box<dyn GpioPin + 'a>,
    ) -> GpioResult<Self> {
        data.set_direction(GpioDirection::Input)?;
        if data.supports_bias() {
            data.set_bias(GpioBias::None)?;
        }
        clock.set_direction(GpioDirection::Output)?;
        clock.write(false)?;
        latch.set_direction(GpioDirection::Output)?;
        latch.write(true)?;
        Ok(Self { data, clock, latch })
    }

    /// Captures the current button levels into the register and shifts all
    /// 8 of them out.
    ///
    /// Bit `i` of the result is set when the `i`-th button reads low
    /// (buttons pull the line low when pressed); the first bit shifted out
    /// lands in bit 0. Inputs without a button wired read the idle level
    /// and contribute nothing.
    pub(crate) fn read_byte(&self) -> GpioResult<u8> {
        self.latch.write(false)?;
        sleep(PULSE_WIDTH);
        self.latch.write(true)?;
        sleep(PULSE_WIDTH);

        let mut sample = 0u8;
        for i in 0..8 {
            if !self.data.read()? {
                sample |= 1 << i;
            }
            self.clock.write(true)?;
            sleep(PULSE_WIDTH);
            self.clock.write(false)?;
            sleep(PULSE_WIDTH);
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamepad::GamePad;
    use std::cell::Cell;
    use std::fmt::{Debug, Formatter};
    use std::rc::Rc;
    use std::sync::atomic::{AtomicU8, Ordering};

    /// Simulated 74HC165: the latch pin's falling edge loads `buttons` into
    /// the internal buffer, the clock pin's rising edge shifts the buffer
    /// down, and the data pin reads the buffer's lowest bit. A set button
    /// bit pulls the data line low.
    #[derive(Debug, Default)]
    struct SimRegister {
        buttons: AtomicU8,
        buffer: AtomicU8,
    }

    impl SimRegister {
        fn set_buttons(&self, buttons: u8) {
            self.buttons.store(buttons, Ordering::Relaxed);
        }
    }

    #[derive(Debug)]
    enum Role {
        Data,
        Clock,
        Latch,
    }

    struct SimPin {
        register: Rc<SimRegister>,
        role: Role,
        direction: GpioDirection,
        level: Cell<bool>,
    }

    impl SimPin {
        fn new(register: Rc<SimRegister>, role: Role) -> Box<Self> {
            Box::new(Self {
                register,
                role,
                direction: GpioDirection::Input,
                level: Cell::new(false),
            })
        }
    }

    impl Debug for SimPin {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "SimPin({:?})", self.role)
        }
    }

    impl GpioPin for SimPin {
        fn direction(&self) -> GpioDirection {
            self.direction
        }

        fn set_direction(&mut self, direction: GpioDirection) -> GpioResult<()> {
            self.direction = direction;
            Ok(())
        }

        fn read(&self) -> GpioResult<bool> {
            match self.role {
                Role::Data => Ok(self.register.buffer.load(Ordering::Relaxed) & 1 == 0),
                _ => Ok(self.level.get()),
            }
        }

        fn write(&self, value: bool) -> GpioResult<()> {
            let previous = self.level.replace(value);
            match self.role {
                Role::Latch if previous && !value => {
                    let buttons = self.register.buttons.load(Ordering::Relaxed);
                    self.register.buffer.store(buttons, Ordering::Relaxed);
                }
                Role::Clock if !previous && value => {
                    let buffer = self.register.buffer.load(Ordering::Relaxed);
                    self.register.buffer.store(buffer >> 1, Ordering::Relaxed);
                }
                _ => {}
            }
            Ok(())
        }
    }

    fn sim_pad(buttons: u8) -> (Rc<SimRegister>, GamePad<'static>) {
        let register = Rc::new(SimRegister::default());
        register.set_buttons(buttons);

        let mut pad = GamePad::new();
        pad.configure_shift_register(
            SimPin::new(register.clone(), Role::Data),
            SimPin::new(register.clone(), Role::Clock),
            SimPin::new(register.clone(), Role::Latch),
        )
        .unwrap();

        (register, pad)
    }

    #[test]
    fn one_tick_accumulates_the_register_value() {
        let (_register, pad) = sim_pad(0b1011_0010);

        pad.scan().unwrap();

        assert_eq!(pad.take_pressed(), 0b1011_0010);
        assert_eq!(pad.take_pressed(), 0);
    }

    #[test]
    fn first_bit_shifted_out_is_bit_zero() {
        let (_register, pad) = sim_pad(0b0000_0001);

        pad.scan().unwrap();

        assert_eq!(pad.take_pressed(), 0b0000_0001);
    }

    #[test]
    fn unwired_high_bits_stay_zero() {
        // Only three buttons wired.
        let (_register, pad) = sim_pad(0b0000_0101);

        pad.scan().unwrap();

        assert_eq!(pad.take_pressed(), 0b0000_0101);
    }

    #[test]
    fn presses_accumulate_across_ticks() {
        let (register, pad) = sim_pad(0b0000_0001);

        pad.scan().unwrap();
        register.set_buttons(0b0000_0010);
        pad.scan().unwrap();

        assert_eq!(pad.take_pressed(), 0b0000_0011);
    }

    #[test]
    fn released_buttons_clear_after_read() {
        let (register, pad) = sim_pad(0b0000_1000);

        pad.scan().unwrap();
        assert_eq!(pad.take_pressed(), 0b0000_1000);

        register.set_buttons(0);
        pad.scan().unwrap();
        assert_eq!(pad.take_pressed(), 0);
    }
}
