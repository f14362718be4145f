use crate::{GpioBias, GpioDirection, GpioDriver, GpioError, GpioPin, GpioResult};
use bitvec::vec::BitVec;
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::sync::atomic::AtomicU8;

pub struct RawGpioDriver {
    mmap: MmapRaw,
    used_pins: BitVec<AtomicU8>,
}

impl RawGpioDriver {
    // #[cfg(target_pointer_width = "64")]
    // const GPIO_BASE: u32 = 0xFE200000;
    const GPIO_BASE: u32 = 0x3F200000;

    const PIN_COUNT: usize = 58;

    fn create(path: &str) -> GpioResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;

        let mmap = MmapOptions::new()
                .offset(Self::GPIO_BASE as u64)
                .len(4096)
                .map_raw(&file)?;

        Ok(RawGpioDriver {
            mmap,
            used_pins: BitVec::repeat(false, Self::PIN_COUNT),
        })
    }

    pub fn new_gpiomem() -> GpioResult<Self> {
        Self::create("/dev/gpiomem")
    }

    pub fn new_mem() -> GpioResult<Self> {
        Self::create("/dev/mem")
    }

    pub(crate) fn raw_get_pin_function(&self, pin_index: usize) -> GpioResult<u32> {
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        let mmap = self.mmap.as_ptr() as *const u32;
        // GPFSELn register
        let register_ptr = unsafe { mmap.add(pin_index / 10) };
        let shift = (pin_index % 10) * 3;

        let register_value = unsafe { register_ptr.read_volatile() };
        let value = (register_value >> shift) & 0b111;
        // trace!("Read pin function: pin_index={} value={}", pin_index, value);
        Ok(value)
    }

    pub(crate) fn raw_set_pin_function(&self, pin_index: usize, function: u8) -> GpioResult<()> {
        if function > 0b111 {
            return Err(GpioError::InvalidArgument);
        }

        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        // GPFSELn register
        let register_ptr = unsafe { mmap.add(pin_index / 10) };
        let shift = (pin_index % 10) * 3;

        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b111 << shift); // Clear the bits for this pin
        register_value |= (function as u32) << shift;
        unsafe { register_ptr.write_volatile(register_value) };

        Ok(())
    }

    pub(crate) fn raw_set_pin_output(&self, pin_index: usize, high: bool) -> GpioResult<()> {
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        // GPSETn/GPCLRn register
        let register_ptr = unsafe { mmap.add(if high { 0x1c / 4 } else { 0x28 / 4 } + pin_index / 32) };
        let shift = pin_index % 32;

        unsafe { register_ptr.write_volatile(1 << shift) };

        Ok(())
    }

    pub(crate) fn raw_get_pin_level(&self, pin_index: usize) -> GpioResult<bool> {
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        let mmap = self.mmap.as_ptr() as *const u32;
        // GPLEVn register
        let register_ptr = unsafe { mmap.add((0x34 / 4) + pin_index / 32) };
        let shift = pin_index % 32;

        let register_value = unsafe { register_ptr.read_volatile() };
        let level = (register_value >> shift) & 1;
        // trace!("Read pin level: pin_index={} level={}", pin_index, level);
        Ok(level != 0)
    }

    pub(crate) fn raw_set_bias(&self, pin_index: usize, bias: GpioBias) -> GpioResult<()> {
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        let bias_value = match bias {
            GpioBias::None => 0b00,
            GpioBias::PullUp => 0b01,
            GpioBias::PullDown => 0b10,
        };

        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        // GPIO_PUP_PDN_CNTRL_REGn register (yes that is a long name)
        let register_ptr = unsafe { mmap.add(0xE4 / 4 + pin_index / 16) };
        let shift = (pin_index % 16) * 2;
        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b11 << shift); // Clear the bits for this pin
        register_value |= bias_value << shift; // Set the bias

        unsafe { register_ptr.write_volatile(register_value) };

        Ok(())
    }

    pub(crate) fn raw_get_bias(&self, pin_index: usize) -> GpioResult<GpioBias> {
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        let mmap = self.mmap.as_ptr() as *const u32;
        // GPIO_PUP_PDN_CNTRL_REGn register (yes that is a long name)
        let register_ptr = unsafe { mmap.add(0xE4 / 4 + pin_index / 16) };
        let shift = (pin_index % 16) * 2;
        let register_value = unsafe { register_ptr.read_volatile() };
        let bias_value = (register_value >> shift) & 0b11;

        let bias = match bias_value {
            0b00 => GpioBias::None,
            0b01 => GpioBias::PullUp,
            0b10 => GpioBias::PullDown,
            _ => return Err(GpioError::NotSupported),
        };
        Ok(bias)
    }

    pub(crate) fn raw_reset(&self, pin_index: usize) -> GpioResult<()> {
        self.raw_set_pin_function(pin_index, 0)?;
        self.raw_set_bias(pin_index, GpioBias::None)?;
        self.raw_set_pin_output(pin_index, false)?;
        Ok(())
    }
}

impl Debug for RawGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawGpioDriver({:?})", self.mmap.as_ptr().addr())
    }
}

impl GpioDriver for RawGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(Self::PIN_COUNT)
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        if index >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        self.used_pins.set_aliased(index, true);
        self.raw_reset(index)?;

        Ok(Box::new(RawGpioPin {
            driver: self,
            pin_index: index,
        }))
    }
}

struct RawGpioPin<'a> {
    driver: &'a RawGpioDriver,
    pin_index: usize,
}

impl Debug for RawGpioPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.driver, self.pin_index)
    }
}

impl GpioPin for RawGpioPin<'_> {
    fn direction(&self) -> GpioDirection {
        match self.driver.raw_get_pin_function(self.pin_index) {
            Ok(1) => GpioDirection::Output,
            _ => GpioDirection::Input,
        }
    }

    fn set_direction(&mut self, direction: GpioDirection) -> GpioResult<()> {
        let function = match direction {
            GpioDirection::Input => 0,
            GpioDirection::Output => 1,
        };
        self.driver.raw_set_pin_function(self.pin_index, function)
    }

    fn supports_bias(&self) -> bool {
        true
    }

    fn bias(&self) -> GpioBias {
        self.driver.raw_get_bias(self.pin_index).unwrap_or(GpioBias::None)
    }

    fn set_bias(&mut self, bias: GpioBias) -> GpioResult<()> {
        self.driver.raw_set_bias(self.pin_index, bias)?;
        Ok(())
    }

    fn read(&self) -> GpioResult<bool> {
        self.driver.raw_get_pin_level(self.pin_index)
    }

    fn write(&self, value: bool) -> GpioResult<()> {
        self.driver.raw_set_pin_output(self.pin_index, value)
    }
}

impl Drop for RawGpioPin<'_> {
    fn drop(&mut self) {
        _ = self.driver.raw_set_pin_function(self.pin_index, 0); // Back to input
        self.driver.used_pins.set_aliased(self.pin_index, false);
    }
}
