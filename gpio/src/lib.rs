pub mod gamepad;
pub mod raw;
pub mod soft;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("pin has been deinitialized")]
    Deinitialized,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO pins available.
    fn count(&self) -> GpioResult<usize>;

    /// Claims the GPIO pin at the given index.
    ///
    /// The handle holds exclusive use of the line until it is dropped.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the index is out of range.
    /// - `GpioError::AlreadyInUse` if the pin is claimed by another handle.
    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>>;
}

/// Specifies the active level of a GPIO line.
///
/// By default, the active level is high.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioActiveLevel {
    #[default] High,
    Low,
}

impl GpioActiveLevel {
    /// Gets the logical state for a raw line level based on the active level.
    pub fn get_state(&self, value: bool) -> bool {
        match self {
            GpioActiveLevel::High => value,
            GpioActiveLevel::Low => !value,
        }
    }
}

/// Specifies the function of a GPIO pin.
///
/// By default, pins are inputs.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioDirection {
    #[default] Input,
    Output,
}

/// Specifies the bias of a GPIO pin.
///
/// You can use this to enable pull-up or pull-down resistors.
/// These should work in both input and output modes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioBias {
    #[default] None,
    PullUp,
    PullDown,
}

/// A single GPIO pin, claimed exclusively from a [GpioDriver].
///
/// The same handle covers both functions: it can be switched between input
/// and output at any time with [GpioPin::set_direction], and keeps its claim
/// on the underlying line until dropped.
pub trait GpioPin: Debug {
    /// Gets the current function of the pin.
    fn direction(&self) -> GpioDirection;
    /// Sets the function of the pin.
    fn set_direction(&mut self, direction: GpioDirection) -> GpioResult<()>;

    /// Gets whether the pin supports bias (pull-up/pull-down resistors).
    fn supports_bias(&self) -> bool {
        false
    }
    /// Gets the bias of the pin.
    fn bias(&self) -> GpioBias {
        GpioBias::None
    }
    /// Sets the bias of the pin.
    ///
    /// # Errors
    /// - `GpioError::NotSupported` if the pin does not support bias.
    fn set_bias(&mut self, _bias: GpioBias) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }
    fn with_bias(mut self, bias: GpioBias) -> GpioResult<Self>
    where
        Self: Sized,
    {
        self.set_bias(bias)?;
        Ok(self)
    }

    /// Reads the current level of the line. `true` is high.
    fn read(&self) -> GpioResult<bool>;

    /// Writes the output level of the line. `true` is high.
    ///
    /// Only takes effect while the pin function is output.
    fn write(&self, value: bool) -> GpioResult<()>;

    /// Gets whether the handle has been deinitialized and can no longer be used.
    fn is_deinited(&self) -> bool {
        false
    }
}
