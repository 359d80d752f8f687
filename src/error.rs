//! Error types for registration and per-unit operations.

use core::fmt;

/// Reasons a unit configuration fails calibration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// `flaps` was zero; the wheel needs at least one face.
    ZeroFlaps,
    /// `steps` was zero; a revolution needs at least one motor step.
    ZeroSteps,
    /// `home_tolerance` spans the full revolution, so every position would
    /// pass the home test and the window rejects nothing.
    WindowTooWide,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::ZeroFlaps => f.write_str("flap count is zero"),
            CalibrationError::ZeroSteps => f.write_str("step count is zero"),
            CalibrationError::WindowTooWide => {
                f.write_str("home tolerance spans the full revolution")
            }
        }
    }
}

/// Errors reported by display-level operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Registration would exceed [`MAX_UNITS`](crate::control::MAX_UNITS).
    CapacityExceeded,
    /// The supplied configuration failed calibration; no unit was registered.
    InvalidCalibration(CalibrationError),
    /// A per-unit operation named an index outside the registered range.
    /// Display state is unaffected.
    InvalidUnit,
}

impl From<CalibrationError> for Error {
    fn from(err: CalibrationError) -> Self {
        Error::InvalidCalibration(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CapacityExceeded => f.write_str("unit capacity exceeded"),
            Error::InvalidCalibration(err) => write!(f, "invalid calibration: {err}"),
            Error::InvalidUnit => f.write_str("unit index out of range"),
        }
    }
}
