// SPDX-License-Identifier: MIT

//! Unit configuration and the constants derived from it at registration.
//!
//! A [`UnitConfig`] describes the mechanics of one flap wheel the way the
//! installer sees them: polarities, geometry, sensor placement. Calibration
//! turns that into the read-only [`Calibration`] record the state machine
//! runs on, rejecting geometry that cannot work.

use crate::error::CalibrationError;

/// Position arithmetic runs in thousandths of a motor step, so flap targets
/// keep sub-step precision without floating point.
pub const MILLISTEPS_PER_STEP: u32 = 1000;

/// Whether a motor line energizes its coil active-high or active-low on the
/// board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    High,
    Low,
}

/// Sensor transition that marks the home reference.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

/// Rotation sense of the flap wheel, selecting the order the coil sequence
/// is played in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Reverse,
}

/// User-facing description of one flap unit, supplied once at registration.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitConfig {
    /// Polarity that energizes the motor lines.
    pub motor_level: ActiveLevel,
    /// Which sensor transition counts as the home edge.
    pub home_edge: Edge,
    /// Order the coil sequence is played in.
    pub direction: Direction,
    /// Raw sensor levels at or above this value read as active.
    pub sensor_threshold: u8,
    /// Number of flap faces on the wheel.
    pub flaps: u8,
    /// Motor steps per full wheel revolution.
    pub steps: u16,
    /// Steps from flap 0 to the sensed home edge.
    pub home_offset: u16,
    /// Allowed step slack to either side of the home edge.
    pub home_tolerance: u16,
}

impl UnitConfig {
    /// Derive the internal constants, rejecting degenerate geometry.
    ///
    /// `home_offset` values at or past one revolution are wrapped into it.
    pub fn calibrate(&self) -> Result<Calibration, CalibrationError> {
        if self.flaps == 0 {
            return Err(CalibrationError::ZeroFlaps);
        }
        if self.steps == 0 {
            return Err(CalibrationError::ZeroSteps);
        }

        let steps = u32::from(self.steps);
        // The window is 2 * tolerance + 1 steps wide. At a full revolution
        // or more, every position passes the home test.
        if 2 * u32::from(self.home_tolerance) + 1 >= steps {
            return Err(CalibrationError::WindowTooWide);
        }

        let offset = u32::from(self.home_offset) % steps;
        let tolerance = u32::from(self.home_tolerance);

        Ok(Calibration {
            motor_level: self.motor_level,
            home_edge: self.home_edge,
            direction: self.direction,
            sensor_threshold: self.sensor_threshold,
            flaps: self.flaps,
            home_start: ((offset + steps - tolerance) % steps) as u16,
            home_end: ((offset + tolerance) % steps) as u16,
            home_reference: offset * MILLISTEPS_PER_STEP,
            millisteps_per_flap: steps * MILLISTEPS_PER_STEP / u32::from(self.flaps),
            millisteps_per_rev: steps * MILLISTEPS_PER_STEP,
        })
    }
}

/// Read-only constants derived from a [`UnitConfig`].
///
/// `millisteps_per_flap` is truncated, so `flaps * millisteps_per_flap` can
/// fall short of a revolution by up to `flaps - 1` milli-steps; the periodic
/// re-homing snap absorbs the accumulated error.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    motor_level: ActiveLevel,
    home_edge: Edge,
    direction: Direction,
    sensor_threshold: u8,
    flaps: u8,
    home_start: u16,
    home_end: u16,
    home_reference: u32,
    millisteps_per_flap: u32,
    millisteps_per_rev: u32,
}

impl Calibration {
    #[inline]
    pub fn motor_level(&self) -> ActiveLevel {
        self.motor_level
    }

    #[inline]
    pub fn home_edge(&self) -> Edge {
        self.home_edge
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn sensor_threshold(&self) -> u8 {
        self.sensor_threshold
    }

    #[inline]
    pub fn flaps(&self) -> u8 {
        self.flaps
    }

    /// Home-detection window bounds in step space, inclusive on both ends.
    /// `start` may exceed `end` when the window wraps past step 0.
    #[inline]
    pub fn home_window(&self) -> (u16, u16) {
        (self.home_start, self.home_end)
    }

    /// Position the wheel is snapped to when a home edge is accepted.
    #[inline]
    pub fn home_reference(&self) -> u32 {
        self.home_reference
    }

    #[inline]
    pub fn millisteps_per_flap(&self) -> u32 {
        self.millisteps_per_flap
    }

    #[inline]
    pub fn millisteps_per_rev(&self) -> u32 {
        self.millisteps_per_rev
    }

    /// Whether a step index falls inside the home-detection window.
    pub fn contains_home(&self, step: u16) -> bool {
        if self.home_start <= self.home_end {
            self.home_start <= step && step <= self.home_end
        } else {
            step >= self.home_start || step <= self.home_end
        }
    }
}
