// SPDX-License-Identifier: MIT

//! Display-wide controller: the unit table, the tick loop, and frame
//! serialization onto the register chain.
//!
//! [`Display`] owns every registered [`FlapUnit`], the frame bus, and the
//! home sensors. The host polls [`step`](Display::step) at its stepping
//! cadence; everything else is bookkeeping around that call. No allocation,
//! capacity is fixed at [`MAX_UNITS`].

use heapless::Vec;

use crate::control::config::UnitConfig;
use crate::control::unit::{FlapUnit, OutputLine, UnitStatus};
use crate::error::Error;
use crate::hw::{FrameBus, HomeSense};

/// Fixed unit capacity of one controller.
pub const MAX_UNITS: usize = 20;

/// Bytes in a full output frame: four units share each shift register.
pub const FRAME_BYTES: usize = MAX_UNITS.div_ceil(4);

/// Controller for an array of flap units behind one register chain.
pub struct Display<B, S> {
    bus: B,
    sensors: S,
    units: Vec<FlapUnit, MAX_UNITS>,
    /// Last frame that reached the chain, in wire order. `None` until the
    /// first successful transmission.
    last_frame: Option<Vec<u8, FRAME_BYTES>>,
    outputs_enabled: bool,
}

impl<B, S> Display<B, S>
where
    B: FrameBus,
    S: HomeSense,
{
    /// Take ownership of the bus and sensors, with chain outputs disabled
    /// until the first frame has been shifted out.
    pub fn new(mut bus: B, sensors: S) -> Self {
        bus.set_outputs_enabled(false);
        Self {
            bus,
            sensors,
            units: Vec::new(),
            last_frame: None,
            outputs_enabled: false,
        }
    }

    /// Register one unit and return its index.
    ///
    /// Registration is atomic: on error the unit table is unchanged.
    pub fn add_unit(&mut self, cfg: UnitConfig) -> Result<usize, Error> {
        if self.units.is_full() {
            return Err(Error::CapacityExceeded);
        }
        let cal = cfg.calibrate()?;
        let index = self.units.len();
        // Capacity was checked above.
        let _ = self.units.push(FlapUnit::new(cal));
        Ok(index)
    }

    /// Advance every unit by one tick and retransmit the frame if any
    /// output bit changed.
    ///
    /// Returns `Ok(true)` when every registered unit is homed and resting
    /// on its target after this tick. The call never blocks; the host polls
    /// it at the motor stepping cadence.
    ///
    /// A bus error leaves the frame pending, so the next call retransmits.
    /// Chain outputs are enabled once the first frame has gone out, keeping
    /// power-on register garbage off the coils.
    pub fn step(&mut self) -> Result<bool, B::Error> {
        for (index, unit) in self.units.iter_mut().enumerate() {
            // Only driving units sample their sensor.
            let sample = if unit.status() == UnitStatus::Idle {
                None
            } else {
                Some(self.sensors.level(index))
            };
            unit.tick(sample);
        }

        let idle = self.units.iter().all(|u| u.status() == UnitStatus::Idle);
        if self.units.is_empty() {
            return Ok(idle);
        }

        let frame = self.pack_frame();
        let dirty = match &self.last_frame {
            Some(sent) => sent[..] != frame[..],
            None => true,
        };
        if dirty {
            self.bus.write_frame(&frame)?;
            let first = self.last_frame.is_none();
            self.last_frame = Some(frame);
            if first && !self.outputs_enabled {
                self.bus.set_outputs_enabled(true);
                self.outputs_enabled = true;
            }
        }

        Ok(idle)
    }

    /// Command `unit` to show `flap`; indices past the last face wrap.
    pub fn set_flap(&mut self, unit: usize, flap: u8) -> Result<(), Error> {
        let unit = self.units.get_mut(unit).ok_or(Error::InvalidUnit)?;
        unit.set_flap(flap);
        Ok(())
    }

    /// Force one output line of `unit`, bypassing its coil sequencer.
    ///
    /// Meant for auxiliary signalling on idle units; the next [`step`]
    /// carries the change. A driving unit overwrites the line on its next
    /// tick.
    ///
    /// [`step`]: Display::step
    pub fn set_out(&mut self, unit: usize, line: OutputLine, level: bool) -> Result<(), Error> {
        let unit = self.units.get_mut(unit).ok_or(Error::InvalidUnit)?;
        unit.set_out(line, level);
        Ok(())
    }

    /// True when `unit` is homed and resting on its target. Unknown indices
    /// read as not done.
    pub fn done(&self, unit: usize) -> bool {
        self.units
            .get(unit)
            .map(|u| u.status() == UnitStatus::Idle)
            .unwrap_or(false)
    }

    /// True when every registered unit is done.
    pub fn all_done(&self) -> bool {
        self.units.iter().all(|u| u.status() == UnitStatus::Idle)
    }

    /// Drop every unit's home reference and restart the search display-wide.
    /// Configuration and targets are untouched.
    pub fn reset(&mut self) {
        for unit in self.units.iter_mut() {
            unit.reset();
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn status(&self, unit: usize) -> Option<UnitStatus> {
        self.units.get(unit).map(FlapUnit::status)
    }

    /// True once `unit` has accepted a home edge. Unknown indices read as
    /// not homed.
    pub fn is_homed(&self, unit: usize) -> bool {
        self.units
            .get(unit)
            .map(FlapUnit::is_homed)
            .unwrap_or(false)
    }

    /// Current position of `unit` in milli-steps from flap 0.
    pub fn position(&self, unit: usize) -> Option<u32> {
        self.units.get(unit).map(FlapUnit::position)
    }

    /// Commanded position of `unit` in milli-steps from flap 0.
    pub fn target(&self, unit: usize) -> Option<u32> {
        self.units.get(unit).map(FlapUnit::target)
    }

    #[inline]
    pub fn outputs_enabled(&self) -> bool {
        self.outputs_enabled
    }

    /// Override the chain's output-enable line, e.g. to blank the display.
    pub fn set_outputs_enabled(&mut self, enabled: bool) {
        self.bus.set_outputs_enabled(enabled);
        self.outputs_enabled = enabled;
    }

    /// Tear down the controller and release the bus and sensors.
    pub fn free(self) -> (B, S) {
        (self.bus, self.sensors)
    }

    /// Serialize every unit's output bits in wire order.
    ///
    /// Unit `4j + i` occupies bits `2i` (out0) and `2i + 1` (out1) of
    /// logical byte `j`; bytes go out farthest register first, so register 0
    /// next to the controller ends up holding units 0 through 3.
    fn pack_frame(&self) -> Vec<u8, FRAME_BYTES> {
        let mut bytes = [0u8; FRAME_BYTES];
        for (index, unit) in self.units.iter().enumerate() {
            let (out0, out1) = unit.outputs();
            let shift = 2 * (index % 4);
            if out0 {
                bytes[index / 4] |= 1 << shift;
            }
            if out1 {
                bytes[index / 4] |= 1 << (shift + 1);
            }
        }

        let used = self.units.len().div_ceil(4);
        let mut frame = Vec::new();
        for &byte in bytes[..used].iter().rev() {
            // Frame capacity covers the full unit capacity.
            let _ = frame.push(byte);
        }
        frame
    }
}
