// SPDX-License-Identifier: MIT

//! Per-unit homing and motion state machine.
//!
//! One [`FlapUnit`] tracks a single wheel. Its state advances only through
//! [`tick`](FlapUnit::tick), one coil step per call: the unit drives whenever
//! it is unhomed or short of its target, and rests with both motor lines
//! released otherwise. Position is kept in milli-steps and only ever moves
//! forward; the flap mechanism is one-way.

use crate::control::config::{ActiveLevel, Calibration, Direction, Edge, MILLISTEPS_PER_STEP};

/// What a unit is doing right now.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnitStatus {
    /// No confirmed home reference; the wheel advances while watching for
    /// its home edge.
    Homing,
    /// Homed and advancing toward the commanded flap.
    Moving,
    /// Homed with the wheel resting on its target.
    Idle,
}

/// Selects one of a unit's two physical output lines.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputLine {
    Out0,
    Out1,
}

/// Debounced edge detector over the last two binarized sensor samples.
///
/// A transition is reported only once the previous level has held for two
/// consecutive samples. A fresh detector reports nothing until it has real
/// history, so a sensor that powers up active cannot fake a home edge.
#[derive(Copy, Clone, Debug, Default)]
struct EdgeDetector {
    older: bool,
    newer: bool,
    filled: u8,
}

impl EdgeDetector {
    fn observe(&mut self, level: bool) -> Option<Edge> {
        let edge = if self.filled == 2 && self.older == self.newer && level != self.newer {
            Some(if level { Edge::Rising } else { Edge::Falling })
        } else {
            None
        };
        self.older = self.newer;
        self.newer = level;
        if self.filled < 2 {
            self.filled += 1;
        }
        edge
    }

    fn clear(&mut self) {
        self.filled = 0;
    }
}

/// One flap wheel: its calibration plus the mutable motion state.
#[derive(Debug)]
pub struct FlapUnit {
    cal: Calibration,
    homed: bool,
    driving: bool,
    edges: EdgeDetector,
    phase: u8,
    out0: bool,
    out1: bool,
    pos: u32,
    target: u32,
}

impl FlapUnit {
    /// Create a unit at position zero, unhomed, seeking flap 0.
    pub fn new(cal: Calibration) -> Self {
        Self {
            cal,
            homed: false,
            driving: false,
            edges: EdgeDetector::default(),
            phase: 0,
            out0: false,
            out1: false,
            pos: 0,
            target: 0,
        }
    }

    /// Advance the state machine by one tick.
    ///
    /// `sample` is the raw home-sensor level for this tick; pass `None` when
    /// the sensor was not read (idle units are not sampled). On a driving
    /// tick the coil phase advances, position moves one step forward, and a
    /// home edge accepted inside the calibrated window snaps the position to
    /// the home reference.
    pub fn tick(&mut self, sample: Option<u8>) {
        if self.status() == UnitStatus::Idle {
            // Release the coils on the first idle tick, then leave the
            // output bits alone so force-set values stick.
            if self.driving {
                self.driving = false;
                self.out0 = self.energize(false);
                self.out1 = self.energize(false);
            }
            return;
        }

        self.driving = true;
        self.phase = (self.phase + 1) & 0b11;
        let (out0, out1) = self.phase_outputs();
        self.out0 = out0;
        self.out1 = out1;
        self.advance_position();

        if let Some(raw) = sample {
            let level = raw >= self.cal.sensor_threshold();
            if self.edges.observe(level) == Some(self.cal.home_edge()) {
                let step = (self.pos / MILLISTEPS_PER_STEP) as u16;
                if self.cal.contains_home(step) {
                    self.pos = self.cal.home_reference();
                    self.homed = true;
                }
            }
        }
    }

    /// Retarget the unit to a flap face. Indices past the last face wrap.
    ///
    /// An unhomed unit keeps searching and heads for the new target once a
    /// home edge is accepted.
    pub fn set_flap(&mut self, flap: u8) {
        let face = u32::from(flap % self.cal.flaps());
        self.target = face * self.cal.millisteps_per_flap();
    }

    /// Force one output line, bypassing the coil sequencer.
    ///
    /// The value holds while the unit is idle; a driving unit overwrites the
    /// line on its next tick.
    pub fn set_out(&mut self, line: OutputLine, level: bool) {
        match line {
            OutputLine::Out0 => self.out0 = level,
            OutputLine::Out1 => self.out1 = level,
        }
    }

    /// Drop the home reference and restart the edge search.
    ///
    /// Position, target, and phase are kept; the next tick resumes driving.
    pub fn reset(&mut self) {
        self.homed = false;
        self.edges.clear();
    }

    #[inline]
    pub fn status(&self) -> UnitStatus {
        if !self.homed {
            UnitStatus::Homing
        } else if self.pos != self.target {
            UnitStatus::Moving
        } else {
            UnitStatus::Idle
        }
    }

    #[inline]
    pub fn is_homed(&self) -> bool {
        self.homed
    }

    /// Current absolute position in milli-steps from flap 0.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Commanded position in milli-steps from flap 0.
    #[inline]
    pub fn target(&self) -> u32 {
        self.target
    }

    /// The two physical output bits as they go into the frame.
    #[inline]
    pub fn outputs(&self) -> (bool, bool) {
        (self.out0, self.out1)
    }

    #[inline]
    pub fn calibration(&self) -> &Calibration {
        &self.cal
    }

    /// Move one step forward, landing exactly on the target when the
    /// remaining distance is within one step.
    fn advance_position(&mut self) {
        let rev = self.cal.millisteps_per_rev();
        if self.homed {
            let remaining = if self.target >= self.pos {
                self.target - self.pos
            } else {
                self.target + rev - self.pos
            };
            if remaining <= MILLISTEPS_PER_STEP {
                self.pos = self.target;
                return;
            }
        }
        self.pos = (self.pos + MILLISTEPS_PER_STEP) % rev;
    }

    /// Map the phase counter onto the two coil lines.
    ///
    /// The forward sequence is the Gray cycle (0,0) (1,0) (1,1) (0,1), so
    /// exactly one line changes per tick; `Direction::Reverse` plays it
    /// backwards.
    fn phase_outputs(&self) -> (bool, bool) {
        let index = match self.cal.direction() {
            Direction::Forward => self.phase,
            Direction::Reverse => (4 - self.phase) & 0b11,
        };
        let (a, b) = match index {
            0 => (false, false),
            1 => (true, false),
            2 => (true, true),
            _ => (false, true),
        };
        (self.energize(a), self.energize(b))
    }

    /// Translate a logical drive level into the physical line level.
    fn energize(&self, logical: bool) -> bool {
        match self.cal.motor_level() {
            ActiveLevel::High => logical,
            ActiveLevel::Low => !logical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::config::UnitConfig;

    fn config() -> UnitConfig {
        UnitConfig {
            motor_level: ActiveLevel::High,
            home_edge: Edge::Rising,
            direction: Direction::Forward,
            sensor_threshold: 128,
            flaps: 4,
            steps: 200,
            home_offset: 0,
            home_tolerance: 5,
        }
    }

    fn unit(cfg: UnitConfig) -> FlapUnit {
        FlapUnit::new(cfg.calibrate().unwrap())
    }

    fn run(u: &mut FlapUnit, ticks: usize, sample: u8) {
        for _ in 0..ticks {
            u.tick(Some(sample));
        }
    }

    /// Drive a default-config unit through a clean low, low, high homing
    /// sequence; with offset 0 the home edge at step 3 snaps it straight
    /// onto flap 0 and it comes to rest.
    fn homed_unit() -> FlapUnit {
        let mut u = unit(config());
        run(&mut u, 2, 0);
        u.tick(Some(255));
        assert_eq!(u.status(), UnitStatus::Idle);
        u
    }

    #[test]
    fn detector_needs_two_samples_of_history() {
        let mut d = EdgeDetector::default();
        assert_eq!(d.observe(true), None);
        assert_eq!(d.observe(true), None);
        assert_eq!(d.observe(false), Some(Edge::Falling));
        // One stable sample is not enough to rearm.
        assert_eq!(d.observe(true), None);
    }

    #[test]
    fn detector_rising_after_stable_low() {
        let mut d = EdgeDetector::default();
        assert_eq!(d.observe(false), None);
        assert_eq!(d.observe(false), None);
        assert_eq!(d.observe(true), Some(Edge::Rising));
    }

    #[test]
    fn fresh_unit_is_homing_even_at_target() {
        let u = unit(config());
        assert_eq!(u.status(), UnitStatus::Homing);
        assert_eq!(u.position(), 0);
        assert_eq!(u.target(), 0);
    }

    #[test]
    fn homes_on_edge_inside_window() {
        let mut u = unit(UnitConfig {
            home_offset: 2,
            home_tolerance: 2,
            ..config()
        });
        run(&mut u, 2, 0);
        assert!(!u.is_homed());
        // Third tick lands on step 3, inside the [0, 4] window.
        u.tick(Some(255));
        assert!(u.is_homed());
        assert_eq!(u.position(), 2_000);
    }

    #[test]
    fn sensor_stuck_active_never_homes() {
        let mut u = unit(config());
        run(&mut u, 500, 255);
        assert!(!u.is_homed());
        assert_eq!(u.status(), UnitStatus::Homing);
    }

    #[test]
    fn edge_outside_window_is_noise() {
        let mut u = unit(UnitConfig {
            home_offset: 100,
            home_tolerance: 2,
            ..config()
        });
        run(&mut u, 2, 0);
        // Rising edge at step 3, far from the [98, 102] window.
        u.tick(Some(255));
        assert!(!u.is_homed());

        // Restabilize low, then raise the edge inside the window.
        run(&mut u, 2, 255);
        run(&mut u, 92, 0);
        assert_eq!(u.position(), 97_000);
        u.tick(Some(255));
        assert!(u.is_homed());
        assert_eq!(u.position(), 100_000);
    }

    #[test]
    fn wrong_polarity_edge_is_ignored() {
        let mut u = unit(UnitConfig {
            home_edge: Edge::Falling,
            home_offset: 5,
            home_tolerance: 4,
            ..config()
        });
        // Rising edge at step 3, inside the [1, 9] window, wrong polarity.
        run(&mut u, 2, 0);
        u.tick(Some(255));
        assert!(!u.is_homed());
        // Falling edge at step 5, inside the window.
        u.tick(Some(255));
        u.tick(Some(0));
        assert!(u.is_homed());
        assert_eq!(u.position(), 5_000);
    }

    #[test]
    fn moves_forward_to_exact_target() {
        let mut u = homed_unit();
        u.set_flap(2);
        assert_eq!(u.target(), 100_000);
        assert_eq!(u.status(), UnitStatus::Moving);

        let mut prev = u.position();
        for _ in 0..99 {
            u.tick(Some(0));
            assert!(u.position() > prev);
            prev = u.position();
        }
        assert_eq!(u.position(), 99_000);
        assert_eq!(u.status(), UnitStatus::Moving);

        u.tick(Some(0));
        assert_eq!(u.position(), 100_000);
        assert_eq!(u.status(), UnitStatus::Idle);
    }

    #[test]
    fn snaps_onto_fractional_flap_pitch() {
        let mut u = unit(UnitConfig {
            flaps: 3,
            ..config()
        });
        run(&mut u, 2, 0);
        u.tick(Some(255));
        assert_eq!(u.status(), UnitStatus::Idle);

        // 200000 / 3 truncates; the final step has to land short.
        u.set_flap(1);
        assert_eq!(u.target(), 66_666);
        assert_eq!(u.target(), u.calibration().millisteps_per_flap());
        run(&mut u, 67, 0);
        assert_eq!(u.position(), 66_666);
        assert_eq!(u.status(), UnitStatus::Idle);
    }

    #[test]
    fn wraps_forward_past_zero() {
        let mut u = homed_unit();
        u.set_flap(2);
        run(&mut u, 100, 0);
        assert_eq!(u.position(), 100_000);

        // Flap 0 lies across the wrap; the wheel keeps going forward.
        u.set_flap(0);
        let mut wraps = 0;
        let mut prev = u.position();
        for _ in 0..100 {
            u.tick(Some(0));
            if u.position() < prev {
                wraps += 1;
            }
            prev = u.position();
        }
        assert_eq!(wraps, 1);
        assert_eq!(u.position(), 0);
        assert_eq!(u.status(), UnitStatus::Idle);
    }

    #[test]
    fn same_flap_request_is_a_no_op() {
        let mut u = homed_unit();
        u.tick(None);
        let outputs = u.outputs();

        u.set_flap(0);
        assert_eq!(u.status(), UnitStatus::Idle);
        u.tick(None);
        assert_eq!(u.position(), 0);
        assert_eq!(u.outputs(), outputs);
    }

    #[test]
    fn flap_index_wraps_in_flap_space() {
        let mut u = homed_unit();
        u.set_flap(5);
        assert_eq!(u.target(), 50_000);
        u.set_flap(4);
        assert_eq!(u.target(), 0);
    }

    #[test]
    fn rehoming_snaps_back_mid_move() {
        let mut u = unit(UnitConfig {
            home_offset: 50,
            ..config()
        });
        run(&mut u, 46, 0);
        u.tick(Some(255));
        assert!(u.is_homed());
        assert_eq!(u.position(), 50_000);

        u.set_flap(3);
        // Hold the sensor active, drop it, then raise it again while the
        // wheel is still inside the window: a drift-correcting edge.
        run(&mut u, 2, 255);
        run(&mut u, 2, 0);
        u.tick(Some(255));
        assert_eq!(u.position(), 50_000);
        assert_eq!(u.status(), UnitStatus::Moving);
        assert_eq!(u.target(), 150_000);
    }

    #[test]
    fn unhomed_unit_drives_to_new_target_after_homing() {
        let mut u = unit(UnitConfig {
            home_offset: 100,
            home_tolerance: 2,
            ..config()
        });
        u.set_flap(1);
        run(&mut u, 97, 0);
        u.tick(Some(255));
        assert!(u.is_homed());
        assert_eq!(u.position(), 100_000);
        assert_eq!(u.status(), UnitStatus::Moving);

        // 150 more steps forward: wraps at 200 and lands on flap 1.
        run(&mut u, 150, 0);
        assert_eq!(u.position(), 50_000);
        assert_eq!(u.status(), UnitStatus::Idle);
    }

    #[test]
    fn forward_phase_walks_gray_cycle() {
        let mut u = unit(config());
        let expected = [
            (true, false),
            (true, true),
            (false, true),
            (false, false),
        ];
        for &pair in expected.iter().cycle().take(8) {
            let before = u.outputs();
            u.tick(Some(0));
            let after = u.outputs();
            let flips =
                (before.0 != after.0) as u8 + (before.1 != after.1) as u8;
            assert_eq!(flips, 1);
            assert_eq!(after, pair);
        }
    }

    #[test]
    fn reverse_direction_plays_sequence_backwards() {
        let mut u = unit(UnitConfig {
            direction: Direction::Reverse,
            ..config()
        });
        let expected = [
            (false, true),
            (true, true),
            (true, false),
            (false, false),
        ];
        for &pair in &expected {
            u.tick(Some(0));
            assert_eq!(u.outputs(), pair);
        }
    }

    #[test]
    fn active_low_inverts_lines() {
        let mut u = unit(UnitConfig {
            motor_level: ActiveLevel::Low,
            ..config()
        });
        u.tick(Some(0));
        assert_eq!(u.outputs(), (false, true));

        run(&mut u, 1, 0);
        u.tick(Some(255));
        assert_eq!(u.status(), UnitStatus::Idle);
        // Released means both lines at the inactive level, here high.
        u.tick(None);
        assert_eq!(u.outputs(), (true, true));
    }

    #[test]
    fn idle_release_happens_once_then_outputs_freeze() {
        let mut u = homed_unit();
        u.tick(None);
        assert_eq!(u.outputs(), (false, false));

        u.set_out(OutputLine::Out0, true);
        u.tick(None);
        u.tick(None);
        assert_eq!(u.outputs(), (true, false));

        u.set_out(OutputLine::Out1, true);
        u.set_out(OutputLine::Out0, false);
        u.tick(None);
        assert_eq!(u.outputs(), (false, true));
    }

    #[test]
    fn reset_clears_home_but_keeps_position() {
        let mut u = homed_unit();
        u.set_flap(1);
        run(&mut u, 50, 0);
        assert_eq!(u.position(), 50_000);
        assert_eq!(u.status(), UnitStatus::Idle);

        u.reset();
        assert!(!u.is_homed());
        assert_eq!(u.status(), UnitStatus::Homing);
        assert_eq!(u.position(), 50_000);
        assert_eq!(u.target(), 50_000);

        // The search resumes driving on the next tick.
        u.tick(Some(0));
        assert_eq!(u.position(), 51_000);
    }
}
