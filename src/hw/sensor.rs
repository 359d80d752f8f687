//! Home-sensor input seam.

/// Raw access to the per-unit home sensors.
///
/// `level` returns the instantaneous sensor reading for one unit; the motion
/// state machine binarizes it against the unit's configured threshold. Any
/// `FnMut(usize) -> u8` closure works, so an ADC scan, a port read, or a
/// lookup into a sampled buffer can all back the same controller.
pub trait HomeSense {
    /// Sample the raw level of `unit`'s home sensor.
    fn level(&mut self, unit: usize) -> u8;
}

impl<F> HomeSense for F
where
    F: FnMut(usize) -> u8,
{
    fn level(&mut self, unit: usize) -> u8 {
        self(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_sensors() {
        let mut sense = |unit: usize| (unit as u8) * 10;
        assert_eq!(HomeSense::level(&mut sense, 0), 0);
        assert_eq!(HomeSense::level(&mut sense, 3), 30);
    }
}
