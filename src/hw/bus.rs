// SPDX-License-Identifier: MIT

//! Output bus seam for the daisy-chained shift registers.

/// Write-only sink for serialized output frames.
///
/// `frame` is given in wire order: the first byte is shifted out first and
/// settles in the register farthest from the controller. An implementation
/// shifts the bytes MSB first and latches them onto the outputs in one call.
pub trait FrameBus {
    type Error;

    /// Shift out the whole frame and latch it.
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Drive the chain's output-enable line.
    ///
    /// Buses whose outputs are permanently enabled in hardware keep the
    /// default, which does nothing.
    fn set_outputs_enabled(&mut self, _enabled: bool) {}
}
