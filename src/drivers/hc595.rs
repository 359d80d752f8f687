// SPDX-License-Identifier: MIT

//! 74HC595 shift-register chain drivers.
//!
//! Two [`FrameBus`] implementations for the same chain: [`Spi595`] clocks
//! frames out over a hardware SPI peripheral, [`BitBang595`] drives the
//! three lines directly from GPIO. Both shift MSB first and latch the whole
//! frame in one call, so the outputs never show a half-shifted frame.
//!
//! Wiring (per register):
//! - SER (14):   serial data, from MOSI or the data GPIO
//! - SRCLK (11): shift clock, from SCK or the clock GPIO
//! - RCLK (12):  storage latch, shared by the whole chain
//! - ~OE (13):   output enable, active-low, optional (tie low if unused)
//! - QH' (9):    daisy-chain feed to the next register's SER

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::hw::FrameBus;

/// Stand-in for an output-enable line that is tied low in hardware.
#[derive(Debug, Default)]
pub struct NoOe;

impl embedded_hal::digital::ErrorType for NoOe {
    type Error = Infallible;
}

impl OutputPin for NoOe {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// 74HC595 chain behind a hardware SPI peripheral.
///
/// The SPI bus does the shifting; `latch` is the chain's shared RCLK line,
/// pulsed high after each transfer to move the shift stage onto the outputs.
/// SPI errors propagate; latch and output-enable writes are absorbed like
/// any other GPIO.
pub struct Spi595<SPI, LATCH, OE = NoOe> {
    spi: SPI,
    latch: LATCH,
    oe: Option<OE>,
}

impl<SPI, LATCH> Spi595<SPI, LATCH>
where
    SPI: SpiBus,
    LATCH: OutputPin,
{
    /// Wrap a chain whose `~OE` line is tied low in hardware.
    pub fn new(spi: SPI, mut latch: LATCH) -> Self {
        latch.set_low().ok();
        Self {
            spi,
            latch,
            oe: None,
        }
    }

    /// Attach the chain's `~OE` line, leaving outputs disabled until the
    /// controller enables them.
    pub fn with_output_enable<OE: OutputPin>(self, mut oe: OE) -> Spi595<SPI, LATCH, OE> {
        oe.set_high().ok();
        Spi595 {
            spi: self.spi,
            latch: self.latch,
            oe: Some(oe),
        }
    }
}

impl<SPI, LATCH, OE> Spi595<SPI, LATCH, OE> {
    pub fn free(self) -> (SPI, LATCH, Option<OE>) {
        (self.spi, self.latch, self.oe)
    }
}

impl<SPI, LATCH, OE> FrameBus for Spi595<SPI, LATCH, OE>
where
    SPI: SpiBus,
    LATCH: OutputPin,
    OE: OutputPin,
{
    type Error = SPI::Error;

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(frame)?;
        self.spi.flush()?;
        self.latch.set_high().ok();
        self.latch.set_low().ok();
        Ok(())
    }

    fn set_outputs_enabled(&mut self, enabled: bool) {
        if let Some(oe) = self.oe.as_mut() {
            // ~OE is active-low.
            if enabled {
                oe.set_low().ok();
            } else {
                oe.set_high().ok();
            }
        }
    }
}

/// 74HC595 chain bit-banged over three GPIO lines.
///
/// Data is sampled by the register on the rising clock edge; the driver
/// sets the data line, pulses the clock, and pulses `latch` once after the
/// last bit.
pub struct BitBang595<DATA, CLK, LATCH, OE = NoOe> {
    data: DATA,
    clock: CLK,
    latch: LATCH,
    oe: Option<OE>,
}

impl<DATA, CLK, LATCH> BitBang595<DATA, CLK, LATCH>
where
    DATA: OutputPin,
    CLK: OutputPin,
    LATCH: OutputPin,
{
    /// Wrap a chain whose `~OE` line is tied low in hardware.
    pub fn new(mut data: DATA, mut clock: CLK, mut latch: LATCH) -> Self {
        data.set_low().ok();
        clock.set_low().ok();
        latch.set_low().ok();
        Self {
            data,
            clock,
            latch,
            oe: None,
        }
    }

    /// Attach the chain's `~OE` line, leaving outputs disabled until the
    /// controller enables them.
    pub fn with_output_enable<OE: OutputPin>(
        self,
        mut oe: OE,
    ) -> BitBang595<DATA, CLK, LATCH, OE> {
        oe.set_high().ok();
        BitBang595 {
            data: self.data,
            clock: self.clock,
            latch: self.latch,
            oe: Some(oe),
        }
    }
}

impl<DATA, CLK, LATCH, OE> BitBang595<DATA, CLK, LATCH, OE> {
    pub fn free(self) -> (DATA, CLK, LATCH, Option<OE>) {
        (self.data, self.clock, self.latch, self.oe)
    }
}

impl<DATA, CLK, LATCH, OE> FrameBus for BitBang595<DATA, CLK, LATCH, OE>
where
    DATA: OutputPin,
    CLK: OutputPin,
    LATCH: OutputPin,
    OE: OutputPin,
{
    type Error = Infallible;

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        for &byte in frame {
            for bit in (0..8).rev() {
                if byte & (1 << bit) != 0 {
                    self.data.set_high().ok();
                } else {
                    self.data.set_low().ok();
                }
                self.clock.set_high().ok();
                self.clock.set_low().ok();
            }
        }
        self.latch.set_high().ok();
        self.latch.set_low().ok();
        Ok(())
    }

    fn set_outputs_enabled(&mut self, enabled: bool) {
        if let Some(oe) = self.oe.as_mut() {
            if enabled {
                oe.set_low().ok();
            } else {
                oe.set_high().ok();
            }
        }
    }
}
