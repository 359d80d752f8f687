pub mod bus;
pub mod sensor;

pub use bus::FrameBus;
pub use sensor::HomeSense;
