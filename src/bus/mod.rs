/// Two-wire serial bus as seen by an AT24C256 (256-kbit EEPROM, organized as
/// 512 pages of 64 bytes)
///
/// The bus carries two kinds of transactions, both addressed with the 8-bit
/// device address (7-bit address shifted left, R/W bit in bit 0):
/// - write (0xA0): a sequence of bytes; the first two are the word address
///   (MSB first), anything after that is data to program
/// - read (0xA1): a sequence of bytes clocked out of the device, starting at
///   its internal address pointer
///
/// After a data write the device commits the page buffer to its cells and
/// doesn't acknowledge anything for the write cycle time (5 ms).

mod hardware;
mod linux;
mod simulated;

pub use self::hardware::{
	Bus,
	BusFault,
	reliable_sleep,
};

pub use self::linux::{
	I2cDev,
	open_i2c_bus,
};

pub use self::simulated::{
	BusEvent,
	SimulatedEeprom,
};
