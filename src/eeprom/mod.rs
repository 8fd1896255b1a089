/* Chip documentation: https://ww1.microchip.com/downloads/en/DeviceDoc/AT24C256C-I2C-Compatible-Two-Wire-Serial-EEPROM-256-Kbit-32768x8-DS20005267A.pdf */

use crate::bus::{
	Bus,
	BusFault,
};

mod image;

pub use self::image::{
	read_all,
	write_image,
};

pub mod consts {
	pub const WRITE_ADDRESS: u8 = 0xa0; // 0x50 << 1 | W
	pub const READ_ADDRESS: u8 = 0xa1; // 0x50 << 1 | R

	pub const PAGE_SIZE: usize = 64;
	pub const PAGE_COUNT: usize = 512;
	pub const CAPACITY: usize = PAGE_SIZE * PAGE_COUNT;
	// only 15 address bits are used; the MSB is "don't care"
	pub const ADDRESS_MASK: u16 = (CAPACITY - 1) as u16;

	// t_WR: no ACK while committing the page buffer
	pub const WRITE_CYCLE_TIME_MS: u32 = 5;
}

use self::consts::*;

/// base word address of a page; not checked against `PAGE_COUNT`
pub fn page_address(page: u16) -> u16 {
	(u32::from(page) * PAGE_SIZE as u32) as u16
}

/// word address as sent on the wire (MSB first)
pub fn word_address_bytes(address: u16) -> [u8; 2] {
	[(address >> 8) as u8, address as u8]
}

mod inner {
	use super::*;

	pub trait EepromOperationsBase: Bus {
		// [addr_hi, addr_lo, data...] as one transaction, then wait for the
		// write cycle
		fn address_prefixed_write(&mut self, address: u16, data: &[u8]) -> crate::AResult<()> {
			let mut cmd = Vec::with_capacity(2 + data.len());
			cmd.extend_from_slice(&word_address_bytes(address));
			cmd.extend_from_slice(data);

			if let Err(e) = self.transfer(WRITE_ADDRESS, &cmd) {
				let nacked = match e.downcast_ref::<BusFault>() {
					Some(BusFault::NoAcknowledge { .. }) => true,
					_ => false,
				};
				if !nacked {
					self.delay_ms(WRITE_CYCLE_TIME_MS);
				}
				return Err(e);
			}
			self.delay_ms(WRITE_CYCLE_TIME_MS);
			Ok(())
		}

		// "dummy write" of just the address to load the address pointer,
		// then read sequentially from there
		fn set_address_and_read(&mut self, address: u16, buf: &mut [u8]) -> crate::AResult<()> {
			self.transfer(WRITE_ADDRESS, &word_address_bytes(address))?;
			self.read(READ_ADDRESS, buf)
		}
	}

	impl<B: Bus + ?Sized> EepromOperationsBase for B {}
}

/// AT24C256 operations on top of any bus
///
/// None of these check addresses or lengths: page writes that don't fit into
/// the rest of the page continue into the next page's address range,
/// addresses beyond 32 KB alias to the lower half.
///
/// A write that fails with anything but `BusFault::NoAcknowledge` still
/// waits for the write cycle before returning the error; the device may
/// have started committing what it received.
pub trait EepromOperations: inner::EepromOperationsBase {
	/// write `data` starting at the first byte of `page` (0..512)
	fn write_page(&mut self, data: &[u8], page: u16) -> crate::AResult<()> {
		let address = page_address(page);
		trace!("write page {} (0x{:04x}): {} bytes", page, address, data.len());
		self.address_prefixed_write(address, data)
	}

	/// read `buf.len()` bytes starting at the first byte of `page` (0..512)
	fn read_page(&mut self, buf: &mut [u8], page: u16) -> crate::AResult<()> {
		let address = page_address(page);
		trace!("read page {} (0x{:04x}): {} bytes", page, address, buf.len());
		self.set_address_and_read(address, buf)
	}

	fn write_bytes(&mut self, data: &[u8], address: u16) -> crate::AResult<()> {
		trace!("write 0x{:04x}: {} bytes", address, data.len());
		self.address_prefixed_write(address, data)
	}

	fn read_bytes(&mut self, buf: &mut [u8], address: u16) -> crate::AResult<()> {
		trace!("read 0x{:04x}: {} bytes", address, buf.len());
		self.set_address_and_read(address, buf)
	}
}

impl<B: Bus + ?Sized> EepromOperations for B {}
