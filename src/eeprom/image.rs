use crate::bus::Bus;

use super::EepromOperations;
use super::consts::*;

/// read the whole device, page by page
pub fn read_all<B: Bus + ?Sized>(bus: &mut B) -> crate::AResult<Vec<u8>> {
	let mut buf = vec![0u8; CAPACITY];
	for (page, chunk) in buf.chunks_mut(PAGE_SIZE).enumerate() {
		bus.read_page(chunk, page as u16)?;
	}
	Ok(buf)
}

/// write `image` at `offset` and read it back
///
/// Unlike the plain operations this splits the data at page boundaries, so
/// no write spills into the next page.
pub fn write_image<B: Bus + ?Sized>(bus: &mut B, offset: usize, image: &[u8]) -> crate::AResult<()> {
	ensure!(offset <= CAPACITY && image.len() <= CAPACITY - offset,
		"Image of {} bytes at 0x{:04x} doesn't fit into {} bytes", image.len(), offset, CAPACITY
	);
	if image.is_empty() {
		return Ok(());
	}

	let mut address = offset;
	let mut remaining = image;
	while !remaining.is_empty() {
		let room = PAGE_SIZE - address % PAGE_SIZE;
		let (chunk, rest) = remaining.split_at(room.min(remaining.len()));
		bus.write_bytes(chunk, address as u16)?;
		address += chunk.len();
		remaining = rest;
	}
	debug!("wrote {} bytes at 0x{:04x}", image.len(), offset);

	// verify
	let mut flash = vec![0u8; image.len()];
	bus.read_bytes(&mut flash, offset as u16)?;
	for (i, (&expected, &actual)) in image.iter().zip(flash.iter()).enumerate() {
		ensure!(expected == actual,
			"Verify failed at 0x{:04x}: expected 0x{:02x}, EEPROM has 0x{:02x}", offset + i, expected, actual
		);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::bus::{
		BusEvent,
		SimulatedEeprom,
	};

	#[test]
	fn read_all_reads_every_page() {
		let mut sim = SimulatedEeprom::new();
		sim.memory_mut()[0] = 0x01;
		sim.memory_mut()[CAPACITY - 1] = 0x02;
		let all = read_all(&mut sim).unwrap();
		assert_eq!(all.len(), CAPACITY);
		assert_eq!(all[0], 0x01);
		assert_eq!(all[CAPACITY - 1], 0x02);
		assert_eq!(sim.events().len(), 2 * PAGE_COUNT);
		assert_eq!(sim.events()[2], BusEvent::Transfer { address: 0xa0, bytes: vec![0x00, 0x40] });
	}

	#[test]
	fn write_image_splits_at_page_boundaries() {
		let mut sim = SimulatedEeprom::new();
		let image: Vec<u8> = (0..100u8).collect();
		write_image(&mut sim, 0x30, &image).unwrap();
		assert_eq!(&sim.memory()[0x30..0x30 + 100], &image[..]);

		let writes: Vec<Vec<u8>> = sim.events().iter().filter_map(|e| match e {
			BusEvent::Transfer { bytes, .. } if bytes.len() > 2 => Some(bytes.clone()),
			_ => None,
		}).collect();
		assert_eq!(writes.len(), 3);
		assert_eq!(&writes[0][..2], &[0x00, 0x30]);
		assert_eq!(writes[0].len(), 2 + 16);
		assert_eq!(&writes[1][..2], &[0x00, 0x40]);
		assert_eq!(writes[1].len(), 2 + 64);
		assert_eq!(&writes[2][..2], &[0x00, 0x80]);
		assert_eq!(writes[2].len(), 2 + 20);
	}

	#[test]
	fn write_image_rejects_oversized() {
		let mut sim = SimulatedEeprom::new();
		assert!(write_image(&mut sim, CAPACITY - 4, &[0u8; 5]).is_err());
		assert!(write_image(&mut sim, CAPACITY + 1, &[]).is_err());
		assert!(sim.events().is_empty());
		write_image(&mut sim, CAPACITY - 4, &[1, 2, 3, 4]).unwrap();
		assert_eq!(&sim.memory()[CAPACITY - 4..], &[1, 2, 3, 4]);
	}

	#[test]
	fn write_image_empty_touches_nothing() {
		let mut sim = SimulatedEeprom::new();
		write_image(&mut sim, 0x40, &[]).unwrap();
		write_image(&mut sim, CAPACITY, &[]).unwrap();
		assert!(sim.events().is_empty());
	}

	struct StuckBit(SimulatedEeprom);

	impl Bus for StuckBit {
		fn transfer(&mut self, device_address: u8, bytes: &[u8]) -> crate::AResult<()> {
			self.0.transfer(device_address, bytes)
		}

		fn read(&mut self, device_address: u8, buf: &mut [u8]) -> crate::AResult<()> {
			self.0.read(device_address, buf)?;
			for b in buf.iter_mut() {
				*b |= 0x80;
			}
			Ok(())
		}

		fn delay_ms(&mut self, milliseconds: u32) {
			self.0.delay_ms(milliseconds)
		}
	}

	#[test]
	fn write_image_detects_verify_mismatch() {
		let mut bus = StuckBit(SimulatedEeprom::new());
		let e = write_image(&mut bus, 0x10, &[0x80, 0x01]).unwrap_err();
		assert_eq!(e.to_string(), "Verify failed at 0x0011: expected 0x01, EEPROM has 0x81");
	}
}
