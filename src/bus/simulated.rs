use std::mem;

use super::{
	Bus,
	BusFault,
};
use crate::eeprom::consts::*;

/// Everything that happened on a `SimulatedEeprom`, in order
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum BusEvent {
	Transfer { address: u8, bytes: Vec<u8> },
	Read { address: u8, count: usize },
	Delay(u32),
}

/// In-memory AT24C256 behind a bus that records all transactions
///
/// - two address bytes load the (15-bit) address pointer
/// - data bytes are programmed sequentially from the pointer; bytes past the
///   end of a page continue into the next page's address range
/// - after a data write the device NACKs everything until the write cycle
///   time has been waited for
/// - sequential reads roll over at the end of the memory
pub struct SimulatedEeprom {
	memory: Vec<u8>,
	pointer: u16,
	busy_remaining_ms: u32,
	injected_fault: Option<BusFault>,
	events: Vec<BusEvent>,
}

impl Default for SimulatedEeprom {
	fn default() -> Self {
		Self::new()
	}
}

impl SimulatedEeprom {
	/// erased device (all 0xff)
	pub fn new() -> Self {
		SimulatedEeprom {
			memory: vec![0xff; CAPACITY],
			pointer: 0,
			busy_remaining_ms: 0,
			injected_fault: None,
			events: Vec::new(),
		}
	}

	pub fn memory(&self) -> &[u8] {
		&self.memory
	}

	pub fn memory_mut(&mut self) -> &mut [u8] {
		&mut self.memory
	}

	pub fn events(&self) -> &[BusEvent] {
		&self.events
	}

	pub fn take_events(&mut self) -> Vec<BusEvent> {
		mem::replace(&mut self.events, Vec::new())
	}

	pub fn clear_events(&mut self) {
		self.events.clear();
	}

	pub fn is_busy(&self) -> bool {
		self.busy_remaining_ms > 0
	}

	/// let the next transaction fail with `fault`
	pub fn inject_fault(&mut self, fault: BusFault) {
		self.injected_fault = Some(fault);
	}

	fn check_ack(&mut self, expected: u8, device_address: u8) -> crate::AResult<()> {
		if let Some(fault) = self.injected_fault.take() {
			return Err(fault.into());
		}
		if device_address != expected || self.is_busy() {
			return Err(BusFault::NoAcknowledge { address: device_address }.into());
		}
		Ok(())
	}
}

impl Bus for SimulatedEeprom {
	fn transfer(&mut self, device_address: u8, bytes: &[u8]) -> crate::AResult<()> {
		self.events.push(BusEvent::Transfer { address: device_address, bytes: bytes.to_vec() });
		self.check_ack(WRITE_ADDRESS, device_address)?;

		ensure!(bytes.len() >= 2, "incomplete word address ({} bytes)", bytes.len());
		let address = u16::from_be_bytes([bytes[0], bytes[1]]) & ADDRESS_MASK;
		self.pointer = address;

		let data = &bytes[2..];
		if data.is_empty() {
			// dummy write, only sets the pointer
			return Ok(());
		}

		for b in data {
			self.memory[usize::from(self.pointer)] = *b;
			self.pointer = (self.pointer + 1) & ADDRESS_MASK;
		}
		self.busy_remaining_ms = WRITE_CYCLE_TIME_MS;

		Ok(())
	}

	fn read(&mut self, device_address: u8, buf: &mut [u8]) -> crate::AResult<()> {
		self.events.push(BusEvent::Read { address: device_address, count: buf.len() });
		self.check_ack(READ_ADDRESS, device_address)?;

		for b in buf.iter_mut() {
			*b = self.memory[usize::from(self.pointer)];
			self.pointer = (self.pointer + 1) & ADDRESS_MASK;
		}

		Ok(())
	}

	fn delay_ms(&mut self, milliseconds: u32) {
		self.events.push(BusEvent::Delay(milliseconds));
		self.busy_remaining_ms = self.busy_remaining_ms.saturating_sub(milliseconds);
	}
}
