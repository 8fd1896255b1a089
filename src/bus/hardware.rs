use std::thread;
use std::time::{
	Duration,
	Instant,
};

use failure::Fail;

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

/// Faults a bus implementation reports; wrapped in `failure::Error`, so use
/// `downcast_ref::<BusFault>()` to inspect them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Fail)]
pub enum BusFault {
	#[fail(display = "no acknowledge from device 0x{:02x}", address)]
	NoAcknowledge { address: u8 },
	#[fail(display = "bus arbitration lost")]
	ArbitrationLost,
	#[fail(display = "bus timeout")]
	Timeout,
	#[fail(display = "short transfer: {} of {} bytes", actual, expected)]
	ShortTransfer { expected: usize, actual: usize },
}

pub trait Bus {
	// write all `bytes` in a single transaction to `device_address` (R/W bit included)
	fn transfer(&mut self, device_address: u8, bytes: &[u8]) -> crate::AResult<()>;

	// read `buf.len()` bytes in a single transaction from `device_address`
	fn read(&mut self, device_address: u8, buf: &mut [u8]) -> crate::AResult<()>;

	// block for (at least) the given time
	fn delay_ms(&mut self, milliseconds: u32) {
		reliable_sleep(Duration::from_millis(u64::from(milliseconds)));
	}
}

impl<'a, B: ?Sized + Bus> Bus for &'a mut B {
	fn transfer(&mut self, device_address: u8, bytes: &[u8]) -> crate::AResult<()> {
		B::transfer(*self, device_address, bytes)
	}

	fn read(&mut self, device_address: u8, buf: &mut [u8]) -> crate::AResult<()> {
		B::read(*self, device_address, buf)
	}

	fn delay_ms(&mut self, milliseconds: u32) {
		B::delay_ms(*self, milliseconds)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reliable_sleep_waits_full_duration() {
		let start = Instant::now();
		reliable_sleep(Duration::from_millis(5));
		assert!(start.elapsed() >= Duration::from_millis(5));
	}

	#[test]
	fn fault_messages() {
		assert_eq!(
			BusFault::NoAcknowledge { address: 0xa0 }.to_string(),
			"no acknowledge from device 0xa0",
		);
		assert_eq!(
			BusFault::ShortTransfer { expected: 4, actual: 1 }.to_string(),
			"short transfer: 1 of 4 bytes",
		);
	}

	#[test]
	fn fault_survives_failure_error() {
		let e = failure::Error::from(BusFault::Timeout);
		assert_eq!(e.downcast_ref::<BusFault>(), Some(&BusFault::Timeout));
	}
}
