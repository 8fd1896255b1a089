use std::fs;
use std::io::{
	self,
	Read,
	Write,
};
use std::os::unix::io::AsRawFd;
use std::path::{
	Path,
	PathBuf,
};

use super::{
	Bus,
	BusFault,
};

// from <linux/i2c-dev.h>: use this 7-bit slave address for following read/write calls
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// Bus over a Linux `i2c-dev` character device (`/dev/i2c-N`)
pub struct I2cDev {
	file: fs::File,
	path: PathBuf,
	selected: Option<u8>,
}

impl I2cDev {
	pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
		let path = path.as_ref().to_path_buf();
		let file = fs::OpenOptions::new()
			.read(true)
			.write(true)
			.open(&path)?;

		Ok(I2cDev {
			file,
			path,
			selected: None,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	// device address includes the R/W bit; the kernel wants the 7-bit address
	fn select(&mut self, device_address: u8) -> io::Result<()> {
		let slave = device_address >> 1;
		if self.selected == Some(slave) {
			return Ok(());
		}

		debug!("{}: selecting slave 0x{:02x}", self.path.display(), slave);
		let r = unsafe {
			libc::ioctl(self.file.as_raw_fd(), I2C_SLAVE as _, libc::c_ulong::from(slave))
		};
		if r < 0 {
			self.selected = None;
			return Err(io::Error::last_os_error());
		}
		self.selected = Some(slave);
		Ok(())
	}
}

fn map_os_error(device_address: u8, e: io::Error) -> failure::Error {
	match e.raw_os_error() {
		Some(libc::ENXIO) | Some(libc::EREMOTEIO) => BusFault::NoAcknowledge { address: device_address }.into(),
		Some(libc::ETIMEDOUT) => BusFault::Timeout.into(),
		Some(libc::EAGAIN) => BusFault::ArbitrationLost.into(),
		_ => e.into(),
	}
}

impl Bus for I2cDev {
	fn transfer(&mut self, device_address: u8, bytes: &[u8]) -> crate::AResult<()> {
		self.select(device_address)?;
		// one write(2) is one I2C message
		let l = self.file.write(bytes).map_err(|e| map_os_error(device_address, e))?;
		if l != bytes.len() {
			return Err(BusFault::ShortTransfer { expected: bytes.len(), actual: l }.into());
		}
		Ok(())
	}

	fn read(&mut self, device_address: u8, buf: &mut [u8]) -> crate::AResult<()> {
		self.select(device_address)?;
		let l = self.file.read(buf).map_err(|e| map_os_error(device_address, e))?;
		if l != buf.len() {
			return Err(BusFault::ShortTransfer { expected: buf.len(), actual: l }.into());
		}
		Ok(())
	}
}

pub fn open_i2c_bus<P: AsRef<Path>>(path: P) -> crate::AResult<I2cDev> {
	let path = path.as_ref();
	with_context!(("couldn't open I2C bus {}", path.display()), {
		Ok(I2cDev::open(path)?)
	})
}
