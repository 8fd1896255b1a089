#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate at24c256_eeprom;
use at24c256_eeprom::*;

use std::fs;
use std::io::{
	self,
	Write,
};
use std::process::exit;

use at24c256_eeprom::bus::{
	I2cDev,
	open_i2c_bus,
};
use at24c256_eeprom::eeprom::consts::*;

// decimal or 0x-prefixed hex
fn parse_number(s: &str) -> AResult<u32> {
	let r = if s.starts_with("0x") || s.starts_with("0X") {
		u32::from_str_radix(&s[2..], 16)
	} else {
		s.parse::<u32>()
	};
	r.map_err(|e| format_err!("invalid number {:?}: {}", s, e))
}

fn get_param(matches: &clap::ArgMatches, name: &str) -> AResult<u32> {
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	parse_number(param).map_err(|e| {
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

fn get_address(matches: &clap::ArgMatches) -> AResult<u16> {
	let address = get_param(matches, "ADDRESS")?;
	ensure!(address <= 0xffff, "address 0x{:x} doesn't fit into 16 bits", address);
	Ok(address as u16)
}

fn get_page(matches: &clap::ArgMatches) -> AResult<u16> {
	let page = get_param(matches, "PAGE")?;
	ensure!((page as usize) < PAGE_COUNT, "page {} out of range (0..{})", page, PAGE_COUNT);
	Ok(page as u16)
}

fn check_count(count: u32) -> AResult<usize> {
	ensure!(count as usize <= CAPACITY, "count {} larger than the EEPROM ({} bytes)", count, CAPACITY);
	Ok(count as usize)
}

fn get_count(matches: &clap::ArgMatches) -> AResult<usize> {
	check_count(get_param(matches, "COUNT")?)
}

fn get_bytes(matches: &clap::ArgMatches) -> AResult<Vec<u8>> {
	let mut data = Vec::new();
	for v in matches.values_of("BYTES").into_iter().flatten() {
		let b = parse_number(v)?;
		ensure!(b <= 0xff, "not a byte: {}", v);
		data.push(b as u8);
	}
	Ok(data)
}

fn open_bus(matches: &clap::ArgMatches) -> AResult<I2cDev> {
	let path = match matches.value_of("bus") {
		Some(p) => p,
		None => bail!("missing parameter bus"),
	};
	open_i2c_bus(path)
}

fn hexdump(offset: usize, data: &[u8]) {
	for i in 0..data.len() {
		if 0 == i % 16 {
			print!("{:08x} ", offset + i);
		} else if 0 == i % 8 {
			print!(" ");
		}
		print!(" {:02x}", data[i]);
		if 15 == i % 16 {
			println!("");
		}
	}
	if 0 != data.len() % 16 {
		println!("");
	}
}

fn read(bus: &mut I2cDev, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_address(sub_m)?;
	let count = get_count(sub_m)?;

	let mut buf = vec![0u8; count];
	bus.read_bytes(&mut buf, address)?;
	hexdump(address as usize, &buf);

	Ok(())
}

fn read_page(bus: &mut I2cDev, sub_m: &clap::ArgMatches) -> AResult<()> {
	let page = get_page(sub_m)?;
	let count = get_count(sub_m)?;

	let mut buf = vec![0u8; count];
	bus.read_page(&mut buf, page)?;
	hexdump(eeprom::page_address(page) as usize, &buf);

	Ok(())
}

fn write(bus: &mut I2cDev, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_address(sub_m)?;
	let data = get_bytes(sub_m)?;

	if address as usize % PAGE_SIZE + data.len() > PAGE_SIZE {
		warn!("write at 0x{:04x} crosses a page boundary, data will continue into the next page", address);
	}
	bus.write_bytes(&data, address)?;
	info!("wrote {} bytes at 0x{:04x}", data.len(), address);

	Ok(())
}

fn write_page(bus: &mut I2cDev, sub_m: &clap::ArgMatches) -> AResult<()> {
	let page = get_page(sub_m)?;
	let data = get_bytes(sub_m)?;

	if data.len() > PAGE_SIZE {
		warn!("writing {} bytes to page {}, data will continue into the next page", data.len(), page);
	}
	bus.write_page(&data, page)?;
	info!("wrote {} bytes to page {}", data.len(), page);

	Ok(())
}

fn dump(bus: &mut I2cDev) -> AResult<()> {
	let image = eeprom::read_all(bus)?;
	io::stdout().write_all(&image)?;

	Ok(())
}

fn flash(bus: &mut I2cDev, sub_m: &clap::ArgMatches) -> AResult<()> {
	let file = match sub_m.value_of("FILE") {
		Some(f) => f,
		None => bail!("missing parameter FILE"),
	};
	let offset = match sub_m.value_of("offset") {
		Some(_) => get_param(sub_m, "offset")? as usize,
		None => 0,
	};

	let image = fs::read(file).map_err(|e| {
		let msg = format!("couldn't read image {}", file);
		failure::Error::from(e).context(msg)
	})?;

	eeprom::write_image(bus, offset, &image)?;
	info!("{}: flashed and verified {} bytes at 0x{:04x}", bus.path().display(), image.len(), offset);

	Ok(())
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg bus: -b --bus +takes_value +global env("AT24C_BUS") default_value("/dev/i2c-1") "I2C bus device")
		(@subcommand read =>
			(about: "read bytes starting at a memory address")
			(@arg ADDRESS: +required "16-bit memory address")
			(@arg COUNT: +required "number of bytes to read")
		)
		(@subcommand read_page =>
			(about: "read bytes starting at a page")
			(@arg PAGE: +required "page index (0..511)")
			(@arg COUNT: default_value("64") "number of bytes to read")
		)
		(@subcommand write =>
			(about: "write bytes starting at a memory address")
			(@arg ADDRESS: +required "16-bit memory address")
			(@arg BYTES: +required ... "data bytes")
		)
		(@subcommand write_page =>
			(about: "write bytes starting at a page")
			(@arg PAGE: +required "page index (0..511)")
			(@arg BYTES: +required ... "data bytes")
		)
		(@subcommand dump =>
			(about: "dump whole EEPROM as binary to stdout")
		)
		(@subcommand flash =>
			(about: "write image file to EEPROM and verify it")
			(@arg offset: -o --offset +takes_value "memory address to start at")
			(@arg FILE: +required "image file")
		)
	).get_matches();

	let mut bus = open_bus(&matches)?;

	match matches.subcommand() {
		("read", Some(sub_m)) => {
			read(&mut bus, sub_m)
		}
		("read_page", Some(sub_m)) => {
			read_page(&mut bus, sub_m)
		}
		("write", Some(sub_m)) => {
			write(&mut bus, sub_m)
		}
		("write_page", Some(sub_m)) => {
			write_page(&mut bus, sub_m)
		}
		("dump", _) => {
			dump(&mut bus)
		}
		("flash", Some(sub_m)) => {
			flash(&mut bus, sub_m)
		}
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
