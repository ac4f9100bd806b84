//! PRG file loader.
//!
//! A PRG file is the simplest C64 binary format: a 2-byte little-endian
//! load address followed by the data bytes. The data is loaded into RAM
//! starting at the given address.

use crate::error::{C64Error, Result};
use crate::memory::C64Memory;

/// Where BASIC programs start.
pub const BASIC_START: u16 = 0x0801;

/// Zero-page pointers to the start of BASIC variables, arrays and the end
/// of arrays. All three point just past the program after a LOAD.
const BASIC_END_POINTERS: [u16; 3] = [0x2D, 0x2F, 0x31];

/// Load a PRG file into C64 RAM.
///
/// A program loaded at [`BASIC_START`] also gets the BASIC variable
/// pointers set, as the kernal's LOAD would, so `RUN` works.
///
/// Returns the load address on success.
pub fn load_prg(memory: &mut C64Memory, data: &[u8]) -> Result<u16> {
    if data.len() < 3 {
        return Err(C64Error::PrgTooShort(data.len()));
    }

    let load_addr = u16::from(data[0]) | (u16::from(data[1]) << 8);
    let payload = &data[2..];

    for (i, &byte) in payload.iter().enumerate() {
        memory.ram_write(load_addr.wrapping_add(i as u16), byte);
    }

    if load_addr == BASIC_START {
        let end = load_addr.wrapping_add(payload.len() as u16);
        for pointer in BASIC_END_POINTERS {
            memory.ram_write(pointer, end as u8);
            memory.ram_write(pointer + 1, (end >> 8) as u8);
        }
    }

    log::debug!("PRG loaded at ${load_addr:04X}, {} bytes", payload.len());
    Ok(load_addr)
}
