//! C64 configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{C64Error, Result};

pub const KERNAL_ROM_SIZE: usize = 0x2000;
pub const BASIC_ROM_SIZE: usize = 0x2000;
pub const CHAR_ROM_SIZE: usize = 0x1000;

/// C64 model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum C64Model {
    /// PAL C64 (6569 VIC-II): 312 lines, 63 cycles/line.
    #[default]
    #[serde(rename = "pal")]
    C64Pal,
    /// NTSC C64 (6567R8 VIC-II): 263 lines, 65 cycles/line.
    #[serde(rename = "ntsc")]
    C64Ntsc,
}

impl C64Model {
    /// CPU clock in Hz.
    #[must_use]
    pub fn cpu_frequency(self) -> u32 {
        match self {
            Self::C64Pal => 985_248,
            Self::C64Ntsc => 1_022_727,
        }
    }

    #[must_use]
    pub fn cycles_per_frame(self) -> u32 {
        match self {
            Self::C64Pal => 312 * 63,
            Self::C64Ntsc => 263 * 65,
        }
    }

    /// Mains frequency in Hz (drives the CIA TOD clocks).
    #[must_use]
    pub fn mains_frequency(self) -> u32 {
        match self {
            Self::C64Pal => 50,
            Self::C64Ntsc => 60,
        }
    }
}

/// Configuration for creating a C64 instance.
#[derive(Debug, Clone)]
pub struct C64Config {
    /// Model variant (PAL or NTSC).
    pub model: C64Model,
    /// Kernal ROM data (8192 bytes).
    pub kernal_rom: Vec<u8>,
    /// BASIC ROM data (8192 bytes).
    pub basic_rom: Vec<u8>,
    /// Character ROM data (4096 bytes).
    pub char_rom: Vec<u8>,
}

/// Where the built-in kernal parks the CPU once start-up is done.
pub const BUILTIN_IDLE_LOOP: u16 = 0xE00E;

const BUILTIN_RESET: u16 = 0xE000;
const BUILTIN_IRQ: u16 = 0xE020;
const BUILTIN_NMI: u16 = 0xE040;

#[rustfmt::skip]
const BUILTIN_RESET_CODE: [u8; 17] = [
    0x78,             // SEI
    0xA2, 0xFF,       // LDX #$FF
    0x9A,             // TXS
    0xD8,             // CLD
    0xA9, 0x2F,       // LDA #$2F
    0x85, 0x00,       // STA $00
    0xA9, 0x37,       // LDA #$37
    0x85, 0x01,       // STA $01
    0x58,             // CLI
    0x4C, 0x0E, 0xE0, // JMP $E00E
];

#[rustfmt::skip]
const BUILTIN_IRQ_CODE: [u8; 12] = [
    0x48,       // PHA
    0x8A,       // TXA
    0x48,       // PHA
    0x98,       // TYA
    0x48,       // PHA
    0xE6, 0xA2, // INC $A2
    0x68,       // PLA
    0xA8,       // TAY
    0x68,       // PLA
    0xAA,       // TAX
    0x68,       // PLA
];

impl C64Config {
    /// A machine with minimal built-in ROMs: a kernal that sets up the
    /// processor port, counts IRQs in $A2 and idles at
    /// [`BUILTIN_IDLE_LOOP`], plus blank BASIC and character ROMs.
    #[must_use]
    pub fn builtin(model: C64Model) -> Self {
        Self {
            model,
            kernal_rom: builtin_kernal(),
            basic_rom: vec![0; BASIC_ROM_SIZE],
            char_rom: vec![0; CHAR_ROM_SIZE],
        }
    }

    /// Load a JSON machine description:
    ///
    /// ```json
    /// { "model": "pal", "roms": { "kernal": "kernal.bin", "basic": "basic.bin", "chargen": "chargen.bin" } }
    /// ```
    ///
    /// ROM paths are relative to the description file. Omitted ROMs fall
    /// back to the built-in images.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| C64Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let description: MachineDescription = serde_json::from_str(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut config = Self::builtin(description.model);
        let roms = description.roms;
        if let Some(kernal) = roms.kernal {
            config.kernal_rom = read_rom(&base.join(kernal), "kernal", KERNAL_ROM_SIZE)?;
        }
        if let Some(basic) = roms.basic {
            config.basic_rom = read_rom(&base.join(basic), "BASIC", BASIC_ROM_SIZE)?;
        }
        if let Some(chargen) = roms.chargen {
            config.char_rom = read_rom(&base.join(chargen), "character", CHAR_ROM_SIZE)?;
        }
        log::debug!("loaded machine description {}", path.display());
        Ok(config)
    }

    /// Check every ROM image has its chip's size.
    pub fn validate(&self) -> Result<()> {
        check_size("kernal", &self.kernal_rom, KERNAL_ROM_SIZE)?;
        check_size("BASIC", &self.basic_rom, BASIC_ROM_SIZE)?;
        check_size("character", &self.char_rom, CHAR_ROM_SIZE)
    }

    /// True when the kernal is the built-in one, which idles somewhere
    /// other than the stock kernal's keyboard loop.
    #[must_use]
    pub fn has_builtin_kernal(&self) -> bool {
        self.kernal_rom == builtin_kernal()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MachineDescription {
    #[serde(default)]
    model: C64Model,
    #[serde(default)]
    roms: RomPaths,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RomPaths {
    kernal: Option<PathBuf>,
    basic: Option<PathBuf>,
    chargen: Option<PathBuf>,
}

fn read_rom(path: &Path, name: &'static str, expected: usize) -> Result<Vec<u8>> {
    let data = fs::read(path).map_err(|source| C64Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    check_size(name, &data, expected)?;
    Ok(data)
}

fn check_size(name: &'static str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() == expected {
        Ok(())
    } else {
        Err(C64Error::RomSize {
            name,
            expected,
            actual: data.len(),
        })
    }
}

fn builtin_kernal() -> Vec<u8> {
    let mut rom = vec![0; KERNAL_ROM_SIZE];
    let at = |address: u16| usize::from(address - 0xE000);

    rom[at(BUILTIN_RESET)..at(BUILTIN_RESET) + BUILTIN_RESET_CODE.len()]
        .copy_from_slice(&BUILTIN_RESET_CODE);
    rom[at(BUILTIN_IRQ)..at(BUILTIN_IRQ) + BUILTIN_IRQ_CODE.len()]
        .copy_from_slice(&BUILTIN_IRQ_CODE);
    rom[at(BUILTIN_IRQ) + BUILTIN_IRQ_CODE.len()] = 0x40; // RTI
    rom[at(BUILTIN_NMI)] = 0x40; // RTI

    for (vector, target) in [
        (0xFFFA, BUILTIN_NMI),
        (0xFFFC, BUILTIN_RESET),
        (0xFFFE, BUILTIN_IRQ),
    ] {
        rom[at(vector)] = target as u8;
        rom[at(vector) + 1] = (target >> 8) as u8;
    }
    rom
}
