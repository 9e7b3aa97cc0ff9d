//! Cartridge loading and header parsing.

use crate::error::CoreError;
use std::path::Path;

/// Header byte 0x147, classified. Only [`CartridgeKind::RomOnly`] is
/// actually executable by this core; the others are recognized so a
/// caller can log "this ROM needs a mapper" instead of silently
/// mis-running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeKind {
    RomOnly,
    Mbc1,
    Mbc2,
    Mbc3,
    Mbc5,
    Unknown(u8),
}

impl CartridgeKind {
    pub fn from_header_byte(b: u8) -> Self {
        match b {
            0x00 => CartridgeKind::RomOnly,
            0x01..=0x03 => CartridgeKind::Mbc1,
            0x05..=0x06 => CartridgeKind::Mbc2,
            0x0F..=0x13 => CartridgeKind::Mbc3,
            0x19..=0x1E => CartridgeKind::Mbc5,
            other => CartridgeKind::Unknown(other),
        }
    }

    pub fn is_rom_only(self) -> bool {
        matches!(self, CartridgeKind::RomOnly)
    }
}

/// Parsed cartridge header fields, per the 0x100..0x14F header layout.
#[derive(Debug, Clone)]
pub struct CartridgeHeader {
    pub title: String,
    pub is_cgb: bool,
    pub sgb_flag: u8,
    pub kind: CartridgeKind,
    pub rom_size_byte: u8,
    pub ram_size_byte: u8,
    pub header_checksum: u8,
}

/// Raw ROM bytes plus the parsed header.
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub rom: Vec<u8>,
    pub header: CartridgeHeader,
}

impl Cartridge {
    pub fn from_bytes(rom: Vec<u8>) -> Result<Self, CoreError> {
        if rom.len() < 0x150 {
            return Err(CoreError::InvalidRom(
                "ROM too short to contain a valid header".into(),
            ));
        }

        let mut title = String::new();
        for &byte in &rom[0x134..0x144] {
            if !(b'A'..=b'Z').contains(&byte) {
                break;
            }
            title.push(byte as char);
        }

        let cgb_byte = rom[0x143];
        let is_cgb = cgb_byte == 0x80 || cgb_byte == 0xC0;

        let kind = CartridgeKind::from_header_byte(rom[0x147]);
        if !kind.is_rom_only() {
            log::warn!(
                "cartridge {title:?} declares mapper {kind:?}; banking is unimplemented, only bank 0/1 will be visible"
            );
        }

        let header = CartridgeHeader {
            title,
            is_cgb,
            sgb_flag: rom[0x146],
            kind,
            rom_size_byte: rom[0x148],
            ram_size_byte: rom[0x149],
            header_checksum: rom[0x14D],
        };

        log::debug!("loaded cartridge {:?} ({:?})", header.title, header.kind);
        Ok(Cartridge { rom, header })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CoreError::RomIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_rom() -> Vec<u8> {
        let mut rom = vec![0x00u8; 0x8000];
        rom[0x100] = 0x00;
        rom[0x101] = 0xC3;
        rom[0x102] = 0x50;
        rom[0x103] = 0x01;
        for (i, b) in b"GBCORE_TEST".iter().enumerate() {
            rom[0x134 + i] = *b;
        }
        rom[0x147] = 0x00;
        rom[0x148] = 0x00;
        rom[0x149] = 0x00;
        rom[0x14D] = 0xE7;
        rom
    }

    #[test]
    fn parses_title_and_kind() {
        let cart = Cartridge::from_bytes(minimal_rom()).unwrap();
        assert_eq!(cart.header.title, "GBCORE_TEST");
        assert_eq!(cart.header.kind, CartridgeKind::RomOnly);
        assert!(!cart.header.is_cgb);
    }

    #[test]
    fn title_truncates_on_first_lowercase_or_non_alpha() {
        let mut rom = minimal_rom();
        rom[0x134] = b'A';
        rom[0x135] = b'B';
        rom[0x136] = 0x00;
        rom[0x137] = b'C';
        let cart = Cartridge::from_bytes(rom).unwrap();
        assert_eq!(cart.header.title, "AB");
    }

    #[test]
    fn too_short_is_rejected() {
        let rom = vec![0u8; 0x10];
        assert!(Cartridge::from_bytes(rom).is_err());
    }

    #[test]
    fn cgb_flag_normalizes_to_zero_unless_80_or_c0() {
        let mut rom = minimal_rom();
        rom[0x143] = 0x11;
        let cart = Cartridge::from_bytes(rom).unwrap();
        assert!(!cart.header.is_cgb);

        let mut rom = minimal_rom();
        rom[0x143] = 0xC0;
        let cart = Cartridge::from_bytes(rom).unwrap();
        assert!(cart.header.is_cgb);
    }
}
