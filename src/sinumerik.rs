// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! Sinumerik 840D sl extensions: NC kernel (NCK) variables and drive parameters.
//!
//! The NCK is reached on slot 3 of the control, the drive main CU usually on slot 9
//! (NX extensions from slot 13 on). Both reuse the S7 read/write jobs with their own
//! syntax IDs and item specs, so area reads go through the same fragmentation loop
//! and multi item jobs through [`S7Client::read_multi_vars`] / [`S7Client::write_multi_vars`]
//! with [`NckTag`] or [`DrvTag`] addresses.
//!
//! NCK values come back little-endian (decode them with [`crate::codec::NckCodec`]),
//! drive parameters big-endian like any S7 area.

use std::time::Instant;

use crate::client::{
    S7Client, S7_WL_BIT, S7_WL_BYTE, S7_WL_CHAR, S7_WL_DINT, S7_WL_DWORD, S7_WL_INT, S7_WL_REAL,
    S7_WL_WORD,
};
use crate::codec::{NckCodec, S7Codec, WireCodec};
use crate::error::S7Error;
use crate::multivar::{length_field, DataItem, VarAddress, WriteLayout};
use crate::telegrams::{
    Telegram, DRV_DO_NUMBER, DRV_INDEX, DRV_MRW_ITEM, DRV_PARAMETER, DRV_ROWS, DRV_WORD_LEN,
    NCK_AREA_UNIT, NCK_MODULE, NCK_MRW_ITEM, NCK_PARAMETER, NCK_ROWS, NCK_START, S7_DRV_RW,
    S7_NCK_RW, TS_RES_BIT, TS_RES_BYTE, TS_RES_OCTET, TS_RES_REAL,
};
use crate::transport::MessageTransport;

// NCK areas
pub const NCK_AREA_N: u8 = 0; // NCK
pub const NCK_AREA_B: u8 = 1; // Mode group
pub const NCK_AREA_C: u8 = 2; // Channel
pub const NCK_AREA_A: u8 = 3; // Axis
pub const NCK_AREA_T: u8 = 4; // Tool
pub const NCK_AREA_V: u8 = 5; // Feed drive
pub const NCK_AREA_H: u8 = 6; // Main drive
pub const NCK_AREA_M: u8 = 7; // MMC

// NCK word lengths (the S7 ones plus double and string)
pub const NCK_WL_BIT: u8 = S7_WL_BIT;
pub const NCK_WL_BYTE: u8 = S7_WL_BYTE;
pub const NCK_WL_CHAR: u8 = S7_WL_CHAR;
pub const NCK_WL_WORD: u8 = S7_WL_WORD;
pub const NCK_WL_INT: u8 = S7_WL_INT;
pub const NCK_WL_DWORD: u8 = S7_WL_DWORD;
pub const NCK_WL_DINT: u8 = S7_WL_DINT;
pub const NCK_WL_DOUBLE: u8 = 0x1A;
pub const NCK_WL_STRING: u8 = 0x13;

/// Slot of the NC kernel
pub const NCK_SLOT: u16 = 3;
/// Slot of the drive main CU
pub const DRV_MAIN_CU_SLOT: u16 = 9;

/// Size in bytes of one NCK element, 0 for unknown word lengths.
pub fn nck_data_size_byte(word_len: u8) -> usize {
    match word_len {
        NCK_WL_BIT | NCK_WL_BYTE | NCK_WL_CHAR => 1,
        NCK_WL_WORD | NCK_WL_INT => 2,
        NCK_WL_DWORD | NCK_WL_DINT => 4,
        NCK_WL_DOUBLE => 8,
        NCK_WL_STRING => NckCodec::STRING_LEN,
        _ => 0,
    }
}

/// Size in bytes of one drive parameter element, 0 for unknown word lengths.
pub fn drv_data_size_byte(word_len: u8) -> usize {
    match word_len {
        S7_WL_BYTE => 1,
        S7_WL_WORD | S7_WL_INT => 2,
        S7_WL_DWORD | S7_WL_DINT | S7_WL_REAL => 4,
        _ => 0,
    }
}

/// ### NCK variable address
///
/// The fields match the NC-Var selector: area and unit, module, parameter number,
/// first row (`start`) and row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NckTag {
    pub area: u8,
    pub unit: u8,
    pub module: u8,
    pub parameter: u16,
    pub start: u16,
    pub amount: u8,
    pub word_len: u8,
}

impl NckTag {
    /// Validates the word length. Bits are read one at a time.
    pub fn new(
        area: u8,
        unit: u8,
        module: u8,
        parameter: u16,
        start: u16,
        amount: u8,
        word_len: u8,
    ) -> Result<Self, S7Error> {
        if nck_data_size_byte(word_len) == 0 {
            return Err(S7Error::InvalidWordLength);
        }
        let amount = if word_len == NCK_WL_BIT { 1 } else { amount };
        Ok(NckTag { area, unit, module, parameter, start, amount, word_len })
    }

    fn area_unit(&self) -> u8 {
        (self.area << 4).wrapping_add(self.unit)
    }
}

impl VarAddress for NckTag {
    const SPEC_LEN: usize = NCK_MRW_ITEM.len();

    fn encode_spec(&self) -> Vec<u8> {
        let mut spec = NCK_MRW_ITEM.to_vec();
        spec[3] = self.area_unit();
        S7Codec::set_word_at(&mut spec, 4, self.parameter);
        S7Codec::set_word_at(&mut spec, 6, self.start);
        spec[8] = self.module;
        spec[9] = self.amount;
        spec
    }

    fn byte_size(&self) -> usize {
        self.amount as usize * nck_data_size_byte(self.word_len)
    }

    /// NCK variables are always written as octet strings of one element.
    fn write_layout(&self) -> WriteLayout {
        let size = match self.word_len {
            NCK_WL_BIT | NCK_WL_BYTE => 1,
            NCK_WL_DOUBLE => 8,
            NCK_WL_STRING => NckCodec::STRING_LEN,
            _ => 4,
        };
        WriteLayout {
            transport: TS_RES_OCTET,
            size,
            length: length_field(TS_RES_OCTET, size, &[TS_RES_OCTET, TS_RES_BIT, TS_RES_REAL]),
        }
    }
}

/// ### Drive parameter address
///
/// Drive object number, parameter number, first index (`start`) and index count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrvTag {
    pub do_number: u16,
    pub parameter: u16,
    pub start: u16,
    pub amount: u16,
    pub word_len: u8,
}

impl DrvTag {
    pub fn new(do_number: u16, parameter: u16, start: u16, amount: u16, word_len: u8) -> Result<Self, S7Error> {
        if drv_data_size_byte(word_len) == 0 {
            return Err(S7Error::InvalidWordLength);
        }
        Ok(DrvTag { do_number, parameter, start, amount, word_len })
    }
}

impl VarAddress for DrvTag {
    const SPEC_LEN: usize = DRV_MRW_ITEM.len();

    fn encode_spec(&self) -> Vec<u8> {
        let mut spec = DRV_MRW_ITEM.to_vec();
        spec[3] = self.word_len;
        S7Codec::set_word_at(&mut spec, 4, self.amount);
        S7Codec::set_word_at(&mut spec, 6, self.do_number);
        S7Codec::set_word_at(&mut spec, 8, self.parameter);
        S7Codec::set_word_at(&mut spec, 10, self.start);
        spec
    }

    fn byte_size(&self) -> usize {
        self.amount as usize * drv_data_size_byte(self.word_len)
    }

    fn write_layout(&self) -> WriteLayout {
        let (transport, size) = match self.word_len {
            S7_WL_REAL => (TS_RES_REAL, 4),
            S7_WL_DWORD | S7_WL_DINT => (TS_RES_BYTE, 4),
            _ => (TS_RES_BYTE, 2),
        };
        WriteLayout {
            transport,
            size,
            length: length_field(transport, size, &[TS_RES_OCTET, TS_RES_BIT, TS_RES_REAL]),
        }
    }
}

pub type NckDataItem = DataItem<NckTag>;
pub type DrvDataItem = DataItem<DrvTag>;

impl<T: MessageTransport> S7Client<T> {
    /// ### Connects to the NC kernel of a Sinumerik control
    ///
    /// Same as `connect_to(host, rack, 3)`.
    pub fn nck_connect_to(&mut self, host: &str, rack: u16) -> Result<(), S7Error> {
        self.connect_to(host, rack, NCK_SLOT)
    }

    /// ### Connects to a Sinumerik drive
    ///
    /// Use `DRV_MAIN_CU_SLOT` for the main CU; NX extensions usually start at slot 13
    /// (check the drive configuration).
    pub fn drv_connect_to(&mut self, host: &str, rack: u16, slot: u16) -> Result<(), S7Error> {
        self.connect_to(host, rack, slot)
    }

    /// ### Reads rows of one NCK variable
    ///
    /// ### Parameters
    /// - `area`, `unit`, `module`, `parameter`: NC-Var selector of the variable.
    /// - `start`: first row.
    /// - `amount`: number of rows.
    /// - `word_len`: one of the `NCK_WL_*` constants.
    /// - `buffer`: destination, at least `amount * nck_data_size_byte(word_len)` bytes.
    ///
    /// ### Returns
    /// The number of bytes read. Values are little-endian, see [`crate::codec::NckCodec`].
    #[allow(clippy::too_many_arguments)]
    pub fn read_nck_area(
        &mut self,
        area: u8,
        unit: u8,
        module: u8,
        parameter: u16,
        start: u16,
        amount: usize,
        word_len: u8,
        buffer: &mut [u8],
    ) -> Result<usize, S7Error> {
        let started = Instant::now();
        self.chunks = 0;
        self.transferred = 0;
        let result = match nck_data_size_byte(word_len) {
            0 => Err(S7Error::InvalidWordLength),
            word_size => {
                let area_unit = (area << 4).wrapping_add(unit);
                // Rows travel in a single byte
                self.read_fragments(amount, word_size, u8::MAX as usize, buffer, |first, count| {
                    Telegram::from_template(&S7_NCK_RW)
                        .byte(NCK_AREA_UNIT, area_unit)
                        .word(NCK_PARAMETER, parameter)
                        .word(NCK_START, start.wrapping_add(first as u16))
                        .byte(NCK_MODULE, module)
                        .byte(NCK_ROWS, count as u8)
                })
            }
        };
        self.finish(started, result)
    }

    /// ### Reads indexes of one drive parameter
    ///
    /// ### Parameters
    /// - `do_number`: drive object.
    /// - `parameter`: parameter number.
    /// - `start`: first index.
    /// - `amount`: number of indexes.
    /// - `word_len`: `S7_WL_BYTE`, `S7_WL_WORD`, `S7_WL_INT`, `S7_WL_DWORD`, `S7_WL_DINT` or `S7_WL_REAL`.
    /// - `buffer`: destination, at least `amount * drv_data_size_byte(word_len)` bytes.
    ///
    /// ### Returns
    /// The number of bytes read (big-endian values).
    pub fn read_drv_area(
        &mut self,
        do_number: u16,
        parameter: u16,
        start: u16,
        amount: usize,
        word_len: u8,
        buffer: &mut [u8],
    ) -> Result<usize, S7Error> {
        let started = Instant::now();
        self.chunks = 0;
        self.transferred = 0;
        let result = match drv_data_size_byte(word_len) {
            0 => Err(S7Error::InvalidWordLength),
            word_size => self.read_fragments(amount, word_size, u16::MAX as usize, buffer, |first, count| {
                Telegram::from_template(&S7_DRV_RW)
                    .byte(DRV_WORD_LEN, word_len)
                    .word(DRV_ROWS, count as u16)
                    .word(DRV_DO_NUMBER, do_number)
                    .word(DRV_PARAMETER, parameter)
                    .word(DRV_INDEX, start.wrapping_add(first as u16))
            }),
        };
        self.finish(started, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_sizes() {
        assert_eq!(nck_data_size_byte(NCK_WL_BIT), 1);
        assert_eq!(nck_data_size_byte(NCK_WL_INT), 2);
        assert_eq!(nck_data_size_byte(NCK_WL_DINT), 4);
        assert_eq!(nck_data_size_byte(NCK_WL_DOUBLE), 8);
        assert_eq!(nck_data_size_byte(NCK_WL_STRING), 16);
        assert_eq!(nck_data_size_byte(S7_WL_REAL), 0);

        assert_eq!(drv_data_size_byte(S7_WL_REAL), 4);
        assert_eq!(drv_data_size_byte(S7_WL_WORD), 2);
        assert_eq!(drv_data_size_byte(S7_WL_BIT), 0);
    }

    #[test]
    fn nck_spec_layout() {
        let tag = NckTag::new(NCK_AREA_C, 1, 0x41, 0x0102, 3, 2, NCK_WL_DOUBLE).unwrap();
        assert_eq!(
            tag.encode_spec(),
            vec![0x12, 0x08, 0x82, 0x21, 0x01, 0x02, 0x00, 0x03, 0x41, 0x02]
        );
        assert_eq!(tag.byte_size(), 16);
        assert_eq!(tag.write_layout(), WriteLayout { transport: TS_RES_OCTET, size: 8, length: 8 });
    }

    #[test]
    fn nck_bits_are_single() {
        let tag = NckTag::new(NCK_AREA_N, 0, 0, 1, 0, 9, NCK_WL_BIT).unwrap();
        assert_eq!(tag.amount, 1);
        assert_eq!(tag.write_layout().size, 1);
        assert_eq!(NckTag::new(NCK_AREA_N, 0, 0, 1, 0, 1, 0x42), Err(S7Error::InvalidWordLength));
    }

    #[test]
    fn drive_spec_layout() {
        let tag = DrvTag::new(2, 0x0403, 5, 1, S7_WL_REAL).unwrap();
        assert_eq!(
            tag.encode_spec(),
            vec![0x12, 0x0a, 0xa2, 0x08, 0x00, 0x01, 0x00, 0x02, 0x04, 0x03, 0x00, 0x05]
        );
        assert_eq!(tag.write_layout(), WriteLayout { transport: TS_RES_REAL, size: 4, length: 4 });

        let dint = DrvTag::new(2, 10, 0, 1, S7_WL_DINT).unwrap();
        assert_eq!(dint.write_layout(), WriteLayout { transport: TS_RES_BYTE, size: 4, length: 32 });

        let word = DrvTag::new(2, 10, 0, 1, S7_WL_WORD).unwrap();
        assert_eq!(word.write_layout(), WriteLayout { transport: TS_RES_BYTE, size: 2, length: 16 });
    }
}
