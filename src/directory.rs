// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! Block directory: block counts, block numbers, block info and whole-DB helpers.

use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::client::S7Client;
use crate::codec::{get_chars_at, siemens_date, S7Codec, WireCodec};
use crate::error::{cpu_error, S7Error};
use crate::telegrams::{
    Telegram, BI_NUMBER, BI_TYPE, LBT_FIRST_DATA, LBT_NEXT_DATA, POS_SEQ, RES_SUCCESS, S7_BI,
    S7_LIST_BLOCKS, S7_LIST_BLOCKS_OF_TYPE,
};
use crate::transport::MessageTransport;

// Block types
pub const BLOCK_OB: u8 = 0x38;
pub const BLOCK_DB: u8 = 0x41;
pub const BLOCK_SDB: u8 = 0x42;
pub const BLOCK_FC: u8 = 0x43;
pub const BLOCK_SFC: u8 = 0x44;
pub const BLOCK_FB: u8 = 0x45;
pub const BLOCK_SFB: u8 = 0x46;

// Sub block types (as found in block info)
pub const SUB_BLK_OB: u8 = 0x08;
pub const SUB_BLK_DB: u8 = 0x0A;
pub const SUB_BLK_SDB: u8 = 0x0B;
pub const SUB_BLK_FC: u8 = 0x0C;
pub const SUB_BLK_SFC: u8 = 0x0D;
pub const SUB_BLK_FB: u8 = 0x0E;
pub const SUB_BLK_SFB: u8 = 0x0F;

// Block languages
pub const BLOCK_LANG_AWL: u8 = 0x01;
pub const BLOCK_LANG_KOP: u8 = 0x02;
pub const BLOCK_LANG_FUP: u8 = 0x03;
pub const BLOCK_LANG_SCL: u8 = 0x04;
pub const BLOCK_LANG_DB: u8 = 0x05;
pub const BLOCK_LANG_GRAPH: u8 = 0x06;

/// Minimum directory reply
const DIR_RES_MIN: usize = 32;
/// Block info reply up to the checksum
const BI_RES_LEN: usize = 103;
/// The PLC never lists more blocks of one type
const MAX_BLOCKS_OF_TYPE: usize = 0x8000;

/// Number of blocks per type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct S7BlocksList {
    pub ob_count: u16,
    pub fb_count: u16,
    pub fc_count: u16,
    pub sfb_count: u16,
    pub sfc_count: u16,
    pub db_count: u16,
    pub sdb_count: u16,
}

/// ### Block info as stored in the PLC
///
/// Dates are `None` when the stored day count does not form a valid date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct S7BlockInfo {
    /// Sub block type (`SUB_BLK_*`)
    pub block_type: u8,
    pub block_number: u16,
    /// `BLOCK_LANG_*`
    pub language: u8,
    pub flags: u8,
    /// The real size in bytes
    pub mc7_size: u16,
    pub load_size: i32,
    pub local_data: u16,
    pub sbb_length: u16,
    pub checksum: u16,
    pub version: u8,
    pub code_date: Option<NaiveDate>,
    pub intf_date: Option<NaiveDate>,
    pub author: String,
    pub family: String,
    pub header: String,
}

impl<T: MessageTransport> S7Client<T> {
    /// ### Returns the number of blocks per type
    ///
    /// ### Errors
    /// - `S7Error::InvalidPdu`: reply too short or truncated.
    /// - CPU errors reported in the reply.
    pub fn list_blocks(&mut self) -> Result<S7BlocksList, S7Error> {
        let started = Instant::now();
        let result = self.do_list_blocks();
        self.finish(started, result)
    }

    fn do_list_blocks(&mut self) -> Result<S7BlocksList, S7Error> {
        let sequence = self.next_word();
        // The sequence is the only little-endian field of the telegram
        let request = Telegram::from_template(&S7_LIST_BLOCKS).bytes(POS_SEQ, &sequence.to_le_bytes());
        let length = self.exchange(&request)?;
        if length <= DIR_RES_MIN {
            return Err(S7Error::InvalidPdu);
        }
        cpu_error(S7Codec::get_word_at(&self.pdu, 27))?;

        let blocks_size = S7Codec::get_word_at(&self.pdu, 31) as usize;
        if length <= DIR_RES_MIN + blocks_size {
            return Err(S7Error::InvalidPdu);
        }
        let mut list = S7BlocksList::default();
        for record in 0..blocks_size >> 2 {
            let pos = 34 + (record << 2);
            let count = S7Codec::get_word_at(&self.pdu, pos + 1);
            match self.pdu[pos] {
                BLOCK_OB => list.ob_count = count,
                BLOCK_DB => list.db_count = count,
                BLOCK_SDB => list.sdb_count = count,
                BLOCK_FC => list.fc_count = count,
                BLOCK_SFC => list.sfc_count = count,
                BLOCK_FB => list.fb_count = count,
                BLOCK_SFB => list.sfb_count = count,
                _ => {}
            }
        }
        Ok(list)
    }

    /// ### Returns the numbers of all blocks of a given type
    ///
    /// ### Parameters
    /// - `block_type`: one of the `BLOCK_*` constants.
    /// - `list`: receives the block numbers.
    ///
    /// ### Returns
    /// The number of entries written into `list`.
    ///
    /// ### Errors
    /// - `S7Error::PartialDataRead`: `list` is too small, it holds the first entries.
    /// - `S7Error::ItemNotAvailable`: no such block type in the PLC.
    /// - `S7Error::InvalidPdu`, CPU errors.
    ///
    /// ### Notes
    /// Long lists come in several telegrams, the exchange goes on until the PLC
    /// flags the last one.
    pub fn list_blocks_of_type(&mut self, block_type: u8, list: &mut [u16]) -> Result<usize, S7Error> {
        let started = Instant::now();
        let result = self.do_list_blocks_of_type(block_type, list);
        self.finish(started, result)
    }

    fn do_list_blocks_of_type(&mut self, block_type: u8, list: &mut [u16]) -> Result<usize, S7Error> {
        let mut first = true;
        let mut in_seq = 0u8;
        let mut count = 0;
        loop {
            let sequence = self.next_word();
            let mut request = Telegram::from_template(&S7_LIST_BLOCKS_OF_TYPE)
                .bytes(POS_SEQ, &sequence.to_le_bytes())
                .byte(0x17, 0x02)
                .byte(0x18, in_seq);
            if first {
                request = request.append(&LBT_FIRST_DATA).byte(0x19 + 5, block_type);
            } else {
                request = request
                    .word(0x0d, 12)
                    .word(0x0f, 4)
                    .byte(0x14, 8)
                    .byte(0x15, 0x12)
                    .append(&LBT_NEXT_DATA);
            }
            let request = request.sealed();

            let length = self.exchange(&request)?;
            if length <= DIR_RES_MIN {
                return Err(S7Error::InvalidPdu);
            }
            cpu_error(S7Codec::get_word_at(&self.pdu, 0x1b))?;
            if self.pdu[0x1d] != RES_SUCCESS {
                return Err(S7Error::ItemNotAvailable);
            }
            let mut done = self.pdu[0x1a] == 0;
            in_seq = self.pdu[0x18];

            let in_this = (S7Codec::get_word_at(&self.pdu, 0x1f) >> 2) as usize;
            if 0x21 + 4 * in_this > length {
                return Err(S7Error::InvalidPdu);
            }
            for c in 0..in_this {
                let slot = list.get_mut(count).ok_or(S7Error::PartialDataRead)?;
                *slot = S7Codec::get_word_at(&self.pdu, 0x21 + 4 * c);
                count += 1;
                done |= count == MAX_BLOCKS_OF_TYPE;
            }
            if done {
                break;
            }
            first = false;
        }
        debug!(block_type, count, "blocks of type listed");
        Ok(count)
    }

    /// ### Returns detailed information about a block present in the PLC
    ///
    /// ### Parameters
    /// - `block_type`: one of the `BLOCK_*` constants.
    /// - `block_number`: block number.
    pub fn get_ag_block_info(&mut self, block_type: u8, block_number: u16) -> Result<S7BlockInfo, S7Error> {
        let started = Instant::now();
        let result = self.do_get_ag_block_info(block_type, block_number);
        self.finish(started, result)
    }

    fn do_get_ag_block_info(&mut self, block_type: u8, block_number: u16) -> Result<S7BlockInfo, S7Error> {
        let digits = format!("{:05}", block_number);
        let request = Telegram::from_template(&S7_BI)
            .byte(BI_TYPE, block_type)
            .bytes(BI_NUMBER, digits.as_bytes());
        let length = self.exchange(&request)?;
        if length <= DIR_RES_MIN {
            return Err(S7Error::InvalidPdu);
        }
        cpu_error(S7Codec::get_word_at(&self.pdu, 27))?;
        if length < BI_RES_LEN {
            return Err(S7Error::InvalidPlcAnswer);
        }
        let pdu = &self.pdu;
        Ok(S7BlockInfo {
            flags: pdu[42],
            language: pdu[43],
            block_type: pdu[44],
            block_number: S7Codec::get_word_at(pdu, 45),
            load_size: S7Codec::get_dint_at(pdu, 47),
            code_date: siemens_date(S7Codec::get_word_at(pdu, 59)),
            intf_date: siemens_date(S7Codec::get_word_at(pdu, 65)),
            sbb_length: S7Codec::get_word_at(pdu, 67),
            local_data: S7Codec::get_word_at(pdu, 71),
            mc7_size: S7Codec::get_word_at(pdu, 73),
            author: get_chars_at(pdu, 75, 8),
            family: get_chars_at(pdu, 83, 8),
            header: get_chars_at(pdu, 91, 8),
            version: pdu[99],
            checksum: S7Codec::get_word_at(pdu, 101),
        })
    }

    /// ### Uploads a whole DB
    ///
    /// The size is taken from the block info, so the DB is read entirely
    /// whatever its length.
    ///
    /// ### Returns
    /// The DB size, `buffer[..size]` holds its content.
    ///
    /// ### Errors
    /// - `S7Error::BufferTooSmall`: `buffer` is smaller than the DB (nothing is read).
    /// - Any error of `get_ag_block_info()` or `read_db()`.
    pub fn db_get(&mut self, db_number: u16, buffer: &mut [u8]) -> Result<usize, S7Error> {
        let started = Instant::now();
        let result = self.do_db_get(db_number, buffer);
        self.finish(started, result)
    }

    fn do_db_get(&mut self, db_number: u16, buffer: &mut [u8]) -> Result<usize, S7Error> {
        let size = self.get_ag_block_info(BLOCK_DB, db_number)?.mc7_size as usize;
        let dst = buffer.get_mut(..size).ok_or(S7Error::BufferTooSmall)?;
        self.read_db(db_number, 0, dst)
    }

    /// ### Fills a whole DB with `fill`
    ///
    /// ### Returns
    /// The number of bytes written (the DB size).
    pub fn db_fill(&mut self, db_number: u16, fill: u8) -> Result<usize, S7Error> {
        let started = Instant::now();
        let result = self
            .get_ag_block_info(BLOCK_DB, db_number)
            .and_then(|info| self.write_db(db_number, 0, &vec![fill; info.mc7_size as usize]));
        self.finish(started, result)
    }

    /// Not implemented, always `FunctionNotImplemented`.
    pub fn upload(&mut self, _block_type: u8, _block_number: u16, _buffer: &mut [u8]) -> Result<usize, S7Error> {
        self.not_implemented()
    }

    /// Not implemented, always `FunctionNotImplemented`.
    pub fn full_upload(&mut self, _block_type: u8, _block_number: u16, _buffer: &mut [u8]) -> Result<usize, S7Error> {
        self.not_implemented()
    }

    /// Not implemented, always `FunctionNotImplemented`.
    pub fn download(&mut self, _block_number: u16, _data: &[u8]) -> Result<(), S7Error> {
        self.not_implemented()
    }

    /// Not implemented, always `FunctionNotImplemented`.
    pub fn delete(&mut self, _block_type: u8, _block_number: u16) -> Result<(), S7Error> {
        self.not_implemented()
    }

    /// Not implemented, always `FunctionNotImplemented`.
    pub fn get_pg_block_info(&mut self, _block: &[u8]) -> Result<S7BlockInfo, S7Error> {
        self.not_implemented()
    }
}
