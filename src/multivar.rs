// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! Multi item read/write.
//!
//! One telegram carries up to [`MAX_VARS`] items. The engine is the same for every
//! protocol variant: S7 areas, Sinumerik NCK variables and drive parameters only
//! differ in the item spec they put in the parameter block and in the transport
//! size they declare when writing. That difference is captured by [`VarAddress`].

use std::time::Instant;

use tracing::debug;

use crate::client::{
    data_size_byte, S7Client, MAX_VARS, S7_AREA_CT, S7_AREA_DB, S7_AREA_TM, S7_WL_BIT, S7_WL_BYTE,
    S7_WL_COUNTER, S7_WL_TIMER,
};
use crate::area::{MAX_BYTE_ADDRESS, MAX_RAW_ADDRESS};
use crate::codec::{S7Codec, WireCodec};
use crate::error::{cpu_error, item_error, S7Error};
use crate::telegrams::{
    Telegram, POS_DATA_LEN, POS_FUNCTION, POS_ITEMS_COUNT, POS_PAR_LEN, RES_SUCCESS, S7_MRW_HEADER,
    S7_MRW_ITEM, TS_RES_BIT, TS_RES_BYTE, TS_RES_OCTET, TS_RES_REAL,
};
use crate::transport::MessageTransport;

/// Header of a multi item reply up to the first item
const MULTI_RES_HEADER: usize = 21;

/// ### How an item is written on the wire
///
/// - `transport`: transport size byte of the data item header.
/// - `size`: payload bytes taken from the item data.
/// - `length`: value of the length field (bits or bytes depending on `transport`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteLayout {
    pub transport: u8,
    pub size: usize,
    pub length: u16,
}

/// ### Address of a multi read/write item
///
/// Implemented by [`S7Tag`], [`crate::sinumerik::NckTag`] and [`crate::sinumerik::DrvTag`].
pub trait VarAddress {
    /// Length of the item spec inside the parameter block
    const SPEC_LEN: usize;

    /// Item spec bytes, exactly `SPEC_LEN` long.
    fn encode_spec(&self) -> Vec<u8>;

    /// Bytes expected back when the item is read.
    fn byte_size(&self) -> usize;

    /// Data item header and payload size used when the item is written.
    fn write_layout(&self) -> WriteLayout;
}

/// Length field of a data item: bits unless the transport size counts bytes.
pub(crate) fn length_field(transport: u8, size: usize, byte_counted: &[u8]) -> u16 {
    if byte_counted.contains(&transport) {
        size as u16
    } else {
        (size * 8) as u16
    }
}

/// ### S7 area variable
///
/// Built with [`S7Tag::new`], which converts every word length to what the PLC
/// actually addresses: single bits, counters, timers or plain bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct S7Tag {
    area: u8,
    word_len: u8,
    db_number: u16,
    start: u32,
    amount: u16,
}

impl S7Tag {
    /// ### Creates an S7 item address
    ///
    /// ### Parameters
    /// - `area`: S7 area constant.
    /// - `db_number`: DB number (ignored for non-DB areas).
    /// - `start`: first byte (or bit index for `S7_WL_BIT`).
    /// - `amount`: number of `word_len` elements.
    /// - `word_len`: word length constant.
    ///
    /// ### Errors
    /// - `S7Error::InvalidWordLength`: unknown word length.
    /// - `S7Error::InvalidParams`: the start does not fit the 24 bit address, or the size overflows.
    pub fn new(area: u8, db_number: u16, start: u32, amount: u16, word_len: u8) -> Result<Self, S7Error> {
        let word_size = data_size_byte(word_len);
        if word_size == 0 {
            return Err(S7Error::InvalidWordLength);
        }
        let word_len = match area {
            S7_AREA_CT => S7_WL_COUNTER,
            S7_AREA_TM => S7_WL_TIMER,
            _ => word_len,
        };
        let (amount, start, word_len) = match word_len {
            S7_WL_BIT => (1, start, word_len),
            S7_WL_COUNTER | S7_WL_TIMER => (amount, start, word_len),
            _ => {
                if start > MAX_BYTE_ADDRESS {
                    return Err(S7Error::InvalidParams);
                }
                let bytes = amount.checked_mul(word_size as u16).ok_or(S7Error::InvalidParams)?;
                (bytes, start << 3, S7_WL_BYTE)
            }
        };
        if start > MAX_RAW_ADDRESS {
            return Err(S7Error::InvalidParams);
        }
        Ok(S7Tag { area, word_len, db_number, start, amount })
    }

    pub fn area(&self) -> u8 {
        self.area
    }

    /// Word length after adjustment (bit, byte, counter or timer)
    pub fn word_len(&self) -> u8 {
        self.word_len
    }

    pub fn db_number(&self) -> u16 {
        self.db_number
    }

    /// Wire address (bits for byte oriented items)
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Element count after adjustment
    pub fn amount(&self) -> u16 {
        self.amount
    }
}

impl VarAddress for S7Tag {
    const SPEC_LEN: usize = S7_MRW_ITEM.len();

    fn encode_spec(&self) -> Vec<u8> {
        let mut spec = S7_MRW_ITEM.to_vec();
        spec[3] = self.word_len;
        S7Codec::set_word_at(&mut spec, 4, self.amount);
        if self.area == S7_AREA_DB {
            S7Codec::set_word_at(&mut spec, 6, self.db_number);
        }
        spec[8] = self.area;
        spec[9] = ((self.start >> 16) & 0xFF) as u8;
        spec[10] = ((self.start >> 8) & 0xFF) as u8;
        spec[11] = (self.start & 0xFF) as u8;
        spec
    }

    fn byte_size(&self) -> usize {
        match self.word_len {
            S7_WL_BIT => 1,
            S7_WL_COUNTER | S7_WL_TIMER => self.amount as usize * 2,
            _ => self.amount as usize,
        }
    }

    fn write_layout(&self) -> WriteLayout {
        let transport = match self.word_len {
            S7_WL_BIT => TS_RES_BIT,
            S7_WL_COUNTER | S7_WL_TIMER => TS_RES_OCTET,
            _ => TS_RES_BYTE,
        };
        let size = self.byte_size();
        WriteLayout {
            transport,
            size,
            length: length_field(transport, size, &[TS_RES_OCTET, TS_RES_BIT]),
        }
    }
}

/// ### One item of a multi read/write
///
/// The item owns its data region. For reads it is sized from the address and filled
/// by the engine; for writes the caller fills it before the call.
///
/// `result` starts as `Err(ItemNotAvailable)` and is only set once the PLC has
/// answered for this specific item.
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem<A> {
    pub address: A,
    pub data: Vec<u8>,
    pub result: Result<(), S7Error>,
}

impl<A: VarAddress> DataItem<A> {
    /// Item with a zeroed data region of the expected size.
    pub fn new(address: A) -> Self {
        let data = vec![0u8; address.byte_size()];
        DataItem { address, data, result: Err(S7Error::ItemNotAvailable) }
    }

    /// Item carrying the bytes to be written.
    pub fn with_data(address: A, data: Vec<u8>) -> Self {
        DataItem { address, data, result: Err(S7Error::ItemNotAvailable) }
    }
}

pub type S7DataItem = DataItem<S7Tag>;

impl<T: MessageTransport> S7Client<T> {
    /// ### Reads several variables in a single telegram
    ///
    /// Works with any item address: [`S7Tag`] for S7 areas, [`crate::sinumerik::NckTag`]
    /// and [`crate::sinumerik::DrvTag`] for Sinumerik controls.
    ///
    /// ### Returns
    /// `Ok(())` when the PLC answered. Each item then carries its own `result`: an item
    /// can fail (e.g. address out of range) while the others succeed.
    ///
    /// ### Errors
    /// - `S7Error::TooManyItems`: more than 20 items, nothing was sent.
    /// - `S7Error::SizeOverPdu`: the request does not fit the negotiated PDU, nothing was sent.
    /// - `S7Error::InvalidPlcAnswer`: the reply item count does not match.
    /// - CPU errors: the whole job was refused, no item result is touched.
    ///
    /// ### Notes
    /// The reply must fit the PDU too: keep the sum of the item sizes (plus 4 bytes per item)
    /// below `pdu_length() - 18`.
    pub fn read_multi_vars<A: VarAddress>(&mut self, items: &mut [DataItem<A>]) -> Result<(), S7Error> {
        let started = Instant::now();
        let result = self.do_read_multi_vars(items);
        self.finish(started, result)
    }

    fn do_read_multi_vars<A: VarAddress>(&mut self, items: &mut [DataItem<A>]) -> Result<(), S7Error> {
        let count = check_item_count(items.len())?;

        let mut telegram = Telegram::from_template(&S7_MRW_HEADER)
            .word(POS_PAR_LEN, (count * A::SPEC_LEN + 2) as u16)
            .byte(POS_ITEMS_COUNT, count as u8);
        for item in items.iter() {
            telegram = telegram.append(&item.address.encode_spec());
        }
        if telegram.len() > self.pdu_length() as usize {
            return Err(S7Error::SizeOverPdu);
        }
        let telegram = telegram.sealed();

        let length = self.exchange(&telegram)?;
        if length < MULTI_RES_HEADER + 1 {
            return Err(S7Error::InvalidPdu);
        }
        cpu_error(S7Codec::get_word_at(&self.pdu, 17))?;
        if self.pdu[20] as usize != count {
            return Err(S7Error::InvalidPlcAnswer);
        }

        let mut offset = MULTI_RES_HEADER;
        for item in items.iter_mut() {
            if offset + 4 > length {
                return Err(S7Error::InvalidPlcAnswer);
            }
            let marker = self.pdu[offset];
            if marker != RES_SUCCESS {
                item.result = Err(item_error(marker));
                offset += 4;
                continue;
            }
            let transport = self.pdu[offset + 1];
            let mut size = S7Codec::get_word_at(&self.pdu, offset + 2) as usize;
            if !matches!(transport, TS_RES_OCTET | TS_RES_REAL | TS_RES_BIT) {
                size >>= 3;
            }
            if offset + 4 + size > length {
                return Err(S7Error::InvalidPlcAnswer);
            }
            let payload = &self.pdu[offset + 4..offset + 4 + size];
            item.result = match item.data.get_mut(..size) {
                Some(dst) => {
                    dst.copy_from_slice(payload);
                    Ok(())
                }
                None => Err(S7Error::BufferTooSmall),
            };
            // Items are word aligned, except the last one
            if size % 2 != 0 {
                size += 1;
            }
            offset += 4 + size;
        }
        debug!(items = count, "multi read");
        Ok(())
    }

    /// ### Writes several variables in a single telegram
    ///
    /// Each item must hold at least the payload its address declares (see
    /// [`VarAddress::write_layout`]).
    ///
    /// ### Returns
    /// The number of payload bytes sent (alignment padding excluded). Per item
    /// results are stored in the items.
    ///
    /// ### Errors
    /// Same as `read_multi_vars()`, plus `S7Error::InvalidParams` when an item carries
    /// less data than declared (nothing is sent).
    pub fn write_multi_vars<A: VarAddress>(&mut self, items: &mut [DataItem<A>]) -> Result<usize, S7Error> {
        let started = Instant::now();
        let result = self.do_write_multi_vars(items);
        self.finish(started, result)
    }

    fn do_write_multi_vars<A: VarAddress>(&mut self, items: &mut [DataItem<A>]) -> Result<usize, S7Error> {
        let count = check_item_count(items.len())?;

        let mut telegram = Telegram::from_template(&S7_MRW_HEADER)
            .word(POS_PAR_LEN, (count * A::SPEC_LEN + 2) as u16)
            .byte(POS_FUNCTION, 0x05)
            .byte(POS_ITEMS_COUNT, count as u8);
        for item in items.iter() {
            telegram = telegram.append(&item.address.encode_spec());
        }

        let mut data_len = 0;
        let mut payload_bytes = 0;
        for item in items.iter() {
            let layout = item.address.write_layout();
            let payload = item.data.get(..layout.size).ok_or(S7Error::InvalidParams)?;
            let [len_hi, len_lo] = layout.length.to_be_bytes();
            telegram = telegram.append(&[0x00, layout.transport, len_hi, len_lo]).append(payload);
            data_len += 4 + layout.size;
            payload_bytes += layout.size;
            if layout.size % 2 != 0 {
                telegram = telegram.append(&[0x00]);
                data_len += 1;
            }
        }
        if telegram.len() > self.pdu_length() as usize {
            return Err(S7Error::SizeOverPdu);
        }
        let telegram = telegram.word(POS_DATA_LEN, data_len as u16).sealed();

        let length = self.exchange(&telegram)?;
        if length < MULTI_RES_HEADER {
            return Err(S7Error::InvalidPdu);
        }
        cpu_error(S7Codec::get_word_at(&self.pdu, 17))?;
        if self.pdu[20] as usize != count || length < MULTI_RES_HEADER + count {
            return Err(S7Error::InvalidPlcAnswer);
        }
        for (c, item) in items.iter_mut().enumerate() {
            item.result = match self.pdu[MULTI_RES_HEADER + c] {
                RES_SUCCESS => Ok(()),
                code => Err(item_error(code)),
            };
        }
        debug!(items = count, bytes = payload_bytes, "multi write");
        Ok(payload_bytes)
    }
}

fn check_item_count(count: usize) -> Result<usize, S7Error> {
    match count {
        0 => Err(S7Error::InvalidParams),
        c if c > MAX_VARS => Err(S7Error::TooManyItems),
        c => Ok(c),
    }
}
