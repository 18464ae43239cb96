// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! Single area read/write and the lean helpers built on top of it.

use std::time::Instant;

use tracing::debug;

use crate::client::{
    data_size_byte, S7Client, S7_AREA_CT, S7_AREA_DB, S7_AREA_MK, S7_AREA_PA, S7_AREA_PE,
    S7_AREA_TM, S7_WL_BIT, S7_WL_BYTE, S7_WL_COUNTER, S7_WL_TIMER,
};
use crate::error::{item_error, S7Error};
use crate::telegrams::{
    Telegram, POS_DATA_LEN, POS_FUNCTION, READ_RES_HEADER, RES_SUCCESS, RW_ADDRESS, RW_AREA,
    RW_DATA_LEN, RW_DB_NUMBER, RW_NUM_ELEMENTS, RW_TRANSPORT, RW_WORD_LEN, S7_RW, SIZE_RD,
    SIZE_WR, TS_RES_BIT, TS_RES_BYTE, TS_RES_OCTET,
};
use crate::transport::MessageTransport;

/// Offset of the payload in a single item read reply
const READ_PAYLOAD: usize = 25;
/// Size of a single item write reply
const WRITE_RES_LEN: usize = 22;
/// Largest start address encodable in 24 bits once shifted to bit addressing
pub const MAX_BYTE_ADDRESS: u32 = 0xFF_FFFF >> 3;
/// Largest bit, counter or timer start, sent as is in 24 bits
pub const MAX_RAW_ADDRESS: u32 = 0xFF_FFFF;

/// ### Request geometry after word length normalization
///
/// Counter and timer areas force their own word length. Bits move one at a time.
/// Everything else is converted to bytes, so the PLC always sees byte addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AreaRequest {
    pub word_len: u8,
    pub word_size: usize,
    pub amount: usize,
}

impl AreaRequest {
    pub fn normalize(area: u8, word_len: u8, amount: usize) -> Result<Self, S7Error> {
        let word_len = match area {
            S7_AREA_CT => S7_WL_COUNTER,
            S7_AREA_TM => S7_WL_TIMER,
            _ => word_len,
        };
        let word_size = data_size_byte(word_len);
        if word_size == 0 {
            return Err(S7Error::InvalidWordLength);
        }
        let bytes = amount.checked_mul(word_size).ok_or(S7Error::InvalidParams)?;
        Ok(match word_len {
            S7_WL_BIT => AreaRequest { word_len, word_size, amount: 1 },
            S7_WL_COUNTER | S7_WL_TIMER => AreaRequest { word_len, word_size, amount },
            _ => AreaRequest {
                word_len: S7_WL_BYTE,
                word_size: 1,
                amount: bytes,
            },
        })
    }

    /// Bit, counter and timer requests address elements directly.
    pub fn raw_addressing(&self) -> bool {
        matches!(self.word_len, S7_WL_BIT | S7_WL_COUNTER | S7_WL_TIMER)
    }

    pub fn total_bytes(&self) -> usize {
        self.amount * self.word_size
    }

    /// Wire address of element `start`.
    pub fn address(&self, start: u32) -> u32 {
        if self.raw_addressing() {
            start
        } else {
            start << 3
        }
    }

    /// The start of the last fragment must still fit the 24 bit address field.
    fn check_start(&self, start: u32) -> Result<(), S7Error> {
        let limit = if self.raw_addressing() { MAX_RAW_ADDRESS } else { MAX_BYTE_ADDRESS };
        let last = start as u64 + self.total_bytes().saturating_sub(self.word_size) as u64;
        if last > limit as u64 {
            return Err(S7Error::InvalidParams);
        }
        Ok(())
    }
}

impl<T: MessageTransport> S7Client<T> {
    /// ### Reads a block of data from a specific S7 memory area.
    ///
    /// ### Parameters
    /// - `area`: S7 memory area constant (`S7_AREA_PE`, `S7_AREA_PA`, `S7_AREA_MK`, `S7_AREA_DB`, `S7_AREA_CT`, `S7_AREA_TM`).
    /// - `db_number`: DB number (ignored for non-DB areas).
    /// - `start`: Starting element (byte index for bytes, bit index for bits).
    /// - `amount`: Number of elements of `word_len` size.
    /// - `word_len`: Word length constant (e.g., `S7_WL_BYTE`, `S7_WL_BIT`, `S7_WL_REAL`).
    /// - `buffer`: Destination buffer, at least `amount * data_size_byte(word_len)` bytes.
    ///
    /// #### Bit access notes
    /// 1. The start must be expressed in bits.
    ///    For example, if you want to access bit `DBX 45.3`, the start value would be 45 * 8 + 3 = 363.
    /// 2. Only one bit per call is transferred, whatever `amount` says.
    ///
    /// ### Returns
    /// The number of bytes read.
    ///
    /// ### Errors
    /// - `S7Error::InvalidWordLength`: unknown `word_len`, nothing was sent.
    /// - `S7Error::BufferTooSmall`: `buffer` cannot hold the requested data.
    /// - `S7Error::InvalidDataSize`: the reply is too short.
    /// - CPU errors (`AddressOutOfRange`, `ItemNotAvailable`...) reported by the PLC.
    /// - Transport errors.
    ///
    /// #### Suggestion
    /// In case of a low-level error, it is **highly recommended** to disconnect and reconnect the Client (as WinCC or other SCADA do)
    ///
    /// ### Notes
    /// - Large blocks are automatically split into chunks based on the negotiated PDU size.
    /// - On error `transferred` tells how many leading bytes of `buffer` are valid.
    pub fn read_area(
        &mut self,
        area: u8,
        db_number: u16,
        start: u32,
        amount: usize,
        word_len: u8,
        buffer: &mut [u8],
    ) -> Result<usize, S7Error> {
        let started = Instant::now();
        self.chunks = 0;
        self.transferred = 0;
        let result = self.do_read_area(area, db_number, start, amount, word_len, buffer);
        self.finish(started, result)
    }

    fn do_read_area(
        &mut self,
        area: u8,
        db_number: u16,
        start: u32,
        amount: usize,
        word_len: u8,
        buffer: &mut [u8],
    ) -> Result<usize, S7Error> {
        let req = AreaRequest::normalize(area, word_len, amount)?;
        req.check_start(start)?;

        self.read_fragments(req.amount, req.word_size, u16::MAX as usize, buffer, |first, count| {
            let element = start + (first * req.word_size) as u32;
            let mut telegram = Telegram::from_template(&S7_RW)
                .truncate(SIZE_RD)
                .word(RW_NUM_ELEMENTS, count as u16)
                .byte(RW_AREA, area)
                .address(RW_ADDRESS, req.address(element));
            if area == S7_AREA_DB {
                telegram = telegram.word(RW_DB_NUMBER, db_number);
            }
            if req.raw_addressing() {
                telegram = telegram.byte(RW_WORD_LEN, req.word_len);
            }
            telegram
        })
    }

    /// ### Fragmented read loop
    ///
    /// Splits `amount` elements into PDU sized requests built by `request(first, count)`,
    /// and copies each payload into `buffer` at the running offset. Shared by S7, NCK
    /// and Drive reads, which only differ in how a request is addressed and in the
    /// widest element count (`max_count`) their request can carry.
    pub(crate) fn read_fragments<F>(
        &mut self,
        amount: usize,
        word_size: usize,
        max_count: usize,
        buffer: &mut [u8],
        mut request: F,
    ) -> Result<usize, S7Error>
    where
        F: FnMut(usize, usize) -> Telegram,
    {
        let total = amount.checked_mul(word_size).ok_or(S7Error::InvalidParams)?;
        if buffer.len() < total {
            return Err(S7Error::BufferTooSmall);
        }
        let max_elements = self.max_elements(READ_RES_HEADER, word_size)?.min(max_count);

        let mut done = 0;
        let mut offset = 0;
        while done < amount {
            let count = (amount - done).min(max_elements);
            let size = count * word_size;
            let telegram = request(done, count);

            self.chunks += 1;
            let length = self.exchange(&telegram)?;
            self.copy_read_payload(length, &mut buffer[offset..offset + size])?;

            offset += size;
            done += count;
            self.transferred = offset;
        }
        if self.chunks > 1 {
            debug!(bytes = offset, chunks = self.chunks, "fragmented read");
        }
        Ok(offset)
    }

    fn copy_read_payload(&self, length: usize, dst: &mut [u8]) -> Result<(), S7Error> {
        if length < READ_PAYLOAD {
            return Err(S7Error::InvalidDataSize);
        }
        if self.pdu[21] != RES_SUCCESS {
            return Err(item_error(self.pdu[21]));
        }
        let end = READ_PAYLOAD + dst.len();
        if end > length {
            return Err(S7Error::InvalidDataSize);
        }
        dst.copy_from_slice(&self.pdu[READ_PAYLOAD..end]);
        Ok(())
    }

    /// Elements of `word_size` fitting one PDU after `header` bytes.
    pub(crate) fn max_elements(&self, header: usize, word_size: usize) -> Result<usize, S7Error> {
        if !self.is_connected() || self.pdu_length() == 0 {
            return Err(S7Error::NotConnected);
        }
        match (self.pdu_length() as usize).saturating_sub(header) / word_size {
            0 => Err(S7Error::SizeOverPdu),
            max => Ok(max),
        }
    }

    /// ### Writes a block of data to a specific S7 memory area.
    ///
    /// Parameters are the same as `read_area()`, `buffer` is the source.
    ///
    /// ### Returns
    /// The number of bytes written.
    ///
    /// ### Notes
    /// - Writing a bit affects **only that bit**, leaving adjacent bits in the byte unchanged.
    /// - Writing the output buffer (`S7_AREA_PA`) usually does not produce useful results, in fact the output process image
    ///   will be rewritten by OB1 in the next round
    /// - On error `transferred` tells how many bytes reached the PLC.
    pub fn write_area(
        &mut self,
        area: u8,
        db_number: u16,
        start: u32,
        amount: usize,
        word_len: u8,
        buffer: &[u8],
    ) -> Result<usize, S7Error> {
        let started = Instant::now();
        self.chunks = 0;
        self.transferred = 0;
        let result = self.do_write_area(area, db_number, start, amount, word_len, buffer);
        self.finish(started, result)
    }

    fn do_write_area(
        &mut self,
        area: u8,
        db_number: u16,
        start: u32,
        amount: usize,
        word_len: u8,
        buffer: &[u8],
    ) -> Result<usize, S7Error> {
        let req = AreaRequest::normalize(area, word_len, amount)?;
        req.check_start(start)?;
        if buffer.len() < req.total_bytes() {
            return Err(S7Error::BufferTooSmall);
        }
        let max_elements = self.max_elements(SIZE_WR, req.word_size)?;

        let transport = match req.word_len {
            S7_WL_BIT => TS_RES_BIT,
            S7_WL_COUNTER | S7_WL_TIMER => TS_RES_OCTET,
            _ => TS_RES_BYTE,
        };

        let mut element = start;
        let mut remaining = req.amount;
        let mut offset = 0;
        while remaining > 0 {
            let count = remaining.min(max_elements);
            let data_size = count * req.word_size;
            let bit_length = if req.raw_addressing() { data_size } else { data_size << 3 };

            let mut telegram = Telegram::from_template(&S7_RW)
                .word(POS_DATA_LEN, (data_size + 4) as u16)
                .byte(POS_FUNCTION, 0x05)
                .word(RW_NUM_ELEMENTS, count as u16)
                .byte(RW_AREA, area)
                .address(RW_ADDRESS, req.address(element))
                .byte(RW_TRANSPORT, transport)
                .word(RW_DATA_LEN, bit_length as u16);
            if area == S7_AREA_DB {
                telegram = telegram.word(RW_DB_NUMBER, db_number);
            }
            if req.raw_addressing() {
                telegram = telegram.byte(RW_WORD_LEN, req.word_len);
            }
            let telegram = telegram.append(&buffer[offset..offset + data_size]).sealed();

            self.chunks += 1;
            let length = self.exchange(&telegram)?;
            if length != WRITE_RES_LEN {
                return Err(S7Error::InvalidPdu);
            }
            if self.pdu[21] != RES_SUCCESS {
                return Err(item_error(self.pdu[21]));
            }

            offset += data_size;
            remaining -= count;
            element += data_size as u32;
            self.transferred = offset;
        }
        Ok(offset)
    }

    /// ### Reads a block of byte from a specific Data Block (DB)
    ///
    /// Same as `read_area()` with area = `S7_AREA_DB`, word_len = `S7_WL_BYTE` and
    /// amount = `buffer.len()`.
    pub fn read_db(&mut self, db_number: u16, start: u32, buffer: &mut [u8]) -> Result<usize, S7Error> {
        let amount = buffer.len();
        self.read_area(S7_AREA_DB, db_number, start, amount, S7_WL_BYTE, buffer)
    }

    /// ### Writes a block of byte to a specific Data Block (DB)
    ///
    /// For further info, please refer to `write_area()`
    pub fn write_db(&mut self, db_number: u16, start: u32, buffer: &[u8]) -> Result<usize, S7Error> {
        self.write_area(S7_AREA_DB, db_number, start, buffer.len(), S7_WL_BYTE, buffer)
    }

    /// Reads merkers (MB) bytes.
    pub fn read_mb(&mut self, start: u32, buffer: &mut [u8]) -> Result<usize, S7Error> {
        let amount = buffer.len();
        self.read_area(S7_AREA_MK, 0, start, amount, S7_WL_BYTE, buffer)
    }

    pub fn write_mb(&mut self, start: u32, buffer: &[u8]) -> Result<usize, S7Error> {
        self.write_area(S7_AREA_MK, 0, start, buffer.len(), S7_WL_BYTE, buffer)
    }

    /// Reads process inputs (EB) bytes.
    pub fn read_eb(&mut self, start: u32, buffer: &mut [u8]) -> Result<usize, S7Error> {
        let amount = buffer.len();
        self.read_area(S7_AREA_PE, 0, start, amount, S7_WL_BYTE, buffer)
    }

    pub fn write_eb(&mut self, start: u32, buffer: &[u8]) -> Result<usize, S7Error> {
        self.write_area(S7_AREA_PE, 0, start, buffer.len(), S7_WL_BYTE, buffer)
    }

    /// Reads process outputs (AB) bytes.
    pub fn read_ab(&mut self, start: u32, buffer: &mut [u8]) -> Result<usize, S7Error> {
        let amount = buffer.len();
        self.read_area(S7_AREA_PA, 0, start, amount, S7_WL_BYTE, buffer)
    }

    pub fn write_ab(&mut self, start: u32, buffer: &[u8]) -> Result<usize, S7Error> {
        self.write_area(S7_AREA_PA, 0, start, buffer.len(), S7_WL_BYTE, buffer)
    }

    /// ### Reads `values.len()` timers starting from timer number `start`
    ///
    /// Each timer is returned as the raw 16 bit S5TIME word.
    pub fn read_timers(&mut self, start: u32, values: &mut [u16]) -> Result<usize, S7Error> {
        self.read_words(S7_AREA_TM, S7_WL_TIMER, start, values)
    }

    pub fn write_timers(&mut self, start: u32, values: &[u16]) -> Result<usize, S7Error> {
        self.write_words(S7_AREA_TM, S7_WL_TIMER, start, values)
    }

    /// ### Reads `values.len()` counters starting from counter number `start`
    ///
    /// Each counter is returned as the raw 16 bit BCD word.
    pub fn read_counters(&mut self, start: u32, values: &mut [u16]) -> Result<usize, S7Error> {
        self.read_words(S7_AREA_CT, S7_WL_COUNTER, start, values)
    }

    pub fn write_counters(&mut self, start: u32, values: &[u16]) -> Result<usize, S7Error> {
        self.write_words(S7_AREA_CT, S7_WL_COUNTER, start, values)
    }

    // Timers and counters travel low byte first
    fn read_words(&mut self, area: u8, word_len: u8, start: u32, values: &mut [u16]) -> Result<usize, S7Error> {
        let mut raw = vec![0u8; values.len() * 2];
        let read = self.read_area(area, 0, start, values.len(), word_len, &mut raw)?;
        for (value, pair) in values.iter_mut().zip(raw.chunks_exact(2)) {
            *value = u16::from_le_bytes([pair[0], pair[1]]);
        }
        Ok(read)
    }

    fn write_words(&mut self, area: u8, word_len: u8, start: u32, values: &[u16]) -> Result<usize, S7Error> {
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write_area(area, 0, start, values.len(), word_len, &raw)
    }

    /// ### Reads a bit from a specific S7 memory area
    ///
    /// This helper method is same as `read_area()` with:
    /// - word_len = `S7_WL_BIT`
    /// - start = `byte_num * 8 + bit_idx`
    ///
    /// ### Example
    /// To read DB10.DBX71.4 use:
    ///
    /// ```my_bit = read_bit(S7_AREA_DB, 10, 71, 4);```
    ///
    /// ### Suggestion
    ///
    /// ```text
    /// Even reading a single bit requires an entire telegram.
    /// If you need to read multiple bits (more or less adjacent in the same area),
    /// read blocks of bytes and then unpack them (see `codec::get_bit_at()`).
    /// ```
    pub fn read_bit(&mut self, area: u8, db_number: u16, byte_num: u32, bit_idx: u8) -> Result<bool, S7Error> {
        if bit_idx > 7 {
            return Err(S7Error::InvalidParams);
        }
        let start = bit_start(byte_num, bit_idx)?;
        let mut buffer = [0u8; 1];
        self.read_area(area, db_number, start, 1, S7_WL_BIT, &mut buffer)?;
        Ok(buffer[0] != 0)
    }

    /// ### Writes a bit to a specific S7 memory area
    ///
    /// ### Example
    /// To write **1** into DB10.DBX71.4 use:
    ///
    /// ```write_bit(S7_AREA_DB, 10, 71, 4, true);```
    pub fn write_bit(&mut self, area: u8, db_number: u16, byte_num: u32, bit_idx: u8, value: bool) -> Result<(), S7Error> {
        if bit_idx > 7 {
            return Err(S7Error::InvalidParams);
        }
        let start = bit_start(byte_num, bit_idx)?;
        self.write_area(area, db_number, start, 1, S7_WL_BIT, &[value as u8])?;
        Ok(())
    }
}

/// Bit index of `byte_num.bit_idx`.
fn bit_start(byte_num: u32, bit_idx: u8) -> Result<u32, S7Error> {
    byte_num
        .checked_mul(8)
        .and_then(|bits| bits.checked_add(bit_idx as u32))
        .filter(|&start| start <= MAX_RAW_ADDRESS)
        .ok_or(S7Error::InvalidParams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{S7_WL_DWORD, S7_WL_REAL, S7_WL_WORD};

    #[test]
    fn byte_oriented_requests_become_bytes() {
        let req = AreaRequest::normalize(S7_AREA_DB, S7_WL_REAL, 3).unwrap();
        assert_eq!(req, AreaRequest { word_len: S7_WL_BYTE, word_size: 1, amount: 12 });
        assert_eq!(req.address(10), 80);
    }

    #[test]
    fn bit_requests_move_one_bit() {
        let req = AreaRequest::normalize(S7_AREA_MK, S7_WL_BIT, 50).unwrap();
        assert_eq!(req.amount, 1);
        assert_eq!(req.address(363), 363);
    }

    #[test]
    fn timer_area_forces_timer_word_length() {
        let req = AreaRequest::normalize(S7_AREA_TM, S7_WL_WORD, 4).unwrap();
        assert_eq!(req.word_len, S7_WL_TIMER);
        assert_eq!(req.total_bytes(), 8);
        assert_eq!(req.address(7), 7);
    }

    #[test]
    fn unknown_word_length() {
        assert_eq!(AreaRequest::normalize(S7_AREA_DB, 0x42, 1), Err(S7Error::InvalidWordLength));
    }

    #[test]
    fn address_boundaries() {
        let req = AreaRequest::normalize(S7_AREA_DB, S7_WL_BYTE, 1).unwrap();
        assert_eq!(req.address(0), 0);
        assert_eq!(req.address(1), 8);
        assert_eq!(req.address(MAX_BYTE_ADDRESS), 0xFF_FFF8);
        assert!(req.check_start(MAX_BYTE_ADDRESS).is_ok());
        assert_eq!(req.check_start(MAX_BYTE_ADDRESS + 1), Err(S7Error::InvalidParams));

        let bit = AreaRequest::normalize(S7_AREA_DB, S7_WL_BIT, 1).unwrap();
        assert!(bit.check_start(MAX_RAW_ADDRESS).is_ok());
        assert_eq!(bit.check_start(MAX_RAW_ADDRESS + 1), Err(S7Error::InvalidParams));
    }

    #[test]
    fn last_fragment_must_be_addressable() {
        let req = AreaRequest::normalize(S7_AREA_DB, S7_WL_BYTE, 2).unwrap();
        assert!(req.check_start(MAX_BYTE_ADDRESS - 1).is_ok());
        assert_eq!(req.check_start(MAX_BYTE_ADDRESS), Err(S7Error::InvalidParams));

        let timers = AreaRequest::normalize(S7_AREA_TM, S7_WL_TIMER, 2).unwrap();
        assert!(timers.check_start(MAX_RAW_ADDRESS - 2).is_ok());
        assert_eq!(timers.check_start(MAX_RAW_ADDRESS - 1), Err(S7Error::InvalidParams));
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        assert_eq!(AreaRequest::normalize(S7_AREA_DB, S7_WL_DWORD, usize::MAX), Err(S7Error::InvalidParams));
        assert_eq!(AreaRequest::normalize(S7_AREA_TM, S7_WL_TIMER, usize::MAX), Err(S7Error::InvalidParams));
    }

    #[test]
    fn bit_starts() {
        assert_eq!(bit_start(71, 4), Ok(572));
        assert_eq!(bit_start(MAX_RAW_ADDRESS >> 3, 7), Ok(MAX_RAW_ADDRESS));
        assert_eq!(bit_start(0x20_0000, 0), Err(S7Error::InvalidParams));
        assert_eq!(bit_start(u32::MAX, 0), Err(S7Error::InvalidParams));
    }
}
