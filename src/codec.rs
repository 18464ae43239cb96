// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! Offset based accessors for PLC memory images.
//!
//! Classic S7 areas are big-endian, the Sinumerik NCK exchanges its variables
//! little-endian. Both orderings share the same get/set-at-offset contract through
//! [`WireCodec`]; pick [`S7Codec`] or [`NckCodec`] according to the data source.
//!
//! All accessors index the buffer directly and panic on out-of-range offsets, exactly
//! like slice indexing. Byte-order independent helpers (bits, BCD, strings, dates)
//! are free functions.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Timelike};

/// Get/set-at-offset contract shared by the S7 and NCK byte orders.
pub trait WireCodec {
    type Order: ByteOrder;

    fn get_word_at(buffer: &[u8], pos: usize) -> u16 {
        Self::Order::read_u16(&buffer[pos..])
    }

    fn set_word_at(buffer: &mut [u8], pos: usize, value: u16) {
        Self::Order::write_u16(&mut buffer[pos..], value)
    }

    fn get_int_at(buffer: &[u8], pos: usize) -> i16 {
        Self::Order::read_i16(&buffer[pos..])
    }

    fn set_int_at(buffer: &mut [u8], pos: usize, value: i16) {
        Self::Order::write_i16(&mut buffer[pos..], value)
    }

    fn get_dword_at(buffer: &[u8], pos: usize) -> u32 {
        Self::Order::read_u32(&buffer[pos..])
    }

    fn set_dword_at(buffer: &mut [u8], pos: usize, value: u32) {
        Self::Order::write_u32(&mut buffer[pos..], value)
    }

    fn get_dint_at(buffer: &[u8], pos: usize) -> i32 {
        Self::Order::read_i32(&buffer[pos..])
    }

    fn set_dint_at(buffer: &mut [u8], pos: usize, value: i32) {
        Self::Order::write_i32(&mut buffer[pos..], value)
    }

    fn get_lword_at(buffer: &[u8], pos: usize) -> u64 {
        Self::Order::read_u64(&buffer[pos..])
    }

    fn set_lword_at(buffer: &mut [u8], pos: usize, value: u64) {
        Self::Order::write_u64(&mut buffer[pos..], value)
    }

    fn get_lint_at(buffer: &[u8], pos: usize) -> i64 {
        Self::Order::read_i64(&buffer[pos..])
    }

    fn set_lint_at(buffer: &mut [u8], pos: usize, value: i64) {
        Self::Order::write_i64(&mut buffer[pos..], value)
    }

    fn get_real_at(buffer: &[u8], pos: usize) -> f32 {
        Self::Order::read_f32(&buffer[pos..])
    }

    fn set_real_at(buffer: &mut [u8], pos: usize, value: f32) {
        Self::Order::write_f32(&mut buffer[pos..], value)
    }

    fn get_lreal_at(buffer: &[u8], pos: usize) -> f64 {
        Self::Order::read_f64(&buffer[pos..])
    }

    fn set_lreal_at(buffer: &mut [u8], pos: usize, value: f64) {
        Self::Order::write_f64(&mut buffer[pos..], value)
    }
}

/// Big-endian codec used by S7 areas, telegram headers and Drive parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct S7Codec;

impl WireCodec for S7Codec {
    type Order = BigEndian;
}

/// Little-endian codec used by Sinumerik NCK variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct NckCodec;

impl WireCodec for NckCodec {
    type Order = LittleEndian;
}

impl NckCodec {
    /// Size of an NCK string variable on the wire.
    pub const STRING_LEN: usize = 16;

    /// ### Reads a fixed 16 byte NCK string
    ///
    /// NCK strings are zero terminated, the bytes after the terminator are ignored.
    pub fn get_string_at(buffer: &[u8], pos: usize) -> String {
        let raw = &buffer[pos..pos + Self::STRING_LEN];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    /// Writes `value` as a 16 byte zero padded NCK string, truncating longer input.
    pub fn set_string_at(buffer: &mut [u8], pos: usize, value: &str) {
        let dst = &mut buffer[pos..pos + Self::STRING_LEN];
        dst.fill(0);
        let src = value.as_bytes();
        let len = src.len().min(Self::STRING_LEN);
        dst[..len].copy_from_slice(&src[..len]);
    }
}

pub fn get_bit_at(buffer: &[u8], pos: usize, bit: u8) -> bool {
    buffer[pos] & (1 << (bit & 0x07)) != 0
}

pub fn set_bit_at(buffer: &mut [u8], pos: usize, bit: u8, value: bool) {
    let mask = 1 << (bit & 0x07);
    if value {
        buffer[pos] |= mask;
    } else {
        buffer[pos] &= !mask;
    }
}

pub fn bcd_to_byte(b: u8) -> u8 {
    (b >> 4) * 10 + (b & 0x0F)
}

pub fn byte_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// ### Reads an S7 `STRING`
///
/// Layout: `[max_len][cur_len][chars...]`. The current length is clamped to the
/// buffer, never trusted blindly.
pub fn get_string_at(buffer: &[u8], pos: usize) -> String {
    let size = buffer[pos + 1] as usize;
    let end = (pos + 2 + size).min(buffer.len());
    String::from_utf8_lossy(&buffer[pos + 2..end]).into_owned()
}

/// Writes an S7 `STRING` of capacity `max_len`, truncating longer input.
pub fn set_string_at(buffer: &mut [u8], pos: usize, max_len: u8, value: &str) {
    let src = value.as_bytes();
    let size = src.len().min(max_len as usize);
    buffer[pos] = max_len;
    buffer[pos + 1] = size as u8;
    buffer[pos + 2..pos + 2 + size].copy_from_slice(&src[..size]);
}

/// ### Reads a fixed width character field
///
/// Trailing blanks and NULs are dropped: block info and SZL records pad their text
/// fields with either.
pub fn get_chars_at(buffer: &[u8], pos: usize, size: usize) -> String {
    let raw = &buffer[pos..pos + size];
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c: char| c == '\0' || c == ' ')
        .to_string()
}

pub fn set_chars_at(buffer: &mut [u8], pos: usize, value: &str) {
    let src = value.as_bytes();
    let len = src.len().min(buffer.len().saturating_sub(pos));
    buffer[pos..pos + len].copy_from_slice(&src[..len]);
}

/// ### Siemens block timestamp
///
/// Block dates are stored as days elapsed since 1984-01-01.
pub fn siemens_date(days: u16) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1984, 1, 1)?.checked_add_days(Days::new(days as u64))
}

/// ### Reads an S7 `DATE_AND_TIME`
///
/// Eight BCD bytes: year (two digits, < 90 means 20xx), month, day, hour, minute,
/// second, the two high milliseconds digits and finally the low millisecond digit in
/// the high nibble (the low nibble holds the weekday, ignored on read).
///
/// Returns `None` when the BCD digits do not form a valid calendar date.
pub fn get_date_time_at(buffer: &[u8], pos: usize) -> Option<NaiveDateTime> {
    let mut year = bcd_to_byte(buffer[pos]) as i32;
    year += if year < 90 { 2000 } else { 1900 };
    let month = bcd_to_byte(buffer[pos + 1]) as u32;
    let day = bcd_to_byte(buffer[pos + 2]) as u32;
    let hour = bcd_to_byte(buffer[pos + 3]) as u32;
    let min = bcd_to_byte(buffer[pos + 4]) as u32;
    let sec = bcd_to_byte(buffer[pos + 5]) as u32;
    let msec = bcd_to_byte(buffer[pos + 6]) as u32 * 10 + (buffer[pos + 7] >> 4) as u32;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_milli_opt(hour, min, sec, msec)
}

/// Writes an S7 `DATE_AND_TIME`. The weekday nibble counts from Sunday = 1.
pub fn set_date_time_at(buffer: &mut [u8], pos: usize, value: &NaiveDateTime) {
    let year = value.year();
    let year = if year > 1999 { year - 2000 } else { year - 1900 };
    let msec = (value.nanosecond() / 1_000_000) % 1000;
    let msec_h = (msec / 10) as u8;
    let msec_l = (msec % 10) as u8;
    let dow = value.weekday().number_from_sunday() as u8;

    buffer[pos] = byte_to_bcd(year.rem_euclid(100) as u8);
    buffer[pos + 1] = byte_to_bcd(value.month() as u8);
    buffer[pos + 2] = byte_to_bcd(value.day() as u8);
    buffer[pos + 3] = byte_to_bcd(value.hour() as u8);
    buffer[pos + 4] = byte_to_bcd(value.minute() as u8);
    buffer[pos + 5] = byte_to_bcd(value.second() as u8);
    buffer[pos + 6] = byte_to_bcd(msec_h);
    buffer[pos + 7] = (msec_l << 4) | dow;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_orders_differ() {
        let mut buf = [0u8; 4];
        S7Codec::set_word_at(&mut buf, 0, 0x1234);
        NckCodec::set_word_at(&mut buf, 2, 0x1234);
        assert_eq!(buf, [0x12, 0x34, 0x34, 0x12]);
        assert_eq!(S7Codec::get_word_at(&buf, 0), 0x1234);
        assert_eq!(NckCodec::get_word_at(&buf, 2), 0x1234);
    }

    #[test]
    fn real_is_big_endian_for_s7() {
        let buf = [0x3F, 0x80, 0x00, 0x00];
        assert_eq!(S7Codec::get_real_at(&buf, 0), 1.0);
    }

    #[test]
    fn nck_lreal_is_little_endian() {
        let mut buf = [0u8; 8];
        NckCodec::set_lreal_at(&mut buf, 0, 1.0);
        assert_eq!(buf, [0, 0, 0, 0, 0, 0, 0xF0, 0x3F]);
    }

    #[test]
    fn bits() {
        let mut buf = [0u8; 1];
        set_bit_at(&mut buf, 0, 3, true);
        assert_eq!(buf[0], 0x08);
        assert!(get_bit_at(&buf, 0, 3));
        set_bit_at(&mut buf, 0, 3, false);
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn bcd() {
        assert_eq!(byte_to_bcd(59), 0x59);
        assert_eq!(bcd_to_byte(0x42), 42);
    }

    #[test]
    fn s7_string_respects_buffer() {
        let buf = [10, 20, b'a', b'b'];
        assert_eq!(get_string_at(&buf, 0), "ab");
    }

    #[test]
    fn nck_string() {
        let mut buf = [0xFFu8; 16];
        NckCodec::set_string_at(&mut buf, 0, "CHAN1");
        assert_eq!(NckCodec::get_string_at(&buf, 0), "CHAN1");
        assert_eq!(buf[5], 0);
    }

    #[test]
    fn siemens_epoch() {
        assert_eq!(siemens_date(0), NaiveDate::from_ymd_opt(1984, 1, 1));
        assert_eq!(siemens_date(366), NaiveDate::from_ymd_opt(1985, 1, 1));
    }

    #[test]
    fn date_and_time() {
        // 2019-07-27 (Saturday) 13:12:06.789
        let dt = NaiveDate::from_ymd_opt(2019, 7, 27)
            .and_then(|d| d.and_hms_milli_opt(13, 12, 6, 789))
            .unwrap();
        let mut buf = [0u8; 8];
        set_date_time_at(&mut buf, 0, &dt);
        assert_eq!(buf, [0x19, 0x07, 0x27, 0x13, 0x12, 0x06, 0x78, 0x97]);
        assert_eq!(get_date_time_at(&buf, 0), Some(dt));
    }

    #[test]
    fn date_and_time_last_century() {
        let buf = [0x95, 0x12, 0x31, 0x23, 0x59, 0x59, 0x00, 0x01];
        let dt = get_date_time_at(&buf, 0).unwrap();
        assert_eq!(dt.year(), 1995);
    }

    #[test]
    fn invalid_date_and_time() {
        let buf = [0x19, 0x13, 0x40, 0, 0, 0, 0, 0];
        assert_eq!(get_date_time_at(&buf, 0), None);
    }
}
