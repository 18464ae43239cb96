// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! System status list (SZL) reads and the records built on them.

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::client::S7Client;
use crate::codec::{get_chars_at, S7Codec, WireCodec};
use crate::error::S7Error;
use crate::telegrams::{
    Telegram, POS_SEQ, RES_SUCCESS, S7_SZL_FIRST, S7_SZL_NEXT, SZL_ID, SZL_INDEX, SZL_NEXT_SEQ_IN,
};
use crate::transport::MessageTransport;

/// Minimum SZL reply
const SZL_RES_MIN: usize = 32;
/// Payload offset of the first slice (after ID, index and header)
const FIRST_SLICE_DATA: usize = 41;
/// Payload offset of the following slices
const NEXT_SLICE_DATA: usize = 37;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SzlHeader {
    /// Length of one record
    pub lenthdr: u16,
    /// Number of records
    pub n_dr: u16,
}

/// ### One SZL list
///
/// `data` holds the records of every slice, concatenated in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct S7Szl {
    pub header: SzlHeader,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct S7OrderCode {
    pub code: String,
    pub v1: u8,
    pub v2: u8,
    pub v3: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct S7CpuInfo {
    pub module_type_name: String,
    pub serial_number: String,
    pub as_name: String,
    pub copyright: String,
    pub module_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct S7CpInfo {
    pub max_pdu_length: u16,
    pub max_connections: u16,
    pub max_mpi_rate: u32,
    pub max_bus_rate: u32,
}

/// ### Protection level (SZL 0x0232 index 4)
///
/// - `sch_schal`: protection level set with the mode selector (1, 2 or 3).
/// - `sch_par`: password level, 0 when no password is set.
/// - `sch_rel`: valid protection level of the CPU.
/// - `bart_sch`: mode selector position (1 RUN, 2 RUN-P, 3 STOP, 4 MRES, 0 undefined).
/// - `anl_sch`: startup switch setting (1 CRST, 2 WRST, 0 undefined).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct S7Protection {
    pub sch_schal: u16,
    pub sch_par: u16,
    pub sch_rel: u16,
    pub bart_sch: u16,
    pub anl_sch: u16,
}

/// Fails with `InvalidPlcAnswer` when an SZL record is shorter than its fixed layout.
fn require(data: &[u8], len: usize) -> Result<&[u8], S7Error> {
    if data.len() < len {
        return Err(S7Error::InvalidPlcAnswer);
    }
    Ok(data)
}

impl<T: MessageTransport> S7Client<T> {
    /// ### Reads a partial list of given ID and index
    ///
    /// ### Parameters
    /// - `id`: SZL ID (e.g. 0x0011 module identification).
    /// - `index`: SZL index.
    ///
    /// ### Returns
    /// The list header and the concatenated records, `data.len()` is the total size.
    ///
    /// ### Errors
    /// - `S7Error::InvalidPdu`: a slice reply is too short.
    /// - `S7Error::InvalidPlcAnswer`: the PLC refused the ID/index or a slice is inconsistent.
    pub fn read_szl(&mut self, id: u16, index: u16) -> Result<S7Szl, S7Error> {
        let started = Instant::now();
        let result = self.do_read_szl(id, index);
        self.finish(started, result)
    }

    fn do_read_szl(&mut self, id: u16, index: u16) -> Result<S7Szl, S7Error> {
        let mut szl = S7Szl::default();
        let mut seq_out: u16 = 0;
        let mut seq_in: u8 = 0;
        let mut first = true;
        loop {
            seq_out = seq_out.wrapping_add(1);
            let request = if first {
                Telegram::from_template(&S7_SZL_FIRST)
                    .word(POS_SEQ, seq_out)
                    .word(SZL_ID, id)
                    .word(SZL_INDEX, index)
            } else {
                Telegram::from_template(&S7_SZL_NEXT)
                    .word(POS_SEQ, seq_out)
                    .byte(SZL_NEXT_SEQ_IN, seq_in)
            };
            let length = self.exchange(&request)?;
            if length <= SZL_RES_MIN {
                return Err(S7Error::InvalidPdu);
            }
            if S7Codec::get_word_at(&self.pdu, 27) != 0 || self.pdu[29] != RES_SUCCESS {
                return Err(S7Error::InvalidPlcAnswer);
            }

            let slice_len = S7Codec::get_word_at(&self.pdu, 31) as usize;
            let (data_at, data_len) = if first {
                szl.header.lenthdr = S7Codec::get_word_at(&self.pdu, 37);
                szl.header.n_dr = S7Codec::get_word_at(&self.pdu, 39);
                // ID, index and header precede the records
                let data_len = slice_len.checked_sub(8).ok_or(S7Error::InvalidPlcAnswer)?;
                (FIRST_SLICE_DATA, data_len)
            } else {
                (NEXT_SLICE_DATA, slice_len)
            };
            if data_at + data_len > length {
                return Err(S7Error::InvalidPlcAnswer);
            }
            szl.data.extend_from_slice(&self.pdu[data_at..data_at + data_len]);

            let done = self.pdu[26] == 0x00;
            seq_in = self.pdu[24];
            if done {
                break;
            }
            first = false;
        }
        debug!(id, index, size = szl.data.len(), "szl read");
        Ok(szl)
    }

    /// Not implemented, always `FunctionNotImplemented`.
    pub fn read_szl_list(&mut self) -> Result<Vec<u16>, S7Error> {
        self.not_implemented()
    }

    /// ### Returns the CPU order code and firmware version
    pub fn get_order_code(&mut self) -> Result<S7OrderCode, S7Error> {
        let started = Instant::now();
        let result = self.read_szl(0x0011, 0x0000).and_then(|szl| {
            let data = require(&szl.data, 22)?;
            let size = data.len();
            Ok(S7OrderCode {
                code: get_chars_at(data, 2, 20),
                v1: data[size - 3],
                v2: data[size - 2],
                v3: data[size - 1],
            })
        });
        self.finish(started, result)
    }

    /// ### Returns some information about the CPU
    pub fn get_cpu_info(&mut self) -> Result<S7CpuInfo, S7Error> {
        let started = Instant::now();
        let result = self.read_szl(0x001C, 0x0000).and_then(|szl| {
            let data = require(&szl.data, 204)?;
            Ok(S7CpuInfo {
                module_type_name: get_chars_at(data, 172, 32),
                serial_number: get_chars_at(data, 138, 24),
                as_name: get_chars_at(data, 2, 24),
                copyright: get_chars_at(data, 104, 26),
                module_name: get_chars_at(data, 36, 24),
            })
        });
        self.finish(started, result)
    }

    /// ### Returns some information about the CP (communication processor)
    pub fn get_cp_info(&mut self) -> Result<S7CpInfo, S7Error> {
        let started = Instant::now();
        let result = self.read_szl(0x0131, 0x0001).and_then(|szl| {
            let data = require(&szl.data, 14)?;
            Ok(S7CpInfo {
                max_pdu_length: S7Codec::get_word_at(data, 2),
                max_connections: S7Codec::get_word_at(data, 4),
                max_mpi_rate: S7Codec::get_dword_at(data, 6),
                max_bus_rate: S7Codec::get_dword_at(data, 10),
            })
        });
        self.finish(started, result)
    }

    /// ### Gets the CPU protection level info
    pub fn get_protection(&mut self) -> Result<S7Protection, S7Error> {
        let started = Instant::now();
        let result = self.read_szl(0x0232, 0x0004).and_then(|szl| {
            let data = require(&szl.data, 12)?;
            Ok(S7Protection {
                sch_schal: S7Codec::get_word_at(data, 2),
                sch_par: S7Codec::get_word_at(data, 4),
                sch_rel: S7Codec::get_word_at(data, 6),
                bart_sch: S7Codec::get_word_at(data, 8),
                anl_sch: S7Codec::get_word_at(data, 10),
            })
        });
        self.finish(started, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_records_are_rejected() {
        assert_eq!(require(&[0u8; 11], 12), Err(S7Error::InvalidPlcAnswer));
        assert!(require(&[0u8; 12], 12).is_ok());
    }
}
