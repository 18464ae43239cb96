// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! Active force jobs (S7-300/400).

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::client::S7Client;
use crate::codec::{S7Codec, WireCodec};
use crate::error::{cpu_error, S7Error};
use crate::telegrams::{Telegram, S7_FORCE_VAL1, S7_FORCE_VAL300, S7_FORCE_VAL400};
use crate::transport::MessageTransport;

/// Offset of the force records in the second reply
const FORCE_DATA: usize = 67;
/// Fixed stride of a force definition record
const FORCE_RECORD: usize = 6;
/// Marks the end of the definitions and the start of the values
const FORCE_SPLIT: [u8; 3] = [0x00, 0x09, 0x00];

/// Minimum declared first-frame size meaning "force jobs are present"
const MIN_FORCES_300: u16 = 16;
const MIN_FORCES_400: u16 = 12;

/// Operand of a force job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForceType {
    M,
    MB,
    MW,
    MD,
    I,
    IB,
    IW,
    ID,
    Q,
    QB,
    QW,
    QD,
    Unknown(u8),
}

impl ForceType {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0x00 => ForceType::M,
            0x01 => ForceType::MB,
            0x02 => ForceType::MW,
            0x03 => ForceType::MD,
            0x10 => ForceType::I,
            0x11 => ForceType::IB,
            0x12 => ForceType::IW,
            0x13 => ForceType::ID,
            0x20 => ForceType::Q,
            0x21 => ForceType::QB,
            0x22 => ForceType::QW,
            0x23 => ForceType::QD,
            other => ForceType::Unknown(other),
        }
    }

    /// Byte, word and dword operands carry no bit address.
    pub fn is_bit(&self) -> bool {
        !matches!(
            self,
            ForceType::MB
                | ForceType::MW
                | ForceType::MD
                | ForceType::IB
                | ForceType::IW
                | ForceType::ID
                | ForceType::QB
                | ForceType::QW
                | ForceType::QD
        )
    }
}

impl fmt::Display for ForceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForceType::Unknown(tag) => write!(f, "{} unknown", tag),
            other => write!(f, "{:?}", other),
        }
    }
}

/// ### One active force job
///
/// `symbol` and `comment` are left empty by the decoder, callers may annotate
/// them from their own symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForceJob {
    pub force_type: ForceType,
    pub byte_address: u16,
    pub bit_address: Option<u8>,
    pub value: u32,
    pub symbol: Option<String>,
    pub comment: Option<String>,
}

impl ForceJob {
    /// "MW 10" for byte/word/dword operands, "M 10.3" for bits.
    pub fn full_address(&self) -> String {
        match self.bit_address {
            Some(bit) => format!("{} {}.{}", self.force_type, self.byte_address, bit),
            None => format!("{} {}", self.force_type, self.byte_address),
        }
    }
}

/// ### Decodes the force records of a reply
///
/// `data` starts at the first definition record. Definitions are 6-byte records
/// terminated by `00 09 00` on a record boundary, value records follow with their
/// length at offset 3 and the value at offset 4. A payload without delimiter
/// yields no jobs, value records cut short leave `value` at 0.
pub fn decode_force_jobs(data: &[u8]) -> Vec<ForceJob> {
    let split = (0..data.len().saturating_sub(3))
        .step_by(FORCE_RECORD)
        .find(|&x| data[x..x + 3] == FORCE_SPLIT)
        .unwrap_or(0);
    let count = split / FORCE_RECORD;

    let mut jobs = Vec::with_capacity(count);
    let mut value_at = split;
    for record in data[..split].chunks_exact(FORCE_RECORD) {
        let force_type = ForceType::from_tag(record[0]);
        let bit_address = force_type.is_bit().then_some(record[1]);
        let byte_address = S7Codec::get_word_at(record, 4);

        let declared = data.get(value_at + 3).copied().unwrap_or(0);
        let value_pos = value_at + 4;
        let value = match declared {
            1 if value_pos < data.len() => data[value_pos] as u32,
            2 if value_pos + 2 <= data.len() => S7Codec::get_word_at(data, value_pos) as u32,
            4 if value_pos + 4 <= data.len() => S7Codec::get_dword_at(data, value_pos),
            _ => 0,
        };
        value_at += (4 + declared as usize).max(FORCE_RECORD);

        jobs.push(ForceJob {
            force_type,
            byte_address,
            bit_address,
            value,
            symbol: None,
            comment: None,
        });
    }
    jobs
}

impl<T: MessageTransport> S7Client<T> {
    /// ### Reads the active force jobs of an S7-300 CPU
    ///
    /// ### Returns
    /// The decoded jobs, empty when nothing is forced.
    ///
    /// ### Errors
    /// CPU error codes of either frame are translated with `cpu_error()`.
    pub fn get_force_values_300(&mut self) -> Result<Vec<ForceJob>, S7Error> {
        let started = Instant::now();
        let result = self.do_get_force_values(&S7_FORCE_VAL300, MIN_FORCES_300);
        self.finish(started, result)
    }

    /// ### Reads the active force jobs of an S7-400 CPU
    ///
    /// Same as `get_force_values_300()` with the 400 series second frame.
    pub fn get_force_values_400(&mut self) -> Result<Vec<ForceJob>, S7Error> {
        let started = Instant::now();
        let result = self.do_get_force_values(&S7_FORCE_VAL400, MIN_FORCES_400);
        self.finish(started, result)
    }

    fn do_get_force_values(&mut self, second: &[u8], min_size: u16) -> Result<Vec<ForceJob>, S7Error> {
        let length = self.exchange(&Telegram::from_template(&S7_FORCE_VAL1))?;
        if length < 33 {
            return Err(S7Error::InvalidPdu);
        }
        cpu_error(S7Codec::get_word_at(&self.pdu, 27))?;
        // Short answer: no force jobs active
        if S7Codec::get_word_at(&self.pdu, 31) < min_size {
            return Ok(Vec::new());
        }

        let length = self.exchange(&Telegram::from_template(second))?;
        if length < 29 {
            return Err(S7Error::InvalidPdu);
        }
        cpu_error(S7Codec::get_word_at(&self.pdu, 27))?;
        if length <= FORCE_DATA {
            return Ok(Vec::new());
        }
        let jobs = decode_force_jobs(&self.pdu[FORCE_DATA..length]);
        debug!(count = jobs.len(), "force jobs read");
        Ok(jobs)
    }
}
