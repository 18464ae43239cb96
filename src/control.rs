// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! PLC run mode, clock and session password.

use std::time::Instant;

use chrono::{Datelike, Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};

use crate::client::S7Client;
use crate::codec::{byte_to_bcd, get_date_time_at, set_date_time_at, set_chars_at, S7Codec, WireCodec};
use crate::error::{cpu_error, S7Error};
use crate::telegrams::{
    Telegram, DT_CENTURY, DT_VALUE, PWD_VALUE, RES_SUCCESS, S7_CLR_PWD, S7_COLD_START, S7_GET_DT,
    S7_GET_STAT, S7_HOT_START, S7_SET_DT, S7_SET_PWD, S7_STOP,
};
use crate::transport::MessageTransport;

// CPU status codes
pub const S7_CPU_STATUS_UNKNOWN: u8 = 0x00;
pub const S7_CPU_STATUS_RUN: u8 = 0x08;
pub const S7_CPU_STATUS_STOP: u8 = 0x04;

const PDU_START: u8 = 0x28; // CPU start
const PDU_STOP: u8 = 0x29; // CPU stop
const PDU_ALREADY_STARTED: u8 = 0x02; // CPU already in run mode
const PDU_ALREADY_STOPPED: u8 = 0x07; // CPU already in stop mode

/// Offset of `DATE_AND_TIME` in the get clock reply
const DT_REPLY_VALUE: usize = 35;

/// CPU run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlcStatus {
    Unknown,
    Run,
    Stop,
}

impl PlcStatus {
    /// Old CPUs report STOP as 0x03, everything but RUN and unknown is taken as STOP.
    pub fn from_code(code: u8) -> Self {
        match code {
            S7_CPU_STATUS_UNKNOWN => PlcStatus::Unknown,
            S7_CPU_STATUS_RUN => PlcStatus::Run,
            _ => PlcStatus::Stop,
        }
    }
}

/// ### Session password encoding
///
/// Blank padded to 8 chars (longer passwords are truncated), then the first two
/// bytes are XORed with 0x55 and every following byte with 0x55 and the encoded
/// byte two positions before.
pub fn encode_password(password: &str) -> [u8; 8] {
    let mut pwd = [b' '; 8];
    set_chars_at(&mut pwd, 0, password);
    pwd[0] ^= 0x55;
    pwd[1] ^= 0x55;
    for c in 2..8 {
        pwd[c] = pwd[c] ^ 0x55 ^ pwd[c - 2];
    }
    pwd
}

impl<T: MessageTransport> S7Client<T> {
    /// ### Puts the CPU in RUN mode performing an HOT START
    ///
    /// ### Errors
    /// - `S7Error::AlreadyRun`: the CPU is already running.
    /// - `S7Error::CannotStartPlc`: the CPU refused the request.
    /// - `S7Error::InvalidPdu`: reply too short.
    pub fn plc_hot_start(&mut self) -> Result<(), S7Error> {
        let started = Instant::now();
        let result = self.run_mode_job(&S7_HOT_START, PDU_START);
        self.finish(started, result)
    }

    /// ### Puts the CPU in RUN mode performing a COLD START
    ///
    /// Same errors as `plc_hot_start()`.
    pub fn plc_cold_start(&mut self) -> Result<(), S7Error> {
        let started = Instant::now();
        let result = self.run_mode_job(&S7_COLD_START, PDU_START);
        self.finish(started, result)
    }

    /// ### Puts the CPU in STOP mode
    ///
    /// ### Errors
    /// - `S7Error::AlreadyStop`: the CPU is already stopped.
    /// - `S7Error::CannotStopPlc`: the CPU refused the request.
    /// - `S7Error::InvalidPdu`: reply too short.
    pub fn plc_stop(&mut self) -> Result<(), S7Error> {
        let started = Instant::now();
        let result = self.run_mode_job(&S7_STOP, PDU_STOP);
        self.finish(started, result)
    }

    fn run_mode_job(&mut self, template: &[u8], function: u8) -> Result<(), S7Error> {
        let (refused, already, already_err) = if function == PDU_START {
            (S7Error::CannotStartPlc, PDU_ALREADY_STARTED, S7Error::AlreadyRun)
        } else {
            (S7Error::CannotStopPlc, PDU_ALREADY_STOPPED, S7Error::AlreadyStop)
        };
        let length = self.exchange(&Telegram::from_template(template))?;
        if length <= 18 {
            return Err(S7Error::InvalidPdu);
        }
        if self.pdu[19] != function {
            return Err(refused);
        }
        if length > 20 && self.pdu[20] == already {
            return Err(already_err);
        }
        if S7Codec::get_word_at(&self.pdu, 17) != 0 {
            return Err(refused);
        }
        info!(function, "run mode changed");
        Ok(())
    }

    /// Not implemented, always `FunctionNotImplemented`.
    pub fn plc_copy_ram_to_rom(&mut self, _timeout_ms: u32) -> Result<(), S7Error> {
        self.not_implemented()
    }

    /// Not implemented, always `FunctionNotImplemented`.
    pub fn plc_compress(&mut self, _timeout_ms: u32) -> Result<(), S7Error> {
        self.not_implemented()
    }

    /// ### Returns the CPU status (running/stopped)
    pub fn plc_get_status(&mut self) -> Result<PlcStatus, S7Error> {
        let started = Instant::now();
        let result = self.do_plc_get_status();
        self.finish(started, result)
    }

    fn do_plc_get_status(&mut self) -> Result<PlcStatus, S7Error> {
        let length = self.exchange(&Telegram::from_template(&S7_GET_STAT))?;
        if length <= 30 {
            return Err(S7Error::InvalidPdu);
        }
        cpu_error(S7Codec::get_word_at(&self.pdu, 27))?;
        if length <= 44 {
            return Err(S7Error::InvalidPlcAnswer);
        }
        Ok(PlcStatus::from_code(self.pdu[44]))
    }

    /// ### Reads PLC date and time
    ///
    /// ### Errors
    /// - `S7Error::InvalidPlcAnswer`: refused, or the returned date is not a valid calendar date.
    pub fn get_plc_date_time(&mut self) -> Result<NaiveDateTime, S7Error> {
        let started = Instant::now();
        let result = self.do_get_plc_date_time();
        self.finish(started, result)
    }

    fn do_get_plc_date_time(&mut self) -> Result<NaiveDateTime, S7Error> {
        let length = self.exchange(&Telegram::from_template(&S7_GET_DT))?;
        if length <= 30 {
            return Err(S7Error::InvalidPdu);
        }
        if S7Codec::get_word_at(&self.pdu, 27) != 0 || self.pdu[29] != RES_SUCCESS {
            return Err(S7Error::InvalidPlcAnswer);
        }
        if length < DT_REPLY_VALUE + 8 {
            return Err(S7Error::InvalidPlcAnswer);
        }
        get_date_time_at(&self.pdu, DT_REPLY_VALUE).ok_or(S7Error::InvalidPlcAnswer)
    }

    /// ### Sets PLC date and time
    pub fn set_plc_date_time(&mut self, value: &NaiveDateTime) -> Result<(), S7Error> {
        let started = Instant::now();
        let result = self.do_set_plc_date_time(value);
        self.finish(started, result)
    }

    fn do_set_plc_date_time(&mut self, value: &NaiveDateTime) -> Result<(), S7Error> {
        let mut date_time = [0u8; 8];
        set_date_time_at(&mut date_time, 0, value);
        let century = byte_to_bcd((value.year() / 100).rem_euclid(100) as u8);
        let request = Telegram::from_template(&S7_SET_DT)
            .byte(DT_CENTURY, century)
            .bytes(DT_VALUE, &date_time);
        let length = self.exchange(&request)?;
        if length <= 30 {
            return Err(S7Error::InvalidPdu);
        }
        if S7Codec::get_word_at(&self.pdu, 27) != 0 {
            return Err(S7Error::InvalidPlcAnswer);
        }
        debug!(%value, "plc clock set");
        Ok(())
    }

    /// ### Sets the PLC date and time in accord to the PC ones
    pub fn set_plc_system_date_time(&mut self) -> Result<(), S7Error> {
        let now = Local::now().naive_local();
        self.set_plc_date_time(&now)
    }

    /// ### Send the password to the PLC to meet its security level
    ///
    /// A password accepted by a PLC is an 8 chars string, a greater password will be
    /// truncated, and a smaller one will be "right space padded".
    pub fn set_session_password(&mut self, password: &str) -> Result<(), S7Error> {
        let started = Instant::now();
        let result = self.do_set_session_password(password);
        self.finish(started, result)
    }

    fn do_set_session_password(&mut self, password: &str) -> Result<(), S7Error> {
        let request = Telegram::from_template(&S7_SET_PWD).bytes(PWD_VALUE, &encode_password(password));
        let length = self.exchange(&request)?;
        if length <= 32 {
            return Err(S7Error::InvalidPdu);
        }
        cpu_error(S7Codec::get_word_at(&self.pdu, 27))
    }

    /// ### Clears the password set for the current session (logout)
    pub fn clear_session_password(&mut self) -> Result<(), S7Error> {
        let started = Instant::now();
        let result = self.do_clear_session_password();
        self.finish(started, result)
    }

    fn do_clear_session_password(&mut self) -> Result<(), S7Error> {
        let length = self.exchange(&Telegram::from_template(&S7_CLR_PWD))?;
        if length <= 30 {
            return Err(S7Error::InvalidPdu);
        }
        cpu_error(S7Codec::get_word_at(&self.pdu, 27))
    }
}
