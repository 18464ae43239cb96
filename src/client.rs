// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

use std::time::Instant;

use tracing::{debug, warn};

use crate::codec::{S7Codec, WireCodec};
use crate::config::{
    ClientConfig, P_I32_PDU_REQUEST, P_I32_PING_TIMEOUT, P_I32_RECV_TIMEOUT, P_I32_SEND_TIMEOUT,
    P_U16_REMOTE_PORT, PDU_REQUEST_MAX, PDU_REQUEST_MIN,
};
use crate::error::S7Error;
use crate::telegrams::{
    Telegram, CR_LOCAL_TSAP, CR_REMOTE_TSAP, ISO_CONN_OK, ISO_CR, ISO_H_SIZE, ISO_ID,
    MIN_PDU_SIZE, PN_PDU_REQ, S7_ID, S7_PN, TPKT_ISO,
};
use crate::transport::{MessageTransport, TcpTransport};

// Areas
pub const S7_AREA_PE: u8 = 0x81; // Process Inputs
pub const S7_AREA_PA: u8 = 0x82; // Process Outputs
pub const S7_AREA_MK: u8 = 0x83; // Merkers
pub const S7_AREA_DB: u8 = 0x84; // Data Block
pub const S7_AREA_CT: u8 = 0x1C; // Counters
pub const S7_AREA_TM: u8 = 0x1D; // Timers

// Wordlen
pub const S7_WL_BIT: u8 = 0x01;
pub const S7_WL_BYTE: u8 = 0x02;
pub const S7_WL_CHAR: u8 = 0x03;
pub const S7_WL_WORD: u8 = 0x04;
pub const S7_WL_INT: u8 = 0x05;
pub const S7_WL_DWORD: u8 = 0x06;
pub const S7_WL_DINT: u8 = 0x07;
pub const S7_WL_REAL: u8 = 0x08;
pub const S7_WL_COUNTER: u8 = 0x1C;
pub const S7_WL_TIMER: u8 = 0x1D;

/// Maximum number of items in a multi read/write telegram
pub const MAX_VARS: usize = 20;

const LOCAL_TSAP: u16 = 0x0100;
const PDU_BUFFER_SIZE: usize = 2048;
const PN_RES_LEN: usize = 27; // PDU negotiation response telegram size

/// ### Size in bytes of one element of `word_len`
///
/// Returns 0 for unknown word lengths.
pub fn data_size_byte(word_len: u8) -> usize {
    match word_len {
        S7_WL_BIT | S7_WL_BYTE | S7_WL_CHAR => 1,
        S7_WL_WORD | S7_WL_INT => 2,
        S7_WL_DWORD | S7_WL_DINT | S7_WL_REAL => 4,
        S7_WL_COUNTER | S7_WL_TIMER => 2,
        _ => 0,
    }
}

/// ### S7 client session
///
/// Owns the transport and the receive buffer. Every operation takes `&mut self`,
/// so a session runs at most one job at a time; to talk to a PLC from several
/// threads use one client per thread or wrap the client in a mutex.
///
/// Generic over the byte-stream [`MessageTransport`], [`TcpTransport`] by default.
pub struct S7Client<T: MessageTransport = TcpTransport> {
    pub(crate) transport: T,
    pub(crate) config: ClientConfig,
    host: String,
    local_tsap: u16,
    remote_tsap: u16,
    /// Receive buffer, holds the last incoming frame (TPKT and COTP included)
    pub(crate) pdu: Vec<u8>,
    pdu_requested: u16,
    pdu_length: u16,
    last_pdu_type: u8,
    last_error: u32,
    cnt_word: u16,
    /// ### Last Job time (ms).
    ///
    /// If an error occurred the value will be 0
    pub last_time: f64,
    /// ### Indicates how many pieces the data to be read or written in the last operation was divided into
    /// Maybe you need to know it only for extreme tuning
    pub chunks: usize,
    /// ### Bytes moved by the last area read/write
    ///
    /// Only fully completed fragments are counted, so after a failure this tells how
    /// much of the caller buffer is valid (read) or reached the PLC (write).
    pub transferred: usize,
}

impl S7Client<TcpTransport> {
    /// ### Creates a new `S7Client` instance with default settings.
    ///
    /// The client starts disconnected, use one of `connect_XXX` methods to open a connection to a PLC.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(TcpTransport::new(), config)
    }
}

impl Default for S7Client<TcpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MessageTransport> S7Client<T> {
    /// Creates a client on top of a custom transport.
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        S7Client {
            transport,
            config,
            host: String::new(),
            local_tsap: LOCAL_TSAP,
            remote_tsap: 0,
            pdu: vec![0u8; PDU_BUFFER_SIZE],
            pdu_requested: 0,
            pdu_length: 0,
            last_pdu_type: 0,
            last_error: 0,
            cnt_word: 0,
            last_time: 0.0,
            chunks: 0,
            transferred: 0,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// ### Changes the S7 connection type to the PLC
    ///
    /// The three possible connection types are:
    /// - `CT_PG`: (as a programming device)
    /// - `CT_OP`: (as an HMI)
    /// - `CT_S7`: (as a generic device)
    ///
    /// `CT_PG` is used by default.
    ///
    /// With very old PLCs (early S7300 series) that have limited communication resources,
    /// the connection may be rejected if we have S7Manager with many online windows open at the same time.
    /// In this case, use `CT_OP` or `CT_S7`.
    ///
    /// #### Notes
    /// 1. Call this method before connecting.
    /// 2. Useless with `connect_tsap()`, the connection type is already contained in the remote TSAP.
    pub fn set_connection_type(&mut self, connection_type: u16) {
        self.config.connection_type = connection_type;
    }

    /// ### Sets operations timeout
    ///
    /// ### Parameters
    /// - `co_timeout_ms` : TCP Connection timeout (ms) (Default = 2000 ms)
    /// - `rd_timeout_ms` : Receive timeout (ms) (Default = 2000 ms)
    /// - `wr_timeout_ms` : Send timeout (ms) (Default = 2000 ms)
    ///
    /// ### Notes
    /// 1. Values must be > 0, otherwise they are ignored
    /// 2. Send/receive timeouts are applied at the next connection.
    pub fn set_timeout(&mut self, co_timeout_ms: u64, rd_timeout_ms: u64, wr_timeout_ms: u64) {
        if co_timeout_ms > 0 {
            self.config.connect_timeout_ms = co_timeout_ms;
        }
        if rd_timeout_ms > 0 {
            self.config.recv_timeout_ms = rd_timeout_ms;
        }
        if wr_timeout_ms > 0 {
            self.config.send_timeout_ms = wr_timeout_ms;
        }
    }

    /// ### Sets the TCP Connection Port
    ///
    /// The default S7 Port is 102, but if you need NAT the addresses you can use this method to change the default value.
    /// Value must be > 0, otherwise it is ignored.
    pub fn set_connection_port(&mut self, port: u16) {
        if port > 0 {
            self.config.port = port;
        }
    }

    /// Stores the address and TSAPs used by the next `connect()`.
    pub fn set_connection_params(&mut self, host: &str, local_tsap: u16, remote_tsap: u16) {
        self.host = host.to_string();
        self.local_tsap = local_tsap;
        self.remote_tsap = remote_tsap;
    }

    pub(crate) fn remote_tsap_for(&self, rack: u16, slot: u16) -> u16 {
        (self.config.connection_type << 8)
            .wrapping_add(rack.wrapping_mul(0x20))
            .wrapping_add(slot)
    }

    /// ### Connects to a Siemens PLC/Drive using Rack and Slot
    ///
    /// Rack and Slot are Hardware configuration parameters.
    ///
    /// For S7300 and S71200/1500 they are fixed, (see `connect_s7300()` and `connect_s71200_1500()` ).
    ///
    /// ### Parameters
    /// - `host` : PLC address.
    /// - `rack` : CPU/CU Rack.
    /// - `slot` : CPU/CU Slot.
    ///
    /// ---
    /// For Notes, Return and Errors look at `connect()`
    pub fn connect_to(&mut self, host: &str, rack: u16, slot: u16) -> Result<(), S7Error> {
        let remote_tsap = self.remote_tsap_for(rack, slot);
        self.set_connection_params(host, LOCAL_TSAP, remote_tsap);
        self.connect()
    }

    /// Same as `connect_to()` with rack=0 and slot=2
    pub fn connect_s7300(&mut self, host: &str) -> Result<(), S7Error> {
        self.connect_to(host, 0, 2)
    }

    /// Same as `connect_to()` with rack=0 and slot=0
    pub fn connect_s71200_1500(&mut self, host: &str) -> Result<(), S7Error> {
        self.connect_to(host, 0, 0)
    }

    /// ### Connects to a Siemens ISO-Hardware using TSAP records
    ///
    /// You will need it only to connect to LOGO! or S7200.
    pub fn connect_tsap(&mut self, host: &str, local_tsap: u16, remote_tsap: u16) -> Result<(), S7Error> {
        self.set_connection_params(host, local_tsap, remote_tsap);
        self.connect()
    }

    /// ### Connects using the stored connection params
    ///
    /// Three stages: TCP connection, ISO (COTP) connection, S7 PDU negotiation.
    /// A connected client is disconnected first.
    ///
    /// ### Returns
    /// `Ok(())` on success, the negotiated PDU is then available via `pdu_length()`.
    ///
    /// ### Errors
    /// - Transport errors (`ConnectionFailed`, `ConnectionTimeout`, `UnreachableHost`...)
    /// - `S7Error::IsoConnect`: the PLC refused the COTP connection
    /// - `S7Error::InvalidPdu`: malformed connection confirm
    /// - `S7Error::NegotiationFailed`: PDU negotiation failed
    ///
    /// ### Notes
    /// Whatever stage fails the socket is closed before returning, a client is
    /// either fully connected or not connected at all.
    pub fn connect(&mut self) -> Result<(), S7Error> {
        let started = Instant::now();
        self.disconnect();

        let result = self.open_session();
        if let Err(err) = &result {
            warn!(host = %self.host, error = %err, "connection failed");
            self.disconnect();
        }
        self.finish(started, result)
    }

    fn open_session(&mut self) -> Result<(), S7Error> {
        if self.host.is_empty() {
            return Err(S7Error::InvalidParams);
        }
        debug!(host = %self.host, port = self.config.port, remote_tsap = self.remote_tsap, "tcp connect");
        self.transport
            .set_io_timeouts(self.config.send_timeout_ms, self.config.recv_timeout_ms);
        self.transport
            .connect(&self.host, self.config.port, self.config.connect_timeout_ms)?;
        self.iso_connect()?;
        self.negotiate_pdu_length()
    }

    fn iso_connect(&mut self) -> Result<(), S7Error> {
        let request = Telegram::from_template(&ISO_CR)
            .word(CR_LOCAL_TSAP, self.local_tsap)
            .word(CR_REMOTE_TSAP, self.remote_tsap);
        // The confirm is validated against the largest frame we may ask for
        self.pdu_requested = self.config.effective_pdu_request();
        let size = self.exchange(&request)?;
        if size != ISO_CR.len() {
            return Err(S7Error::InvalidPdu);
        }
        if self.last_pdu_type != ISO_CONN_OK {
            return Err(S7Error::IsoConnect);
        }
        debug!("iso connection accepted");
        Ok(())
    }

    fn negotiate_pdu_length(&mut self) -> Result<(), S7Error> {
        let request = Telegram::from_template(&S7_PN).word(PN_PDU_REQ, self.pdu_requested);
        let length = self.exchange(&request)?;
        if length != PN_RES_LEN || self.pdu[17] != 0 || self.pdu[18] != 0 {
            return Err(S7Error::NegotiationFailed);
        }
        self.pdu_length = S7Codec::get_word_at(&self.pdu, 25);
        if self.pdu_length == 0 {
            return Err(S7Error::NegotiationFailed);
        }
        debug!(requested = self.pdu_requested, negotiated = self.pdu_length, "pdu negotiated");
        Ok(())
    }

    /// ### Closes the connection.
    ///
    /// Safe to call even if the client is not currently connected.
    /// After disconnection, calls to read/write will return `S7Error::NotConnected`.
    ///
    /// ### Notes
    /// ```text
    /// A Client should be disconnected on low-level error (see `S7Error::is_transport()`)
    /// ```
    pub fn disconnect(&mut self) {
        if self.transport.is_connected() {
            debug!(host = %self.host, "disconnect");
        }
        self.transport.close();
        self.pdu_length = 0;
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// PDU length negotiated by the CPU (0 when not connected)
    pub fn pdu_length(&self) -> u16 {
        self.pdu_length
    }

    /// PDU length proposed during the last negotiation
    pub fn pdu_requested(&self) -> u16 {
        self.pdu_requested
    }

    /// Code of the last failure, 0 if the last operation succeeded (see `error_text()`).
    pub fn last_error(&self) -> u32 {
        self.last_error
    }

    /// Last Job time (ms), same as `last_time`
    pub fn exec_time(&self) -> f64 {
        self.last_time
    }

    /// ### Reads a client parameter
    ///
    /// Accepted numbers are the `P_*` constants of [`crate::config`].
    pub fn get_param(&self, param_number: i32) -> Result<i32, S7Error> {
        match param_number {
            P_U16_REMOTE_PORT => Ok(self.config.port as i32),
            P_I32_PING_TIMEOUT => Ok(self.config.connect_timeout_ms as i32),
            P_I32_SEND_TIMEOUT => Ok(self.config.send_timeout_ms as i32),
            P_I32_RECV_TIMEOUT => Ok(self.config.recv_timeout_ms as i32),
            P_I32_PDU_REQUEST => Ok(self.config.pdu_request as i32),
            _ => Err(S7Error::InvalidParamNumber),
        }
    }

    /// ### Changes a client parameter
    ///
    /// ### Errors
    /// - `S7Error::InvalidParamNumber`: unknown parameter.
    /// - `S7Error::InvalidParams`: value out of range.
    /// - `S7Error::CannotChangeParam`: the port cannot change while connected.
    pub fn set_param(&mut self, param_number: i32, value: i32) -> Result<(), S7Error> {
        match param_number {
            P_U16_REMOTE_PORT => {
                if self.is_connected() {
                    return Err(S7Error::CannotChangeParam);
                }
                self.config.port = u16::try_from(value)
                    .ok()
                    .filter(|&p| p > 0)
                    .ok_or(S7Error::InvalidParams)?;
            }
            P_I32_PING_TIMEOUT => self.config.connect_timeout_ms = positive(value)?,
            P_I32_SEND_TIMEOUT => self.config.send_timeout_ms = positive(value)?,
            P_I32_RECV_TIMEOUT => self.config.recv_timeout_ms = positive(value)?,
            P_I32_PDU_REQUEST => {
                let pdu = value.clamp(PDU_REQUEST_MIN as i32, PDU_REQUEST_MAX as i32);
                self.config.pdu_request = pdu as u16;
            }
            _ => return Err(S7Error::InvalidParamNumber),
        }
        Ok(())
    }

    /// ### Exchanges a raw S7 PDU
    ///
    /// `buffer[..size]` must hold an S7 PDU (from the protocol ID on). It is wrapped into
    /// TPKT and COTP headers, sent, and the reply PDU is copied back into `buffer`.
    ///
    /// ### Returns
    /// The size of the reply PDU.
    pub fn iso_exchange_buffer(&mut self, buffer: &mut [u8], size: usize) -> Result<usize, S7Error> {
        let started = Instant::now();
        let result = self.do_iso_exchange(buffer, size);
        self.finish(started, result)
    }

    fn do_iso_exchange(&mut self, buffer: &mut [u8], size: usize) -> Result<usize, S7Error> {
        if size == 0 || size > buffer.len() || size + ISO_H_SIZE > PDU_BUFFER_SIZE {
            return Err(S7Error::InvalidParams);
        }
        let request = Telegram::from_template(&TPKT_ISO).append(&buffer[..size]).sealed();
        let length = self.exchange(&request)?;
        if !self.is_s7_reply(length) {
            return Err(S7Error::InvalidPdu);
        }
        let reply = &self.pdu[ISO_H_SIZE..length];
        let dst = buffer.get_mut(..reply.len()).ok_or(S7Error::BufferTooSmall)?;
        dst.copy_from_slice(reply);
        Ok(reply.len())
    }

    /// Sequence number for directory and SZL requests.
    pub(crate) fn next_word(&mut self) -> u16 {
        let word = self.cnt_word;
        self.cnt_word = if self.cnt_word == 0xFFFF { 0 } else { self.cnt_word + 1 };
        word
    }

    fn send_packet(&mut self, data: &[u8]) -> Result<(), S7Error> {
        if !self.transport.is_connected() {
            return Err(S7Error::NotConnected);
        }
        self.transport.send(data)
    }

    /// ### Receives one ISO frame into the PDU buffer
    ///
    /// Empty frames (a bare 7 byte TPKT+COTP header) are absorbed and the wait goes on.
    /// Returns the whole frame length, headers included.
    pub(crate) fn recv_iso_packet(&mut self) -> Result<usize, S7Error> {
        let max_size = self.pdu_requested as usize + ISO_H_SIZE;
        loop {
            self.transport.receive(&mut self.pdu, 0, 4)?;
            let size = S7Codec::get_word_at(&self.pdu, 2) as usize;
            if size == ISO_H_SIZE {
                self.transport.receive(&mut self.pdu, 4, 3)?;
                continue;
            }
            if self.pdu[0] != ISO_ID || size > max_size || size < MIN_PDU_SIZE {
                return Err(S7Error::InvalidPdu);
            }
            self.transport.receive(&mut self.pdu, 4, 3)?;
            self.last_pdu_type = self.pdu[5];
            self.transport.receive(&mut self.pdu, ISO_H_SIZE, size - ISO_H_SIZE)?;
            return Ok(size);
        }
    }

    /// Sends a telegram and waits for the reply frame.
    pub(crate) fn exchange(&mut self, telegram: &Telegram) -> Result<usize, S7Error> {
        self.send_packet(telegram.as_bytes())?;
        self.recv_iso_packet()
    }

    /// True when the last reply carries an S7 header (protocol ID at 7).
    pub(crate) fn is_s7_reply(&self, length: usize) -> bool {
        length > ISO_H_SIZE && self.pdu[ISO_H_SIZE] == S7_ID
    }

    /// Outcome of the jobs this client does not implement (no I/O).
    pub(crate) fn not_implemented<R>(&mut self) -> Result<R, S7Error> {
        self.finish(Instant::now(), Err(S7Error::FunctionNotImplemented))
    }

    /// Records elapsed time and error code of a public operation.
    pub(crate) fn finish<R>(&mut self, started: Instant, result: Result<R, S7Error>) -> Result<R, S7Error> {
        match &result {
            Ok(_) => {
                self.last_error = 0;
                self.last_time = started.elapsed().as_secs_f64() * 1000.0;
            }
            Err(err) => {
                self.last_error = err.code();
                self.last_time = 0.0;
            }
        }
        result
    }
}

fn positive(value: i32) -> Result<u64, S7Error> {
    if value > 0 {
        Ok(value as u64)
    } else {
        Err(S7Error::InvalidParams)
    }
}

impl<T: MessageTransport> Drop for S7Client<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
