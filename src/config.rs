// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

use serde::{Deserialize, Serialize};

// Connection types
pub const CT_PG: u16 = 0x0001; // As PG (Default)
pub const CT_OP: u16 = 0x0002; // As OP
pub const CT_S7: u16 = 0x0003; // AS S7 Basic

pub const ISO_TCP_PORT: u16 = 102;

/// PDU length requested by default
pub const PDU_REQUEST_DEFAULT: u16 = 480;
pub const PDU_REQUEST_MIN: u16 = 240;
pub const PDU_REQUEST_MAX: u16 = 960;

// Parameter numbers accepted by get_param()/set_param()
pub const P_U16_REMOTE_PORT: i32 = 2;
pub const P_I32_PING_TIMEOUT: i32 = 3;
pub const P_I32_SEND_TIMEOUT: i32 = 4;
pub const P_I32_RECV_TIMEOUT: i32 = 5;
pub const P_I32_PDU_REQUEST: i32 = 10;

/// ### Client settings
///
/// Everything the session needs before `connect()`. Deserializable so that an
/// application can keep it inside its own configuration file.
///
/// ```
/// let cfg = s7link::ClientConfig { pdu_request: 960, ..Default::default() };
/// let client = s7link::S7Client::with_config(cfg);
/// assert_eq!(client.config().pdu_request, 960);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// TCP port, 102 unless the PLC sits behind a NAT
    pub port: u16,
    /// `CT_PG`, `CT_OP` or `CT_S7`
    pub connection_type: u16,
    /// PDU length proposed during negotiation (240..=960)
    pub pdu_request: u16,
    pub connect_timeout_ms: u64,
    pub send_timeout_ms: u64,
    pub recv_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            port: ISO_TCP_PORT,
            connection_type: CT_PG,
            pdu_request: PDU_REQUEST_DEFAULT,
            connect_timeout_ms: 2000,
            send_timeout_ms: 2000,
            recv_timeout_ms: 2000,
        }
    }
}

impl ClientConfig {
    /// Requested PDU length clamped to the range the CPUs accept.
    pub fn effective_pdu_request(&self) -> u16 {
        self.pdu_request.clamp(PDU_REQUEST_MIN, PDU_REQUEST_MAX)
    }
}
