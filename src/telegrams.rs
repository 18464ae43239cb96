// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! Request templates.
//!
//! Every request starts from one of these immutable byte images. A [`Telegram`]
//! copies the template and patches fields at named offsets, so no state ever leaks
//! from one request into the next.
//!
//! ```text
//!  TPKT (RFC1006)                COTP (ISO 8073)       S7
//!  [0] 0x03 [1] 0x00 [2..4] len  [4] 0x02 [5] 0xF0 [6] EOT  [7] 0x32 ...
//! ```

use crate::codec::{S7Codec, WireCodec};

pub(crate) const ISO_ID: u8 = 0x03; // RFC 1006 ID
pub(crate) const S7_ID: u8 = 0x32; // S7 Protocol ID

/// TPKT + COTP data header
pub(crate) const ISO_H_SIZE: usize = 7;
/// Smallest frame carrying S7 data
pub(crate) const MIN_PDU_SIZE: usize = 16;
/// Read reply header: the payload of a single read starts at 25, 18 bytes after the S7 header
pub(crate) const READ_RES_HEADER: usize = 18;
/// Write request header up to the payload
pub(crate) const SIZE_WR: usize = 35;
/// Single area read request
pub(crate) const SIZE_RD: usize = 31;

pub(crate) const ISO_CONN_OK: u8 = 0xD0; // COTP connection confirm

// Transport sizes
pub const TS_RES_BIT: u8 = 0x03;
pub const TS_RES_BYTE: u8 = 0x04;
pub const TS_RES_INT: u8 = 0x05;
pub const TS_RES_REAL: u8 = 0x07;
pub const TS_RES_OCTET: u8 = 0x09;

// Data item result marker
pub(crate) const RES_SUCCESS: u8 = 0xFF;

// Syntax IDs
pub(crate) const SYNTAX_S7ANY: u8 = 0x10;
pub(crate) const SYNTAX_NCK: u8 = 0x82;
pub(crate) const SYNTAX_DRIVE: u8 = 0xA2;

// Field offsets shared by most telegrams
pub(crate) const POS_LEN: usize = 2;
pub(crate) const POS_SEQ: usize = 11;
pub(crate) const POS_PAR_LEN: usize = 13;
pub(crate) const POS_DATA_LEN: usize = 15;
pub(crate) const POS_FUNCTION: usize = 17;
pub(crate) const POS_ITEMS_COUNT: usize = 18;

/// COTP connection request. TSAPs at 16/17 (local) and 20/21 (remote).
pub(crate) const ISO_CR: [u8; 22] = [
    // TPKT (RFC1006 Header)
    ISO_ID, // RFC 1006 ID (3)
    0x00,   // Reserved, always 0
    0x00,   // High part of packet lenght (entire frame, payload and TPDU included)
    0x16,   // Low part of packet lenght (entire frame, payload and TPDU included)
    // COTP (ISO 8073 Header)
    0x11, // PDU Size Length
    0xE0, // CR - Connection Request ID
    0x00, // Dst Reference HI
    0x00, // Dst Reference LO
    0x00, // Src Reference HI
    0x01, // Src Reference LO
    0x00, // Class + Options Flags
    0xC0, // PDU Max Length ID
    0x01, // PDU Max Length HI
    0x0A, // PDU Max Length LO
    0xC1, // Src TSAP Identifier
    0x02, // Src TSAP Length (2 bytes)
    0x01, // Src TSAP HI (will be overwritten)
    0x00, // Src TSAP LO (will be overwritten)
    0xC2, // Dst TSAP Identifier
    0x02, // Dst TSAP Length (2 bytes)
    0x01, // Dst TSAP HI (will be overwritten)
    0x02, // Dst TSAP LO (will be overwritten)
];
pub(crate) const CR_LOCAL_TSAP: usize = 16;
pub(crate) const CR_REMOTE_TSAP: usize = 20;

/// S7 PDU negotiation, requested length at 23.
pub(crate) const S7_PN: [u8; 25] = [
    0x03, 0x00, 0x00, 0x19,
    0x02, 0xf0, 0x80,
    S7_ID, 0x01, 0x00, 0x00, 0x04, 0x00, 0x00, 0x08, 0x00,
    0x00, 0xf0, 0x00, 0x00, 0x01, 0x00, 0x01,
    0x01, 0xe0, // PDU Length Requested (default 480, patched per connection)
];
pub(crate) const PN_PDU_REQ: usize = 23;

/// Single area read/write request (31 bytes read, 35 + payload write).
pub(crate) const S7_RW: [u8; 35] = [
    0x03, 0x00,       // RFC 1006 ID (constant)                   0
    0x00, 0x1f,       // Telegram Length (Data Size + 31 or 35)   2
    0x02, 0xf0, 0x80, // COTP (constant)                          4
    S7_ID,            // S7 Protocol ID                           7
    0x01,             // Job Type                                 8
    0x00, 0x00,       // Redundancy identification                9
    0x05, 0x00,       // PDU Reference                            11
    0x00, 0x0e,       // Parameters Length                        13
    0x00, 0x00,       // Data Length = Size(bytes) + 4            15
    0x04,             // Function 4 Read Var, 5 Write Var         17
    0x01,             // Items count                              18
    0x12,             // Var spec.                                19
    0x0a,             // Length of remaining bytes                20
    SYNTAX_S7ANY,     // Syntax ID                                21
    0x02,             // Transport Size idx=22 (Byte)             22
    0x00, 0x00,       // Num Elements                             23
    0x00, 0x00,       // DB Number (if any, else 0)               25
    0x84,             // Area Type                                27
    0x00, 0x00, 0x00, // Area Offset                              28
    // WR area
    0x00,             // Reserved                                 31
    0x04,             // Transport size                           32
    0x00, 0x00,       // Data Length * 8 (if not bit or timer or counter) 33
];
pub(crate) const RW_WORD_LEN: usize = 22;
pub(crate) const RW_NUM_ELEMENTS: usize = 23;
pub(crate) const RW_DB_NUMBER: usize = 25;
pub(crate) const RW_AREA: usize = 27;
pub(crate) const RW_ADDRESS: usize = 28;
pub(crate) const RW_TRANSPORT: usize = 32;
pub(crate) const RW_DATA_LEN: usize = 33;

/// Multi item request header, items follow at 19.
pub(crate) const S7_MRW_HEADER: [u8; 19] = [
    0x03, 0x00,
    0x00, 0x1f,       // Telegram Length
    0x02, 0xf0, 0x80, // COTP (see above for info)
    S7_ID,            // S7 Protocol ID
    0x01,             // Job Type
    0x00, 0x00,       // Redundancy identification
    0x05, 0x00,       // PDU Reference
    0x00, 0x0e,       // Parameters Length
    0x00, 0x00,       // Data Length = Size(bytes) + 4
    0x04,             // Function 4 Read Var, 5 Write Var
    0x01,             // Items count (idx 18)
];

/// S7ANY item spec (12 bytes).
pub(crate) const S7_MRW_ITEM: [u8; 12] = [
    0x12,             // Var spec.
    0x0a,             // Length of remaining bytes
    SYNTAX_S7ANY,     // Syntax ID
    0x02,             // Transport Size idx=3
    0x00, 0x00,       // Num Elements
    0x00, 0x00,       // DB Number (if any, else 0)
    0x84,             // Area Type
    0x00, 0x00, 0x00, // Area Offset
];

/// NCK item spec (10 bytes).
pub(crate) const NCK_MRW_ITEM: [u8; 10] = [
    0x12,             // Var spec.
    0x08,             // Length of remaining bytes
    SYNTAX_NCK,       // Syntax ID
    0x00,             // NCK Area and Unit
    0x00, 0x00,       // Parameter Number
    0x00, 0x00,       // Parameter Index
    0x00,             // NCK Module
    0x00,             // Number of Rows
];

/// Drive item spec (12 bytes).
pub(crate) const DRV_MRW_ITEM: [u8; 12] = [
    0x12,             // Var spec.
    0x0a,             // Length of remaining bytes
    SYNTAX_DRIVE,     // Syntax ID
    0x00,             // Parameter Type
    0x00, 0x00,       // Number of Rows
    0x00, 0x00,       // Number of DriveObject
    0x00, 0x00,       // Parameter Number
    0x00, 0x00,       // Parameter Index
];

/// NCK area read (29 bytes).
pub(crate) const S7_NCK_RW: [u8; 29] = [
    0x03, 0x00,
    0x00, 0x1d,       // Telegram Length (Data Size + 29 or 33)
    0x02, 0xf0, 0x80, // COTP (see above for info)
    S7_ID,            // S7 Protocol ID
    0x01,             // Job Type
    0x00, 0x00,       // Redundancy identification
    0x05, 0x00,       // PDU Reference
    0x00, 0x0c,       // Parameters Length
    0x00, 0x00,       // Data Length = Size(bytes) + 4
    0x04,             // Function 4 Read Var, 5 Write Var
    0x01,             // Items count
    0x12,             // Var spec.
    0x08,             // Length of remaining bytes
    SYNTAX_NCK,       // Syntax ID
    0x00,             // NCK Area and Unit                        22
    0x00, 0x00,       // Parameter Number                         23
    0x00, 0x00,       // Parameter Index                          25
    0x00,             // NCK Module (see NC-Var selector)         27
    0x00,             // Number of Rows                           28
];
pub(crate) const NCK_AREA_UNIT: usize = 22;
pub(crate) const NCK_PARAMETER: usize = 23;
pub(crate) const NCK_START: usize = 25;
pub(crate) const NCK_MODULE: usize = 27;
pub(crate) const NCK_ROWS: usize = 28;

/// Drive parameter read (31 bytes).
pub(crate) const S7_DRV_RW: [u8; 31] = [
    0x03, 0x00,
    0x00, 0x1f,       // Telegram Length (Data Size + 31 or 35)
    0x02, 0xf0, 0x80, // COTP (see above for info)
    S7_ID,            // S7 Protocol ID
    0x01,             // Job Type
    0x00, 0x00,       // Redundancy identification
    0x05, 0x00,       // PDU Reference
    0x00, 0x0e,       // Parameters Length
    0x00, 0x00,       // Data Length = Size(bytes) + 4
    0x04,             // Function 4 Read Var, 5 Write Var
    0x01,             // Items count
    0x12,             // Var spec.
    0x0a,             // Length of remaining bytes
    SYNTAX_DRIVE,     // Syntax ID
    0x00,             // Parameter Type                           22
    0x00, 0x00,       // Number of Rows                           23
    0x00, 0x00,       // Number of DriveObject                    25
    0x00, 0x00,       // Parameter Number                         27
    0x00, 0x00,       // Parameter Index                          29
];
pub(crate) const DRV_WORD_LEN: usize = 22;
pub(crate) const DRV_ROWS: usize = 23;
pub(crate) const DRV_DO_NUMBER: usize = 25;
pub(crate) const DRV_PARAMETER: usize = 27;
pub(crate) const DRV_INDEX: usize = 29;

/// Block directory: counts per block type.
pub(crate) const S7_LIST_BLOCKS: [u8; 29] = [
    0x03, 0x00, 0x00, 0x1d, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00,
    0x00, 0x00, // Sequence (little endian)
    0x00, 0x08, 0x00, 0x04, 0x00, 0x01, 0x12, 0x04, 0x11, 0x43, 0x01, 0x00,
    0x0a, 0x00, 0x00, 0x00,
];

/// Block directory: numbers of one block type, request data appended.
pub(crate) const S7_LIST_BLOCKS_OF_TYPE: [u8; 25] = [
    0x03, 0x00, 0x00, 0x1f, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00,
    0x00, 0x00, // Sequence (little endian)
    0x00, 0x08, 0x00, 0x06, 0x00, 0x01, 0x12, 0x04, 0x11, 0x43, 0x02, 0x00,
];
pub(crate) const LBT_FIRST_DATA: [u8; 6] = [0xff, 0x09, 0x00, 0x02, 0x30, 0x41];
pub(crate) const LBT_NEXT_DATA: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x00];

/// Block info, type at 30 and number as five ASCII digits at 31.
pub(crate) const S7_BI: [u8; 37] = [
    0x03, 0x00, 0x00, 0x25, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00, 0x05, 0x00,
    0x00, 0x08, 0x00, 0x0c, 0x00, 0x01, 0x12, 0x04, 0x11, 0x43, 0x03, 0x00,
    0xff, 0x09, 0x00, 0x08, 0x30,
    0x41,                         // Block Type
    0x30, 0x30, 0x30, 0x30, 0x30, // ASCII Block Number
    0x41,
];
pub(crate) const BI_TYPE: usize = 30;
pub(crate) const BI_NUMBER: usize = 31;

/// SZL first request, ID at 29 and index at 31.
pub(crate) const S7_SZL_FIRST: [u8; 33] = [
    0x03, 0x00, 0x00, 0x21, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00,
    0x05, 0x00, // Sequence out
    0x00, 0x08, 0x00, 0x08, 0x00, 0x01, 0x12, 0x04, 0x11, 0x44, 0x01, 0x00,
    0xff, 0x09, 0x00, 0x04,
    0x00, 0x00, // ID Required
    0x00, 0x00, // Index
];
pub(crate) const SZL_ID: usize = 29;
pub(crate) const SZL_INDEX: usize = 31;

/// SZL continuation request, echoed sequence byte at 24.
pub(crate) const S7_SZL_NEXT: [u8; 33] = [
    0x03, 0x00, 0x00, 0x21, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00, 0x06,
    0x00, 0x00, 0x0c, 0x00, 0x04, 0x00, 0x01, 0x12, 0x08, 0x12, 0x44, 0x01,
    0x01, // Sequence
    0x00, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x00,
];
pub(crate) const SZL_NEXT_SEQ_IN: usize = 24;

/// Get PLC date and time.
pub(crate) const S7_GET_DT: [u8; 29] = [
    0x03, 0x00, 0x00, 0x1d, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00, 0x38,
    0x00, 0x00, 0x08, 0x00, 0x04, 0x00, 0x01, 0x12, 0x04, 0x11, 0x47, 0x01,
    0x00, 0x0a, 0x00, 0x00, 0x00,
];

/// Set PLC date and time, century at 30 and DATE_AND_TIME at 31.
pub(crate) const S7_SET_DT: [u8; 39] = [
    0x03, 0x00, 0x00, 0x27, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00, 0x89,
    0x03, 0x00, 0x08, 0x00, 0x0e, 0x00, 0x01, 0x12, 0x04, 0x11, 0x47, 0x02,
    0x00, 0xff, 0x09, 0x00, 0x0a, 0x00,
    0x19, // Hi part of Year (idx 30)
    0x13, // Lo part of Year
    0x12, // Month
    0x06, // Day
    0x17, // Hour
    0x37, // Min
    0x13, // Sec
    0x00, 0x01, // ms + Day of week
];
pub(crate) const DT_CENTURY: usize = 30;
pub(crate) const DT_VALUE: usize = 31;

/// PLC stop.
pub(crate) const S7_STOP: [u8; 33] = [
    0x03, 0x00, 0x00, 0x21, 0x02, 0xf0, 0x80, 0x32, 0x01, 0x00, 0x00, 0x0e,
    0x00, 0x00, 0x10, 0x00, 0x00, 0x29, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09,
    0x50, 0x5f, 0x50, 0x52, 0x4f, 0x47, 0x52, 0x41, 0x4d,
];

/// PLC hot start (warm restart).
pub(crate) const S7_HOT_START: [u8; 37] = [
    0x03, 0x00, 0x00, 0x25, 0x02, 0xf0, 0x80, 0x32, 0x01, 0x00, 0x00, 0x0c,
    0x00, 0x00, 0x14, 0x00, 0x00, 0x28, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xfd, 0x00, 0x00, 0x09, 0x50, 0x5f, 0x50, 0x52, 0x4f, 0x47, 0x52, 0x41,
    0x4d,
];

/// PLC cold start.
pub(crate) const S7_COLD_START: [u8; 39] = [
    0x03, 0x00, 0x00, 0x27, 0x02, 0xf0, 0x80, 0x32, 0x01, 0x00, 0x00, 0x0f,
    0x00, 0x00, 0x16, 0x00, 0x00, 0x28, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xfd, 0x00, 0x02, 0x43, 0x20, 0x09, 0x50, 0x5f, 0x50, 0x52, 0x4f, 0x47,
    0x52, 0x41, 0x4d,
];

/// PLC status (SZL 0x0424).
pub(crate) const S7_GET_STAT: [u8; 33] = [
    0x03, 0x00, 0x00, 0x21, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00, 0x2c,
    0x00, 0x00, 0x08, 0x00, 0x08, 0x00, 0x01, 0x12, 0x04, 0x11, 0x44, 0x01,
    0x00, 0xff, 0x09, 0x00, 0x04, 0x04, 0x24, 0x00, 0x00,
];

/// Set session password, encoded password at 29.
pub(crate) const S7_SET_PWD: [u8; 37] = [
    0x03, 0x00, 0x00, 0x25, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00, 0x27,
    0x00, 0x00, 0x08, 0x00, 0x0c, 0x00, 0x01, 0x12, 0x04, 0x11, 0x45, 0x01,
    0x00, 0xff, 0x09, 0x00, 0x08,
    // 8 Char Encoded Password
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
pub(crate) const PWD_VALUE: usize = 29;

/// Clear session password.
pub(crate) const S7_CLR_PWD: [u8; 29] = [
    0x03, 0x00, 0x00, 0x1d, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00, 0x29,
    0x00, 0x00, 0x08, 0x00, 0x04, 0x00, 0x01, 0x12, 0x04, 0x11, 0x45, 0x02,
    0x00, 0x0a, 0x00, 0x00, 0x00,
];

/// Force jobs, first frame.
pub(crate) const S7_FORCE_VAL1: [u8; 61] = [
    0x03, 0x00, 0x00, 0x3d, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00, 0x07,
    0x00, 0x00, 0x0c, 0x00, 0x20, 0x00, 0x01, 0x12, 0x08, 0x12, 0x41, 0x10,
    0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x09, 0x00, 0x1c, 0x00, 0x14, 0x00,
    0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00,
];

/// Force jobs, second frame for S7-300 CPUs.
pub(crate) const S7_FORCE_VAL300: [u8; 59] = [
    0x03, 0x00, 0x00, 0x3b, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00, 0x0c,
    0x00, 0x00, 0x0c, 0x00, 0x1e, 0x00, 0x01, 0x12, 0x08, 0x12, 0x41, 0x11,
    0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x09, 0x00, 0x1a, 0x00, 0x14, 0x00,
    0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x09, 0x03,
];

/// Force jobs, second frame for S7-400 CPUs.
pub(crate) const S7_FORCE_VAL400: [u8; 59] = [
    0x03, 0x00, 0x00, 0x3b, 0x02, 0xf0, 0x80, 0x32, 0x07, 0x00, 0x00, 0x0c,
    0x00, 0x00, 0x0c, 0x00, 0x1e, 0x00, 0x01, 0x12, 0x08, 0x12, 0x41, 0x11,
    0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x09, 0x00, 0x1a, 0x00, 0x14, 0x00,
    0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x09, 0x05,
];

/// TPKT + COTP data header used to wrap raw PDUs.
pub(crate) const TPKT_ISO: [u8; ISO_H_SIZE] = [0x03, 0x00, 0x00, 0x1f, 0x02, 0xf0, 0x80];

/// ### Outgoing frame builder
///
/// Copies a template and patches named fields. Multi-byte fields use the S7
/// (big-endian) order: telegram headers are big-endian for every protocol
/// variant, only NCK payloads differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Telegram {
    buf: Vec<u8>,
}

impl Telegram {
    pub fn from_template(template: &[u8]) -> Self {
        Telegram { buf: template.to_vec() }
    }

    pub fn byte(mut self, pos: usize, value: u8) -> Self {
        self.buf[pos] = value;
        self
    }

    pub fn word(mut self, pos: usize, value: u16) -> Self {
        S7Codec::set_word_at(&mut self.buf, pos, value);
        self
    }

    /// 24 bit big-endian address
    pub fn address(mut self, pos: usize, value: u32) -> Self {
        self.buf[pos] = ((value >> 16) & 0xFF) as u8;
        self.buf[pos + 1] = ((value >> 8) & 0xFF) as u8;
        self.buf[pos + 2] = (value & 0xFF) as u8;
        self
    }

    pub fn bytes(mut self, pos: usize, value: &[u8]) -> Self {
        self.buf[pos..pos + value.len()].copy_from_slice(value);
        self
    }

    /// Truncates to `len` bytes (templates carrying the write extension are reused for reads).
    pub fn truncate(mut self, len: usize) -> Self {
        self.buf.truncate(len);
        self
    }

    pub fn append(mut self, value: &[u8]) -> Self {
        self.buf.extend_from_slice(value);
        self
    }

    /// Stamps the TPKT length with the current frame size.
    pub fn sealed(self) -> Self {
        let len = self.buf.len() as u16;
        self.word(POS_LEN, len)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_declare_their_own_length() {
        for t in [
            &ISO_CR[..], &S7_PN[..], &S7_LIST_BLOCKS[..], &S7_BI[..], &S7_SZL_FIRST[..],
            &S7_SZL_NEXT[..], &S7_GET_DT[..], &S7_SET_DT[..], &S7_STOP[..], &S7_HOT_START[..],
            &S7_COLD_START[..], &S7_GET_STAT[..], &S7_SET_PWD[..], &S7_CLR_PWD[..],
            &S7_FORCE_VAL1[..], &S7_FORCE_VAL300[..], &S7_FORCE_VAL400[..],
            &S7_NCK_RW[..], &S7_DRV_RW[..],
        ] {
            assert_eq!(S7Codec::get_word_at(t, POS_LEN) as usize, t.len());
        }
    }

    #[test]
    fn builder_patches_a_copy() {
        let t = Telegram::from_template(&S7_RW)
            .truncate(SIZE_RD)
            .word(RW_DB_NUMBER, 0x0102)
            .address(RW_ADDRESS, 0x0A0B0C);
        assert_eq!(t.len(), SIZE_RD);
        assert_eq!(&t.as_bytes()[25..31], &[0x01, 0x02, 0x84, 0x0A, 0x0B, 0x0C]);
        assert_eq!(S7_RW[25], 0x00);
    }

    #[test]
    fn sealed_stamps_length() {
        let t = Telegram::from_template(&TPKT_ISO).append(&[1, 2, 3]).sealed();
        assert_eq!(&t.as_bytes()[..4], &[0x03, 0x00, 0x00, 0x0a]);
    }
}
