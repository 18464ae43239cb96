// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! Error taxonomy and PLC result-code translation.
//!
//! Every failure the client can report is one [`S7Error`] variant. Each variant
//! has a fixed numeric code (the same values Snap7 uses, so logs and HMI tables
//! stay compatible) and a fixed descriptive text.

use thiserror::Error;

macro_rules! s7_errors {
    ($( $(#[$meta:meta])* $name:ident = $code:literal => $text:literal, )+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
        pub enum S7Error {
            $(
                $(#[$meta])*
                #[error($text)]
                $name,
            )+
        }

        impl S7Error {
            /// ### Numeric error code
            ///
            /// Transport errors live in the low word, ISO errors in the third nibble
            /// group and client/CPU errors from `0x00100000` upward.
            pub fn code(&self) -> u32 {
                match self {
                    $( S7Error::$name => $code, )+
                }
            }

            /// Reverse lookup of [`S7Error::code`].
            pub fn from_code(code: u32) -> Option<S7Error> {
                match code {
                    $( $code => Some(S7Error::$name), )+
                    _ => None,
                }
            }
        }
    };
}

s7_errors! {
    // TCP
    SocketCreation          = 0x0000_0001 => "SYS : Error creating the Socket",
    ConnectionTimeout       = 0x0000_0002 => "TCP : Connection Timeout",
    ConnectionFailed        = 0x0000_0003 => "TCP : Connection Error",
    ReceiveTimeout          = 0x0000_0004 => "TCP : Data receive Timeout",
    DataReceive             = 0x0000_0005 => "TCP : Error receiving Data",
    SendTimeout             = 0x0000_0006 => "TCP : Data send Timeout",
    DataSend                = 0x0000_0007 => "TCP : Error sending Data",
    ConnectionReset         = 0x0000_0008 => "TCP : Connection reset by the Peer",
    NotConnected            = 0x0000_0009 => "CLI : Client not connected",
    UnreachableHost         = 0x0000_2751 => "TCP : Unreachable host",
    // ISO
    IsoConnect              = 0x0001_0000 => "ISO : Connection Error",
    InvalidPdu              = 0x0003_0000 => "ISO : Invalid PDU received",
    InvalidDataSize         = 0x0004_0000 => "ISO : Invalid Buffer passed to Send/Receive",
    // Client
    NegotiationFailed       = 0x0010_0000 => "CLI : Error in PDU negotiation",
    InvalidParams           = 0x0020_0000 => "CLI : invalid param(s) supplied",
    JobPending              = 0x0030_0000 => "CLI : Job pending",
    TooManyItems            = 0x0040_0000 => "CLI : too may items (>20) in multi read/write",
    InvalidWordLength       = 0x0050_0000 => "CLI : invalid WordLength",
    PartialDataWritten      = 0x0060_0000 => "CLI : Partial data written",
    SizeOverPdu             = 0x0070_0000 => "CPU : total data exceeds the PDU size",
    InvalidPlcAnswer        = 0x0080_0000 => "CLI : invalid CPU answer",
    AddressOutOfRange       = 0x0090_0000 => "CPU : Address out of range",
    InvalidTransportSize    = 0x00A0_0000 => "CPU : Invalid Transport size",
    WriteDataSizeMismatch   = 0x00B0_0000 => "CPU : Data size mismatch",
    ItemNotAvailable        = 0x00C0_0000 => "CPU : Item not available",
    InvalidValue            = 0x00D0_0000 => "CPU : Invalid value supplied",
    CannotStartPlc          = 0x00E0_0000 => "CPU : Cannot start PLC",
    AlreadyRun              = 0x00F0_0000 => "CPU : PLC already RUN",
    CannotStopPlc           = 0x0100_0000 => "CPU : Cannot stop PLC",
    CannotCopyRamToRom      = 0x0110_0000 => "CPU : Cannot copy RAM to ROM",
    CannotCompress          = 0x0120_0000 => "CPU : Cannot compress",
    AlreadyStop             = 0x0130_0000 => "CPU : PLC already STOP",
    FunctionNotAvailable    = 0x0140_0000 => "CPU : Function not available",
    UploadSequenceFailed    = 0x0150_0000 => "CPU : Upload sequence failed",
    InvalidDataSizeReceived = 0x0160_0000 => "CLI : Invalid data size received",
    InvalidBlockType        = 0x0170_0000 => "CLI : Invalid block type",
    InvalidBlockNumber      = 0x0180_0000 => "CLI : Invalid block number",
    InvalidBlockSize        = 0x0190_0000 => "CLI : Invalid block size",
    NeedPassword            = 0x01D0_0000 => "CPU : Function not authorized for current protection level",
    InvalidPassword         = 0x01E0_0000 => "CPU : Invalid password",
    NoPasswordToSetOrClear  = 0x01F0_0000 => "CPU : No password to set or clear",
    JobTimeout              = 0x0200_0000 => "CLI : Job Timeout",
    PartialDataRead         = 0x0210_0000 => "CLI : Partial data read",
    BufferTooSmall          = 0x0220_0000 => "CLI : The buffer supplied is too small to accomplish the operation",
    FunctionRefused         = 0x0230_0000 => "CLI : function refused by CPU (Unknown error)",
    Destroying              = 0x0240_0000 => "CLI : Cannot perform (destroying)",
    InvalidParamNumber      = 0x0250_0000 => "CLI : Invalid Param Number",
    CannotChangeParam       = 0x0260_0000 => "CLI : Cannot change this param now",
    FunctionNotImplemented  = 0x0270_0000 => "CLI : Function not implemented",
}

impl S7Error {
    /// True for errors raised below the S7 layer (socket and ISO framing).
    ///
    /// After one of these the connection should be considered dirty: the caller is
    /// expected to `disconnect()` and connect again.
    pub fn is_transport(&self) -> bool {
        self.code() < 0x0010_0000
    }
}

/// ### Error text lookup
///
/// Returns "OK" for 0, the fixed description for known codes and a hex fallback otherwise.
pub fn error_text(code: u32) -> String {
    if code == 0 {
        return "OK".to_string();
    }
    match S7Error::from_code(code) {
        Some(err) => err.to_string(),
        None => format!("CLI : Unknown error (0x{:x})", code),
    }
}

// PLC result codes
const CODE_OK: u16 = 0x0000;
const CODE_ADDRESS_OUT_OF_RANGE: u16 = 0x0005;
const CODE_INVALID_TRANSPORT_SIZE: u16 = 0x0006;
const CODE_WRITE_DATA_SIZE_MISMATCH: u16 = 0x0007;
const CODE_RES_ITEM_NOT_AVAILABLE: u16 = 0x000A;
const CODE_RES_ITEM_NOT_AVAILABLE1: u16 = 0xD209;
const CODE_INVALID_VALUE: u16 = 0xDC01;
const CODE_NEED_PASSWORD: u16 = 0xD241;
const CODE_INVALID_PASSWORD: u16 = 0xD602;
const CODE_NO_PASSWORD_TO_CLEAR: u16 = 0xD604;
const CODE_NO_PASSWORD_TO_SET: u16 = 0xD605;
const CODE_FUNCTION_NOT_AVAILABLE: u16 = 0x8104;
const CODE_DATA_OVER_PDU: u16 = 0x8500;

/// ### Translates a PLC result code
///
/// `0` is success. Codes the client does not know collapse to `FunctionRefused`.
pub fn cpu_error(code: u16) -> Result<(), S7Error> {
    match code {
        CODE_OK => Ok(()),
        CODE_ADDRESS_OUT_OF_RANGE => Err(S7Error::AddressOutOfRange),
        CODE_INVALID_TRANSPORT_SIZE => Err(S7Error::InvalidTransportSize),
        CODE_WRITE_DATA_SIZE_MISMATCH => Err(S7Error::WriteDataSizeMismatch),
        CODE_RES_ITEM_NOT_AVAILABLE | CODE_RES_ITEM_NOT_AVAILABLE1 => Err(S7Error::ItemNotAvailable),
        CODE_DATA_OVER_PDU => Err(S7Error::SizeOverPdu),
        CODE_INVALID_VALUE => Err(S7Error::InvalidValue),
        CODE_FUNCTION_NOT_AVAILABLE => Err(S7Error::FunctionNotAvailable),
        CODE_NEED_PASSWORD => Err(S7Error::NeedPassword),
        CODE_INVALID_PASSWORD => Err(S7Error::InvalidPassword),
        CODE_NO_PASSWORD_TO_CLEAR | CODE_NO_PASSWORD_TO_SET => Err(S7Error::NoPasswordToSetOrClear),
        _ => Err(S7Error::FunctionRefused),
    }
}

/// Error for a data item whose result byte is not the success marker.
pub(crate) fn item_error(code: u8) -> S7Error {
    match cpu_error(code as u16) {
        Err(err) => err,
        // 0x00 is "reserved" at item level, never a success
        Ok(()) => S7Error::FunctionRefused,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_codes_never_succeed() {
        assert_eq!(item_error(0x00), S7Error::FunctionRefused);
        assert_eq!(item_error(0x05), S7Error::AddressOutOfRange);
        assert_eq!(item_error(0x0A), S7Error::ItemNotAvailable);
    }

    #[test]
    fn cpu_codes_translate() {
        assert_eq!(cpu_error(0), Ok(()));
        assert_eq!(cpu_error(0x05), Err(S7Error::AddressOutOfRange));
        assert_eq!(cpu_error(0x0A), Err(S7Error::ItemNotAvailable));
        assert_eq!(cpu_error(0xD209), Err(S7Error::ItemNotAvailable));
        assert_eq!(cpu_error(0x8500), Err(S7Error::SizeOverPdu));
        assert_eq!(cpu_error(0xD604), Err(S7Error::NoPasswordToSetOrClear));
        assert_eq!(cpu_error(0xD605), Err(S7Error::NoPasswordToSetOrClear));
        assert_eq!(cpu_error(0x1234), Err(S7Error::FunctionRefused));
    }

    #[test]
    fn codes_round_trip_through_lookup() {
        for err in [
            S7Error::SocketCreation,
            S7Error::UnreachableHost,
            S7Error::InvalidPdu,
            S7Error::TooManyItems,
            S7Error::FunctionNotImplemented,
        ] {
            assert_eq!(S7Error::from_code(err.code()), Some(err));
        }
    }

    #[test]
    fn text_lookup() {
        assert_eq!(error_text(0), "OK");
        assert_eq!(error_text(0x0009), "CLI : Client not connected");
        assert_eq!(error_text(0x0070_0000), "CPU : total data exceeds the PDU size");
        assert_eq!(error_text(0xABCD), "CLI : Unknown error (0xabcd)");
    }

    #[test]
    fn transport_classification() {
        assert!(S7Error::ReceiveTimeout.is_transport());
        assert!(S7Error::InvalidPdu.is_transport());
        assert!(!S7Error::NegotiationFailed.is_transport());
        assert!(!S7Error::AddressOutOfRange.is_transport());
    }
}
