#![doc = include_str!("../README.md")]

pub mod area;
pub mod client;
pub mod codec;
pub mod config;
pub mod control;
pub mod directory;
pub mod error;
pub mod forces;
pub mod multivar;
pub mod sinumerik;
pub mod szl;
mod telegrams;
pub mod transport;

pub use client::{
    data_size_byte, S7Client,
    MAX_VARS,
    S7_AREA_PE, S7_AREA_PA, S7_AREA_MK, S7_AREA_DB, S7_AREA_CT, S7_AREA_TM,
    S7_WL_BIT, S7_WL_BYTE, S7_WL_CHAR, S7_WL_WORD, S7_WL_INT, S7_WL_DWORD, S7_WL_DINT,
    S7_WL_REAL, S7_WL_COUNTER, S7_WL_TIMER,
};
pub use codec::{NckCodec, S7Codec, WireCodec};
pub use config::{ClientConfig, CT_OP, CT_PG, CT_S7, ISO_TCP_PORT};
pub use control::PlcStatus;
pub use directory::{S7BlockInfo, S7BlocksList};
pub use error::{cpu_error, error_text, S7Error};
pub use forces::{decode_force_jobs, ForceJob, ForceType};
pub use multivar::{DataItem, S7DataItem, S7Tag, VarAddress, WriteLayout};
pub use sinumerik::{DrvDataItem, DrvTag, NckDataItem, NckTag};
pub use szl::{S7CpInfo, S7CpuInfo, S7OrderCode, S7Protection, S7Szl, SzlHeader};
pub use telegrams::{TS_RES_BIT, TS_RES_BYTE, TS_RES_INT, TS_RES_OCTET, TS_RES_REAL};
pub use transport::{MessageTransport, TcpTransport};
