// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

mod common;

use common::*;
use s7link::area::{MAX_BYTE_ADDRESS, MAX_RAW_ADDRESS};
use s7link::{
    S7Error, S7_AREA_DB, S7_AREA_MK, S7_AREA_PE, S7_AREA_TM, S7_WL_BIT, S7_WL_BYTE, S7_WL_DWORD, S7_WL_TIMER,
};

#[test]
fn read_db_bytes() {
    let mut client = connected_client(240, &[read_reply(&[0xde, 0xad, 0xbe, 0xef])]);
    let mut buffer = [0u8; 4];

    assert_eq!(client.read_db(7, 12, &mut buffer), Ok(4));
    assert_eq!(buffer, [0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(client.chunks, 1);
    assert_eq!(client.transferred, 4);

    let sent = &job_frames(&client)[0];
    assert_eq!(sent.len(), 31);
    assert_eq!(sent[17], 0x04); // read var
    assert_eq!(sent[22], S7_WL_BYTE);
    assert_eq!(&sent[23..25], &[0x00, 0x04]);
    assert_eq!(&sent[25..27], &[0x00, 0x07]);
    assert_eq!(sent[27], S7_AREA_DB);
    assert_eq!(&sent[28..31], &[0x00, 0x00, 0x60]); // 12 << 3
}

#[test]
fn typed_amount_becomes_bytes() {
    let mut client = connected_client(240, &[read_reply(&[0u8; 8])]);
    let mut buffer = [0u8; 8];
    assert_eq!(client.read_area(S7_AREA_PE, 0, 0, 2, S7_WL_DWORD, &mut buffer), Ok(8));

    let sent = &job_frames(&client)[0];
    assert_eq!(sent[22], S7_WL_BYTE);
    assert_eq!(&sent[23..25], &[0x00, 0x08]);
    // DB number is only written for DB areas
    assert_eq!(&sent[25..27], &[0x00, 0x00]);
}

#[test]
fn large_read_is_split_by_pdu() {
    let payload: Vec<u8> = (0..500).map(|i| i as u8).collect();
    let replies = [
        read_reply(&payload[..222]),
        read_reply(&payload[222..444]),
        read_reply(&payload[444..]),
    ];
    let mut client = connected_client(240, &replies);
    let mut buffer = vec![0u8; 500];

    assert_eq!(client.read_db(1, 0, &mut buffer), Ok(500));
    assert_eq!(buffer, payload);
    assert_eq!(client.chunks, 3);

    let frames = job_frames(&client);
    assert_eq!(frames.len(), 3);
    let counts: Vec<u16> = frames.iter().map(|f| u16::from_be_bytes([f[23], f[24]])).collect();
    assert_eq!(counts, vec![222, 222, 56]);
    // 222 * 8 = 0x06f0, 444 * 8 = 0x0de0
    assert_eq!(&frames[1][28..31], &[0x00, 0x06, 0xf0]);
    assert_eq!(&frames[2][28..31], &[0x00, 0x0d, 0xe0]);
}

#[test]
fn failed_fragment_reports_partial_progress() {
    let mut client = connected_client(240, &[read_reply(&[0x11; 222]), read_item_error(0x05)]);
    let mut buffer = vec![0u8; 300];

    assert_eq!(client.read_db(1, 0, &mut buffer), Err(S7Error::AddressOutOfRange));
    assert_eq!(client.transferred, 222);
    assert_eq!(client.chunks, 2);
    assert!(buffer[..222].iter().all(|&b| b == 0x11));
}

#[test]
fn large_write_is_split_by_pdu() {
    let replies = [write_reply(0xff), write_reply(0xff), write_reply(0xff)];
    let mut client = connected_client(240, &replies);
    let data = vec![0x5a; 500];

    assert_eq!(client.write_db(3, 0, &data), Ok(500));
    assert_eq!(client.chunks, 3);

    let frames = job_frames(&client);
    // 240 - 35 bytes per fragment
    assert_eq!(frames[0].len(), 35 + 205);
    assert_eq!(frames[0][17], 0x05);
    assert_eq!(&frames[0][15..17], &(205u16 + 4).to_be_bytes());
    assert_eq!(frames[0][32], 0x04); // byte transport
    assert_eq!(&frames[0][33..35], &(205u16 * 8).to_be_bytes());
    assert_eq!(frames[2].len(), 35 + 90);
    assert_eq!(&frames[2][2..4], &(125u16).to_be_bytes());
}

#[test]
fn write_item_error_is_translated() {
    let mut client = connected_client(240, &[write_reply(0x07)]);
    assert_eq!(client.write_mb(0, &[1, 2]), Err(S7Error::WriteDataSizeMismatch));
    assert_eq!(client.transferred, 0);
}

#[test]
fn highest_byte_address_is_encodable() {
    let mut client = connected_client(240, &[read_reply(&[0x42])]);
    let mut buffer = [0u8; 1];
    assert_eq!(client.read_db(1, MAX_BYTE_ADDRESS, &mut buffer), Ok(1));
    assert_eq!(&job_frames(&client)[0][28..31], &[0xff, 0xff, 0xf8]);
}

#[test]
fn start_beyond_24_bits_is_rejected_without_io() {
    let mut client = connected_client(240, &[]);
    let mut buffer = [0u8; 1];
    assert_eq!(client.read_db(1, MAX_BYTE_ADDRESS + 1, &mut buffer), Err(S7Error::InvalidParams));
    assert!(job_frames(&client).is_empty());
}

#[test]
fn bit_and_timer_starts_beyond_24_bits_are_rejected_without_io() {
    let mut client = connected_client(240, &[]);
    assert_eq!(client.read_bit(S7_AREA_DB, 1, 0x20_0000, 0), Err(S7Error::InvalidParams));
    assert_eq!(client.write_bit(S7_AREA_DB, 1, 0x20_0000, 0, true), Err(S7Error::InvalidParams));
    assert_eq!(client.read_bit(S7_AREA_DB, 1, u32::MAX, 7), Err(S7Error::InvalidParams));

    let mut buffer = [0u8; 2];
    assert_eq!(
        client.read_area(S7_AREA_TM, 0, MAX_RAW_ADDRESS + 1, 1, S7_WL_TIMER, &mut buffer),
        Err(S7Error::InvalidParams)
    );
    assert_eq!(
        client.write_area(S7_AREA_DB, 1, MAX_RAW_ADDRESS + 1, 1, S7_WL_BIT, &[1]),
        Err(S7Error::InvalidParams)
    );
    assert!(job_frames(&client).is_empty());
}

#[test]
fn highest_bit_address_is_encodable() {
    let mut client = connected_client(240, &[read_reply(&[0x01])]);
    assert_eq!(client.read_bit(S7_AREA_DB, 1, MAX_RAW_ADDRESS >> 3, 7), Ok(true));
    assert_eq!(&job_frames(&client)[0][28..31], &[0xff, 0xff, 0xff]);
}

#[test]
fn blocks_running_past_24_bits_are_rejected_without_io() {
    let mut client = connected_client(240, &[]);
    let mut buffer = [0u8; 2];
    assert_eq!(client.read_db(1, MAX_BYTE_ADDRESS, &mut buffer), Err(S7Error::InvalidParams));
    assert_eq!(client.write_db(1, MAX_BYTE_ADDRESS, &buffer), Err(S7Error::InvalidParams));
    assert!(job_frames(&client).is_empty());
}

#[test]
fn overflowing_amount_is_rejected_without_io() {
    let mut client = connected_client(240, &[]);
    let mut buffer = [0u8; 4];
    assert_eq!(
        client.read_area(S7_AREA_DB, 1, 0, usize::MAX, S7_WL_DWORD, &mut buffer),
        Err(S7Error::InvalidParams)
    );
    assert!(job_frames(&client).is_empty());
}

#[test]
fn unknown_word_length_is_rejected_without_io() {
    let mut client = connected_client(240, &[]);
    let mut buffer = [0u8; 4];
    assert_eq!(client.read_area(S7_AREA_DB, 1, 0, 1, 0x77, &mut buffer), Err(S7Error::InvalidWordLength));
    assert_eq!(client.write_area(S7_AREA_DB, 1, 0, 1, 0x77, &buffer), Err(S7Error::InvalidWordLength));
    assert!(job_frames(&client).is_empty());
}

#[test]
fn small_buffer_is_rejected() {
    let mut client = connected_client(240, &[]);
    let mut buffer = [0u8; 3];
    assert_eq!(client.read_area(S7_AREA_DB, 1, 0, 1, S7_WL_DWORD, &mut buffer), Err(S7Error::BufferTooSmall));
    assert!(job_frames(&client).is_empty());
}

#[test]
fn bits_are_addressed_in_bits() {
    let mut client = connected_client(240, &[read_reply(&[0x01]), write_reply(0xff)]);
    assert_eq!(client.read_bit(S7_AREA_MK, 0, 10, 3), Ok(true));
    client.write_bit(S7_AREA_DB, 4, 71, 4, false).unwrap();

    let frames = job_frames(&client);
    assert_eq!(frames[0][22], 0x01);
    assert_eq!(&frames[0][28..31], &[0x00, 0x00, 83]);
    assert_eq!(frames[1][32], 0x03); // bit transport
    assert_eq!(&frames[1][33..35], &[0x00, 0x01]);
    assert_eq!(&frames[1][28..31], &[0x00, 0x02, 0x3c]); // 71 * 8 + 4
    assert_eq!(frames[1][35], 0x00);

    assert_eq!(client.read_bit(S7_AREA_MK, 0, 10, 8), Err(S7Error::InvalidParams));
}

#[test]
fn timers_are_raw_words() {
    let mut client = connected_client(240, &[read_reply(&[0x34, 0x12, 0x78, 0x56]), write_reply(0xff)]);
    let mut timers = [0u16; 2];
    assert_eq!(client.read_timers(5, &mut timers), Ok(4));
    assert_eq!(timers, [0x1234, 0x5678]);
    client.write_timers(5, &[0x0102]).unwrap();

    let frames = job_frames(&client);
    assert_eq!(frames[0][22], S7_WL_TIMER);
    assert_eq!(frames[0][27], 0x1d);
    assert_eq!(&frames[0][23..25], &[0x00, 0x02]);
    assert_eq!(&frames[0][28..31], &[0x00, 0x00, 0x05]);
    assert_eq!(frames[1][32], 0x09); // octet transport
    assert_eq!(&frames[1][35..], &[0x02, 0x01]);
}

#[test]
fn read_then_write_round_trips() {
    let content = [0x10, 0x20, 0x30, 0x40, 0x50, 0x60];
    let mut client = connected_client(240, &[read_reply(&content), write_reply(0xff)]);
    let mut buffer = [0u8; 6];
    client.read_area(S7_AREA_DB, 9, 4, 3, s7link::S7_WL_WORD, &mut buffer).unwrap();
    assert_eq!(client.write_area(S7_AREA_DB, 9, 4, 3, s7link::S7_WL_WORD, &buffer), Ok(6));

    let frames = job_frames(&client);
    assert_eq!(&frames[1][35..], &content);
    assert_eq!(&frames[0][23..31], &frames[1][23..31]);
}
