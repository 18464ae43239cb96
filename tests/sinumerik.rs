// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

mod common;

use common::*;
use s7link::sinumerik::{NCK_AREA_A, NCK_AREA_C, NCK_WL_DOUBLE, NCK_WL_STRING};
use s7link::{
    ClientConfig, DrvDataItem, DrvTag, NckCodec, NckDataItem, NckTag, S7Client, S7Codec, S7Error,
    WireCodec, S7_WL_REAL,
};

#[test]
fn nck_connection_uses_slot_3() {
    let script = [connection_confirm(), negotiation_reply(240)];
    let mut client = S7Client::with_transport(ScriptedTransport::with_replies(&script), ClientConfig::default());
    client.nck_connect_to("10.0.0.5", 0).unwrap();
    assert_eq!(&client.transport().sent[0][20..22], &[0x01, 0x03]);
}

#[test]
fn nck_rows_are_little_endian() {
    let mut data = vec![0u8; 16];
    NckCodec::set_lreal_at(&mut data, 0, 12.5);
    NckCodec::set_lreal_at(&mut data, 8, -3.25);
    let mut client = connected_client(240, &[read_reply(&data)]);

    let mut buffer = [0u8; 16];
    let read = client
        .read_nck_area(NCK_AREA_A, 1, 0x74, 2, 1, 2, NCK_WL_DOUBLE, &mut buffer)
        .unwrap();
    assert_eq!(read, 16);
    assert_eq!(NckCodec::get_lreal_at(&buffer, 0), 12.5);
    assert_eq!(NckCodec::get_lreal_at(&buffer, 8), -3.25);

    let sent = &job_frames(&client)[0];
    assert_eq!(sent.len(), 29);
    assert_eq!(sent[21], 0x82);
    assert_eq!(sent[22], 0x31);
    assert_eq!(&sent[23..25], &[0x00, 0x02]);
    assert_eq!(&sent[25..27], &[0x00, 0x01]);
    assert_eq!(sent[27], 0x74);
    assert_eq!(sent[28], 2);
}

#[test]
fn nck_rows_are_split_by_pdu() {
    // 222 bytes per reply hold 27 doubles
    let replies = [read_reply(&[0u8; 216]), read_reply(&[0u8; 24])];
    let mut client = connected_client(240, &replies);
    let mut buffer = vec![0u8; 30 * 8];

    assert_eq!(client.read_nck_area(NCK_AREA_C, 1, 0x10, 5, 1, 30, NCK_WL_DOUBLE, &mut buffer), Ok(240));
    let frames = job_frames(&client);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0][28], 27);
    assert_eq!(frames[1][28], 3);
    assert_eq!(&frames[1][25..27], &[0x00, 28]);
}

#[test]
fn nck_unknown_word_length() {
    let mut client = connected_client(240, &[]);
    let mut buffer = [0u8; 8];
    assert_eq!(
        client.read_nck_area(NCK_AREA_C, 1, 0x10, 5, 1, 1, S7_WL_REAL, &mut buffer),
        Err(S7Error::InvalidWordLength)
    );
    assert!(job_frames(&client).is_empty());
}

#[test]
fn drive_parameters_are_big_endian() {
    let mut data = [0u8; 4];
    S7Codec::set_real_at(&mut data, 0, 1500.0);
    let mut client = connected_client(240, &[read_reply(&data)]);

    let mut buffer = [0u8; 4];
    assert_eq!(client.read_drv_area(2, 1082, 0, 1, S7_WL_REAL, &mut buffer), Ok(4));
    assert_eq!(S7Codec::get_real_at(&buffer, 0), 1500.0);

    let sent = &job_frames(&client)[0];
    assert_eq!(sent.len(), 31);
    assert_eq!(sent[21], 0xa2);
    assert_eq!(sent[22], S7_WL_REAL);
    assert_eq!(&sent[23..25], &[0x00, 0x01]);
    assert_eq!(&sent[25..27], &[0x00, 0x02]);
    assert_eq!(&sent[27..29], &1082u16.to_be_bytes());
}

#[test]
fn nck_multi_read() {
    let mut name = [0u8; 16];
    NckCodec::set_string_at(&mut name, 0, "MPF_MAIN");
    let mut value = [0u8; 8];
    NckCodec::set_lreal_at(&mut value, 0, 99.5);

    let mut data = vec![0xff, 0x09, 0x00, 0x10];
    data.extend_from_slice(&name);
    data.extend_from_slice(&[0xff, 0x09, 0x00, 0x08]);
    data.extend_from_slice(&value);
    let mut client = connected_client(240, &[ack_data(0, &[0x04, 0x02], &data)]);

    let mut items = vec![
        NckDataItem::new(NckTag::new(NCK_AREA_C, 1, 0x7f, 3, 1, 1, NCK_WL_STRING).unwrap()),
        NckDataItem::new(NckTag::new(NCK_AREA_A, 1, 0x74, 2, 1, 1, NCK_WL_DOUBLE).unwrap()),
    ];
    client.read_multi_vars(&mut items).unwrap();
    assert_eq!(NckCodec::get_string_at(&items[0].data, 0), "MPF_MAIN");
    assert_eq!(NckCodec::get_lreal_at(&items[1].data, 0), 99.5);

    let sent = &job_frames(&client)[0];
    assert_eq!(sent.len(), 19 + 2 * 10);
    assert_eq!(&sent[13..15], &[0x00, 22]);
}

#[test]
fn drive_multi_write() {
    let mut client = connected_client(240, &[ack_data(0, &[0x05, 0x01], &[0xff])]);
    let mut value = vec![0u8; 4];
    S7Codec::set_real_at(&mut value, 0, 42.0);
    let mut items = vec![DrvDataItem::with_data(DrvTag::new(2, 1082, 0, 1, S7_WL_REAL).unwrap(), value)];

    assert_eq!(client.write_multi_vars(&mut items), Ok(4));
    assert_eq!(items[0].result, Ok(()));

    let sent = &job_frames(&client)[0];
    // Real values declare their length in bytes
    assert_eq!(&sent[19 + 12..19 + 16], &[0x00, 0x07, 0x00, 0x04]);
}
