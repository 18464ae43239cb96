// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

#![allow(dead_code)]

use std::collections::VecDeque;

use s7link::{ClientConfig, MessageTransport, S7Client, S7Error};

/// Transport that serves pre-recorded reply bytes and records every frame sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub sent: Vec<Vec<u8>>,
    incoming: VecDeque<u8>,
    connected: bool,
    pub refuse_connect: bool,
}

impl ScriptedTransport {
    pub fn with_replies(replies: &[Vec<u8>]) -> Self {
        let mut transport = ScriptedTransport::default();
        for reply in replies {
            transport.incoming.extend(reply.iter().copied());
        }
        transport
    }

    /// Bytes still waiting to be received.
    pub fn pending(&self) -> usize {
        self.incoming.len()
    }
}

impl MessageTransport for ScriptedTransport {
    fn connect(&mut self, _host: &str, _port: u16, _timeout_ms: u64) -> Result<(), S7Error> {
        if self.refuse_connect {
            return Err(S7Error::ConnectionFailed);
        }
        self.connected = true;
        Ok(())
    }

    fn send(&mut self, buffer: &[u8]) -> Result<(), S7Error> {
        self.sent.push(buffer.to_vec());
        Ok(())
    }

    fn receive(&mut self, buffer: &mut [u8], offset: usize, len: usize) -> Result<(), S7Error> {
        if self.incoming.len() < len {
            return Err(S7Error::ReceiveTimeout);
        }
        for (dst, src) in buffer[offset..offset + len].iter_mut().zip(self.incoming.drain(..len)) {
            *dst = src;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Wraps an S7 PDU (protocol ID on) into TPKT + COTP data headers.
pub fn iso_frame(pdu: &[u8]) -> Vec<u8> {
    let total = (pdu.len() + 7) as u16;
    let mut frame = vec![0x03, 0x00];
    frame.extend_from_slice(&total.to_be_bytes());
    frame.extend_from_slice(&[0x02, 0xf0, 0x80]);
    frame.extend_from_slice(pdu);
    frame
}

/// COTP connection confirm.
pub fn connection_confirm() -> Vec<u8> {
    vec![
        0x03, 0x00, 0x00, 0x16, 0x11, 0xd0, 0x00, 0x01, 0x00, 0x01, 0x00, 0xc0, 0x01, 0x0a, 0xc1,
        0x02, 0x01, 0x00, 0xc2, 0x02, 0x01, 0x02,
    ]
}

/// Ack data reply: S7 header with error class/code, then parameters and data.
pub fn ack_data(error: u16, params: &[u8], data: &[u8]) -> Vec<u8> {
    let mut pdu = vec![0x32, 0x03, 0x00, 0x00, 0x00, 0x01];
    pdu.extend_from_slice(&(params.len() as u16).to_be_bytes());
    pdu.extend_from_slice(&(data.len() as u16).to_be_bytes());
    pdu.extend_from_slice(&error.to_be_bytes());
    pdu.extend_from_slice(params);
    pdu.extend_from_slice(data);
    iso_frame(&pdu)
}

/// PDU negotiation reply (27 bytes).
pub fn negotiation_reply(pdu_length: u16) -> Vec<u8> {
    let mut params = vec![0xf0, 0x00, 0x00, 0x01, 0x00, 0x01];
    params.extend_from_slice(&pdu_length.to_be_bytes());
    ack_data(0, &params, &[])
}

/// Single item read reply carrying `data` (byte transport, bit length).
pub fn read_reply(data: &[u8]) -> Vec<u8> {
    let mut item = vec![0xff, 0x04];
    item.extend_from_slice(&((data.len() * 8) as u16).to_be_bytes());
    item.extend_from_slice(data);
    ack_data(0, &[0x04, 0x01], &item)
}

/// Single item read reply whose item failed with `code`.
pub fn read_item_error(code: u8) -> Vec<u8> {
    ack_data(0, &[0x04, 0x01], &[code, 0x00, 0x00, 0x00])
}

/// Single item write reply (22 bytes).
pub fn write_reply(code: u8) -> Vec<u8> {
    ack_data(0, &[0x05, 0x01], &[code])
}

/// ### Userdata reply
///
/// `seq_in` lands at 24, `last` drives the "last data unit" flag at 26,
/// `error` at 27, the return code 0xFF at 29 and `declared` at 31.
/// `data` starts at 33.
pub fn userdata(seq_in: u8, last: bool, error: u16, declared: u16, data: &[u8]) -> Vec<u8> {
    let mut pdu = vec![0x32, 0x07, 0x00, 0x00, 0x00, 0x01, 0x00, 0x0c];
    pdu.extend_from_slice(&((data.len() + 4) as u16).to_be_bytes());
    pdu.extend_from_slice(&[0x00, 0x01, 0x12, 0x08, 0x12, 0x84, 0x01, seq_in, 0x00]);
    pdu.push(if last { 0x00 } else { 0x01 });
    pdu.extend_from_slice(&error.to_be_bytes());
    pdu.extend_from_slice(&[0xff, 0x09]);
    pdu.extend_from_slice(&declared.to_be_bytes());
    pdu.extend_from_slice(data);
    iso_frame(&pdu)
}

/// Single slice userdata reply declaring exactly `data`.
pub fn userdata_ok(data: &[u8]) -> Vec<u8> {
    userdata(0, true, 0, data.len() as u16, data)
}

/// Client connected to rack 0 slot 2 with `pdu_length` negotiated, `replies` queued behind the handshake.
pub fn connected_client(pdu_length: u16, replies: &[Vec<u8>]) -> S7Client<ScriptedTransport> {
    let mut script = vec![connection_confirm(), negotiation_reply(pdu_length)];
    script.extend_from_slice(replies);
    let mut client = S7Client::with_transport(ScriptedTransport::with_replies(&script), ClientConfig::default());
    client.connect_to("10.0.0.1", 0, 2).expect("handshake");
    client
}

/// Frames sent after the connection handshake.
pub fn job_frames(client: &S7Client<ScriptedTransport>) -> &[Vec<u8>] {
    &client.transport().sent[2..]
}
