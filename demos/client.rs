// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

use s7link::{S7Client, S7DataItem, S7Tag, S7_AREA_DB, S7_AREA_MK, S7_WL_BYTE, S7_WL_WORD};

fn dump(data: &[u8]) {
    for (i, chunk) in data.chunks(32).enumerate() {
        print!("{:04X}: ", i * 32);
        for byte in chunk {
            print!("{:02X} ", byte);
        }
        println!();
    }
}

fn main() {
    let host = std::env::args().nth(1).unwrap_or_else(|| "192.168.0.100".to_string());
    let db_number: u16 = 100; // Must exist into the PLC
    let mut client = S7Client::new();

    match client.connect_s7300(&host) {
        Ok(_) => {
            println!("Connected to {}", host);
            println!("PDU negotiated: {} byte", client.pdu_length());
            println!("Job time (ms) : {:.3}", client.last_time);
        }
        Err(e) => {
            eprintln!("Connection failed: {}", e);
            return;
        }
    }

    match client.get_cpu_info() {
        Ok(info) => {
            println!();
            println!("Module type   : {}", info.module_type_name);
            println!("Serial number : {}", info.serial_number);
            println!("AS name       : {}", info.as_name);
        }
        Err(e) => eprintln!("CPU info failed: {}", e),
    }

    match client.plc_get_status() {
        Ok(status) => println!("CPU status    : {:?}", status),
        Err(e) => eprintln!("Status failed: {}", e),
    }

    // Reads 462 byte from DB100
    println!();
    println!("Attempt to read 462 byte from DB100");
    let mut read_buffer = vec![0u8; 462];
    match client.read_db(db_number, 0, &mut read_buffer) {
        Ok(_) => {
            println!("Success!");
            println!("Job time (ms) : {:.3}", client.last_time);
            println!("Chunks        : {}", client.chunks);
            dump(&read_buffer);
        }
        Err(e) => eprintln!("Read failed: {} ({} byte valid)", e, client.transferred),
    }

    // Two variables, one telegram
    println!();
    println!("Attempt to read DB100.DBB0 and MW10 together");
    let tags = [
        S7Tag::new(S7_AREA_DB, db_number, 0, 1, S7_WL_BYTE),
        S7Tag::new(S7_AREA_MK, 0, 10, 1, S7_WL_WORD),
    ];
    let mut items: Vec<S7DataItem> = tags.into_iter().flatten().map(S7DataItem::new).collect();
    match client.read_multi_vars(&mut items) {
        Ok(_) => {
            for item in &items {
                match &item.result {
                    Ok(_) => dump(&item.data),
                    Err(e) => eprintln!("Item failed: {}", e),
                }
            }
        }
        Err(e) => eprintln!("Multi read failed: {}", e),
    }

    // Write a bit
    println!();
    println!("Attempt to write 'false' into DB100.DBX16.0");
    match client.write_bit(S7_AREA_DB, db_number, 16, 0, false) {
        Ok(_) => {
            println!("Success!");
            println!("Job time (ms) : {:.3}", client.last_time);
        }
        Err(e) => eprintln!("Write failed: {}", e),
    }

    client.disconnect();
    println!();
    println!("Disconnected");
}
