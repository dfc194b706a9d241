#![no_main]

use libfuzzer_sys::fuzz_target;
use protocol::{decode_client_message, decode_protocol_message, Limits};

fuzz_target!(|data: &[u8]| {
    let limits = Limits::for_testing();
    if let Ok(message) = decode_client_message(data, &limits) {
        for operation in &message.operations {
            let _ = operation.to_json();
        }
    }
    let _ = decode_protocol_message(data, &limits);
});
