#![no_main]
use libfuzzer_sys::fuzz_target;

use dns_types::protocol::types::Message;
use dns_types::render::{render, RenderFlags};

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = Message::from_octets(data) {
        for bits in 0..=u8::MAX {
            render(&message, RenderFlags::from_bits(bits));
        }
    }
});
