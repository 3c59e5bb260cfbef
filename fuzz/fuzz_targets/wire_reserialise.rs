#![no_main]
use libfuzzer_sys::fuzz_target;

use dns_types::protocol::types::Message;

fuzz_target!(|data: &[u8]| {
    let Ok(deserialised) = Message::from_octets(data) else {
        return;
    };
    // expanding compressed names in RDATA can push it past RDLENGTH's limit
    let Ok(serialised) = deserialised.to_octets() else {
        return;
    };

    let re_deserialised = Message::from_octets(&serialised).unwrap();
    assert_eq!(Ok(serialised), re_deserialised.to_octets());
});
