use dns_types::protocol::deserialise::ConsumableBuffer;
use dns_types::protocol::serialise::WritableBuffer;
use dns_types::protocol::types::test_util::*;
use dns_types::protocol::types::*;

#[test]
fn roundtrip_message() {
    for _ in 0..100 {
        let original = arbitrary_message();
        let deserialised = Message::from_octets(&original.to_octets().unwrap());

        assert_eq!(Ok(original), deserialised);
    }
}

#[test]
fn roundtrip_resourcerecord() {
    for _ in 0..100 {
        let original = arbitrary_resourcerecord();

        let mut buffer = WritableBuffer::default();
        original.serialise(&mut buffer).unwrap();
        let deserialised = ResourceRecord::deserialise(&mut ConsumableBuffer::new(&buffer.octets));

        assert_eq!(Ok(original), deserialised);
    }
}

#[test]
fn roundtrip_header_every_flags_word() {
    for flags in 0..=u16::MAX {
        let [flags1, flags2] = flags.to_be_bytes();
        let octets = [0xab, 0xcd, flags1, flags2, 0, 1, 0, 2, 0, 3, 0, 4];
        let original = Header::deserialise(&mut ConsumableBuffer::new(&octets)).unwrap();

        let mut buffer = WritableBuffer::default();
        original.serialise(&mut buffer);
        let deserialised = Header::deserialise(&mut ConsumableBuffer::new(&buffer.octets));

        assert_eq!(Ok(original), deserialised, "flags word {flags:#06x}");
    }
}
