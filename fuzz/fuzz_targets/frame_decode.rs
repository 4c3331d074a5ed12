//! Arbitrary bytes must decode to a packet or an error, never a panic, and a
//! decoded packet must re-encode to a frame that decodes to the same packet.

#![no_main]

use definer_proto::frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(packet) = frame::decode(data) {
        if let Ok(encoded) = frame::encode(&packet) {
            assert_eq!(frame::decode(&encoded).ok(), Some(packet));
        }
    }
});
