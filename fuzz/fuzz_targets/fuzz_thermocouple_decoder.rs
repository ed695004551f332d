//! Fuzz target: `max31855::decode`
//!
//! Feeds arbitrary 4-byte frames through the decoder and checks that the
//! result is either a classified fault or finite temperatures inside the
//! chip's field ranges.
//!
//! cargo fuzz run fuzz_thermocouple_decoder

#![no_main]

use latte_boiler::sensors::max31855::{Decoded, decode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|frame: [u8; 4]| {
    match decode(frame) {
        Decoded::Temperatures { thermocouple_c, internal_c } => {
            assert!(thermocouple_c.is_finite());
            assert!((-2048.0..=2047.75).contains(&thermocouple_c));
            assert!((-128.0..=127.9375).contains(&internal_c));
            // Fault bits must have been clear.
            assert_eq!(frame[3] & 0b111, 0);
        }
        Decoded::Fault(_) => {
            assert!(frame == [0; 4] || frame[3] & 0b111 != 0);
        }
    }
});
