#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(data) = std::str::from_utf8(data) {
        let mut parser = fluxline::LineProtocolParser::new(data);
        while parser.has_next() {
            let _ = parser.next_point();
        }
    }
});
