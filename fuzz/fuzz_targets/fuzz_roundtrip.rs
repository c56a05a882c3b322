#![no_main]
use fluxline::LineProtocolParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(data) = std::str::from_utf8(data) {
        for point in LineProtocolParser::new(data) {
            let line = point.to_string();
            let mut reparsed = LineProtocolParser::new(&line);
            assert!(reparsed.has_next(), "canonical line failed to decode: {:?}", line);
            assert_eq!(reparsed.next_point().unwrap(), point);
            assert!(!reparsed.has_next());
        }
    }
});
