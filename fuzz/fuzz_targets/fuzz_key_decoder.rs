#![no_main]

use keytap_core::Parser;
use keytap_tty::Utf8Decoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw terminal bytes through the full decoding path. Must never panic,
    // and every input character must produce at most one event.
    let mut decoder = Utf8Decoder::new();
    let mut text = decoder.decode(data);
    text.push_str(&decoder.finish());

    let mut parser = Parser::new();
    let events = parser.decode(&text);
    assert!(events.len() <= text.chars().count());
    assert!(!parser.has_pending());
});
