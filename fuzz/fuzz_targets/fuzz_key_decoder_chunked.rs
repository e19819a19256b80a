#![no_main]

use arbitrary::Arbitrary;
use keytap_core::{KeyEvent, Parser};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    text: String,
    cuts: Vec<u8>,
}

fuzz_target!(|input: Input| {
    // Splitting the same text into arbitrary chunks must not change the
    // decoded events.
    let whole: Vec<KeyEvent> = Parser::new().decode(&input.text);

    let chars: Vec<char> = input.text.chars().collect();
    let mut parser = Parser::new();
    let mut chunked = Vec::new();
    let mut start = 0;
    for cut in input.cuts {
        let end = (start + usize::from(cut)).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        chunked.extend(parser.parse(&chunk));
        start = end;
    }
    let rest: String = chars[start..].iter().collect();
    chunked.extend(parser.parse(&rest));
    chunked.extend(parser.flush());

    assert_eq!(whole, chunked);
});
