#![no_main]
use libfuzzer_sys::fuzz_target;
use simpletree::parser::parse_reader;
use simpletree::Document;

fuzz_target!(|data: &[u8]| {
    let mut doc = Document::new();
    // Raw bytes go through encoding detection first; neither stage may panic.
    if let Ok(Some(tree)) = parse_reader(&mut doc, data) {
        let _ = doc.iter(tree.root()).count();
    }
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = Document::new().fromstring(s);
    }
});
