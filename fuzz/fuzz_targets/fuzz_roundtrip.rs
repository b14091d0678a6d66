#![no_main]
use libfuzzer_sys::fuzz_target;
use simpletree::serial::serialize;
use simpletree::Document;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let mut doc = Document::new();
        // Parse -> serialize -> parse must succeed and keep the element structure.
        if let Ok(Some(root)) = doc.fromstring(s) {
            let output = serialize(&doc, root);
            let mut copy = Document::new();
            let again = copy
                .fromstring(&output)
                .expect("serializer output must reparse")
                .expect("serializer output must have a root");
            let before: Vec<_> = doc.iter(root).map(|e| doc.tag(e)).collect();
            let after: Vec<_> = copy.iter(again).map(|e| copy.tag(e)).collect();
            assert_eq!(before, after, "round trip changed {output:?}");
        }
    }
});
