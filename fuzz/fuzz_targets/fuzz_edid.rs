#![no_main]

use gammakeeper::identity::edid::{decode_fixed_text, parse_edid};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Registry EDID blobs come from monitor firmware and may be malformed
    let _ = parse_edid(data);
    let _ = decode_fixed_text(data);
});
