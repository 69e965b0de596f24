#![no_main]

use gammakeeper::config::AppConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Settings files are user-editable; parsing must never panic
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = serde_json::from_str::<AppConfig>(s) {
            // Whatever loaded must write back out
            let _ = serde_json::to_string_pretty(&config);
        }
    }
});
