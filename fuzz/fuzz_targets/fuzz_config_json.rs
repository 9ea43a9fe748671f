#![no_main]

use libfuzzer_sys::fuzz_target;
use regscope::config::RegScopeConfig;

fuzz_target!(|data: &[u8]| {
    // Parsing may fail, it must not panic
    if let Ok(s) = std::str::from_utf8(data) {
        let _result: Result<RegScopeConfig, _> = serde_json::from_str(s);
    }
});
