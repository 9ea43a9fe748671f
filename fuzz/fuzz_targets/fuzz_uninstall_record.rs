#![no_main]

use libfuzzer_sys::fuzz_target;
use regscope::clock::FixedClock;
use regscope::registry::RecordParser;
use regscope::store::RegistryValue;
use std::collections::HashMap;

const FIELDS: [&str; 6] = [
    "DisplayName",
    "InstallDate",
    "EstimatedSize",
    "EstimateSize",
    "UninstallString",
    "Publisher",
];

fuzz_target!(|data: &[u8]| {
    // Each chunk becomes one value: first byte picks the field and the kind
    let parser = RecordParser::with_clock(FixedClock(Default::default()));
    let mut values = HashMap::new();

    for chunk in data.chunks(9) {
        let Some((&selector, payload)) = chunk.split_first() else {
            continue;
        };
        let name = FIELDS[usize::from(selector) % FIELDS.len()];
        let value = match selector % 3 {
            0 => RegistryValue::Text(String::from_utf8_lossy(payload).into_owned()),
            1 => {
                let mut bytes = [0u8; 8];
                bytes[..payload.len()].copy_from_slice(payload);
                RegistryValue::Numeric(i64::from_le_bytes(bytes))
            }
            _ => RegistryValue::Other(payload.to_vec()),
        };
        values.insert(name.to_string(), value);
    }

    let _record = parser.parse(&values);
});
