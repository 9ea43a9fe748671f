#![no_main]

use libfuzzer_sys::fuzz_target;
use regscope::process::split_command_line;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let (program, args) = split_command_line(s);

        // Both halves are slices of the trimmed input
        assert!(program.len() + args.len() <= s.len());
        assert!(s.contains(program));
        assert!(s.contains(args));
    }
});
