#![no_main]

use libfuzzer_sys::fuzz_target;
use recordtrail_diff::StructuredDiff;

fuzz_target!(|data: &[u8]| {
    // Split the input into two snapshots at the first NUL byte
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (old, new) = text.split_once('\0').unwrap_or((text, ""));

    for record_list in [false, true] {
        let result = StructuredDiff::compare_text(old, new, record_list);
        assert_eq!(result.has_changes, !result.changes.is_empty());
    }
});
