#![no_main]

use libfuzzer_sys::fuzz_target;
use recordtrail_diff::{line_stats, unified_diff};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let (old, new) = text.split_once('\0').unwrap_or((&text, ""));

    let stats = line_stats(old, new);
    assert!(stats.insertions <= new.lines().count() + old.lines().count());
    let _ = std::hint::black_box(unified_diff("fuzz.yaml", old, new));
});
