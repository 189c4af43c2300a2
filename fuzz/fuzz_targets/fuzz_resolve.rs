// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wastewise::vision::parse_labels;
use wastewise::{resolve, resolve_ranked, Preset};

#[derive(Arbitrary, Debug)]
struct Input {
    disposal: bool,
    label: String,
    ranked: Vec<String>,
    reply: String,
}

fuzz_target!(|input: Input| {
    let preset = if input.disposal { Preset::Disposal } else { Preset::Materials };
    let table = preset.table();

    let category = resolve(&input.label, &table);
    assert!(table.contains(category));
    assert_eq!(resolve(&input.label, &table), category);

    // Unicode case mapping can change length ("ß" -> "SS"), so only ASCII
    // labels are expected to be case-stable.
    if input.label.is_ascii() {
        assert_eq!(resolve(&input.label.to_ascii_uppercase(), &table), category);
    }

    let ranked = resolve_ranked(input.ranked.as_slice(), &table);
    assert!(table.contains(ranked));
    if ranked == table.fallback() {
        assert!(input.ranked.iter().all(|l| resolve(l, &table) == table.fallback()));
    }

    for candidate in parse_labels(&input.reply, 5) {
        assert!(!candidate.label.is_empty());
        assert!((0.0..=1.0).contains(&candidate.score));
    }
});
