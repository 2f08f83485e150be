//! Property-based tests for the pure building blocks.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use gitweave::diff::{limit_line_len, StrCircBuf};
use gitweave::diff::HunkHeader;
use gitweave::hash::{AggregationType, HashType, Hasher};
use gitweave::refs::{walk_entries, HandleAll, Paginated, ReferenceField, WalkEntry};

fn hasher() -> Hasher {
    Hasher::new(HashType::Sha256, AggregationType::Xor)
}

fn elements(items: &[Vec<u8>]) -> Vec<Result<Vec<u8>, String>> {
    items.iter().cloned().map(Ok).collect()
}

fn entry(name: &str) -> WalkEntry {
    let mut entry = WalkEntry::default();
    entry.insert(ReferenceField::Name, name.to_string());
    entry
}

/// Names handled when walking `total` entries for one page.
fn page_of(total: usize, page: usize, size: usize) -> Vec<String> {
    let source: Vec<Result<WalkEntry, String>> =
        (0..total).map(|i| Ok(entry(&format!("r{i:03}")))).collect();
    let mut pager = Paginated::new(HandleAll, page, size).unwrap();
    let distance = pager.max_walk_distance();
    let mut out = Vec::new();
    walk_entries(source, &mut pager, distance, |e| {
        out.push(e.get(ReferenceField::Name).unwrap_or_default().to_string());
        Ok::<_, String>(())
    })
    .unwrap();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // =========================================================================
    // Repository Hasher
    // =========================================================================

    #[test]
    fn hash_ignores_order(mut items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..12)) {
        let forward = hasher().hash(elements(&items)).unwrap();
        items.reverse();
        let backward = hasher().hash(elements(&items)).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn hashing_twice_cancels(
        base in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..6),
        extra in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let mut doubled = base.clone();
        doubled.push(extra.clone());
        doubled.push(extra);
        prop_assert_eq!(
            hasher().hash(elements(&base)).unwrap(),
            hasher().hash(elements(&doubled)).unwrap()
        );
    }

    #[test]
    fn append_equals_full_hash(
        first in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..6),
        second in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..6),
    ) {
        let prior = hasher().hash(elements(&first)).unwrap();
        let appended = hasher().append(&prior, elements(&second)).unwrap();

        let mut all = first;
        all.extend(second);
        prop_assert_eq!(appended, hasher().hash(elements(&all)).unwrap());
    }

    // =========================================================================
    // Diff Analysis
    // =========================================================================

    #[test]
    fn circbuf_keeps_last_lines(capacity in 0usize..8, count in 0usize..20) {
        let mut buf = StrCircBuf::new(capacity);
        for i in 0..count {
            buf.push(i.to_string());
        }
        let kept: Vec<String> = (count.saturating_sub(capacity)..count)
            .map(|i| i.to_string())
            .collect();
        prop_assert_eq!(buf.size(), kept.len());
        prop_assert_eq!(buf.lines(), kept);
    }

    #[test]
    fn hunk_header_display_parses_back(
        old_line in 1usize..10_000,
        old_span in 0usize..500,
        new_line in 1usize..10_000,
        new_span in 0usize..500,
        text in "[a-z_ ]{0,20}",
    ) {
        let header = HunkHeader { old_line, old_span, new_line, new_span, text: text.trim().to_string() };
        prop_assert_eq!(HunkHeader::parse(&header.to_string()), Some(header));
    }

    #[test]
    fn limited_lines_stay_within_bound(lines in prop::collection::vec(".{0,40}", 0..8), max in 1usize..30) {
        let mut limited = lines.clone();
        limit_line_len(&mut limited, max);
        for (before, after) in lines.iter().zip(&limited) {
            prop_assert!(after.len() <= max);
            prop_assert!(before.starts_with(after.as_str()));
        }
    }

    // =========================================================================
    // Reference Pagination
    // =========================================================================

    #[test]
    fn pages_partition_the_walk(total in 0usize..40, size in 1usize..10) {
        let mut seen = Vec::new();
        let pages = total / size + 2;
        for page in 1..=pages {
            let names = page_of(total, page, size);
            prop_assert!(names.len() <= size);
            seen.extend(names);
        }
        let all: Vec<String> = (0..total).map(|i| format!("r{i:03}")).collect();
        prop_assert_eq!(seen, all);
    }
}
