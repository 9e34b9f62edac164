//! Property tests for the invariants the rest of the pipeline leans on.

use proptest::prelude::*;

use redactyl_core::baseline::Baseline;
use redactyl_core::cache::fast_hash;
use redactyl_core::finding::{Finding, Severity, severity_for_confidence};
use redactyl_core::vpath::VirtualPath;

fn segment_strategy() -> impl Strategy<Value = String> {
    // Segments never contain the "::" separator; single colons are fine.
    "[a-zA-Z0-9._/-]{1,24}(:[a-zA-Z0-9]{1,12})?"
}

fn finding_strategy() -> impl Strategy<Value = Finding> {
    (
        "[a-z0-9./]{1,20}",
        "[a-z]{2,8}/[a-z-]{2,12}",
        "[ -~]{1,32}",
        0.0f64..=1.0f64,
    )
        .prop_map(|(path, detector, matched, confidence)| Finding {
            path,
            line: 1,
            column: 0,
            matched,
            secret: None,
            detector,
            severity: severity_for_confidence(confidence),
            confidence,
            context: None,
            metadata: std::collections::BTreeMap::new(),
        })
}

proptest! {
    #[test]
    fn virtual_path_build_of_parse_is_identity(segments in prop::collection::vec(segment_strategy(), 1..5)) {
        let joined = segments.join("::");
        let parsed = VirtualPath::parse(&joined);

        prop_assert_eq!(parsed.depth(), segments.len());
        prop_assert_eq!(parsed.to_string(), joined);
    }

    #[test]
    fn fast_hash_is_always_sixteen_hex(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let digest = fast_hash(&bytes);
        prop_assert_eq!(digest.len(), 16);
        prop_assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn fast_hash_is_stable(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(fast_hash(&bytes), fast_hash(&bytes));
    }

    #[test]
    fn severity_mapping_is_total_and_ordered(confidence in 0.0f64..=1.0f64) {
        let severity = severity_for_confidence(confidence);
        if confidence >= 0.9 {
            prop_assert_eq!(severity, Severity::High);
        } else if confidence >= 0.7 {
            prop_assert_eq!(severity, Severity::Medium);
        } else {
            prop_assert_eq!(severity, Severity::Low);
        }
    }

    #[test]
    fn baseline_of_findings_filters_them_all(findings in prop::collection::vec(finding_strategy(), 0..12)) {
        let baseline = Baseline::from_findings(&findings);
        prop_assert!(baseline.filter_new(findings).is_empty());
    }

    #[test]
    fn findings_json_round_trips(findings in prop::collection::vec(finding_strategy(), 0..8)) {
        let json = serde_json::to_string(&findings).unwrap();
        let back: Vec<Finding> = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, findings);
    }
}
