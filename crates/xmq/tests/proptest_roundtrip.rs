/*
 * proptest_roundtrip.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Property-based round-trip tests: a generated tree rendered to xmq and
 * parsed back must be structurally identical to the tree we started with,
 * in both the indented and the compact layout.
 */

use proptest::prelude::*;
use proptest::test_runner::FileFailurePersistence;
use xmq::{Document, ParseOptions, RenderOptions, parse, render};

use generators::*;

fn check_round_trip(doc: &Document, options: &RenderOptions) -> Result<(), TestCaseError> {
    let text = render(doc, options);
    let back = parse(&text, "generated.xmq", &ParseOptions::default()).map_err(|err| {
        TestCaseError::fail(format!(
            "rendered output does not parse:\n{}\n=== OUTPUT ===\n{}",
            err.render_diagnostic(),
            text
        ))
    })?;
    prop_assert!(
        back.same_shape(doc),
        "tree changed\n=== OUTPUT ===\n{}\n=== REPARSED ===\n{}",
        text,
        render(&back, options)
    );
    Ok(())
}

/// Failing cases are saved next to this file, as
/// `proptest_roundtrip.regressions`, and replayed first on later runs.
fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        failure_persistence: Some(Box::new(FileFailurePersistence::WithSource("regressions"))),
        ..ProptestConfig::default()
    }
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn test_indented_render_round_trips(doc in document()) {
        check_round_trip(&doc, &RenderOptions::default())?;
    }

    #[test]
    fn test_compact_render_round_trips(doc in document()) {
        check_round_trip(&doc, &RenderOptions::new().with_compact(true))?;
    }

    #[test]
    fn test_narrow_indent_round_trips(doc in document()) {
        check_round_trip(&doc, &RenderOptions::new().with_indent_width(1))?;
    }

    #[test]
    fn test_render_is_stable(doc in document()) {
        let options = RenderOptions::default();
        let once = render(&doc, &options);
        let reparsed = parse(&once, "generated.xmq", &ParseOptions::default())
            .map_err(|err| TestCaseError::fail(err.render_diagnostic()))?;
        prop_assert_eq!(render(&reparsed, &options), once);
    }
}
