// Properties of the normalization pipeline.

use once_cell::sync::Lazy;
use proptest::prelude::*;
use regex::Regex;
use tapsnap::normalize::{RUNTIME_BANNER_PLACEHOLDER, RUNTIME_VERSION_PLACEHOLDER};
use tapsnap::{BuiltinRule, NormalizationRule, Normalizer};

/// Fragments that exercise every standard rule and their boundaries.
fn tap_text() -> impl Strategy<Value = String> {
    let fragment = prop::sample::select(vec![
        "ok 1 - passes",
        "not ok 2 - fails",
        "    ok 3 - nested",
        " # time=0.125s",
        "# time=12ms",
        "# time=header",
        " then more",
        "s",
        "#",
        " time=",
        "node:internal/test_runner/harness",
        ":12",
        ":7:3",
        "# node v22.3.0",
        "1.2",
        ".4",
        "  ---",
        "1..3",
        " ",
        "\t",
        "\r",
        "\n",
        "\r\n",
    ]);
    prop::collection::vec(fragment, 0..40).prop_map(|parts| parts.concat())
}

static TRAILING_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"# time=[\d.]+m?s\r*$").unwrap());

fn without_filter() -> Normalizer {
    Normalizer::new()
        .with_rule(NormalizationRule::builtin(BuiltinRule::TimeAnnotation))
        .with_rule(NormalizationRule::builtin(BuiltinRule::StackLineRefs))
        .with_rule(NormalizationRule::builtin(BuiltinRule::RuntimeBanner))
}

proptest! {
    #[test]
    fn standard_normalization_is_idempotent(text in tap_text()) {
        let n = Normalizer::standard();
        let once = n.normalize(&text);
        prop_assert_eq!(n.normalize(&once), once);
    }

    #[test]
    fn unfiltered_normalization_is_idempotent(text in tap_text()) {
        let n = without_filter();
        let once = n.normalize(&text);
        prop_assert_eq!(n.normalize(&once), once);
    }

    #[test]
    fn no_trailing_time_annotation_survives(text in tap_text()) {
        for out in [Normalizer::standard().normalize(&text), without_filter().normalize(&text)] {
            for line in out.lines() {
                prop_assert!(!TRAILING_TIME.is_match(line), "{:?}", line);
            }
        }
    }

    #[test]
    fn standard_output_is_only_result_lines(text in tap_text()) {
        let out = Normalizer::standard().normalize(&text);
        for line in out.lines() {
            prop_assert!(tapsnap::normalize::is_result_line(line), "{:?}", line);
        }
        prop_assert!(out.is_empty() || out.ends_with('\n'));
    }
}

#[test]
fn literal_runtime_version_becomes_placeholder() {
    let n = Normalizer::new().with_rule(NormalizationRule::runtime_version("v22.3.0").unwrap());
    let out = n.normalize("# Subtest: runs on v22.3.0\nok 1 - reports v22.3.0 (v22.3.0)\n");
    assert!(!out.contains("v22.3.0"));
    assert_eq!(
        out,
        format!(
            "# Subtest: runs on {p}\nok 1 - reports {p} ({p})\n",
            p = RUNTIME_VERSION_PLACEHOLDER
        )
    );
}

#[test]
fn banner_line_becomes_placeholder() {
    let out = without_filter().normalize("TAP version 13\n# node v20.11.1 (linux x64)\nok 1 - a\n");
    assert_eq!(out, format!("TAP version 13\n{RUNTIME_BANNER_PLACEHOLDER}\nok 1 - a\n"));
}

#[test]
fn time_text_in_description_survives() {
    assert_eq!(
        Normalizer::standard().normalize("ok 1 - parses # time=header correctly\n"),
        "ok 1 - parses # time=header correctly\n"
    );
}

#[test]
fn distilled_time_example() {
    assert_eq!(
        Normalizer::standard().normalize("ok 1 - foo # time=0.12s\nnot ok 2 - bar\n"),
        "ok 1 - foo\nnot ok 2 - bar\n"
    );
}
