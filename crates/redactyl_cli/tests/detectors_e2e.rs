//! The detectors listing through the binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn redactyl() -> Command {
    Command::cargo_bin("redactyl").expect("binary builds")
}

#[test]
fn builtin_engine_lists_its_rule_ids() {
    redactyl()
        .args(["detectors", "--engine", "builtin"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("github-pat"))
        .stdout(predicate::str::contains("aws-access-token"))
        .stdout(predicate::str::contains("generic-api-key"));
}

#[test]
fn json_listing_is_a_sorted_array() {
    let output = redactyl()
        .args(["detectors", "--engine", "builtin", "--json"])
        .output()
        .unwrap();

    let ids: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(!ids.is_empty());

    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}
