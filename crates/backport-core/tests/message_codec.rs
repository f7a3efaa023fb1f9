//! Codec, resolver and synthesizer behaviour through the public API.

use backport_core::fakes::MemoryHistory;
use backport_core::{
    extract_reference, parse, resolve, serialize, synthesize, BackportReference, CommitHash,
    ResolveError,
};

const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

fn hash() -> CommitHash {
    CommitHash::parse(HASH).unwrap()
}

#[test]
fn status_text_covers_issue_and_summary_combinations() {
    let cases = [
        ("JDK-1: One", "issue"),
        ("JDK-1: One\n\nSome summary", "issue and summary"),
        ("JDK-1: One\nJDK-2: Two", "issues"),
        ("JDK-1: One\nJDK-2: Two\nJDK-3: Three\n\nSome summary", "issues and summary"),
    ];
    for (text, expected) in cases {
        let original = parse(text).unwrap();
        let synthesis = synthesize(&original, &hash(), &[]);
        assert_eq!(synthesis.status, expected, "for {text:?}");
        assert_eq!(synthesis.title.as_deref(), Some("JDK-1: One"));
    }
}

#[test]
fn synthesized_reviewers_are_the_approver_snapshot() {
    let original = parse("JDK-1: One\n\nReviewed-by: alice, dave").unwrap();
    let approvers = vec!["carol".to_string(), "bob".to_string(), "carol".to_string()];
    let synthesis = synthesize(&original, &hash(), &approvers);
    assert_eq!(synthesis.message.reviewers, vec!["carol", "bob"]);
    assert_eq!(
        serialize(&synthesis.message),
        format!("JDK-1: One\n\nReviewed-by: carol, bob\nBackport-of: {HASH}")
    );
}

#[test]
fn normalization_is_stable() {
    let messy = "\n\nJDK-7: Trim me   \n\n\n\nBody line\n\nReviewed-by: a,b\n\n";
    let once = serialize(&parse(messy).unwrap());
    let twice = serialize(&parse(&once).unwrap());
    assert_eq!(once, twice);
    assert_eq!(parse(&once).unwrap(), parse(messy).unwrap());
}

#[test]
fn only_exact_lowercase_hashes_are_references() {
    assert!(extract_reference(&format!("Backport {HASH}")).is_some());
    assert!(extract_reference(&format!("  Backport   {HASH}  ")).is_some());
    for title in [
        format!("Backport {}", HASH.to_uppercase()),
        format!("Backport {}", &HASH[..39]),
        format!("Backport {HASH}0"),
        format!("Backport {HASH} please"),
        format!("backport {HASH}"),
        "Backport".to_string(),
    ] {
        assert!(extract_reference(&title).is_none(), "{title:?} matched");
    }
}

#[tokio::test]
async fn absent_reference_is_not_found_every_time() {
    let history = MemoryHistory::new();
    history.commit("master", "JDK-1: One");
    let reference = BackportReference::new(hash());
    for _ in 0..3 {
        let err = resolve(&reference, &history).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { ref reference } if reference.as_str() == HASH));
    }
}

#[tokio::test]
async fn commits_on_any_branch_resolve() {
    let history = MemoryHistory::new();
    let on_release = history.commit("release/11", "JDK-4: Old branch");
    let commit = resolve(&BackportReference::new(on_release.clone()), &history)
        .await
        .unwrap();
    assert_eq!(commit.hash, on_release);
    assert_eq!(commit.message(), "JDK-4: Old branch");
}
