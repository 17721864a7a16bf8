//! Identity key properties.

use proptest::prelude::*;
use veilroom_core::{IdentityKey, identity::normalize};

fn spaced() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    prop::collection::vec("[a-z<>]{1,6}", 0..6).prop_flat_map(|words| {
        let n = words.len() + 1;
        (Just(words), prop::collection::vec("[ \t\n]{0,3}", n..=n))
    })
}

fn join(words: &[String], gaps: &[String]) -> String {
    let mut out = gaps[0].clone();
    for (word, gap) in words.iter().zip(&gaps[1..]) {
        if !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        out.push_str(word);
        out.push_str(gap);
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn fingerprint_ignores_whitespace_layout((words, gaps) in spaced()) {
        let canonical = words.join(" ");
        let messy = join(&words, &gaps);

        prop_assert_eq!(normalize(&messy), canonical.clone());
        prop_assert_eq!(
            IdentityKey::fingerprint("alice", &messy),
            IdentityKey::fingerprint("alice", &canonical)
        );
    }

    #[test]
    fn normalize_is_idempotent(text in "\\PC{0,40}") {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once.clone());
    }

    #[test]
    fn keys_are_total(user in "\\PC{0,20}", content in "\\PC{0,40}", ts in "\\PC{0,30}") {
        prop_assert!(IdentityKey::fingerprint(&user, &content).as_str().starts_with("fp:"));
        prop_assert!(IdentityKey::plaintext(&user, &content, &ts).as_str().starts_with("id:"));
    }
}
