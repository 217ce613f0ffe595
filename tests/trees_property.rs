#[macro_use]
extern crate proptest;

use proptest::prelude::{Just, Strategy, any, prop};

use parseboard::trees::{DepEntry, DepSentence, TreeError, from_sentence};

fn entry(fragment: &str, head: u32, label: &str) -> DepEntry {
    DepEntry {
        token: fragment.to_string(),
        replacement: String::new(),
        lemma: String::new(),
        pos_tag: String::new(),
        ner_tag: String::new(),
        fragment: fragment.to_string(),
        lexlabel: String::new(),
        typ: String::new(),
        head,
        label: label.to_string(),
        aligned: true,
        range: None,
    }
}

/// Generate a sentence whose heads form a valid tree: the entries are
/// attached in a random order, each under one of the entries attached
/// before it, guaranteeing acyclicity and reachability from the root.
fn tree_sentence_strategy() -> impl Strategy<Value = DepSentence> {
    (1usize..10)
        .prop_flat_map(|n| {
            let order = Just((0..n).collect::<Vec<usize>>()).prop_shuffle();
            let parent_choices = prop::collection::vec(any::<usize>(), n.saturating_sub(1));
            (order, parent_choices)
        })
        .prop_map(|(order, parent_choices)| {
            let n = order.len();
            let mut heads = vec![0u32; n];
            let mut labels = vec!["IGNORE".to_string(); n];
            labels[order[0]] = "ROOT".to_string();
            for (k, &pos) in order.iter().enumerate().skip(1) {
                let parent_pos = order[parent_choices[k - 1] % k];
                heads[pos] = (parent_pos + 1) as u32;
                labels[pos] = format!("edge{k}");
            }
            DepSentence::new(
                (0..n)
                    .map(|i| entry(&format!("w{i}"), heads[i], &labels[i]))
                    .collect(),
            )
        })
}

/// Compare two addresses component-wise numerically; the empty address
/// (the root) orders first.
fn address_key(address: &str) -> Vec<usize> {
    if address.is_empty() {
        return Vec::new();
    }
    address
        .split('.')
        .map(|part| part.parse().expect("numeric address component"))
        .collect()
}

proptest! {
    #[test]
    fn prop_node_count_equals_sentence_length(sentence in tree_sentence_strategy()) {
        let tree = from_sentence(&sentence).unwrap();
        prop_assert_eq!(tree.node_count(), sentence.len());
    }

    #[test]
    fn prop_root_has_the_empty_address(sentence in tree_sentence_strategy()) {
        let tree = from_sentence(&sentence).unwrap();
        prop_assert_eq!(tree.root.name.as_str(), "");
    }

    #[test]
    fn prop_addresses_are_pairwise_unique(sentence in tree_sentence_strategy()) {
        let tree = from_sentence(&sentence).unwrap();
        let mut addresses = tree.fold_top_down(Vec::new(), |mut acc, node| {
            acc.push(node.name.clone());
            acc
        });
        let before = addresses.len();
        addresses.sort();
        addresses.dedup();
        prop_assert_eq!(addresses.len(), before);
    }

    #[test]
    fn prop_address_order_equals_document_order(sentence in tree_sentence_strategy()) {
        let tree = from_sentence(&sentence).unwrap();
        let document_order = tree.fold_top_down(Vec::new(), |mut acc, node| {
            acc.push(node.name.clone());
            acc
        });
        let mut sorted = document_order.clone();
        sorted.sort_by_key(|address| address_key(address));
        prop_assert_eq!(document_order, sorted);
    }

    #[test]
    fn prop_rootless_sentences_fail(n in 1usize..8) {
        // All heads zero, nothing labeled ROOT.
        let sentence = DepSentence::new(
            (0..n).map(|i| entry(&format!("w{i}"), 0, "IGNORE")).collect(),
        );
        let is_no_root = matches!(
            from_sentence(&sentence),
            Err(TreeError::NoRootFound { .. })
        );
        prop_assert!(is_no_root);
    }
}
