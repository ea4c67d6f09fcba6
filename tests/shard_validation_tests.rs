use proptest::prelude::*;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use tablecfg::admin::{decode_shard, decode_shards, encode_shard};
use tablecfg::{ClusterDirectory, IdentifierFormat, ShardScheme};

const NAMES: [&str; 5] = ["s1", "s2", "s3", "gone", "nope"];

const LIVE: [&str; 3] = ["s1", "s2", "s3"];

/// How `decode_shard` must reject `doc`, checked in the order it decodes.
enum Rejection {
    Exact(&'static str),
    Prefix(&'static str),
}

fn expected_rejection(doc: &Value) -> Option<Rejection> {
    let replicas = doc["replicas"].as_array().unwrap();
    let mut seen = BTreeSet::new();
    for replica in replicas {
        match replica.as_str().filter(|name| LIVE.contains(name)) {
            None => return Some(Rejection::Prefix("In `replicas`: ")),
            Some(name) if !seen.insert(name) => {
                return Some(Rejection::Exact(
                    "In `replicas`: A server is listed more than once.",
                ));
            }
            Some(_) => {}
        }
    }
    if seen.is_empty() {
        return Some(Rejection::Exact(
            "You must specify at least one replica for each shard.",
        ));
    }
    let director = &doc["director"];
    if !director.is_null() {
        match director.as_str().filter(|name| LIVE.contains(name)) {
            None => return Some(Rejection::Prefix("In `director`: ")),
            Some(name) if !seen.contains(&name) => {
                return Some(Rejection::Exact("The director must be one of the replicas."));
            }
            Some(_) => {}
        }
    }
    if doc.get("primary").is_some() {
        return Some(Rejection::Exact("Unexpected key(s) `primary`."));
    }
    None
}

fn directory() -> ClusterDirectory {
    let directory = ClusterDirectory::new();
    directory.add_server("s1");
    directory.add_server("s2");
    directory.add_server("s3");
    let gone = directory.add_server("gone");
    directory.remove_server(gone);
    directory
}

fn name_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0usize..NAMES.len()).prop_map(|i| json!(NAMES[i])),
        Just(json!(12)),
        Just(json!("bad name!")),
    ]
}

fn shard_document() -> impl Strategy<Value = Value> {
    (
        prop::collection::vec(name_value(), 0..5),
        prop_oneof![Just(Value::Null), name_value()],
        any::<bool>(),
    )
        .prop_map(|(replicas, director, extra)| {
            let mut doc = json!({"replicas": replicas, "director": director});
            if extra {
                doc["primary"] = json!("s1");
            }
            doc
        })
}

proptest! {
    #[test]
    fn decoded_shards_always_hold_their_invariants(doc in shard_document()) {
        let directory = directory();
        let expected = expected_rejection(&doc);
        match decode_shard(&doc, IdentifierFormat::Name, &directory) {
            Ok(shard) => {
                prop_assert!(expected.is_none());
                let listed = doc["replicas"].as_array().unwrap();
                prop_assert!(!shard.replicas.is_empty());
                prop_assert_eq!(shard.replicas.len(), listed.len());
                if let Some(director) = shard.director {
                    prop_assert!(shard.replicas.contains(&director));
                }
                prop_assert!(doc.get("primary").is_none());

                let encoded = encode_shard(&shard, IdentifierFormat::Name, &directory);
                let reparsed = decode_shard(&encoded, IdentifierFormat::Name, &directory).unwrap();
                prop_assert_eq!(reparsed, shard);
            }
            Err(err) => match expected {
                Some(Rejection::Exact(message)) => prop_assert_eq!(err.message(), message),
                Some(Rejection::Prefix(prefix)) => {
                    prop_assert!(err.message().starts_with(prefix), "{}", err.message())
                }
                None => prop_assert!(false, "unexpected rejection: {}", err.message()),
            },
        }
    }

    #[test]
    fn unknown_or_repeated_servers_are_rejected(
        replicas in prop::collection::vec(0usize..NAMES.len(), 1..5),
    ) {
        let directory = directory();
        let names = replicas.iter().map(|i| NAMES[*i]).collect::<Vec<_>>();
        let doc = json!({"replicas": names, "director": null});
        let unique = names.iter().collect::<BTreeSet<_>>().len() == names.len();
        let known = names.iter().all(|name| name.starts_with('s'));

        let result = decode_shard(&doc, IdentifierFormat::Name, &directory);
        prop_assert_eq!(result.is_ok(), unique && known);
    }

    #[test]
    fn every_key_lands_in_exactly_one_shard(
        count in 1usize..=64,
        key in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let scheme = ShardScheme::uniform(count);
        prop_assert!(scheme.is_well_formed());
        prop_assert_eq!(scheme.shard_count(), count);
        prop_assert!(scheme.shard_for_key(&key) < count);
    }
}

#[test]
fn shards_list_reports_the_failing_element() {
    let directory = directory();
    let err = decode_shards(
        &json!([
            {"replicas": ["s1"], "director": "s1"},
            {"replicas": ["s2"], "director": "s1"},
        ]),
        IdentifierFormat::Name,
        &directory,
    )
    .unwrap_err();
    assert_eq!(
        err.message(),
        "In `shards`: The director must be one of the replicas."
    );

    let err = decode_shards(&json!({"replicas": []}), IdentifierFormat::Name, &directory)
        .unwrap_err();
    assert!(err.message().starts_with("In `shards`: Expected an array"));
}
