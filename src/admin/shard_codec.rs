//! Conversion between shard placements and their document form.

use super::identifier::{IdentifierFormat, IdentifierResolver};
use crate::document::{DocumentError, DocumentResult, ObjectConverter, vector_from_value};
use crate::metadata::{ShardConfig, TableConfig};
use log::{debug, warn};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

/// Encodes one shard as `{replicas: [...], director: ...}`.
///
/// Replicas on permanently removed servers are left out of the list. A
/// director that cannot be shown, or no director at all, is shown as `null`.
pub fn encode_shard(
    shard: &ShardConfig,
    format: IdentifierFormat,
    resolver: &dyn IdentifierResolver,
) -> Value {
    let replicas = shard
        .replicas
        .iter()
        .filter_map(|replica| {
            let value = resolver.server_to_value(*replica, format);
            if value.is_none() {
                debug!("omitting removed server {} from shard replicas", replica);
            }
            value
        })
        .collect::<Vec<_>>();

    let director = match shard.director {
        Some(director) => resolver.server_to_value(director, format).unwrap_or_else(|| {
            warn!("director {} no longer resolves; showing null", director);
            Value::Null
        }),
        None => Value::Null,
    };

    json!({
        "replicas": replicas,
        "director": director,
    })
}

pub fn decode_shard(
    value: &Value,
    format: IdentifierFormat,
    resolver: &dyn IdentifierResolver,
) -> DocumentResult<ShardConfig> {
    let mut converter = ObjectConverter::init(value)?;

    let replicas_value = converter.get("replicas")?;
    let items = replicas_value.as_array().ok_or_else(|| {
        DocumentError::new(format!("Expected an array, got {}", replicas_value))
            .in_field("replicas")
    })?;
    let mut replicas = BTreeSet::new();
    for item in items {
        let server = resolver
            .server_from_value(item, format)
            .map_err(|err| err.in_field("replicas"))?;
        if !replicas.insert(server) {
            return Err(
                DocumentError::new("A server is listed more than once.").in_field("replicas")
            );
        }
    }
    if replicas.is_empty() {
        return Err(DocumentError::new(
            "You must specify at least one replica for each shard.",
        ));
    }

    // A null director is accepted so that a shard whose director was declared
    // dead can still be written back unchanged.
    let director_value = converter.get("director")?;
    let director = if director_value.is_null() {
        None
    } else {
        let director = resolver
            .server_from_value(&director_value, format)
            .map_err(|err| err.in_field("director"))?;
        if !replicas.contains(&director) {
            return Err(DocumentError::new(
                "The director must be one of the replicas.",
            ));
        }
        Some(director)
    };

    converter.check_no_extra_keys()?;

    Ok(ShardConfig { replicas, director })
}

/// Encodes a table's placement as `{shards: [...]}`.
pub fn encode_table_config(
    config: &TableConfig,
    format: IdentifierFormat,
    resolver: &dyn IdentifierResolver,
) -> Value {
    let shards = config
        .shards
        .iter()
        .map(|shard| encode_shard(shard, format, resolver))
        .collect::<Vec<_>>();
    let mut object = Map::new();
    object.insert("shards".to_string(), Value::Array(shards));
    Value::Object(object)
}

/// Decodes the `shards` array of a table document.
pub fn decode_shards(
    value: &Value,
    format: IdentifierFormat,
    resolver: &dyn IdentifierResolver,
) -> DocumentResult<TableConfig> {
    let shards = vector_from_value(value, |shard| decode_shard(shard, format, resolver))
        .map_err(|err| err.in_field("shards"))?;
    if shards.is_empty() {
        return Err(
            DocumentError::new("You must specify at least one shard.").in_field("shards")
        );
    }
    Ok(TableConfig { shards })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::identifier::ClusterDirectory;
    use crate::core::ServerId;

    fn directory() -> (ClusterDirectory, ServerId, ServerId, ServerId) {
        let directory = ClusterDirectory::new();
        let s1 = directory.add_server("s1");
        let s2 = directory.add_server("s2");
        let s3 = directory.add_server("s3");
        (directory, s1, s2, s3)
    }

    #[test]
    fn decodes_valid_shard() {
        let (directory, s1, s2, _) = directory();
        let shard = decode_shard(
            &json!({"replicas": ["s1", "s2"], "director": "s2"}),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap();
        assert_eq!(shard.replicas, BTreeSet::from([s1, s2]));
        assert_eq!(shard.director, Some(s2));
    }

    #[test]
    fn rejects_director_outside_replicas() {
        let (directory, ..) = directory();
        let err = decode_shard(
            &json!({"replicas": ["s1", "s2"], "director": "s3"}),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap_err();
        assert_eq!(err.message(), "The director must be one of the replicas.");
    }

    #[test]
    fn rejects_duplicate_and_empty_replicas() {
        let (directory, ..) = directory();
        let duplicate = decode_shard(
            &json!({"replicas": ["s1", "s1"], "director": "s1"}),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap_err();
        assert_eq!(
            duplicate.message(),
            "In `replicas`: A server is listed more than once."
        );

        let empty = decode_shard(
            &json!({"replicas": [], "director": null}),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap_err();
        assert_eq!(
            empty.message(),
            "You must specify at least one replica for each shard."
        );
    }

    #[test]
    fn field_errors_are_qualified() {
        let (directory, ..) = directory();
        let not_array = decode_shard(
            &json!({"replicas": "s1", "director": "s1"}),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap_err();
        assert_eq!(
            not_array.message(),
            "In `replicas`: Expected an array, got \"s1\""
        );

        let unknown = decode_shard(
            &json!({"replicas": ["s1", "nope"], "director": "s1"}),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap_err();
        assert_eq!(
            unknown.message(),
            "In `replicas`: Server `nope` does not exist."
        );

        let bad_director = decode_shard(
            &json!({"replicas": ["s1"], "director": 12}),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap_err();
        assert_eq!(
            bad_director.message(),
            "In `director`: Expected a string; got 12"
        );
    }

    #[test]
    fn missing_director_and_extra_keys_are_rejected() {
        let (directory, ..) = directory();
        let missing = decode_shard(
            &json!({"replicas": ["s1"]}),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap_err();
        assert_eq!(missing.message(), "Expected a field named `director`.");

        let extra = decode_shard(
            &json!({"replicas": ["s1"], "director": "s1", "primary": "s1"}),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap_err();
        assert_eq!(extra.message(), "Unexpected key(s) `primary`.");
    }

    #[test]
    fn null_director_decodes_to_none() {
        let (directory, s1, ..) = directory();
        let shard = decode_shard(
            &json!({"replicas": ["s1"], "director": null}),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap();
        assert_eq!(shard.replicas, BTreeSet::from([s1]));
        assert_eq!(shard.director, None);
    }

    #[test]
    fn encoding_drops_removed_replicas_and_nulls_dead_director() {
        let (directory, s1, s2, _) = directory();
        let shard = ShardConfig {
            replicas: BTreeSet::from([s1, s2]),
            director: Some(s1),
        };
        directory.remove_server(s1);

        let encoded = encode_shard(&shard, IdentifierFormat::Name, &directory);
        assert_eq!(encoded, json!({"replicas": ["s2"], "director": null}));

        let decoded = decode_shard(&encoded, IdentifierFormat::Name, &directory).unwrap();
        assert_eq!(decoded.replicas, BTreeSet::from([s2]));
        assert_eq!(decoded.director, None);
    }

    #[test]
    fn shards_array_must_be_non_empty() {
        let (directory, ..) = directory();
        let err = decode_shards(&json!([]), IdentifierFormat::Name, &directory).unwrap_err();
        assert_eq!(
            err.message(),
            "In `shards`: You must specify at least one shard."
        );

        let nested = decode_shards(
            &json!([{"replicas": ["s1"], "director": "s2"}]),
            IdentifierFormat::Name,
            &directory,
        )
        .unwrap_err();
        assert_eq!(
            nested.message(),
            "In `shards`: The director must be one of the replicas."
        );
    }

    #[test]
    fn uuid_format_round_trips() {
        let (directory, s1, s2, _) = directory();
        let config = TableConfig {
            shards: vec![ShardConfig {
                replicas: BTreeSet::from([s1, s2]),
                director: Some(s2),
            }],
        };
        let encoded = encode_table_config(&config, IdentifierFormat::Uuid, &directory);
        let decoded =
            decode_shards(&encoded["shards"], IdentifierFormat::Uuid, &directory).unwrap();
        assert_eq!(decoded, config);
    }
}
