//! Conversion between whole `table_config` rows and table metadata.

use super::identifier::{IdentifierFormat, IdentifierResolver};
use super::shard_codec::{decode_shards, encode_table_config};
use crate::core::TableId;
use crate::document::{
    DocumentResult, ObjectConverter, name_from_value, string_from_value, uuid_from_value,
};
use crate::metadata::{TableConfig, TableMetadata};
use serde_json::Value;

/// Primary key assumed for tables created without an explicit `primary_key`.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// A decoded row, before any checks against existing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRowUpdate {
    pub name: String,
    /// Database reference exactly as written; resolved later, and only for new tables.
    pub db: Value,
    pub id: TableId,
    pub primary_key: String,
    /// `None` only for new tables whose row left `shards` out.
    pub shards: Option<TableConfig>,
}

/// Decodes a full row.
///
/// For a table that already exists, `primary_key` and `shards` must be
/// present. For a new one they may be omitted: the primary key then defaults
/// to `"id"` and the shards are left for the placement generator.
pub fn decode_table_row(
    value: &Value,
    existed_before: bool,
    format: IdentifierFormat,
    resolver: &dyn IdentifierResolver,
) -> DocumentResult<TableRowUpdate> {
    let mut converter = ObjectConverter::init(value)?;

    let name_value = converter.get("name")?;
    let name = name_from_value(&name_value, "Table name").map_err(|err| err.in_field("name"))?;

    let db = converter.get("db")?;

    let id_value = converter.get("id")?;
    let id = TableId::from_uuid(uuid_from_value(&id_value).map_err(|err| err.in_field("id"))?);

    let primary_key = if existed_before || converter.has("primary_key") {
        let primary_key_value = converter.get("primary_key")?;
        string_from_value(&primary_key_value).map_err(|err| err.in_field("primary_key"))?
    } else {
        DEFAULT_PRIMARY_KEY.to_string()
    };

    let shards = if existed_before || converter.has("shards") {
        let shards_value = converter.get("shards")?;
        Some(decode_shards(&shards_value, format, resolver)?)
    } else {
        None
    };

    converter.check_no_extra_keys()?;

    Ok(TableRowUpdate {
        name,
        db,
        id,
        primary_key,
        shards,
    })
}

/// Builds the row for one table from its metadata.
pub fn format_row(
    table_id: TableId,
    table_name: &str,
    db: Value,
    metadata: &TableMetadata,
    format: IdentifierFormat,
    resolver: &dyn IdentifierResolver,
) -> Value {
    let mut row = encode_table_config(
        &metadata.replication_info.get().config,
        format,
        resolver,
    );
    if let Value::Object(fields) = &mut row {
        fields.insert("name".to_string(), Value::String(table_name.to_string()));
        fields.insert("db".to_string(), db);
        fields.insert("id".to_string(), Value::String(table_id.to_string()));
        fields.insert(
            "primary_key".to_string(),
            Value::String(metadata.primary_key.get().clone()),
        );
    }
    row
}
