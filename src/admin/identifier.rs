use crate::core::{DatabaseId, ServerId};
use crate::document::{DocumentError, DocumentResult, string_from_value, uuid_from_value};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

/// Display name used for a table's database once that database is gone.
pub const DELETED_DATABASE_NAME: &str = "__deleted_database__";

/// How servers and databases appear in documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierFormat {
    #[default]
    Name,
    Uuid,
}

impl fmt::Display for IdentifierFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Uuid => write!(f, "uuid"),
        }
    }
}

impl FromStr for IdentifierFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "uuid" => Ok(Self::Uuid),
            other => Err(format!(
                "unknown identifier format '{}' (expected 'name' or 'uuid')",
                other
            )),
        }
    }
}

/// Maps server and database identifiers to their document form and back.
pub trait IdentifierResolver: Send + Sync {
    /// `None` if the server has been permanently removed.
    fn server_to_value(&self, server: ServerId, format: IdentifierFormat) -> Option<Value>;

    fn server_from_value(&self, value: &Value, format: IdentifierFormat)
    -> DocumentResult<ServerId>;

    fn database_to_value(&self, database: DatabaseId, format: IdentifierFormat) -> Value;

    fn database_from_value(
        &self,
        value: &Value,
        format: IdentifierFormat,
    ) -> DocumentResult<DatabaseId>;

    /// Servers that can receive new replicas.
    fn available_servers(&self) -> Vec<ServerId>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    #[serde(default)]
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub servers: BTreeMap<ServerId, ServerEntry>,
    #[serde(default)]
    pub databases: BTreeMap<DatabaseId, DatabaseEntry>,
}

/// In-memory server and database directory.
#[derive(Debug, Default)]
pub struct ClusterDirectory {
    state: RwLock<DirectorySnapshot>,
}

impl ClusterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        self.read().clone()
    }

    pub fn add_server(&self, name: impl Into<String>) -> ServerId {
        let id = ServerId::new_v4();
        self.write().servers.insert(
            id,
            ServerEntry {
                name: name.into(),
                removed: false,
            },
        );
        id
    }

    /// Marks a server as permanently removed. Returns false if unknown.
    pub fn remove_server(&self, server: ServerId) -> bool {
        match self.write().servers.get_mut(&server) {
            Some(entry) => {
                entry.removed = true;
                true
            }
            None => false,
        }
    }

    pub fn add_database(&self, name: impl Into<String>) -> DatabaseId {
        let id = DatabaseId::new_v4();
        self.write().databases.insert(
            id,
            DatabaseEntry {
                name: name.into(),
                deleted: false,
            },
        );
        id
    }

    pub fn delete_database(&self, database: DatabaseId) -> bool {
        match self.write().databases.get_mut(&database) {
            Some(entry) => {
                entry.deleted = true;
                true
            }
            None => false,
        }
    }

    // Directory updates are single assignments, so a poisoned lock still holds consistent data.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, DirectorySnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, DirectorySnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdentifierResolver for ClusterDirectory {
    fn server_to_value(&self, server: ServerId, format: IdentifierFormat) -> Option<Value> {
        let state = self.read();
        let entry = state.servers.get(&server).filter(|entry| !entry.removed)?;
        Some(match format {
            IdentifierFormat::Name => Value::String(entry.name.clone()),
            IdentifierFormat::Uuid => Value::String(server.to_string()),
        })
    }

    fn server_from_value(
        &self,
        value: &Value,
        format: IdentifierFormat,
    ) -> DocumentResult<ServerId> {
        let state = self.read();
        match format {
            IdentifierFormat::Name => {
                let name = string_from_value(value)?;
                let matches = state
                    .servers
                    .iter()
                    .filter(|(_, entry)| !entry.removed && entry.name == name)
                    .map(|(id, _)| *id)
                    .collect::<Vec<_>>();
                match matches.as_slice() {
                    [id] => Ok(*id),
                    [] => Err(DocumentError::new(format!(
                        "Server `{}` does not exist.",
                        name
                    ))),
                    _ => Err(DocumentError::new(format!(
                        "Server `{}` is ambiguous; there are multiple servers with that name.",
                        name
                    ))),
                }
            }
            IdentifierFormat::Uuid => {
                let id = ServerId::from_uuid(uuid_from_value(value)?);
                match state.servers.get(&id) {
                    Some(entry) if !entry.removed => Ok(id),
                    _ => Err(DocumentError::new(format!(
                        "There is no server with UUID `{}`.",
                        id
                    ))),
                }
            }
        }
    }

    fn database_to_value(&self, database: DatabaseId, format: IdentifierFormat) -> Value {
        match format {
            IdentifierFormat::Uuid => Value::String(database.to_string()),
            IdentifierFormat::Name => {
                let state = self.read();
                let name = state
                    .databases
                    .get(&database)
                    .filter(|entry| !entry.deleted)
                    .map(|entry| entry.name.clone())
                    .unwrap_or_else(|| DELETED_DATABASE_NAME.to_string());
                Value::String(name)
            }
        }
    }

    fn database_from_value(
        &self,
        value: &Value,
        format: IdentifierFormat,
    ) -> DocumentResult<DatabaseId> {
        let state = self.read();
        match format {
            IdentifierFormat::Name => {
                let name = string_from_value(value)?;
                let matches = state
                    .databases
                    .iter()
                    .filter(|(_, entry)| !entry.deleted && entry.name == name)
                    .map(|(id, _)| *id)
                    .collect::<Vec<_>>();
                match matches.as_slice() {
                    [id] => Ok(*id),
                    [] => Err(DocumentError::new(format!(
                        "Database `{}` does not exist.",
                        name
                    ))),
                    _ => Err(DocumentError::new(format!(
                        "Database `{}` is ambiguous; there are multiple databases with that name.",
                        name
                    ))),
                }
            }
            IdentifierFormat::Uuid => {
                let id = DatabaseId::from_uuid(uuid_from_value(value)?);
                match state.databases.get(&id) {
                    Some(entry) if !entry.deleted => Ok(id),
                    _ => Err(DocumentError::new(format!(
                        "There is no database with UUID `{}`.",
                        id
                    ))),
                }
            }
        }
    }

    fn available_servers(&self) -> Vec<ServerId> {
        self.read()
            .servers
            .iter()
            .filter(|(_, entry)| !entry.removed)
            .map(|(id, _)| *id)
            .collect()
    }
}
