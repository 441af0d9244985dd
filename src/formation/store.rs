//! Formation configuration store
//!
//! Stored formation settings keyed by leader spawn id, and membership rows
//! keyed by member spawn id. Loaded once at startup, read-only afterwards.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::SpawnId;
use crate::formation::topology::FormationType;

/// Stored shape of a leader's formation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationSettings {
    pub formation_type: FormationType,
    pub radius: f32,
}

/// Stored membership of a single follower
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormationMemberData {
    pub leader_spawn_id: SpawnId,
    pub formation_position: u8,
}

/// Read-only formation lookups consumed by coordinators and the world
pub trait FormationDataSource {
    fn settings(&self, leader: SpawnId) -> Option<&FormationSettings>;
    fn member_data(&self, member: SpawnId) -> Option<&FormationMemberData>;
    fn member_ids(&self, leader: SpawnId) -> Option<&[SpawnId]>;
}

/// Settings row as written in a store document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsRow {
    pub leader_spawn_id: u32,
    pub formation_type: u8,
    pub radius: f32,
}

/// Membership row as written in a store document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRow {
    pub leader_spawn_id: u32,
    pub member_spawn_id: u32,
    #[serde(default)]
    pub formation_position: u8,
}

/// A complete store document (TOML or JSON)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFile {
    #[serde(default)]
    pub settings: Vec<SettingsRow>,
    #[serde(default)]
    pub members: Vec<MemberRow>,
}

/// In-memory formation store
#[derive(Debug, Clone, Default)]
pub struct FormationStore {
    settings: AHashMap<SpawnId, FormationSettings>,
    member_data: AHashMap<SpawnId, FormationMemberData>,
    members_by_leader: AHashMap<SpawnId, Vec<SpawnId>>,
}

impl FormationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from parsed rows
    ///
    /// Settings rows with an unknown formation type or a non-finite radius
    /// are skipped so the leader falls back to default settings.
    pub fn from_file(file: StoreFile) -> Self {
        let mut store = Self::new();

        for row in file.settings {
            if !row.radius.is_finite() {
                tracing::warn!(
                    "Skipping formation settings for leader {}: radius {} is not finite",
                    row.leader_spawn_id,
                    row.radius
                );
                continue;
            }
            match FormationType::try_from(row.formation_type) {
                Ok(formation_type) => store.insert_settings(
                    SpawnId(row.leader_spawn_id),
                    FormationSettings {
                        formation_type,
                        radius: row.radius,
                    },
                ),
                Err(e) => tracing::warn!(
                    "Skipping formation settings for leader {}: {}",
                    row.leader_spawn_id,
                    e
                ),
            }
        }

        for row in file.members {
            store.insert_member(
                SpawnId(row.leader_spawn_id),
                SpawnId(row.member_spawn_id),
                row.formation_position,
            );
        }

        tracing::info!(
            "Loaded {} formation settings and {} formation members",
            store.settings.len(),
            store.member_data.len()
        );

        store
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: StoreFile = toml::from_str(content)?;
        Ok(Self::from_file(file))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: StoreFile = serde_json::from_str(content)?;
        Ok(Self::from_file(file))
    }

    /// Load a store from disk, choosing the parser by file extension
    ///
    /// `.json` files are parsed as JSON, everything else as TOML.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn insert_settings(&mut self, leader: SpawnId, settings: FormationSettings) {
        self.settings.insert(leader, settings);
    }

    /// Register `member` under `leader`
    ///
    /// A member listed twice keeps its latest row; the leader's member list
    /// keeps first-seen order without duplicates.
    pub fn insert_member(&mut self, leader: SpawnId, member: SpawnId, formation_position: u8) {
        if let Some(previous) = self.member_data.insert(
            member,
            FormationMemberData {
                leader_spawn_id: leader,
                formation_position,
            },
        ) {
            if previous.leader_spawn_id != leader {
                if let Some(ids) = self.members_by_leader.get_mut(&previous.leader_spawn_id) {
                    ids.retain(|id| *id != member);
                }
            }
        }

        let ids = self.members_by_leader.entry(leader).or_default();
        if !ids.contains(&member) {
            ids.push(member);
        }
    }

    pub fn settings_count(&self) -> usize {
        self.settings.len()
    }

    pub fn member_count(&self) -> usize {
        self.member_data.len()
    }
}

impl FormationDataSource for FormationStore {
    fn settings(&self, leader: SpawnId) -> Option<&FormationSettings> {
        self.settings.get(&leader)
    }

    fn member_data(&self, member: SpawnId) -> Option<&FormationMemberData> {
        self.member_data.get(&member)
    }

    fn member_ids(&self, leader: SpawnId) -> Option<&[SpawnId]> {
        self.members_by_leader.get(&leader).map(|ids| ids.as_slice())
    }
}

// === GLOBAL STORE ACCESS ===

static STORE: OnceLock<Arc<FormationStore>> = OnceLock::new();

/// Get the process-wide formation store (empty if never set)
pub fn formation_store() -> Arc<FormationStore> {
    STORE
        .get_or_init(|| Arc::new(FormationStore::default()))
        .clone()
}

/// Install the process-wide formation store (can only be called once)
pub fn set_formation_store(store: FormationStore) -> std::result::Result<(), FormationStore> {
    STORE
        .set(Arc::new(store))
        .map_err(|rejected| Arc::try_unwrap(rejected).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FormationError;

    const SAMPLE_TOML: &str = r#"
[[settings]]
leader_spawn_id = 100
formation_type = 1
radius = 4.0

[[settings]]
leader_spawn_id = 200
formation_type = 6
radius = 2.5

[[members]]
leader_spawn_id = 100
member_spawn_id = 101
formation_position = 2

[[members]]
leader_spawn_id = 100
member_spawn_id = 102
formation_position = 1

[[members]]
leader_spawn_id = 200
member_spawn_id = 201
"#;

    #[test]
    fn test_load_settings_from_toml() {
        let store = FormationStore::from_toml_str(SAMPLE_TOML).unwrap();

        let settings = store.settings(SpawnId(100)).unwrap();
        assert_eq!(settings.formation_type, FormationType::SingleFile);
        assert_eq!(settings.radius, 4.0);

        let circle = store.settings(SpawnId(200)).unwrap();
        assert_eq!(circle.formation_type, FormationType::CircleAroundLeader);
    }

    #[test]
    fn test_member_data_and_order() {
        let store = FormationStore::from_toml_str(SAMPLE_TOML).unwrap();

        let member = store.member_data(SpawnId(101)).unwrap();
        assert_eq!(member.leader_spawn_id, SpawnId(100));
        assert_eq!(member.formation_position, 2);

        assert_eq!(
            store.member_ids(SpawnId(100)).unwrap(),
            &[SpawnId(101), SpawnId(102)]
        );
        assert_eq!(store.member_data(SpawnId(201)).unwrap().formation_position, 0);
    }

    #[test]
    fn test_missing_entries_are_absent() {
        let store = FormationStore::from_toml_str(SAMPLE_TOML).unwrap();
        assert!(store.settings(SpawnId(999)).is_none());
        assert!(store.member_data(SpawnId(999)).is_none());
        assert!(store.member_ids(SpawnId(999)).is_none());
    }

    #[test]
    fn test_unknown_formation_type_is_skipped() {
        let toml = r#"
[[settings]]
leader_spawn_id = 5
formation_type = 42
radius = 1.0
"#;
        let store = FormationStore::from_toml_str(toml).unwrap();
        assert!(store.settings(SpawnId(5)).is_none());
        assert_eq!(store.settings_count(), 0);
    }

    #[test]
    fn test_non_finite_radius_is_skipped() {
        let toml = r#"
[[settings]]
leader_spawn_id = 5
formation_type = 0
radius = inf

[[settings]]
leader_spawn_id = 6
formation_type = 0
radius = nan

[[settings]]
leader_spawn_id = 7
formation_type = 0
radius = 2.0
"#;
        let store = FormationStore::from_toml_str(toml).unwrap();
        assert!(store.settings(SpawnId(5)).is_none());
        assert!(store.settings(SpawnId(6)).is_none());
        assert_eq!(store.settings(SpawnId(7)).unwrap().radius, 2.0);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{
            "settings": [{ "leader_spawn_id": 7, "formation_type": 2, "radius": 1.5 }],
            "members": [{ "leader_spawn_id": 7, "member_spawn_id": 8, "formation_position": 3 }]
        }"#;
        let store = FormationStore::from_json_str(json).unwrap();
        assert_eq!(
            store.settings(SpawnId(7)).unwrap().formation_type,
            FormationType::SideBySide
        );
        assert_eq!(store.member_count(), 1);
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let result = FormationStore::from_toml_str("[[settings]]\nleader_spawn_id = \"x\"");
        assert!(matches!(result, Err(FormationError::TomlError(_))));
    }

    #[test]
    fn test_member_moved_between_leaders() {
        let mut store = FormationStore::new();
        store.insert_member(SpawnId(1), SpawnId(10), 0);
        store.insert_member(SpawnId(2), SpawnId(10), 4);

        assert_eq!(store.member_ids(SpawnId(1)).unwrap(), &[] as &[SpawnId]);
        assert_eq!(store.member_ids(SpawnId(2)).unwrap(), &[SpawnId(10)]);
        assert_eq!(store.member_data(SpawnId(10)).unwrap().formation_position, 4);
        assert_eq!(store.member_count(), 1);
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let result = FormationStore::load_from_file(Path::new("/nonexistent/formations.toml"));
        assert!(matches!(result, Err(FormationError::IoError(_))));
    }
}
