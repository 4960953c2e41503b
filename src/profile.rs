// src/profile.rs

//! Local storage for server connection profiles and saved queries.

use crate::config;
use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Connection parameters for one Parse Server application.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProfile {
    pub name: String,
    pub application_id: String,
    pub master_key: String,
    pub server_url: String,
    /// Path or URL of an icon shown next to the profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl fmt::Debug for ServerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerProfile")
            .field("name", &self.name)
            .field("application_id", &self.application_id)
            .field("master_key", &"<redacted>")
            .field("server_url", &self.server_url)
            .field("icon", &self.icon)
            .finish()
    }
}

impl ServerProfile {
    pub fn new(
        name: impl Into<String>,
        application_id: impl Into<String>,
        master_key: impl Into<String>,
        server_url: impl Into<String>,
    ) -> Self {
        ServerProfile {
            name: name.into(),
            application_id: application_id.into(),
            master_key: master_key.into(),
            server_url: server_url.into(),
            icon: None,
        }
    }

    fn validate(&self) -> Result<(), ParseError> {
        for (label, value) in [
            ("name", &self.name),
            ("application id", &self.application_id),
            ("master key", &self.master_key),
            ("server URL", &self.server_url),
        ] {
            if value.trim().is_empty() {
                return Err(ParseError::InvalidInput(format!(
                    "Profile {} cannot be empty",
                    label
                )));
            }
        }
        Ok(())
    }
}

/// A query string an administrator saved for replay. The string is opaque:
/// it is stored and sent back exactly as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub profile: String,
    pub class_name: String,
    pub label: String,
    pub query: String,
    /// Columns to show when listing results.
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    profiles: Vec<ServerProfile>,
    #[serde(default)]
    saved_queries: Vec<SavedQuery>,
}

/// The on-disk store. Changes stay in memory until [`ProfileStore::save`].
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    document: StoreDocument,
}

impl ProfileStore {
    /// Opens the store at `path`, starting empty if the file doesn't exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ParseError> {
        let path = path.into();
        let document = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => StoreDocument::default(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                ParseError::Config(format!(
                    "Profile store '{}' is corrupt: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No profile store at {}, starting empty", path.display());
                StoreDocument::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(ProfileStore { path, document })
    }

    /// Opens the store at its default location.
    pub fn open_default() -> Result<Self, ParseError> {
        Self::open(config::default_store_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the store, creating the parent directory if needed. The file is
    /// replaced through a rename so a crash never leaves it half-written.
    pub fn save(&self) -> Result<(), ParseError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &self.path)?;
        log::debug!("Saved profile store to {}", self.path.display());
        Ok(())
    }

    pub fn profiles(&self) -> &[ServerProfile] {
        &self.document.profiles
    }

    pub fn profile(&self, name: &str) -> Option<&ServerProfile> {
        self.document.profiles.iter().find(|p| p.name == name)
    }

    /// Adds a new profile; the name must not be taken.
    pub fn add_profile(&mut self, profile: ServerProfile) -> Result<(), ParseError> {
        profile.validate()?;
        if self.profile(&profile.name).is_some() {
            return Err(ParseError::InvalidInput(format!(
                "A profile named '{}' already exists",
                profile.name
            )));
        }
        self.document.profiles.push(profile);
        Ok(())
    }

    /// Adds a profile or replaces the one with the same name.
    pub fn upsert_profile(&mut self, profile: ServerProfile) -> Result<(), ParseError> {
        profile.validate()?;
        match self
            .document
            .profiles
            .iter_mut()
            .find(|p| p.name == profile.name)
        {
            Some(existing) => *existing = profile,
            None => self.document.profiles.push(profile),
        }
        Ok(())
    }

    /// Removes a profile together with its saved queries.
    pub fn remove_profile(&mut self, name: &str) -> Option<ServerProfile> {
        let index = self.document.profiles.iter().position(|p| p.name == name)?;
        self.document.saved_queries.retain(|q| q.profile != name);
        Some(self.document.profiles.remove(index))
    }

    /// Saves a query under a profile. A query with the same profile, class
    /// and label is replaced.
    pub fn save_query(&mut self, query: SavedQuery) -> Result<(), ParseError> {
        if self.profile(&query.profile).is_none() {
            return Err(ParseError::InvalidInput(format!(
                "Unknown profile '{}'",
                query.profile
            )));
        }
        if query.label.trim().is_empty() || query.class_name.trim().is_empty() {
            return Err(ParseError::InvalidInput(
                "A saved query needs a class and a label".to_string(),
            ));
        }
        self.document.saved_queries.retain(|q| {
            !(q.profile == query.profile && q.class_name == query.class_name && q.label == query.label)
        });
        self.document.saved_queries.push(query);
        Ok(())
    }

    /// Saved queries for a profile, optionally narrowed to one class.
    pub fn saved_queries(&self, profile: &str, class_name: Option<&str>) -> Vec<&SavedQuery> {
        self.document
            .saved_queries
            .iter()
            .filter(|q| q.profile == profile)
            .filter(|q| class_name.map_or(true, |c| q.class_name == c))
            .collect()
    }

    pub fn remove_query(&mut self, profile: &str, class_name: &str, label: &str) -> bool {
        let before = self.document.saved_queries.len();
        self.document.saved_queries.retain(|q| {
            !(q.profile == profile && q.class_name == class_name && q.label == label)
        });
        self.document.saved_queries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(tag: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("parse-admin-{}-{}", tag, uuid::Uuid::new_v4().simple()))
            .join("store.json")
    }

    fn local_profile() -> ServerProfile {
        ServerProfile::new("local", "app", "master", "http://localhost:1337/parse")
    }

    fn query(label: &str, class_name: &str) -> SavedQuery {
        SavedQuery {
            profile: "local".to_string(),
            class_name: class_name.to_string(),
            label: label.to_string(),
            query: "limit=10&order=-createdAt".to_string(),
            keys: vec!["score".to_string()],
        }
    }

    #[test]
    fn missing_file_opens_empty_and_save_round_trips() {
        let path = scratch_path("roundtrip");
        let mut store = ProfileStore::open(&path).unwrap();
        assert!(store.profiles().is_empty());

        let mut profile = local_profile();
        profile.icon = Some("icons/local.png".to_string());
        store.add_profile(profile.clone()).unwrap();
        store.save_query(query("top", "GameScore")).unwrap();
        store.save().unwrap();

        let reopened = ProfileStore::open(&path).unwrap();
        assert_eq!(reopened.profile("local"), Some(&profile));
        assert_eq!(reopened.saved_queries("local", None).len(), 1);

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn names_are_unique_unless_upserting() {
        let mut store = ProfileStore::open(scratch_path("unique")).unwrap();
        store.add_profile(local_profile()).unwrap();
        assert!(store.add_profile(local_profile()).is_err());

        let mut changed = local_profile();
        changed.server_url = "https://prod.example.com/parse".to_string();
        store.upsert_profile(changed).unwrap();
        assert_eq!(store.profiles().len(), 1);
        assert_eq!(
            store.profile("local").unwrap().server_url,
            "https://prod.example.com/parse"
        );
    }

    #[test]
    fn rejects_incomplete_profiles() {
        let mut store = ProfileStore::open(scratch_path("invalid")).unwrap();
        let blank_key = ServerProfile::new("x", "app", " ", "http://localhost");
        assert!(matches!(
            store.add_profile(blank_key),
            Err(ParseError::InvalidInput(_))
        ));
    }

    #[test]
    fn saved_queries_follow_their_profile() {
        let mut store = ProfileStore::open(scratch_path("queries")).unwrap();
        assert!(store.save_query(query("top", "GameScore")).is_err());

        store.add_profile(local_profile()).unwrap();
        store.save_query(query("top", "GameScore")).unwrap();
        store.save_query(query("top", "GameScore")).unwrap();
        store.save_query(query("recent", "Post")).unwrap();

        assert_eq!(store.saved_queries("local", None).len(), 2);
        assert_eq!(store.saved_queries("local", Some("Post")).len(), 1);

        assert!(store.remove_query("local", "Post", "recent"));
        assert!(!store.remove_query("local", "Post", "recent"));

        store.remove_profile("local").unwrap();
        assert!(store.saved_queries("local", None).is_empty());
    }

    #[test]
    fn corrupt_store_is_reported() {
        let path = scratch_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ProfileStore::open(&path), Err(ParseError::Config(_))));
        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn debug_output_hides_master_key() {
        let printed = format!("{:?}", local_profile());
        assert!(!printed.contains("\"master\""));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("localhost:1337"));
    }
}
