//! Settings for the module itself, as opposed to the quickplay parameters chosen in the editor.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    time::Duration,
};

use eyre::{Result, WrapErr};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::{config::Revision, game::hooks::InventoryGrant};

fn default_level() -> LevelFilter {
    if cfg!(feature = "debug") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Module settings. Every field has a default, so a settings file only needs to mention the values
/// it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Path of the parameter file, relative to the root of the disc.
    pub config_path: String,

    /// The record revision that the editor writes. Records of any other version are rejected.
    pub revision: Revision,

    /// How long to wait for the parameter read to finish. `None` waits forever.
    pub read_timeout_ms: Option<u64>,

    /// Overrides which items the give-all-items feature covers. When unset, the revision decides.
    pub inventory_grant: Option<InventoryGrant>,

    pub log_level: LevelFilter,

    /// File to write the log to instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            config_path: "dbgconfig".to_string(),
            revision: Revision::CURRENT,
            read_timeout_ms: Some(10_000),
            inventory_grant: None,
            log_level: default_level(),
            log_file: None,
        }
    }
}

impl Options {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn inventory_grant(&self) -> InventoryGrant {
        self.inventory_grant
            .unwrap_or_else(|| self.revision.default_inventory_grant())
    }

    /// Attempts to parse the contents of `reader` to get an `Options` value.
    fn parse_json(reader: impl Read) -> Result<Options> {
        // Coerce with `?`.
        Ok(serde_json::from_reader(reader)?)
    }

    /// Looks for a settings file at `path` and loads it. A missing file is not an error.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Option<Options>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)
            .wrap_err_with(|| format!("Failed to open settings file '{}'", path.display()))?;

        Options::parse_json(file)
            .map(Some)
            .wrap_err_with(|| format!("Failed to parse settings file '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::default();

        assert_eq!(options.config_path, "dbgconfig");
        assert_eq!(options.revision, Revision::V2);
        assert_eq!(options.read_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(options.inventory_grant(), InventoryGrant::PersistentOnly);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let json = r#"{ "revision": "V1", "read_timeout_ms": null }"#;
        let options = Options::parse_json(json.as_bytes()).unwrap();

        assert_eq!(options.revision, Revision::V1);
        assert_eq!(options.read_timeout(), None);
        assert_eq!(options.config_path, "dbgconfig");
        assert_eq!(options.inventory_grant(), InventoryGrant::All);
    }

    #[test]
    fn explicit_grant_wins() {
        let json = r#"{ "inventory_grant": "all", "log_level": "trace" }"#;
        let options = Options::parse_json(json.as_bytes()).unwrap();

        assert_eq!(options.inventory_grant(), InventoryGrant::All);
        assert_eq!(options.log_level, LevelFilter::Trace);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(Options::load_from_file(dir.path().join("quickplay.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickplay.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Options::load_from_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse settings file"));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickplay.json");

        let options = Options {
            config_path: "files/dbgconfig".to_string(),
            log_file: Some(dir.path().join("quickplay.log")),
            ..Options::default()
        };

        std::fs::write(&path, serde_json::to_string_pretty(&options).unwrap()).unwrap();

        assert_eq!(Options::load_from_file(&path).unwrap(), Some(options));
    }
}
