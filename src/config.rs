//! `sheetcalc.toml` settings.
//!
//! ```toml
//! max_depth = 256
//! user_id = "alice"
//!
//! [sheet]
//! title = "Budget"
//! rows = 200
//! cols = 26
//! ```

use directories::ProjectDirs;
use serde::Deserialize;
use sheetcalc_core::document::{DEFAULT_COL_COUNT, DEFAULT_ROW_COUNT, DEFAULT_TITLE};
use sheetcalc_engine::engine::{DEFAULT_MAX_DEPTH, EvalOptions};
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB
const DEFAULT_USER_ID: &str = "local";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    max_depth: Option<usize>,
    user_id: Option<String>,
    sheet: Option<SheetDefaults>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SheetDefaults {
    title: Option<String>,
    rows: Option<usize>,
    cols: Option<usize>,
}

/// Resolved settings; every field has a usable value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub max_depth: usize,
    pub user_id: String,
    pub default_title: String,
    pub default_rows: usize,
    pub default_cols: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            user_id: DEFAULT_USER_ID.to_string(),
            default_title: DEFAULT_TITLE.to_string(),
            default_rows: DEFAULT_ROW_COUNT,
            default_cols: DEFAULT_COL_COUNT,
        }
    }
}

impl Config {
    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            max_depth: self.max_depth,
        }
    }

    fn merge(&mut self, file: ConfigFile, warnings: &mut Vec<String>) {
        match file.max_depth {
            Some(0) => warnings.push("max_depth must be at least 1; using default".to_string()),
            Some(depth) => self.max_depth = depth,
            None => {}
        }
        if let Some(user_id) = file.user_id.filter(|u| !u.trim().is_empty()) {
            self.user_id = user_id;
        }
        let sheet = file.sheet.unwrap_or_default();
        if let Some(title) = sheet.title.filter(|t| !t.trim().is_empty()) {
            self.default_title = title;
        }
        for (name, value, slot) in [
            ("sheet.rows", sheet.rows, &mut self.default_rows),
            ("sheet.cols", sheet.cols, &mut self.default_cols),
        ] {
            match value {
                Some(0) => warnings.push(format!("{} must be at least 1; using default", name)),
                Some(n) => *slot = n,
                None => {}
            }
        }
    }
}

/// Load settings from `config_file`, or the user config dir when `None`.
///
/// Never fails: problems come back as warnings and defaults are used.
pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = Config::default();
    let config_path = config_file.map(Path::to_path_buf).or_else(user_config_path);

    let Some(path) = config_path.as_ref() else {
        return (config, warnings);
    };
    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (config, warnings);
    }

    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
        }
        Ok(_) => match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ConfigFile>(&content) {
                Ok(parsed) => config.merge(parsed, &mut warnings),
                Err(err) => warnings.push(format!("Failed to parse {}: {}", path.display(), err)),
            },
            Err(err) => warnings.push(format!("Failed to read {}: {}", path.display(), err)),
        },
        Err(err) => warnings.push(format!(
            "Failed to read metadata for {}: {}",
            path.display(),
            err
        )),
    }

    (config, warnings)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "sheetcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("sheetcalc.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load_str(content: &str) -> (Config, Vec<String>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheetcalc.toml");
        std::fs::write(&path, content).unwrap();
        load_config(Some(&path))
    }

    #[test]
    fn test_full_config() {
        let (config, warnings) = load_str(
            "max_depth = 32\nuser_id = \"alice\"\n[sheet]\ntitle = \"Budget\"\nrows = 10\ncols = 4\n",
        );
        assert!(warnings.is_empty());
        assert_eq!(
            config,
            Config {
                max_depth: 32,
                user_id: "alice".to_string(),
                default_title: "Budget".to_string(),
                default_rows: 10,
                default_cols: 4,
            }
        );
        assert_eq!(config.eval_options().max_depth, 32);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let (config, warnings) = load_str("[sheet]\nrows = 50\n");
        assert!(warnings.is_empty());
        assert_eq!(config.default_rows, 50);
        assert_eq!(config.default_cols, 26);
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.default_title, "Untitled Spreadsheet");
    }

    #[test]
    fn test_malformed_config_warns() {
        let (config, warnings) = load_str("max_depth = \"deep\"");
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Failed to parse"));

        let (_, warnings) = load_str("colour = \"red\"");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let (config, warnings) = load_str("max_depth = 0\n[sheet]\ncols = 0\n");
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_missing_explicit_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(Some(&dir.path().join("absent.toml")));
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Config file not found"));
    }
}
