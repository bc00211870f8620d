//! Layered configuration for the nuggets crates.
//!
//! Settings are read from, in increasing priority: the user's config
//! directory (`nuggets.toml`), the project's `Cargo.toml` under
//! `[package.metadata.nuggets]`, a project-local `.nuggets.toml`, and a
//! project-local `nuggets.toml`.

use std::fs;
use std::path::Path;

use camino::Utf8PathBuf;
use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Cache-key prefix used when the configuration does not set one.
pub const DEFAULT_CACHE_PREFIX: &str = "nuggets:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
    #[error("Failed to read Cargo.toml")]
    ManifestIo(#[from] std::io::Error),
    #[error("Failed to parse Cargo.toml TOML")]
    ManifestParse(#[from] toml::de::Error),
    #[error("Failed to serialize extracted manifest data")]
    ManifestSerialize(#[from] toml::ser::Error),
}

/// Settings consumed by the nugget engine.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    cache_prefix: String,
    template_dirs: Vec<Utf8PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            template_dirs: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings for the project rooted at `project_root`.
    pub fn new(project_root: &Path) -> Result<Self, ConfigError> {
        let user_config_file = directories::ProjectDirs::from("com.github", "nuggets", "nuggets")
            .map(|proj_dirs| proj_dirs.config_dir().join("nuggets.toml"));

        Self::load_from_paths(project_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        project_root: &Path,
        user_config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let manifest_path = project_root.join("Cargo.toml");
        if manifest_path.exists() {
            let content = fs::read_to_string(&manifest_path)?;
            let manifest: toml::Value = toml::from_str(&content)?;

            let table_path = ["package", "metadata", "nuggets"];
            let metadata = table_path
                .iter()
                .try_fold(&manifest, |value, &key| value.get(key));

            if let Some(table) = metadata.and_then(toml::Value::as_table) {
                let metadata_toml = toml::to_string(table)?;
                builder = builder.add_source(File::from_str(&metadata_toml, FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            File::from(project_root.join(".nuggets.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join("nuggets.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        let settings = builder.build()?.try_deserialize()?;
        debug!(?settings, "loaded nugget settings");
        Ok(settings)
    }

    /// Prefix prepended to the normalized key when forming a cache key.
    #[must_use]
    pub fn cache_prefix(&self) -> &str {
        &self.cache_prefix
    }

    /// Directories probed, in order, when resolving template names on disk.
    #[must_use]
    pub fn template_dirs(&self) -> &[Utf8PathBuf] {
        &self.template_dirs
    }

    /// Replace the cache-key prefix; mainly for programmatic setup in tests
    /// and embedding applications.
    #[must_use]
    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    /// Append a template directory.
    #[must_use]
    pub fn with_template_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.template_dirs.push(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn settings(prefix: &str, dirs: &[&str]) -> Settings {
        let mut settings = Settings::default().with_cache_prefix(prefix);
        for dir in dirs {
            settings = settings.with_template_dir(*dir);
        }
        settings
    }

    mod defaults {
        use super::*;

        #[test]
        fn test_load_no_files() {
            let dir = tempdir().unwrap();
            let loaded = Settings::new(dir.path()).unwrap();
            assert_eq!(loaded, settings(DEFAULT_CACHE_PREFIX, &[]));
        }

        #[test]
        fn test_default_prefix() {
            assert_eq!(Settings::default().cache_prefix(), "nuggets:");
        }
    }

    mod project_files {
        use super::*;

        #[test]
        fn test_load_nuggets_toml_only() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("nuggets.toml"), "cache_prefix = \"site:\"").unwrap();
            let loaded = Settings::new(dir.path()).unwrap();
            assert_eq!(loaded, settings("site:", &[]));
        }

        #[test]
        fn test_load_dot_nuggets_toml_only() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join(".nuggets.toml"), "cache_prefix = \"site:\"").unwrap();
            let loaded = Settings::new(dir.path()).unwrap();
            assert_eq!(loaded, settings("site:", &[]));
        }

        #[test]
        fn test_load_manifest_metadata_only() {
            let dir = tempdir().unwrap();
            let content = "[package]\nname = \"demo\"\n\n[package.metadata.nuggets]\ncache_prefix = \"site:\"\ntemplate_dirs = [\"templates\"]\n";
            fs::write(dir.path().join("Cargo.toml"), content).unwrap();
            let loaded = Settings::new(dir.path()).unwrap();
            assert_eq!(loaded, settings("site:", &["templates"]));
        }

        #[test]
        fn test_manifest_without_metadata_table() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"demo\"\n").unwrap();
            let loaded = Settings::new(dir.path()).unwrap();
            assert_eq!(loaded, Settings::default());
        }

        #[test]
        fn test_template_dirs_keep_order() {
            let dir = tempdir().unwrap();
            fs::write(
                dir.path().join("nuggets.toml"),
                "template_dirs = [\"themes/override\", \"templates\"]",
            )
            .unwrap();
            let loaded = Settings::new(dir.path()).unwrap();
            assert_eq!(
                loaded.template_dirs(),
                &[
                    Utf8PathBuf::from("themes/override"),
                    Utf8PathBuf::from("templates")
                ]
            );
        }
    }

    mod priority {
        use super::*;

        #[test]
        fn test_nuggets_toml_overrides_dot_nuggets_toml() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join(".nuggets.toml"), "cache_prefix = \"dot:\"").unwrap();
            fs::write(dir.path().join("nuggets.toml"), "cache_prefix = \"plain:\"").unwrap();
            let loaded = Settings::new(dir.path()).unwrap();
            assert_eq!(loaded.cache_prefix(), "plain:");
        }

        #[test]
        fn test_dot_nuggets_toml_overrides_manifest() {
            let dir = tempdir().unwrap();
            let manifest = "[package.metadata.nuggets]\ncache_prefix = \"manifest:\"\n";
            fs::write(dir.path().join("Cargo.toml"), manifest).unwrap();
            fs::write(dir.path().join(".nuggets.toml"), "cache_prefix = \"dot:\"").unwrap();
            let loaded = Settings::new(dir.path()).unwrap();
            assert_eq!(loaded.cache_prefix(), "dot:");
        }

        #[test]
        fn test_project_overrides_user() {
            let user_dir = tempdir().unwrap();
            let project_dir = tempdir().unwrap();
            let user_conf_path = user_dir.path().join("nuggets.toml");
            fs::write(&user_conf_path, "cache_prefix = \"user:\"").unwrap();
            fs::write(project_dir.path().join("nuggets.toml"), "cache_prefix = \"project:\"")
                .unwrap();

            let loaded =
                Settings::load_from_paths(project_dir.path(), Some(&user_conf_path)).unwrap();
            assert_eq!(loaded.cache_prefix(), "project:");
        }

        #[test]
        fn test_unset_fields_fall_through_layers() {
            let user_dir = tempdir().unwrap();
            let project_dir = tempdir().unwrap();
            let user_conf_path = user_dir.path().join("nuggets.toml");
            fs::write(&user_conf_path, "template_dirs = [\"user-templates\"]").unwrap();
            fs::write(project_dir.path().join("nuggets.toml"), "cache_prefix = \"project:\"")
                .unwrap();

            let loaded =
                Settings::load_from_paths(project_dir.path(), Some(&user_conf_path)).unwrap();
            assert_eq!(loaded, settings("project:", &["user-templates"]));
        }
    }

    mod user_config {
        use super::*;

        #[test]
        fn test_load_user_config_only() {
            let user_dir = tempdir().unwrap();
            let project_dir = tempdir().unwrap();
            let user_conf_path = user_dir.path().join("nuggets.toml");
            fs::write(&user_conf_path, "cache_prefix = \"user:\"").unwrap();

            let loaded =
                Settings::load_from_paths(project_dir.path(), Some(&user_conf_path)).unwrap();
            assert_eq!(loaded.cache_prefix(), "user:");
        }

        #[test]
        fn test_missing_user_config_file() {
            let user_dir = tempdir().unwrap();
            let project_dir = tempdir().unwrap();
            let user_conf_path = user_dir.path().join("nuggets.toml");

            let loaded =
                Settings::load_from_paths(project_dir.path(), Some(&user_conf_path)).unwrap();
            assert_eq!(loaded, Settings::default());
        }

        #[test]
        fn test_user_config_path_not_provided() {
            let project_dir = tempdir().unwrap();
            fs::write(project_dir.path().join("nuggets.toml"), "cache_prefix = \"p:\"").unwrap();

            let loaded = Settings::load_from_paths(project_dir.path(), None).unwrap();
            assert_eq!(loaded.cache_prefix(), "p:");
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn test_invalid_toml_content() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("nuggets.toml"), "cache_prefix = [not toml").unwrap();
            let result = Settings::new(dir.path());
            assert!(matches!(result, Err(ConfigError::Config(_))));
        }

        #[test]
        fn test_invalid_manifest_toml() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("Cargo.toml"), "[package\nbroken").unwrap();
            let result = Settings::new(dir.path());
            assert!(matches!(result, Err(ConfigError::ManifestParse(_))));
        }

        #[test]
        fn test_wrong_field_type() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("nuggets.toml"), "template_dirs = \"not-a-list\"").unwrap();
            let result = Settings::new(dir.path());
            assert!(matches!(result, Err(ConfigError::Config(_))));
        }
    }
}
