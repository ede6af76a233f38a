//! Configuration file handling for the finance tracker.
//!
//! The configuration file is stored at `$FINANCE_HOME/config.json`. It names the directory where
//! report workbooks are written and, optionally, the user id the CLI acts for when none is given.

use crate::db::Db;
use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "finance-tracker";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const FINANCE_SQLITE: &str = "finance.sqlite";
const EXPORTS: &str = "exports";

/// The `Config` object represents the data directory of the app. You instantiate it by providing
/// the path to `$FINANCE_HOME` and from there it loads `$FINANCE_HOME/config.json` and opens the
/// ledger database.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
    exports: PathBuf,
}

impl Config {
    /// Creates the data directory and:
    /// - Writes an initial `config.json`
    /// - Creates the exports directory
    /// - Initializes the SQLite database
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/finance`
    /// - `exports_dir` - Where report workbooks go. Relative paths are resolved against `dir`.
    ///   Defaults to `$FINANCE_HOME/exports`.
    ///
    /// # Errors
    /// - `Config` if the directory is already initialized or any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, exports_dir: Option<&Path>) -> Result<Self> {
        Self::create_inner(dir.into(), exports_dir)
            .await
            .context("Unable to create the data directory and configs")
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(maybe_relative: PathBuf, exports_dir: Option<&Path>) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the finance home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }

        let config_file = ConfigFile {
            exports_dir: exports_dir.map(Path::to_path_buf),
            ..ConfigFile::default()
        };
        let exports = config_file.exports(&root);
        utils::make_dir(&exports).await?;
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(FINANCE_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        debug!("Created finance home at {}", root.display());
        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
            exports,
        })
    }

    /// This will
    /// - validate that `finance_home` and its config file exist
    /// - load the config file
    /// - open (and if needed migrate) the database
    /// - create the exports directory if it has gone missing
    ///
    /// # Errors
    /// - `Config` if the directory, its config file or its database are missing or invalid.
    pub async fn load(finance_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(finance_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        if !maybe_relative.is_dir() {
            bail!(
                "The finance home directory is missing '{}'. Did you run 'fintrack init'?",
                maybe_relative.display()
            );
        }
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = root.join(FINANCE_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        let exports = config_file.exports(&root);
        utils::make_dir(&exports).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
            exports,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    /// The directory report workbooks are written to.
    pub fn exports(&self) -> &Path {
        &self.exports
    }

    pub fn default_user_id(&self) -> Option<i64> {
        self.config_file.default_user_id
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "finance-tracker",
///   "config_version": 1,
///   "exports_dir": "/home/me/Documents/reports",
///   "default_user_id": 42
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "finance-tracker"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Where report workbooks are written (optional, relative to config.json or absolute)
    /// Defaults to $FINANCE_HOME/exports if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exports_dir: Option<PathBuf>,

    /// The user id used by the CLI when `--user` is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_user_id: Option<i64>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            exports_dir: None,
            default_user_id: None,
        }
    }
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;
        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version <= CONFIG_VERSION,
            "Unsupported config_version {} in {}",
            config.config_version,
            path.display()
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }

    /// Resolves `exports_dir` against `root`, or returns the default location.
    fn exports(&self, root: &Path) -> PathBuf {
        match &self.exports_dir {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join(EXPORTS),
        }
    }
}
