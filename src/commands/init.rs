use crate::commands::Out;
use crate::{Config, Result};
use std::path::{Path, PathBuf};

/// Creates the data directory and:
/// - Creates an initial `config.json` file
/// - Creates the exports directory
/// - Initializes the SQLite database
///
/// # Arguments
/// - `finance_home` - The directory that will be the root of data directory, e.g. `$HOME/finance`
/// - `exports_dir` - Where report workbooks are written, if not `$FINANCE_HOME/exports`
///
/// # Errors
/// - Returns an error if any file operations fail or if the directory is already initialized.
pub async fn init(finance_home: &Path, exports_dir: Option<&Path>) -> Result<Out<PathBuf>> {
    let config = Config::create(finance_home, exports_dir).await?;
    Ok(Out::new(
        format!(
            "Successfully created the finance directory at {}",
            config.root().display()
        ),
        config.exports().to_path_buf(),
    ))
}
