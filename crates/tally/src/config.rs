//! Default on-disk locations for the master file.
//!
//! Nothing here touches the filesystem; directory creation happens in
//! the storage layer on first save.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the application directory.
pub const DATA_DIR_ENV: &str = "TALUS_TALLY_DATA_DIR";

/// Directory under the home directory used when no override is set.
pub const DEFAULT_DIR_NAME: &str = ".talus_tally";

/// File name of the master project database.
pub const DATA_FILE_NAME: &str = "talus_master.json";

/// Application directory: the `TALUS_TALLY_DATA_DIR` override when
/// set and non-empty, otherwise `~/.talus_tally`, falling back to a
/// relative path when no home directory can be resolved.
pub fn base_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir().map_or_else(
        || PathBuf::from(DEFAULT_DIR_NAME),
        |home| home.join(DEFAULT_DIR_NAME),
    )
}

/// Directory holding the master file and its `backups` folder.
pub fn data_dir() -> PathBuf {
    base_dir().join("data")
}

/// Full path of the master project file.
pub fn data_file_path() -> PathBuf {
    data_dir().join(DATA_FILE_NAME)
}
