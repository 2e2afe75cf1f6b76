//! Backup naming and archive round trips through `tar`.

use crate::config::Config;
use crate::error::Result;
use crate::external;
use chrono::{DateTime, Local, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of backup archive names.
pub const BACKUP_PREFIX: &str = "skm";

/// Extension of backup archives.
pub const BACKUP_EXTENSION: &str = "tar.gz";

/// Timestamp layout embedded in backup names (`YYYYMMDDHHMMSS`).
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Program used to create and extract archives.
const ARCHIVE_PROGRAM: &str = "tar";

/// Name of a backup taken at `time`, e.g. `skm-20240115093000.tar.gz`.
///
/// # Example
///
/// ```
/// use chrono::{Local, TimeZone};
/// use skm::backup::backup_file_name;
///
/// let time = Local.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
/// assert_eq!(backup_file_name(&time), "skm-20240115093000.tar.gz");
/// ```
pub fn backup_file_name<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}-{}.{}",
        BACKUP_PREFIX,
        time.format(TIMESTAMP_FORMAT),
        BACKUP_EXTENSION
    )
}

/// Name of a backup taken now, in local time.
pub fn backup_file_name_now() -> String {
    backup_file_name(&Local::now())
}

/// Archive the whole key store into `output_dir`, returning the archive path.
pub fn backup_store(config: &Config, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let archive = output_dir.join(backup_file_name_now());
    let archive_arg = archive.to_string_lossy().into_owned();
    let store_arg = config.store_path.to_string_lossy().into_owned();

    external::run(
        None,
        ARCHIVE_PROGRAM,
        &["-czvf", archive_arg.as_str(), "-C", store_arg.as_str(), "."],
    )?;

    info!(archive = %archive.display(), "key store backed up");
    Ok(archive)
}

/// Extract `archive` into the key store, creating the store if needed.
pub fn restore_store(config: &Config, archive: &Path) -> Result<()> {
    fs::create_dir_all(&config.store_path)?;
    let archive_arg = archive.to_string_lossy().into_owned();
    let store_arg = config.store_path.to_string_lossy().into_owned();

    external::run(
        None,
        ARCHIVE_PROGRAM,
        &["-xzvf", archive_arg.as_str(), "-C", store_arg.as_str()],
    )?;

    info!(archive = %archive.display(), "key store restored");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_backup_file_name_fixed_time() {
        let time = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(backup_file_name(&time), "skm-20231231235958.tar.gz");
    }

    #[test]
    fn test_backup_file_name_zero_padding() {
        let time = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        assert_eq!(backup_file_name(&time), "skm-20240203040506.tar.gz");
    }

    #[test]
    fn test_backup_file_name_now_shape() {
        let name = backup_file_name_now();
        let stamp = name
            .strip_prefix("skm-")
            .and_then(|rest| rest.strip_suffix(".tar.gz"))
            .unwrap();

        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }
}
