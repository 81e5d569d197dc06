//! Config validation utilities.

use std::path::Path;

use galaxy_core::data::GameConfig;

use crate::{Result, ToolError};

/// Load and validate a RON config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation.
pub fn validate_config_file(path: &Path) -> Result<GameConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = GameConfig::from_ron(&text)?;
    tracing::debug!(path = %path.display(), "Config parsed");
    Ok(config)
}

/// The default tables as pretty RON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn dump_default_config() -> Result<String> {
    Ok(GameConfig::default().to_ron_pretty()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dumped_config_validates() {
        let text = dump_default_config().unwrap();
        let path = std::env::temp_dir().join(format!("galaxy-config-{}.ron", std::process::id()));
        std::fs::write(&path, text).unwrap();

        let config = validate_config_file(&path).unwrap();
        assert_eq!(config, GameConfig::default());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = validate_config_file(Path::new("/definitely/not/here.ron")).unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
    }
}
