use std::path::PathBuf;

use color_eyre::eyre::WrapErr;
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::FormConfig;
use crate::FormResult;

/// Read a value from a YAML file.
async fn read<T: for<'de> Deserialize<'de>>(path: impl Into<PathBuf>) -> FormResult<T> {
    let path = path.into();
    let mut file = File::open(&path).await?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).await?;
    let result = serde_yaml::from_str(&contents)
        .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
    Ok(result)
}

/// Reads the form config, falling back to defaults when the file is missing.
pub async fn read_config(path: impl Into<PathBuf>) -> FormResult<FormConfig> {
    let path = path.into();
    match read(&path).await {
        Ok(config) => Ok(config),
        Err(e)
            if e.downcast_ref::<std::io::Error>()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound) =>
        {
            debug!("No config at {}, using defaults", path.display());
            Ok(FormConfig::default())
        }
        Err(e) => Err(e),
    }
}
