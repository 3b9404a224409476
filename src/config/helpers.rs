use std::env;
use std::path::PathBuf;

use color_eyre::eyre::OptionExt;
use directories::ProjectDirs;

use super::{CONFIG_DIR_ENV, CONFIG_FILE_NAME};
use crate::FormResult;

pub fn get_config_directory() -> FormResult<PathBuf> {
    // First check if FORMSCROLL_CONFIG_DIR is set
    if let Ok(value) = env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(value));
    }

    // If not, use the platform config dir
    let config_dir = ProjectDirs::from("", "", "formscroll")
        .ok_or_eyre("Could not determine config directory.")?
        .config_dir()
        .to_path_buf();

    Ok(config_dir)
}

pub fn get_config_file_path() -> FormResult<PathBuf> {
    get_config_directory().map(|config_dir| config_dir.join(CONFIG_FILE_NAME))
}
