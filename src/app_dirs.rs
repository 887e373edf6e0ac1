use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("wattquiz");
            Some(state_dir.join("duels.db"))
        } else {
            ProjectDirs::from("", "", "wattquiz")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("duels.db"))
        }
    }

    pub fn log_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "wattquiz")
            .map(|proj_dirs| proj_dirs.config_dir().join("log.csv"))
    }
}
