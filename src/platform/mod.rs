use std::path::PathBuf;

pub mod pose;

/// Get the default data directory for the bridge (`~/.pose_bridge`)
pub fn data_directory() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    let mut path = PathBuf::from(home);
    path.push(".pose_bridge");
    path
}
