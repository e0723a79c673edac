//! Volume scanning and user-profile detection for the interactive prompt.
//!
//! A user profile is a directory under a `Users`-style folder that contains
//! a `Desktop` subdirectory. Detection is best-effort: unreadable volumes or
//! folders are silently skipped, exactly like a drive that is not mounted.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The user-profile directories detected across all scanned volumes.
#[derive(Debug, Default)]
pub struct UserDirectories {
    dirs: Vec<PathBuf>,
}

impl UserDirectories {
    /// Scan one volume root for user profiles.
    pub fn parse(&mut self, volume: &Path) {
        if let Some(users_folder) = find_child_dir(volume, "Users") {
            self.parse_users_folder(&users_folder);
        }
    }

    /// Scan a folder whose immediate children are candidate profiles
    /// (`/home` on Linux, `Users` elsewhere).
    pub fn parse_users_folder(&mut self, folder: &Path) {
        let Ok(entries) = fs::read_dir(folder) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && find_child_dir(&path, "Desktop").is_some() {
                self.dirs.push(path);
            }
        }
    }

    /// Profile at index `id`, if detected.
    pub fn get(&self, id: usize) -> Option<&PathBuf> {
        self.dirs.get(id)
    }

    /// Number of detected profiles.
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Whether no profiles were detected.
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Resolve a comma-separated id list (`"0,2"`) to profile paths.
    pub fn resolve_selection(&self, input: &str) -> Result<Vec<PathBuf>, String> {
        let mut selected = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            let id: usize = part
                .parse()
                .map_err(|_| format!("invalid user id '{part}'"))?;
            let dir = self
                .get(id)
                .ok_or_else(|| format!("no detected user with id {id}"))?;
            selected.push(dir.clone());
        }
        if selected.is_empty() {
            return Err("user id(s) cannot be blank".to_owned());
        }
        Ok(selected)
    }
}

impl fmt::Display for UserDirectories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nID | Detected User Path")?;
        writeln!(f, "----------------------------------")?;
        for (id, dir) in self.dirs.iter().enumerate() {
            writeln!(f, "{id}) {}", dir.display())?;
        }
        writeln!(f, "\n(NOTE: Separate multiple users by comma ',' ex: 0,1,2)")
    }
}

/// Case-insensitive lookup of a direct subdirectory by name.
fn find_child_dir(parent: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(parent).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir()
            && entry
                .file_name()
                .to_string_lossy()
                .eq_ignore_ascii_case(name)
        {
            return Some(path);
        }
    }
    None
}

/// Volume roots worth scanning on this platform.
pub fn candidate_volumes() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let mut volumes = vec![PathBuf::from("/")];
        if let Ok(entries) = fs::read_dir("/Volumes") {
            volumes.extend(entries.flatten().map(|e| e.path()));
        }
        volumes
    }
    #[cfg(windows)]
    {
        ('A'..='Z')
            .map(|letter| PathBuf::from(format!("{letter}:\\")))
            .filter(|drive| drive.exists())
            .collect()
    }
    #[cfg(not(any(target_os = "macos", windows)))]
    {
        vec![PathBuf::from("/")]
    }
}

/// Detect user profiles across every candidate volume.
pub fn detect_users() -> UserDirectories {
    let mut users = UserDirectories::default();
    for volume in candidate_volumes() {
        users.parse(&volume);
    }
    #[cfg(not(any(target_os = "macos", windows)))]
    users.parse_users_folder(Path::new("/home"));
    users
}
