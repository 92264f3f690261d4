use std::path::{Path, PathBuf};

pub const LIBRARY_DIR: &str = ".storyteller";
pub const LIBRARY_FILE: &str = "stories.jsonl";
pub const QUOTA_FILE: &str = "quota.json";
pub const USER_ID_FILE: &str = "user_id";

/// Directory holding the library, quota, and user id under `home`.
#[must_use]
pub fn library_root(home: &Path) -> PathBuf {
    home.join(LIBRARY_DIR)
}

#[must_use]
pub fn library_file(root: &Path) -> PathBuf {
    root.join(LIBRARY_FILE)
}

/// Sibling file next to the library file, e.g. the quota or user id.
#[must_use]
pub fn sibling_file(library_path: &Path, name: &str) -> PathBuf {
    match library_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{library_file, library_root, sibling_file, QUOTA_FILE};

    #[test]
    fn library_lives_under_home() {
        let root = library_root(Path::new("/home/kid"));
        assert_eq!(root, PathBuf::from("/home/kid/.storyteller"));
        assert_eq!(
            library_file(&root),
            PathBuf::from("/home/kid/.storyteller/stories.jsonl")
        );
    }

    #[test]
    fn sibling_of_bare_file_name_is_relative() {
        assert_eq!(
            sibling_file(Path::new("stories.jsonl"), QUOTA_FILE),
            PathBuf::from("quota.json")
        );
        assert_eq!(
            sibling_file(Path::new("/data/stories.jsonl"), QUOTA_FILE),
            PathBuf::from("/data/quota.json")
        );
    }
}
