use std::fs;
use std::path::Path;

use tracing::debug;
use uuid::Uuid;

use crate::error::StoryLibraryError;

/// Read the stored user id, generating and persisting a UUID v4 on first use.
pub fn load_or_create_user_id(path: &Path) -> Result<String, StoryLibraryError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let value = contents.trim();
            Uuid::parse_str(value)
                .map(|uuid| uuid.to_string())
                .map_err(|_| StoryLibraryError::InvalidUserId {
                    path: path.to_path_buf(),
                    value: value.to_string(),
                })
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            let user_id = Uuid::new_v4().to_string();
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| {
                    StoryLibraryError::io("creating user id directory", parent, source)
                })?;
            }
            fs::write(path, format!("{user_id}\n"))
                .map_err(|source| StoryLibraryError::io("writing user id", path, source))?;
            debug!(path = %path.display(), "generated new user id");
            Ok(user_id)
        }
        Err(source) => Err(StoryLibraryError::io("reading user id", path, source)),
    }
}
