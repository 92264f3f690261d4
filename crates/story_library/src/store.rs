use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoryLibraryError;
use crate::schema::{SavedStory, StoryDraft, RECORD_VERSION};

/// Append-only JSONL file of saved stories, oldest first.
pub struct StoryLibrary {
    path: PathBuf,
    file: File,
    stories: Vec<SavedStory>,
    index_by_id: HashMap<String, usize>,
}

impl StoryLibrary {
    /// Open `path`, creating it (and its parent directory) when missing.
    pub fn open_or_create(path: &Path) -> Result<Self, StoryLibraryError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                StoryLibraryError::io("creating library directory", parent, source)
            })?;
        }
        if !path.exists() {
            File::create(path)
                .map_err(|source| StoryLibraryError::io("creating library file", path, source))?;
        }
        Self::open(path)
    }

    pub fn open(path: &Path) -> Result<Self, StoryLibraryError> {
        let path = path.to_path_buf();
        let read_file = File::open(&path)
            .map_err(|source| StoryLibraryError::io("opening library file", &path, source))?;
        let reader = BufReader::new(read_file);

        let mut stories = Vec::new();
        let mut index_by_id = HashMap::new();

        for (line_index, line_result) in reader.lines().enumerate() {
            let line_number = line_index + 1;
            let line = line_result
                .map_err(|source| StoryLibraryError::io_line(&path, line_number, source))?;
            if line.trim().is_empty() {
                continue;
            }

            let story = parse_json_line(&path, line_number, &line)?;
            validate_story_line(&path, line_number, &story)?;
            if index_by_id.contains_key(&story.id) {
                return Err(StoryLibraryError::DuplicateStoryId {
                    path,
                    line: line_number,
                    id: story.id,
                });
            }

            index_by_id.insert(story.id.clone(), stories.len());
            stories.push(story);
        }

        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|source| StoryLibraryError::io("opening library file for append", &path, source))?;

        debug!(path = %path.display(), stories = stories.len(), "story library opened");
        Ok(Self {
            path,
            file,
            stories,
            index_by_id,
        })
    }

    /// Assign an id and timestamp to `draft` and append it as one line.
    pub fn append(&mut self, draft: StoryDraft) -> Result<SavedStory, StoryLibraryError> {
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(StoryLibraryError::ClockFormat)?;
        let story = SavedStory::v1(Uuid::new_v4().to_string(), created_at, draft);

        let mut line = serde_json::to_string(&story)
            .map_err(|source| StoryLibraryError::json_serialize(&self.path, source))?;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|source| StoryLibraryError::io("appending story", &self.path, source))?;

        self.index_by_id.insert(story.id.clone(), self.stories.len());
        self.stories.push(story.clone());
        debug!(id = %story.id, "story saved");
        Ok(story)
    }

    /// Saved stories, newest last.
    #[must_use]
    pub fn stories(&self) -> &[SavedStory] {
        &self.stories
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SavedStory> {
        self.index_by_id.get(id).map(|index| &self.stories[*index])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_json_line(
    path: &Path,
    line_number: usize,
    line: &str,
) -> Result<SavedStory, StoryLibraryError> {
    serde_json::from_str::<SavedStory>(line)
        .map_err(|source| StoryLibraryError::json_line(path, line_number, source))
}

fn validate_story_line(
    path: &Path,
    line_number: usize,
    story: &SavedStory,
) -> Result<(), StoryLibraryError> {
    if story.version != RECORD_VERSION {
        return Err(StoryLibraryError::UnsupportedVersion {
            path: path.to_path_buf(),
            line: line_number,
            found: story.version,
        });
    }

    if OffsetDateTime::parse(&story.created_at, &Rfc3339).is_err() {
        return Err(StoryLibraryError::InvalidTimestamp {
            path: path.to_path_buf(),
            line: line_number,
            field: "created_at",
            value: story.created_at.clone(),
        });
    }

    Ok(())
}
