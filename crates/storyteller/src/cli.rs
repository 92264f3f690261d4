use std::path::PathBuf;

use clap::Parser;
use story_api::{Character, CharacterSubtype, ChildAge, Lesson, Place, StoryLength, StoryRequestBuilder};

/// Generate a bedtime story and stream it to the terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "storyteller", version)]
pub struct Cli {
    /// Age bracket of the child: 1-3, 3-5, 5-7 or 7-9.
    #[arg(long, default_value = "3-5")]
    pub age: ChildAge,

    /// Story length: short, medium or long.
    #[arg(long, default_value = "short")]
    pub duration: StoryLength,

    #[arg(long, default_value = "woods")]
    pub place: Place,

    #[arg(long, default_value = "friendship")]
    pub lesson: Lesson,

    /// Character category; repeat or comma-separate for several.
    #[arg(long = "character", short = 'c', value_delimiter = ',', default_value = "animals")]
    pub characters: Vec<Character>,

    /// Specific animal, e.g. dog or elephant. Requires the animals category.
    #[arg(long)]
    pub animal: Option<CharacterSubtype>,

    #[arg(long, requires = "animal")]
    pub animal_name: Option<String>,

    /// Specific person, e.g. aunt or grandpa. Requires the people category.
    #[arg(long)]
    pub person: Option<CharacterSubtype>,

    #[arg(long, requires = "person")]
    pub person_name: Option<String>,

    #[arg(long, default_value = story_api::DEFAULT_LANGUAGE)]
    pub language: String,

    /// ISO country code sent with the request.
    #[arg(long)]
    pub country: Option<String>,

    /// Override the stored anonymous user id.
    #[arg(long)]
    pub user_id: Option<String>,

    /// Story backend base URL. Falls back to STORY_STREAM_BASE_URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Milliseconds between screen updates. Falls back to STORY_STREAM_FLUSH_MS.
    #[arg(long)]
    pub flush_ms: Option<u64>,

    /// Save the finished story to the library.
    #[arg(long, default_value_t = false)]
    pub save: bool,

    /// Library file. Falls back to STORY_STREAM_LIBRARY_PATH, then ~/.storyteller/stories.jsonl.
    #[arg(long, value_name = "FILE")]
    pub library: Option<PathBuf>,

    /// Use the subscribed story allowance.
    #[arg(long, default_value_t = false)]
    pub subscribed: bool,

    /// List saved stories and exit.
    #[arg(long, default_value_t = false, conflicts_with = "show")]
    pub list: bool,

    /// Print a saved story by id and exit.
    #[arg(long, value_name = "ID")]
    pub show: Option<String>,
}

impl Cli {
    /// Request options from the flags. Identity fields are filled in later.
    pub fn request_builder(&self) -> StoryRequestBuilder {
        let mut builder = story_api::StoryRequest::builder()
            .child_age(self.age)
            .length(self.duration)
            .place(self.place)
            .lesson(self.lesson)
            .characters(self.characters.iter().copied());
        if let Some(animal) = self.animal {
            builder = builder.animal(animal, self.animal_name.clone());
        }
        if let Some(person) = self.person {
            builder = builder.person(person, self.person_name.clone());
        }
        builder
    }
}
