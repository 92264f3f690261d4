use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Declares a closed set of request options together with their wire strings.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                Some(match value {
                    $($wire => Self::$variant,)+
                    _ => return None,
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::parse(value.trim()).ok_or_else(|| {
                    let expected = Self::ALL
                        .iter()
                        .map(|option| option.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("unknown {} '{value}' (expected one of: {expected})", stringify!($name))
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Age bracket of the listening child, sent as its range label.
    pub enum ChildAge {
        OneToThree => "1-3",
        ThreeToFive => "3-5",
        FiveToSeven => "5-7",
        SevenToNine => "7-9",
    }
}

wire_enum! {
    /// Story duration bucket.
    pub enum StoryLength {
        Short => "short",
        Medium => "medium",
        Long => "long",
    }
}

impl StoryLength {
    /// Approximate reading time in minutes, as shown next to the bucket.
    pub fn reading_minutes(&self) -> &'static str {
        match self {
            Self::Short => "1-3",
            Self::Medium => "3-7",
            Self::Long => "7-10",
        }
    }
}

wire_enum! {
    /// Setting of the story. The backend spells the castle tag `castlle`.
    pub enum Place {
        Mountain => "mountain",
        Castle => "castlle",
        Woods => "woods",
        Sea => "sea",
        River => "river",
        Space => "space",
        House => "house",
        City => "city",
    }
}

wire_enum! {
    /// Protagonist category.
    pub enum Character {
        Superhero => "superhero",
        Animals => "animals",
        People => "people",
        Dragons => "dragons",
        Princess => "princess",
        Kings => "kings",
    }
}

impl Character {
    /// Subtypes that may refine this category; empty for most categories.
    pub fn subtypes(&self) -> Vec<CharacterSubtype> {
        CharacterSubtype::ALL
            .iter()
            .copied()
            .filter(|subtype| subtype.category() == *self)
            .collect()
    }
}

wire_enum! {
    /// Moral lesson. The backend spells quietness `quiteness`.
    pub enum Lesson {
        Respect => "respect",
        Empathy => "empathy",
        Friendship => "friendship",
        Love => "love",
        Sharing => "sharing",
        Brave => "brave",
        Quietness => "quiteness",
        Perseverance => "perseverance",
        Compassion => "compassion",
        Hope => "hope",
        Determination => "determination",
        Patience => "patience",
        Generosity => "generosity",
        Joy => "joy",
    }
}

wire_enum! {
    /// Specific animal or person refining the `animals`/`people` categories.
    pub enum CharacterSubtype {
        Dog => "dog",
        Cat => "cat",
        Frog => "frog",
        Elephant => "elephant",
        Lion => "lion",
        Butterfly => "butterfly",
        Cow => "cow",
        Uncle => "uncle",
        Aunt => "aunt",
        Brother => "brother",
        Sister => "sister",
        CousinBoy => "cousinBoy",
        CousinGirl => "cousinGirl",
        Grandpa => "grandpa",
        Grandma => "grandma",
        Person => "person",
    }
}

impl CharacterSubtype {
    pub fn category(&self) -> Character {
        match self {
            Self::Dog
            | Self::Cat
            | Self::Frog
            | Self::Elephant
            | Self::Lion
            | Self::Butterfly
            | Self::Cow => Character::Animals,
            Self::Uncle
            | Self::Aunt
            | Self::Brother
            | Self::Sister
            | Self::CousinBoy
            | Self::CousinGirl
            | Self::Grandpa
            | Self::Grandma
            | Self::Person => Character::People,
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Self::CousinBoy | Self::CousinGirl => "cousin",
            other => other.as_str(),
        }
    }

    pub fn english_article(&self) -> &'static str {
        match self {
            Self::Uncle | Self::Aunt | Self::Elephant => "an",
            _ => "a",
        }
    }

    /// English phrase handed to the backend, e.g. `a dog called Rex`.
    pub fn describe(&self, name: Option<&str>) -> String {
        match name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => format!(
                "{} {} called {name}",
                self.english_article(),
                self.english_name()
            ),
            None => format!("{} {}", self.english_article(), self.english_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryRequestError {
    #[error("story request is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("story request must select at least one character")]
    NoCharacters,

    #[error("'{subtype}' is not a kind of {expected}")]
    SubtypeCategoryMismatch {
        subtype: CharacterSubtype,
        expected: Character,
    },

    #[error("'{subtype}' requires the '{category}' character to be selected")]
    CategoryNotSelected {
        subtype: CharacterSubtype,
        category: Character,
    },
}

/// Immutable payload for one story generation attempt.
///
/// Built through [`StoryRequest::builder`]; optional fields are omitted from
/// the JSON body when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryRequest {
    #[serde(rename = "age")]
    child_age: ChildAge,
    #[serde(rename = "duration")]
    length: StoryLength,
    place: Place,
    #[serde(serialize_with = "serialize_characters")]
    characters: Vec<Character>,
    lesson: Lesson,
    language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    animal_type: Option<CharacterSubtype>,
    #[serde(skip_serializing_if = "Option::is_none")]
    animal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    person_type: Option<CharacterSubtype>,
    #[serde(skip_serializing_if = "Option::is_none")]
    person_name: Option<String>,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(rename = "countryCode", skip_serializing_if = "Option::is_none")]
    country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    character_name: Option<String>,
}

fn serialize_characters<S: Serializer>(
    characters: &[Character],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let joined = characters
        .iter()
        .map(Character::as_str)
        .collect::<Vec<_>>()
        .join(",");
    serializer.serialize_str(&joined)
}

impl StoryRequest {
    pub fn builder() -> StoryRequestBuilder {
        StoryRequestBuilder::default()
    }

    pub fn child_age(&self) -> ChildAge {
        self.child_age
    }

    pub fn length(&self) -> StoryLength {
        self.length
    }

    pub fn place(&self) -> Place {
        self.place
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn lesson(&self) -> Lesson {
        self.lesson
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn animal(&self) -> Option<(CharacterSubtype, Option<&str>)> {
        self.animal_type
            .map(|subtype| (subtype, self.animal_name.as_deref()))
    }

    pub fn person(&self) -> Option<(CharacterSubtype, Option<&str>)> {
        self.person_type
            .map(|subtype| (subtype, self.person_name.as_deref()))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    /// Combined description of the chosen subtypes, if any.
    pub fn character_name(&self) -> Option<&str> {
        self.character_name.as_deref()
    }
}

pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Clone, Default)]
pub struct StoryRequestBuilder {
    child_age: Option<ChildAge>,
    length: Option<StoryLength>,
    place: Option<Place>,
    characters: Vec<Character>,
    lesson: Option<Lesson>,
    language: Option<String>,
    animal: Option<(CharacterSubtype, Option<String>)>,
    person: Option<(CharacterSubtype, Option<String>)>,
    user_id: Option<String>,
    country_code: Option<String>,
}

impl StoryRequestBuilder {
    pub fn child_age(mut self, child_age: ChildAge) -> Self {
        self.child_age = Some(child_age);
        self
    }

    pub fn length(mut self, length: StoryLength) -> Self {
        self.length = Some(length);
        self
    }

    pub fn place(mut self, place: Place) -> Self {
        self.place = Some(place);
        self
    }

    pub fn lesson(mut self, lesson: Lesson) -> Self {
        self.lesson = Some(lesson);
        self
    }

    /// Adds a character category; repeated selections are kept once.
    pub fn character(mut self, character: Character) -> Self {
        if !self.characters.contains(&character) {
            self.characters.push(character);
        }
        self
    }

    pub fn characters(self, characters: impl IntoIterator<Item = Character>) -> Self {
        characters
            .into_iter()
            .fold(self, |builder, character| builder.character(character))
    }

    pub fn animal(mut self, subtype: CharacterSubtype, name: Option<String>) -> Self {
        self.animal = Some((subtype, name));
        self
    }

    pub fn person(mut self, subtype: CharacterSubtype, name: Option<String>) -> Self {
        self.person = Some((subtype, name));
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }

    pub fn build(self) -> Result<StoryRequest, StoryRequestError> {
        let child_age = self
            .child_age
            .ok_or(StoryRequestError::MissingField("age"))?;
        let length = self
            .length
            .ok_or(StoryRequestError::MissingField("duration"))?;
        let place = self.place.ok_or(StoryRequestError::MissingField("place"))?;
        let lesson = self
            .lesson
            .ok_or(StoryRequestError::MissingField("lesson"))?;
        if self.characters.is_empty() {
            return Err(StoryRequestError::NoCharacters);
        }

        let animal = validate_subtype(self.animal, Character::Animals, &self.characters)?;
        let person = validate_subtype(self.person, Character::People, &self.characters)?;

        let descriptions = [&animal, &person]
            .into_iter()
            .flatten()
            .map(|(subtype, name)| subtype.describe(name.as_deref()))
            .collect::<Vec<_>>();
        let character_name = if descriptions.is_empty() {
            None
        } else {
            Some(descriptions.join(", "))
        };

        let (animal_type, animal_name) = split_subtype(animal);
        let (person_type, person_name) = split_subtype(person);

        Ok(StoryRequest {
            child_age,
            length,
            place,
            characters: self.characters,
            lesson,
            language: self
                .language
                .and_then(non_blank)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            animal_type,
            animal_name,
            person_type,
            person_name,
            user_id: self.user_id.and_then(non_blank),
            country_code: self.country_code.and_then(non_blank),
            character_name,
        })
    }
}

fn validate_subtype(
    selection: Option<(CharacterSubtype, Option<String>)>,
    expected: Character,
    characters: &[Character],
) -> Result<Option<(CharacterSubtype, Option<String>)>, StoryRequestError> {
    let Some((subtype, name)) = selection else {
        return Ok(None);
    };
    if subtype.category() != expected {
        return Err(StoryRequestError::SubtypeCategoryMismatch { subtype, expected });
    }
    if !characters.contains(&expected) {
        return Err(StoryRequestError::CategoryNotSelected {
            subtype,
            category: expected,
        });
    }
    Ok(Some((subtype, name.and_then(non_blank))))
}

fn split_subtype(
    selection: Option<(CharacterSubtype, Option<String>)>,
) -> (Option<CharacterSubtype>, Option<String>) {
    match selection {
        Some((subtype, name)) => (Some(subtype), name),
        None => (None, None),
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{Character, CharacterSubtype, ChildAge, Lesson, Place};

    #[test]
    fn wire_strings_round_trip_through_parse() {
        for age in ChildAge::ALL {
            assert_eq!(ChildAge::parse(age.as_str()), Some(*age));
        }
        assert_eq!(Place::parse("castlle"), Some(Place::Castle));
        assert_eq!(Lesson::parse("quiteness"), Some(Lesson::Quietness));
        assert_eq!(Place::parse("castle"), None);
    }

    #[test]
    fn subtypes_partition_into_animals_and_people() {
        let animals = Character::Animals.subtypes();
        let people = Character::People.subtypes();
        assert_eq!(animals.len(), 7);
        assert_eq!(people.len(), 9);
        assert_eq!(animals.len() + people.len(), CharacterSubtype::ALL.len());
        assert!(Character::Dragons.subtypes().is_empty());
    }

    #[test]
    fn describe_uses_article_and_optional_name() {
        assert_eq!(CharacterSubtype::Elephant.describe(None), "an elephant");
        assert_eq!(
            CharacterSubtype::CousinGirl.describe(Some(" Ana ")),
            "a cousin called Ana"
        );
        assert_eq!(CharacterSubtype::Dog.describe(Some("  ")), "a dog");
    }

    #[test]
    fn from_str_lists_expected_values_on_error() {
        let error = "forest".parse::<Place>().expect_err("unknown place");
        assert!(error.contains("woods"));
        assert!(error.contains("castlle"));
    }
}
