use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How long a banner message stays visible, in milliseconds.
pub const MESSAGE_TIMEOUT_MS: u32 = 5_000;

pub const GENERIC_ERROR: &str = "An error occurred";
pub const LOAD_FAILURE: &str = "Failed to load activities. Please try again later.";
pub const MISSING_SIGNUP_FIELDS: &str = "Please select an activity and enter an email.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schedule: String,
    pub max_participants: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub participants: Vec<String>,
}

// Missing and null fields both decode to the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Activity {
    /// Remaining capacity. Negative when the server reports more participants than seats.
    pub fn spots_left(&self) -> i64 {
        i64::from(self.max_participants) - self.participants.len() as i64
    }
}

/// Every activity the server knows about, keyed by name.
pub type Catalog = BTreeMap<String, Activity>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Sports,
    Academic,
    Arts,
    Other,
}

/// Known activity names and the category each one belongs to. Anything missing is `Other`.
const CATEGORY_TABLE: &[(&str, Category)] = &[
    ("Soccer Team", Category::Sports),
    ("Basketball Team", Category::Sports),
    ("Gym Class", Category::Sports),
    ("Programming Class", Category::Academic),
    ("Math Club", Category::Academic),
    ("Debate Team", Category::Academic),
    ("Chess Club", Category::Academic),
    ("Art Club", Category::Arts),
    ("Drama Club", Category::Arts),
];

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Sports,
        Category::Academic,
        Category::Arts,
        Category::Other,
    ];

    pub fn for_activity(name: &str) -> Category {
        CATEGORY_TABLE
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, category)| *category)
            .unwrap_or(Category::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Sports => "Sports",
            Category::Academic => "Academic",
            Category::Arts => "Arts",
            Category::Other => "Other",
        }
    }

    /// Parses a category `<select>` value. The empty value (and anything unknown) means "no
    /// filter".
    pub fn from_value(value: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortMode {
    /// Catalog order.
    #[default]
    Default,
    Name,
    Spots,
}

impl SortMode {
    pub fn from_value(value: &str) -> SortMode {
        match value {
            "name" => SortMode::Name,
            "spots" => SortMode::Spots,
            _ => SortMode::Default,
        }
    }

    pub fn as_value(self) -> &'static str {
        match self {
            SortMode::Default => "",
            SortMode::Name => "name",
            SortMode::Spots => "spots",
        }
    }
}

/// A mutating request the board can send.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Signup,
    Unregister,
}

impl Action {
    pub fn network_failure_text(self) -> &'static str {
        match self {
            Action::Signup => "Failed to sign up. Please try again.",
            Action::Unregister => "Failed to unregister. Please try again.",
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Action::Signup => "signing up",
            Action::Unregister => "unregistering",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    pub fn class(self) -> &'static str {
        match self {
            BannerKind::Success => "success",
            BannerKind::Error => "error",
        }
    }
}

/// The message banner above the signup form.
///
/// Every `show` bumps a generation counter and returns it. The auto-hide timer hands that
/// generation back to `expire`, which only hides the banner if nothing newer has been shown in the
/// meantime. A second message therefore cancels the first message's timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    kind: BannerKind,
    text: String,
    visible: bool,
    generation: u64,
}

impl Default for Banner {
    fn default() -> Self {
        Banner {
            kind: BannerKind::Success,
            text: String::new(),
            visible: false,
            generation: 0,
        }
    }
}

impl Banner {
    pub fn show(&mut self, kind: BannerKind, text: impl Into<String>) -> u64 {
        self.kind = kind;
        self.text = text.into();
        self.visible = true;
        self.generation += 1;
        self.generation
    }

    /// Hides the banner if `generation` is still the latest one. Returns whether it was hidden.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.visible {
            return false;
        }
        self.visible = false;
        true
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn kind(&self) -> BannerKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text is kept while hidden, so the class keeps its kind and gains `hidden`.
    pub fn css_class(&self) -> String {
        if self.generation == 0 {
            "hidden".to_string()
        } else if self.visible {
            self.kind.class().to_string()
        } else {
            format!("{} hidden", self.kind.class())
        }
    }
}
