use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ContentError;
use super::items::{Collaboration, Course, Item, Opening, PhdScholar, Publication, TeamMember};
use crate::error::AppError;

/// Shape version written with every section document.
///
/// Version 0 is the original free-form layout whose items carry no `id`.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// A whole-document content section.
pub trait Section: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    const NAME: SectionName;

    /// Bring a freshly decoded or client-supplied value to the current shape.
    /// Returns whether anything changed.
    fn normalize(&mut self) -> bool;

    /// Every storage key referenced anywhere in the section.
    fn attachment_keys(&self) -> Vec<String>;

    /// Run item validation over every item in the section.
    fn validate(&self) -> Result<(), AppError>;

    /// Decode a stored body written at `version`.
    ///
    /// The flag is set when the decoded section differs from what is stored
    /// (older version, or ids had to be assigned) and should be written back.
    fn decode(version: i32, body: serde_json::Value) -> Result<(Self, bool), ContentError> {
        let section = Self::NAME.as_str();
        if !(0..=CURRENT_SCHEMA_VERSION).contains(&version) {
            return Err(ContentError::UnsupportedVersion { section, version });
        }
        let mut value: Self = serde_json::from_value(body)
            .map_err(|source| ContentError::Malformed { section, source })?;
        let changed = value.normalize();
        Ok((value, changed || version < CURRENT_SCHEMA_VERSION))
    }

    fn encode(&self) -> Result<serde_json::Value, ContentError> {
        serde_json::to_value(self).map_err(|source| ContentError::Encode {
            section: Self::NAME.as_str(),
            source,
        })
    }
}

/// Give every item in the list a distinct id. Missing and repeated ids are
/// replaced; returns whether any id was assigned.
fn ensure_ids<T: Item>(items: &mut [T]) -> bool {
    let mut seen = HashSet::with_capacity(items.len());
    let mut changed = false;
    for item in items {
        if item.id().is_nil() || !seen.insert(item.id()) {
            let id = Uuid::now_v7();
            item.set_id(id);
            seen.insert(id);
            changed = true;
        }
    }
    changed
}

fn validate_all<T: Item>(items: &[T]) -> Result<(), AppError> {
    items.iter().try_for_each(T::validate)
}

fn keys_of<T: Item>(items: &[T]) -> impl Iterator<Item = String> + '_ {
    items.iter().flat_map(T::attachments)
}

/// Logical names of the stored sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionName {
    Research,
    Team,
    Courses,
    Openings,
    Phd,
}

impl SectionName {
    pub const ALL: [SectionName; 5] = [
        Self::Research,
        Self::Team,
        Self::Courses,
        Self::Openings,
        Self::Phd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Team => "team",
            Self::Courses => "courses",
            Self::Openings => "openings",
            Self::Phd => "phd",
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("Unknown section '{s}'"))
    }
}

/// Publications and collaborations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchSection {
    #[serde(default)]
    pub publications: Vec<Publication>,
    #[serde(default)]
    pub collaborations: Vec<Collaboration>,
}

impl Section for ResearchSection {
    const NAME: SectionName = SectionName::Research;

    fn normalize(&mut self) -> bool {
        ensure_ids(&mut self.publications) | ensure_ids(&mut self.collaborations)
    }

    fn attachment_keys(&self) -> Vec<String> {
        keys_of(&self.publications).collect()
    }

    fn validate(&self) -> Result<(), AppError> {
        validate_all(&self.publications)?;
        validate_all(&self.collaborations)
    }
}

/// Team members grouped by category name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamSection {
    pub categories: BTreeMap<String, Vec<TeamMember>>,
}

impl Section for TeamSection {
    const NAME: SectionName = SectionName::Team;

    fn normalize(&mut self) -> bool {
        self.categories
            .values_mut()
            .fold(false, |changed, members| ensure_ids(members) | changed)
    }

    fn attachment_keys(&self) -> Vec<String> {
        self.categories
            .values()
            .flat_map(|members| keys_of(members))
            .collect()
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.categories.keys().any(|c| c.trim().is_empty()) {
            return Err(AppError::Validation("Category must not be empty".into()));
        }
        self.categories
            .values()
            .try_for_each(|members| validate_all(members))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoursesSection {
    #[serde(default)]
    pub courses: Vec<Course>,
}

impl Section for CoursesSection {
    const NAME: SectionName = SectionName::Courses;

    fn normalize(&mut self) -> bool {
        ensure_ids(&mut self.courses)
    }

    fn attachment_keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn validate(&self) -> Result<(), AppError> {
        validate_all(&self.courses)
    }
}

/// Fixed set of opening categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OpeningCategory {
    #[serde(rename = "PhD Positions")]
    PhdPositions,
    #[serde(rename = "Research Assistant")]
    ResearchAssistant,
    #[serde(rename = "B.Tech Projects")]
    BtechProjects,
}

impl OpeningCategory {
    pub const ALL: [OpeningCategory; 3] = [
        Self::PhdPositions,
        Self::ResearchAssistant,
        Self::BtechProjects,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhdPositions => "PhD Positions",
            Self::ResearchAssistant => "Research Assistant",
            Self::BtechProjects => "B.Tech Projects",
        }
    }
}

impl FromStr for OpeningCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown opening category '{s}'; expected one of: PhD Positions, Research Assistant, B.Tech Projects"
                )
            })
    }
}

/// Openings grouped by category; every category is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpeningsSection {
    pub categories: BTreeMap<OpeningCategory, Vec<Opening>>,
}

impl Default for OpeningsSection {
    fn default() -> Self {
        Self {
            categories: OpeningCategory::ALL
                .into_iter()
                .map(|c| (c, Vec::new()))
                .collect(),
        }
    }
}

impl Section for OpeningsSection {
    const NAME: SectionName = SectionName::Openings;

    fn normalize(&mut self) -> bool {
        let mut changed = false;
        for category in OpeningCategory::ALL {
            if !self.categories.contains_key(&category) {
                self.categories.insert(category, Vec::new());
                changed = true;
            }
        }
        self.categories
            .values_mut()
            .fold(changed, |changed, openings| ensure_ids(openings) | changed)
    }

    fn attachment_keys(&self) -> Vec<String> {
        self.categories
            .values()
            .flat_map(|openings| keys_of(openings))
            .collect()
    }

    fn validate(&self) -> Result<(), AppError> {
        self.categories
            .values()
            .try_for_each(|openings| validate_all(openings))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhdSection {
    #[serde(default)]
    pub scholars: Vec<PhdScholar>,
}

impl Section for PhdSection {
    const NAME: SectionName = SectionName::Phd;

    fn normalize(&mut self) -> bool {
        ensure_ids(&mut self.scholars)
    }

    fn attachment_keys(&self) -> Vec<String> {
        keys_of(&self.scholars).collect()
    }

    fn validate(&self) -> Result<(), AppError> {
        validate_all(&self.scholars)
    }
}
