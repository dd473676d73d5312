use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use super::items::{Collaboration, Course, Item, Opening, PhdScholar, Publication, TeamMember};
use super::sections::{
    CoursesSection, OpeningCategory, OpeningsSection, PhdSection, ResearchSection, Section,
    TeamSection,
};
use crate::error::AppError;

/// How a request addresses one item in a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    /// Stable item id.
    Id(Uuid),
    /// Legacy positional index, resolved against the list as it is now.
    Index(usize),
}

impl ItemRef {
    pub fn position<T: Item>(&self, items: &[T]) -> Option<usize> {
        match *self {
            Self::Id(id) => items.iter().position(|item| item.id() == id),
            Self::Index(index) => (index < items.len()).then_some(index),
        }
    }
}

impl FromStr for ItemRef {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = Uuid::parse_str(s) {
            return Ok(Self::Id(id));
        }
        s.parse::<usize>().map(Self::Index).map_err(|_| {
            AppError::Validation(format!(
                "Item reference '{s}' must be an item id or a list index"
            ))
        })
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Index(index) => write!(f, "#{index}"),
        }
    }
}

/// One list of items living inside a section, optionally grouped by category.
pub trait Family: Send + Sync + 'static {
    type Section: Section;
    type Item: Item;

    /// New items go to the front of the list instead of the back.
    const INSERT_AT_HEAD: bool = false;
    /// Folder hint passed to the blob store for this family's uploads.
    const FOLDER_HINT: Option<&'static str> = None;

    /// The list addressed by `group`. With `create`, a missing group is added.
    fn items<'a>(
        section: &'a mut Self::Section,
        group: Option<&str>,
        create: bool,
    ) -> Result<&'a mut Vec<Self::Item>, AppError>;
}

fn require_group(group: Option<&str>) -> Result<&str, AppError> {
    match group.map(str::trim) {
        Some(g) if !g.is_empty() => Ok(g),
        _ => Err(AppError::Validation("Category must not be empty".into())),
    }
}

pub struct Publications;

impl Family for Publications {
    type Section = ResearchSection;
    type Item = Publication;
    const INSERT_AT_HEAD: bool = true;

    fn items<'a>(
        section: &'a mut ResearchSection,
        _group: Option<&str>,
        _create: bool,
    ) -> Result<&'a mut Vec<Publication>, AppError> {
        Ok(&mut section.publications)
    }
}

pub struct Collaborations;

impl Family for Collaborations {
    type Section = ResearchSection;
    type Item = Collaboration;

    fn items<'a>(
        section: &'a mut ResearchSection,
        _group: Option<&str>,
        _create: bool,
    ) -> Result<&'a mut Vec<Collaboration>, AppError> {
        Ok(&mut section.collaborations)
    }
}

pub struct Courses;

impl Family for Courses {
    type Section = CoursesSection;
    type Item = Course;

    fn items<'a>(
        section: &'a mut CoursesSection,
        _group: Option<&str>,
        _create: bool,
    ) -> Result<&'a mut Vec<Course>, AppError> {
        Ok(&mut section.courses)
    }
}

pub struct PhdScholars;

impl Family for PhdScholars {
    type Section = PhdSection;
    type Item = PhdScholar;
    const FOLDER_HINT: Option<&'static str> = Some("team");

    fn items<'a>(
        section: &'a mut PhdSection,
        _group: Option<&str>,
        _create: bool,
    ) -> Result<&'a mut Vec<PhdScholar>, AppError> {
        Ok(&mut section.scholars)
    }
}

pub struct TeamMembers;

impl Family for TeamMembers {
    type Section = TeamSection;
    type Item = TeamMember;
    const FOLDER_HINT: Option<&'static str> = Some("team");

    fn items<'a>(
        section: &'a mut TeamSection,
        group: Option<&str>,
        create: bool,
    ) -> Result<&'a mut Vec<TeamMember>, AppError> {
        let category = require_group(group)?;
        if create {
            return Ok(section.categories.entry(category.to_string()).or_default());
        }
        section
            .categories
            .get_mut(category)
            .ok_or_else(|| AppError::NotFound(format!("Team category '{category}' not found")))
    }
}

pub struct Openings;

impl Family for Openings {
    type Section = OpeningsSection;
    type Item = Opening;

    fn items<'a>(
        section: &'a mut OpeningsSection,
        group: Option<&str>,
        _create: bool,
    ) -> Result<&'a mut Vec<Opening>, AppError> {
        let category: OpeningCategory = require_group(group)?
            .parse()
            .map_err(AppError::Validation)?;
        Ok(section.categories.entry(category).or_default())
    }
}
