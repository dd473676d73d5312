//! Typed content sections and the per-item families stored inside them.
//!
//! Each section is one JSON document in `content_document`. Items inside a
//! section carry a stable UUIDv7 `id`; positional indices are still accepted
//! when addressing an item but are resolved against the current list.

mod error;
mod family;
mod items;
mod patch;
pub mod repository;
mod sections;

pub use error::ContentError;
pub use family::{
    Collaborations, Courses, Family, ItemRef, Openings, PhdScholars, Publications, TeamMembers,
};
pub use items::{
    AttachmentSlot, Collaboration, Course, Item, Opening, PhdPublication, PhdScholar,
    Publication, TeamMember,
};
pub use patch::apply_patch;
pub use sections::{
    CURRENT_SCHEMA_VERSION, CoursesSection, OpeningCategory, OpeningsSection, PhdSection,
    ResearchSection, Section, SectionName, TeamSection,
};
