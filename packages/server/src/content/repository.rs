//! Whole-document and per-item access to content sections.
//!
//! Every write replaces the whole section document; concurrent writers to the
//! same section are last-writer-wins.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, EntityTrait, Set};
use serde_json::Value;
use tracing::{info, instrument};

use super::family::{Family, ItemRef};
use super::items::Item;
use super::sections::{
    CURRENT_SCHEMA_VERSION, CoursesSection, OpeningsSection, PhdSection, ResearchSection,
    Section, SectionName, TeamSection,
};
use crate::entity::content_document;
use crate::error::AppError;

/// Read a section; a missing document yields the default shape. A document
/// stored in an older shape is upgraded and written back.
pub async fn load<S: Section, C: ConnectionTrait>(db: &C) -> Result<S, AppError> {
    let row = content_document::Entity::find_by_id(S::NAME.as_str().to_owned())
        .one(db)
        .await?;

    match row {
        Some(row) => {
            let version = row.schema_version;
            let (section, changed) = S::decode(version, row.body)?;
            if changed {
                // Ids assigned here must be stored, or the next read hands out different ones.
                save(db, &section).await?;
                info!(section = %S::NAME, from_version = version, "Rewrote upgraded section");
            }
            Ok(section)
        }
        None => {
            let mut section = S::default();
            section.normalize();
            Ok(section)
        }
    }
}

/// Overwrite the stored document for a section.
pub async fn save<S: Section, C: ConnectionTrait>(db: &C, section: &S) -> Result<(), AppError> {
    let model = content_document::ActiveModel {
        name: Set(S::NAME.as_str().to_owned()),
        schema_version: Set(CURRENT_SCHEMA_VERSION),
        body: Set(section.encode()?),
        updated_at: Set(Utc::now()),
    };

    content_document::Entity::insert(model)
        .on_conflict(
            OnConflict::column(content_document::Column::Name)
                .update_columns([
                    content_document::Column::SchemaVersion,
                    content_document::Column::Body,
                    content_document::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

/// Validate and replace a whole section. Items lacking an id, or repeating
/// one already used in the same list, are given a fresh one.
#[instrument(skip_all, fields(section = %S::NAME))]
pub async fn replace_all<S: Section, C: ConnectionTrait>(
    db: &C,
    mut section: S,
) -> Result<S, AppError> {
    section.validate()?;
    section.normalize();
    save(db, &section).await?;
    Ok(section)
}

/// Look up one item without modifying anything.
pub async fn find_item<F: Family, C: ConnectionTrait>(
    db: &C,
    group: Option<&str>,
    item_ref: ItemRef,
) -> Result<F::Item, AppError> {
    let mut section: F::Section = load(db).await?;
    let items = F::items(&mut section, group, false)?;
    let pos = item_ref
        .position(items.as_slice())
        .ok_or_else(|| not_found::<F>(item_ref))?;
    Ok(items[pos].clone())
}

/// Validate and insert a new item; the server assigns its id.
#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, group = ?group))]
pub async fn add_item<F: Family, C: ConnectionTrait>(
    db: &C,
    group: Option<&str>,
    mut item: F::Item,
) -> Result<F::Item, AppError> {
    item.set_id(uuid::Uuid::now_v7());
    item.validate()?;

    let mut section: F::Section = load(db).await?;
    let items = F::items(&mut section, group, true)?;
    if F::INSERT_AT_HEAD {
        items.insert(0, item.clone());
    } else {
        items.push(item.clone());
    }
    save(db, &section).await?;

    Ok(item)
}

/// Re-read the section, let `change` edit the addressed item, and write it back.
pub async fn update_item<F, C, U>(
    db: &C,
    group: Option<&str>,
    item_ref: ItemRef,
    change: U,
) -> Result<F::Item, AppError>
where
    F: Family,
    C: ConnectionTrait,
    U: FnOnce(&mut F::Item) -> Result<(), AppError> + Send,
{
    let mut section: F::Section = load(db).await?;
    let items = F::items(&mut section, group, false)?;
    let pos = item_ref
        .position(items.as_slice())
        .ok_or_else(|| not_found::<F>(item_ref))?;

    let id = items[pos].id();
    change(&mut items[pos])?;
    items[pos].set_id(id);
    let updated = items[pos].clone();

    save(db, &section).await?;
    Ok(updated)
}

/// Remove an item and return what was removed.
#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, group = ?group, item = %item_ref))]
pub async fn remove_item<F: Family, C: ConnectionTrait>(
    db: &C,
    group: Option<&str>,
    item_ref: ItemRef,
) -> Result<F::Item, AppError> {
    let mut section: F::Section = load(db).await?;
    let items = F::items(&mut section, group, false)?;
    let pos = item_ref
        .position(items.as_slice())
        .ok_or_else(|| not_found::<F>(item_ref))?;
    let removed = items.remove(pos);

    save(db, &section).await?;
    Ok(removed)
}

fn not_found<F: Family>(item_ref: ItemRef) -> AppError {
    AppError::NotFound(format!("{} {item_ref} not found", <F::Item as Item>::KIND))
}

async fn load_value<S: Section, C: ConnectionTrait>(db: &C) -> Result<Value, AppError> {
    Ok(load::<S, C>(db).await?.encode()?)
}

async fn replace_value<S: Section, C: ConnectionTrait>(
    db: &C,
    body: Value,
) -> Result<Value, AppError> {
    let section: S = serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("Invalid {} section: {e}", S::NAME)))?;
    Ok(replace_all(db, section).await?.encode()?)
}

/// Whole-document read by section name.
pub async fn load_section_json<C: ConnectionTrait>(
    db: &C,
    name: SectionName,
) -> Result<Value, AppError> {
    match name {
        SectionName::Research => load_value::<ResearchSection, C>(db).await,
        SectionName::Team => load_value::<TeamSection, C>(db).await,
        SectionName::Courses => load_value::<CoursesSection, C>(db).await,
        SectionName::Openings => load_value::<OpeningsSection, C>(db).await,
        SectionName::Phd => load_value::<PhdSection, C>(db).await,
    }
}

/// Whole-document overwrite by section name. Returns the stored value.
pub async fn replace_section_json<C: ConnectionTrait>(
    db: &C,
    name: SectionName,
    body: Value,
) -> Result<Value, AppError> {
    match name {
        SectionName::Research => replace_value::<ResearchSection, C>(db, body).await,
        SectionName::Team => replace_value::<TeamSection, C>(db, body).await,
        SectionName::Courses => replace_value::<CoursesSection, C>(db, body).await,
        SectionName::Openings => replace_value::<OpeningsSection, C>(db, body).await,
        SectionName::Phd => replace_value::<PhdSection, C>(db, body).await,
    }
}

/// Every storage key referenced by any section.
pub async fn referenced_keys<C: ConnectionTrait>(db: &C) -> Result<HashSet<String>, AppError> {
    let mut keys = HashSet::new();
    keys.extend(load::<ResearchSection, C>(db).await?.attachment_keys());
    keys.extend(load::<TeamSection, C>(db).await?.attachment_keys());
    keys.extend(load::<CoursesSection, C>(db).await?.attachment_keys());
    keys.extend(load::<OpeningsSection, C>(db).await?.attachment_keys());
    keys.extend(load::<PhdSection, C>(db).await?.attachment_keys());
    Ok(keys)
}
