use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// How many blob references an item kind holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentSlot {
    /// The item never references blobs.
    None,
    /// At most one reference, may be empty.
    Optional,
    /// Exactly one reference.
    Required,
    /// An ordered list of references.
    Many,
}

impl AttachmentSlot {
    /// Upper bound on files accepted in one request.
    pub fn max_uploads(self) -> Option<usize> {
        match self {
            Self::None => Some(0),
            Self::Optional | Self::Required => Some(1),
            Self::Many => None,
        }
    }
}

/// A record stored inside a content section.
pub trait Item: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Human-readable kind, used in error messages.
    const KIND: &'static str;
    const SLOT: AttachmentSlot = AttachmentSlot::None;

    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);

    /// Check required fields.
    fn validate(&self) -> Result<(), AppError>;

    /// Storage keys this item references, in order.
    fn attachments(&self) -> Vec<String> {
        Vec::new()
    }

    fn set_attachments(&mut self, _keys: Vec<String>) {}
}

fn require(kind: &str, field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "{kind} {field} must not be empty"
        )));
    }
    Ok(())
}

fn single_key(slot: &Option<String>) -> Vec<String> {
    slot.iter().filter(|k| !k.is_empty()).cloned().collect()
}

/// Accept `2021` as well as the legacy `"2021"`.
fn year_from_number_or_string<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => i32::try_from(n).map_err(serde::de::Error::custom),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid year '{s}'"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    #[serde(default)]
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub journal: String,
    #[serde(deserialize_with = "year_from_number_or_string")]
    pub year: i32,
    #[serde(default)]
    pub cited_by: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Item for Publication {
    const KIND: &'static str = "Publication";
    const SLOT: AttachmentSlot = AttachmentSlot::Many;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), AppError> {
        require(Self::KIND, "title", &self.title)?;
        require(Self::KIND, "author", &self.author)?;
        require(Self::KIND, "journal", &self.journal)?;
        if !(1900..=2100).contains(&self.year) {
            return Err(AppError::Validation(
                "Publication year must be between 1900 and 2100".into(),
            ));
        }
        Ok(())
    }

    fn attachments(&self) -> Vec<String> {
        self.images.iter().filter(|k| !k.is_empty()).cloned().collect()
    }

    fn set_attachments(&mut self, keys: Vec<String>) {
        self.images = keys;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaboration {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub department_link: String,
}

impl Item for Collaboration {
    const KIND: &'static str = "Collaboration";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), AppError> {
        require(Self::KIND, "name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub github: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Item for TeamMember {
    const KIND: &'static str = "Team member";
    const SLOT: AttachmentSlot = AttachmentSlot::Optional;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), AppError> {
        require(Self::KIND, "name", &self.name)
    }

    fn attachments(&self) -> Vec<String> {
        single_key(&self.image)
    }

    fn set_attachments(&mut self, keys: Vec<String>) {
        self.image = keys.into_iter().next();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(default)]
    pub id: Uuid,
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
}

impl Item for Course {
    const KIND: &'static str = "Course";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), AppError> {
        require(Self::KIND, "code", &self.code)?;
        require(Self::KIND, "title", &self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opening {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    /// Storage key of the call document.
    #[serde(default)]
    pub file: String,
}

impl Item for Opening {
    const KIND: &'static str = "Opening";
    const SLOT: AttachmentSlot = AttachmentSlot::Required;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), AppError> {
        require(Self::KIND, "name", &self.name)?;
        require(Self::KIND, "file", &self.file)
    }

    fn attachments(&self) -> Vec<String> {
        if self.file.is_empty() {
            Vec::new()
        } else {
            vec![self.file.clone()]
        }
    }

    fn set_attachments(&mut self, keys: Vec<String>) {
        self.file = keys.into_iter().next().unwrap_or_default();
    }
}

/// A publication listed on a PhD scholar's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhdPublication {
    pub title: String,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub citation: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhdScholar {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub research_areas: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub publications: Vec<PhdPublication>,
    #[serde(default)]
    pub google_scholar: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub github: String,
}

impl Item for PhdScholar {
    const KIND: &'static str = "PhD scholar";
    const SLOT: AttachmentSlot = AttachmentSlot::Optional;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), AppError> {
        require(Self::KIND, "name", &self.name)?;
        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(AppError::Validation(format!(
                "PhD scholar email '{email}' is not a valid address"
            )));
        }
        for publication in &self.publications {
            require("PhD scholar publication", "title", &publication.title)?;
        }
        Ok(())
    }

    fn attachments(&self) -> Vec<String> {
        single_key(&self.image)
    }

    fn set_attachments(&mut self, keys: Vec<String>) {
        self.image = keys.into_iter().next();
    }
}
