//! Team member records and the field sets used to create or change them

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::MemberId;

/// One team member profile as rendered in the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: MemberId,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub bio: String,
    /// Reference to the photo (URL or data URI), opaque to this crate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Field-level validation failure, keyed by field name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.fields))]
pub struct ValidationError {
    pub fields: BTreeMap<&'static str, String>,
}

fn describe(fields: &BTreeMap<&'static str, String>) -> String {
    fields.values().cloned().collect::<Vec<_>>().join(" ")
}

impl ValidationError {
    fn check(fields: BTreeMap<&'static str, String>) -> Result<(), Self> {
        if fields.is_empty() { Ok(()) } else { Err(Self { fields }) }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Fields for a member that does not exist yet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub role: String,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl NewMember {
    /// Name, role and bio are all required
    pub fn validate(&self) -> Result<(), ValidationError> {
        debug!(name = %self.name, "NewMember::validate: called");
        let mut fields = BTreeMap::new();
        if is_blank(&self.name) {
            fields.insert("name", "Name is required.".to_string());
        }
        if is_blank(&self.role) {
            fields.insert("role", "Role is required.".to_string());
        }
        if is_blank(&self.bio) {
            fields.insert("bio", "Bio is required.".to_string());
        }
        ValidationError::check(fields)
    }

    /// The same fields as an update payload, for full single-member edits
    pub fn into_payload(self) -> UpdatePayload {
        UpdatePayload {
            name: Some(self.name),
            role: Some(self.role),
            bio: Some(self.bio),
            photo: self.photo,
        }
    }
}

/// One field set applied identically to every member in a batch update
///
/// Absent fields are left untouched on the target; this is a partial
/// overwrite, not a merge with defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl UpdatePayload {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none() && self.bio.is_none() && self.photo.is_none()
    }

    /// Names of the fields this payload carries
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.name.is_some() {
            names.push("name");
        }
        if self.role.is_some() {
            names.push("role");
        }
        if self.bio.is_some() {
            names.push("bio");
        }
        if self.photo.is_some() {
            names.push("photo");
        }
        names
    }

    /// A payload must carry at least one field and no blank text fields
    pub fn validate(&self) -> Result<(), ValidationError> {
        debug!(fields = ?self.field_names(), "UpdatePayload::validate: called");
        let mut fields = BTreeMap::new();
        if self.is_empty() {
            fields.insert("payload", "At least one field is required.".to_string());
        }
        if self.name.as_deref().is_some_and(is_blank) {
            fields.insert("name", "Name is required.".to_string());
        }
        if self.role.as_deref().is_some_and(is_blank) {
            fields.insert("role", "Role is required.".to_string());
        }
        if self.bio.as_deref().is_some_and(is_blank) {
            fields.insert("bio", "Bio is required.".to_string());
        }
        ValidationError::check(fields)
    }

    /// Overwrite the member's fields with the ones present here
    pub fn apply_to(&self, member: &mut TeamMember) {
        debug!(id = %member.id, fields = ?self.field_names(), "UpdatePayload::apply_to: called");
        if let Some(name) = &self.name {
            member.name = name.clone();
        }
        if let Some(role) = &self.role {
            member.role = role.clone();
        }
        if let Some(bio) = &self.bio {
            member.bio = bio.clone();
        }
        if let Some(photo) = &self.photo {
            member.photo = Some(photo.clone());
        }
    }
}
