//! Wire and domain types for the remote collection.

use serde::{Deserialize, Serialize};

/// Upstream-assigned record identifier.
pub type RecordId = u64;

/// A single item from the remote collection.
///
/// Only the identifier is required on the wire; every other field defaults
/// when the upstream document omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(rename = "objectID")]
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "artistDisplayName")]
    pub artist: String,
    #[serde(default, rename = "objectDate")]
    pub date: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub department_id: u32,
    #[serde(default, rename = "primaryImage")]
    pub image: String,
    #[serde(default, rename = "primaryImageSmall")]
    pub image_small: String,
    #[serde(default, rename = "objectBeginDate")]
    pub begin_year: i32,
    /// `0` means "same as begin".
    #[serde(default, rename = "objectEndDate")]
    pub end_year: i32,
    #[serde(default)]
    pub credit_line: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub is_public_domain: bool,
}

impl Record {
    /// Creates a record with only an identifier set.
    #[must_use]
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            title: String::new(),
            artist: String::new(),
            date: String::new(),
            department: String::new(),
            department_id: 0,
            image: String::new(),
            image_small: String::new(),
            begin_year: 0,
            end_year: 0,
            credit_line: String::new(),
            medium: String::new(),
            is_public_domain: false,
        }
    }

    /// True when at least one depiction URL is present.
    #[must_use]
    pub fn is_depictable(&self) -> bool {
        !self.image.trim().is_empty() || !self.image_small.trim().is_empty()
    }

    /// End year, falling back to the begin year when the end is unset.
    #[must_use]
    pub fn effective_end_year(&self) -> i32 {
        if self.end_year == 0 {
            self.begin_year
        } else {
            self.end_year
        }
    }

    /// Preferred thumbnail: the small depiction, else the large one.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        [&self.image_small, &self.image]
            .into_iter()
            .map(String::as_str)
            .find(|url| !url.trim().is_empty())
    }
}

/// A collection department, used to populate category filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub department_id: u32,
    pub display_name: String,
}

/// Identifier listing returned by search and catalog endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub total: u64,
    /// The upstream sends `null` rather than `[]` when nothing matches.
    #[serde(default, rename = "objectIDs", deserialize_with = "null_as_empty")]
    pub ids: Vec<RecordId>,
}

impl Listing {
    /// True when the listing reports no usable identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0 || self.ids.is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepartmentsResponse {
    #[serde(default)]
    pub departments: Vec<Department>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RecordId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<RecordId>>::deserialize(deserializer)?.unwrap_or_default())
}
