//! Payload shapes accepted from the host page and the expand API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{LinkRecord, PersonId, RawPerson};

/// People and parentage links, normalized to one field naming.
///
/// The expand API and older host pages send `familyData`/`familyLinks`;
/// both spellings deserialize into the same struct. Elements that do not
/// fit the record shape are dropped rather than failing the payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, alias = "familyData", deserialize_with = "lenient_vec")]
    pub people: Vec<RawPerson>,
    #[serde(default, alias = "familyLinks", deserialize_with = "lenient_vec")]
    pub links: Vec<LinkRecord>,
}

impl Dataset {
    pub fn new(people: Vec<RawPerson>, links: Vec<LinkRecord>) -> Self {
        Self { people, links }
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty() && self.links.is_empty()
    }

    /// Whether any link in this payload names a parent for `child`.
    pub fn has_parent_link(&self, child: PersonId) -> bool {
        self.links.iter().any(|link| {
            link.child_id() == Some(child)
                && (link.father_id().is_some() || link.mother_id().is_some())
        })
    }
}

/// Initial data injected by the host page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitialData {
    #[serde(flatten)]
    pub dataset: Dataset,
    /// Root/focus person id.
    #[serde(default, alias = "rootId", alias = "root")]
    pub root_id: Value,
    /// Disables lazy ancestor expansion.
    #[serde(default, alias = "disableExpand")]
    pub disable_expand: bool,
    /// Base path for profile links; empty disables them.
    #[serde(default, alias = "profileBase")]
    pub profile_base: String,
}

impl InitialData {
    pub fn root(&self) -> Option<PersonId> {
        PersonId::from_value(&self.root_id)
    }
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping malformed record");
                None
            }
        })
        .collect())
}
