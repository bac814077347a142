//! Person and parentage records.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::PersonId;

/// Recorded sex of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    /// Lenient parse of the codes found in source records.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "male" | "m" | "h" | "home" | "man" => Sex::Male,
            "female" | "f" | "d" | "dona" | "woman" => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for Sex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Sex::parse(&s),
            _ => Sex::Unknown,
        })
    }
}

/// A person in the family index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub sex: Sex,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    /// Hidden persons stay indexed but are skipped by every traversal.
    pub hidden: bool,
}

impl Person {
    pub fn new(id: PersonId, name: impl Into<String>, sex: Sex) -> Self {
        Self {
            id,
            name: name.into(),
            sex,
            birth: None,
            death: None,
            birth_place: None,
            death_place: None,
            occupation: None,
            hidden: false,
        }
    }
}

/// A person record as received from the host page or the expand API.
///
/// Ids and dates are loosely typed upstream; [`RawPerson::normalize`]
/// turns the record into a [`Person`] or drops it when the id is unusable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPerson {
    #[serde(default)]
    pub id: Value,
    #[serde(default, alias = "nom", deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, alias = "sexe")]
    pub sex: Sex,
    #[serde(default, deserialize_with = "loose_text")]
    pub birth: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub death: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub birth_place: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub death_place: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub occupation: Option<String>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub hidden: bool,
}

impl RawPerson {
    pub fn normalize(&self) -> Option<Person> {
        let id = PersonId::from_value(&self.id)?;
        Some(Person {
            id,
            name: self.name.clone().unwrap_or_default(),
            sex: self.sex,
            birth: self.birth.clone(),
            death: self.death.clone(),
            birth_place: self.birth_place.clone(),
            death_place: self.death_place.clone(),
            occupation: self.occupation.clone(),
            hidden: self.hidden,
        })
    }
}

impl From<&Person> for RawPerson {
    fn from(person: &Person) -> Self {
        Self {
            id: Value::from(person.id.get()),
            name: Some(person.name.clone()),
            sex: person.sex,
            birth: person.birth.clone(),
            death: person.death.clone(),
            birth_place: person.birth_place.clone(),
            death_place: person.death_place.clone(),
            occupation: person.occupation.clone(),
            hidden: person.hidden,
        }
    }
}

/// A parentage fact: `father`/`mother` absent means unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(default)]
    pub child: Value,
    #[serde(default)]
    pub father: Value,
    #[serde(default)]
    pub mother: Value,
}

impl LinkRecord {
    pub fn new(child: PersonId, father: Option<PersonId>, mother: Option<PersonId>) -> Self {
        let id = |p: Option<PersonId>| p.map_or(Value::Null, |p| Value::from(p.get()));
        Self {
            child: Value::from(child.get()),
            father: id(father),
            mother: id(mother),
        }
    }

    pub fn child_id(&self) -> Option<PersonId> {
        PersonId::from_value(&self.child)
    }

    pub fn father_id(&self) -> Option<PersonId> {
        PersonId::from_value(&self.father)
    }

    pub fn mother_id(&self) -> Option<PersonId> {
        PersonId::from_value(&self.mother)
    }
}

fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "yes"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sex_codes() {
        assert_eq!(Sex::parse("M"), Sex::Male);
        assert_eq!(Sex::parse("home"), Sex::Male);
        assert_eq!(Sex::parse("Female"), Sex::Female);
        assert_eq!(Sex::parse("d"), Sex::Female);
        assert_eq!(Sex::parse("?"), Sex::Unknown);
    }

    #[test]
    fn test_raw_person_normalization() {
        let raw: RawPerson = serde_json::from_value(json!({
            "id": "12",
            "name": "Maria",
            "sex": "female",
            "birth": 1901,
            "death": "",
            "hidden": 1
        }))
        .unwrap();
        let person = raw.normalize().unwrap();
        assert_eq!(person.id, PersonId::new(12).unwrap());
        assert_eq!(person.sex, Sex::Female);
        assert_eq!(person.birth.as_deref(), Some("1901"));
        assert!(person.death.is_none());
        assert!(person.hidden);
    }

    #[test]
    fn test_raw_person_without_id_is_dropped() {
        let raw: RawPerson = serde_json::from_value(json!({"name": "Nobody"})).unwrap();
        assert!(raw.normalize().is_none());
    }

    #[test]
    fn test_link_record_ids() {
        let link: LinkRecord =
            serde_json::from_value(json!({"child": 3, "father": "0", "mother": "5"})).unwrap();
        assert_eq!(link.child_id(), PersonId::new(3));
        assert_eq!(link.father_id(), None);
        assert_eq!(link.mother_id(), PersonId::new(5));
    }
}
