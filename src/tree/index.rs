//! Person index, parentage adjacency and the union index.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::{Dataset, LinkRecord, Person, PersonId, RawPerson, Side};

/// Canonical, unordered identity of a parent pair.
///
/// `None` stands in for an unknown parent. The pair is stored sorted, so
/// `UnionKey::new(a, b) == UnionKey::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UnionKey(Option<PersonId>, Option<PersonId>);

impl UnionKey {
    pub fn new(a: Option<PersonId>, b: Option<PersonId>) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// Both sides are known persons.
    pub fn is_complete(&self) -> bool {
        self.0.is_some() && self.1.is_some()
    }

    pub fn members(&self) -> impl Iterator<Item = PersonId> {
        [self.0, self.1].into_iter().flatten()
    }
}

/// Known parents of one child. Each side is filled at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Parents {
    pub father: Option<PersonId>,
    pub mother: Option<PersonId>,
}

impl Parents {
    pub fn get(&self, side: Side) -> Option<PersonId> {
        match side {
            Side::Father => self.father,
            Side::Mother => self.mother,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = PersonId> {
        [self.father, self.mother].into_iter().flatten()
    }

    /// The parent other than `id`, if `id` is one of them.
    pub fn other(&self, id: PersonId) -> Option<PersonId> {
        if self.father == Some(id) {
            self.mother
        } else if self.mother == Some(id) {
            self.father
        } else {
            None
        }
    }
}

/// Children shared by one parent pair.
#[derive(Debug, Clone)]
pub struct Union {
    pub key: UnionKey,
    pub father: Option<PersonId>,
    pub mother: Option<PersonId>,
    pub children: BTreeSet<PersonId>,
}

impl Union {
    pub fn parents(&self) -> impl Iterator<Item = PersonId> {
        [self.father, self.mother].into_iter().flatten()
    }
}

/// Counts produced by [`FamilyIndex::merge_dataset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub people_added: usize,
    pub links_ingested: usize,
}

/// Monotonically growing genealogical graph.
#[derive(Debug, Clone, Default)]
pub struct FamilyIndex {
    people: BTreeMap<PersonId, Person>,
    parents: BTreeMap<PersonId, Parents>,
    children: BTreeMap<PersonId, BTreeSet<PersonId>>,
    unions: BTreeMap<UnionKey, Union>,
    child_union: BTreeMap<PersonId, UnionKey>,
    parentless: BTreeSet<PersonId>,
}

impl FamilyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a person unless the id is already known. First write wins.
    pub fn add_person(&mut self, person: Person) -> bool {
        if self.people.contains_key(&person.id) {
            return false;
        }
        self.people.insert(person.id, person);
        true
    }

    /// Normalizes and inserts a raw record; records without an id are ignored.
    pub fn add_raw_person(&mut self, raw: &RawPerson) -> bool {
        match raw.normalize() {
            Some(person) => self.add_person(person),
            None => false,
        }
    }

    /// Ingests a parentage record. Returns `false` when the record is ignored.
    pub fn ingest_link(&mut self, record: &LinkRecord) -> bool {
        let Some(child) = record.child_id() else {
            tracing::debug!(?record, "Ignoring link without usable child id");
            return false;
        };
        let father = record.father_id();
        let mut mother = record.mother_id();
        if father.is_some() && father == mother {
            tracing::warn!(%child, "Link names the same person as father and mother");
            mother = None;
        }

        if father.is_none() && mother.is_none() {
            if !self.parents.contains_key(&child) {
                self.parentless.insert(child);
            }
            return true;
        }

        self.parentless.remove(&child);
        let entry = self.parents.entry(child).or_default();
        if entry.father.is_none() {
            entry.father = father;
        }
        if entry.mother.is_none() {
            entry.mother = mother;
        }
        let merged = *entry;

        for parent in merged.iter() {
            self.children.entry(parent).or_default().insert(child);
        }

        let key = UnionKey::new(merged.father, merged.mother);
        let previous = self.child_union.get(&child).copied();
        if previous == Some(key)
            || previous.is_some_and(|existing| existing.is_complete() && !key.is_complete())
        {
            return true;
        }
        if let Some(previous) = previous {
            self.detach_child(previous, child);
        }

        self.unions
            .entry(key)
            .or_insert_with(|| Union {
                key,
                father: merged.father,
                mother: merged.mother,
                children: BTreeSet::new(),
            })
            .children
            .insert(child);
        self.child_union.insert(child, key);
        true
    }

    /// A child belongs to one union; a union left without children goes.
    fn detach_child(&mut self, key: UnionKey, child: PersonId) {
        if let Some(union) = self.unions.get_mut(&key) {
            union.children.remove(&child);
            if union.children.is_empty() {
                self.unions.remove(&key);
            }
        }
    }

    /// Applies people then links. Safe to call repeatedly with overlapping data.
    pub fn merge_dataset(&mut self, dataset: &Dataset) -> MergeStats {
        let mut stats = MergeStats::default();
        for raw in &dataset.people {
            if self.add_raw_person(raw) {
                stats.people_added += 1;
            }
        }
        for link in &dataset.links {
            if self.ingest_link(link) {
                stats.links_ingested += 1;
            }
        }
        tracing::debug!(
            people_added = stats.people_added,
            links = stats.links_ingested,
            "Merged dataset"
        );
        stats
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.get(&id)
    }

    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    /// Unknown ids count as hidden: they cannot be drawn.
    pub fn is_hidden(&self, id: PersonId) -> bool {
        self.people.get(&id).map_or(true, |p| p.hidden)
    }

    pub fn parents(&self, child: PersonId) -> Parents {
        self.parents.get(&child).copied().unwrap_or_default()
    }

    /// Known parents that are indexed and not hidden.
    pub fn visible_parents(&self, child: PersonId) -> Parents {
        let p = self.parents(child);
        let keep = |id: Option<PersonId>| id.filter(|&id| !self.is_hidden(id));
        Parents {
            father: keep(p.father),
            mother: keep(p.mother),
        }
    }

    pub fn children(&self, parent: PersonId) -> impl Iterator<Item = PersonId> + '_ {
        self.children.get(&parent).into_iter().flatten().copied()
    }

    pub fn has_children(&self, parent: PersonId) -> bool {
        self.children.get(&parent).is_some_and(|c| !c.is_empty())
    }

    pub fn union(&self, key: &UnionKey) -> Option<&Union> {
        self.unions.get(key)
    }

    pub fn unions(&self) -> impl Iterator<Item = &Union> {
        self.unions.values()
    }

    pub fn union_count(&self) -> usize {
        self.unions.len()
    }

    /// The union a child is drawn under.
    pub fn child_union(&self, child: PersonId) -> Option<UnionKey> {
        self.child_union.get(&child).copied()
    }

    /// A parent link is known, or the person is confirmed parentless.
    pub fn has_parent_info(&self, id: PersonId) -> bool {
        self.parents.contains_key(&id) || self.parentless.contains(&id)
    }

    pub fn has_parent_link(&self, id: PersonId) -> bool {
        self.parents.contains_key(&id)
    }

    pub fn is_parentless(&self, id: PersonId) -> bool {
        self.parentless.contains(&id)
    }

    pub fn mark_parentless(&mut self, id: PersonId) {
        if !self.parents.contains_key(&id) {
            self.parentless.insert(id);
        }
    }
}
