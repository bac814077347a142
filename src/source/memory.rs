use std::collections::{BTreeSet, VecDeque};

use async_trait::async_trait;

use super::AncestorSource;
use crate::error::AppError;
use crate::models::{Dataset, LinkRecord, PersonId, RawPerson};
use crate::tree::FamilyIndex;

/// Serves ancestor requests from a dataset loaded up front.
#[derive(Debug, Clone, Default)]
pub struct MemoryAncestorSource {
    index: FamilyIndex,
}

impl MemoryAncestorSource {
    pub fn new(dataset: &Dataset) -> Self {
        let mut index = FamilyIndex::new();
        index.merge_dataset(dataset);
        Self { index }
    }

    /// Ancestors of `person` within `gens` generations, with their links.
    pub fn ancestors(&self, person: PersonId, gens: u32) -> Dataset {
        let mut seen = BTreeSet::from([person]);
        let mut queue = VecDeque::from([(person, 0u32)]);
        let mut links = Vec::new();
        while let Some((id, gen)) = queue.pop_front() {
            if gen >= gens {
                continue;
            }
            let parents = self.index.parents(id);
            if parents.father.is_none() && parents.mother.is_none() {
                continue;
            }
            links.push(LinkRecord::new(id, parents.father, parents.mother));
            for parent in parents.iter() {
                if seen.insert(parent) {
                    queue.push_back((parent, gen + 1));
                }
            }
        }

        let people = seen
            .iter()
            .filter_map(|&id| self.index.person(id))
            .map(RawPerson::from)
            .collect();
        Dataset::new(people, links)
    }
}

#[async_trait]
impl AncestorSource for MemoryAncestorSource {
    async fn expand(&self, person: PersonId, gens: u32) -> Result<Dataset, AppError> {
        Ok(self.ancestors(person, gens))
    }
}
