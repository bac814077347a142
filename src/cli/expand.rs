//! Expand subcommand - fetch ancestors from the expand API.

use std::collections::BTreeSet;

use clap::Parser;
use futures::future::join_all;

use crate::config::Config;
use crate::models::{Dataset, PersonId};
use crate::source::{AncestorSource, HttpAncestorSource};

/// Fetch ancestors and print the merged dataset.
#[derive(Parser)]
pub struct ExpandCommand {
    /// Persons to expand.
    #[arg(required = true)]
    pub ids: Vec<PersonId>,

    /// Generations to request; defaults to the configured value.
    #[arg(short, long)]
    pub gens: Option<u32>,

    /// Expand API base URL.
    #[arg(long)]
    pub api: Option<String>,
}

impl ExpandCommand {
    /// Run the expand command.
    pub async fn run(self, mut config: Config) -> color_eyre::Result<()> {
        if let Some(api) = self.api {
            config.api.base_url = api;
        }
        let gens = self.gens.unwrap_or(config.tree.expand_gens);
        let source = HttpAncestorSource::new(&config.api)?;
        tracing::info!(endpoint = %source.endpoint(), gens, "Expanding {} person(s)", self.ids.len());

        let responses = join_all(self.ids.iter().map(|&id| source.expand(id, gens))).await;

        let mut merged = Dataset::default();
        let mut seen: BTreeSet<PersonId> = BTreeSet::new();
        for (id, response) in self.ids.iter().zip(responses) {
            let dataset = match response {
                Ok(dataset) => dataset,
                Err(err) => {
                    tracing::warn!(%id, error = %err, "Expand failed");
                    continue;
                }
            };
            for person in dataset.people {
                if let Some(pid) = PersonId::from_value(&person.id) {
                    if seen.insert(pid) {
                        merged.people.push(person);
                    }
                }
            }
            merged.links.extend(dataset.links);
        }

        super::write_json(&merged, None)
    }
}
