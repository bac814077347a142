//! Layout subcommand - render a family payload to JSON.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::config::Config;
use crate::models::{InitialData, PersonId};
use crate::services::TreeService;
use crate::source::{AncestorSource, HttpAncestorSource, MemoryAncestorSource};
use crate::tree::TreeState;

/// Render a tree from a JSON payload (`people`/`links`, optional `rootId`).
#[derive(Parser)]
pub struct LayoutCommand {
    /// Path to the JSON payload.
    pub input: PathBuf,

    /// Focus person; defaults to the payload's root id.
    #[arg(short, long)]
    pub focus: Option<PersonId>,

    /// Trunk depth in generations, focus included.
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Clicks to replay before rendering, in order.
    #[arg(long = "click", value_name = "ID")]
    pub clicks: Vec<PersonId>,

    /// Expand API base URL.
    #[arg(long)]
    pub api: Option<String>,

    /// Never contact the expand API.
    #[arg(long)]
    pub offline: bool,

    /// Write the layout here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl LayoutCommand {
    /// Run the layout command.
    pub async fn run(self, mut config: Config) -> color_eyre::Result<()> {
        let content = std::fs::read_to_string(&self.input)?;
        let data: InitialData = serde_json::from_str(&content)?;
        if let Some(api) = &self.api {
            config.api.base_url = api.clone();
        }
        let depth = self.depth.unwrap_or(config.tree.depth);

        let mut state = TreeState::from_initial(&data, self.focus, depth)?;
        if config.api.disable_expand || self.offline {
            state.set_lazy_expand(false);
        }
        if state.profile_base().is_empty() {
            state.set_profile_base(config.api.profile_base.clone());
        }
        tracing::info!(
            focus = %state.focus(),
            people = state.index().person_count(),
            depth,
            "Loaded payload"
        );

        if self.offline {
            let source = Arc::new(MemoryAncestorSource::new(&data.dataset));
            self.render(state, source, config).await
        } else {
            let source = Arc::new(HttpAncestorSource::new(&config.api)?);
            self.render(state, source, config).await
        }
    }

    async fn render<S: AncestorSource + 'static>(
        &self,
        state: TreeState,
        source: Arc<S>,
        config: Config,
    ) -> color_eyre::Result<()> {
        let prefetch = config.tree.expand_gens;
        let service = TreeService::new(state, source, config.layout);
        if service.prefetch_focus(prefetch).await {
            tracing::info!("Fetched focus ancestors");
        }
        service.render(true).await;

        for &id in &self.clicks {
            let effect = service.click(id).await?;
            service.settle().await;
            tracing::info!(
                %id,
                refocused = effect.refocused,
                switched = effect.switched.is_some(),
                "Applied click"
            );
        }

        let layout = service.latest();
        super::write_json(layout.as_ref(), self.output.as_deref())
    }
}
