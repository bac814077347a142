//! Tree service: shared state, lazy fetches and the layout channel.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::AncestorFetcher;
use crate::config::LayoutConfig;
use crate::error::AppError;
use crate::models::{PersonId, TreeLayout};
use crate::source::AncestorSource;
use crate::tree::{rewrite_focus_path, ClickEffect, TreeState};

struct Shared<S> {
    state: Mutex<TreeState>,
    fetcher: AncestorFetcher<S>,
    style: LayoutConfig,
    sender: watch::Sender<Arc<TreeLayout>>,
    location: Mutex<Option<String>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: AncestorSource> Shared<S> {
    async fn render(&self, refit: bool) -> Arc<TreeLayout> {
        let layout = {
            let mut state = self.state.lock().await;
            Arc::new(state.render(&self.style, refit))
        };
        self.sender.send_replace(Arc::clone(&layout));
        layout
    }
}

/// Drives one tree view.
///
/// Every render is published on a watch channel; late fetch results
/// re-render against whatever the state is when they land.
pub struct TreeService<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for TreeService<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: AncestorSource + 'static> TreeService<S> {
    pub fn new(state: TreeState, source: Arc<S>, style: LayoutConfig) -> Self {
        let (sender, _) = watch::channel(Arc::new(TreeLayout::empty(state.focus())));
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                fetcher: AncestorFetcher::new(source),
                style,
                sender,
                location: Mutex::new(None),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Sets the location path that refocusing rewrites (e.g. `/arbre/12`).
    pub async fn set_location(&self, path: impl Into<String>) {
        *self.shared.location.lock().await = Some(path.into());
    }

    pub async fn location(&self) -> Option<String> {
        self.shared.location.lock().await.clone()
    }

    pub fn fetcher(&self) -> &AncestorFetcher<S> {
        &self.shared.fetcher
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TreeLayout>> {
        self.shared.sender.subscribe()
    }

    /// Most recently published layout.
    pub fn latest(&self) -> Arc<TreeLayout> {
        self.shared.sender.borrow().clone()
    }

    pub async fn focus(&self) -> PersonId {
        self.shared.state.lock().await.focus()
    }

    /// Runs `f` against the current state.
    pub async fn with_state<R>(&self, f: impl FnOnce(&TreeState) -> R) -> R {
        f(&*self.shared.state.lock().await)
    }

    pub async fn render(&self, refit: bool) -> Arc<TreeLayout> {
        self.shared.render(refit).await
    }

    /// Fetches the focus's ancestors when its parents are still unknown.
    pub async fn prefetch_focus(&self, gens: u32) -> bool {
        let focus = {
            let state = self.shared.state.lock().await;
            if !state.lazy_expand() || state.index().has_parent_info(state.focus()) {
                return false;
            }
            state.focus()
        };
        self.shared
            .fetcher
            .fetch_ancestors(&self.shared.state, focus, gens)
            .await
    }

    /// Applies a click, starts any requested fetch and re-renders.
    pub async fn click(&self, id: PersonId) -> Result<ClickEffect, AppError> {
        let effect = self.shared.state.lock().await.click(id)?;

        if effect.refocused {
            let mut location = self.shared.location.lock().await;
            let rewritten = location.as_deref().and_then(|p| rewrite_focus_path(p, id));
            if let Some(path) = rewritten {
                tracing::debug!(%path, "Location updated");
                *location = Some(path);
            }
        }

        // Cached or in-flight keys would return immediately.
        let mut request = effect.fetch;
        if let Some(r) = request {
            if self.shared.fetcher.is_known(r.person, r.generations).await {
                request = None;
            }
        }
        if let Some(request) = request {
            let shared = Arc::clone(&self.shared);
            let task = tokio::spawn(async move {
                let merged = shared
                    .fetcher
                    .fetch_ancestors(&shared.state, request.person, request.generations)
                    .await;
                if merged {
                    shared.render(false).await;
                }
            });
            let mut tasks = self.shared.tasks.lock().await;
            tasks.retain(|t| !t.is_finished());
            tasks.push(task);
        }

        self.shared.render(false).await;
        Ok(effect)
    }

    pub async fn click_background(&self) -> Arc<TreeLayout> {
        self.shared.state.lock().await.click_background();
        self.shared.render(false).await
    }

    pub async fn toggle_drawer(&self) -> bool {
        self.shared.state.lock().await.toggle_drawer()
    }

    /// Fetch tasks started by clicks that have not finished yet.
    pub async fn pending_fetches(&self) -> usize {
        let mut tasks = self.shared.tasks.lock().await;
        tasks.retain(|t| !t.is_finished());
        tasks.len()
    }

    /// Waits for every fetch started by [`TreeService::click`] so far.
    pub async fn settle(&self) {
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.shared.tasks.lock().await);
        for task in tasks {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "Fetch task did not complete");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dataset, LinkRecord, Person, RawPerson, Sex};
    use crate::source::MemoryAncestorSource;
    use crate::tree::FamilyIndex;

    fn id(raw: i64) -> PersonId {
        PersonId::new(raw).unwrap()
    }

    fn remote() -> Dataset {
        let people = [(1, Sex::Male), (2, Sex::Male), (3, Sex::Female)]
            .into_iter()
            .map(|(raw, sex)| RawPerson::from(&Person::new(id(raw), format!("P{raw}"), sex)))
            .collect();
        Dataset::new(people, vec![LinkRecord::new(id(1), Some(id(2)), Some(id(3)))])
    }

    fn service() -> TreeService<MemoryAncestorSource> {
        let mut index = FamilyIndex::new();
        index.add_person(Person::new(id(1), "P1", Sex::Male));
        let source = Arc::new(MemoryAncestorSource::new(&remote()));
        TreeService::new(TreeState::new(index, id(1), 3), source, LayoutConfig::default())
    }

    #[tokio::test]
    async fn test_prefetch_then_render() {
        let service = service();
        assert!(service.prefetch_focus(2).await);
        assert!(!service.prefetch_focus(2).await);
        let layout = service.render(true).await;
        assert_eq!(layout.nodes.len(), 3);
        assert!(service.latest().refit);
    }

    #[tokio::test]
    async fn test_click_fetch_rerenders() {
        let service = service();
        let mut rx = service.subscribe();
        service.render(true).await;
        let effect = service.click(id(1)).await.unwrap();
        assert!(effect.fetch.is_some());
        service.settle().await;
        assert!(rx.has_changed().unwrap());
        let layout = rx.borrow_and_update().clone();
        assert!(layout.node(id(2)).is_some());
        assert!(!layout.refit);
    }

    #[tokio::test]
    async fn test_refocus_rewrites_location() {
        let service = service();
        service.prefetch_focus(2).await;
        service.set_location("/arbre/1").await;
        service.render(true).await;
        // 1's trunk goes through 2, so 3 is a switch target; 2 is not.
        let effect = service.click(id(2)).await.unwrap();
        assert!(effect.refocused);
        assert_eq!(service.location().await.as_deref(), Some("/arbre/2"));
        assert_eq!(service.focus().await, id(2));
    }
}
