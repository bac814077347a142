//! Click-driven state transitions.

use crate::error::AppError;
use crate::models::PersonId;

use super::visible::LineageSwitch;
use super::TreeState;

/// Generations requested when a click triggers a lazy ancestor fetch.
pub const CLICK_FETCH_GENERATIONS: u32 = 2;

/// Detail drawer state. When disabled, clicked targets are only stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Drawer {
    pub enabled: bool,
    pub open: Option<PersonId>,
    pub pending: Option<PersonId>,
}

/// An ancestor fetch the caller should issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub person: PersonId,
    pub generations: u32,
}

/// What a click changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEffect {
    pub target: PersonId,
    pub refocused: bool,
    pub switched: Option<LineageSwitch>,
    /// New expanded state when the click toggled the node.
    pub toggled: Option<bool>,
    pub fetch: Option<FetchRequest>,
}

impl ClickEffect {
    fn new(target: PersonId) -> Self {
        Self {
            target,
            refocused: false,
            switched: None,
            toggled: None,
            fetch: None,
        }
    }
}

impl TreeState {
    /// Applies a click on node `id`. The caller re-renders afterwards.
    ///
    /// Lineage-switch targets record their side and keep the focus; any
    /// other node than the focus becomes the new focus, including a switch
    /// target whose side is already recorded. Clicking the
    /// focus (or a switch target) may request an ancestor fetch and, when
    /// no switch happened, toggles the node's descendants.
    pub fn click(&mut self, id: PersonId) -> Result<ClickEffect, AppError> {
        if self.index.person(id).is_none() {
            return Err(AppError::UnknownPerson(id));
        }
        let mut effect = ClickEffect::new(id);

        self.selection = Some(id);
        if self.drawer.enabled {
            self.drawer.open = Some(id);
            self.drawer.pending = None;
        } else {
            self.drawer.pending = Some(id);
        }

        // A switch whose side is already recorded acts as a plain node.
        let switch = self
            .switches
            .get(&id)
            .copied()
            .filter(|s| self.lineage.get(&s.child) != Some(&s.side));
        if switch.is_none() && id != self.focus && !self.index.is_hidden(id) {
            self.refocus(id);
            effect.refocused = true;
            return Ok(effect);
        }

        if let Some(switch) = switch {
            tracing::debug!(child = %switch.child, side = switch.side.as_str(), "Lineage switch");
            self.lineage.insert(switch.child, switch.side);
            effect.switched = Some(switch);
        }

        if self.lazy_expand && !self.index.has_parent_info(id) {
            effect.fetch = Some(FetchRequest {
                person: id,
                generations: CLICK_FETCH_GENERATIONS,
            });
        }

        if effect.switched.is_none() && self.is_expandable(id) {
            let now_expanded = if self.expanded.remove(&id) {
                false
            } else {
                self.expanded.insert(id);
                true
            };
            effect.toggled = Some(now_expanded);
        }

        Ok(effect)
    }

    /// Click on empty canvas.
    pub fn click_background(&mut self) {
        self.selection = None;
        self.drawer.open = None;
    }

    /// Turns the drawer on or off; turning it on shows the stored target.
    pub fn toggle_drawer(&mut self) -> bool {
        self.drawer.enabled = !self.drawer.enabled;
        if self.drawer.enabled {
            if let Some(pending) = self.drawer.pending.take() {
                self.drawer.open = Some(pending);
            }
        } else {
            self.drawer.open = None;
        }
        self.drawer.enabled
    }

    /// Has children, or parent status is still unresolved.
    pub fn is_expandable(&self, id: PersonId) -> bool {
        self.index.has_children(id) || !self.index.has_parent_info(id)
    }
}

/// Replaces the trailing numeric segment of a location path with `focus`.
///
/// `/arbre/12` becomes `/arbre/34`; a query string is kept. Returns `None`
/// when the path does not end in an id.
pub fn rewrite_focus_path(path: &str, focus: PersonId) -> Option<String> {
    let (base, query) = match path.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (path, None),
    };
    let trimmed = base.trim_end_matches('/');
    let trailing = &base[trimmed.len()..];
    let (prefix, last) = trimmed.rsplit_once('/')?;
    if last.is_empty() || !last.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut out = format!("{prefix}/{focus}{trailing}");
    if let Some(query) = query {
        out.push('?');
        out.push_str(query);
    }
    Some(out)
}

/// Profile page link for a person; an empty base disables linking.
pub fn profile_url(base: &str, id: PersonId) -> Option<String> {
    if base.is_empty() {
        return None;
    }
    Some(format!("{}/{}", base.trim_end_matches('/'), id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: i64) -> PersonId {
        PersonId::new(raw).unwrap()
    }

    #[test]
    fn test_rewrite_focus_path() {
        assert_eq!(rewrite_focus_path("/arbre/12", id(34)).as_deref(), Some("/arbre/34"));
        assert_eq!(rewrite_focus_path("/arbre/12/", id(34)).as_deref(), Some("/arbre/34/"));
        assert_eq!(
            rewrite_focus_path("/arbre/12?gens=3", id(5)).as_deref(),
            Some("/arbre/5?gens=3")
        );
        assert_eq!(rewrite_focus_path("/arbre/familia", id(5)), None);
        assert_eq!(rewrite_focus_path("12", id(5)), None);
    }

    #[test]
    fn test_profile_url() {
        assert_eq!(profile_url("", id(3)), None);
        assert_eq!(profile_url("/persones/", id(3)).as_deref(), Some("/persones/3"));
    }
}
