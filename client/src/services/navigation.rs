//! Breadcrumbs for subtask drill-down

use crate::api::display_title;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub id: String,
    pub title: String,
}

/// Ancestors of the note being viewed, outermost first.
///
/// Entries are only pushed when drilling from a note into one of its
/// subtasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breadcrumbs {
    stack: Vec<Crumb>,
}

impl Breadcrumbs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: &str, title: &str) {
        self.stack.push(Crumb {
            id: id.to_string(),
            title: display_title(title).to_string(),
        });
    }

    /// Cut the stack to end just before `id`. An unknown id empties it.
    pub fn truncate_to(&mut self, id: &str) {
        match self.position(id) {
            Some(index) => self.stack.truncate(index),
            None => self.stack.clear(),
        }
    }

    /// Apply the reset rule when a note becomes active: a top-level note
    /// that is not one of the crumbs starts a fresh trail.
    pub fn on_activated(&mut self, id: &str, parent_id: Option<&str>) {
        if parent_id.is_none() && !self.stack.is_empty() && self.position(id).is_none() {
            tracing::debug!("Clearing breadcrumbs on unrelated note {}", id);
            self.stack.clear();
        }
    }

    pub fn as_slice(&self) -> &[Crumb] {
        &self.stack
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.stack.iter().position(|crumb| crumb.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(crumbs: &Breadcrumbs) -> Vec<&str> {
        crumbs.as_slice().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_truncate_to_root_empties_stack() {
        let mut crumbs = Breadcrumbs::new();
        crumbs.push("a", "A");
        crumbs.push("b", "B");

        crumbs.truncate_to("a");
        assert!(crumbs.is_empty());
    }

    #[test]
    fn test_truncate_to_middle_keeps_ancestors() {
        let mut crumbs = Breadcrumbs::new();
        crumbs.push("a", "A");
        crumbs.push("b", "B");
        crumbs.push("c", "C");

        crumbs.truncate_to("b");
        assert_eq!(ids(&crumbs), vec!["a"]);

        crumbs.truncate_to("zzz");
        assert!(crumbs.is_empty());
    }

    #[test]
    fn test_empty_title_shows_untitled() {
        let mut crumbs = Breadcrumbs::new();
        crumbs.push("a", "");
        assert_eq!(crumbs.as_slice()[0].title, "Untitled");
    }

    #[test]
    fn test_reset_only_for_unrelated_top_level_note() {
        let mut crumbs = Breadcrumbs::new();
        crumbs.push("a", "A");

        // a subtask keeps the trail
        crumbs.on_activated("s", Some("a"));
        assert_eq!(ids(&crumbs), vec!["a"]);

        // a top-level note already in the trail keeps it
        crumbs.on_activated("a", None);
        assert_eq!(ids(&crumbs), vec!["a"]);

        // an unrelated top-level note clears it
        crumbs.on_activated("x", None);
        assert!(crumbs.is_empty());
    }
}
