use std::fmt;

use crate::store::RecordStore;

/// The screen currently shown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    List,
    New,
    Detail(String),
    Settings,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::List => f.write_str("list"),
            View::New => f.write_str("new"),
            View::Detail(id) => write!(f, "detail:{}", id),
            View::Settings => f.write_str("settings"),
        }
    }
}

/// Which screen is up and which variety, if any, has its edit dialog open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Router {
    view: View,
    editing: Option<String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn show_list(&mut self) {
        self.view = View::List;
    }

    pub fn show_new(&mut self) {
        self.view = View::New;
    }

    pub fn show_detail(&mut self, id: impl Into<String>) {
        self.view = View::Detail(id.into());
    }

    pub fn show_settings(&mut self) {
        self.view = View::Settings;
    }

    pub fn begin_edit(&mut self, id: impl Into<String>) {
        self.editing = Some(id.into());
    }

    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    pub fn variety_added(&mut self) {
        self.view = View::List;
    }

    /// After a deletion: back to the list, and the edit dialog closes if it
    /// was open on the deleted variety.
    pub fn variety_removed(&mut self, id: &str) {
        self.view = View::List;
        if self.editing.as_deref() == Some(id) {
            self.editing = None;
        }
    }

    pub fn imported(&mut self) {
        self.view = View::List;
        self.editing = None;
    }

    /// Redirects stale references (a detail page or edit dialog whose
    /// variety no longer exists) back to the list.
    pub fn resolve(&mut self, store: &RecordStore) {
        if let View::Detail(id) = &self.view {
            if store.find(id).is_none() {
                tracing::debug!(%id, "detail view points at a missing variety, showing the list");
                self.view = View::List;
            }
        }
        if let Some(id) = &self.editing {
            if store.find(id).is_none() {
                self.editing = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Variety;

    #[test]
    fn starts_on_the_list() {
        let router = Router::new();
        assert_eq!(router.view(), &View::List);
        assert_eq!(router.editing(), None);
    }

    #[test]
    fn removal_clears_the_matching_edit_only() {
        let mut router = Router::new();
        router.show_detail("a");
        router.begin_edit("a");
        router.variety_removed("b");
        assert_eq!(router.view(), &View::List);
        assert_eq!(router.editing(), Some("a"));

        router.variety_removed("a");
        assert_eq!(router.editing(), None);
    }

    #[test]
    fn stale_detail_view_falls_back_to_list() {
        let kept = Variety::new("Meilland", "Bolero");
        let store = RecordStore::new(vec![kept.clone()]);
        let mut router = Router::new();

        router.show_detail(kept.id.clone());
        router.resolve(&store);
        assert_eq!(router.view(), &View::Detail(kept.id.clone()));

        router.show_detail("gone");
        router.begin_edit("gone");
        router.resolve(&store);
        assert_eq!(router.view(), &View::List);
        assert_eq!(router.editing(), None);
    }

    #[test]
    fn view_names() {
        assert_eq!(View::Detail("x".into()).to_string(), "detail:x");
        assert_eq!(View::Settings.to_string(), "settings");
    }
}
