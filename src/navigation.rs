//! Sidebar navigation
//!
//! The sidebar shows the document forest of a user, a branch is only loaded when it is expanded.
//! The expansion state belongs to the client session and is never persisted.

use std::collections::HashSet;
use std::future::Future;

use uuid::Uuid;

use crate::documents::Document;

/// Which branches of the sidebar are expanded
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpandedState {
    /// IDs of the expanded documents
    branches: HashSet<Uuid>,
}

impl ExpandedState {
    /// Everything collapsed
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma separated list of expanded document IDs
    ///
    /// Empty entries are skipped
    pub fn parse(ids: &str) -> Result<Self, uuid::Error> {
        let mut state = Self::new();

        for id in ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            state.expand(Uuid::parse_str(id)?);
        }

        Ok(state)
    }

    pub fn expand(&mut self, id: Uuid) {
        self.branches.insert(id);
    }

    pub fn is_expanded(&self, id: &Uuid) -> bool {
        self.branches.contains(id)
    }
}

/// Loads the visible children of a branch
pub trait ChildLoader {
    /// Error while loading
    type Error;

    /// Load the children of a parent, `None` loads the top-level documents
    fn load_children(
        &self,
        parent_id: Option<&Uuid>,
    ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send;
}

/// A single row in the sidebar
#[derive(Clone, Debug)]
pub struct SidebarItem {
    /// Nesting depth, 0 for top-level documents
    pub level: usize,

    /// Is the branch of this document expanded?
    pub is_expanded: bool,

    /// The document itself
    pub document: Document,
}

/// Build the sidebar rows in display order
///
/// Starts at the top-level documents and only loads children of expanded branches
pub async fn build_sidebar<L>(
    loader: &L,
    state: &ExpandedState,
) -> Result<Vec<SidebarItem>, L::Error>
where
    L: ChildLoader,
{
    let top_level = loader.load_children(None).await?;

    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(0, top_level.into_iter())];

    loop {
        let Some((level, documents)) = stack.last_mut() else {
            break;
        };

        let level = *level;

        let Some(document) = documents.next() else {
            stack.pop();
            continue;
        };

        let id = document.id;
        let is_expanded = state.is_expanded(&id);

        items.push(SidebarItem {
            level,
            is_expanded,
            document,
        });

        if is_expanded && visited.insert(id) {
            let children = loader.load_children(Some(&id)).await?;
            stack.push((level + 1, children.into_iter()));
        }
    }

    Ok(items)
}
