// File: crates/export-core/src/registry.rs
// Summary: Registry of mounted chart widgets; the bulk orchestrator discovers charts here.
// Notes:
// - Widgets register on mount and deregister on unmount. Registration order is the
//   document order the orchestrator walks.
// - `query` hands out snapshots, so no lock is held while exports await.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::request::Row;

/// Marker every exportable chart carries unless told otherwise.
pub const CHART_CONTAINER_MARKER: &str = "data-chart-container";

/// Supplies the chart's current tabular data on demand.
pub type DataProvider = Arc<dyn Fn() -> Vec<Row> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartId(u64);

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chart#{}", self.0)
    }
}

pub struct ChartHandle<E: ?Sized> {
    element: Arc<E>,
    markers: Vec<String>,
    title: Option<String>,
    data: Option<DataProvider>,
}

impl<E: ?Sized> ChartHandle<E> {
    /// Handle tagged with [`CHART_CONTAINER_MARKER`].
    pub fn new(element: Arc<E>) -> Self {
        Self {
            element,
            markers: vec![CHART_CONTAINER_MARKER.to_string()],
            title: None,
            data: None,
        }
    }

    /// Handle with no markers at all; add them with [`ChartHandle::marker`].
    pub fn unmarked(element: Arc<E>) -> Self {
        Self { element, markers: Vec::new(), title: None, data: None }
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn data<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Vec<Row> + Send + Sync + 'static,
    {
        self.data = Some(Arc::new(provider));
        self
    }

    fn matches(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }
}

impl<E: ?Sized> fmt::Debug for ChartHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartHandle")
            .field("markers", &self.markers)
            .field("title", &self.title)
            .field("has_data", &self.data.is_some())
            .finish()
    }
}

/// Snapshot of one registered chart, as seen by a single query.
pub struct MountedChart<E: ?Sized> {
    pub id: ChartId,
    /// Position within the query result (0-based).
    pub index: usize,
    pub element: Arc<E>,
    pub title: Option<String>,
    data: Option<DataProvider>,
}

impl<E: ?Sized> MountedChart<E> {
    /// Display title, or `chart-<n>` (1-based) when the chart carries none.
    pub fn resolved_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("chart-{}", self.index + 1),
        }
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Pull the chart's rows from its provider, if it registered one.
    pub fn rows(&self) -> Option<Vec<Row>> {
        self.data.as_ref().map(|provider| provider())
    }
}

impl<E: ?Sized> fmt::Debug for MountedChart<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedChart")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("title", &self.title)
            .finish()
    }
}

struct Inner<E: ?Sized> {
    next_id: u64,
    entries: Vec<(ChartId, ChartHandle<E>)>,
}

pub struct ChartRegistry<E: ?Sized> {
    inner: RwLock<Inner<E>>,
}

impl<E: ?Sized> Default for ChartRegistry<E> {
    fn default() -> Self {
        Self { inner: RwLock::new(Inner { next_id: 1, entries: Vec::new() }) }
    }
}

impl<E: ?Sized> fmt::Debug for ChartRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartRegistry").field("len", &self.len()).finish()
    }
}

/// `[data-chart-container]` and `data-chart-container` name the same marker.
pub fn normalize_selector(selector: &str) -> &str {
    let s = selector.trim();
    s.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
        .unwrap_or(s)
}

impl<E: ?Sized> ChartRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handle: ChartHandle<E>) -> ChartId {
        let mut inner = self.inner.write();
        let id = ChartId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push((id, handle));
        id
    }

    /// Returns false when `id` was not (or no longer) registered.
    pub fn deregister(&self, id: ChartId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner.entries.retain(|(eid, _)| *eid != id);
        inner.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Every chart carrying the selector's marker, in registration order.
    pub fn query(&self, selector: &str) -> Vec<MountedChart<E>> {
        let marker = normalize_selector(selector);
        let inner = self.inner.read();
        inner
            .entries
            .iter()
            .filter(|(_, handle)| handle.matches(marker))
            .enumerate()
            .map(|(index, (id, handle))| MountedChart {
                id: *id,
                index,
                element: Arc::clone(&handle.element),
                title: handle.title.clone(),
                data: handle.data.clone(),
            })
            .collect()
    }
}
