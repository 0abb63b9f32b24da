//! Line-oriented console output for gallery events.

use std::fmt::Write as _;
use std::io::Write;

use crate::domain::entities::{CellSnapshot, LoadState};
use crate::domain::ports::{GalleryEvent, GalleryObserver};

/// Prints gallery events to stdout, one line per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver {
    show_cells: bool,
}

impl ConsoleObserver {
    /// Creates an observer that prints page events only.
    #[must_use]
    pub const fn new() -> Self {
        Self { show_cells: false }
    }

    /// Also prints every cell transition.
    #[must_use]
    pub const fn with_cells(mut self, show_cells: bool) -> Self {
        self.show_cells = show_cells;
        self
    }

    /// Formats one event, or `None` if it is filtered out.
    #[must_use]
    pub fn format_event(&self, event: &GalleryEvent) -> Option<String> {
        match event {
            GalleryEvent::CellChanged { cell, state } if self.show_cells => {
                Some(format!("[cell] {cell}: {state}"))
            }
            GalleryEvent::CellChanged { .. } => None,
            GalleryEvent::PageChanged(page) if page.is_loading_next_page => None,
            GalleryEvent::PageChanged(page) if page.end_of_catalog => Some(format!(
                "[page] end of catalog after page {}",
                page.page_number
            )),
            GalleryEvent::PageChanged(page) => Some(format!(
                "[page] page {}: {} images",
                page.page_number,
                page.descriptors.len()
            )),
            GalleryEvent::PageLoadFailed(error) => Some(format!("[error] {error}")),
        }
    }
}

impl GalleryObserver for ConsoleObserver {
    fn on_event(&self, event: &GalleryEvent) {
        if let Some(line) = self.format_event(event) {
            let _ = writeln!(std::io::stdout().lock(), "{line}");
        }
    }
}

/// Renders the grid as a table of ids, sizes and states.
#[must_use]
pub fn render_grid(cells: &[CellSnapshot]) -> String {
    let mut out = String::new();
    let width = cells
        .iter()
        .map(|c| c.id.to_string().len())
        .max()
        .unwrap_or(0);

    for cell in cells {
        let mark = match &cell.state {
            LoadState::NotRequested => ' ',
            LoadState::Loading => '~',
            LoadState::Loaded(_) => '+',
            LoadState::Failed(_) => '!',
        };
        let _ = writeln!(
            out,
            "{mark} {:<width$}  {}",
            cell.id.to_string(),
            cell.state,
        );
    }

    let loaded = cells.iter().filter(|c| c.state.is_loaded()).count();
    let failed = cells.iter().filter(|c| c.state.is_failed()).count();
    let _ = write!(
        out,
        "{} cells, {loaded} loaded, {failed} failed",
        cells.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CellId, ImageDescriptor, PageState};
    use crate::domain::errors::{CatalogError, FetchError, PageLoadError};
    use bytes::Bytes;

    fn snapshot(id: &str, state: LoadState) -> CellSnapshot {
        CellSnapshot {
            id: CellId::new(1, id),
            descriptor: ImageDescriptor::new(id, format!("http://x/{id}.jpg")),
            state,
        }
    }

    #[test]
    fn test_cell_events_hidden_by_default() {
        let event = GalleryEvent::CellChanged {
            cell: CellId::new(1, "7"),
            state: LoadState::Loading,
        };
        assert_eq!(ConsoleObserver::new().format_event(&event), None);
        assert_eq!(
            ConsoleObserver::new()
                .with_cells(true)
                .format_event(&event)
                .as_deref(),
            Some("[cell] p1/7: loading")
        );
    }

    #[test]
    fn test_page_events() {
        let observer = ConsoleObserver::new();
        let mut page = PageState {
            page_number: 2,
            descriptors: vec![ImageDescriptor::new("1", "http://x/1.jpg")],
            ..PageState::default()
        };
        assert_eq!(
            observer
                .format_event(&GalleryEvent::PageChanged(page.clone()))
                .as_deref(),
            Some("[page] page 2: 1 images")
        );

        page.is_loading_next_page = true;
        assert_eq!(
            observer.format_event(&GalleryEvent::PageChanged(page)),
            None
        );

        let error = PageLoadError::new(3, CatalogError::network("timed out"));
        let line = observer
            .format_event(&GalleryEvent::PageLoadFailed(error))
            .unwrap();
        assert!(line.starts_with("[error] failed to load catalog page 3"));
    }

    #[test]
    fn test_render_grid_summary() {
        let cells = vec![
            snapshot("1", LoadState::Loaded(Bytes::from_static(b"abc"))),
            snapshot("2", LoadState::Failed(FetchError::Timeout)),
            snapshot("3", LoadState::NotRequested),
        ];

        let rendered = render_grid(&cells);

        assert!(rendered.contains("+ p1/1"));
        assert!(rendered.contains("! p1/2"));
        assert!(rendered.ends_with("3 cells, 1 loaded, 1 failed"));
    }
}
