//! List/Detail View
//!
//! Pure view model over a controller: table rows, cursor and viewport for
//! virtual scrolling, and the optional single-record detail that follows the
//! selected id.

use crate::controller::CrudController;
use crate::resource::{extract_json_value, ColumnDef, Operation, RecordId, ResourceDef};
use serde_json::Value;
use std::ops::Range;

/// Default viewport height (updated during render from the terminal size)
const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

/// Rows kept between the cursor and the viewport edge
const SCROLL_MARGIN: usize = 2;

/// One rendered table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    Record(Vec<String>),
    /// Single row spanning the table when there are no records
    Placeholder(String),
}

/// Build display rows for `items`; an empty list yields the placeholder row
pub fn table_rows(def: &ResourceDef, items: &[Value]) -> Vec<TableRow> {
    if items.is_empty() {
        return vec![TableRow::Placeholder(def.empty_message.clone())];
    }

    items
        .iter()
        .map(|item| {
            TableRow::Record(def.columns.iter().map(|col| format_cell(item, col)).collect())
        })
        .collect()
}

/// Cell text for one column of `item`
pub fn format_cell(item: &Value, col: &ColumnDef) -> String {
    let mut value = extract_json_value(item, &col.json_path);
    if value == "-" {
        return value;
    }

    if col.date_only {
        if let Some((date, _)) = value.split_once('T') {
            value = date.to_string();
        }
    }

    match &col.prefix {
        Some(prefix) => format!("{}{}", prefix, value),
        None => value,
    }
}

/// State of the single-record detail panel
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState {
    #[default]
    Empty,
    Loading,
    Loaded(Value),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ListView {
    pub selected: usize,
    pub scroll_offset: usize,
    pub viewport_height: usize,
    pub selected_id: Option<RecordId>,
    pub detail: DetailState,
}

impl Default for ListView {
    fn default() -> Self {
        Self::new()
    }
}

impl ListView {
    pub fn new() -> Self {
        Self {
            selected: 0,
            scroll_offset: 0,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            selected_id: None,
            detail: DetailState::Empty,
        }
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    pub fn selected_item<'a>(&self, items: &'a [Value]) -> Option<&'a Value> {
        items.get(self.selected)
    }

    /// Keep the cursor inside the list after it changed size
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn go_to_top(&mut self) {
        self.selected = 0;
    }

    pub fn go_to_bottom(&mut self, len: usize) {
        if len > 0 {
            self.selected = len - 1;
        }
    }

    pub fn page_down(&mut self, page_size: usize, len: usize) {
        if len > 0 {
            self.selected = (self.selected + page_size).min(len - 1);
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
    }

    // =========================================================================
    // Virtual Scrolling
    // =========================================================================

    /// Update the viewport height (called from UI during render)
    pub fn update_viewport(&mut self, height: usize) {
        self.viewport_height = height.max(1);
    }

    /// Ensure the selected row is visible in the viewport
    pub fn ensure_visible(&mut self, len: usize) {
        if len == 0 {
            self.scroll_offset = 0;
            return;
        }

        let visible_height = self.viewport_height;

        if self.selected < self.scroll_offset + SCROLL_MARGIN {
            self.scroll_offset = self.selected.saturating_sub(SCROLL_MARGIN);
        } else if self.selected >= self.scroll_offset + visible_height.saturating_sub(SCROLL_MARGIN)
        {
            self.scroll_offset = self
                .selected
                .saturating_sub(visible_height.saturating_sub(SCROLL_MARGIN + 1));
        }

        let max_offset = len.saturating_sub(visible_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    /// Range of rows to render
    pub fn visible_range(&self, len: usize) -> Range<usize> {
        let start = self.scroll_offset.min(len);
        let end = (self.scroll_offset + self.viewport_height).min(len);
        start..end
    }

    // =========================================================================
    // Detail
    // =========================================================================

    /// Select a record for the detail panel.
    /// Returns true when the id changed and the detail must be fetched again.
    pub fn select_for_detail(&mut self, id: Option<RecordId>) -> bool {
        if self.selected_id == id {
            return false;
        }
        self.selected_id = id;
        self.detail = DetailState::Empty;
        true
    }

    pub fn clear_detail(&mut self) {
        self.selected_id = None;
        self.detail = DetailState::Empty;
    }

    /// Fetch the selected record; does nothing without a selected id.
    /// Resources without a get-one endpoint show the cached row instead.
    pub async fn refresh_detail(&mut self, controller: &mut CrudController) {
        let Some(id) = self.selected_id.clone() else {
            self.detail = DetailState::Empty;
            return;
        };

        if !controller.def().supports(Operation::GetOne) {
            let id_field = &controller.def().id_field;
            self.detail = controller
                .items()
                .iter()
                .find(|item| RecordId::from_record(item, id_field).as_ref() == Some(&id))
                .cloned()
                .map(DetailState::Loaded)
                .unwrap_or(DetailState::Empty);
            return;
        }

        self.detail = DetailState::Loading;
        self.detail = match controller.fetch_one(&id).await {
            Ok(record) => DetailState::Loaded(record),
            Err(e) => DetailState::Failed(e.user_message()),
        };
    }
}
