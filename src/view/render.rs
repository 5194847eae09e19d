//! List rendering boundary
//!
//! The synchronizer emits `RenderPatch`es; a `ListRenderer` applies them.
//! `ListView` keeps one owned handle per row. Updates mutate the handle's
//! fields in place, so control bindings survive every patch.

use serde::{Deserialize, Serialize};

use super::model::{ItemRowView, EMPTY_LIST_PLACEHOLDER};

/// Incremental change to the rendered list
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPatch {
    /// Replace all rows (initial render)
    Reset(Vec<ItemRowView>),
    Prepend(ItemRowView),
    Update(ItemRowView),
    Remove(i64),
    ShowPlaceholder,
    HidePlaceholder,
    /// Set a row's checkbox without touching the rest of it
    SetChecked { item_id: i64, checked: bool },
    /// Inline error under a row; None clears it
    RowError { item_id: i64, message: Option<String> },
}

pub trait ListRenderer: Send + 'static {
    fn reset(&mut self, rows: &[ItemRowView]);

    fn prepend(&mut self, row: &ItemRowView);

    /// Returns false when no row exists for the item
    fn update(&mut self, row: &ItemRowView) -> bool;

    fn remove(&mut self, item_id: i64) -> bool;

    fn set_placeholder(&mut self, visible: bool);

    fn set_checked(&mut self, item_id: i64, checked: bool) -> bool;

    fn set_row_error(&mut self, item_id: i64, message: Option<&str>) -> bool;

    /// Missing rows are logged and skipped
    fn apply(&mut self, patch: &RenderPatch) {
        let found = match patch {
            RenderPatch::Reset(rows) => {
                self.reset(rows);
                true
            }
            RenderPatch::Prepend(row) => {
                self.prepend(row);
                true
            }
            RenderPatch::Update(row) => self.update(row),
            RenderPatch::Remove(item_id) => self.remove(*item_id),
            RenderPatch::ShowPlaceholder => {
                self.set_placeholder(true);
                true
            }
            RenderPatch::HidePlaceholder => {
                self.set_placeholder(false);
                true
            }
            RenderPatch::SetChecked { item_id, checked } => self.set_checked(*item_id, *checked),
            RenderPatch::RowError { item_id, message } => self.set_row_error(*item_id, message.as_deref()),
        };
        if !found {
            log::warn!("render target missing for {:?}", patch);
        }
    }
}

/// Stable identity of an interactive control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Control {
    PurchasedCheckbox,
    DeleteButton,
    ImageUpload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBindings {
    pub checkbox: ControlId,
    pub delete: ControlId,
    pub upload: ControlId,
}

impl RowBindings {
    fn control(&self, id: ControlId) -> Option<Control> {
        if id == self.checkbox {
            Some(Control::PurchasedCheckbox)
        } else if id == self.delete {
            Some(Control::DeleteButton)
        } else if id == self.upload {
            Some(Control::ImageUpload)
        } else {
            None
        }
    }
}

/// Owned handle of one rendered row
#[derive(Debug, Clone, PartialEq)]
pub struct RowHandle {
    pub item_id: i64,
    pub bindings: RowBindings,
    pub view: ItemRowView,
    /// Checkbox state as displayed (may lead the record while a write is pending)
    pub checked: bool,
    pub error: Option<String>,
}

/// In-memory list surface
#[derive(Debug, Default)]
pub struct ListView {
    rows: Vec<RowHandle>,
    placeholder: bool,
    next_control: u64,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[RowHandle] {
        &self.rows
    }

    pub fn row(&self, item_id: i64) -> Option<&RowHandle> {
        self.rows.iter().find(|r| r.item_id == item_id)
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        self.placeholder.then_some(EMPTY_LIST_PLACEHOLDER)
    }

    /// Which row and control an interaction came from
    pub fn control_target(&self, id: ControlId) -> Option<(i64, Control)> {
        self.rows
            .iter()
            .find_map(|r| r.bindings.control(id).map(|c| (r.item_id, c)))
    }

    fn bind(&mut self) -> RowBindings {
        let mut next = || {
            self.next_control += 1;
            ControlId(self.next_control)
        };
        RowBindings {
            checkbox: next(),
            delete: next(),
            upload: next(),
        }
    }

    fn handle(&mut self, view: &ItemRowView) -> RowHandle {
        RowHandle {
            item_id: view.item_id,
            bindings: self.bind(),
            view: view.clone(),
            checked: view.is_purchased,
            error: None,
        }
    }

    fn row_mut(&mut self, item_id: i64) -> Option<&mut RowHandle> {
        self.rows.iter_mut().find(|r| r.item_id == item_id)
    }
}

impl ListRenderer for ListView {
    fn reset(&mut self, rows: &[ItemRowView]) {
        let handles: Vec<RowHandle> = rows.iter().map(|view| self.handle(view)).collect();
        self.rows = handles;
        self.placeholder = self.rows.is_empty();
    }

    fn prepend(&mut self, row: &ItemRowView) {
        let handle = self.handle(row);
        self.rows.insert(0, handle);
    }

    fn update(&mut self, row: &ItemRowView) -> bool {
        match self.row_mut(row.item_id) {
            Some(handle) => {
                handle.view = row.clone();
                handle.checked = row.is_purchased;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, item_id: i64) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.item_id != item_id);
        self.rows.len() != before
    }

    fn set_placeholder(&mut self, visible: bool) {
        self.placeholder = visible;
    }

    fn set_checked(&mut self, item_id: i64, checked: bool) -> bool {
        match self.row_mut(item_id) {
            Some(handle) => {
                handle.checked = checked;
                true
            }
            None => false,
        }
    }

    fn set_row_error(&mut self, item_id: i64, message: Option<&str>) -> bool {
        match self.row_mut(item_id) {
            Some(handle) => {
                handle.error = message.map(str::to_string);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShoppingItem;

    fn row(id: i64, name: &str, purchased: bool) -> ItemRowView {
        let mut item = ShoppingItem::new(1, 1, name.to_string(), 100.0);
        item.id = id;
        item.is_purchased = purchased;
        ItemRowView::from_item(&item)
    }

    #[test]
    fn test_update_keeps_bindings() {
        let mut view = ListView::new();
        view.apply(&RenderPatch::Reset(vec![row(1, "Kalire", false)]));
        let bindings = view.row(1).unwrap().bindings;

        view.apply(&RenderPatch::Update(row(1, "Kalire (gold)", true)));
        let handle = view.row(1).unwrap();
        assert_eq!(handle.bindings, bindings);
        assert_eq!(handle.view.name, "Kalire (gold)");
        assert!(handle.checked);
        assert_eq!(view.control_target(bindings.checkbox), Some((1, Control::PurchasedCheckbox)));
    }

    #[test]
    fn test_placeholder_and_ordering() {
        let mut view = ListView::new();
        view.apply(&RenderPatch::Reset(vec![]));
        assert_eq!(view.placeholder(), Some(EMPTY_LIST_PLACEHOLDER));

        view.apply(&RenderPatch::Prepend(row(1, "Old", false)));
        view.apply(&RenderPatch::Prepend(row(2, "New", false)));
        view.apply(&RenderPatch::HidePlaceholder);
        let ids: Vec<i64> = view.rows().iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(view.placeholder().is_none());
    }

    #[test]
    fn test_missing_rows_are_skipped() {
        let mut view = ListView::new();
        view.apply(&RenderPatch::Update(row(9, "Ghost", false)));
        view.apply(&RenderPatch::Remove(9));
        view.apply(&RenderPatch::SetChecked { item_id: 9, checked: true });
        assert!(view.rows().is_empty());
    }

    #[test]
    fn test_row_error() {
        let mut view = ListView::new();
        view.apply(&RenderPatch::Reset(vec![row(1, "Sehra", false)]));
        view.apply(&RenderPatch::RowError {
            item_id: 1,
            message: Some("Failed to update item status.".to_string()),
        });
        assert_eq!(view.row(1).unwrap().error.as_deref(), Some("Failed to update item status."));
    }
}
