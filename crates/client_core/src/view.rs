//! Table view state over the cached category list: sorting, column filters,
//! column visibility, pagination, row selection and drag reordering.
//!
//! Everything here works on the in-memory rows only and never talks to the
//! backend.

use std::{cmp::Ordering, collections::BTreeSet, fmt, str::FromStr};

use shared::domain::{Category, CategoryId};
use thiserror::Error;

pub const PAGE_SIZES: [usize; 5] = [10, 20, 30, 40, 50];
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryColumn {
    Name,
    Description,
    Household,
    Status,
    Active,
    CreatedAt,
    UpdatedAt,
}

impl CategoryColumn {
    pub const ALL: [CategoryColumn; 7] = [
        CategoryColumn::Name,
        CategoryColumn::Description,
        CategoryColumn::Household,
        CategoryColumn::Status,
        CategoryColumn::Active,
        CategoryColumn::CreatedAt,
        CategoryColumn::UpdatedAt,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Household => "household",
            Self::Status => "status",
            Self::Active => "active",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Description => "Description",
            Self::Household => "Household",
            Self::Status => "Status",
            Self::Active => "Active",
            Self::CreatedAt => "Created",
            Self::UpdatedAt => "Updated",
        }
    }

    /// The name column identifies the row and always stays visible.
    pub fn can_hide(self) -> bool {
        self != Self::Name
    }

    pub fn display(self, category: &Category) -> String {
        match self {
            Self::Name => category.name.clone(),
            Self::Description => category
                .description
                .clone()
                .filter(|description| !description.is_empty())
                .unwrap_or_else(|| "-".to_string()),
            Self::Household => category.household_name().unwrap_or("-").to_string(),
            Self::Status => category.status_label().to_string(),
            Self::Active => {
                let label = if category.is_active { "yes" } else { "no" };
                label.to_string()
            }
            Self::CreatedAt => category.created_at.format("%Y-%m-%d").to_string(),
            Self::UpdatedAt => category.updated_at.format("%Y-%m-%d").to_string(),
        }
    }

    fn compare(self, a: &Category, b: &Category) -> Ordering {
        match self {
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::Description => lowercase(a.description.as_deref())
                .cmp(&lowercase(b.description.as_deref())),
            Self::Household => {
                lowercase(a.household_name()).cmp(&lowercase(b.household_name()))
            }
            Self::Status => a
                .status_label()
                .to_lowercase()
                .cmp(&b.status_label().to_lowercase()),
            Self::Active => a.is_active.cmp(&b.is_active),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

fn lowercase(value: Option<&str>) -> Option<String> {
    value.map(str::to_lowercase)
}

impl fmt::Display for CategoryColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CategoryColumn {
    type Err = ViewError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|column| column.key() == normalized)
            .ok_or_else(|| ViewError::UnknownColumn(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("column '{0}' cannot be hidden")]
    ColumnNotHideable(CategoryColumn),
    #[error("unsupported page size {0}; expected one of 10, 20, 30, 40, 50")]
    UnsupportedPageSize(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: CategoryColumn,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: CategoryColumn,
    pub query: String,
}

impl ColumnFilter {
    fn matches(&self, category: &Category) -> bool {
        self.column
            .display(category)
            .to_lowercase()
            .contains(&self.query.to_lowercase())
    }
}

/// One rendered page of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    pub columns: Vec<CategoryColumn>,
    pub rows: Vec<Category>,
    pub page_index: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub filtered_rows: usize,
    pub selected_rows: usize,
}

impl TablePage {
    pub fn can_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next(&self) -> bool {
        self.page_index + 1 < self.page_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    sorting: Option<SortState>,
    filters: Vec<ColumnFilter>,
    hidden: BTreeSet<CategoryColumn>,
    page_index: usize,
    page_size: usize,
    selection: BTreeSet<CategoryId>,
}

impl Default for TableView {
    fn default() -> Self {
        Self {
            sorting: None,
            filters: Vec::new(),
            hidden: BTreeSet::from([CategoryColumn::UpdatedAt]),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            selection: BTreeSet::new(),
        }
    }
}

impl TableView {
    pub fn sorting(&self) -> Option<SortState> {
        self.sorting
    }

    pub fn set_sort(&mut self, column: CategoryColumn, direction: SortDirection) {
        self.sorting = Some(SortState { column, direction });
    }

    /// Cycles a column through ascending, descending and unsorted.
    pub fn toggle_sort(&mut self, column: CategoryColumn) {
        self.sorting = match self.sorting {
            Some(SortState {
                column: current,
                direction: SortDirection::Ascending,
            }) if current == column => Some(SortState {
                column,
                direction: SortDirection::Descending,
            }),
            Some(SortState {
                column: current,
                direction: SortDirection::Descending,
            }) if current == column => None,
            _ => Some(SortState {
                column,
                direction: SortDirection::Ascending,
            }),
        };
    }

    pub fn clear_sort(&mut self) {
        self.sorting = None;
    }

    pub fn filters(&self) -> &[ColumnFilter] {
        &self.filters
    }

    /// Sets or replaces the filter of a column. An empty query removes it.
    pub fn set_filter(&mut self, column: CategoryColumn, query: impl Into<String>) {
        let query = query.into();
        self.filters.retain(|filter| filter.column != column);
        if !query.trim().is_empty() {
            self.filters.push(ColumnFilter {
                column,
                query: query.trim().to_string(),
            });
        }
        self.page_index = 0;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page_index = 0;
    }

    pub fn set_column_visible(
        &mut self,
        column: CategoryColumn,
        visible: bool,
    ) -> Result<(), ViewError> {
        if visible {
            self.hidden.remove(&column);
            return Ok(());
        }
        if !column.can_hide() {
            return Err(ViewError::ColumnNotHideable(column));
        }
        self.hidden.insert(column);
        Ok(())
    }

    pub fn is_column_visible(&self, column: CategoryColumn) -> bool {
        !self.hidden.contains(&column)
    }

    pub fn visible_columns(&self) -> Vec<CategoryColumn> {
        CategoryColumn::ALL
            .into_iter()
            .filter(|column| self.is_column_visible(*column))
            .collect()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ViewError> {
        if !PAGE_SIZES.contains(&page_size) {
            return Err(ViewError::UnsupportedPageSize(page_size));
        }
        self.page_size = page_size;
        self.page_index = 0;
        Ok(())
    }

    pub fn page_count(&self, rows: &[Category]) -> usize {
        self.filtered(rows).len().div_ceil(self.page_size).max(1)
    }

    /// Jumps to a page, clamped to the last available one.
    pub fn set_page(&mut self, page_index: usize, rows: &[Category]) {
        self.page_index = page_index.min(self.page_count(rows) - 1);
    }

    pub fn first_page(&mut self) {
        self.page_index = 0;
    }

    pub fn previous_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    pub fn next_page(&mut self, rows: &[Category]) {
        self.set_page(self.page_index + 1, rows);
    }

    pub fn last_page(&mut self, rows: &[Category]) {
        self.set_page(usize::MAX, rows);
    }

    pub fn toggle_row(&mut self, id: CategoryId) -> bool {
        if self.selection.remove(&id) {
            false
        } else {
            self.selection.insert(id);
            true
        }
    }

    pub fn set_row_selected(&mut self, id: CategoryId, selected: bool) {
        if selected {
            self.selection.insert(id);
        } else {
            self.selection.remove(&id);
        }
    }

    pub fn is_row_selected(&self, id: CategoryId) -> bool {
        self.selection.contains(&id)
    }

    pub fn selected_ids(&self) -> Vec<CategoryId> {
        self.selection.iter().copied().collect()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_page_fully_selected(&self, rows: &[Category]) -> bool {
        let page = self.page_rows(rows);
        !page.is_empty() && page.iter().all(|row| self.selection.contains(&row.id))
    }

    /// Selects every row of the current page, or clears them when the whole
    /// page was already selected.
    pub fn toggle_page_selection(&mut self, rows: &[Category]) {
        let select = !self.is_page_fully_selected(rows);
        let ids = self
            .page_rows(rows)
            .into_iter()
            .map(|row| row.id)
            .collect::<Vec<_>>();
        for id in ids {
            self.set_row_selected(id, select);
        }
    }

    /// Called after the row set was replaced by a fetch.
    pub fn reset_for_new_rows(&mut self, rows: &[Category]) {
        self.selection.clear();
        self.set_page(self.page_index, rows);
    }

    pub fn filtered<'a>(&self, rows: &'a [Category]) -> Vec<&'a Category> {
        let mut visible = rows
            .iter()
            .filter(|row| self.filters.iter().all(|filter| filter.matches(row)))
            .collect::<Vec<_>>();
        if let Some(SortState { column, direction }) = self.sorting {
            // `sort_by` is stable, so ties keep their base order.
            match direction {
                SortDirection::Ascending => visible.sort_by(|a, b| column.compare(a, b)),
                SortDirection::Descending => visible.sort_by(|a, b| column.compare(b, a)),
            }
        }
        visible
    }

    pub fn page_rows<'a>(&self, rows: &'a [Category]) -> Vec<&'a Category> {
        self.filtered(rows)
            .into_iter()
            .skip(self.page_index * self.page_size)
            .take(self.page_size)
            .collect()
    }

    pub fn page(&self, rows: &[Category]) -> TablePage {
        let filtered = self.filtered(rows);
        let selected_rows = filtered
            .iter()
            .filter(|row| self.selection.contains(&row.id))
            .count();
        TablePage {
            columns: self.visible_columns(),
            rows: self.page_rows(rows).into_iter().cloned().collect(),
            page_index: self.page_index,
            page_count: self.page_count(rows),
            page_size: self.page_size,
            filtered_rows: filtered.len(),
            selected_rows,
        }
    }
}

/// Moves one row from `from` to `to`, shifting the rows in between by one.
/// Returns false and leaves the rows untouched when an index is out of range.
pub fn move_row(rows: &mut Vec<Category>, from: usize, to: usize) -> bool {
    if from >= rows.len() || to >= rows.len() {
        return false;
    }
    if from != to {
        let row = rows.remove(from);
        rows.insert(to, row);
    }
    true
}

/// Drag-and-drop variant addressed by row identity: `active` is dropped onto
/// the position currently held by `over`.
pub fn move_row_by_id(rows: &mut Vec<Category>, active: CategoryId, over: CategoryId) -> bool {
    let from = rows.iter().position(|row| row.id == active);
    let to = rows.iter().position(|row| row.id == over);
    match (from, to) {
        (Some(from), Some(to)) => move_row(rows, from, to),
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
