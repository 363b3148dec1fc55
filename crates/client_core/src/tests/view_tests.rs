use super::*;
use crate::fixtures::{category, ids, with_description};

fn sample_rows() -> Vec<Category> {
    vec![
        with_description(category(1, "Loyer"), "Appartement"),
        category(2, "alimentation"),
        with_description(category(3, "Divers"), "Petites dépenses"),
        category(4, "Transport"),
        category(5, "Santé"),
    ]
}

fn page_ids(page: &TablePage) -> Vec<i64> {
    ids(&page.rows)
}

#[test]
fn descending_sort_reverses_ascending_when_no_ties() {
    let rows = sample_rows();
    for column in [
        CategoryColumn::Name,
        CategoryColumn::CreatedAt,
        CategoryColumn::UpdatedAt,
    ] {
        let mut view = TableView::default();
        view.set_sort(column, SortDirection::Ascending);
        let mut ascending = view.page(&rows).rows;
        view.set_sort(column, SortDirection::Descending);
        let descending = view.page(&rows).rows;
        ascending.reverse();
        assert_eq!(ids(&ascending), ids(&descending), "column {column}");
    }
}

#[test]
fn name_sort_ignores_case() {
    let rows = sample_rows();
    let mut view = TableView::default();
    view.set_sort(CategoryColumn::Name, SortDirection::Ascending);
    assert_eq!(page_ids(&view.page(&rows)), vec![2, 3, 1, 5, 4]);
}

#[test]
fn sort_is_stable_for_ties() {
    let mut rows = sample_rows();
    rows[3].is_active = false;
    let mut view = TableView::default();
    view.set_sort(CategoryColumn::Active, SortDirection::Descending);
    assert_eq!(page_ids(&view.page(&rows)), vec![1, 2, 3, 5, 4]);
}

#[test]
fn toggle_sort_cycles_back_to_base_order() {
    let rows = sample_rows();
    let mut view = TableView::default();
    view.toggle_sort(CategoryColumn::Name);
    assert_eq!(
        view.sorting().map(|sort| sort.direction),
        Some(SortDirection::Ascending)
    );
    view.toggle_sort(CategoryColumn::Name);
    assert_eq!(
        view.sorting().map(|sort| sort.direction),
        Some(SortDirection::Descending)
    );
    view.toggle_sort(CategoryColumn::Name);
    assert_eq!(view.sorting(), None);
    assert_eq!(page_ids(&view.page(&rows)), vec![1, 2, 3, 4, 5]);
}

#[test]
fn filters_match_display_text_case_insensitively() {
    let rows = sample_rows();
    let mut view = TableView::default();
    view.set_filter(CategoryColumn::Description, "APPART");
    assert_eq!(page_ids(&view.page(&rows)), vec![1]);

    view.set_filter(CategoryColumn::Description, "");
    view.set_filter(CategoryColumn::Name, "an");
    assert_eq!(page_ids(&view.page(&rows)), vec![4, 5]);

    view.set_filter(CategoryColumn::Household, "maison");
    assert_eq!(view.filters().len(), 2);
    assert_eq!(view.page(&rows).filtered_rows, 2);
}

#[test]
fn filtering_resets_to_first_page() {
    let rows = (1..=25).map(|id| category(id, &format!("Row {id}"))).collect::<Vec<_>>();
    let mut view = TableView::default();
    view.next_page(&rows);
    assert_eq!(view.page_index(), 1);
    view.set_filter(CategoryColumn::Name, "row");
    assert_eq!(view.page_index(), 0);
}

#[test]
fn name_column_cannot_be_hidden() {
    let mut view = TableView::default();
    assert_eq!(
        view.set_column_visible(CategoryColumn::Name, false),
        Err(ViewError::ColumnNotHideable(CategoryColumn::Name))
    );
    view.set_column_visible(CategoryColumn::Description, false)
        .expect("hide description");
    view.set_column_visible(CategoryColumn::UpdatedAt, true)
        .expect("show updated");
    let columns = view.visible_columns();
    assert!(columns.contains(&CategoryColumn::Name));
    assert!(!columns.contains(&CategoryColumn::Description));
    assert!(columns.contains(&CategoryColumn::UpdatedAt));
}

#[test]
fn pagination_clamps_and_reports_bounds() {
    let rows = (1..=25).map(|id| category(id, &format!("Row {id}"))).collect::<Vec<_>>();
    let mut view = TableView::default();

    let first = view.page(&rows);
    assert_eq!(first.page_count, 3);
    assert!(!first.can_previous());
    assert!(first.can_next());

    view.last_page(&rows);
    let last = view.page(&rows);
    assert_eq!(last.page_index, 2);
    assert_eq!(page_ids(&last), vec![21, 22, 23, 24, 25]);
    assert!(!last.can_next());

    view.next_page(&rows);
    assert_eq!(view.page_index(), 2);

    view.set_page_size(20).expect("page size");
    assert_eq!(view.page_index(), 0);
    assert_eq!(view.page_count(&rows), 2);
    assert_eq!(
        view.set_page_size(15),
        Err(ViewError::UnsupportedPageSize(15))
    );
}

#[test]
fn empty_table_still_has_one_page() {
    let view = TableView::default();
    let page = view.page(&[]);
    assert_eq!(page.page_count, 1);
    assert!(page.rows.is_empty());
}

#[test]
fn page_selection_toggles_only_current_page() {
    let rows = (1..=12).map(|id| category(id, &format!("Row {id}"))).collect::<Vec<_>>();
    let mut view = TableView::default();
    view.toggle_row(CategoryId(12));

    view.toggle_page_selection(&rows);
    assert!(view.is_page_fully_selected(&rows));
    assert_eq!(view.selected_ids().len(), 11);

    view.toggle_page_selection(&rows);
    assert_eq!(view.selected_ids(), vec![CategoryId(12)]);
}

#[test]
fn reset_for_new_rows_clears_selection_and_clamps_page() {
    let rows = (1..=25).map(|id| category(id, &format!("Row {id}"))).collect::<Vec<_>>();
    let mut view = TableView::default();
    view.last_page(&rows);
    view.toggle_row(CategoryId(3));

    let shorter = rows[..5].to_vec();
    view.reset_for_new_rows(&shorter);
    assert_eq!(view.page_index(), 0);
    assert!(view.selected_ids().is_empty());
}

#[test]
fn selected_count_only_covers_filtered_rows() {
    let rows = sample_rows();
    let mut view = TableView::default();
    view.toggle_row(CategoryId(1));
    view.toggle_row(CategoryId(4));
    assert_eq!(view.page(&rows).selected_rows, 2);

    view.set_filter(CategoryColumn::Name, "zzz");
    let page = view.page(&rows);
    assert_eq!(page.filtered_rows, 0);
    assert_eq!(page.selected_rows, 0);
    assert!(view.is_row_selected(CategoryId(1)));

    view.set_filter(CategoryColumn::Name, "trans");
    let page = view.page(&rows);
    assert_eq!((page.selected_rows, page.filtered_rows), (1, 1));

    view.clear_filters();
    assert_eq!(view.page(&rows).selected_rows, 2);
    view.clear_selection();
    assert!(!view.is_row_selected(CategoryId(4)));
    assert_eq!(view.page(&rows).selected_rows, 0);
}

#[test]
fn clear_sort_restores_base_order() {
    let rows = sample_rows();
    let mut view = TableView::default();
    view.set_sort(CategoryColumn::Name, SortDirection::Descending);
    assert_eq!(page_ids(&view.page(&rows)), vec![4, 5, 1, 3, 2]);
    view.clear_sort();
    assert_eq!(view.sorting(), None);
    assert_eq!(page_ids(&view.page(&rows)), vec![1, 2, 3, 4, 5]);
}

#[test]
fn previous_page_stops_at_first() {
    let rows = (1..=25).map(|id| category(id, &format!("Row {id}"))).collect::<Vec<_>>();
    let mut view = TableView::default();
    view.last_page(&rows);
    view.previous_page();
    assert_eq!(view.page_index(), 1);
    view.previous_page();
    view.previous_page();
    assert_eq!(view.page_index(), 0);
}

#[test]
fn move_row_preserves_other_elements_order() {
    let mut rows = sample_rows();
    assert!(move_row(&mut rows, 0, 3));
    assert_eq!(ids(&rows), vec![2, 3, 4, 1, 5]);

    assert!(move_row(&mut rows, 4, 1));
    assert_eq!(ids(&rows), vec![2, 5, 3, 4, 1]);

    let mut sorted = ids(&rows);
    sorted.sort();
    assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
}

#[test]
fn move_row_rejects_out_of_range_indices() {
    let mut rows = sample_rows();
    assert!(!move_row(&mut rows, 0, 9));
    assert!(!move_row(&mut rows, 7, 0));
    assert_eq!(ids(&rows), vec![1, 2, 3, 4, 5]);
}

#[test]
fn move_row_by_id_uses_row_identity() {
    let mut rows = sample_rows();
    assert!(move_row_by_id(&mut rows, CategoryId(5), CategoryId(2)));
    assert_eq!(ids(&rows), vec![1, 5, 2, 3, 4]);
    assert!(!move_row_by_id(&mut rows, CategoryId(5), CategoryId(42)));
}

#[test]
fn parses_column_names() {
    assert_eq!(
        "created-at".parse::<CategoryColumn>(),
        Ok(CategoryColumn::CreatedAt)
    );
    assert_eq!(" Name ".parse::<CategoryColumn>(), Ok(CategoryColumn::Name));
    assert!("budget".parse::<CategoryColumn>().is_err());
}
