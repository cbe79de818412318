use indexmap::IndexMap;
use progrid_engine::{CustomizationEntry, Grid, Row, Value};
use progrid_model::SortRule;

fn person(name: &str, age: i64) -> Row {
    Row::from_iter([
        ("name", Value::from(name)),
        ("age", Value::from(age)),
    ])
}

fn grid(data: Vec<Row>) -> Grid {
    let mut grid = Grid::new();
    grid.set_headers(IndexMap::from([
        ("name".to_string(), "Name".to_string()),
        ("age".to_string(), "Age".to_string()),
    ]));
    grid.set_columns(vec!["name".to_string(), "age".to_string()]);
    grid.set_data(data);
    grid
}

fn names(grid: &Grid) -> Vec<String> {
    grid.view()
        .expect("view should be computed")
        .rows
        .iter()
        .map(|row| match row.row.get("name") {
            Some(Value::Text(s)) => s.clone(),
            other => panic!("unexpected name cell: {other:?}"),
        })
        .collect()
}

#[test]
fn comparator_filter_keeps_relative_order_without_a_sort_rule() {
    let mut grid = grid(vec![person("a", 1), person("b", 3), person("c", 5)]);
    let errors = grid.set_filter_expressions([("age", "> 2")]);
    assert!(errors.is_empty());
    grid.recompute().unwrap();
    assert_eq!(names(&grid), ["b", "c"]);
}

#[test]
fn sort_rule_orders_the_filtered_rows() {
    let mut grid = grid(vec![person("a", 1), person("b", 3), person("c", 5)]);
    grid.set_filter_expressions([("age", "> 2")]);
    grid.set_row_sorting(vec![SortRule::descending("age")]);
    grid.recompute().unwrap();
    assert_eq!(names(&grid), ["c", "b"]);
}

#[test]
fn placeholder_filter_selects_by_prefix() {
    let mut grid = grid(vec![
        person("Mario", 34),
        person("Luigi", 32),
        person("Martin", 28),
    ]);
    let errors = grid.set_filter_expressions([("name", "$VAL.startswith('M')")]);
    assert!(errors.is_empty());
    grid.recompute().unwrap();
    assert_eq!(names(&grid), ["Mario", "Martin"]);
}

#[test]
fn original_index_survives_filtering_and_sorting() {
    let data = vec![
        person("a", 5),
        person("b", 1),
        person("c", 4),
        person("d", 2),
    ];
    let mut grid = grid(data.clone());
    grid.set_filter_expressions([("age", "> 1")]);
    grid.set_row_sorting(vec![SortRule::ascending("age")]);
    let view = grid.recompute().unwrap();

    assert_eq!(
        view.rows
            .iter()
            .map(|row| row.original_index)
            .collect::<Vec<_>>(),
        [3, 2, 0]
    );
    for row in &view.rows {
        assert_eq!(row.row, data[row.original_index]);
    }
}

#[test]
fn empty_state_triggers_on_zero_rows() {
    let mut grid = grid(Vec::new());
    let view = grid.recompute().unwrap();
    assert!(view.empty_state);
    assert!(view.rows.is_empty());
    assert_eq!(grid.text_no_data(), "No data found.");
}

#[test]
fn empty_state_triggers_on_forced_filtering_without_filters() {
    let mut grid = grid(vec![person("a", 1)]);
    grid.set_force_filtering(true);
    assert!(grid.recompute().unwrap().empty_state);

    // Installing any filter lifts the forced empty state.
    grid.set_filter_expressions([("age", "> 0")]);
    assert!(!grid.recompute().unwrap().empty_state);
}

#[test]
fn empty_state_does_not_trigger_when_filtering_matches_nothing() {
    let mut grid = grid(vec![person("a", 1)]);
    grid.set_filter_expressions([("age", "> 99")]);
    let view = grid.recompute().unwrap();
    assert!(!view.empty_state);
    assert!(view.rows.is_empty());
}

#[test]
fn rows_missing_a_filtered_column_are_excluded() {
    let mut grid = grid(vec![
        person("a", 3),
        Row::from_iter([("name", Value::from("no-age"))]),
    ]);
    grid.set_filter_expressions([("age", "> 2")]);
    grid.recompute().unwrap();
    assert_eq!(names(&grid), ["a"]);
}

#[test]
fn update_single_row_touches_only_the_targeted_slot() {
    let mut grid = grid(vec![person("a", 1), person("b", 3), person("c", 5)]);
    let before = grid.recompute().unwrap().clone();

    grid.update_single_row(1, person("B", 99)).unwrap();
    let after = grid.view().unwrap();

    assert_eq!(after.rows[0], before.rows[0]);
    assert_eq!(after.rows[2], before.rows[2]);
    assert_eq!(after.rows[1].row.get("name"), Some(&Value::from("B")));
    assert_eq!(after.rows[1].row.get("age"), Some(&Value::from(99)));
}

#[test]
fn update_single_row_leaves_stale_positions_until_recompute() {
    let mut grid = grid(vec![person("a", 1), person("b", 3), person("c", 5)]);
    grid.set_filter_expressions([("age", "> 0")]);
    grid.recompute().unwrap();

    // The replacement would be filtered out, but stays visible for now.
    grid.update_single_row(0, person("zero", 0)).unwrap();
    assert_eq!(names(&grid), ["zero", "b", "c"]);

    grid.recompute().unwrap();
    assert_eq!(names(&grid), ["b", "c"]);
}

#[test]
fn update_single_row_without_a_view_is_an_error() {
    let mut grid = grid(vec![person("a", 1)]);
    assert!(grid.update_single_row(0, person("x", 2)).is_err());

    grid.recompute().unwrap();
    assert!(grid.update_single_row(5, person("x", 2)).is_err());
}

#[test]
fn search_filters_match_any_listed_column_by_substring() {
    let mut grid = grid(vec![
        person("Mario", 34),
        person("Luigi", 32),
        person("Carmen", 41),
    ]);
    // Searching installs a contains filter per column; per-column AND
    // semantics mean every listed column must contain the needle.
    grid.set_row_filters(Grid::search_filters("AR", &["name"]));
    grid.recompute().unwrap();
    assert_eq!(names(&grid), ["Mario", "Carmen"]);
}

#[test]
fn customization_selects_columns_and_compiles_filters_in_one_pass() {
    let mut grid = grid(vec![person("Mario", 15), person("Luigi", 10)]);
    grid.set_col_order(vec!["name".to_string(), "age".to_string()]);

    let errors = grid.apply_customization([
        CustomizationEntry {
            column: "age".to_string(),
            selected: false,
            expression: "> 14".to_string(),
        },
        CustomizationEntry {
            column: "name".to_string(),
            selected: true,
            expression: String::new(),
        },
    ]);
    assert!(errors.is_empty());

    // The age column is hidden but its filter still applies.
    assert_eq!(grid.columns(), ["name"]);
    grid.recompute().unwrap();
    assert_eq!(names(&grid), ["Mario"]);
}
