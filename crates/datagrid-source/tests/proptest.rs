//! Property-based tests for windows and sorting.

use datagrid_source::{
    sort_records, ArraySource, Binding, Dir, OrderBy, PageState, Record, SortState, SqlOptions,
    SqlSource,
};
use proptest::prelude::*;
use rusqlite::Connection;

// ============================================================================
// Test helpers
// ============================================================================

fn rows(values: &[i64]) -> Vec<Record> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Record::new().with("id", i).with("value", *v))
        .collect()
}

fn sql_source(values: &[i64]) -> SqlSource {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE t (id INTEGER, value INTEGER)")
        .unwrap();
    for (i, v) in values.iter().enumerate() {
        conn.execute("INSERT INTO t VALUES (?1, ?2)", (i as i64, *v))
            .unwrap();
    }
    SqlSource::new(conn, SqlOptions::new("SELECT id, value FROM t")).unwrap()
}

fn dir_strategy() -> impl Strategy<Value = Dir> {
    prop_oneof![Just(Dir::Asc), Just(Dir::Desc)]
}

fn sort_strategy() -> impl Strategy<Value = SortState> {
    prop_oneof![
        Just(SortState::unsorted()),
        dir_strategy().prop_map(|dir| SortState::by("value", dir)),
        dir_strategy().prop_map(|dir| SortState::by("id", dir)),
    ]
}

fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.value("id").to_string()).collect()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// A window never exceeds the page size or runs past the total.
    #[test]
    fn window_stays_within_bounds(
        values in prop::collection::vec(-50i64..50, 0..40),
        sort in sort_strategy(),
        page in 1usize..20,
        size in 0usize..10,
    ) {
        let mut binding = Binding::new(ArraySource::new(rows(&values)));
        let window = binding.fetch(&sort, PageState::new(page, size)).unwrap();

        if size > 0 {
            prop_assert!(window.len() <= size);
        }
        prop_assert!(window.start() + window.len() <= window.total());
        prop_assert_eq!(window.total(), values.len());
        prop_assert!(window.is_empty() == values.is_empty());
    }

    /// Same bounds when sort and limit are pushed down to SQL.
    #[test]
    fn pushed_down_window_stays_within_bounds(
        values in prop::collection::vec(-50i64..50, 0..30),
        sort in sort_strategy(),
        page in 1usize..10,
        size in 1usize..8,
    ) {
        let mut binding = Binding::new(sql_source(&values));
        let window = binding.fetch(&sort, PageState::new(page, size)).unwrap();

        prop_assert!(window.len() <= size);
        prop_assert!(window.start() + window.len() <= window.total());
        prop_assert_eq!(window.total(), values.len());
    }

    /// Records with equal sort values keep their source order.
    #[test]
    fn sort_is_stable(
        values in prop::collection::vec(0i64..4, 0..40),
        dir in dir_strategy(),
    ) {
        let mut records = rows(&values);
        sort_records(&mut records, &OrderBy::new("value", dir));

        for pair in records.windows(2) {
            if pair[0].value("value") == pair[1].value("value") {
                let a = pair[0].value("id").as_f64().unwrap();
                let b = pair[1].value("id").as_f64().unwrap();
                prop_assert!(a < b);
            }
        }
    }

    /// Sorting twice by the same ordering changes nothing.
    #[test]
    fn sort_is_idempotent(
        values in prop::collection::vec(0i64..4, 0..40),
        dir in dir_strategy(),
    ) {
        let order = OrderBy::new("value", dir);
        let mut once = rows(&values);
        sort_records(&mut once, &order);
        let mut twice = once.clone();
        sort_records(&mut twice, &order);

        prop_assert_eq!(ids(&once), ids(&twice));
    }

    /// Pushed-down and emulated sorting agree on unique keys.
    #[test]
    fn sql_and_memory_agree(
        values in prop::collection::btree_set(-100i64..100, 0..25),
        dir in dir_strategy(),
        page in 1usize..5,
    ) {
        let values: Vec<i64> = values.into_iter().rev().collect();
        let sort = SortState::by("value", dir);
        let page = PageState::new(page, 5);

        let mut memory = Binding::new(ArraySource::new(rows(&values)));
        let mut sql = Binding::new(sql_source(&values));
        let a = memory.fetch(&sort, page).unwrap();
        let b = sql.fetch(&sort, page).unwrap();

        prop_assert_eq!(ids(a.records()), ids(b.records()));
        prop_assert_eq!(a.start(), b.start());
    }
}
