//! Property tests for windows fetched through a grid.

use datagrid::{
    BindOptions, Column, DataGrid, Dir, FillTarget, GridConfig, Pager, PagerOptions, Record,
    RequestContext,
};
use proptest::prelude::*;

fn grid(rows: usize, page_size: usize) -> DataGrid {
    let records: Vec<Record> = (0..rows)
        .map(|i| Record::new().with("id", i as i64).with("bucket", (i % 3) as i64))
        .collect();
    let mut grid = DataGrid::with_config(GridConfig::default().page_size(page_size)).unwrap();
    grid.bind(records, &BindOptions::default()).unwrap();
    grid.add_column(Column::new("id"));
    grid.add_column(Column::new("bucket"));
    grid
}

proptest! {
    #[test]
    fn window_stays_within_the_page(rows in 0usize..40, size in 1usize..8, page in 1usize..12) {
        let mut grid = grid(rows, size);
        let request = RequestContext::new("/").param("page", page.to_string());
        let window = grid.window(&request).unwrap();

        let pages = window.page().page_count(rows);
        prop_assert!(window.page().page() <= pages);
        prop_assert!(window.len() <= size);
        prop_assert_eq!(window.total(), rows);
        prop_assert_eq!(window.start(), (window.page().page() - 1) * size);
        if page <= pages && rows > 0 {
            prop_assert_eq!(window.page().page(), page);
            prop_assert!(!window.is_empty());
        }
    }

    #[test]
    fn pages_partition_the_sorted_rows(rows in 0usize..30, size in 1usize..6, desc in any::<bool>()) {
        let mut grid = grid(rows, size);
        let dir = if desc { Dir::Desc } else { Dir::Asc };
        grid.set_sort("bucket", dir);

        let pages = grid.page_count().unwrap();
        let mut seen = Vec::new();
        for page in 1..=pages {
            grid.set_page(page);
            let window = grid.window(&RequestContext::default()).unwrap();
            seen.extend(window.iter().map(|r| r.value("bucket").to_string().parse::<i64>().unwrap()));
        }

        prop_assert_eq!(seen.len(), rows);
        let mut expected = seen.clone();
        expected.sort();
        if desc {
            expected.reverse();
        }
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn pager_links_reproduce_their_state(
        rows in 1usize..30,
        size in 1usize..6,
        page in 1usize..8,
        desc in any::<bool>(),
    ) {
        let mut grid = grid(rows, size);
        let dir = if desc { "DESC" } else { "ASC" };
        let request = RequestContext::new("/grid")
            .param("orderBy", "bucket")
            .param("direction", dir)
            .param("page", page.to_string())
            .param("tab", "2");
        let window = grid.window(&request).unwrap();

        let mut pager = Pager::new();
        let options = PagerOptions { delta: 10, ..PagerOptions::default() };
        grid.fill("pager", FillTarget::Pager(&mut pager, options), &request).unwrap();

        for link in &pager.links {
            let followed = grid.window(&RequestContext::from_url(&link.href)).unwrap();
            prop_assert_eq!(followed.sort(), window.sort());
            prop_assert_eq!(followed.page().page(), link.page);
            prop_assert_eq!(followed.page().size(), size);
        }
    }
}
