//! Property-based tests for link round-trips and header state.

use datagrid_render::{Column, Links, RenderContext, RequestContext, StateCoordinator, UrlFormat};
use datagrid_source::{Dir, PageState, Record, RecordWindow, SortState};
use proptest::prelude::*;

// ============================================================================
// Test helpers
// ============================================================================

fn dir_strategy() -> impl Strategy<Value = Dir> {
    prop_oneof![Just(Dir::Asc), Just(Dir::Desc)]
}

fn any_sortable(_: &str) -> Option<Dir> {
    Some(Dir::Asc)
}

fn templated() -> StateCoordinator {
    let format = UrlFormat::new("/people/:page/:orderBy/:direction", Some("/index.php")).unwrap();
    StateCoordinator::new().with_url_format(format)
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// A query-string link parses back to the state it was built for.
    #[test]
    fn query_link_round_trips(
        field in "[a-zA-Z][a-zA-Z0-9 _&=%/?#+-]{0,12}",
        dir in dir_strategy(),
        page in 1usize..500,
        size in 1usize..50,
        extra in "[a-z0-9 &=]{0,8}",
    ) {
        let coordinator = StateCoordinator::new();
        let request = RequestContext::new("/people").param("tab", extra.clone());
        let sort = SortState::by(field, dir);

        let href = coordinator.link(&request, &sort, PageState::new(page, size));
        let incoming = RequestContext::from_url(&href);
        let state = coordinator.parse(&incoming, any_sortable);

        prop_assert_eq!(state.sort, Some(sort));
        prop_assert_eq!(state.page, Some(page));
        prop_assert_eq!(incoming.get("tab"), Some(extra.as_str()));
    }

    /// A templated link parses back to the state it was built for.
    #[test]
    fn template_link_round_trips(
        field in "[a-zA-Z][a-zA-Z0-9 _%/?#.:-]{0,12}|[a-z]{1,4}:(page|orderBy|direction)",
        dir in dir_strategy(),
        page in 1usize..500,
        paged in any::<bool>(),
    ) {
        let coordinator = templated();
        let sort = SortState::by(field, dir);
        let page_state = if paged { PageState::new(page, 10) } else { PageState::unbounded() };

        let href = coordinator.link(&RequestContext::new("/"), &sort, page_state);
        let state = coordinator.parse(&RequestContext::new("/").path(href), any_sortable);

        prop_assert_eq!(state.sort, Some(sort));
        prop_assert_eq!(state.page, paged.then_some(page));
    }

    /// Header links toggle the active column and use defaults elsewhere.
    #[test]
    fn header_links_encode_next_direction(
        active in 0usize..3,
        dir in dir_strategy(),
        defaults in prop::collection::vec(dir_strategy(), 3),
    ) {
        let columns: Vec<Column> = ["a", "b", "c"]
            .iter()
            .zip(&defaults)
            .map(|(field, default)| Column::new(*field).default_dir(*default))
            .collect();
        let window = RecordWindow::new(
            vec![Record::new().with("a", 1)],
            1,
            SortState::by(columns[active].field.clone(), dir),
            PageState::new(1, 10),
        );
        let coordinator = StateCoordinator::new();
        let request = RequestContext::new("/grid");
        let ctx = RenderContext::new(&columns, &window, Links::new(&coordinator, &request));

        for (i, cell) in ctx.header_cells().into_iter().enumerate() {
            let expected = if i == active { dir.opposite() } else { defaults[i] };
            prop_assert_eq!(cell.next, Some(expected));

            let href = cell.href.unwrap();
            let state = coordinator.parse(&RequestContext::from_url(&href), any_sortable);
            prop_assert_eq!(state.sort, Some(SortState::by(columns[i].field.clone(), expected)));
            prop_assert_eq!(state.page, Some(1));
        }
    }
}
