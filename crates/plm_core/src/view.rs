use crate::filter::{FilterOptions, TaskFilter, filter_tasks};
use crate::model::Task;
use crate::sort::{SortKey, SortOrder, sort_tasks};
use crate::summary::{TaskTotals, task_totals};

/// Everything the user picked: filter selections plus the sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filter: TaskFilter,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewResult {
    pub tasks: Vec<Task>,
    pub totals: TaskTotals,
}

/// Runs the display pipeline against the full base list. The base list is
/// never modified.
pub fn compute_view(base: &[Task], query: &Query, options: &FilterOptions) -> ViewResult {
    let mut sorted = base.to_vec();
    sort_tasks(&mut sorted, query.sort_key, query.sort_order);
    let tasks = filter_tasks(&sorted, &query.filter, options);
    let totals = task_totals(&tasks);

    ViewResult { tasks, totals }
}

#[cfg(test)]
mod tests {
    use super::{Query, compute_view};
    use crate::filter::{FilterOptions, TaskFilter};
    use crate::model::{Field, Task};
    use crate::sort::{SortKey, SortOrder};
    use time::macros::datetime;

    fn task(id: i64, vehicle_id: i64, duration: u64, size: f64) -> Task {
        Task {
            id,
            field_id: id,
            vehicle_id,
            attachment_id: 1,
            description: format!("Auftrag {id}"),
            duration,
            field: Some(Field {
                id,
                name: format!("Feld {id}"),
                farm_id: None,
                farm_name: None,
                size: Some(size),
            }),
            vehicle: None,
            attachment: None,
            begin_date: datetime!(2024-05-01 08:00 UTC),
            end_date: None,
            year: None,
            crop_id: None,
            crop_name: None,
            field_info: None,
        }
    }

    fn base() -> Vec<Task> {
        vec![
            task(1, 1, 600, 1.0),
            task(2, 2, 1800, 2.0),
            task(3, 1, 1200, 3.0),
        ]
    }

    fn options() -> FilterOptions {
        FilterOptions {
            vehicles: [1, 2].into(),
            ..FilterOptions::default()
        }
    }

    #[test]
    fn sorts_filters_and_totals_without_touching_the_base() {
        let base = base();
        let query = Query {
            filter: TaskFilter {
                vehicles: [1].into(),
                ..TaskFilter::default()
            },
            sort_key: SortKey::Duration,
            sort_order: SortOrder::Desc,
        };

        let view = compute_view(&base, &query, &options());

        assert_eq!(view.tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(view.totals.task_count, 2);
        assert_eq!(view.totals.managed_area, 4.0);
        assert_eq!(base, self::base());
    }

    #[test]
    fn same_query_gives_same_view() {
        let base = base();
        let query = Query {
            sort_key: SortKey::Size,
            sort_order: SortOrder::Asc,
            ..Query::default()
        };

        let first = compute_view(&base, &query, &options());
        let second = compute_view(&base, &query, &options());
        assert_eq!(first, second);
        assert_eq!(first.tasks.len(), 3);
    }

    #[test]
    fn filtering_never_reorders() {
        let base = base();
        let unfiltered = compute_view(&base, &Query::default(), &options());
        let query = Query {
            filter: TaskFilter {
                search: "auftrag".to_string(),
                vehicles: [1].into(),
                ..TaskFilter::default()
            },
            ..Query::default()
        };
        let filtered = compute_view(&base, &query, &options());

        let positions: Vec<usize> = filtered
            .tasks
            .iter()
            .map(|task| {
                unfiltered
                    .tasks
                    .iter()
                    .position(|candidate| candidate.id == task.id)
                    .unwrap()
            })
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
