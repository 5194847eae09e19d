//! Task list commands

use chrono::NaiveDate;
use serde_json::json;

use crate::domain::{DomainError, DomainResult, Task, TaskFilter, TaskSort};
use crate::repository::{Query, Record, Repository, TableRepository};
use crate::view::{task_row_view, TaskRowView};
use crate::AppState;

use super::required_text;

fn repo(state: &AppState) -> TableRepository<Task> {
    TableRepository::new(state.store.clone())
}

fn patch(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

/// Task ids must belong to the current group
async fn find_task(state: &AppState, group_id: i64, task_id: i64) -> DomainResult<Task> {
    repo(state)
        .find_one(&Query::new().eq("id", task_id).eq("group_id", group_id))
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("task {}", task_id)))
}

pub async fn list_tasks(
    state: &AppState,
    filter: TaskFilter,
    sort: TaskSort,
    today: NaiveDate,
) -> DomainResult<Vec<TaskRowView>> {
    let ctx = state.session().await?;
    let mut query = Query::new().eq("group_id", ctx.group_id);
    if let Some(completed) = filter.completed() {
        query = query.eq("is_completed", completed);
    }
    let (column, ascending, nulls_last) = sort.ordering();
    query = query.order_by(column, ascending);
    if nulls_last {
        query = query.nulls_last();
    }

    let tasks = repo(state).list_where(&query).await?;
    Ok(tasks.iter().map(|t| task_row_view(t, today)).collect())
}

pub async fn add_task(state: &AppState, description: &str, due_date: Option<NaiveDate>) -> DomainResult<Task> {
    let ctx = state.session().await?;
    let description = required_text(description, "task description")?;
    let mut task = Task::new(ctx.group_id, description, due_date);
    task.created_by = Some(ctx.user.id);
    repo(state).create(&task).await
}

pub async fn toggle_task(state: &AppState, task_id: i64, completed: bool) -> DomainResult<Task> {
    let ctx = state.session().await?;
    find_task(state, ctx.group_id, task_id).await?;
    repo(state).patch(task_id, patch(json!({ "is_completed": completed }))).await
}

/// Change a task's text. Blank or unchanged text leaves it as is (None).
pub async fn edit_task(state: &AppState, task_id: i64, description: &str) -> DomainResult<Option<Task>> {
    let ctx = state.session().await?;
    let task = find_task(state, ctx.group_id, task_id).await?;
    let description = description.trim();
    if description.is_empty() || description == task.description {
        return Ok(None);
    }
    let updated = repo(state)
        .patch(task_id, patch(json!({ "description": description })))
        .await?;
    Ok(Some(updated))
}

pub async fn delete_task(state: &AppState, task_id: i64) -> DomainResult<()> {
    let ctx = state.session().await?;
    find_task(state, ctx.group_id, task_id).await?;
    repo(state).delete(task_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::setup_test_state;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    async fn descriptions(state: &AppState, filter: TaskFilter, sort: TaskSort) -> Vec<String> {
        list_tasks(state, filter, sort, date(3))
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.description)
            .collect()
    }

    #[tokio::test]
    async fn test_filter_and_sort() {
        let state = setup_test_state().await;
        add_task(&state, "Print cards", Some(date(10))).await.unwrap();
        let henna = add_task(&state, "Book mehendi", Some(date(1))).await.unwrap();
        add_task(&state, "Pick playlist", None).await.unwrap();
        toggle_task(&state, henna.id, true).await.unwrap();

        assert_eq!(
            descriptions(&state, TaskFilter::All, TaskSort::DueAsc).await,
            vec!["Book mehendi", "Print cards", "Pick playlist"]
        );
        assert_eq!(
            descriptions(&state, TaskFilter::All, TaskSort::DueDesc).await,
            vec!["Print cards", "Book mehendi", "Pick playlist"]
        );
        assert_eq!(
            descriptions(&state, TaskFilter::Pending, TaskSort::CreatedDesc).await,
            vec!["Pick playlist", "Print cards"]
        );
        assert_eq!(
            descriptions(&state, TaskFilter::Completed, TaskSort::CreatedAsc).await,
            vec!["Book mehendi"]
        );
    }

    #[tokio::test]
    async fn test_rows_carry_due_status() {
        let state = setup_test_state().await;
        add_task(&state, "  Send invites ", Some(date(1))).await.unwrap();
        let rows = list_tasks(&state, TaskFilter::All, TaskSort::CreatedAsc, date(3)).await.unwrap();
        assert_eq!(rows[0].description, "Send invites");
        assert_eq!(rows[0].status, "overdue");
    }

    #[tokio::test]
    async fn test_add_records_creator_and_rejects_empty() {
        let state = setup_test_state().await;
        assert!(matches!(add_task(&state, "   ", None).await, Err(DomainError::InvalidInput(_))));
        let task = add_task(&state, "Hire band", None).await.unwrap();
        let user = state.session().await.unwrap().user;
        assert_eq!(task.created_by, Some(user.id));
    }

    #[tokio::test]
    async fn test_edit_is_noop_when_blank_or_unchanged() {
        let state = setup_test_state().await;
        let task = add_task(&state, "Order cake", None).await.unwrap();
        assert_eq!(edit_task(&state, task.id, "  ").await.unwrap(), None);
        assert_eq!(edit_task(&state, task.id, "Order cake ").await.unwrap(), None);

        let edited = edit_task(&state, task.id, "Order two cakes").await.unwrap().unwrap();
        assert_eq!(edited.description, "Order two cakes");
    }

    #[tokio::test]
    async fn test_delete() {
        let state = setup_test_state().await;
        let task = add_task(&state, "Book photographer", None).await.unwrap();
        delete_task(&state, task.id).await.unwrap();
        assert!(matches!(delete_task(&state, task.id).await, Err(DomainError::NotFound(_))));
        assert!(descriptions(&state, TaskFilter::All, TaskSort::CreatedAsc).await.is_empty());
    }
}
