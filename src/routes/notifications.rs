use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    middleware::admin::AdminAuth,
    models::notification::{
        CreateNotificationRequest, ListNotificationsQuery, NotificationAdminView,
        UpdateNotificationRequest,
    },
    AppState,
};

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

/// GET /admin/notifications?search=
pub async fn list_notifications(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Query(params): Query<ListNotificationsQuery>,
) -> ApiResult<Json<Vec<NotificationAdminView>>> {
    let list = state.notifications.list(params.search.as_deref()).await?;
    Ok(Json(list.into_iter().map(NotificationAdminView::from).collect()))
}

/// GET /admin/notifications/{id}
pub async fn get_notification(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> ApiResult<Json<NotificationAdminView>> {
    let notification = state.notifications.get(id).await?;
    Ok(Json(notification.into()))
}

/// POST /admin/notifications
pub async fn create_notification(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(body): Json<CreateNotificationRequest>,
) -> ApiResult<(StatusCode, Json<NotificationAdminView>)> {
    let notification = state.notifications.create(body).await?;
    Ok((StatusCode::CREATED, Json(notification.into())))
}

/// PUT /admin/notifications/{id}
pub async fn update_notification(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
    Json(body): Json<UpdateNotificationRequest>,
) -> ApiResult<Json<NotificationAdminView>> {
    let notification = state.notifications.update(id, body).await?;
    Ok(Json(notification.into()))
}

/// DELETE /admin/notifications/{id}
pub async fn delete_notification(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.notifications.delete(id).await?;
    Ok(Json(json!({ "ok": true })))
}
