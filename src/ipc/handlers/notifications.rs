use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{required_i64, required_str, workspace};
use crate::ipc::types::{AppState, Request};
use crate::notifications::{format_age, now_millis, NotificationType};
use serde_json::json;

const DEFAULT_RECENT: usize = 3;

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let title = match required_str(req, "title") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let message = match required_str(req, "message") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let notification_type = match req
        .params
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("SYSTEM")
        .parse::<NotificationType>()
    {
        Ok(t) => t,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    // Producers may hand over either JSON text or a structured value.
    let extra_data = match req.params.get("extraData") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(v) => Some(v.to_string()),
    };
    let emit_alert = req
        .params
        .get("emitAlert")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);

    match ws
        .notifications
        .add(&title, &message, notification_type, extra_data, emit_alert)
    {
        Ok(n) => ok(&req.id, json!({ "notification": n })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_list(state: &mut AppState, req: &Request, unread_only: bool) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let list = if unread_only {
        ws.notifications.unread()
    } else {
        ws.notifications.list()
    };
    ok(&req.id, json!({ "notifications": list }))
}

fn handle_unread_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "unreadCount": ws.notifications.unread_count() }),
    )
}

fn handle_recent(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let limit = req
        .params
        .get("limit")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(DEFAULT_RECENT);
    let (recent, total) = ws.notifications.recent(limit);
    ok(
        &req.id,
        json!({
            "notifications": recent,
            "total": total,
            "hasMore": total > limit,
        }),
    )
}

fn handle_groups(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let now = req
        .params
        .get("now")
        .and_then(|v| v.as_i64())
        .unwrap_or_else(now_millis);
    ok(&req.id, json!({ "groups": ws.notifications.groups(now) }))
}

fn handle_mark_read(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let id = match required_str(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match ws.notifications.mark_read(&id) {
        Ok(found) => ok(
            &req.id,
            json!({ "found": found, "unreadCount": ws.notifications.unread_count() }),
        ),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_mark_all_read(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    match ws.notifications.mark_all_read() {
        Ok(()) => ok(&req.id, json!({ "unreadCount": 0 })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let id = match required_str(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match ws.notifications.delete(&id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_delete_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    match ws.notifications.delete_all() {
        Ok(()) => ok(&req.id, json!({})),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_format_age(req: &Request) -> serde_json::Value {
    let timestamp = match required_i64(req, "timestamp") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let now = req
        .params
        .get("now")
        .and_then(|v| v.as_i64())
        .unwrap_or_else(now_millis);
    ok(&req.id, json!({ "label": format_age(timestamp, now) }))
}

fn handle_alerts_drain(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "alerts": state.alerts.drain() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notifications.add" => Some(handle_add(state, req)),
        "notifications.list" => Some(handle_list(state, req, false)),
        "notifications.unread" => Some(handle_list(state, req, true)),
        "notifications.unreadCount" => Some(handle_unread_count(state, req)),
        "notifications.recent" => Some(handle_recent(state, req)),
        "notifications.groups" => Some(handle_groups(state, req)),
        "notifications.markRead" => Some(handle_mark_read(state, req)),
        "notifications.markAllRead" => Some(handle_mark_all_read(state, req)),
        "notifications.delete" => Some(handle_delete(state, req)),
        "notifications.deleteAll" => Some(handle_delete_all(state, req)),
        "notifications.formatAge" => Some(handle_format_age(req)),
        "alerts.drain" => Some(handle_alerts_drain(state, req)),
        _ => None,
    }
}
