use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{parse_param, required_str, workspace};
use crate::ipc::types::{AppState, Request};
use crate::prefs::{self, Role, UserSession};
use serde_json::json;

fn handle_session_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let session = prefs::session(ws.kv.as_ref());
    let logged_in = session.as_ref().map(UserSession::is_logged_in).unwrap_or(false);
    ok(
        &req.id,
        json!({ "session": session, "isLoggedIn": logged_in }),
    )
}

fn handle_session_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let session: UserSession = match parse_param(req, "session") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match prefs::set_session(ws.kv.as_ref(), &session) {
        Ok(()) => ok(&req.id, json!({ "isLoggedIn": session.is_logged_in() })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_session_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    match prefs::clear_session(ws.kv.as_ref()) {
        Ok(()) => ok(&req.id, json!({})),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_welcome(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let role = match required_str(req, "role").map(|r| r.parse::<Role>()) {
        Ok(Ok(r)) => r,
        Ok(Err(msg)) => return err(&req.id, "bad_params", msg, None),
        Err(e) => return e,
    };
    match prefs::welcome(ws.kv.as_ref(), &ws.notifications, role) {
        Ok(added) => ok(&req.id, json!({ "added": added })),
        Err(e) => store_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "prefs.session.get" => Some(handle_session_get(state, req)),
        "prefs.session.set" => Some(handle_session_set(state, req)),
        "prefs.session.clear" => Some(handle_session_clear(state, req)),
        "prefs.welcome" => Some(handle_welcome(state, req)),
        _ => None,
    }
}
