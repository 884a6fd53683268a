use crate::guardians::{self, LinkedStudent};
use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::{parse_param, required_i64, workspace};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let guardian_user_id = match required_i64(req, "guardianUserId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let students = guardians::list(ws.kv.as_ref(), guardian_user_id);
    ok(
        &req.id,
        json!({ "students": students, "count": students.len() }),
    )
}

fn handle_link(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let guardian_user_id = match required_i64(req, "guardianUserId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student: LinkedStudent = match parse_param(req, "student") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match guardians::link(ws.kv.as_ref(), &ws.notifications, guardian_user_id, student) {
        Ok(added) => ok(&req.id, json!({ "added": added })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_unlink(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let guardian_user_id = match required_i64(req, "guardianUserId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_user_id = match required_i64(req, "studentUserId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match guardians::unlink(ws.kv.as_ref(), guardian_user_id, student_user_id) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => store_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "guardians.students.list" => Some(handle_list(state, req)),
        "guardians.students.link" => Some(handle_link(state, req)),
        "guardians.students.unlink" => Some(handle_unlink(state, req)),
        _ => None,
    }
}
