use crate::calc;
use crate::grades::{self, GradeRecord, Viewer};
use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::{parse_param, required_i64, workspace};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_average(req: &Request) -> serde_json::Value {
    let values: Vec<String> = match parse_param(req, "values") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match calc::average(values.iter().map(String::as_str)) {
        Some(avg) => ok(
            &req.id,
            json!({
                "letter": avg.letter,
                "mean": avg.mean,
                "gradedCount": avg.graded_count,
                "ignoredCount": avg.ignored_count,
            }),
        ),
        None => ok(
            &req.id,
            json!({
                "letter": null,
                "mean": null,
                "gradedCount": 0,
                "ignoredCount": values.len(),
            }),
        ),
    }
}

fn handle_diff(req: &Request) -> serde_json::Value {
    let previous: Vec<GradeRecord> = match parse_param(req, "previous") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let current: Vec<GradeRecord> = match parse_param(req, "current") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let fresh = grades::new_grades(&previous, &current);
    ok(&req.id, json!({ "newGrades": fresh }))
}

fn handle_sync(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let student_user_id = match required_i64(req, "studentUserId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let current: Vec<GradeRecord> = match parse_param(req, "current") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let viewer = match req.params.get("studentName").and_then(|v| v.as_str()) {
        Some(name) => Viewer::Guardian {
            student_name: name.to_string(),
        },
        None => Viewer::Student,
    };

    match grades::sync_grades(
        ws.kv.as_ref(),
        &ws.notifications,
        student_user_id,
        &viewer,
        &current,
    ) {
        Ok(outcome) => ok(&req.id, json!(outcome)),
        Err(e) => store_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.average" => Some(handle_average(req)),
        "grades.diff" => Some(handle_diff(req)),
        "grades.sync" => Some(handle_sync(state, req)),
        _ => None,
    }
}
