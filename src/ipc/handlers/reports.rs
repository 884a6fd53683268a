use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{parse_param, required_i64, required_str, workspace};
use crate::ipc::types::{AppState, Request};
use crate::notifications::now_millis;
use crate::report::{self, Consolidated, ShareData};
use chrono::Local;
use serde_json::json;

fn report_input(req: &Request) -> Result<(Consolidated, String), serde_json::Value> {
    let data: Consolidated = parse_param(req, "data")?;
    let section_name = required_str(req, "sectionName")?;
    Ok((data, section_name))
}

fn handle_render(req: &Request) -> serde_json::Value {
    let (data, section_name) = match report_input(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let html = report::render_html(&data, &section_name, Local::now());
    ok(&req.id, json!({ "html": html }))
}

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let (data, section_name) = match report_input(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match report::export_html(&ws.path, &data, &section_name, Local::now()) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "path": summary.path.to_string_lossy(),
                "fileName": summary.file_name,
                "bytes": summary.bytes,
            }),
        ),
        Err(e) => err(&req.id, "io_failed", format!("{e:#}"), None),
    }
}

/// Exports the report and returns the payload the host encodes as a QR code.
fn handle_share_data(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let (data, section_name) = match report_input(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let section_id = match required_i64(req, "sectionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match report::export_html(&ws.path, &data, &section_name, Local::now()) {
        Ok(summary) => {
            let share = ShareData::new(section_id, &section_name, &summary, now_millis());
            let text = serde_json::to_string(&share).unwrap_or_default();
            ok(&req.id, json!({ "share": share, "qrText": text }))
        }
        Err(e) => err(&req.id, "io_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.render" => Some(handle_render(req)),
        "reports.export" => Some(handle_export(state, req)),
        "reports.shareData" => Some(handle_share_data(state, req)),
        _ => None,
    }
}
