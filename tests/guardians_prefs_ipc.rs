use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_classterd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn classterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn guardian_links_and_welcome_notifications() {
    let workspace = temp_dir("classter-guardians");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy(), "userId": 5 }),
    );

    let session = request_ok(&mut stdin, &mut reader, "2", "prefs.session.get", json!({}));
    assert_eq!(session["isLoggedIn"], false);
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "prefs.session.set",
        json!({ "session": { "userId": 5, "fullName": "Elena Rojas", "role": "guardian" } }),
    );
    let session = request_ok(&mut stdin, &mut reader, "4", "prefs.session.get", json!({}));
    assert_eq!(session["isLoggedIn"], true);
    assert_eq!(session["session"]["role"], "guardian");

    let welcome = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "prefs.welcome",
        json!({ "role": "guardian" }),
    );
    assert_eq!(welcome["added"], 2);
    let again = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "prefs.welcome",
        json!({ "role": "guardian" }),
    );
    assert_eq!(again["added"], 0);

    let linked = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "guardians.students.link",
        json!({
            "guardianUserId": 5,
            "student": { "userId": 40, "dni": "71234567", "fullName": "Mateo Rojas" }
        }),
    );
    assert_eq!(linked["added"], true);
    let relinked = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "guardians.students.link",
        json!({
            "guardianUserId": 5,
            "student": { "userId": 40, "dni": "71234567", "fullName": "Mateo A. Rojas" }
        }),
    );
    assert_eq!(relinked["added"], false);

    let students = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "guardians.students.list",
        json!({ "guardianUserId": 5 }),
    );
    assert_eq!(students["count"], 1);
    assert_eq!(students["students"][0]["fullName"], "Mateo A. Rojas");

    let list = request_ok(&mut stdin, &mut reader, "10", "notifications.list", json!({}));
    let list = list["notifications"].as_array().expect("list").clone();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0]["type"], "STUDENT_ADDED");

    let removed = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "guardians.students.unlink",
        json!({ "guardianUserId": 5, "studentUserId": 40 }),
    );
    assert_eq!(removed["removed"], true);

    request_ok(&mut stdin, &mut reader, "12", "prefs.session.clear", json!({}));
    let session = request_ok(&mut stdin, &mut reader, "13", "prefs.session.get", json!({}));
    assert!(session["session"].is_null());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
