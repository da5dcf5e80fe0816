use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
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

/// Writes the fixture store and a config pointing the sidecar at it.
/// Two classes, two students, one stored attendance mark and one
/// stored midterm grade.
fn write_fixture(workspace: &Path) -> PathBuf {
    let fixture_path = workspace.join("school.json");
    let fixture = json!({
        "sessions": [
            {
                "id": 3,
                "day": "Tuesday",
                "startTime": "07:30:00",
                "endTime": "09:00:00",
                "classId": 11,
                "className": "9B",
                "subjectId": 5,
                "subjectName": "Mathematics"
            },
            {
                "id": 2,
                "day": "Monday",
                "startTime": "09:30:00",
                "endTime": "11:00:00",
                "classId": 10,
                "className": "9A",
                "subjectId": 6,
                "subjectName": "English"
            },
            {
                "id": 1,
                "day": "Monday",
                "startTime": "07:30:00",
                "endTime": "09:00:00",
                "classId": 10,
                "className": "9A",
                "subjectId": 5,
                "subjectName": "Mathematics"
            }
        ],
        "rosters": [
            {
                "classId": 10,
                "students": [
                    { "id": 2, "name": "Budi", "externalCode": "S0002" },
                    { "id": 1, "name": "Anisa", "externalCode": "S0001" }
                ]
            }
        ],
        "records": [
            {
                "studentId": 2,
                "classId": 10,
                "subjectId": 5,
                "kind": "attendance",
                "period": "2026-03-02",
                "value": "Late"
            },
            {
                "studentId": 1,
                "classId": 10,
                "subjectId": 5,
                "kind": "grade",
                "period": "MIDTERM",
                "value": 75.0
            }
        ]
    });
    std::fs::write(
        &fixture_path,
        serde_json::to_string_pretty(&fixture).expect("fixture json"),
    )
    .expect("write fixture");

    let config_path = workspace.join("rollbookd.yaml");
    let config = format!(
        "backend: fixture\nfixture:\n  path: {}\n",
        fixture_path.to_string_lossy()
    );
    std::fs::write(&config_path, config).expect("write config");
    config_path
}

fn spawn_sidecar(config: &Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollbookd");
    let mut child = Command::new(exe)
        .env(rollbookd::config::CONFIG_PATH_VAR, config)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollbookd");
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
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("rollbookd-router-smoke");
    let config = write_fixture(&workspace);
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&config);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health.get("catalogLoaded").and_then(|v| v.as_bool()), Some(false));
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());

    // Narrowing before the catalog is loaded is rejected.
    let early = request(&mut stdin, &mut reader, "2", "scope.classes", json!({}));
    assert_eq!(error_code(&early), "catalog_not_loaded");

    let catalog = request_ok(&mut stdin, &mut reader, "3", "catalog.load", json!({}));
    let sessions = catalog
        .get("sessions")
        .and_then(|v| v.as_array())
        .expect("sessions");
    assert_eq!(sessions.len(), 3);
    assert_eq!(sessions[0].get("id").and_then(|v| v.as_i64()), Some(1));

    let health = request_ok(&mut stdin, &mut reader, "4", "health", json!({}));
    assert_eq!(health.get("catalogLoaded").and_then(|v| v.as_bool()), Some(true));

    let classes = request_ok(&mut stdin, &mut reader, "5", "scope.classes", json!({}));
    let classes = classes
        .get("classes")
        .and_then(|v| v.as_array())
        .expect("classes");
    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0].get("name").and_then(|v| v.as_str()), Some("9A"));
    assert_eq!(classes[1].get("name").and_then(|v| v.as_str()), Some("9B"));

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "scope.selectClass",
        json!({ "classId": 10 }),
    );
    let selection = selected.get("selection").expect("selection");
    assert_eq!(selection.get("classId").and_then(|v| v.as_i64()), Some(10));
    assert!(selection.get("subjectId").expect("subjectId").is_null());

    let subjects = request_ok(&mut stdin, &mut reader, "7", "scope.subjects", json!({}));
    let subjects = subjects
        .get("subjects")
        .and_then(|v| v.as_array())
        .expect("subjects");
    assert_eq!(subjects.len(), 2);
    assert_eq!(
        subjects[0].get("name").and_then(|v| v.as_str()),
        Some("English")
    );
    assert_eq!(
        subjects[1].get("name").and_then(|v| v.as_str()),
        Some("Mathematics")
    );

    // The roster needs the whole scope; subject and period are still missing.
    let unresolved = request(&mut stdin, &mut reader, "8", "roster.open", json!({}));
    assert_eq!(error_code(&unresolved), "scope_incomplete");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "scope.selectSubject",
        json!({ "subjectId": 5 }),
    );
    let unresolved = request(&mut stdin, &mut reader, "10", "roster.open", json!({}));
    assert_eq!(error_code(&unresolved), "scope_incomplete");

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "scope.selectAttendanceDate",
        json!({ "date": "2026-03-02" }),
    );
    let selection = selected.get("selection").expect("selection");
    assert_eq!(
        selection.get("kind").and_then(|v| v.as_str()),
        Some("attendance")
    );
    assert_eq!(
        selection.get("period").and_then(|v| v.as_str()),
        Some("2026-03-02")
    );

    // Entries arrive in name order; Budi's stored Late beats the default.
    let opened = request_ok(&mut stdin, &mut reader, "12", "roster.open", json!({}));
    assert_eq!(opened.get("dirty").and_then(|v| v.as_bool()), Some(false));
    let entries = opened
        .get("entries")
        .and_then(|v| v.as_array())
        .expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].get("name").and_then(|v| v.as_str()), Some("Anisa"));
    assert_eq!(
        entries[0].get("value").and_then(|v| v.as_str()),
        Some("Present")
    );
    assert_eq!(entries[1].get("name").and_then(|v| v.as_str()), Some("Budi"));
    assert_eq!(entries[1].get("value").and_then(|v| v.as_str()), Some("Late"));

    let set = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "entry.set",
        json!({ "studentId": 1, "value": "Absent" }),
    );
    assert_eq!(set.get("value").and_then(|v| v.as_str()), Some("Absent"));
    assert_eq!(set.get("dirty").and_then(|v| v.as_bool()), Some(true));

    let rejected = request(
        &mut stdin,
        &mut reader,
        "14",
        "entry.set",
        json!({ "studentId": 1, "value": "Sleeping" }),
    );
    assert_eq!(error_code(&rejected), "validation_failed");

    let rejected = request(
        &mut stdin,
        &mut reader,
        "15",
        "entry.set",
        json!({ "studentId": 99, "value": "Late" }),
    );
    assert_eq!(error_code(&rejected), "unknown_student");

    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "16",
        "entry.clear",
        json!({ "studentId": 2 }),
    );
    assert!(cleared.get("value").expect("value").is_null());

    // Only Anisa's correction goes out; the cleared entry is skipped.
    let submitted = request_ok(
        &mut stdin,
        &mut reader,
        "17",
        "records.submitAll",
        json!({}),
    );
    assert_eq!(submitted.get("succeeded").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(
        submitted.get("failed").and_then(|v| v.as_array()).map(Vec::len),
        Some(0)
    );
    let refreshed = submitted
        .get("refreshed")
        .and_then(|v| v.as_array())
        .expect("refreshed entries");
    assert_eq!(
        refreshed[0].get("value").and_then(|v| v.as_str()),
        Some("Absent")
    );
    assert_eq!(
        refreshed[1].get("value").and_then(|v| v.as_str()),
        Some("Late")
    );

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "18",
        "scope.selectAssessment",
        json!({ "tag": "MIDTERM" }),
    );
    assert_eq!(
        selected
            .get("selection")
            .and_then(|s| s.get("kind"))
            .and_then(|v| v.as_str()),
        Some("grade")
    );

    // Grades default to unset; Anisa's stored midterm comes through.
    let opened = request_ok(&mut stdin, &mut reader, "19", "roster.open", json!({}));
    let entries = opened
        .get("entries")
        .and_then(|v| v.as_array())
        .expect("entries");
    assert_eq!(
        entries[0].get("value").and_then(|v| v.as_f64()),
        Some(75.0)
    );
    assert!(entries[1].get("value").expect("value").is_null());

    let rejected = request(
        &mut stdin,
        &mut reader,
        "20",
        "entry.set",
        json!({ "studentId": 2, "value": 101 }),
    );
    assert_eq!(error_code(&rejected), "validation_failed");

    let set = request_ok(
        &mut stdin,
        &mut reader,
        "21",
        "entry.set",
        json!({ "studentId": 2, "value": 88.5 }),
    );
    assert_eq!(set.get("value").and_then(|v| v.as_f64()), Some(88.5));

    let submitted = request_ok(
        &mut stdin,
        &mut reader,
        "22",
        "records.submitAll",
        json!({}),
    );
    assert_eq!(submitted.get("succeeded").and_then(|v| v.as_u64()), Some(2));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn empty_and_null_set_values_clear_the_entry() {
    let workspace = temp_dir("rollbookd-erased-values");
    let config = write_fixture(&workspace);
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&config);

    let _ = request_ok(&mut stdin, &mut reader, "1", "catalog.load", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "scope.selectClass",
        json!({ "classId": 10 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "scope.selectSubject",
        json!({ "subjectId": 5 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "scope.selectAssessment",
        json!({ "tag": "MIDTERM" }),
    );

    let opened = request_ok(&mut stdin, &mut reader, "5", "roster.open", json!({}));
    assert_eq!(opened.get("dirty").and_then(|v| v.as_bool()), Some(false));
    let entries = opened
        .get("entries")
        .and_then(|v| v.as_array())
        .expect("entries");
    assert_eq!(entries[0].get("value").and_then(|v| v.as_f64()), Some(75.0));
    assert!(entries[1].get("value").expect("value").is_null());

    let set = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "entry.set",
        json!({ "studentId": 2, "value": 88.5 }),
    );
    assert_eq!(set.get("value").and_then(|v| v.as_f64()), Some(88.5));
    assert_eq!(set.get("dirty").and_then(|v| v.as_bool()), Some(true));

    // A grade scope rejects status strings with a score-shaped message.
    let rejected = request(
        &mut stdin,
        &mut reader,
        "7",
        "entry.set",
        json!({ "studentId": 2, "value": "Absent" }),
    );
    assert_eq!(error_code(&rejected), "validation_failed");
    let message = rejected
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .expect("message");
    assert!(message.contains("numeric score"), "got: {message}");
    assert!(!message.contains("attendance status"), "got: {message}");

    // An erased input drops the pending edit; the sheet is clean again.
    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "entry.set",
        json!({ "studentId": 2, "value": "" }),
    );
    assert!(cleared.get("value").expect("value").is_null());
    assert_eq!(cleared.get("dirty").and_then(|v| v.as_bool()), Some(false));

    // Clearing a stored grade diverges from the baseline locally.
    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "entry.set",
        json!({ "studentId": 1, "value": null }),
    );
    assert!(cleared.get("value").expect("value").is_null());
    assert_eq!(cleared.get("dirty").and_then(|v| v.as_bool()), Some(true));

    // A missing value field reads as null.
    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "entry.set",
        json!({ "studentId": 1 }),
    );
    assert!(cleared.get("value").expect("value").is_null());

    // Cleared entries are skipped, never submitted as deletions.
    let submitted = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "records.submitAll",
        json!({}),
    );
    assert_eq!(
        submitted.get("nothingToSubmit").and_then(|v| v.as_bool()),
        Some(true)
    );

    // The stored midterm survives on the server.
    let opened = request_ok(&mut stdin, &mut reader, "12", "roster.open", json!({}));
    assert_eq!(opened.get("dirty").and_then(|v| v.as_bool()), Some(false));
    let entries = opened
        .get("entries")
        .and_then(|v| v.as_array())
        .expect("entries");
    assert_eq!(entries[0].get("value").and_then(|v| v.as_f64()), Some(75.0));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_input_gets_structured_errors() {
    let workspace = temp_dir("rollbookd-router-errors");
    let config = write_fixture(&workspace);
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&config);

    let unknown = request(
        &mut stdin,
        &mut reader,
        "1",
        "records.dropTables",
        json!({}),
    );
    assert_eq!(error_code(&unknown), "not_implemented");

    let missing = request(&mut stdin, &mut reader, "2", "scope.selectClass", json!({}));
    assert_eq!(error_code(&missing), "bad_params");

    // A line that is not JSON at all still gets a reply, without an id.
    writeln!(stdin, "this is not json").expect("write garbage");
    stdin.flush().expect("flush garbage");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert!(value.get("id").is_none());
    assert_eq!(error_code(&value), "bad_json");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
