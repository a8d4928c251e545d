mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestDeck;

fn ids(list: &Value) -> Vec<String> {
    list["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .map(|task| task["id"].as_str().expect("id").to_string())
        .collect()
}

#[test]
fn buy_milk_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let deck = TestDeck::new();

    let task = deck.json(&["add", "Buy milk", "--category", "shopping", "--priority", "high"]);
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["status"], "todo");
    assert_eq!(task["category"], "shopping");
    assert_eq!(task["priority"], "high");
    assert!(task["dueDate"].is_null());
    assert!(task["description"].is_null());

    let list = deck.json(&["list"]);
    assert_eq!(list["total"], 1);
    assert_eq!(list["tasks"][0], task);

    let blob: Value = serde_json::from_str(&deck.tasks_blob().expect("tasks blob"))?;
    assert_eq!(blob[0]["title"], "Buy milk");
    assert!(blob[0]["createdAt"].is_string());
    Ok(())
}

#[test]
fn status_change_moves_task_between_filters() {
    let deck = TestDeck::new();
    let id = deck.add(&["Write report", "-c", "work"]);

    deck.cmd()
        .args(["status", id.as_str(), "done"])
        .assert()
        .success()
        .stdout(contains("Task updated"));

    let done = deck.json(&["list", "--status", "done"]);
    assert_eq!(ids(&done), vec![id.clone()]);
    assert_eq!(done["filtered"], true);

    let todo = deck.json(&["list", "--status", "todo"]);
    assert_eq!(todo["total"], 0);

    let summary = deck.json(&["summary"]);
    assert_eq!(summary["done"], 1);
    assert_eq!(summary["inProgress"], 0);
    assert_eq!(summary["total"], 1);
}

#[test]
fn due_date_sort_puts_undated_last() {
    let deck = TestDeck::new();
    let feb = deck.add(&["February", "--due", "2024-02-01"]);
    let none = deck.add(&["Someday"]);
    let jan = deck.add(&["January", "--due", "2024-01-01"]);

    let list = deck.json(&["list", "--sort", "due-date"]);
    assert_eq!(ids(&list), vec![jan.clone(), feb.clone(), none.clone()]);
    assert_eq!(list["tasks"][0]["dueDate"], "2024-01-01T00:00:00Z");

    let newest_first = deck.json(&["list"]);
    assert_eq!(ids(&newest_first)[0], jan);
}

#[test]
fn search_is_case_insensitive_over_title_and_description() {
    let deck = TestDeck::new();
    let milk = deck.add(&["Buy MILK"]);
    let report = deck.add(&["Report", "-d", "mention the milk budget"]);
    deck.add(&["Unrelated"]);

    let list = deck.json(&["list", "--search", "milk", "--sort", "title"]);
    assert_eq!(ids(&list), vec![milk, report]);
}

#[test]
fn edit_keeps_due_date_unless_cleared() {
    let deck = TestDeck::new();
    let id = deck.add(&["Pay rent", "--due", "2024-03-01"]);

    let edited = deck.json(&["edit", id.as_str(), "--priority", "high"]);
    assert_eq!(edited["dueDate"], "2024-03-01T00:00:00Z");
    assert_eq!(edited["priority"], "high");

    let cleared = deck.json(&["edit", id.as_str(), "--clear-due"]);
    assert!(cleared["dueDate"].is_null());
    assert_eq!(cleared["id"], id.as_str());
    assert_eq!(cleared["createdAt"], edited["createdAt"]);

    let shown = deck.json(&["show", id.as_str()]);
    assert!(shown["dueDate"].is_null());
}

#[test]
fn edit_without_changes_is_rejected() {
    let deck = TestDeck::new();
    let id = deck.add(&["Nothing to change"]);

    deck.cmd()
        .args(["edit", id.as_str()])
        .assert()
        .code(2)
        .stderr(contains("nothing to update"));
}

#[test]
fn delete_twice_reports_not_found() {
    let deck = TestDeck::new();
    let id = deck.add(&["Short-lived"]);

    deck.cmd()
        .args(["rm", id.as_str()])
        .assert()
        .success()
        .stdout(contains("Task deleted"));
    let after_delete = deck.tasks_blob();

    deck.cmd()
        .args(["rm", id.as_str()])
        .assert()
        .code(2)
        .stderr(contains("Task not found"))
        .stderr(contains("hint: taskdeck list"));
    assert_eq!(deck.tasks_blob(), after_delete);
}

#[test]
fn unknown_id_json_error_envelope() {
    let deck = TestDeck::new();

    deck.cmd()
        .args(["--json", "status", "missing", "done"])
        .assert()
        .code(2)
        .stdout(contains("\"status\": \"error\""))
        .stdout(contains("\"kind\": \"not_found\""))
        .stdout(contains("\"command\": \"status\""));
}

#[test]
fn invalid_title_is_never_persisted() {
    let deck = TestDeck::new();

    deck.cmd()
        .args(["add", "   "])
        .assert()
        .code(2)
        .stderr(contains("title is required"));

    let long = "x".repeat(101);
    deck.cmd().args(["add", long.as_str()]).assert().code(2);

    let list = deck.json(&["list"]);
    assert_eq!(list["total"], 0);
}

#[test]
fn unknown_enum_values_are_rejected() {
    let deck = TestDeck::new();

    deck.cmd()
        .args(["add", "Task", "--priority", "urgent"])
        .assert()
        .code(2)
        .stderr(contains("low|medium|high"));

    deck.cmd()
        .args(["list", "--sort", "size"])
        .assert()
        .code(2);
}

#[test]
fn quota_exceeded_keeps_previous_collection() -> Result<(), Box<dyn std::error::Error>> {
    let deck = TestDeck::new();
    deck.write_config("[storage]\nquota_bytes = 700\n")?;
    deck.add(&["fits"]);
    let before = deck.tasks_blob();

    let description = "z".repeat(450);
    deck.cmd()
        .args(["add", "too big", "-d", description.as_str()])
        .assert()
        .code(4)
        .stderr(contains("quota"));

    assert_eq!(deck.tasks_blob(), before);
    assert_eq!(deck.json(&["list"])["total"], 1);
    Ok(())
}

#[test]
fn corrupt_collection_loads_as_empty() -> Result<(), Box<dyn std::error::Error>> {
    let deck = TestDeck::new();
    deck.write_tasks_blob("{not json")?;

    deck.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No tasks yet"));
    Ok(())
}

#[test]
fn activity_write_failure_is_reported_as_warning() -> Result<(), Box<dyn std::error::Error>> {
    let deck = TestDeck::new();
    std::fs::create_dir_all(deck.data_dir().join("taskRecentActivity.json"))?;

    deck.cmd()
        .args(["add", "Buy milk"])
        .assert()
        .success()
        .stdout(contains("Task created"))
        .stdout(contains("warning: failed to save recent activity"));

    let output = deck.cmd().args(["--json", "add", "Walk dog"]).output()?;
    assert!(output.status.success());
    let envelope: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(envelope["status"], "success");
    let warnings = envelope["warnings"].as_array().expect("warnings");
    assert!(warnings
        .iter()
        .all(|warning| warning.as_str().is_some_and(|w| w.starts_with("failed to save recent activity"))));
    assert!(deck.tasks_blob().is_some_and(|blob| blob.contains("Walk dog")));
    Ok(())
}

#[test]
fn malformed_record_does_not_erase_the_rest() -> Result<(), Box<dyn std::error::Error>> {
    let deck = TestDeck::new();
    deck.write_tasks_blob(
        r#"[{"id":"keep","title":"Keep me","createdAt":"2024-05-01T08:15:30Z"},
            {"id":"blank","title":"Blank dates","dueDate":"","createdAt":""},
            {"id":"broken","title":"Broken","priority":"urgent"}]"#,
    )?;

    deck.add(&["New one"]);

    let list = deck.json(&["list"]);
    assert_eq!(list["total"], 3);
    let blob = deck.tasks_blob().expect("tasks blob");
    assert!(blob.contains("\"keep\""));
    assert!(blob.contains("\"blank\""));
    Ok(())
}

#[test]
fn notifications_are_written_as_json_lines() -> Result<(), Box<dyn std::error::Error>> {
    let deck = TestDeck::new();
    let events = deck.path().join("events.jsonl");
    let events_arg = events.to_string_lossy().to_string();

    deck.cmd()
        .args(["--events", events_arg.as_str(), "add", "Buy milk"])
        .assert()
        .success();
    deck.cmd()
        .args(["--events", events_arg.as_str(), "rm", "missing"])
        .assert()
        .code(2);

    let content = std::fs::read_to_string(&events)?;
    let lines: Vec<Value> = content
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["level"], "success");
    assert_eq!(lines[0]["title"], "Task created");
    assert_eq!(lines[1]["level"], "error");
    assert_eq!(lines[1]["description"], "Failed to delete task. Please try again.");
    Ok(())
}

#[test]
fn activity_lists_ten_newest_creations() {
    let deck = TestDeck::new();
    let mut created = Vec::new();
    for i in 0..12 {
        created.push(deck.add(&[format!("Task {i}").as_str()]));
    }

    let activity = deck.json(&["activity"]);
    assert_eq!(activity["total"], 10);
    let entries = activity["entries"].as_array().expect("entries");
    assert_eq!(entries[0]["taskId"], created[11].as_str());
    assert_eq!(entries[0]["action"], "created");
    assert!(entries
        .iter()
        .all(|entry| entry["taskId"] != created[0].as_str()));
}

#[test]
fn init_writes_default_config() -> Result<(), Box<dyn std::error::Error>> {
    let deck = TestDeck::new();

    deck.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("initialized data directory"));
    let config = std::fs::read_to_string(deck.data_dir().join("taskdeck.toml"))?;
    assert!(config.contains("tasks_key = \"task-manager-tasks\""));

    deck.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("nothing to do"));
    Ok(())
}

#[test]
fn data_dir_from_environment() {
    let deck = TestDeck::new();

    support::taskdeck_cmd()
        .env("TASKDECK_DATA_DIR", deck.data_dir())
        .args(["add", "From env"])
        .assert()
        .success();

    assert!(deck.tasks_blob().is_some_and(|blob| blob.contains("From env")));
}
