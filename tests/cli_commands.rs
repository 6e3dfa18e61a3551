mod support;

use predicates::str::contains;
use serde_json::Value;
use support::{ids, TkEnv};

#[test]
fn add_then_list_json() {
    let env = TkEnv::new();
    let created = env.json(&[
        "add",
        "Write report",
        "--due",
        "2025-11-20",
        "--tag",
        "work",
        "--important",
    ]);
    assert_eq!(created["schema_version"], "tk.v1");
    assert_eq!(created["command"], "add");
    assert_eq!(created["status"], "success");

    let task = &created["data"];
    let id = task["id"].as_str().expect("id");
    assert_eq!(id.len(), 8);
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["due"], "2025-11-20");
    assert_eq!(task["tags"], serde_json::json!(["work"]));
    assert_eq!(task["important"], true);
    assert_eq!(task["links"], serde_json::json!([]));
    assert_eq!(task["subtasks"], serde_json::json!([]));

    let list = env.json(&["list"]);
    assert_eq!(list["data"]["total"], 1);
    assert_eq!(ids(&list), vec![id.to_string()]);

    let stored: Value = serde_json::from_str(&env.read_data()).expect("document");
    assert_eq!(stored.as_array().expect("array").len(), 1);
}

#[test]
fn human_list_shows_task_lines() {
    let env = TkEnv::new();
    env.json(&["add", "Pay rent", "--id", "r1", "--tag", "home", "--important"]);

    env.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("Tasks"))
        .stdout(contains("- ! [r1] Pay rent #home"));
}

#[test]
fn duplicate_custom_id_is_user_error() {
    let env = TkEnv::new();
    env.add("a1", "First");
    let before = env.read_data();

    let output = env
        .cmd()
        .args(["--json", "add", "Second", "--id", "a1"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    let body: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(body["status"], "error");
    assert_eq!(body["command"], "add");
    assert_eq!(body["error"]["kind"], "already_exists");
    assert_eq!(body["error"]["details"]["id"], "a1");
    assert_eq!(env.read_data(), before);
}

#[test]
fn show_missing_task_fails() {
    let env = TkEnv::new();
    env.cmd()
        .args(["show", "nope"])
        .assert()
        .code(2)
        .stderr(contains("Task not found: nope"));
}

#[test]
fn show_resolves_relationships() {
    let env = TkEnv::new();
    env.add("a1", "Parent");
    env.add("b1", "Child");
    env.add("c1", "Reference");
    env.json(&["add-subtask", "a1", "b1"]);
    env.json(&["link", "a1", "c1"]);

    let shown = env.json(&["show", "a1"]);
    assert_eq!(shown["data"]["task"]["id"], "a1");
    assert_eq!(shown["data"]["subtasks"][0]["id"], "b1");
    assert_eq!(shown["data"]["links"][0]["id"], "c1");

    let child = env.json(&["show", "b1"]);
    assert_eq!(child["data"]["parents"], serde_json::json!(["a1"]));

    let subtasks = env.json(&["show-subtasks", "a1"]);
    assert_eq!(ids(&subtasks), vec!["b1"]);
}

#[test]
fn link_is_idempotent() {
    let env = TkEnv::new();
    env.add("a1", "A");
    env.add("b1", "B");

    assert_eq!(env.json(&["link", "a1", "b1"])["data"]["changed"], true);
    assert_eq!(env.json(&["link", "a1", "b1"])["data"]["changed"], false);
    let shown = env.json(&["show", "a1"]);
    assert_eq!(shown["data"]["task"]["links"], serde_json::json!(["b1"]));

    assert_eq!(env.json(&["unlink", "a1", "b1"])["data"]["changed"], true);
    env.cmd().args(["link", "a1", "zz"]).assert().code(2);
}

#[test]
fn delete_orphan_keeps_subtask() {
    let env = TkEnv::new();
    env.add("a1", "Task A");
    env.add("b1", "Task B");
    env.json(&["add-subtask", "a1", "b1"]);

    let deleted = env.json(&["delete", "a1", "--orphan"]);
    assert_eq!(deleted["data"]["outcome"], "deleted");
    assert_eq!(deleted["data"]["policy"], "orphan");
    assert_eq!(deleted["data"]["removed"], serde_json::json!(["a1"]));

    assert_eq!(ids(&env.json(&["list"])), vec!["b1"]);
    env.cmd().args(["show", "a1"]).assert().code(2);
}

#[test]
fn delete_cascade_removes_subtasks() {
    let env = TkEnv::new();
    for id in ["p", "c", "g", "keep"] {
        env.add(id, id);
    }
    env.json(&["add-subtask", "p", "c"]);
    env.json(&["add-subtask", "c", "g"]);

    let deleted = env.json(&["delete", "p", "--cascade"]);
    assert_eq!(deleted["data"]["policy"], "cascade");
    assert_eq!(ids(&env.json(&["list"])), vec!["keep"]);
}

#[test]
fn delete_without_answer_cancels() {
    let env = TkEnv::new();
    env.add("p", "Parent");
    env.add("c", "Child");
    env.json(&["add-subtask", "p", "c"]);
    let before = env.read_data();

    env.cmd()
        .args(["delete", "p"])
        .write_stdin("yes\n")
        .assert()
        .code(1)
        .stderr(contains("Delete cancelled: p"));
    assert_eq!(env.read_data(), before);
}

#[test]
fn delete_without_subtasks_needs_no_answer() {
    let env = TkEnv::new();
    env.add("solo", "Alone");

    let deleted = env.json(&["delete", "solo"]);
    assert_eq!(deleted["data"]["removed"], serde_json::json!(["solo"]));
    assert!(deleted["data"].get("policy").is_none());
    assert_eq!(env.json(&["list"])["data"]["total"], 0);
}

#[test]
fn list_sorting_and_filters() {
    let env = TkEnv::new();
    env.json(&["add", "Later", "--id", "t1", "--due", "2025-09-01", "--tag", "work"]);
    env.json(&["add", "Whenever", "--id", "t2", "--due", "someday"]);
    env.json(&["add", "Sooner", "--id", "t3", "--due", "2025-02-01", "--tag", "work"]);
    env.json(&["add", "Undated", "--id", "t4", "--important"]);

    let by_due = env.json(&["list", "--sort-by", "due"]);
    let order = ids(&by_due);
    assert_eq!(&order[..2], ["t3", "t1"]);

    let by_due_desc = env.json(&["list", "--sort-by", "due", "--reverse"]);
    assert_eq!(&ids(&by_due_desc)[..2], ["t1", "t3"]);

    let by_title = env.json(&["list", "--sort-by", "title"]);
    assert_eq!(ids(&by_title), vec!["t1", "t3", "t4", "t2"]);

    let tagged = env.json(&["list", "--tag", "work", "--sort-by", "id"]);
    assert_eq!(ids(&tagged), vec!["t1", "t3"]);

    let important = env.json(&["important"]);
    assert_eq!(ids(&important), vec!["t4"]);

    env.cmd()
        .args(["list", "--sort-by", "priority"])
        .assert()
        .code(2);
}

#[test]
fn search_and_tags() {
    let env = TkEnv::new();
    env.json(&["add", "Buy milk", "--id", "m1", "--tag", "home", "--tag", "shop"]);
    env.json(&["add", "Fix bike", "--id", "b1", "--notes", "needs MILK crate", "--tag", "home"]);
    env.json(&["add", "File taxes", "--id", "t1", "--tag", "admin"]);

    let found = env.json(&["search", "milk"]);
    assert_eq!(ids(&found), vec!["m1", "b1"]);

    let census = env.json(&["tags"]);
    assert_eq!(
        census["data"],
        serde_json::json!([
            { "tag": "admin", "count": 1 },
            { "tag": "home", "count": 2 },
            { "tag": "shop", "count": 1 },
        ])
    );

    let any = env.json(&["search-tags", "shop", "admin"]);
    assert_eq!(ids(&any), vec!["m1", "t1"]);

    let all = env.json(&["search-tags", "home", "shop", "--all"]);
    assert_eq!(ids(&all), vec!["m1"]);
}

#[test]
fn edit_tag_and_importance() {
    let env = TkEnv::new();
    env.json(&["add", "Draft", "--id", "d1", "--due", "2025-01-01"]);
    let created_at = env.json(&["show", "d1"])["data"]["task"]["created_at"].clone();

    let edited = env.json(&["edit", "d1", "--title", "Final", "--due", ""]);
    assert_eq!(edited["data"]["title"], "Final");
    assert!(edited["data"].get("due").map_or(true, Value::is_null));
    assert_eq!(edited["data"]["created_at"], created_at);

    let tagged = env.json(&["tag", "add", "d1", "work", "urgent"]);
    assert_eq!(tagged["command"], "tag add");
    assert_eq!(tagged["data"]["tags"], serde_json::json!(["work", "urgent"]));
    let untagged = env.json(&["tag", "remove", "d1", "urgent"]);
    assert_eq!(untagged["data"]["tags"], serde_json::json!(["work"]));

    assert_eq!(env.json(&["mark-important", "d1"])["data"]["changed"], true);
    assert_eq!(env.json(&["mark-important", "d1"])["data"]["changed"], false);
    assert_eq!(env.json(&["unmark-important", "d1"])["data"]["important"], false);

    env.cmd().args(["edit", "d1"]).assert().code(2);
}

#[test]
fn subtask_can_be_detached() {
    let env = TkEnv::new();
    env.add("p", "Parent");
    env.add("c", "Child");
    env.json(&["add-subtask", "p", "c"]);

    assert_eq!(env.json(&["remove-subtask", "p", "c"])["data"]["changed"], true);
    assert!(env.json(&["show-subtasks", "p"])["data"]["tasks"]
        .as_array()
        .expect("tasks")
        .is_empty());
    assert_eq!(ids(&env.json(&["list", "--sort-by", "id"])), vec!["c", "p"]);
}

#[test]
fn corrupt_document_is_backed_up_with_warning() {
    let env = TkEnv::new();
    env.write_file("tasks.json", "not json at all");

    let list = env.json(&["list"]);
    assert_eq!(list["data"]["total"], 0);
    let warning = list["warnings"][0].as_str().expect("warning");
    assert!(warning.contains("tasks.json.bak"), "{warning}");
    assert_eq!(
        std::fs::read_to_string(env.path().join("tasks.json.bak")).expect("backup"),
        "not json at all"
    );

    env.add("a1", "Fresh start");
    assert_eq!(ids(&env.json(&["list"])), vec!["a1"]);
}

#[test]
fn config_sets_list_defaults_and_backup_suffix() {
    let env = TkEnv::new();
    let config = env.write_file(
        "tk.toml",
        "[store]\nbackup_suffix = \"broken\"\n\n[list]\nsort = \"title\"\nreverse = true\n",
    );
    let config = config.to_str().expect("utf8 path");

    env.add("x1", "apple");
    env.add("x2", "cherry");
    env.add("x3", "banana");

    let list = env.json(&["--config", config, "list"]);
    assert_eq!(ids(&list), vec!["x2", "x3", "x1"]);

    let ascending = env.json(&["--config", config, "list", "--no-reverse"]);
    assert_eq!(ids(&ascending), vec!["x1", "x3", "x2"]);

    env.write_file("tasks.json", "[");
    env.json(&["--config", config, "list"]);
    assert!(env.path().join("tasks.json.broken").exists());
}

#[test]
fn explicit_config_errors_are_reported() {
    let env = TkEnv::new();
    let config = env.write_file("bad.toml", "[list]\nsort = \"priority\"\n");

    env.cmd()
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .code(2)
        .stderr(contains("list.sort"));
}
