use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn tk_help_works() {
    Command::cargo_bin("tk")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("personal task store"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "add",
        "list",
        "search",
        "show",
        "link",
        "unlink",
        "tags",
        "search-tags",
        "important",
        "mark-important",
        "unmark-important",
        "tag",
        "edit",
        "add-subtask",
        "remove-subtask",
        "show-subtasks",
        "delete",
    ];

    for cmd in subcommands {
        Command::cargo_bin("tk")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn cascade_and_orphan_conflict() {
    Command::cargo_bin("tk")
        .expect("binary")
        .args(["delete", "a1", "--cascade", "--orphan"])
        .assert()
        .failure();
}
