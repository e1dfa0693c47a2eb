use assert_cmd::Command;
use mulquiz::{leaderboard::Scoreboard, store::SqliteStore};
use tempfile::tempdir;

#[test]
fn scores_flag_prints_empty_board() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("mulquiz")
        .unwrap()
        .arg("--scores")
        .arg("--db")
        .arg(dir.path().join("scores.db"))
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .assert()
        .success()
        .stdout("No high scores yet!\n");

    // Defaults are written on first run
    assert!(dir.path().join("config.json").exists());
}

#[test]
fn scores_flag_prints_saved_entries() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("scores.db");
    let mut scoreboard = Scoreboard::load(Box::new(SqliteStore::open(&db).unwrap()));
    scoreboard.record_attempt("Ana", 65_000, 20, 2).unwrap();
    drop(scoreboard);

    let output = Command::cargo_bin("mulquiz")
        .unwrap()
        .arg("--scores")
        .arg("--db")
        .arg(&db)
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("#1 Ana"));
    assert!(stdout.contains("01:05"));
    assert!(stdout.contains("91%"));
}

#[test]
fn refuses_to_run_without_tty() {
    let dir = tempdir().unwrap();

    let output = Command::cargo_bin("mulquiz")
        .unwrap()
        .arg("--db")
        .arg(dir.path().join("scores.db"))
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .write_stdin("")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("stdin must be a tty"));
}
