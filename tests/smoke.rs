//! Smoke tests -- verify the binary runs and the offline subcommands work.

use assert_cmd::Command;
use predicates::prelude::*;

fn breachwatch() -> Command {
    let mut cmd = Command::cargo_bin("breachwatch").unwrap();
    cmd.env_remove("BREACHWATCH_CONFIG").env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_cli_help() {
    breachwatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("Data breach tracking"));
}

#[test]
fn test_cli_version() {
    breachwatch()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("breachwatch"));
}

#[test]
fn test_subcommands_exist() {
    for sub in ["serve", "stats", "import", "token"] {
        breachwatch().args([sub, "--help"]).assert().success();
    }
}

#[test]
fn test_token_prints_a_token() {
    breachwatch()
        .arg("token")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[A-Za-z0-9]{32}\n$").unwrap());
}

#[test]
fn test_stats_on_empty_database() {
    let dir = tempfile::TempDir::new().unwrap();
    let db = dir.path().join("empty.db");

    breachwatch()
        .args(["stats", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicates::str::contains("No breach records with a numeric record count."));
}

#[test]
fn test_import_then_stats_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let db = dir.path().join("breaches.db");
    let file = dir.path().join("breaches.json");
    std::fs::write(
        &file,
        r#"[
            { "organization": "Acme", "industry": "Retail", "breachType": "Hacking",
              "year": 2020, "recordsCompromised": 100 },
            { "organization": "Globex", "industry": "Finance", "breachType": "Phishing",
              "year": 2021, "recordsCompromised": 250 },
            { "organization": "Initech", "recordsCompromised": "unknown" }
        ]"#,
    )
    .unwrap();

    breachwatch()
        .args(["import", "--db"])
        .arg(&db)
        .arg("--file")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicates::str::contains("Imported 3 breach records"));

    let output = breachwatch()
        .args(["stats", "--json", "--db"])
        .arg(&db)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["overall"]["totalCount"], 2);
    assert_eq!(stats["overall"]["totalSum"], 350);
    assert_eq!(stats["overall"]["max"], 250);
    assert_eq!(stats["topIndustry"]["name"], "Finance");
}

#[test]
fn test_import_rejects_non_array() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("bad.json");
    std::fs::write(&file, r#"{ "organization": "Acme" }"#).unwrap();

    breachwatch()
        .args(["import", "--db"])
        .arg(dir.path().join("bad.db"))
        .arg("--file")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicates::str::contains("expected an array"));
}

#[test]
fn test_unreadable_env_config_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("broken.toml");
    std::fs::write(&config, "[server\nbind = ").unwrap();

    breachwatch()
        .env("BREACHWATCH_CONFIG", &config)
        .args(["stats", "--db"])
        .arg(dir.path().join("stats.db"))
        .assert()
        .success()
        .stderr(predicates::str::contains(
            "BREACHWATCH_CONFIG set but file could not be loaded",
        ));
}

#[test]
fn test_explicit_broken_config_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("broken.toml");
    std::fs::write(&config, "[server\nbind = ").unwrap();

    breachwatch()
        .arg("--config")
        .arg(&config)
        .arg("token")
        .assert()
        .failure()
        .stderr(predicates::str::contains("failed to parse config file"));
}
