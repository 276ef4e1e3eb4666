use assert_cmd::Command;
use predicates::str::contains;

fn urur() -> Command {
    Command::cargo_bin("urur").unwrap()
}

#[test]
fn help_lists_all_commands() {
    urur()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("login"))
        .stdout(contains("logout"))
        .stdout(contains("submit"))
        .stdout(contains("whoami"));
}

#[test]
fn login_help_mentions_port_and_method() {
    urur()
        .args(["login", "--help"])
        .assert()
        .success()
        .stdout(contains("--port"))
        .stdout(contains("--method"));
}

#[test]
fn unknown_method_is_rejected() {
    urur()
        .args(["login", "--method", "carrier-pigeon"])
        .assert()
        .failure();
}

#[test]
fn logout_without_credentials_succeeds() {
    let home = tempfile::tempdir().unwrap();
    urur()
        .env("HOME", home.path())
        .env("URUR_CREDENTIALS_PATH", home.path().join("credentials.json"))
        .arg("logout")
        .assert()
        .success()
        .stdout(contains("Not logged in."));
}

#[test]
fn whoami_without_backend_config_fails_with_help() {
    let home = tempfile::tempdir().unwrap();
    urur()
        .env("HOME", home.path())
        .env("URUR_CONFIG", home.path().join("missing.toml"))
        .env("URUR_BACKEND_URL", "")
        .env("URUR_ANON_KEY", "")
        .arg("whoami")
        .assert()
        .failure()
        .stderr(contains("backend_url"));
}

#[test]
fn login_without_a_terminal_reports_prompt_failure() {
    let home = tempfile::tempdir().unwrap();
    urur()
        .env("HOME", home.path())
        .env("URUR_CONFIG", home.path().join("missing.toml"))
        .env("URUR_BACKEND_URL", "http://127.0.0.1:9")
        .env("URUR_ANON_KEY", "anon")
        .env("URUR_CREDENTIALS_PATH", home.path().join("credentials.json"))
        .arg("login")
        .assert()
        .failure()
        .stderr(contains("Prompt failed: not a terminal"));
}
