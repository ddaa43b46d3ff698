use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn http_remote_requires_insecure_flag() {
    let home_dir = tempfile::tempdir().expect("tempdir");

    Command::new(assert_cmd::cargo::cargo_bin!("studyspark"))
        .env("HOME", home_dir.path())
        .env_remove("STUDYSPARK_API_URL")
        .env_remove("VITE_API_URL")
        .args(["--api-url", "http://api.example.com", "whoami"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "refusing to use http:// without --insecure",
        ));
}
