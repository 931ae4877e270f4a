// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

/// A backend running `script` through `sh` with the tool and prefix as
/// positional arguments.
fn sh_backend(script: &str, max_retries: usize) -> CommandBackend {
    CommandBackend {
        program: "sh".to_string(),
        args: ["-c", script, "sh", "{tool}", "{prefix}"]
            .map(String::from)
            .to_vec(),
        timeout: Duration::from_secs(10),
        max_retries,
        retry_delay: Duration::from_millis(1),
        allow_sudo: false,
    }
}

#[rstest]
fn test_args_for() {
    let backend = CommandBackend::from_config(&InstallSettings::default());
    let args = backend.args_for(&Dependency::new("nodejs.org", "^20"), Path::new("/envs/abc"));
    assert_eq!(args, vec!["install", "--prefix", "/envs/abc", "nodejs.org@^20"]);
}

#[rstest]
#[case(500, 3, vec![500, 1000, 2000])]
#[case(1000, 5, vec![1000, 2000, 4000, 8000, 10_000])]
#[case(1, 2, vec![2, 4])]
#[case(500, 0, vec![])]
fn test_backoff(#[case] delay_ms: u64, #[case] retries: usize, #[case] expected: Vec<u64>) {
    let delays: Vec<u64> = backoff(Duration::from_millis(delay_ms), retries)
        .map(|d| d.as_millis() as u64)
        .collect();
    assert_eq!(delays, expected);
}

#[rstest]
#[case("nodejs.org", "installed nodejs.org@20.11.1", Some("20.11.1"))]
#[case("nodejs.org", "pkgx: +nodejs.org@18.0.0\n+nodejs.org@20.1.0", Some("20.1.0"))]
#[case("nodejs.org", "nothing useful", None)]
#[case("nodejs.org", "nodejs.org@^20", None)]
fn test_reported_version(#[case] name: &str, #[case] output: &str, #[case] expected: Option<&str>) {
    assert_eq!(reported_version(name, output).as_deref(), expected);
}

#[rstest]
#[tokio::test]
async fn test_install_success() {
    let prefix = TempDir::new().unwrap();
    let backend = sh_backend(r#"echo "installed $1.4""#, 0);

    let report = backend
        .install(&[Dependency::new("nodejs.org", "20")], prefix.path())
        .await;

    assert!(report.is_success());
    assert_eq!(
        report.succeeded(),
        vec![(Dependency::new("nodejs.org", "20"), "20.4".to_string())]
    );
    assert_eq!(report.outcomes[0].attempts, 1);
}

#[rstest]
#[tokio::test]
async fn test_install_failure_is_retried() {
    let prefix = TempDir::new().unwrap();
    let backend = sh_backend("echo broken >&2; exit 3", 2);

    let report = backend
        .install(&[Dependency::new("nodejs.org", "20")], prefix.path())
        .await;

    let failed = report.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].attempts, 3);
    let message = failed[0].result.clone().unwrap_err();
    assert!(message.contains("status 3"), "{message}");
    assert!(message.contains("broken"), "{message}");
}

#[rstest]
#[tokio::test]
async fn test_install_recovers_on_retry() {
    let prefix = TempDir::new().unwrap();
    let backend = sh_backend(
        r#"n=$(cat "$2/count" 2>/dev/null || echo 0); n=$((n+1)); echo $n > "$2/count"; [ "$n" -ge 2 ]"#,
        3,
    );

    let report = backend
        .install(&[Dependency::new("bun.sh", "*")], prefix.path())
        .await;

    assert!(report.is_success());
    assert_eq!(report.outcomes[0].attempts, 2);
    // nothing reported, so the constraint stands in for the version
    assert_eq!(report.outcomes[0].result, Ok("*".to_string()));
}

#[rstest]
#[tokio::test]
async fn test_one_failure_does_not_stop_others() {
    let prefix = TempDir::new().unwrap();
    let backend = sh_backend(r#"case "$1" in bad*) exit 1;; esac"#, 0);

    let report = backend
        .install(
            &[
                Dependency::new("bad.tool", "1"),
                Dependency::new("good.tool", "2"),
            ],
            prefix.path(),
        )
        .await;

    assert!(!report.is_success());
    assert_eq!(report.failed()[0].dependency.name, "bad.tool");
    assert_eq!(
        report.succeeded(),
        vec![(Dependency::new("good.tool", "2"), "2".to_string())]
    );
}

#[rstest]
#[tokio::test]
async fn test_install_timeout() {
    let prefix = TempDir::new().unwrap();
    let mut backend = sh_backend("sleep 5", 0);
    backend.timeout = Duration::from_millis(100);

    let report = backend
        .install(&[Dependency::new("slow.tool", "*")], prefix.path())
        .await;

    let message = report.failed()[0].result.clone().unwrap_err();
    assert!(message.contains("timed out"), "{message}");
}

#[rstest]
#[tokio::test]
async fn test_missing_program() {
    let prefix = TempDir::new().unwrap();
    let mut backend = sh_backend("", 0);
    backend.program = "launchpad-no-such-installer".to_string();

    let report = backend
        .install(&[Dependency::new("x.org", "*")], prefix.path())
        .await;
    assert!(!report.is_success());
}
