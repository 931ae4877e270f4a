// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

#[rstest]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.install.command, "pkgx");
    assert_eq!(
        config.install.args,
        vec!["install", "--prefix", "{prefix}", "{tool}"]
    );
    assert!(config.shell.show_messages);
    assert_eq!(config.install.timeout(), Duration::from_secs(300));
}

#[rstest]
fn test_missing_file_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_from(Some(&tmp.path().join("missing.yaml"))).unwrap();
    assert_eq!(config.install, InstallSettings::default());
    assert_eq!(config.shell, ShellSettings::default());
}

#[rstest]
fn test_file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("config.yaml");
    std::fs::write(
        &file,
        r#"
env_dir: /data/envs
install:
  command: /usr/local/bin/pkgx
  timeout_secs: 20
shell:
  show_messages: false
"#,
    )
    .unwrap();

    let config = Config::load_from(Some(&file)).unwrap();
    assert_eq!(config.env_dir().unwrap(), PathBuf::from("/data/envs"));
    assert_eq!(config.install.command, "/usr/local/bin/pkgx");
    assert_eq!(config.install.timeout_secs, 20);
    // untouched fields keep their defaults
    assert_eq!(config.install.max_retries, InstallSettings::default().max_retries);
    assert!(!config.shell.show_messages);
}

#[rstest]
fn test_activation_line() {
    let shell = ShellSettings::default();
    assert_eq!(
        shell.activation_line(Path::new("/home/me/web")),
        "✅ Environment activated for /home/me/web"
    );
}
