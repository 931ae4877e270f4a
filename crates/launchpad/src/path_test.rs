// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn context(home: &Path, shell: Option<Shell>) -> ShellContext {
    ShellContext {
        home: Some(home.to_path_buf()),
        shell,
        windows: false,
    }
}

#[rstest]
fn test_standard_path_macos() {
    let dirs = standard_path_for(HostOs::MacOs, |_| false);
    assert_eq!(dirs[0], PathBuf::from("/opt/homebrew/bin"));
    assert!(dirs.contains(&PathBuf::from("/usr/bin")));
    assert!(dirs.contains(&PathBuf::from("/bin")));
}

#[rstest]
#[case(true)]
#[case(false)]
fn test_standard_path_linux(#[case] linuxbrew: bool) {
    let dirs = standard_path_for(HostOs::Linux, |_| linuxbrew);
    assert_eq!(
        dirs.contains(&PathBuf::from("/home/linuxbrew/.linuxbrew/bin")),
        linuxbrew
    );
    assert_eq!(dirs.last(), Some(&PathBuf::from("/sbin")));
}

#[rstest]
#[case("/usr/bin", "/usr/local/bin:/usr/bin:/bin", true)]
#[case("/usr", "/usr/local/bin:/usr/bin:/bin", false)]
#[case("/usr/bin/", "/usr/bin", false)]
#[case("/opt/x", "", false)]
#[case("", "/usr/bin::/bin", false)]
fn test_is_in_path_value(#[case] dir: &str, #[case] path: &str, #[case] expected: bool) {
    assert_eq!(is_in_path_value(Path::new(dir), path), expected);
}

#[rstest]
#[case("/tmp/foo", true)]
#[case("/tmp", true)]
#[case("/private/tmp/x/bin", true)]
#[case("/var/folders/ab/cdef/T/launchpad/bin", true)]
#[case("/home/me/launchpad-test-123/bin", true)]
#[case("/home/me/.local/bin", false)]
#[case("/opt/tools/bin", false)]
fn test_is_transient(#[case] dir: &str, #[case] expected: bool) {
    assert_eq!(is_transient(Path::new(dir)), expected);
}

#[rstest]
fn test_edit_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let rc = tmp.path().join(".zshrc");
    std::fs::write(&rc, "alias ll='ls -l'").unwrap();

    let edit = ShellConfigEdit::new(&rc, r#"export PATH="/opt/tools/bin:$PATH""#);
    assert_eq!(edit.apply().unwrap(), EditOutcome::Appended);
    assert_eq!(edit.apply().unwrap(), EditOutcome::AlreadyPresent);

    let content = std::fs::read_to_string(&rc).unwrap();
    assert!(content.starts_with("alias ll='ls -l'\n"));
    assert_eq!(content.matches("/opt/tools/bin").count(), 1);
    assert!(content.contains(EDIT_MARKER));
}

#[rstest]
fn test_add_to_path_zsh() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".zshrc"), "").unwrap();
    let ctx = context(home.path(), Some(Shell::Zsh));

    assert!(add_to_path_with(&ctx, Path::new("/opt/tools/bin")));
    assert!(add_to_path_with(&ctx, Path::new("/opt/tools/bin")));

    let content = std::fs::read_to_string(home.path().join(".zshrc")).unwrap();
    assert_eq!(
        content.matches(r#"export PATH="/opt/tools/bin:$PATH""#).count(),
        1
    );
}

#[rstest]
fn test_add_to_path_prefers_existing_startup_file() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".bash_profile"), "").unwrap();
    let ctx = context(home.path(), Some(Shell::Bash));

    assert!(add_to_path_with(&ctx, Path::new("/opt/tools/bin")));
    assert!(!home.path().join(".bashrc").exists());
    let content = std::fs::read_to_string(home.path().join(".bash_profile")).unwrap();
    assert!(content.contains("/opt/tools/bin"));
}

#[rstest]
fn test_add_to_path_fish() {
    let home = TempDir::new().unwrap();
    std::fs::create_dir_all(home.path().join(".config/fish")).unwrap();
    std::fs::write(home.path().join(".config/fish/config.fish"), "").unwrap();
    let ctx = context(home.path(), Some(Shell::Fish));

    assert!(add_to_path_with(&ctx, Path::new("/opt/tools/bin")));
    let content =
        std::fs::read_to_string(home.path().join(".config/fish/config.fish")).unwrap();
    assert!(content.contains("set -gx PATH '/opt/tools/bin' $PATH"));
}

#[rstest]
fn test_add_to_path_refusals() {
    let home = TempDir::new().unwrap();

    let no_home = ShellContext {
        home: None,
        shell: Some(Shell::Zsh),
        windows: false,
    };
    assert!(!add_to_path_with(&no_home, Path::new("/opt/tools/bin")));

    let windows = ShellContext {
        windows: true,
        ..context(home.path(), Some(Shell::Zsh))
    };
    assert!(!add_to_path_with(&windows, Path::new("/opt/tools/bin")));

    let unknown = context(home.path(), None);
    assert!(!add_to_path_with(&unknown, Path::new("/opt/tools/bin")));

    let zsh = context(home.path(), Some(Shell::Zsh));
    assert!(!add_to_path_with(&zsh, Path::new("/tmp/launchpad/bin")));

    assert!(!home.path().join(".zshrc").exists());
}

#[rstest]
#[case(Shell::Zsh, ".zshrc")]
#[case(Shell::Bash, ".bashrc")]
#[case(Shell::Fish, ".config/fish/config.fish")]
fn test_add_to_path_without_startup_file(#[case] shell: Shell, #[case] preferred: &str) {
    let home = TempDir::new().unwrap();
    let ctx = context(home.path(), Some(shell));

    assert_eq!(ctx.startup_file(), None);
    assert!(!add_to_path_with(&ctx, Path::new("/opt/tools/bin")));
    assert!(!home.path().join(preferred).exists());
    assert_eq!(
        ctx.startup_file_or_default(),
        Some(home.path().join(preferred))
    );
}
