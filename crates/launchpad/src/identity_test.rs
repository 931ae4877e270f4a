// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

#[rstest]
#[case("/")]
#[case("/a")]
#[case("/home/user/projects/web")]
#[case("/Users/me/My Projects/app (copy)")]
#[case("/srv/ünïcode/プロジェクト")]
fn test_key_round_trip(#[case] path: &str) {
    let key = ProjectKey::encode(Path::new(path));
    assert!(key.as_str().len() >= MIN_KEY_LEN);
    assert!(!key.as_str().contains(['/', '+', '=']));
    assert_eq!(key.decode().unwrap(), PathBuf::from(path));
}

#[rstest]
fn test_distinct_paths_distinct_keys() {
    // standard base64 gives "L3A+" and "L3A/", differing only in '+' vs '/'
    let a = ProjectKey::encode(Path::new("/p>"));
    let b = ProjectKey::encode(Path::new("/p?"));
    assert_ne!(a, b);
}

#[rstest]
fn test_many_paths_many_keys() {
    let keys: std::collections::HashSet<_> = (0..1000)
        .map(|i| ProjectKey::encode(Path::new(&format!("/projects/p{i}"))))
        .collect();
    assert_eq!(keys.len(), 1000);
    assert!(keys.iter().all(|k| k.as_str().len() > 16));
}

#[rstest]
fn test_identify_is_stable() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(identify(tmp.path()), identify(tmp.path()));
}

#[cfg(unix)]
#[rstest]
fn test_identify_resolves_symlinks() {
    let tmp = TempDir::new().unwrap();
    let real = tmp.path().join("real");
    let link = tmp.path().join("link");
    std::fs::create_dir(&real).unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    assert_eq!(identify(&real), identify(&link));
}

#[rstest]
fn test_identify_missing_path() {
    let key = identify("/definitely/not/a/real/launchpad/path");
    assert_eq!(
        key.decode().unwrap(),
        PathBuf::from("/definitely/not/a/real/launchpad/path")
    );
}

#[rstest]
fn test_parse_key() {
    let key = ProjectKey::encode(Path::new("/home/user/project"));
    let parsed: ProjectKey = key.as_str().parse().unwrap();
    assert_eq!(parsed, key);
}

#[rstest]
#[case("short")]
#[case("not base64 at all!!")]
fn test_parse_invalid_key(#[case] value: &str) {
    assert!(value.parse::<ProjectKey>().is_err());
}
