// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
#[case(Shell::Zsh)]
#[case(Shell::Bash)]
#[case(Shell::Fish)]
fn test_script_calls_back(#[case] shell: Shell) {
    let script = shell_init(shell, Path::new("/usr/local/bin/launchpad"));
    assert!(script.contains(&format!(
        "'/usr/local/bin/launchpad' hook-env --shell {shell}"
    )));
    assert!(!script.contains('@'));
}

#[rstest]
#[case(Shell::Zsh)]
#[case(Shell::Bash)]
#[case(Shell::Fish)]
fn test_functions_are_prefixed(#[case] shell: Shell) {
    let script = shell_init(shell, Path::new("launchpad"));
    assert!(script.contains(HOOK_FUNCTION_PREFIX));
    assert_eq!(hook_function(), "_launchpad_hook");
}

#[rstest]
fn test_zsh_uses_chpwd() {
    let script = shell_init(Shell::Zsh, Path::new("launchpad"));
    assert!(script.contains("chpwd_functions=(_launchpad_hook $chpwd_functions)"));
}

#[rstest]
fn test_bash_guards_prompt_command() {
    let script = shell_init(Shell::Bash, Path::new("launchpad"));
    assert!(script.contains("PROMPT_COMMAND=\"_launchpad_hook"));
    assert!(script.contains("_LAUNCHPAD_LAST_PWD"));
}

#[rstest]
fn test_fish_watches_pwd() {
    let script = shell_init(Shell::Fish, Path::new("launchpad"));
    assert!(script.contains("--on-variable PWD"));
    assert!(script.contains("| source"));
}

#[rstest]
fn test_program_is_quoted() {
    let script = shell_init(Shell::Bash, Path::new("/Users/me/My Tools/launchpad"));
    assert!(script.contains("'/Users/me/My Tools/launchpad' hook-env"));
}
