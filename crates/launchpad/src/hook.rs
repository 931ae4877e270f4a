// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Shell integration scripts.
//!
//! The generated script defines a single `_launchpad_hook` function that is
//! run whenever the working directory changes. It calls back into the
//! `launchpad hook-env` command and evaluates what it prints.

use std::path::Path;

use crate::HOOK_FUNCTION_PREFIX;
use crate::shell::Shell;

#[cfg(test)]
#[path = "./hook_test.rs"]
mod hook_test;

const PROGRAM: &str = "@PROGRAM@";
const HOOK: &str = "@HOOK@";

const ZSH_INIT: &str = r#"@HOOK@() {
  trap -- '' INT
  eval "$(@PROGRAM@ hook-env --shell zsh)"
  trap - INT
}
typeset -ag chpwd_functions
if (( ! ${chpwd_functions[(I)@HOOK@]} )); then
  chpwd_functions=(@HOOK@ $chpwd_functions)
fi
@HOOK@
"#;

const BASH_INIT: &str = r#"@HOOK@() {
  local previous_exit_status=$?
  if [[ "${_LAUNCHPAD_LAST_PWD-}" != "$PWD" ]]; then
    _LAUNCHPAD_LAST_PWD="$PWD"
    eval "$(@PROGRAM@ hook-env --shell bash)"
  fi
  return $previous_exit_status
}
if [[ ";${PROMPT_COMMAND:-};" != *";@HOOK@;"* ]]; then
  PROMPT_COMMAND="@HOOK@${PROMPT_COMMAND:+;$PROMPT_COMMAND}"
fi
"#;

const FISH_INIT: &str = r#"function @HOOK@ --on-variable PWD --description 'launchpad directory hook'
    @PROGRAM@ hook-env --shell fish | source
end
@HOOK@
"#;

/// Name of the directory-change function.
pub fn hook_function() -> String {
    format!("{HOOK_FUNCTION_PREFIX}hook")
}

/// Generate the integration script for `shell`, calling `program`.
pub fn shell_init(shell: Shell, program: &Path) -> String {
    let template = match shell {
        Shell::Zsh => ZSH_INIT,
        Shell::Bash => BASH_INIT,
        Shell::Fish => FISH_INIT,
    };
    template
        .replace(HOOK, &hook_function())
        .replace(PROGRAM, &shell.quote(&program.to_string_lossy()))
}
