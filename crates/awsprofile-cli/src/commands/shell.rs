//! Shell integration
//!
//! Handles: awsprofile shell-init, awsprofile setup-shell [--rc <file>]
//!
//! A child process cannot change its parent shell's environment, so the
//! `awsp` function evals the `--shell` output of this binary.

use anyhow::{bail, Context};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const MARKER_START: &str = "# >>> awsprofile shell integration >>>";
pub const MARKER_END: &str = "# <<< awsprofile shell integration <<<";

/// Snippet for bash and zsh rc files
pub fn integration_snippet() -> String {
    format!(
        r#"{MARKER_START}
# `awsp <profile>` runs `export AWS_PROFILE=<profile>` in this shell
awsp() {{
    case "$1" in
        "")
            eval "$(command awsprofile --shell)"
            ;;
        clear)
            eval "$(command awsprofile --shell clear)"
            ;;
        -s|--switch)
            shift
            eval "$(command awsprofile --shell --switch "$@")"
            ;;
        list|current|create|delete|validate|config|restore|shell-init|setup-shell|-*)
            command awsprofile "$@"
            ;;
        *)
            eval "$(command awsprofile --shell --switch "$@")"
            ;;
    esac
}}

_awsp_completion() {{
    local cur="${{COMP_WORDS[COMP_CWORD]}}"
    COMPREPLY=($(compgen -W "clear list current $(command awsprofile list --names 2>/dev/null)" -- "$cur"))
}}

_awsp_zsh_completion() {{
    compadd -- clear list current $(command awsprofile list --names 2>/dev/null)
}}

if [ -n "$ZSH_VERSION" ]; then
    (( $+functions[compdef] )) && compdef _awsp_zsh_completion awsp
elif [ -n "$BASH_VERSION" ]; then
    complete -F _awsp_completion awsp
fi
{MARKER_END}
"#
    )
}

pub fn execute_init() {
    print!("{}", integration_snippet());
}

pub fn execute_setup(rc: Option<&Path>) -> anyhow::Result<()> {
    let rc = match rc {
        Some(path) => path.to_path_buf(),
        None => default_rc_file()?,
    };

    if install(&rc)? {
        println!("✅ Added shell integration to {}", rc.display());
        println!("💡 Run 'source {}' or open a new terminal, then:", rc.display());
        println!("   awsp <profile>   # switch profile in this shell");
        println!("   awsp clear       # back to default");
    } else {
        println!("✅ Shell integration already present in {}", rc.display());
    }
    Ok(())
}

/// Append the snippet unless the marker is already there.
/// Returns whether the file changed.
pub fn install(rc: &Path) -> anyhow::Result<bool> {
    let existing = match fs::read_to_string(rc) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", rc.display())),
    };
    if existing.contains(MARKER_START) {
        return Ok(false);
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(rc)
        .with_context(|| format!("Failed to open {}", rc.display()))?;
    let separator = if existing.is_empty() || existing.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    };
    write!(file, "{separator}{}", integration_snippet())
        .with_context(|| format!("Failed to write {}", rc.display()))?;
    tracing::debug!(rc = %rc.display(), "shell integration installed");
    Ok(true)
}

fn default_rc_file() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Home directory not found; pass --rc")?;
    let shell = std::env::var("SHELL").unwrap_or_default();
    match rc_name_for_shell(&shell) {
        Some(name) => Ok(home.join(name)),
        None => bail!("Could not detect a bash or zsh shell from $SHELL={shell:?}; pass --rc <file>"),
    }
}

fn rc_name_for_shell(shell: &str) -> Option<&'static str> {
    let name = Path::new(shell).file_name()?.to_str()?;
    match name {
        "zsh" => Some(".zshrc"),
        "bash" => Some(".bashrc"),
        _ => None,
    }
}
