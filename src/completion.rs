//! # Shell Completion Module
//!
//! Static completion scripts come from clap_complete. The enhanced bash script
//! additionally completes song names by calling the hidden `complete-songs`
//! command, which prints every catalog name on its own line.
//!
//! ## Usage
//!
//! ```bash
//! segue completion bash > ~/.local/share/bash-completion/completions/segue
//! segue completion bash --enhanced > ~/.local/share/bash-completion/completions/segue
//! segue completion zsh > ~/.config/zsh/completions/_segue
//! ```

use crate::catalog::Catalog;
use crate::cli::Shell;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Convert our Shell enum to clap_complete's Shell enum
#[must_use]
pub fn shell_to_completion_shell(shell: Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Bash completion that also completes song names for `play`, `next` and
/// `neighbors`.
pub fn generate_enhanced_bash_completion() {
    println!(r#"#!/bin/bash

_segue_complete_songs() {{
    if command -v segue >/dev/null 2>&1; then
        segue complete-songs 2>/dev/null
    fi
}}

_segue() {{
    local cur prev words cword
    _init_completion || return

    case "${{prev}}" in
        play|next|neighbors|--played)
            local IFS=$'\n'
            mapfile -t COMPREPLY < <(_segue_complete_songs | grep -i -- "^${{cur}}")
            return 0
            ;;
        completion)
            COMPREPLY=($(compgen -W "bash zsh fish power-shell elvish" -- "${{cur}}"))
            return 0
            ;;
        --dataset|--config)
            _filedir
            return 0
            ;;
        --tolerance|-t)
            COMPREPLY=($(compgen -W "5000 10000 20000 30000" -- "${{cur}}"))
            return 0
            ;;
    esac

    local subcommands="play next neighbors list init-config completion help"
    local globals="--dataset --config --exclude --neighbors --help --version"

    if [[ $cword -eq 1 ]]; then
        COMPREPLY=($(compgen -W "$subcommands $globals" -- "${{cur}}"))
    else
        case "${{words[1]}}" in
            play)
                COMPREPLY=($(compgen -W "--tolerance --played --limit --no-delay --playback-scale $globals" -- "${{cur}}"))
                ;;
            next)
                COMPREPLY=($(compgen -W "--tolerance --played $globals" -- "${{cur}}"))
                ;;
            neighbors)
                COMPREPLY=($(compgen -W "--tolerance --played --json $globals" -- "${{cur}}"))
                ;;
            init-config)
                COMPREPLY=($(compgen -W "--force $globals" -- "${{cur}}"))
                ;;
            *)
                COMPREPLY=($(compgen -W "$subcommands" -- "${{cur}}"))
                ;;
        esac
    fi
}} &&
complete -F _segue segue
"#);
}

/// Catalog song names, sorted, for completion.
#[must_use]
pub fn song_completions(catalog: &Catalog) -> Vec<String> {
    let mut names: Vec<String> = catalog.songs().iter().map(|s| s.name.clone()).collect();
    names.sort_unstable();
    names
}

/// Print one song name per line.
///
/// # Errors
///
/// When stdout cannot be written (for example a closed pipe).
pub fn print_song_completions(catalog: &Catalog) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for name in song_completions(catalog) {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_mapping() {
        assert_eq!(shell_to_completion_shell(Shell::Bash), CompletionShell::Bash);
        assert_eq!(shell_to_completion_shell(Shell::Fish), CompletionShell::Fish);
        assert_eq!(
            shell_to_completion_shell(Shell::PowerShell),
            CompletionShell::PowerShell
        );
    }

    #[test]
    fn test_song_completions_sorted() {
        let csv = "name,duration_ms\nScarborough Fair,1\nDanny Boy,2\nParanoid,3\n";
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(
            song_completions(&catalog),
            vec!["Danny Boy", "Paranoid", "Scarborough Fair"]
        );
    }
}
