//! `git2kube gendoc` — writes one markdown file per subcommand, the way
//! `cmd/gendoc.go` drives cobra's `doc.GenMarkdownTree` over the command
//! tree. clap has no markdown generator built in, so this walks
//! `clap::Command` by hand.

use crate::cli::Opts;
use clap::CommandFactory;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub fn run(destination: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(destination)?;
    write_command_tree(&Opts::command(), destination, "git2kube")?;
    Ok(())
}

fn write_command_tree(cmd: &clap::Command, destination: &Path, full_name: &str) -> anyhow::Result<()> {
    let path: PathBuf = destination.join(format!("{full_name}.md"));
    std::fs::write(&path, render(cmd, full_name))?;

    for sub in cmd.get_subcommands() {
        let child_name = format!("{full_name}_{}", sub.get_name());
        write_command_tree(sub, destination, &child_name)?;
    }

    Ok(())
}

fn render(cmd: &clap::Command, full_name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## {full_name}\n");

    if let Some(about) = cmd.get_about() {
        let _ = writeln!(out, "{about}\n");
    }

    let _ = writeln!(out, "### Options\n");
    for arg in cmd.get_arguments() {
        if arg.is_positional() {
            continue;
        }
        let long = arg
            .get_long()
            .map(|l| format!("--{l}"))
            .unwrap_or_default();
        let short = arg
            .get_short()
            .map(|s| format!("-{s}, "))
            .unwrap_or_default();
        let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
        let _ = writeln!(out, "* `{short}{long}` - {help}");
    }

    if cmd.get_subcommands().next().is_some() {
        let _ = writeln!(out, "\n### Subcommands\n");
        for sub in cmd.get_subcommands() {
            let _ = writeln!(out, "* [{full_name}_{0}]({full_name}_{0}.md)", sub.get_name());
        }
    }

    out
}
