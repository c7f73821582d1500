//! Shell completions and man pages generated from the clap definition.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::Shell;

use crate::Cli;

const BIN_NAME: &str = "repofolio";

/// Write the completion script for `shell` to `out`.
fn write_completions(shell: Shell, out: &mut impl Write) {
    clap_complete::generate(shell, &mut Cli::command(), BIN_NAME, out);
}

/// Write the top-level man page to `out`.
fn write_man_page(out: &mut impl Write) -> io::Result<()> {
    clap_mangen::Man::new(Cli::command()).render(out)
}

/// Write one page per command into `dir`, creating it if needed.
fn write_man_pages(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    clap_mangen::generate_to(Cli::command(), dir)
}

pub(crate) fn handle_completions(shell: Shell) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write_completions(shell, &mut stdout);
    stdout.flush()
}

pub(crate) fn handle_man(output: Option<PathBuf>) -> io::Result<()> {
    let Some(dir) = output else {
        return write_man_page(&mut io::stdout().lock());
    };

    write_man_pages(&dir)?;
    println!("Man pages written to {}", dir.display());
    Ok(())
}
