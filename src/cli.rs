use clap::Parser;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

License: MIT
Configuration: ~/.lined/config.toml"
);

#[derive(Parser)]
#[command(name = "lined")]
#[command(about = "A line-oriented text editor in the tradition of ed")]
#[command(long_about = "lined edits text one line at a time, reading commands from standard input.

COMMANDS:
  [addr]p  [addr]n       Print lines (n adds line numbers)
  [addr]a  [addr]i       Append or insert text; end input with a lone '.'
  [addr]c  [addr]d       Change or delete lines
  [addr]m addr           Move lines after addr
  [addr]s/re/text/[gi]   Substitute (& is the match, \\1-\\9 are groups)
  [addr]g/re/cmd         Run cmd on every matching line (x/re/cmd: non-matching)
  [addr]=                Print a line number
  e file  f file         Edit a file, or set the remembered filename
  [addr]r file           Read a file after addr
  [addr]w file           Write lines to a file
  h  H                   Explain the last error, or toggle explanations
  q                      Quit

ADDRESSES:
  N  .  $  /re/  \\re\\    Line number, current, last, next match
  addr+N  addr-N          Offset
  a,b  a;b                Range (';' makes a current before reading b)

Errors are reported as '?'.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
struct Cli {
    /// File to load into the buffer at startup
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Args {
    pub file: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();
    Args { file: cli.file }
}
