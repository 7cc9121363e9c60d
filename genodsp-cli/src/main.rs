mod cli;
mod handlers;

use anyhow::Result;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "genodsp";
    /// marks the start of an operator on the command line
    pub const PIPE_CHAR: char = '=';
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    handlers::run_genodsp(&args)
}
