//! svgembed binary

use svgembed::EmbedCli;
use std::process;

fn main() {
    let mut cli = EmbedCli::new();

    if let Err(e) = cli.run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
