//! Version command implementation

use owo_colors::{OwoColorize, Stream};

/// Print the client version
pub fn run_version() {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");
    println!(
        "{} version {}",
        name.if_supports_color(Stream::Stdout, |n| n.bold()),
        version.if_supports_color(Stream::Stdout, |v| v.green())
    );
}
