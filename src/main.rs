//! metabump binary entry point.

use metabump::cli;
use metabump::ui::output;

fn main() {
    if let Err(err) = cli::run() {
        output::error(format!("{err:#}"));
        std::process::exit(1);
    }
}
