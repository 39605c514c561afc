//! fpsmon CLI entry point.

use fpsmon_lib::cli::{self, Cli};
use fpsmon_lib::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Execute the command
    cli::execute(cli).await
}
