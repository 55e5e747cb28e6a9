use anyhow::Result;
use tracing::error;
use ticktrack::{cli::run_cli, utils::runtime::single_thread_runtime};

fn main() -> Result<()> {
    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(run_cli()).inspect_err(|e| {
        error!("Error running cli {e:?}");
    });
    // Stdin is read on a blocking thread which can't be interrupted.
    runtime.shutdown_background();
    result
}
