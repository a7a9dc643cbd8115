use anyhow::Result;

use exam_assistant::run_cli;

#[tokio::main]
async fn main() -> Result<()> {
    run_cli().await
}
