use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    fn_history_cli::main_entry().await
}
