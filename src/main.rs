#[tokio::main]
async fn main() -> anyhow::Result<()> {
    voteledger::node::run_cli().await
}
