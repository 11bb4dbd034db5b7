#[path = "roundtable/app/mod.rs"]
mod app;
#[path = "roundtable/args.rs"]
mod args;
#[path = "roundtable/logging.rs"]
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
