use roundtable::api::Server;
use roundtable::Orchestrator;

pub async fn run(orchestrator: Orchestrator, addr: &str) -> anyhow::Result<()> {
    for (id, persona) in orchestrator.personas().iter() {
        log::info!("persona {id}: {} ({})", persona.display_name, persona.model_id);
    }
    Server::new(orchestrator).run(addr).await?;
    Ok(())
}
