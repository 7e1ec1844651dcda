use super::Context;
use crate::output::UserOutput;
use service_topology::{Error, StartupError};

pub async fn run_down(ctx: &Context, services: &[String], out: &dyn UserOutput) -> anyhow::Result<()> {
    let names = ctx.services_or_all(services);
    let mut selected = ctx.topology.select(names.as_slice()).map_err(Error::from)?;
    selected.reverse();

    out.status(&format!("Stopping {} service(s)...", selected.len()));
    ctx.orchestrator
        .stop(&selected)
        .await
        .map_err(|e| Error::from(StartupError::from(e)))?;
    out.success("Services stopped");
    Ok(())
}
