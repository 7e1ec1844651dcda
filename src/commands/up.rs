use super::Context;
use crate::output::UserOutput;
use service_topology::Error;
use tokio_util::sync::CancellationToken;

/// Start services and leave them running.
pub async fn run_up(
    ctx: &Context,
    services: &[String],
    cancel: CancellationToken,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let names = ctx.services_or_all(services);
    let runner = ctx.runner(cancel.clone());

    out.status(&format!("Starting {} service(s)...", names.len()));
    if let Err(e) = runner.start_and_wait(names.as_slice()).await {
        if cancel.is_cancelled() {
            runner.teardown().await;
        } else {
            out.warning("Services started so far are left running; stop them with `topo down`");
        }
        return Err(Error::from(e).into());
    }

    out.success("All services are accepting connections");
    for service in runner.running_services() {
        out.data(&format!("{:<20} {}", service.name, service.address()));
    }
    Ok(())
}
