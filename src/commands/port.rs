use super::Context;
use crate::output::UserOutput;
use service_topology::Error;
use tokio_util::sync::CancellationToken;

/// Print where a running service can be reached.
pub async fn run_port(
    ctx: &Context,
    service: &str,
    address: bool,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let runner = ctx.runner(CancellationToken::new());
    runner
        .attach_running(&[service])
        .await
        .map_err(Error::from)?;

    let port = runner.default_port(service).map_err(Error::from)?;
    if address {
        let host = runner.resolved_host(service).map_err(Error::from)?;
        out.data(&format!("{}:{}", host, port));
    } else {
        out.data(&port.to_string());
    }
    Ok(())
}
