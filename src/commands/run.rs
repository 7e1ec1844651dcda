use super::Context;
use crate::output::UserOutput;
use service_topology::workflow::plan_workflow;
use service_topology::Error;
use tokio_util::sync::CancellationToken;

/// Plan, start, wait, run, tear down.
pub async fn run_workflow(
    ctx: &Context,
    workflow: &str,
    extra_args: &[String],
    keep: bool,
    cancel: CancellationToken,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let plan = plan_workflow(&ctx.config, &ctx.topology, workflow, &ctx.base_dir)?
        .with_extra_args(extra_args);

    out.status(&format!(
        "Workflow '{}': starting {} service(s)",
        plan.name,
        plan.services.len()
    ));

    let runner = ctx.runner(cancel.clone());
    let result = runner.run_workflow(&plan).await;

    if keep && !cancel.is_cancelled() {
        out.status("Leaving services running (--keep); stop them with `topo down`");
    } else {
        runner.teardown().await;
    }

    let report = result.map_err(Error::from)?;
    out.success(&format!(
        "Workflow '{}' succeeded in {:.1}s",
        report.workflow,
        report.elapsed.as_secs_f64()
    ));
    Ok(())
}
