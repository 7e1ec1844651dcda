use super::Context;
use crate::output::UserOutput;
use service_topology::workflow::plan_workflow;

pub fn run_plan(ctx: &Context, workflow: &str, json: bool, out: &dyn UserOutput) -> anyhow::Result<()> {
    let plan = plan_workflow(&ctx.config, &ctx.topology, workflow, &ctx.base_dir)?;

    if json {
        out.data(&serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    out.data(&format!("Workflow: {}", plan.name));
    out.data(&format!("Config:   {}", ctx.config_path.display()));
    out.data(&format!("Project:  {}", ctx.project));
    out.data("Services:");
    for name in &plan.services {
        if let Some(service) = ctx.topology.get(name) {
            out.data(&format!("  {} -> {} ({})", name, service.advertised_port(), service.image));
        }
    }
    if !plan.env.is_empty() {
        out.data("Environment:");
        for (key, template) in &plan.env {
            out.data(&format!("  {}={}", key, template.source()));
        }
    }
    if let Some(cwd) = &plan.cwd {
        out.data(&format!("Directory: {}", cwd.display()));
    }
    out.data(&format!("Command:  {}", plan.display_command()));
    Ok(())
}
