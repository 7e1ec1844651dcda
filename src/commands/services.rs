use super::Context;
use crate::output::UserOutput;

pub fn run_services(ctx: &Context, json: bool, out: &dyn UserOutput) -> anyhow::Result<()> {
    if json {
        out.data(&serde_json::to_string_pretty(ctx.topology.services())?);
        return Ok(());
    }

    for service in ctx.topology.services() {
        let ports: Vec<String> = service.ports.iter().map(ToString::to_string).collect();
        out.data(&format!(
            "{:<20} {:<45} {}",
            service.name,
            service.image,
            ports.join(", ")
        ));
    }
    Ok(())
}
