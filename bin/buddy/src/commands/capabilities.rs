use buddy_capabilities::{Capability, CapabilityRegistry};

pub async fn run(describe: Option<String>) -> anyhow::Result<()> {
    let registry = CapabilityRegistry::with_defaults();

    if let Some(name) = describe {
        let capability = registry.get(&name)?;
        let schema = capability.schema();
        println!("{} - {}", schema.name, schema.description);
        println!("{}", serde_json::to_string_pretty(&schema.parameters)?);
        return Ok(());
    }

    println!("Registered capabilities:");
    for name in registry.names() {
        let schema = registry.get(name)?.schema();
        println!("  {:14} {}", schema.name, schema.description);
    }
    Ok(())
}
