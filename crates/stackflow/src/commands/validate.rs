use crate::utils;
use colored::Colorize;
use stackflow_core::GraphError;

pub fn handle(stack: &str) -> anyhow::Result<()> {
    println!("{}", "Validating stack...".blue());

    let graph = utils::find_stack(stack)?.into_graph(None)?;
    if let Err(GraphError::UnresolvedReferences(unresolved)) = graph.resolve_references() {
        println!("{}", "✗ Unresolved references:".red().bold());
        for reference in &unresolved {
            println!("  - {}", reference);
        }
        return Err(anyhow::anyhow!(
            "{} unresolved reference(s) in '{}'",
            unresolved.len(),
            graph.name()
        ));
    }
    stackflow_core::render(&graph)?;

    println!("{}", "✓ Stack is valid".green().bold());
    println!();
    println!("Summary for {}:", graph.name().cyan());
    println!("  Parameters: {}", graph.parameters().count());
    for (name, parameter) in graph.parameters() {
        let marker = if parameter.is_required() {
            "required".yellow()
        } else {
            "optional".dimmed()
        };
        println!("    - {} ({}, {})", name.cyan(), parameter.param_type, marker);
    }
    println!("  Resources: {}", graph.resource_count());
    for (name, resource) in graph.resources() {
        println!("    - {} ({})", name.cyan(), resource.kind);
    }
    println!("  Outputs: {}", graph.outputs().count());
    for (name, _) in graph.outputs() {
        println!("    - {}", name.cyan());
    }
    Ok(())
}
