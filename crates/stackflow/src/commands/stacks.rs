use crate::catalog;
use colored::Colorize;

pub fn handle() {
    println!("{}", "Built-in stacks:".bold());
    for spec in catalog::all() {
        println!(
            "  • {:<8} {} ({} resources, default name: {})",
            spec.key.cyan(),
            spec.summary,
            spec.resources.len(),
            spec.default_stack_name
        );
    }
}
