use crate::Format;
use crate::utils;

pub fn handle(stack: &str, stack_name: Option<&str>, format: Format) -> anyhow::Result<()> {
    let graph = utils::find_stack(stack)?.into_graph(stack_name)?;
    let document = stackflow_core::render(&graph)?;

    let output = match format {
        Format::Json => document.to_json_pretty()?,
        Format::Yaml => document.to_yaml()?,
    };
    println!("{}", output.trim_end());
    Ok(())
}
