use crate::cli::{utils::output_value, OutputFormat};
use crate::handlers::builtin_registry;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let rows = builtin_registry()?.describe();

    let text = rows
        .iter()
        .map(|row| {
            format!(
                "{:<4} {:<10} {:<16} requires {}",
                row.version, row.api_name, row.method_name, row.effective_level
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    output_value(&output_format, &serde_json::to_value(&rows)?, &text)
}
