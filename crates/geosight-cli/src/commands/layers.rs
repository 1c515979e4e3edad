use anyhow::Result;
use geosight_core::models::Layer;

use crate::output::OutputWriter;
use crate::output_types::LayerRow;

pub fn execute(output: &OutputWriter) -> Result<()> {
    let rows: Vec<LayerRow> = Layer::all()
        .map(|layer| {
            let names = layer.names();
            LayerRow {
                overlay_id: names.overlay_id.to_string(),
                display_name: names.display_name.to_string(),
                statistics_index: names.statistics_index.unwrap_or("-").to_string(),
                description: names.description.to_string(),
            }
        })
        .collect();

    if output.is_json() {
        output.result(rows)
    } else {
        output.section("Layers");
        output.table(rows);
        Ok(())
    }
}
