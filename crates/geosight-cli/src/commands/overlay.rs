//! Overlay command implementation

use anyhow::Result;
use geosight_core::config::LayeredConfig;
use geosight_session::{LoadedOverlay, OverlayParams};

use super::{cloud_ceiling, Services};
use crate::cli::OverlayArgs;
use crate::output::OutputWriter;
use crate::output_types::OverlayOutput;

pub fn execute(args: OverlayArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut services = Services::connect(config)?;
    let loaded = load(&mut services, &args, config)?;

    if output.is_json() {
        output.result(OverlayOutput {
            url: loaded.url.clone(),
            layer: loaded.descriptor.layer.overlay_id().to_string(),
            layer_name: loaded.metadata.layer_name.clone(),
            date_range: loaded.metadata.date_range.clone(),
            cloud_coverage: loaded.metadata.cloud_coverage.clone(),
            bbox: loaded.descriptor.bbox.to_wms_bbox(),
        })?;
    } else {
        output.section("Overlay");
        output.kv("Layer", &loaded.metadata.layer_name);
        output.kv("Date range", &loaded.metadata.date_range);
        output.kv("Cloud coverage", &loaded.metadata.cloud_coverage);
        output.kv("BBOX", loaded.descriptor.bbox.to_wms_bbox());
        output.section("GetMap URL");
        println!("{}", loaded.url);
    }

    Ok(())
}

/// Draw the area and load the overlay onto the canvas
pub(crate) fn load(
    services: &mut Services,
    args: &OverlayArgs,
    config: &LayeredConfig,
) -> Result<LoadedOverlay> {
    services.draw(&args.area)?;

    let params = OverlayParams {
        layer: args.layer,
        start: args.start.clone(),
        end: args.end.clone(),
        cloud_ceiling: cloud_ceiling(args.cloud, config),
    };
    let loaded = services.workbench.load_overlay(&params)?;
    tracing::debug!(overlays = services.canvas.overlays().len(), "Canvas updated");
    Ok(loaded)
}
