//! Compare command implementation

use anyhow::Result;
use geosight_core::config::LayeredConfig;
use geosight_session::ComparisonParams;

use super::{cloud_ceiling, Services};
use crate::cli::CompareArgs;
use crate::output::OutputWriter;
use crate::output_types::{CompareOutput, PeriodImage};
use crate::progress::{create_spinner, finish_error, finish_success};

pub async fn execute(
    args: CompareArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let mut services = Services::connect(config)?;
    services.draw(&args.area)?;

    let params = ComparisonParams {
        layer: args.layer,
        period1_start: args.period1,
        period2_start: args.period2,
        cloud_ceiling: cloud_ceiling(args.cloud, config),
    };

    let spinner = create_spinner("Fetching comparison images...", output.is_json());
    let comparison = match services.workbench.load_comparison(&params).await {
        Ok(comparison) => {
            finish_success(&spinner, "Comparison images ready");
            comparison
        }
        Err(e) => {
            finish_error(&spinner, "Comparison failed");
            return Err(e.into());
        }
    };

    if output.is_json() {
        output.result(CompareOutput {
            layer: comparison.descriptor.layer.overlay_id().to_string(),
            period1: PeriodImage {
                label: comparison.period1_label,
                image_url: comparison.images.image1_url,
            },
            period2: PeriodImage {
                label: comparison.period2_label,
                image_url: comparison.images.image2_url,
            },
        })?;
    } else {
        output.section(format!("{} comparison", comparison.descriptor.layer.display_name()));
        output.kv(&comparison.period1_label, &comparison.images.image1_url);
        output.kv(&comparison.period2_label, &comparison.images.image2_url);
    }

    Ok(())
}
