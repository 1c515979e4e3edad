//! Stats command implementation

use anyhow::Result;
use geosight_core::config::LayeredConfig;
use geosight_session::StatisticsParams;

use super::Services;
use crate::cli::StatsArgs;
use crate::output::OutputWriter;
use crate::output_types::{IndexRow, StatsOutput};
use crate::progress::{create_spinner, finish_error, finish_success};

pub async fn execute(args: StatsArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut services = Services::connect(config)?;
    services.draw(&args.area)?;

    let params = StatisticsParams { indices: args.indices, start: args.start, end: args.end };

    let spinner = create_spinner("Computing index statistics...", output.is_json());
    let report = match services.workbench.load_statistics(&params).await {
        Ok(report) => {
            finish_success(&spinner, &format!("Aggregated {} images", report.total_images));
            report
        }
        Err(e) => {
            finish_error(&spinner, "Statistics failed");
            return Err(e.into());
        }
    };

    if output.is_json() {
        output.result(StatsOutput {
            indices: serde_json::to_value(&report.indices)?,
            date_range: report.date_range,
            total_images: report.total_images,
            aggregation_info: report.aggregation_info,
        })?;
        return Ok(());
    }

    output.section("Index Statistics");
    let rows: Vec<IndexRow> = report
        .indices
        .iter()
        .map(|(index, statistics)| IndexRow {
            index: index.clone(),
            statistics: statistics.to_string(),
        })
        .collect();
    output.table(rows);

    output.kv("Images", report.total_images);
    if !report.date_range.is_null() {
        output.kv("Date range", &report.date_range);
    }

    Ok(())
}
