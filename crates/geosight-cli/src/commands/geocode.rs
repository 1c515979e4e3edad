//! Geocode command implementation

use anyhow::Result;
use geosight_core::config::LayeredConfig;

use super::Services;
use crate::cli::GeocodeArgs;
use crate::output::OutputWriter;
use crate::output_types::GeocodeOutput;

pub async fn execute(
    args: GeocodeArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let services = Services::connect(config)?;
    let entry = services.geocoder.lookup(args.lat, args.lng).await;

    if output.is_json() {
        output.result(GeocodeOutput {
            lat: args.lat,
            lng: args.lng,
            fallback: entry.is_fallback(),
            label: entry.label,
            address: entry.address,
        })?;
        return Ok(());
    }

    if entry.is_fallback() {
        output.warning("No address found for this coordinate");
    }
    output.kv("Location", &entry.label);

    let address = &entry.address;
    let parts = [
        ("City", &address.city),
        ("Town", &address.town),
        ("Village", &address.village),
        ("County", &address.county),
        ("State", &address.state),
        ("Country", &address.country),
    ];
    for (key, value) in parts {
        if let Some(value) = value {
            output.kv(key, value);
        }
    }

    Ok(())
}
