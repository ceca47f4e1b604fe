use std::time::Duration;

use anyhow::{bail, Context};
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TILE_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";
pub const DEFAULT_TILE_ATTRIBUTION: &str = "Tiles \u{a9} Esri \u{2014} Source: Esri, i-cubed, USDA, USGS, AEX, GeoEye, Getmapping, Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend_url: Url,
    pub tile_url_template: String,
    pub tile_attribution: String,
    pub request_timeout: Duration,
}

/// Reads settings from the process environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    settings_from(|name| std::env::var(name).ok())
}

fn settings_from(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Settings> {
    let read = |name: &str| {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let raw_backend = read("SPATIAL_FIXER_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.into());
    let backend_url = parse_backend_url(&raw_backend)?;

    let tile_url_template = match read("SPATIAL_FIXER_TILE_URL") {
        Some(v) if is_tile_template(&v) => v,
        Some(v) => {
            tracing::warn!(value = %v, "SPATIAL_FIXER_TILE_URL lacks {{z}}/{{x}}/{{y}} placeholders; using default");
            DEFAULT_TILE_URL.to_string()
        }
        None => DEFAULT_TILE_URL.to_string(),
    };

    let tile_attribution =
        read("SPATIAL_FIXER_TILE_ATTRIBUTION").unwrap_or_else(|| DEFAULT_TILE_ATTRIBUTION.into());

    let mut request_timeout = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);
    if let Some(v) = read("SPATIAL_FIXER_REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(secs) if secs > 0 => request_timeout = Duration::from_secs(secs),
            _ => tracing::warn!(value = %v, "ignoring invalid SPATIAL_FIXER_REQUEST_TIMEOUT_SECS"),
        }
    }

    Ok(Settings {
        backend_url,
        tile_url_template,
        tile_attribution,
        request_timeout,
    })
}

fn parse_backend_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid backend url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("backend url '{raw}' must use http or https");
    }
    Ok(url)
}

fn is_tile_template(template: &str) -> bool {
    ["{z}", "{x}", "{y}"]
        .iter()
        .all(|placeholder| template.contains(placeholder))
}
