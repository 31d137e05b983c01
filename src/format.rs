//! Formatting of quotes into snapshot lines

use crate::{
    constants::NO_DATA,
    types::{AssetId, ColorMarker, Quote, RenderedLine, Snapshot},
};
use std::collections::HashMap;

/// Prices below this are shown with 10 decimals in parentheses
const SMALL_PRICE_THRESHOLD: f64 = 0.01;

/// Formats a USD price: `1234.50`, or `(0.0045200000)` below one cent
pub fn format_price(price: f64) -> String {
    if price < SMALL_PRICE_THRESHOLD {
        format!("({:.10})", price)
    } else {
        format!("{:.2}", price)
    }
}

/// Formats a 24h change as the suffix appended after the price
///
/// Changes that round to zero are always shown as `+0.00%`.
pub fn format_change(change_24h: f64) -> String {
    let mut percent = format!("{:+.2}", change_24h);
    if percent == "-0.00" {
        percent = "+0.00".to_string();
    }
    format!(" ({percent}%)")
}

/// Picks the color marker for a quote
pub fn color_marker(price: Option<f64>, change_24h: Option<f64>) -> ColorMarker {
    match (price, change_24h) {
        (None, _) => ColorMarker::Neutral,
        (Some(_), Some(change)) if change < 0.0 => ColorMarker::Down,
        (Some(_), Some(change)) if change > 0.0 => ColorMarker::Up,
        _ => ColorMarker::Neutral,
    }
}

/// Renders the line for one asset, or a no-data line if there is no price
pub fn render_line(asset_id: &AssetId, quote: Option<&Quote>) -> RenderedLine {
    let price = quote.and_then(|q| q.price);
    let change = quote.and_then(|q| q.change_24h);

    match price {
        Some(price) => RenderedLine {
            asset_id: asset_id.clone(),
            formatted_price: format!("${}", format_price(price)),
            formatted_change: change.map(format_change).unwrap_or_default(),
            color: color_marker(Some(price), change),
        },
        None => no_data_line(asset_id),
    }
}

/// Line shown for an asset the query said nothing about
pub fn no_data_line(asset_id: &AssetId) -> RenderedLine {
    RenderedLine {
        asset_id: asset_id.clone(),
        formatted_price: NO_DATA.to_string(),
        formatted_change: String::new(),
        color: ColorMarker::Neutral,
    }
}

impl Snapshot {
    /// Builds a snapshot with one line per id, in the order given
    pub fn build(ids: &[AssetId], quotes: &HashMap<AssetId, Quote>) -> Self {
        Self {
            lines: ids.iter().map(|id| render_line(id, quotes.get(id))).collect(),
        }
    }
}
