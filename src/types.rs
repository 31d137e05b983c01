//! Types for the price ticker

use crate::error::WatchlistError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identifier of a tracked asset (CoinGecko coin id)
///
/// Always trimmed and lowercase, made of ASCII letters, digits and `-`.
/// Two ids are the same asset only if their strings are exactly equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    /// Normalises `raw` into an asset id
    pub fn new(raw: &str) -> Result<Self, WatchlistError> {
        let id = raw.trim().to_lowercase();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(WatchlistError::InvalidAssetId(raw.to_string()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AssetId {
    type Error = WatchlistError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Price data for an asset as returned by one query
///
/// `price` and `change_24h` are independently optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// The asset
    pub asset_id: AssetId,

    /// Price in USD
    pub price: Option<f64>,

    /// 24h price change percentage
    pub change_24h: Option<f64>,

    /// When the quote was received
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    /// Create a quote stamped with the current time
    pub fn new(asset_id: AssetId, price: Option<f64>, change_24h: Option<f64>) -> Self {
        Self {
            asset_id,
            price,
            change_24h,
            fetched_at: Utc::now(),
        }
    }
}

/// Direction marker used to color a rendered line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMarker {
    Up,
    Down,
    Neutral,
}

/// One rendered line of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedLine {
    pub asset_id: AssetId,
    /// `$1234.50`, `$(0.0045200000)` or the no-data placeholder
    pub formatted_price: String,
    /// ` (+1.25%)` or empty
    pub formatted_change: String,
    pub color: ColorMarker,
}

impl RenderedLine {
    /// Text of the line as shown on screen
    pub fn text(&self) -> String {
        format!(
            "{}: {}{}",
            self.asset_id, self.formatted_price, self.formatted_change
        )
    }
}

/// Char range of the full ticker text belonging to one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSpan {
    pub start: usize,
    pub end: usize,
    pub color: ColorMarker,
}

/// Formatted, ordered lines produced by one poll cycle
///
/// Equality is structural over the rendered lines, which is what change
/// detection compares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub lines: Vec<RenderedLine>,
}

impl Snapshot {
    /// Line separator in the concatenated text
    pub const SEPARATOR: char = '\n';

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Concatenated text of every line, with the color span of each line
    pub fn render(&self) -> (String, Vec<ColorSpan>) {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(self.lines.len());
        let mut cursor = 0;

        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                text.push(Self::SEPARATOR);
                cursor += 1;
            }
            let line_text = line.text();
            let len = line_text.chars().count();
            spans.push(ColorSpan {
                start: cursor,
                end: cursor + len,
                color: line.color,
            });
            text.push_str(&line_text);
            cursor += len;
        }

        (text, spans)
    }

    /// Concatenated text of every line
    pub fn text(&self) -> String {
        self.render().0
    }
}

/// Entry of the provider's coin catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, price: &str, change: &str, color: ColorMarker) -> RenderedLine {
        RenderedLine {
            asset_id: AssetId::new(id).unwrap(),
            formatted_price: price.to_string(),
            formatted_change: change.to_string(),
            color,
        }
    }

    #[test]
    fn test_asset_id_normalisation() {
        assert_eq!(AssetId::new("  Bitcoin ").unwrap().as_str(), "bitcoin");
        assert!(AssetId::new("   ").is_err());
        assert_eq!(AssetId::new("Bitcoin-Cash").unwrap().as_str(), "bitcoin-cash");
        assert_eq!(AssetId::new("usd-coin-2").unwrap().as_str(), "usd-coin-2");
    }

    #[test]
    fn test_asset_id_rejects_query_characters() {
        let rejected = [
            "a#b",
            "x&vs_currencies=eur",
            "bitcoin,solana",
            "shiba inu",
            "wrapped_btc",
            "ét",
        ];
        for raw in rejected {
            assert!(
                matches!(AssetId::new(raw), Err(WatchlistError::InvalidAssetId(_))),
                "{raw:?} should be rejected"
            );
        }
        assert!(serde_json::from_str::<Vec<AssetId>>(r#"["a#b"]"#).is_err());
    }

    #[test]
    fn test_asset_id_deserialize_normalises() {
        let ids: Vec<AssetId> = serde_json::from_str(r#"["Solana", "bitcoin"]"#).unwrap();
        assert_eq!(ids[0].as_str(), "solana");
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"["solana","bitcoin"]"#);
    }

    #[test]
    fn test_render_spans_cover_each_line() {
        let snapshot = Snapshot {
            lines: vec![
                line("btc", "$10.00", " (+1.00%)", ColorMarker::Up),
                line("eth", "no data", "", ColorMarker::Neutral),
            ],
        };

        let (text, spans) = snapshot.render();
        assert_eq!(text, "btc: $10.00 (+1.00%)\neth: no data");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[0].end, 20);
        assert_eq!(spans[1].start, 21);
        assert_eq!(spans[1].end, text.chars().count());
        assert_eq!(spans[1].color, ColorMarker::Neutral);
    }

    #[test]
    fn test_snapshot_equality_is_structural() {
        let a = Snapshot {
            lines: vec![line("btc", "$10.00", "", ColorMarker::Neutral)],
        };
        let b = a.clone();
        let c = Snapshot {
            lines: vec![line("btc", "$10.01", "", ColorMarker::Neutral)],
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
