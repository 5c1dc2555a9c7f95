//! Card records and their storage descriptors.
//!
//! `Card` is one printing of a card as normalized from the bulk archive.
//! `CardStats` is one entry of a stats-service response, and `CardWithStats`
//! is the flat row produced by joining the two. The stats columns are shared
//! through `StatLine` so both records declare them exactly once.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use mtgdata_core::record::{FieldDesc, Kind, Record, RecordDesc};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    pub name: String,
    pub mana_cost: String,
    #[serde(deserialize_with = "lenient_i32")]
    pub mana_value: Option<i32>,
    pub types: Vec<String>,
    pub printing: String,
    pub rarity: String,
    pub text: String,
    pub power: String,
    pub toughness: String,
}

static CARD: Lazy<RecordDesc> = Lazy::new(|| RecordDesc::new("Card", card_fields()));

fn card_fields() -> Vec<FieldDesc> {
    vec![
        FieldDesc::new("name", Kind::Utf8),
        FieldDesc::new("mana_cost", Kind::Utf8).alias("manaCost"),
        FieldDesc::new("mana_value", Kind::optional(Kind::Int32)).alias("manaValue"),
        FieldDesc::new("types", Kind::sequence(Kind::Utf8)),
        FieldDesc::new("printing", Kind::Utf8),
        FieldDesc::new("rarity", Kind::Utf8),
        FieldDesc::new("text", Kind::Utf8),
        FieldDesc::new("power", Kind::Utf8),
        FieldDesc::new("toughness", Kind::Utf8),
    ]
}

impl Record for Card {
    fn describe() -> &'static RecordDesc {
        &CARD
    }
}

impl Card {
    /// Normalize one raw archive entry belonging to `printing`.
    ///
    /// Upstream camelCase names are mapped onto the declared fields, unknown
    /// keys are ignored and missing ones take their defaults.
    pub fn from_raw(mut raw: Map<String, Value>, printing: &str) -> Result<Card> {
        for (alias, canonical) in CARD.aliases() {
            if raw.contains_key(canonical) {
                continue;
            }
            if let Some(v) = raw.remove(alias) {
                raw.insert(canonical.to_string(), v);
            }
        }
        raw.insert("printing".to_string(), Value::String(printing.to_string()));
        serde_json::from_value(Value::Object(raw)).map_err(|e| Error::Record {
            printing: printing.to_string(),
            index: 0,
            reason: e.to_string(),
        })
    }
}

/// `field: value | field: value | ...` over the non-empty fields, in
/// declaration order, with whitespace runs collapsed to single spaces.
impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mana_value = match self.mana_value {
            Some(v) if v != 0 => v.to_string(),
            _ => String::new(),
        };
        let fields = [
            ("name", self.name.clone()),
            ("mana_cost", self.mana_cost.clone()),
            ("mana_value", mana_value),
            ("types", self.types.join(" ")),
            ("printing", self.printing.clone()),
            ("rarity", self.rarity.clone()),
            ("text", self.text.clone()),
            ("power", self.power.clone()),
            ("toughness", self.toughness.clone()),
        ];
        let joined = fields
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(" | ");
        f.write_str(&joined.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

/// Per-card numbers reported by the stats service. Every value may be absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLine {
    #[serde(deserialize_with = "lenient_i32")]
    pub seen_count: Option<i32>,
    pub avg_seen: Option<f32>,
    #[serde(deserialize_with = "lenient_i32")]
    pub pick_count: Option<i32>,
    pub avg_pick: Option<f32>,
    #[serde(deserialize_with = "lenient_i32")]
    pub game_count: Option<i32>,
    pub win_rate: Option<f32>,
    #[serde(deserialize_with = "lenient_i32")]
    pub sideboard_game_count: Option<i32>,
    pub sideboard_win_rate: Option<f32>,
    #[serde(deserialize_with = "lenient_i32")]
    pub opening_hand_game_count: Option<i32>,
    pub opening_hand_win_rate: Option<f32>,
    #[serde(deserialize_with = "lenient_i32")]
    pub drawn_game_count: Option<i32>,
    pub drawn_win_rate: Option<f32>,
    #[serde(deserialize_with = "lenient_i32")]
    pub ever_drawn_game_count: Option<i32>,
    pub ever_drawn_win_rate: Option<f32>,
    #[serde(deserialize_with = "lenient_i32")]
    pub never_drawn_game_count: Option<i32>,
    pub never_drawn_win_rate: Option<f32>,
    pub drawn_improvement_win_rate: Option<f32>,
}

fn stat_line_fields() -> Vec<FieldDesc> {
    let count = || Kind::optional(Kind::Int32);
    let rate = || Kind::optional(Kind::Float32);
    vec![
        FieldDesc::new("seen_count", count()),
        FieldDesc::new("avg_seen", rate()),
        FieldDesc::new("pick_count", count()),
        FieldDesc::new("avg_pick", rate()),
        FieldDesc::new("game_count", count()),
        FieldDesc::new("win_rate", rate()),
        FieldDesc::new("sideboard_game_count", count()),
        FieldDesc::new("sideboard_win_rate", rate()),
        FieldDesc::new("opening_hand_game_count", count()),
        FieldDesc::new("opening_hand_win_rate", rate()),
        FieldDesc::new("drawn_game_count", count()),
        FieldDesc::new("drawn_win_rate", rate()),
        FieldDesc::new("ever_drawn_game_count", count()),
        FieldDesc::new("ever_drawn_win_rate", rate()),
        FieldDesc::new("never_drawn_game_count", count()),
        FieldDesc::new("never_drawn_win_rate", rate()),
        FieldDesc::new("drawn_improvement_win_rate", rate()),
    ]
}

/// One card entry of a stats-service response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardStats {
    pub name: String,
    pub stats_format: String,
    pub stats_colors: String,
    #[serde(flatten)]
    pub line: StatLine,
}

/// A card joined with the stats entry it matched.
///
/// The stats entry's own name is kept as `stats_name`; for split cards it
/// may differ from `card.name`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardWithStats {
    #[serde(flatten)]
    pub card: Card,
    #[serde(default)]
    pub stats_name: String,
    #[serde(default)]
    pub stats_format: String,
    #[serde(default)]
    pub stats_colors: String,
    #[serde(flatten)]
    pub line: StatLine,
}

static CARD_WITH_STATS: Lazy<RecordDesc> = Lazy::new(|| {
    let mut fields = card_fields();
    fields.push(FieldDesc::new("stats_name", Kind::Utf8));
    fields.push(FieldDesc::new("stats_format", Kind::Utf8));
    fields.push(FieldDesc::new("stats_colors", Kind::Utf8));
    fields.extend(stat_line_fields());
    RecordDesc::new("CardWithStats", fields)
});

impl Record for CardWithStats {
    fn describe() -> &'static RecordDesc {
        &CARD_WITH_STATS
    }
}

impl CardWithStats {
    pub fn new(card: Card, stats: &CardStats) -> Self {
        Self {
            card,
            stats_name: stats.name.clone(),
            stats_format: stats.stats_format.clone(),
            stats_colors: stats.stats_colors.clone(),
            line: stats.line.clone(),
        }
    }

    pub fn stats(&self) -> CardStats {
        CardStats {
            name: self.stats_name.clone(),
            stats_format: self.stats_format.clone(),
            stats_colors: self.stats_colors.clone(),
            line: self.line.clone(),
        }
    }
}

impl fmt::Display for CardWithStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.card.fmt(f)
    }
}

/// Accept integral or fractional JSON numbers for an integer field.
/// Fractions are truncated toward zero.
pub(crate) fn lenient_i32<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let Some(n) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let wide = match n.as_i64() {
        Some(v) => v,
        None => n
            .as_f64()
            .map(|f| f.trunc() as i64)
            .ok_or_else(|| D::Error::custom(format!("{n} is not a number")))?,
    };
    i32::try_from(wide)
        .map(Some)
        .map_err(|_| D::Error::custom(format!("{n} does not fit in int32")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtgdata_core::dataset::Dataset;
    use mtgdata_core::schema::DataType;
    use serde_json::json;

    fn raw(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_from_raw_maps_upstream_names() {
        let card = Card::from_raw(
            raw(json!({
                "name": "Fire // Ice",
                "manaCost": "{1}{R} // {1}{U}",
                "manaValue": 4.0,
                "types": ["Instant"],
                "rarity": "uncommon",
                "text": "Fire deals 2 damage divided as you choose.",
                "uuid": "ignored",
                "foreignData": [{"language": "German"}]
            })),
            "MH2",
        )
        .unwrap();
        assert_eq!(card.name, "Fire // Ice");
        assert_eq!(card.mana_cost, "{1}{R} // {1}{U}");
        assert_eq!(card.mana_value, Some(4));
        assert_eq!(card.printing, "MH2");
        assert_eq!(card.power, "");
    }

    #[test]
    fn test_fractional_mana_value_truncates() {
        let card = Card::from_raw(raw(json!({"name": "Little Girl", "manaValue": 0.5})), "UNH")
            .unwrap();
        assert_eq!(card.mana_value, Some(0));
    }

    #[test]
    fn test_malformed_field_is_an_error() {
        let err = Card::from_raw(raw(json!({"name": 7})), "VOW").unwrap_err();
        assert!(matches!(err, Error::Record { .. }));
    }

    #[test]
    fn test_display() {
        let card = Card {
            name: "Opt".into(),
            mana_cost: "{U}".into(),
            ..Card::default()
        };
        assert_eq!(card.to_string(), "name: Opt | mana_cost: {U}");

        let bears = Card {
            name: "Grizzly Bears".into(),
            mana_value: Some(2),
            types: vec!["Creature".into(), "Bear".into()],
            text: "Vanilla.\n\n  Really.".into(),
            power: "2".into(),
            ..Card::default()
        };
        assert_eq!(
            bears.to_string(),
            "name: Grizzly Bears | mana_value: 2 | types: Creature Bear | text: Vanilla. Really. | power: 2"
        );
    }

    #[test]
    fn test_card_schema() {
        let schema = Card::schema().unwrap();
        assert_eq!(schema.names()[..3], ["name", "mana_cost", "mana_value"]);
        let types = schema.index_of("types").and_then(|i| schema.field(i)).unwrap();
        assert_eq!(types.data_type, DataType::list(DataType::Utf8));
    }

    #[test]
    fn test_card_with_stats_schema_follows_serde_names() {
        let joined = CardWithStats::new(
            Card {
                name: "Fire // Ice".into(),
                ..Card::default()
            },
            &CardStats {
                name: "Fire /// Ice".into(),
                stats_format: "PremierDraft".into(),
                stats_colors: "UR".into(),
                line: StatLine {
                    game_count: Some(1200),
                    win_rate: Some(0.55),
                    ..StatLine::default()
                },
            },
        );
        let value = serde_json::to_value(&joined).unwrap();
        let schema = CardWithStats::schema().unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), schema.len());
        for name in schema.names() {
            assert!(obj.contains_key(name), "missing {name}");
        }
        assert_eq!(obj["stats_name"], "Fire /// Ice");
    }

    #[test]
    fn test_card_with_stats_dataset_roundtrip() {
        let joined = CardWithStats::new(
            Card {
                name: "Opt".into(),
                mana_value: Some(1),
                types: vec!["Instant".into()],
                ..Card::default()
            },
            &CardStats {
                name: "Opt".into(),
                line: StatLine {
                    seen_count: Some(40),
                    avg_pick: Some(4.5),
                    ..StatLine::default()
                },
                ..CardStats::default()
            },
        );
        let ds = Dataset::from_records(std::slice::from_ref(&joined)).unwrap();
        let back: Vec<CardWithStats> = ds.to_records().unwrap();
        assert_eq!(back, vec![joined]);
        assert_eq!(back[0].stats().line.seen_count, Some(40));
    }
}
