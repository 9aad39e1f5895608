//! Fixture records from both feeds and their validated, source-neutral form.
//!
//! Raw feed records are loose: ids arrive as strings or numbers, optional
//! fields may be missing or null. Everything is validated once here and
//! turned into `SourceFixture`, which is what the matcher works with.

use crate::error::{LinkError, Result};
use crate::kickoff::{from_epoch_millis, KickoffParser};
use crate::types::FixtureSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Accept `"123"`, `123` or `null` for identifier fields.
fn flexible_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn required_id(id: &Option<String>, what: &str) -> Result<String> {
    id.as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LinkError::InvalidFixture(format!("{} has a blank id", what)))
}

fn text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Crown feed
// ============================================================================

/// Fixture scraped from the Crown betting site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrownFixture {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default, deserialize_with = "flexible_id")]
    pub league_id: Option<String>,
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub away: Option<String>,
    /// Site-local `MM-DD HH:MMa|p`
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub source_show_type: Option<String>,
}

/// Crown batch as written by the scraper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrownBatch {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub matches: Vec<CrownFixture>,
}

impl CrownBatch {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

impl CrownFixture {
    /// Validate and convert, resolving the kickoff against `reference`.
    pub fn to_source(
        &self,
        parser: &KickoffParser,
        reference: DateTime<Utc>,
    ) -> Result<SourceFixture> {
        let id = required_id(&self.id, "Crown fixture")?;
        let kickoff_raw = self
            .datetime
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let kickoff = kickoff_raw
            .as_deref()
            .and_then(|token| parser.parse_crown(token, reference));

        Ok(SourceFixture {
            source: FixtureSource::Crown,
            id,
            league: text(&self.league),
            league_id: self.league_id.clone(),
            home: text(&self.home),
            home_id: None,
            home_alt: Vec::new(),
            away: text(&self.away),
            away_id: None,
            away_alt: Vec::new(),
            kickoff,
            kickoff_raw,
            status: None,
            show_type: optional_text(&self.source_show_type),
        })
    }
}

// ============================================================================
// Odds API feed
// ============================================================================

/// Fixture from the third-party odds API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFixture {
    #[serde(default, deserialize_with = "flexible_id")]
    pub match_id: Option<String>,
    #[serde(default, deserialize_with = "flexible_id")]
    pub league_id: Option<String>,
    #[serde(default)]
    pub league_name: Option<String>,
    #[serde(default, deserialize_with = "flexible_id")]
    pub home_id: Option<String>,
    #[serde(default)]
    pub home_name: Option<String>,
    #[serde(default)]
    pub home_name_traditional: Option<String>,
    #[serde(default)]
    pub home_name_simplified: Option<String>,
    #[serde(default, deserialize_with = "flexible_id")]
    pub away_id: Option<String>,
    #[serde(default)]
    pub away_name: Option<String>,
    #[serde(default)]
    pub away_name_traditional: Option<String>,
    #[serde(default)]
    pub away_name_simplified: Option<String>,
    #[serde(default)]
    pub kickoff_epoch_millis: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// API batch; the feed is sometimes dumped as a bare array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBatch {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub matches: Vec<ApiFixture>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiBatchShape {
    Envelope(ApiBatch),
    Bare(Vec<ApiFixture>),
}

impl ApiBatch {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(match serde_json::from_str::<ApiBatchShape>(content)? {
            ApiBatchShape::Envelope(batch) => batch,
            ApiBatchShape::Bare(matches) => ApiBatch {
                generated_at: None,
                matches,
            },
        })
    }
}

fn alternate_names(names: [&Option<String>; 2]) -> Vec<String> {
    names
        .into_iter()
        .filter_map(|n| n.as_deref().map(str::trim))
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

impl ApiFixture {
    pub fn to_source(&self) -> Result<SourceFixture> {
        let id = required_id(&self.match_id, "API fixture")?;
        Ok(SourceFixture {
            source: FixtureSource::Api,
            id,
            league: text(&self.league_name),
            league_id: self.league_id.clone(),
            home: text(&self.home_name),
            home_id: self.home_id.clone(),
            home_alt: alternate_names([&self.home_name_simplified, &self.home_name_traditional]),
            away: text(&self.away_name),
            away_id: self.away_id.clone(),
            away_alt: alternate_names([&self.away_name_simplified, &self.away_name_traditional]),
            kickoff: self.kickoff_epoch_millis.and_then(from_epoch_millis),
            kickoff_raw: self.kickoff_epoch_millis.map(|ms| ms.to_string()),
            status: optional_text(&self.status),
            show_type: None,
        })
    }
}

// ============================================================================
// Validated form
// ============================================================================

/// A fixture from either feed after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFixture {
    pub source: FixtureSource,
    pub id: String,
    pub league: String,
    pub league_id: Option<String>,
    pub home: String,
    pub home_id: Option<String>,
    /// Other spellings supplied by the feed itself (API Chinese names)
    pub home_alt: Vec<String>,
    pub away: String,
    pub away_id: Option<String>,
    pub away_alt: Vec<String>,
    /// `None` when the feed had no usable kickoff
    pub kickoff: Option<DateTime<Utc>>,
    /// Kickoff exactly as the feed sent it
    pub kickoff_raw: Option<String>,
    /// API match status ("NS", "LIVE", ...)
    pub status: Option<String>,
    /// Crown listing section (`sourceShowType`)
    pub show_type: Option<String>,
}

/// Fixtures that passed ingestion, plus how many were dropped.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub fixtures: Vec<SourceFixture>,
    pub skipped: usize,
}

fn validate_all<T>(
    items: &[T],
    convert: impl Fn(&T) -> Result<SourceFixture>,
    source: FixtureSource,
) -> Ingested {
    let mut ingested = Ingested::default();
    for (position, item) in items.iter().enumerate() {
        match convert(item) {
            Ok(fixture) => ingested.fixtures.push(fixture),
            Err(e) => {
                warn!("Skipping {:?} fixture #{}: {}", source, position, e);
                ingested.skipped += 1;
            }
        }
    }
    ingested
}

/// Validate a Crown batch. `reference` is used when the batch has no
/// generation time of its own.
pub fn ingest_crown(
    batch: &CrownBatch,
    parser: &KickoffParser,
    fallback_reference: DateTime<Utc>,
) -> Ingested {
    let reference = batch.generated_at.unwrap_or(fallback_reference);
    validate_all(&batch.matches, |f| f.to_source(parser, reference), FixtureSource::Crown)
}

pub fn ingest_api(batch: &ApiBatch) -> Ingested {
    validate_all(&batch.matches, ApiFixture::to_source, FixtureSource::Api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatcherConfig;

    fn parser() -> KickoffParser {
        KickoffParser::from_config(&MatcherConfig::default()).unwrap()
    }

    fn reference() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-10-05T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    // -------------------------------------------------------------------------
    // Parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_crown_batch_parses() {
        let json = r#"{
            "generatedAt": "2025-10-05T12:00:00Z",
            "matches": [
                {"id": "c1", "league": "Japan J2 League", "leagueId": 77,
                 "home": "Oita Trinita", "away": "Montedio Yamagata",
                 "datetime": "10-05 03:30p", "sourceShowType": "today"}
            ]
        }"#;
        let batch = CrownBatch::from_json(json).unwrap();
        assert_eq!(batch.generated_at, Some(reference()));
        assert_eq!(batch.matches[0].league_id.as_deref(), Some("77"));
        assert_eq!(batch.matches[0].source_show_type.as_deref(), Some("today"));
    }

    #[test]
    fn test_api_batch_accepts_envelope_and_bare_array() {
        let envelope = r#"{"generatedAt": null, "matches": [{"matchId": 9001, "homeName": "A"}]}"#;
        let bare = r#"[{"matchId": "9001", "homeName": "A"}]"#;

        let a = ApiBatch::from_json(envelope).unwrap();
        let b = ApiBatch::from_json(bare).unwrap();
        assert_eq!(a.matches, b.matches);
        assert_eq!(a.matches[0].match_id.as_deref(), Some("9001"));
    }

    #[test]
    fn test_malformed_batch_is_error() {
        assert!(matches!(CrownBatch::from_json("{"), Err(LinkError::Json(_))));
        assert!(ApiBatch::from_json("42").is_err());
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    #[test]
    fn test_crown_to_source() {
        let fixture = CrownFixture {
            id: Some(" c1 ".to_string()),
            league: Some("Japan J2 League".to_string()),
            home: Some("Oita Trinita".to_string()),
            away: Some("Montedio Yamagata".to_string()),
            datetime: Some("10-05 03:30p".to_string()),
            league_id: Some("77".to_string()),
            source_show_type: Some(" today ".to_string()),
        };
        let source = fixture.to_source(&parser(), reference()).unwrap();
        assert_eq!(source.id, "c1");
        assert_eq!(source.league_id.as_deref(), Some("77"));
        assert_eq!(source.show_type.as_deref(), Some("today"));
        assert_eq!(source.status, None);
        assert_eq!(source.source, FixtureSource::Crown);
        assert!(source.kickoff.is_some());
        assert_eq!(source.kickoff_raw.as_deref(), Some("10-05 03:30p"));
    }

    #[test]
    fn test_unparsable_kickoff_is_unknown_not_error() {
        let fixture = CrownFixture {
            id: Some("c2".to_string()),
            datetime: Some("LIVE".to_string()),
            ..Default::default()
        };
        let source = fixture.to_source(&parser(), reference()).unwrap();
        assert_eq!(source.kickoff, None);
        assert_eq!(source.home, "");
    }

    #[test]
    fn test_api_to_source_collects_chinese_names() {
        let fixture = ApiFixture {
            match_id: Some("9001".to_string()),
            home_name: Some("Oita Trinita".to_string()),
            home_name_simplified: Some("大分三神".to_string()),
            home_name_traditional: Some("  ".to_string()),
            kickoff_epoch_millis: Some(1_759_692_600_000),
            home_id: Some("311".to_string()),
            away_id: Some("312".to_string()),
            status: Some("NS".to_string()),
            ..Default::default()
        };
        let source = fixture.to_source().unwrap();
        assert_eq!(source.home_alt, vec!["大分三神".to_string()]);
        assert_eq!(source.home_id.as_deref(), Some("311"));
        assert_eq!(source.away_id.as_deref(), Some("312"));
        assert_eq!(source.status.as_deref(), Some("NS"));
        assert_eq!(source.show_type, None);
        assert!(source.away_alt.is_empty());
        assert!(source.kickoff.is_some());
    }

    #[test]
    fn test_ingest_skips_blank_ids() {
        let batch = ApiBatch {
            generated_at: None,
            matches: vec![
                ApiFixture {
                    match_id: Some("1".to_string()),
                    ..Default::default()
                },
                ApiFixture {
                    match_id: Some("   ".to_string()),
                    ..Default::default()
                },
                ApiFixture::default(),
            ],
        };
        let ingested = ingest_api(&batch);
        assert_eq!(ingested.fixtures.len(), 1);
        assert_eq!(ingested.skipped, 2);
    }

    #[test]
    fn test_ingest_crown_uses_batch_reference() {
        let batch = CrownBatch {
            generated_at: Some(reference()),
            matches: vec![CrownFixture {
                id: Some("c1".to_string()),
                datetime: Some("06-02 07:00p".to_string()),
                ..Default::default()
            }],
        };
        // Against a late-December reference the kickoff would move to next year
        let fallback = DateTime::parse_from_rfc3339("2025-12-30T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ingested = ingest_crown(&batch, &parser(), fallback);
        let kickoff = ingested.fixtures[0].kickoff.unwrap();
        assert_eq!(kickoff.to_rfc3339(), "2025-06-02T23:00:00+00:00");
    }
}
