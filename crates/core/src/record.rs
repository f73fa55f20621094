//! Repository documents and their projection into flat rows
//!
//! A [`Record`] is one document from the export endpoint. Every field is
//! optional on the wire and may arrive as a scalar or a list, so each one is
//! coerced into `Option<Vec<String>>` while deserializing. [`extract`] then
//! projects a record into a fixed 13-column [`FlatRow`] driven by the
//! [`COLUMNS`] table, which declares per column where the value comes from,
//! how multiple values are joined and what to write when the field is absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::collections::PID_SCHEME;
use crate::fiscal::FiscalCalendar;
use crate::table::Cell;

/// Public landing page for a repository item
pub const DEFAULT_ITEM_BASE: &str = "https://repository.library.noaa.gov/view/noaa/";

/// Written into the publish-year column when the document has none
pub const NO_PUBLISH_YEAR: &str = "no published year info";

/// Number of columns in a flat row
pub const COLUMN_COUNT: usize = 13;

/// Column positions in a flat row
pub mod columns {
    pub const LINK: usize = 0;
    pub const TITLE: usize = 1;
    pub const CREATED: usize = 2;
    pub const MODIFIED: usize = 3;
    pub const COMPLIANCE: usize = 4;
    pub const PUBLISH_YEAR: usize = 5;
    pub const DOC_TYPE: usize = 6;
    pub const DOI: usize = 7;
    pub const CREATED_MONTH: usize = 8;
    pub const FISCAL_YEAR: usize = 9;
    pub const MEMBER_OF: usize = 10;
    pub const FACETS: usize = 11;
    pub const SERIES: usize = 12;
}

/// Document fields consumed from the export endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Pid,
    Title,
    Created,
    Modified,
    Compliance,
    PublishYear,
    ResourceType,
    Doi,
    MemberOf,
    CorporateName,
    Series,
}

impl Field {
    /// Key of the field in the JSON document
    pub fn key(self) -> &'static str {
        match self {
            Field::Pid => "PID",
            Field::Title => "mods.title",
            Field::Created => "fgs.createdDate",
            Field::Modified => "fgs.lastModifiedDate",
            Field::Compliance => "mods.sm_compliance",
            Field::PublishYear => "mods.ss_publishyear",
            Field::ResourceType => "mods.type_of_resource",
            Field::Doi => "mods.sm_digital_object_identifier",
            Field::MemberOf => "rdf.isMemberOf",
            Field::CorporateName => "mods.sm_localcorpname",
            Field::Series => "mods.related_series",
        }
    }
}

/// One document from the export endpoint
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Record {
    #[serde(rename = "PID", default, deserialize_with = "values")]
    pub pid: Option<Vec<String>>,
    #[serde(rename = "mods.title", default, deserialize_with = "values")]
    pub title: Option<Vec<String>>,
    #[serde(rename = "fgs.createdDate", default, deserialize_with = "values")]
    pub created: Option<Vec<String>>,
    #[serde(rename = "fgs.lastModifiedDate", default, deserialize_with = "values")]
    pub modified: Option<Vec<String>>,
    #[serde(rename = "mods.sm_compliance", default, deserialize_with = "values")]
    pub compliance: Option<Vec<String>>,
    #[serde(rename = "mods.ss_publishyear", default, deserialize_with = "values")]
    pub publish_year: Option<Vec<String>>,
    #[serde(rename = "mods.type_of_resource", default, deserialize_with = "values")]
    pub resource_type: Option<Vec<String>>,
    #[serde(
        rename = "mods.sm_digital_object_identifier",
        default,
        deserialize_with = "values"
    )]
    pub doi: Option<Vec<String>>,
    #[serde(rename = "rdf.isMemberOf", default, deserialize_with = "values")]
    pub member_of: Option<Vec<String>>,
    #[serde(rename = "mods.sm_localcorpname", default, deserialize_with = "values")]
    pub corporate_name: Option<Vec<String>>,
    #[serde(rename = "mods.related_series", default, deserialize_with = "values")]
    pub series: Option<Vec<String>>,
}

impl Record {
    pub fn field(&self, field: Field) -> Option<&[String]> {
        let values = match field {
            Field::Pid => &self.pid,
            Field::Title => &self.title,
            Field::Created => &self.created,
            Field::Modified => &self.modified,
            Field::Compliance => &self.compliance,
            Field::PublishYear => &self.publish_year,
            Field::ResourceType => &self.resource_type,
            Field::Doi => &self.doi,
            Field::MemberOf => &self.member_of,
            Field::CorporateName => &self.corporate_name,
            Field::Series => &self.series,
        };
        values.as_deref()
    }

    /// Persistent identifier, e.g. `noaa:123`
    pub fn pid(&self) -> Option<&str> {
        self.field(Field::Pid)?
            .iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }
}

/// Coerce any JSON value into a list of strings.
///
/// `null` means absent. Scalars become a one-element list. Inside lists a
/// `null` becomes an empty string so joins keep their positions.
pub fn coerce_values(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(
            items
                .into_iter()
                .map(|item| scalar_text(item).unwrap_or_default())
                .collect(),
        ),
        other => scalar_text(other).map(|text| vec![text]),
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        nested => Some(nested.to_string()),
    }
}

fn values<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(coerce_values))
}

/// What to write when a field is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absent {
    /// Write this literal instead
    Default(&'static str),
    /// The record is malformed without this field
    Required,
}

/// Where a column's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Identifier rewritten into a public URL
    Link,
    /// Field values joined with a delimiter
    Joined {
        field: Field,
        delimiter: &'static str,
        absent: Absent,
    },
    /// Created timestamp as `YYYY-MM-DD`
    CreatedDay,
    /// Modified timestamp as `YYYY-MM-DD`
    ModifiedDay,
    /// Created timestamp as `YYYY-MM`
    CreatedMonth,
    /// Fiscal-year label of the created day
    FiscalYear,
}

/// One output column: its header and how its value is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    pub source: Source,
}

const fn joined(
    header: &'static str,
    field: Field,
    delimiter: &'static str,
    absent: Absent,
) -> Column {
    Column {
        header,
        source: Source::Joined {
            field,
            delimiter,
            absent,
        },
    }
}

const fn derived(header: &'static str, source: Source) -> Column {
    Column { header, source }
}

/// The flat-row contract: column order, headers, join delimiters and defaults
pub const COLUMNS: [Column; COLUMN_COUNT] = [
    derived("Link", Source::Link),
    joined("Title", Field::Title, ";", Absent::Default("")),
    derived("Date Created", Source::CreatedDay),
    derived("Date Modified", Source::ModifiedDay),
    joined("Compliance", Field::Compliance, " | ", Absent::Default("")),
    joined(
        "Published Year",
        Field::PublishYear,
        ";",
        Absent::Default(NO_PUBLISH_YEAR),
    ),
    joined("Document Type", Field::ResourceType, ";", Absent::Default("")),
    joined("DOI", Field::Doi, ";", Absent::Default("")),
    derived("Month Created", Source::CreatedMonth),
    derived("Fiscal Year", Source::FiscalYear),
    joined("Member Of", Field::MemberOf, ";", Absent::Required),
    joined("Facets", Field::CorporateName, ";", Absent::Default("")),
    joined("Series", Field::Series, "~", Absent::Default("")),
];

/// Headers of the flat table, in column order
pub fn headers() -> [&'static str; COLUMN_COUNT] {
    COLUMNS.map(|column| column.header)
}

/// Error type for record extraction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Record {} is missing required field `{field}`", .pid.as_deref().unwrap_or("<no PID>"))]
    MalformedRecord {
        pid: Option<String>,
        field: &'static str,
    },

    #[error("Record {pid} has an unparsable `{field}` timestamp: {value:?}")]
    InvalidTimestamp {
        pid: String,
        field: &'static str,
        value: String,
    },
}

/// Settings that shape extraction but are not part of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Identifier prefix replaced when building links
    pub pid_scheme: String,
    /// Base URL that replaces the prefix
    pub item_base: String,
    pub calendar: FiscalCalendar,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pid_scheme: PID_SCHEME.to_string(),
            item_base: DEFAULT_ITEM_BASE.to_string(),
            calendar: FiscalCalendar::default(),
        }
    }
}

/// A record projected onto the flat-row contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRow([String; COLUMN_COUNT]);

impl FlatRow {
    pub fn cells(&self) -> &[String; COLUMN_COUNT] {
        &self.0
    }

    pub fn get(&self, column: usize) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn link(&self) -> &str {
        &self.0[columns::LINK]
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.0.into_iter().map(Cell::Text).collect()
    }
}

/// Parse an ISO-8601 timestamp into UTC
///
/// Accepts RFC 3339 (offsets are normalized to UTC), naive date-times (read
/// as UTC) and plain dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn timestamp(record: &Record, pid: &str, field: Field) -> Result<DateTime<Utc>, ExtractError> {
    let raw = record
        .field(field)
        .and_then(|values| values.first())
        .ok_or_else(|| ExtractError::MalformedRecord {
            pid: Some(pid.to_string()),
            field: field.key(),
        })?;

    parse_timestamp(raw).ok_or_else(|| ExtractError::InvalidTimestamp {
        pid: pid.to_string(),
        field: field.key(),
        value: raw.clone(),
    })
}

/// Rewrite an identifier into its public landing-page URL
pub fn link_for(pid: &str, options: &ExtractOptions) -> String {
    match pid.strip_prefix(options.pid_scheme.as_str()) {
        Some(local) => format!("{}{local}", options.item_base),
        None => pid.to_string(),
    }
}

/// Project one record onto the flat-row contract
///
/// Pure: the same record and options always yield the same row.
pub fn extract(record: &Record, options: &ExtractOptions) -> Result<FlatRow, ExtractError> {
    let pid = record.pid().ok_or(ExtractError::MalformedRecord {
        pid: None,
        field: Field::Pid.key(),
    })?;

    let created = timestamp(record, pid, Field::Created)?;
    let modified = timestamp(record, pid, Field::Modified)?;

    let mut cells: [String; COLUMN_COUNT] = Default::default();

    for (cell, column) in cells.iter_mut().zip(COLUMNS.iter()) {
        *cell = match column.source {
            Source::Link => link_for(pid, options),
            Source::CreatedDay => created.format("%Y-%m-%d").to_string(),
            Source::ModifiedDay => modified.format("%Y-%m-%d").to_string(),
            Source::CreatedMonth => created.format("%Y-%m").to_string(),
            Source::FiscalYear => options.calendar.classify(created.date_naive()),
            Source::Joined {
                field,
                delimiter,
                absent,
            } => match (record.field(field), absent) {
                (Some(values), _) => values.join(delimiter),
                (None, Absent::Default(text)) => text.to_string(),
                (None, Absent::Required) => {
                    return Err(ExtractError::MalformedRecord {
                        pid: Some(pid.to_string()),
                        field: field.key(),
                    })
                }
            },
        };
    }

    Ok(FlatRow(cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn minimal() -> Value {
        json!({
            "PID": "noaa:123",
            "fgs.createdDate": "2017-03-15T14:22:01.123Z",
            "fgs.lastModifiedDate": "2018-01-02T00:00:00Z",
            "rdf.isMemberOf": ["noaa:6"]
        })
    }

    fn full() -> Value {
        json!({
            "PID": "noaa:123",
            "mods.title": "Storm report",
            "fgs.createdDate": "2017-03-15T14:22:01.123Z",
            "fgs.lastModifiedDate": "2018-01-02T00:00:00Z",
            "mods.sm_compliance": ["Public Access", "Section 508"],
            "mods.ss_publishyear": "2016",
            "mods.type_of_resource": ["Text", "Map"],
            "mods.sm_digital_object_identifier": ["10.1/a", "10.1/b"],
            "rdf.isMemberOf": ["noaa:6", "noaa:10031"],
            "mods.sm_localcorpname": ["NWS", "OAR"],
            "mods.related_series": ["Series A", "Series B"]
        })
    }

    // ============================================================================
    // Record deserialization tests
    // ============================================================================

    #[test]
    fn test_record_coerces_scalars_and_lists() {
        let parsed = record(json!({
            "PID": "noaa:1",
            "mods.ss_publishyear": 2016,
            "mods.type_of_resource": "Text",
            "mods.sm_localcorpname": ["A", null, "B"],
            "mods.related_series": null,
            "unrelated": {"nested": true}
        }));

        assert_eq!(parsed.pid(), Some("noaa:1"));
        assert_eq!(parsed.publish_year, Some(vec!["2016".to_string()]));
        assert_eq!(parsed.resource_type, Some(vec!["Text".to_string()]));
        assert_eq!(
            parsed.corporate_name,
            Some(vec!["A".to_string(), String::new(), "B".to_string()])
        );
        assert_eq!(parsed.series, None);
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_record_blank_pid_is_absent() {
        let parsed = record(json!({"PID": "  "}));
        assert_eq!(parsed.pid(), None);
    }

    // ============================================================================
    // parse_timestamp tests
    // ============================================================================

    #[test]
    fn test_parse_timestamp_rfc3339_normalizes_to_utc() {
        let parsed = parse_timestamp("2016-09-30T22:30:00-04:00").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2016-10-01");
    }

    #[test]
    fn test_parse_timestamp_naive_and_date_only() {
        assert!(parse_timestamp("2017-03-15T14:22:01").is_some());
        assert!(parse_timestamp("2017-03-15T14:22:01.5").is_some());
        assert!(parse_timestamp("2017-03-15").is_some());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2017-02-30").is_none());
    }

    // ============================================================================
    // extract tests
    // ============================================================================

    #[test]
    fn test_extract_column_order() {
        let row = extract(&record(full()), &ExtractOptions::default()).unwrap();

        assert_eq!(
            row.cells(),
            &[
                "https://repository.library.noaa.gov/view/noaa/123".to_string(),
                "Storm report".to_string(),
                "2017-03-15".to_string(),
                "2018-01-02".to_string(),
                "Public Access | Section 508".to_string(),
                "2016".to_string(),
                "Text;Map".to_string(),
                "10.1/a;10.1/b".to_string(),
                "2017-03".to_string(),
                "FY17".to_string(),
                "noaa:6;noaa:10031".to_string(),
                "NWS;OAR".to_string(),
                "Series A~Series B".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_applies_every_default() {
        let row = extract(&record(minimal()), &ExtractOptions::default()).unwrap();
        let cells = row.cells();

        assert_eq!(cells.len(), COLUMN_COUNT);
        assert_eq!(cells[columns::TITLE], "");
        assert_eq!(cells[columns::COMPLIANCE], "");
        assert_eq!(cells[columns::PUBLISH_YEAR], NO_PUBLISH_YEAR);
        assert_eq!(cells[columns::DOC_TYPE], "");
        assert_eq!(cells[columns::DOI], "");
        assert_eq!(cells[columns::FACETS], "");
        assert_eq!(cells[columns::SERIES], "");
        assert_eq!(cells[columns::MEMBER_OF], "noaa:6");
    }

    #[test]
    fn test_extract_is_idempotent() {
        let source = record(full());
        let options = ExtractOptions::default();
        assert_eq!(
            extract(&source, &options).unwrap(),
            extract(&source, &options).unwrap()
        );
    }

    #[test]
    fn test_extract_missing_pid() {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove("PID");

        let err = extract(&record(value), &ExtractOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ExtractError::MalformedRecord {
                pid: None,
                field: "PID"
            }
        );
        assert!(err.to_string().contains("<no PID>"));
    }

    #[test]
    fn test_extract_missing_member_of() {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove("rdf.isMemberOf");

        let err = extract(&record(value), &ExtractOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ExtractError::MalformedRecord {
                pid: Some("noaa:123".to_string()),
                field: "rdf.isMemberOf"
            }
        );
    }

    #[test]
    fn test_extract_invalid_timestamp() {
        let mut value = minimal();
        value["fgs.lastModifiedDate"] = json!("last tuesday");

        let err = extract(&record(value), &ExtractOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::InvalidTimestamp { field: "fgs.lastModifiedDate", .. }
        ));
    }

    #[test]
    fn test_extract_missing_created_is_malformed() {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove("fgs.createdDate");

        let err = extract(&record(value), &ExtractOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MalformedRecord { field: "fgs.createdDate", .. }
        ));
    }

    #[test]
    fn test_extract_empty_list_is_present() {
        let mut value = minimal();
        value["mods.ss_publishyear"] = json!([]);

        let row = extract(&record(value), &ExtractOptions::default()).unwrap();
        assert_eq!(row.get(columns::PUBLISH_YEAR), Some(""));
    }

    #[test]
    fn test_extract_uses_calendar() {
        let options = ExtractOptions {
            calendar: FiscalCalendar::Legacy,
            ..ExtractOptions::default()
        };
        let row = extract(&record(full()), &options).unwrap();
        assert_eq!(row.get(columns::FISCAL_YEAR), Some("FY16"));
    }

    #[test]
    fn test_link_for_foreign_scheme_is_untouched() {
        let options = ExtractOptions::default();
        assert_eq!(link_for("other:9", &options), "other:9");
        assert_eq!(
            link_for("noaa:9", &options),
            "https://repository.library.noaa.gov/view/noaa/9"
        );
    }

    #[test]
    fn test_headers_match_columns() {
        let headers = headers();
        assert_eq!(headers[columns::LINK], "Link");
        assert_eq!(headers[columns::CREATED], "Date Created");
        assert_eq!(headers[columns::MEMBER_OF], "Member Of");
        assert_eq!(headers[columns::SERIES], "Series");
    }
}
