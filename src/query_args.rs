//! Parsing of `--filter` and `--sort` command-line arguments into a [`Query`].
//!
//! Filters are written as `ATTRIBUTE[:MATCH_BY][:all]=VALUE[,VALUE...]` and
//! sorts as `ATTRIBUTE[:DIRECTION]`. Values are taken verbatim; a literal
//! comma inside a value is written `\,`. A JSON query document may supply
//! the starting point; flag values are appended to it.

use thiserror::Error;

use crate::datalist::{Direction, FilterError, FilterSpec, MatchBy, Query, SortError, SortSpec};

const ALL_MODIFIER: &str = "all";

/// Errors raised while turning arguments into a query.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum QueryArgError {
    /// The filter argument has no `=` separating attribute and values.
    #[error(
        "filter '{0}' must have the form ATTRIBUTE[:MATCH_BY][:all]=VALUE[,VALUE...] (escape commas in values as \\,)"
    )]
    MissingValues(String),
    /// An attribute name was empty.
    #[error("argument '{0}' does not name an attribute")]
    MissingAttribute(String),
    /// A filter modifier was neither `all` nor a known `match_by` mode.
    #[error("filter '{argument}': unknown match_by '{mode}'")]
    MatchBy {
        /// Argument as supplied.
        argument: String,
        /// Modifier that failed to parse.
        mode: String,
    },
    /// A sort direction was neither `asc` nor `desc`.
    #[error("sort '{argument}': {source}")]
    Direction {
        /// Argument as supplied.
        argument: String,
        /// Underlying parse failure.
        #[source]
        source: SortError,
    },
    /// A filter or sort argument carried more modifiers than it accepts.
    #[error("argument '{0}' has too many ':' separated parts")]
    TooManyModifiers(String),
    /// The JSON query document did not parse.
    #[error("invalid query document: {0}")]
    Document(String),
}

/// Parses one `--filter` argument.
///
/// # Errors
///
/// Returns [`QueryArgError`] when the argument is malformed or names an
/// unknown `match_by` mode.
pub fn parse_filter_arg(argument: &str) -> Result<FilterSpec, QueryArgError> {
    let (head, raw_values) = argument
        .split_once('=')
        .ok_or_else(|| QueryArgError::MissingValues(argument.to_owned()))?;
    let mut parts = head.split(':');
    let attribute = parts
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| QueryArgError::MissingAttribute(argument.to_owned()))?;

    let values = split_values(raw_values);
    if values.is_empty() {
        return Err(QueryArgError::MissingValues(argument.to_owned()));
    }

    let mut spec = FilterSpec::new(attribute, values);
    let mut match_by_seen = false;
    for modifier in parts.map(str::trim) {
        if modifier == ALL_MODIFIER {
            if spec.all {
                return Err(QueryArgError::TooManyModifiers(argument.to_owned()));
            }
            spec = spec.all();
        } else if match_by_seen {
            return Err(QueryArgError::TooManyModifiers(argument.to_owned()));
        } else {
            let mode: MatchBy =
                modifier
                    .parse()
                    .map_err(|_: FilterError| QueryArgError::MatchBy {
                        argument: argument.to_owned(),
                        mode: modifier.to_owned(),
                    })?;
            spec = spec.match_by(mode);
            match_by_seen = true;
        }
    }
    Ok(spec)
}

/// Splits on unescaped commas. Whitespace is kept; empty values are dropped.
fn split_values(raw: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.next_if_eq(&',').is_some() => current.push(','),
            ',' => values.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    values.push(current);
    values.retain(|value| !value.is_empty());
    values
}

/// Parses one `--sort` argument.
///
/// # Errors
///
/// Returns [`QueryArgError`] when the attribute is empty or the direction is
/// not recognised.
pub fn parse_sort_arg(argument: &str) -> Result<SortSpec, QueryArgError> {
    let mut parts = argument.split(':').map(str::trim);
    let attribute = parts
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| QueryArgError::MissingAttribute(argument.to_owned()))?;
    let direction = parts.next().map_or(Ok(Direction::Asc), |raw| {
        raw.parse().map_err(|source| QueryArgError::Direction {
            argument: argument.to_owned(),
            source,
        })
    })?;
    if parts.next().is_some() {
        return Err(QueryArgError::TooManyModifiers(argument.to_owned()));
    }
    Ok(SortSpec {
        attribute: attribute.to_owned(),
        direction,
    })
}

/// Builds a query from an optional JSON document followed by flag values.
///
/// # Errors
///
/// Returns [`QueryArgError::Document`] when the document does not parse, or
/// the first argument parse failure.
pub fn build_query(
    document: Option<&str>,
    filters: &[String],
    sorts: &[String],
) -> Result<Query, QueryArgError> {
    let mut query = document.map_or_else(
        || Ok(Query::new()),
        |text| {
            serde_json::from_str::<Query>(text)
                .map_err(|err| QueryArgError::Document(err.to_string()))
        },
    )?;
    for argument in filters {
        query = query.filter(parse_filter_arg(argument)?);
    }
    for argument in sorts {
        query = query.sort(parse_sort_arg(argument)?);
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalist::{FieldSchema, Record, RecordSchema, Value, apply_filters, expand_filters};
    use rstest::rstest;

    #[rstest]
    #[case("slug=c3.small.x86", FilterSpec::new("slug", ["c3.small.x86"]))]
    #[case(
        "available_in_metros:all=da,sv",
        FilterSpec::new("available_in_metros", ["da", "sv"]).all()
    )]
    #[case(
        "pricing_hour:less_than=2.5",
        FilterSpec::new("pricing_hour", ["2.5"]).match_by(MatchBy::LessThan)
    )]
    #[case(
        "name:all:substring=large,x86",
        FilterSpec::new("name", ["large", "x86"]).all().match_by(MatchBy::Substring)
    )]
    #[case("name:re=^c3\\.", FilterSpec::new("name", ["^c3\\."]).match_by(MatchBy::Re))]
    #[case(
        "name:re=^a{1\\,3}$",
        FilterSpec::new("name", ["^a{1,3}$"]).match_by(MatchBy::Re)
    )]
    #[case("name= padded ", FilterSpec::new("name", [" padded "]))]
    #[case("note=a\\,b,c", FilterSpec::new("note", ["a,b", "c"]))]
    #[case("path=C:\\dir", FilterSpec::new("path", ["C:\\dir"]))]
    fn parses_filter_arguments(#[case] argument: &str, #[case] expected: FilterSpec) {
        assert_eq!(parse_filter_arg(argument), Ok(expected));
    }

    #[rstest]
    fn escaped_commas_reach_the_regex_intact() {
        let spec = parse_filter_arg("name:re=^a{1\\,3}$").expect("filter should parse");
        let schema = RecordSchema::new().with_field("name", FieldSchema::string());
        let filters = expand_filters(&schema, &[spec]).expect("pattern should compile");
        let records: Vec<Record> = ["a", "aaa", "aaaa"]
            .into_iter()
            .map(|name| Record::from([(String::from("name"), Value::from(name))]))
            .collect();
        let filtered = apply_filters(records, &filters);
        let kept: Vec<&str> = filtered
            .iter()
            .filter_map(|record| record.get("name").and_then(Value::as_str))
            .collect();
        assert_eq!(kept, vec!["a", "aaa"]);
    }

    #[rstest]
    #[case("slug")]
    #[case("slug=")]
    #[case("slug=,")]
    fn filters_need_values(#[case] argument: &str) {
        assert_eq!(
            parse_filter_arg(argument),
            Err(QueryArgError::MissingValues(argument.to_owned()))
        );
    }

    #[rstest]
    fn filters_need_an_attribute() {
        assert_eq!(
            parse_filter_arg(":re=a"),
            Err(QueryArgError::MissingAttribute(String::from(":re=a")))
        );
    }

    #[rstest]
    fn unknown_match_by_is_reported() {
        assert_eq!(
            parse_filter_arg("slug:like=a"),
            Err(QueryArgError::MatchBy {
                argument: String::from("slug:like=a"),
                mode: String::from("like"),
            })
        );
    }

    #[rstest]
    #[case("slug:re:substring=a")]
    #[case("slug:all:all=a")]
    fn repeated_modifiers_are_rejected(#[case] argument: &str) {
        assert_eq!(
            parse_filter_arg(argument),
            Err(QueryArgError::TooManyModifiers(argument.to_owned()))
        );
    }

    #[rstest]
    #[case("slug", SortSpec::asc("slug"))]
    #[case("pricing_hour:desc", SortSpec::desc("pricing_hour"))]
    #[case("pricing_hour:DESC", SortSpec::desc("pricing_hour"))]
    #[case("name:asc", SortSpec::asc("name"))]
    fn parses_sort_arguments(#[case] argument: &str, #[case] expected: SortSpec) {
        assert_eq!(parse_sort_arg(argument), Ok(expected));
    }

    #[rstest]
    fn invalid_direction_is_reported() {
        let err = parse_sort_arg("slug:sideways").expect_err("direction is invalid");
        assert_eq!(
            err.to_string(),
            "sort 'slug:sideways': invalid sort direction 'sideways', expected asc or desc"
        );
    }

    #[rstest]
    fn document_and_flags_combine() {
        let document = r#"{
            "filter": [{"attribute": "line", "values": ["baremetal"]}],
            "sort": [{"attribute": "slug", "direction": "desc"}]
        }"#;
        let query = build_query(
            Some(document),
            &[String::from("legacy=false")],
            &[String::from("name")],
        )
        .expect("query should build");
        assert_eq!(
            query,
            Query::new()
                .filter(FilterSpec::new("line", ["baremetal"]))
                .filter(FilterSpec::new("legacy", ["false"]))
                .sort(SortSpec::desc("slug"))
                .sort(SortSpec::asc("name"))
        );
    }

    #[rstest]
    fn malformed_document_is_reported() {
        let err = build_query(Some("{"), &[], &[]).expect_err("document is invalid");
        assert!(matches!(err, QueryArgError::Document(_)), "unexpected: {err}");
    }
}
