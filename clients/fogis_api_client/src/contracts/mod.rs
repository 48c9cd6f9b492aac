//! Endpoint contracts for the `MatchWebMetoder.aspx` surface.
//!
//! Every operation the adapter calls is registered once with JSON Schema
//! documents for its request and response and the fields coerced to canonical
//! types before sending. Paths that are not registered carry no contract.

pub mod result;

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use lazy_static::lazy_static;
use reqwest::Url;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::error;

use crate::error::{FogisError, Result};

pub use result::{flat_to_nested, nested_to_flat, FlatMatchResult, PeriodType, ResultPeriod};

pub const METHOD_PREFIX: &str = "/MatchWebMetoder.aspx/";

pub const RESULT_LIST_KEY: &str = "matchresultatListaJSON";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    MatchList,
    Match,
    MatchPlayers,
    MatchOfficials,
    MatchEvents,
    TeamPlayers,
    TeamOfficials,
    MatchResultList,
    SaveEvent,
    SaveResultList,
    DeleteEvent,
    RemoveEvent,
    SaveTeamOfficial,
    SaveParticipant,
    ClearEvents,
    ApproveReport,
}

impl Endpoint {
    pub const ALL: [Endpoint; 16] = [
        Endpoint::MatchList,
        Endpoint::Match,
        Endpoint::MatchPlayers,
        Endpoint::MatchOfficials,
        Endpoint::MatchEvents,
        Endpoint::TeamPlayers,
        Endpoint::TeamOfficials,
        Endpoint::MatchResultList,
        Endpoint::SaveEvent,
        Endpoint::SaveResultList,
        Endpoint::DeleteEvent,
        Endpoint::RemoveEvent,
        Endpoint::SaveTeamOfficial,
        Endpoint::SaveParticipant,
        Endpoint::ClearEvents,
        Endpoint::ApproveReport,
    ];

    pub fn operation(self) -> &'static str {
        match self {
            Endpoint::MatchList => "GetMatcherAttRapportera",
            Endpoint::Match => "GetMatch",
            Endpoint::MatchPlayers => "GetMatchdeltagareLista",
            Endpoint::MatchOfficials => "GetMatchfunktionarerLista",
            Endpoint::MatchEvents => "GetMatchhandelselista",
            Endpoint::TeamPlayers => "GetMatchdeltagareListaForMatchlag",
            Endpoint::TeamOfficials => "GetMatchlagledareListaForMatchlag",
            Endpoint::MatchResultList => "GetMatchresultatlista",
            Endpoint::SaveEvent => "SparaMatchhandelse",
            Endpoint::SaveResultList => "SparaMatchresultatLista",
            Endpoint::DeleteEvent => "RaderaMatchhandelse",
            Endpoint::RemoveEvent => "TaBortMatchhandelse",
            Endpoint::SaveTeamOfficial => "SparaMatchlagledare",
            Endpoint::SaveParticipant => "SparaMatchdeltagare",
            Endpoint::ClearEvents => "ClearMatchEvents",
            Endpoint::ApproveReport => "SparaMatchGodkannDomarrapport",
        }
    }

    pub fn path(self) -> String {
        format!("{}{}", METHOD_PREFIX, self.operation())
    }

    pub fn from_operation(operation: &str) -> Option<Endpoint> {
        Endpoint::ALL
            .iter()
            .copied()
            .find(|endpoint| endpoint.operation() == operation)
    }

    fn from_key(key: &str) -> Option<Endpoint> {
        key.strip_prefix(METHOD_PREFIX).and_then(Endpoint::from_operation)
    }

    pub fn contract(self) -> Result<&'static EndpointContract> {
        let key = self.path();
        REGISTRY.get(&key).ok_or_else(|| missing_contract(&key))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    MatchList,
    MatchDetail,
    MatchRoster,
    EventList,
    TeamRoster,
    ResultList,
    EventReport,
    ResultReport,
    EventDelete,
    RosterAction,
    EventClear,
    ReportApproval,
}

/// Fields converted to canonical wire types after validation.
///
/// `nested` names an array whose object elements get the same treatment
/// instead of the top-level object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coercion {
    pub integers: &'static [&'static str],
    pub booleans: &'static [&'static str],
    pub nested: Option<&'static str>,
}

impl Coercion {
    const fn integers(fields: &'static [&'static str]) -> Self {
        Coercion {
            integers: fields,
            booleans: &[],
            nested: None,
        }
    }

    /// Coerces declared fields and drops every null-valued field.
    pub fn apply(&self, payload: Value) -> Result<Value> {
        match (payload, self.nested) {
            (Value::Object(mut map), Some(key)) => {
                if let Some(Value::Array(items)) = map.remove(key) {
                    let coerced = items
                        .into_iter()
                        .map(|item| match item {
                            Value::Object(fields) => self.coerce_fields(fields).map(Value::Object),
                            other => Ok(other),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    map.insert(key.to_string(), Value::Array(coerced));
                }
                map.retain(|_, value| !value.is_null());
                Ok(Value::Object(map))
            }
            (Value::Object(map), None) => self.coerce_fields(map).map(Value::Object),
            (other, _) => Ok(other),
        }
    }

    fn coerce_fields(&self, mut fields: Map<String, Value>) -> Result<Map<String, Value>> {
        fields.retain(|_, value| !value.is_null());
        for name in self.integers {
            if let Some(value) = fields.get_mut(*name) {
                *value = Value::from(coerce_integer(name, value)?);
            }
        }
        for name in self.booleans {
            if let Some(value) = fields.get_mut(*name) {
                *value = Value::Bool(coerce_boolean(name, value)?);
            }
        }
        Ok(fields)
    }
}

// 2^63, the first float past i64::MAX
const I64_FLOAT_LIMIT: f64 = 9_223_372_036_854_775_808.0;

fn float_to_integer(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value >= -I64_FLOAT_LIMIT && value < I64_FLOAT_LIMIT {
        Some(value as i64)
    } else {
        None
    }
}

pub(crate) fn coerce_integer(field: &str, value: &Value) -> Result<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_integer)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    parsed.ok_or_else(|| {
        FogisError::InvalidArgument(format!("field '{}' is not an integer: {}", field, value))
    })
}

pub(crate) fn coerce_boolean(field: &str, value: &Value) -> Result<bool> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| {
        FogisError::InvalidArgument(format!("field '{}' is not a boolean: {}", field, value))
    })
}

/// Where a payload departed from its schema, as a `$.field[index]` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

pub struct ContractSchema {
    document: Value,
    validator: Validator,
}

impl fmt::Debug for ContractSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractSchema")
            .field("document", &self.document)
            .finish()
    }
}

impl ContractSchema {
    pub fn compile(document: Value) -> std::result::Result<Self, String> {
        let validator = jsonschema::validator_for(&document).map_err(|e| e.to_string())?;
        Ok(Self { document, validator })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Reports the first violation, if any.
    pub fn check(&self, payload: &Value) -> std::result::Result<(), SchemaViolation> {
        match self.validator.iter_errors(payload).next() {
            None => Ok(()),
            Some(err) => {
                let mut path = json_path(&err.instance_path.to_string());
                if let ValidationErrorKind::Required { property } = &err.kind {
                    match property.as_str() {
                        Some(name) => path = format!("{}.{}", path, name),
                        None => path = format!("{}.{}", path, property),
                    }
                }
                Err(SchemaViolation {
                    path,
                    message: err.to_string(),
                })
            }
        }
    }
}

/// Turns a JSON pointer such as `/records/0/id` into `$.records[0].id`.
fn json_path(pointer: &str) -> String {
    pointer
        .split('/')
        .skip(1)
        .fold(String::from("$"), |mut path, segment| {
            let segment = segment.replace("~1", "/").replace("~0", "~");
            if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                path.push_str(&format!("[{}]", segment));
            } else {
                path.push('.');
                path.push_str(&segment);
            }
            path
        })
}

#[derive(Debug)]
pub struct EndpointContract {
    pub endpoint: Endpoint,
    pub kind: EndpointKind,
    pub request: Option<ContractSchema>,
    pub response: Option<ContractSchema>,
    pub coercion: Coercion,
}

const EVENT_INTEGERS: &[&str] = &[
    "matchid",
    "matchhandelsetypid",
    "matchminut",
    "matchlagid",
    "spelareid",
    "assisterandeid",
    "period",
    "hemmamal",
    "bortamal",
    "sekund",
    "relateradTillMatchhandelseID",
    "spelareid2",
    "matchdeltagareid2",
];

const OFFICIAL_INTEGERS: &[&str] = &[
    "matchid",
    "matchlagid",
    "matchlagledareid",
    "matchlagledaretypid",
    "matchminut",
];

const PARTICIPANT_INTEGERS: &[&str] = &["matchdeltagareid", "trojnummer", "lagdelid", "positionsnummerhv"];
const PARTICIPANT_BOOLEANS: &[&str] = &["lagkapten", "ersattare", "arSpelandeLedare", "ansvarig"];

const RESULT_INTEGERS: &[&str] = &["matchid", "matchresultattypid", "matchlag1mal", "matchlag2mal"];
const RESULT_BOOLEANS: &[&str] = &["wo", "ow", "ww"];

const INTEGER: &str = "integer";

fn typed(kind: &str) -> Value {
    json!({ "type": kind })
}

fn object(required: &[&str], properties: Value) -> Value {
    json!({
        "type": "object",
        "required": required,
        "properties": properties
    })
}

fn array_of(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

fn integer_fields(required: &[&str], optional: &[&str]) -> Value {
    let properties: Map<String, Value> = required
        .iter()
        .chain(optional)
        .map(|name| (name.to_string(), typed(INTEGER)))
        .collect();
    object(required, Value::Object(properties))
}

fn by_id(key: &str) -> Value {
    integer_fields(&[key], &[])
}

fn result_record() -> Value {
    object(
        &["matchid", "matchresultattypid", "matchlag1mal", "matchlag2mal"],
        json!({
            "matchid": typed(INTEGER),
            "matchresultattypid": typed(INTEGER),
            "matchlag1mal": typed(INTEGER),
            "matchlag2mal": typed(INTEGER),
            "wo": typed("boolean"),
            "ow": typed("boolean"),
            "ww": typed("boolean")
        }),
    )
}

fn match_list_filter() -> Value {
    object(
        &[],
        json!({
            "datumFran": typed("string"),
            "datumTill": typed("string"),
            "datumTyp": typed(INTEGER),
            "status": array_of(typed("string"))
        }),
    )
}

fn flat_result_document() -> Value {
    integer_fields(
        &["matchid", "hemmamal", "bortamal"],
        &[
            "halvtidHemmamal",
            "halvtidBortamal",
            "forlangningHemmamal",
            "forlangningBortamal",
            "straffarHemmamal",
            "straffarBortamal",
        ],
    )
}

fn documents(endpoint: Endpoint) -> (EndpointKind, Value, Value, Coercion) {
    match endpoint {
        Endpoint::MatchList => (
            EndpointKind::MatchList,
            object(&["filter"], json!({ "filter": match_list_filter() })),
            object(&[], json!({ "matchlista": array_of(by_id("matchid")) })),
            Coercion::default(),
        ),
        Endpoint::Match => (
            EndpointKind::MatchDetail,
            by_id("matchid"),
            by_id("matchid"),
            Coercion::integers(&["matchid"]),
        ),
        Endpoint::MatchPlayers | Endpoint::MatchOfficials => (
            EndpointKind::MatchRoster,
            by_id("matchid"),
            typed("object"),
            Coercion::integers(&["matchid"]),
        ),
        Endpoint::MatchEvents => (
            EndpointKind::EventList,
            by_id("matchid"),
            array_of(integer_fields(&[], &["matchhandelseid"])),
            Coercion::integers(&["matchid"]),
        ),
        Endpoint::TeamPlayers => (
            EndpointKind::TeamRoster,
            by_id("matchlagid"),
            json!({ "type": ["array", "object"] }),
            Coercion::integers(&["matchlagid"]),
        ),
        Endpoint::TeamOfficials => (
            EndpointKind::TeamRoster,
            by_id("matchlagid"),
            typed("array"),
            Coercion::integers(&["matchlagid"]),
        ),
        Endpoint::MatchResultList => (
            EndpointKind::ResultList,
            by_id("matchid"),
            json!({ "anyOf": [array_of(result_record()), typed("object")] }),
            Coercion::integers(&["matchid"]),
        ),
        Endpoint::SaveEvent => (
            EndpointKind::EventReport,
            object(
                &["matchid", "matchhandelsetypid", "matchminut", "matchlagid", "period"],
                json!({
                    "matchid": typed(INTEGER),
                    "matchhandelsetypid": typed(INTEGER),
                    "matchminut": typed(INTEGER),
                    "matchlagid": typed(INTEGER),
                    "period": typed(INTEGER),
                    "planpositionx": typed("string"),
                    "planpositiony": typed("string")
                }),
            ),
            typed("object"),
            Coercion::integers(EVENT_INTEGERS),
        ),
        Endpoint::SaveResultList => (
            EndpointKind::ResultReport,
            object(&[RESULT_LIST_KEY], json!({ RESULT_LIST_KEY: array_of(result_record()) })),
            typed("object"),
            Coercion {
                integers: RESULT_INTEGERS,
                booleans: RESULT_BOOLEANS,
                nested: Some(RESULT_LIST_KEY),
            },
        ),
        Endpoint::DeleteEvent | Endpoint::RemoveEvent => (
            EndpointKind::EventDelete,
            by_id("matchhandelseid"),
            json!({ "type": ["object", "null"] }),
            Coercion::integers(&["matchhandelseid"]),
        ),
        Endpoint::SaveTeamOfficial => (
            EndpointKind::RosterAction,
            integer_fields(
                &["matchid", "matchlagid", "matchlagledareid", "matchlagledaretypid"],
                &[],
            ),
            typed("object"),
            Coercion::integers(OFFICIAL_INTEGERS),
        ),
        Endpoint::SaveParticipant => (
            EndpointKind::RosterAction,
            integer_fields(&["matchdeltagareid", "trojnummer", "lagdelid"], &[]),
            object(&[], json!({ "spelare": array_of(typed("object")) })),
            Coercion {
                integers: PARTICIPANT_INTEGERS,
                booleans: PARTICIPANT_BOOLEANS,
                nested: None,
            },
        ),
        Endpoint::ClearEvents => (
            EndpointKind::EventClear,
            by_id("matchid"),
            typed("object"),
            Coercion::integers(&["matchid"]),
        ),
        Endpoint::ApproveReport => (
            EndpointKind::ReportApproval,
            by_id("matchid"),
            typed("object"),
            Coercion::integers(&["matchid"]),
        ),
    }
}

fn contract(endpoint: Endpoint) -> std::result::Result<EndpointContract, String> {
    let (kind, request, response, coercion) = documents(endpoint);
    Ok(EndpointContract {
        endpoint,
        kind,
        request: Some(ContractSchema::compile(request)?),
        response: Some(ContractSchema::compile(response)?),
        coercion,
    })
}

fn build_registry() -> HashMap<String, EndpointContract> {
    Endpoint::ALL
        .iter()
        .filter_map(|endpoint| match contract(*endpoint) {
            Ok(contract) => Some((endpoint.path(), contract)),
            Err(e) => {
                error!("Contract for {} does not compile: {}", endpoint.operation(), e);
                None
            }
        })
        .collect()
}

lazy_static! {
    static ref REGISTRY: HashMap<String, EndpointContract> = build_registry();
    static ref FLAT_RESULT: std::result::Result<ContractSchema, String> =
        ContractSchema::compile(flat_result_document());
}

fn missing_contract(key: &str) -> FogisError {
    FogisError::InvalidArgument(format!("no usable contract registered for {}", key))
}

pub fn contract_for(endpoint: &str) -> Option<&'static EndpointContract> {
    REGISTRY.get(&endpoint_for_url(endpoint))
}

fn schema_for<F>(endpoint: &str, pick: F) -> Result<Option<&'static ContractSchema>>
where
    F: Fn(&'static EndpointContract) -> Option<&'static ContractSchema>,
{
    let key = endpoint_for_url(endpoint);
    match REGISTRY.get(&key) {
        Some(contract) => Ok(pick(contract)),
        None if Endpoint::from_key(&key).is_some() => Err(missing_contract(&key)),
        None => Ok(None),
    }
}

/// Checks a caller payload against the endpoint's request schema.
///
/// Runs on the literal input, before defaults and coercion.
pub fn validate_request(endpoint: &str, payload: &Value) -> Result<()> {
    let schema = match schema_for(endpoint, |c| c.request.as_ref())? {
        Some(schema) => schema,
        None => return Ok(()),
    };
    schema
        .check(payload)
        .map_err(|violation| FogisError::ContractViolation {
            endpoint: endpoint_for_url(endpoint),
            path: violation.path,
            message: violation.message,
        })
}

pub fn validate_response(endpoint: &str, payload: &Value) -> Result<()> {
    let schema = match schema_for(endpoint, |c| c.response.as_ref())? {
        Some(schema) => schema,
        None => return Ok(()),
    };
    schema
        .check(payload)
        .map_err(|violation| FogisError::UpstreamContractViolation {
            endpoint: endpoint_for_url(endpoint),
            path: violation.path,
            message: violation.message,
        })
}

/// Checks a flat result as supplied by a caller, before it is split per period.
pub fn validate_flat_result(payload: &Value) -> Result<()> {
    let endpoint = Endpoint::SaveResultList.path();
    let schema = FLAT_RESULT
        .as_ref()
        .map_err(|_| missing_contract(&endpoint))?;
    schema
        .check(payload)
        .map_err(|violation| FogisError::ContractViolation {
            endpoint,
            path: violation.path,
            message: violation.message,
        })
}

/// Reduces a URL or path to its registry key.
///
/// Anything before `/MatchWebMetoder.aspx/` (such as the `/mdk` base) is cut,
/// along with the query string and trailing slashes.
pub fn endpoint_for_url(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let path = path.trim_end_matches('/');
    match path.find(METHOD_PREFIX) {
        Some(start) => path[start..].to_string(),
        None if path.is_empty() => "/".to_string(),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_endpoint_for_url_is_stable() {
        let key = "/MatchWebMetoder.aspx/GetMatch";
        for url in [
            "https://fogis.svenskfotboll.se/mdk/MatchWebMetoder.aspx/GetMatch",
            "https://fogis.svenskfotboll.se/mdk/MatchWebMetoder.aspx/GetMatch/",
            "http://127.0.0.1:5001/mdk/MatchWebMetoder.aspx/GetMatch?x=1",
            "http://user:pw@[::1]:5001/mdk/MatchWebMetoder.aspx/GetMatch#top",
            "/MatchWebMetoder.aspx/GetMatch",
            "/mdk/MatchWebMetoder.aspx/GetMatch?x=1",
        ] {
            assert_eq!(endpoint_for_url(url), key, "{}", url);
        }
        assert_eq!(endpoint_for_url("https://example.com"), "/");
        assert_eq!(endpoint_for_url("https://example.com/mdk/Login.aspx?a=b"), "/mdk/Login.aspx");
    }

    #[test]
    fn test_every_endpoint_is_registered() {
        for endpoint in Endpoint::ALL {
            let contract = endpoint.contract().unwrap();
            assert_eq!(contract.endpoint, endpoint);
            assert!(contract.request.is_some());
            assert!(contract.response.is_some());
            assert_eq!(
                contract_for(&endpoint.path()).map(|c| c.endpoint),
                Some(endpoint)
            );
            assert_eq!(Endpoint::from_operation(endpoint.operation()), Some(endpoint));
        }
        assert!(Endpoint::from_operation("Unknown").is_none());
    }

    #[test]
    fn test_contracts_are_json_schema_documents() {
        let request = Endpoint::SaveEvent.contract().unwrap().request.as_ref().unwrap();
        assert_eq!(request.document()["type"], json!("object"));
        assert_eq!(request.document()["properties"]["matchminut"], json!({"type": "integer"}));
        assert!(request.document()["required"]
            .as_array()
            .unwrap()
            .contains(&json!("period")));
    }

    #[test]
    fn test_unregistered_path_is_not_a_violation() {
        assert!(validate_request("/MatchWebMetoder.aspx/Unknown", &json!("anything")).is_ok());
        assert!(validate_response("/MatchWebMetoder.aspx/Unknown", &json!(null)).is_ok());
    }

    #[test]
    fn test_request_violation_reports_literal_input() {
        let err = validate_request(
            "/MatchWebMetoder.aspx/SparaMatchhandelse",
            &json!({"matchid": 1, "matchhandelsetypid": 6, "matchminut": "35",
                    "matchlagid": 2, "period": 1}),
        )
        .unwrap_err();
        match err {
            FogisError::ContractViolation { endpoint, path, message } => {
                assert_eq!(endpoint, "/MatchWebMetoder.aspx/SparaMatchhandelse");
                assert_eq!(path, "$.matchminut");
                assert!(message.contains("integer"), "{}", message);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_nested_violation_path_indexes_the_record() {
        let err = validate_request(
            &Endpoint::SaveResultList.path(),
            &json!({"matchresultatListaJSON": [
                {"matchid": 1, "matchresultattypid": 1, "matchlag1mal": 0, "matchlag2mal": 0},
                {"matchid": 1, "matchresultattypid": "2", "matchlag1mal": 0, "matchlag2mal": 0}
            ]}),
        )
        .unwrap_err();
        match err {
            FogisError::ContractViolation { path, .. } => {
                assert_eq!(path, "$.matchresultatListaJSON[1].matchresultattypid")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_response_violation_is_attributed_to_upstream() {
        let err = validate_response(
            "https://host/mdk/MatchWebMetoder.aspx/GetMatchresultatlista",
            &json!([{"matchid": 1, "matchresultattypid": "1", "matchlag1mal": 0, "matchlag2mal": 0}]),
        )
        .unwrap_err();
        assert!(matches!(err, FogisError::UpstreamContractViolation { .. }));
    }

    #[test]
    fn test_delete_response_may_be_null() {
        assert!(validate_response(&Endpoint::DeleteEvent.path(), &Value::Null).is_ok());
        assert!(validate_response(&Endpoint::DeleteEvent.path(), &json!([])).is_err());
    }

    #[test]
    fn test_coercion_converts_declared_fields_and_drops_nulls() {
        let coerced = Endpoint::SaveEvent
            .contract()
            .unwrap()
            .coercion
            .apply(json!({"matchid": "12345", "spelareid": 7.0, "period": 1,
                          "assisterandeid": null, "kommentar": "fri"}))
            .unwrap();
        assert_eq!(
            coerced,
            json!({"matchid": 12345, "spelareid": 7, "period": 1, "kommentar": "fri"})
        );
    }

    #[test]
    fn test_coercion_of_nested_result_records() {
        let coerced = Endpoint::SaveResultList
            .contract()
            .unwrap()
            .coercion
            .apply(json!({"matchresultatListaJSON": [
                {"matchid": "1", "matchresultattypid": "1", "matchlag1mal": "2",
                 "matchlag2mal": 0, "wo": "false", "ow": 0, "ww": null}
            ]}))
            .unwrap();
        assert_eq!(
            coerced,
            json!({"matchresultatListaJSON": [
                {"matchid": 1, "matchresultattypid": 1, "matchlag1mal": 2,
                 "matchlag2mal": 0, "wo": false, "ow": false}
            ]})
        );
    }

    #[test]
    fn test_non_numeric_text_is_an_invalid_argument() {
        let err = Endpoint::SaveEvent
            .contract()
            .unwrap()
            .coercion
            .apply(json!({"spelareid": "abc"}))
            .unwrap_err();
        assert!(matches!(err, FogisError::InvalidArgument(_)));
        assert!(coerce_boolean("ansvarig", &json!("maybe")).is_err());
    }

    #[test]
    fn test_out_of_range_floats_are_not_integers() {
        assert_eq!(coerce_integer("matchid", &json!(12.0)).unwrap(), 12);
        assert_eq!(coerce_integer("matchid", &json!(-9.0e18)).unwrap(), -9_000_000_000_000_000_000);
        assert!(coerce_integer("matchid", &json!(1.0e19)).is_err());
        assert!(coerce_integer("matchid", &json!(-1.0e19)).is_err());
        assert!(coerce_integer("matchid", &json!(u64::MAX)).is_err());
        assert!(coerce_integer("matchid", &json!(1.5)).is_err());
    }

    #[test]
    fn test_flat_result_schema() {
        assert!(validate_flat_result(&json!({"matchid": 1, "hemmamal": 2, "bortamal": 1})).is_ok());
        match validate_flat_result(&json!({"matchid": 1, "hemmamal": 2})).unwrap_err() {
            FogisError::ContractViolation { endpoint, path, .. } => {
                assert_eq!(endpoint, Endpoint::SaveResultList.path());
                assert_eq!(path, "$.bortamal");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_path_from_pointer() {
        assert_eq!(json_path(""), "$");
        assert_eq!(json_path("/filter/status/0"), "$.filter.status[0]");
        assert_eq!(json_path("/a~1b"), "$.a/b");
    }
}
