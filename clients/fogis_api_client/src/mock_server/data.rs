use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::login::has_auth_cookie;
use super::MockServerState;
use crate::contracts::{self, Endpoint, RESULT_LIST_KEY};

pub const SAMPLE_MATCH_IDS: [i64; 2] = [12345, 12346];
pub const HOME_TEAM_ID: i64 = 1001;
pub const AWAY_TEAM_ID: i64 = 1002;

const FIRST_NAMES: [&str; 11] = [
    "Erik", "Johan", "Lars", "Anders", "Karl", "Per", "Nils", "Magnus", "Oskar", "Viktor", "Axel",
];
const LAST_NAMES: [&str; 11] = [
    "Andersson", "Johansson", "Karlsson", "Nilsson", "Eriksson", "Larsson", "Olsson",
    "Persson", "Svensson", "Gustafsson", "Lindberg",
];

/// `base * scale + offset`, wrapping so that any id a caller sends is served.
fn derived_id(base: i64, scale: i64, offset: i64) -> i64 {
    base.wrapping_mul(scale).wrapping_add(offset)
}

fn team_name(team_id: i64) -> &'static str {
    match team_id {
        HOME_TEAM_ID => "IFK Stadsdel",
        AWAY_TEAM_ID => "BK Skogsvallen",
        _ => "FC Okänd",
    }
}

fn match_summary(match_id: i64, index: usize) -> Value {
    json!({
        "matchid": match_id,
        "matchnr": format!("{:06}", match_id),
        "lag1lagid": HOME_TEAM_ID,
        "lag1namn": team_name(HOME_TEAM_ID),
        "lag2lagid": AWAY_TEAM_ID,
        "lag2namn": team_name(AWAY_TEAM_ID),
        "matchlag1id": HOME_TEAM_ID,
        "matchlag2id": AWAY_TEAM_ID,
        "speldatum": format!("2025-05-{:02}", 10 + index),
        "avsparkstid": "15:00",
        "anlaggningnamn": "Stadsdelsvallen",
        "tavlingnamn": "Division 4",
        "tavlingskategorinamn": "Herrar",
        "arslutresultat": false,
        "domaruppdraglista": [
            {
                "domaruppdragid": derived_id(match_id, 1, 70000),
                "matchid": match_id,
                "domarrollid": 1,
                "domarrollnamn": "Huvuddomare",
                "domarrollkortnamn": "Dom",
                "personnamn": "Test Domare",
                "domaruppdragstatusnamn": "Tilldelat"
            }
        ]
    })
}

pub fn match_list() -> Value {
    json!({
        "anvandare": "test_user",
        "matchlista": SAMPLE_MATCH_IDS
            .iter()
            .enumerate()
            .map(|(index, id)| match_summary(*id, index))
            .collect::<Vec<_>>()
    })
}

pub fn match_detail(match_id: i64) -> Value {
    json!({
        "matchid": match_id,
        "matchnr": format!("{:06}", match_id),
        "datum": "2025-05-10",
        "tid": "15:00",
        "hemmalag": team_name(HOME_TEAM_ID),
        "bortalag": team_name(AWAY_TEAM_ID),
        "hemmalagid": HOME_TEAM_ID,
        "bortalagid": AWAY_TEAM_ID,
        "arena": "Stadsdelsvallen",
        "status": "Fastställd",
        "matchtyp": "Serie",
        "tavling": "Division 4",
        "hemmamal": 2,
        "bortamal": 1,
        "halvtidHemmamal": 1,
        "halvtidBortamal": 0,
        "publik": 250,
        "rapportstatus": "Ej påbörjad",
        "matchstart": null
    })
}

/// Eleven players per team, participant ids `team * 100 + shirt number`.
pub fn team_roster(team_id: i64) -> Vec<Value> {
    (1..=11)
        .map(|number: i64| {
            let index = team_id
                .wrapping_add(number)
                .rem_euclid(FIRST_NAMES.len() as i64) as usize;
            json!({
                "matchdeltagareid": derived_id(team_id, 100, number),
                "spelareid": derived_id(team_id, 1000, number),
                "matchlagid": team_id,
                "fornamn": FIRST_NAMES[index],
                "efternamn": LAST_NAMES[(index + 3) % LAST_NAMES.len()],
                "trojnummer": number,
                "lagkapten": number == 1,
                "ersattare": false,
                "lagdelid": 0,
                "positionsnummerhv": 0,
                "arSpelandeLedare": false,
                "ansvarig": false
            })
        })
        .collect()
}

pub fn team_officials(team_id: i64) -> Vec<Value> {
    [(1, "Huvudtränare"), (2, "Assisterande tränare"), (3, "Lagledare")]
        .iter()
        .map(|(role_id, role)| {
            json!({
                "matchlagledareid": derived_id(team_id, 10, *role_id),
                "personid": derived_id(team_id, 10, *role_id).wrapping_add(50000),
                "matchlagid": team_id,
                "fornamn": FIRST_NAMES[*role_id as usize],
                "efternamn": LAST_NAMES[*role_id as usize],
                "roll": role,
                "matchlagledaretypid": role_id
            })
        })
        .collect()
}

fn match_officials(match_id: i64) -> Value {
    json!({
        "matchid": match_id,
        "hemmalag": team_officials(HOME_TEAM_ID),
        "bortalag": team_officials(AWAY_TEAM_ID),
        "domare": [
            {"personid": 60001, "namn": "Test Domare", "domarrollnamn": "Huvuddomare"},
            {"personid": 60002, "namn": "Assisterande Ett", "domarrollnamn": "Assisterande 1"},
            {"personid": 60003, "namn": "Assisterande Två", "domarrollnamn": "Assisterande 2"}
        ]
    })
}

pub fn match_events(match_id: i64) -> Vec<Value> {
    vec![
        json!({
            "matchhandelseid": derived_id(match_id, 10, 1),
            "matchid": match_id,
            "matchhandelsetypid": 6,
            "matchhandelsetypnamn": "Mål",
            "matchminut": 23,
            "matchlagid": HOME_TEAM_ID,
            "spelareid": HOME_TEAM_ID * 1000 + 9,
            "period": 1,
            "hemmamal": 1,
            "bortamal": 0
        }),
        json!({
            "matchhandelseid": derived_id(match_id, 10, 2),
            "matchid": match_id,
            "matchhandelsetypid": 20,
            "matchhandelsetypnamn": "Gult kort",
            "matchminut": 51,
            "matchlagid": AWAY_TEAM_ID,
            "spelareid": AWAY_TEAM_ID * 1000 + 4,
            "period": 2,
            "hemmamal": 1,
            "bortamal": 0
        }),
    ]
}

pub fn result_records(match_id: i64) -> Vec<Value> {
    [(1, 2, 1), (2, 1, 0)]
        .iter()
        .map(|(period, home, away)| {
            json!({
                "matchresultatid": derived_id(match_id, 10, *period),
                "matchid": match_id,
                "matchresultattypid": period,
                "matchlag1mal": home,
                "matchlag2mal": away,
                "wo": false,
                "ow": false,
                "ww": false
            })
        })
        .collect()
}

fn error_response(status: StatusCode, message: &str, exception: &str) -> Response {
    (
        status,
        Json(json!({
            "Message": message,
            "ExceptionType": exception,
            "StackTrace": ""
        })),
    )
        .into_response()
}

/// Reads wrap their payload as a JSON string under `d`.
fn read_envelope(data: Value) -> Response {
    Json(json!({ "d": data.to_string() })).into_response()
}

/// Writes carry their payload as an object under `d`.
fn write_envelope(data: Value) -> Response {
    Json(json!({ "d": data })).into_response()
}

fn int_field(payload: &Value, field: &str) -> i64 {
    payload
        .get(field)
        .and_then(|value| contracts::coerce_integer(field, value).ok())
        .unwrap_or_default()
}

fn save_participant(payload: &Value) -> Value {
    let mut roster = team_roster(HOME_TEAM_ID);
    let participant_id = int_field(payload, "matchdeltagareid");
    let updates: Map<String, Value> = payload.as_object().cloned().unwrap_or_default();

    let existing = roster
        .iter()
        .position(|entry| entry["matchdeltagareid"].as_i64() == Some(participant_id));
    match existing {
        Some(index) => {
            if let Value::Object(entry) = &mut roster[index] {
                entry.extend(updates);
            }
        }
        None => roster.push(Value::Object(updates)),
    }
    json!({ "success": true, "spelare": roster })
}

fn respond(state: &MockServerState, endpoint: Endpoint, payload: &Value) -> Response {
    match endpoint {
        // the match list comes back without an envelope
        Endpoint::MatchList => Json(match_list()).into_response(),
        Endpoint::Match => read_envelope(match_detail(int_field(payload, "matchid"))),
        Endpoint::MatchPlayers => read_envelope(json!({
            "matchid": int_field(payload, "matchid"),
            "hemmalag": team_roster(HOME_TEAM_ID),
            "bortalag": team_roster(AWAY_TEAM_ID)
        })),
        Endpoint::MatchOfficials => read_envelope(match_officials(int_field(payload, "matchid"))),
        Endpoint::MatchEvents => read_envelope(json!(match_events(int_field(payload, "matchid")))),
        Endpoint::TeamPlayers => {
            read_envelope(json!({ "spelare": team_roster(int_field(payload, "matchlagid")) }))
        }
        Endpoint::TeamOfficials => {
            read_envelope(json!(team_officials(int_field(payload, "matchlagid"))))
        }
        Endpoint::MatchResultList => {
            read_envelope(json!(result_records(int_field(payload, "matchid"))))
        }
        Endpoint::SaveEvent => {
            let mut saved = payload.as_object().cloned().unwrap_or_default();
            saved.insert("matchhandelseid".to_string(), json!(state.next_id()));
            saved.insert("success".to_string(), json!(true));
            write_envelope(Value::Object(saved))
        }
        Endpoint::SaveResultList => {
            let saved = payload
                .get(RESULT_LIST_KEY)
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            write_envelope(json!({ "success": true, "sparade": saved }))
        }
        // an empty 200 is how the upstream acknowledges a delete
        Endpoint::DeleteEvent => StatusCode::OK.into_response(),
        Endpoint::RemoveEvent => write_envelope(Value::Null),
        Endpoint::SaveTeamOfficial => write_envelope(json!({
            "success": true,
            "matchlagledareid": int_field(payload, "matchlagledareid")
        })),
        Endpoint::SaveParticipant => write_envelope(save_participant(payload)),
        Endpoint::ClearEvents => write_envelope(json!({
            "success": true,
            "matchid": int_field(payload, "matchid")
        })),
        Endpoint::ApproveReport => write_envelope(json!({
            "success": true,
            "matchid": int_field(payload, "matchid"),
            "rapportstatus": "Godkänd"
        })),
    }
}

/// Handles `POST /mdk/MatchWebMetoder.aspx/{operation}`.
///
/// Every call is recorded before any check runs.
pub async fn method_handler(
    State(state): State<MockServerState>,
    Path(operation): Path<String>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    let payload = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    state.history.record("POST", uri.path(), payload.clone());

    let Some(endpoint) = Endpoint::from_operation(&operation) else {
        warn!("Unknown web method: {}", operation);
        return error_response(
            StatusCode::NOT_FOUND,
            &format!("Unknown web method {}.", operation),
            "System.ArgumentException",
        );
    };

    if !has_auth_cookie(&headers) {
        warn!("Call to {} without auth cookie", operation);
        return error_response(
            StatusCode::UNAUTHORIZED,
            "Authentication failed.",
            "System.InvalidOperationException",
        );
    }

    if state.validation_enabled() {
        if let Err(e) = contracts::validate_request(&endpoint.path(), &payload) {
            warn!("Rejected {} payload: {}", operation, e);
            return error_response(
                StatusCode::BAD_REQUEST,
                &e.to_string(),
                "System.ArgumentException",
            );
        }
    }

    debug!("Serving sample data for {}", operation);
    respond(&state, endpoint, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::unwrap_envelope;
    use crate::config::MockServerConfig;
    use crate::mock_server::MockFogisServer;
    use axum::http::{header::COOKIE, HeaderValue};
    use axum_test::TestServer;
    use pretty_assertions::assert_eq;

    const AUTH: &str = "ASP.NET_SessionId=s; FogisMobilDomarKlient.ASPXAUTH=a";

    fn test_server() -> (TestServer, MockServerState) {
        let server = MockFogisServer::new(MockServerConfig::ephemeral());
        let state = server.state().clone();
        (TestServer::new(server.router()).unwrap(), state)
    }

    fn method(operation: &str) -> String {
        format!("/mdk/MatchWebMetoder.aspx/{}", operation)
    }

    #[tokio::test]
    async fn test_reads_are_string_enveloped() {
        let (server, _) = test_server();
        let response = server
            .post(&method("GetMatch"))
            .add_header(COOKIE, HeaderValue::from_static(AUTH))
            .json(&json!({"matchid": 12345}))
            .await;
        response.assert_status_ok();
        let body = response.text();
        assert!(body.starts_with(r#"{"d":""#));
        assert_eq!(unwrap_envelope(&body).unwrap(), match_detail(12345));
    }

    #[tokio::test]
    async fn test_match_list_is_not_enveloped() {
        let (server, _) = test_server();
        let response = server
            .post(&method("GetMatcherAttRapportera"))
            .add_header(COOKIE, HeaderValue::from_static(AUTH))
            .json(&json!({"filter": {"datumTyp": 0}}))
            .await;
        let body = response.json::<Value>();
        assert!(body.get("d").is_none());
        assert_eq!(body["matchlista"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_missing_auth_cookie_is_unauthorized_but_recorded() {
        let (server, state) = test_server();
        let response = server
            .post(&method("GetMatch"))
            .json(&json!({"matchid": 12345}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_operation_is_not_found() {
        let (server, state) = test_server();
        let response = server
            .post(&method("GetNothing"))
            .add_header(COOKIE, HeaderValue::from_static(AUTH))
            .json(&json!({}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(state.history.snapshot()[0].path, method("GetNothing"));
    }

    #[tokio::test]
    async fn test_contract_violation_depends_on_validation() {
        let (server, state) = test_server();
        let bad = json!({"matchid": "12345"});

        let rejected = server
            .post(&method("GetMatch"))
            .add_header(COOKIE, HeaderValue::from_static(AUTH))
            .json(&bad)
            .await;
        rejected.assert_status(StatusCode::BAD_REQUEST);
        let error = rejected.json::<Value>();
        assert!(error["Message"].as_str().unwrap().contains("matchid"));
        assert!(error.get("ExceptionType").is_some());

        state.set_validation(false);
        let accepted = server
            .post(&method("GetMatch"))
            .add_header(COOKIE, HeaderValue::from_static(AUTH))
            .json(&bad)
            .await;
        accepted.assert_status_ok();
        assert_eq!(unwrap_envelope(&accepted.text()).unwrap()["matchid"], json!(12345));
    }

    #[tokio::test]
    async fn test_delete_variants() {
        let (server, _) = test_server();
        let radera = server
            .post(&method("RaderaMatchhandelse"))
            .add_header(COOKIE, HeaderValue::from_static(AUTH))
            .json(&json!({"matchhandelseid": 123461}))
            .await;
        radera.assert_status_ok();
        assert_eq!(radera.text(), "");

        let ta_bort = server
            .post(&method("TaBortMatchhandelse"))
            .add_header(COOKIE, HeaderValue::from_static(AUTH))
            .json(&json!({"matchhandelseid": 123461}))
            .await;
        assert_eq!(ta_bort.json::<Value>(), json!({"d": null}));
    }

    #[tokio::test]
    async fn test_extreme_ids_are_served() {
        let (server, _) = test_server();
        for (operation, payload) in [
            ("GetMatchdeltagareListaForMatchlag", json!({"matchlagid": -1})),
            ("GetMatchdeltagareListaForMatchlag", json!({"matchlagid": i64::MIN})),
            ("GetMatchlagledareListaForMatchlag", json!({"matchlagid": i64::MAX})),
            ("GetMatchhandelselista", json!({"matchid": 1_000_000_000_000_000_000_i64})),
            ("GetMatchresultatlista", json!({"matchid": i64::MAX})),
        ] {
            let response = server
                .post(&method(operation))
                .add_header(COOKIE, HeaderValue::from_static(AUTH))
                .json(&payload)
                .await;
            response.assert_status_ok();
            let data = unwrap_envelope(&response.text()).unwrap();
            contracts::validate_response(&method(operation), &data).unwrap();
        }
    }

    #[test]
    fn test_negative_team_roster_is_deterministic() {
        let roster = team_roster(-1);
        assert_eq!(roster.len(), 11);
        assert_eq!(roster[0]["matchdeltagareid"], json!(-99));
        assert_eq!(roster[0]["fornamn"], json!(FIRST_NAMES[0]));
        assert_eq!(team_roster(-1), roster);
    }

    #[test]
    fn test_save_participant_updates_or_appends() {
        let updated = save_participant(&json!({
            "matchdeltagareid": 100101, "trojnummer": 23, "lagdelid": 0
        }));
        let roster = updated["spelare"].as_array().unwrap();
        assert_eq!(roster.len(), 11);
        assert_eq!(roster[0]["trojnummer"], json!(23));
        assert_eq!(roster[0]["fornamn"], team_roster(HOME_TEAM_ID)[0]["fornamn"]);

        let appended = save_participant(&json!({
            "matchdeltagareid": 777, "trojnummer": 99, "lagdelid": 0
        }));
        assert_eq!(appended["spelare"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn test_sample_results_satisfy_contract() {
        let records = json!(result_records(12345));
        contracts::validate_response(&Endpoint::MatchResultList.path(), &records).unwrap();
        contracts::validate_response(&Endpoint::MatchList.path(), &match_list()).unwrap();
    }
}
