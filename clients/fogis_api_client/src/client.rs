use chrono::Local;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn, Span};

use crate::auth::{Authenticator, USERNAME_FIELD};
use crate::config::ClientConfig;
use crate::contracts::{
    self, flat_to_nested, nested_to_flat, Coercion, Endpoint, FlatMatchResult, ResultPeriod,
    RESULT_LIST_KEY,
};
use crate::cookies::{CookieMap, CookiePair};
use crate::error::{FogisError, LoginFailure, Result};
use crate::session::HttpSession;
use crate::types::{
    require_fields, to_payload, Credentials, FieldValue, FlatResultInput, MatchEvent,
    MatchListFilter, MatchParticipant, MatchResultInput, ParticipantSaveResult,
    TeamOfficialAction,
};

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";
const JSON_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

const FLAT_RESULT_INTEGERS: &[&str] = &[
    "matchid",
    "hemmamal",
    "bortamal",
    "halvtidHemmamal",
    "halvtidBortamal",
    "forlangningHemmamal",
    "forlangningBortamal",
    "straffarHemmamal",
    "straffarBortamal",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Any,
    Object,
    List,
    ObjectOrList,
    ObjectOrNull,
}

impl Shape {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Shape::Any => true,
            Shape::Object => value.is_object(),
            Shape::List => value.is_array(),
            Shape::ObjectOrList => value.is_object() || value.is_array(),
            Shape::ObjectOrNull => value.is_object() || value.is_null(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Shape::Any => "any value",
            Shape::Object => "an object",
            Shape::List => "a list",
            Shape::ObjectOrList => "an object or a list",
            Shape::ObjectOrNull => "an object or nothing",
        }
    }
}

/// Decodes a response body and strips the ASP.NET `{"d": ...}` envelope.
///
/// An empty body decodes to `null`. A string `d` is parsed again as JSON and
/// kept as a plain string if that fails.
pub fn unwrap_envelope(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    let decoded: Value = serde_json::from_str(body)
        .map_err(|e| FogisError::DataError(format!("response is not valid JSON: {}", e)))?;
    Ok(match decoded {
        Value::Object(mut map) if map.contains_key("d") => match map.remove("d") {
            Some(Value::String(raw)) => match serde_json::from_str(&raw) {
                Ok(inner) => inner,
                Err(_) => Value::String(raw),
            },
            Some(inner) => inner,
            None => Value::Null,
        },
        other => other,
    })
}

fn query_pairs(payload: &Value) -> Vec<(String, String)> {
    match payload {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => (key.clone(), s.clone()),
                other => (key.clone(), other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn apply_event_defaults(payload: &mut Value) {
    let Value::Object(map) = payload else {
        return;
    };
    map.entry("sekund").or_insert(json!(0));
    map.entry("planpositionx").or_insert(json!("-1"));
    map.entry("planpositiony").or_insert(json!("-1"));
    map.entry("relateradTillMatchhandelseID").or_insert(json!(0));

    let event_type = map
        .get("matchhandelsetypid")
        .and_then(|value| contracts::coerce_integer("matchhandelsetypid", value).ok());
    if event_type != Some(MatchEvent::SUBSTITUTION) {
        map.entry("spelareid2").or_insert(json!(-1));
        map.entry("matchdeltagareid2").or_insert(json!(-1));
    }
}

fn as_int(value: Option<&Value>) -> Option<i64> {
    value.and_then(|v| contracts::coerce_integer("", v).ok())
}

fn parse_result_records(records: Value) -> Result<Vec<ResultPeriod>> {
    serde_json::from_value(records)
        .map_err(|e| FogisError::DataError(format!("invalid match result records: {}", e)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteMatch {
    #[serde(rename = "match")]
    pub match_info: Value,
    pub players: Value,
    pub officials: Value,
    pub events: Vec<Value>,
}

/// Every match-reporting capability, as offered by [`FogisApiClient`].
pub trait MatchReportingApi {
    /// Matches assigned to the logged-in referee. `None` uses the default filter.
    fn fetch_matches_list(&mut self, filter: Option<MatchListFilter>) -> Result<Value>;
    fn fetch_match(&mut self, match_id: impl Into<FieldValue>) -> Result<Value>;
    fn fetch_match_players(&mut self, match_id: impl Into<FieldValue>) -> Result<Value>;
    fn fetch_match_officials(&mut self, match_id: impl Into<FieldValue>) -> Result<Value>;
    fn fetch_match_events(&mut self, match_id: impl Into<FieldValue>) -> Result<Vec<Value>>;
    /// Team roster, always as an object with a `spelare` list.
    fn fetch_team_players(&mut self, team_id: impl Into<FieldValue>) -> Result<Value>;
    fn fetch_team_officials(&mut self, team_id: impl Into<FieldValue>) -> Result<Vec<Value>>;
    fn fetch_match_result(&mut self, match_id: impl Into<FieldValue>) -> Result<FlatMatchResult>;
    fn fetch_match_result_list(&mut self, match_id: impl Into<FieldValue>) -> Result<Vec<ResultPeriod>>;
    fn report_match_event(&mut self, event: &MatchEvent) -> Result<Value>;
    fn report_match_result(&mut self, result: impl Into<MatchResultInput>) -> Result<Value>;
    fn delete_match_event(&mut self, event_id: impl Into<FieldValue>) -> Result<Value>;
    fn report_team_official_action(&mut self, action: &TeamOfficialAction) -> Result<Value>;
    fn save_match_participant(&mut self, participant: &MatchParticipant) -> Result<ParticipantSaveResult>;
    fn clear_match_events(&mut self, match_id: impl Into<FieldValue>) -> Result<Value>;
    fn mark_reporting_finished(&mut self, match_id: impl Into<FieldValue>) -> Result<Value>;

    fn find_match(
        &mut self,
        match_id: impl Into<FieldValue>,
        filter: Option<MatchListFilter>,
    ) -> Result<Option<Value>> {
        let match_id = match_id.into().as_id("matchid")?;
        let list = self.fetch_matches_list(filter)?;
        Ok(list
            .get("matchlista")
            .and_then(Value::as_array)
            .and_then(|matches| {
                matches
                    .iter()
                    .find(|entry| as_int(entry.get("matchid")) == Some(match_id))
            })
            .cloned())
    }

    fn fetch_complete_match(&mut self, match_id: impl Into<FieldValue>) -> Result<CompleteMatch> {
        let match_id = match_id.into();
        Ok(CompleteMatch {
            match_info: self.fetch_match(match_id.clone())?,
            players: self.fetch_match_players(match_id.clone())?,
            officials: self.fetch_match_officials(match_id.clone())?,
            events: self.fetch_match_events(match_id)?,
        })
    }
}

/// Client for the FOGIS referee reporting application.
///
/// Logs in lazily on the first call that needs a session. A client built
/// from cookies never logs in unless its cookies are cleared. Instances are
/// meant for one caller at a time.
pub struct FogisApiClient {
    config: ClientConfig,
    session: HttpSession,
    authenticator: Authenticator,
    username: Option<String>,
    password: Option<String>,
    cookies: CookiePair,
    span: Span,
}

impl FogisApiClient {
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let (username, password, cookies) = match credentials {
            Credentials::Password { username, password } => {
                if username.trim().is_empty() || password.is_empty() {
                    return Err(FogisError::InvalidArgument(
                        "username and password must both be non-empty".to_string(),
                    ));
                }
                (Some(username), Some(password), CookiePair::default())
            }
            Credentials::Cookies(map) => {
                let cookies = CookiePair::from_map(&map);
                if cookies.auth.is_none() {
                    return Err(FogisError::InvalidArgument(
                        "cookies must include a non-empty auth token".to_string(),
                    ));
                }
                (None, None, cookies)
            }
        };

        let session = HttpSession::new(&config.http)?;
        let authenticator = Authenticator::new(&config);
        Ok(Self {
            config,
            session,
            authenticator,
            username,
            password,
            cookies,
            span: tracing::info_span!("fogis_client"),
        })
    }

    pub fn with_credentials(
        config: ClientConfig,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Self::new(
            config,
            Credentials::Password {
                username: username.into(),
                password: password.into(),
            },
        )
    }

    pub fn with_cookies(config: ClientConfig, cookies: CookieMap) -> Result<Self> {
        Self::new(config, Credentials::Cookies(cookies))
    }

    /// Routes this client's events, and those of its login handshake, under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        let auth_span = tracing::info_span!(parent: &span, "fogis_auth");
        self.authenticator = Authenticator::new(&self.config).with_span(auth_span);
        self.span = span;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.cookies.auth.is_some()
    }

    pub fn cookies(&self) -> CookieMap {
        self.cookies.to_public()
    }

    pub fn set_cookies(&mut self, cookies: &CookieMap) -> Result<()> {
        let pair = CookiePair::from_map(cookies);
        if pair.auth.is_none() {
            return Err(FogisError::InvalidArgument(
                "cookies must include a non-empty auth token".to_string(),
            ));
        }
        self.cookies = pair;
        Ok(())
    }

    /// Forgets the session. The next call logs in again if a password is held.
    pub fn clear_cookies(&mut self) -> Result<()> {
        self.cookies = CookiePair::default();
        self.session.reset_cookies()
    }

    /// Logs in unless a session is already held, returning public-form cookies.
    pub fn login(&mut self) -> Result<CookieMap> {
        if self.is_authenticated() {
            return Ok(self.cookies());
        }
        let (username, password) = match (&self.username, &self.password) {
            (Some(username), Some(password)) => (username.as_str(), password.as_str()),
            _ => return Err(LoginFailure::NoCredentials.into()),
        };

        let pair = self
            .authenticator
            .authenticate(&mut self.session, username, password)?;
        self.cookies = pair;
        Ok(self.cookies())
    }

    /// Checks that the held cookies still open the application.
    ///
    /// Any failure, including a redirect to the login page, yields `false`.
    pub fn validate_cookies(&mut self) -> bool {
        let span = self.span.clone();
        let _guard = span.enter();
        if !self.is_authenticated() {
            return false;
        }

        let url = format!("{}/", self.config.base_url);
        let cookie_header = match HeaderValue::from_str(&self.cookies.header_value()) {
            Ok(value) => value,
            Err(_) => return false,
        };
        let response = self
            .session
            .get(&url)
            .header(COOKIE, cookie_header)
            .send()
            .and_then(|response| response.error_for_status());
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Cookie validation request failed: {}", e);
                return false;
            }
        };
        if response.url().path().contains("Login.aspx") {
            debug!("Cookie validation landed on the login page");
            return false;
        }
        match response.text() {
            Ok(body) => !body.contains(USERNAME_FIELD),
            Err(_) => false,
        }
    }

    fn request_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_ACCEPT));
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        let cookie = HeaderValue::from_str(&self.cookies.header_value()).map_err(|_| {
            FogisError::InvalidArgument("session cookies contain invalid header characters".to_string())
        })?;
        headers.insert(COOKIE, cookie);
        Ok(headers)
    }

    /// Validates `payload` against the endpoint's request contract and sends it.
    ///
    /// Returns the unwrapped response after checking it against the response
    /// contract.
    pub fn execute(&mut self, endpoint: Endpoint, payload: Value, method: Method) -> Result<Value> {
        contracts::validate_request(&endpoint.path(), &payload)?;
        self.dispatch(endpoint, payload, method, Shape::Any)
    }

    fn request(&mut self, endpoint: Endpoint, payload: Value, shape: Shape) -> Result<Value> {
        contracts::validate_request(&endpoint.path(), &payload)?;
        self.dispatch(endpoint, payload, Method::POST, shape)
    }

    /// Coerces, authenticates and sends an already validated payload.
    fn dispatch(
        &mut self,
        endpoint: Endpoint,
        payload: Value,
        method: Method,
        shape: Shape,
    ) -> Result<Value> {
        let span = self.span.clone();
        let _guard = span.enter();
        let operation = endpoint.operation();
        let path = endpoint.path();

        let payload = endpoint.contract()?.coercion.apply(payload)?;

        if !self.is_authenticated() {
            debug!("No session for {}, logging in first", operation);
            self.login()?;
        }

        let url = self.config.method_url(&path);
        let headers = self.request_headers()?;
        debug!("Calling {} {}", method, operation);

        let builder = if method == Method::GET {
            self.session.get(&url).query(&query_pairs(&payload))
        } else {
            self.session.request(method, &url).json(&payload)
        };
        let body = builder
            .headers(headers)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| {
                warn!("{} request failed: {}", operation, e);
                FogisError::request(operation, e)
            })?;

        let data = unwrap_envelope(&body)?;
        if !shape.accepts(&data) {
            warn!("Unexpected {} response shape", operation);
            return Err(FogisError::DataError(format!(
                "invalid {} response: expected {}, got {}",
                operation,
                shape.describe(),
                data
            )));
        }
        contracts::validate_response(&path, &data)?;
        Ok(data)
    }

    fn by_id(&mut self, endpoint: Endpoint, key: &str, id: FieldValue, shape: Shape) -> Result<Value> {
        let id = id.as_id(key)?;
        let mut payload = Map::new();
        payload.insert(key.to_string(), Value::from(id));
        self.request(endpoint, Value::Object(payload), shape)
    }

    fn report_flat_result(&mut self, flat: FlatResultInput) -> Result<Value> {
        let literal = to_payload(&flat)?;
        require_fields(&literal, FlatResultInput::REQUIRED, "match result")?;
        contracts::validate_flat_result(&literal)?;

        let coerced = Coercion {
            integers: FLAT_RESULT_INTEGERS,
            ..Coercion::default()
        }
        .apply(literal)?;
        let flat: FlatMatchResult = serde_json::from_value(coerced)
            .map_err(|e| FogisError::InvalidArgument(format!("invalid match result: {}", e)))?;

        let records = to_payload(&flat_to_nested(&flat))?;
        let mut payload = Map::new();
        payload.insert(RESULT_LIST_KEY.to_string(), records);
        self.request(Endpoint::SaveResultList, Value::Object(payload), Shape::Object)
    }

    fn read_result_records(&mut self, match_id: FieldValue) -> Result<Vec<ResultPeriod>> {
        let data = self.by_id(Endpoint::MatchResultList, "matchid", match_id, Shape::ObjectOrList)?;
        match data {
            Value::Array(_) => parse_result_records(data),
            Value::Object(mut map) => match map.remove(RESULT_LIST_KEY) {
                Some(records) => parse_result_records(records),
                None => {
                    let flat: FlatMatchResult = serde_json::from_value(Value::Object(map))
                        .map_err(|e| FogisError::DataError(format!("invalid match result: {}", e)))?;
                    Ok(flat_to_nested(&flat))
                }
            },
            other => Err(FogisError::DataError(format!(
                "invalid match result response: {}",
                other
            ))),
        }
    }
}

impl MatchReportingApi for FogisApiClient {
    fn fetch_matches_list(&mut self, filter: Option<MatchListFilter>) -> Result<Value> {
        let filter =
            filter.unwrap_or_else(|| MatchListFilter::adapter_default(Local::now().date_naive()));
        let payload = json!({ "filter": to_payload(&filter)? });
        let data = self.request(Endpoint::MatchList, payload, Shape::Object)?;
        if data.get("matchlista").is_none() {
            return Err(FogisError::DataError(format!(
                "match list response has no matchlista: {}",
                data
            )));
        }
        info!(
            "Fetched {} matches",
            data["matchlista"].as_array().map_or(0, Vec::len)
        );
        Ok(data)
    }

    fn fetch_match(&mut self, match_id: impl Into<FieldValue>) -> Result<Value> {
        self.by_id(Endpoint::Match, "matchid", match_id.into(), Shape::Object)
    }

    fn fetch_match_players(&mut self, match_id: impl Into<FieldValue>) -> Result<Value> {
        self.by_id(Endpoint::MatchPlayers, "matchid", match_id.into(), Shape::Object)
    }

    fn fetch_match_officials(&mut self, match_id: impl Into<FieldValue>) -> Result<Value> {
        self.by_id(Endpoint::MatchOfficials, "matchid", match_id.into(), Shape::Object)
    }

    fn fetch_match_events(&mut self, match_id: impl Into<FieldValue>) -> Result<Vec<Value>> {
        match self.by_id(Endpoint::MatchEvents, "matchid", match_id.into(), Shape::List)? {
            Value::Array(events) => Ok(events),
            other => Err(FogisError::DataError(format!("invalid match events response: {}", other))),
        }
    }

    fn fetch_team_players(&mut self, team_id: impl Into<FieldValue>) -> Result<Value> {
        let data = self.by_id(Endpoint::TeamPlayers, "matchlagid", team_id.into(), Shape::ObjectOrList)?;
        match data {
            Value::Array(players) => Ok(json!({ "spelare": players })),
            Value::Object(map) if map.contains_key("spelare") => Ok(Value::Object(map)),
            other => Err(FogisError::DataError(format!("invalid team players response: {}", other))),
        }
    }

    fn fetch_team_officials(&mut self, team_id: impl Into<FieldValue>) -> Result<Vec<Value>> {
        match self.by_id(Endpoint::TeamOfficials, "matchlagid", team_id.into(), Shape::List)? {
            Value::Array(officials) => Ok(officials),
            other => Err(FogisError::DataError(format!("invalid team officials response: {}", other))),
        }
    }

    fn fetch_match_result(&mut self, match_id: impl Into<FieldValue>) -> Result<FlatMatchResult> {
        let records = self.read_result_records(match_id.into())?;
        nested_to_flat(&records)
    }

    fn fetch_match_result_list(&mut self, match_id: impl Into<FieldValue>) -> Result<Vec<ResultPeriod>> {
        self.read_result_records(match_id.into())
    }

    fn report_match_event(&mut self, event: &MatchEvent) -> Result<Value> {
        let mut payload = to_payload(event)?;
        require_fields(&payload, MatchEvent::REQUIRED, "match event")?;
        contracts::validate_request(&Endpoint::SaveEvent.path(), &payload)?;
        apply_event_defaults(&mut payload);
        let data = self.dispatch(Endpoint::SaveEvent, payload, Method::POST, Shape::Object)?;
        info!("Reported match event");
        Ok(data)
    }

    fn report_match_result(&mut self, result: impl Into<MatchResultInput>) -> Result<Value> {
        let data = match result.into() {
            MatchResultInput::Flat(flat) => self.report_flat_result(flat)?,
            MatchResultInput::Nested { records } => {
                let payload = MatchResultInput::nested_payload(&records)?;
                self.request(Endpoint::SaveResultList, payload, Shape::Object)?
            }
        };
        info!("Reported match result");
        Ok(data)
    }

    fn delete_match_event(&mut self, event_id: impl Into<FieldValue>) -> Result<Value> {
        let data = self.by_id(
            Endpoint::DeleteEvent,
            "matchhandelseid",
            event_id.into(),
            Shape::ObjectOrNull,
        )?;
        // the upstream answers a successful delete with an empty body
        Ok(if data.is_null() { json!({ "success": true }) } else { data })
    }

    fn report_team_official_action(&mut self, action: &TeamOfficialAction) -> Result<Value> {
        let payload = to_payload(action)?;
        require_fields(&payload, TeamOfficialAction::REQUIRED, "team official action")?;
        self.request(Endpoint::SaveTeamOfficial, payload, Shape::Object)
    }

    fn save_match_participant(&mut self, participant: &MatchParticipant) -> Result<ParticipantSaveResult> {
        let payload = to_payload(participant)?;
        require_fields(&payload, MatchParticipant::REQUIRED, "match participant")?;
        contracts::validate_request(&Endpoint::SaveParticipant.path(), &payload)?;
        let participant_id = as_int(payload.get("matchdeltagareid"));
        let jersey_number = as_int(payload.get("trojnummer"));

        let data = self.dispatch(Endpoint::SaveParticipant, payload, Method::POST, Shape::Object)?;

        let roster: Vec<Value> = data
            .get("spelare")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let updated_player = roster
            .iter()
            .find(|entry| as_int(entry.get("matchdeltagareid")) == participant_id)
            .or_else(|| {
                roster
                    .iter()
                    .find(|entry| as_int(entry.get("trojnummer")) == jersey_number)
            })
            .cloned();
        let verified = updated_player.as_ref().map_or(false, |entry| {
            as_int(entry.get("matchdeltagareid")) == participant_id
                && as_int(entry.get("trojnummer")) == jersey_number
        });
        if !verified {
            warn!("Saved participant {:?} not confirmed by returned roster", participant_id);
        }

        Ok(ParticipantSaveResult {
            success: data.get("success").and_then(Value::as_bool).unwrap_or(true),
            verified,
            updated_player,
            roster,
        })
    }

    fn clear_match_events(&mut self, match_id: impl Into<FieldValue>) -> Result<Value> {
        self.by_id(Endpoint::ClearEvents, "matchid", match_id.into(), Shape::Object)
    }

    fn mark_reporting_finished(&mut self, match_id: impl Into<FieldValue>) -> Result<Value> {
        let match_id = match_id.into();
        if match_id.is_blank() {
            return Err(FogisError::InvalidArgument("match_id cannot be empty".to_string()));
        }
        self.by_id(Endpoint::ApproveReport, "matchid", match_id, Shape::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::{PUBLIC_AUTH, PUBLIC_SESSION};
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    fn cookie_client(server: &mockito::ServerGuard) -> FogisApiClient {
        let cookies: CookieMap = [
            (PUBLIC_AUTH.to_string(), "A".to_string()),
            (PUBLIC_SESSION.to_string(), "B".to_string()),
        ]
        .into_iter()
        .collect();
        FogisApiClient::with_cookies(
            ClientConfig::with_base_url(format!("{}/mdk", server.url())),
            cookies,
        )
        .unwrap()
    }

    fn method_path(operation: &str) -> String {
        format!("/mdk/MatchWebMetoder.aspx/{}", operation)
    }

    #[test]
    fn test_unwrap_envelope() {
        assert_eq!(
            unwrap_envelope(r#"{"d": "{\"matchlista\": []}"}"#).unwrap(),
            json!({"matchlista": []})
        );
        assert_eq!(unwrap_envelope(r#"{"d": {"success": true}}"#).unwrap(), json!({"success": true}));
        assert_eq!(unwrap_envelope(r#"{"d": "not json"}"#).unwrap(), json!("not json"));
        assert_eq!(unwrap_envelope(r#"[1, 2]"#).unwrap(), json!([1, 2]));
        assert_eq!(unwrap_envelope("  ").unwrap(), Value::Null);
        assert!(matches!(unwrap_envelope("<html>"), Err(FogisError::DataError(_))));
    }

    #[test]
    fn test_event_defaults_skip_pairing_for_substitutions() {
        let mut goal = json!({"matchhandelsetypid": 6});
        apply_event_defaults(&mut goal);
        assert_eq!(goal["spelareid2"], json!(-1));
        assert_eq!(goal["planpositionx"], json!("-1"));
        assert_eq!(goal["sekund"], json!(0));

        let mut substitution = json!({"matchhandelsetypid": "17", "sekund": 30});
        apply_event_defaults(&mut substitution);
        assert!(substitution.get("spelareid2").is_none());
        assert!(substitution.get("matchdeltagareid2").is_none());
        assert_eq!(substitution["sekund"], json!(30));
        assert_eq!(substitution["relateradTillMatchhandelseID"], json!(0));
    }

    #[test]
    fn test_construction_requires_credentials() {
        let config = ClientConfig::default();
        assert!(matches!(
            FogisApiClient::with_credentials(config.clone(), "", "x"),
            Err(FogisError::InvalidArgument(_))
        ));
        assert!(matches!(
            FogisApiClient::with_cookies(config, CookieMap::new()),
            Err(FogisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_cookie_client_without_password_cannot_relogin() {
        let server = mockito::Server::new();
        let mut client = cookie_client(&server);
        assert!(client.is_authenticated());
        assert_eq!(client.login().unwrap().get(PUBLIC_AUTH).map(String::as_str), Some("A"));

        client.clear_cookies().unwrap();
        assert!(!client.is_authenticated());
        assert!(matches!(
            client.login(),
            Err(FogisError::LoginFailed(LoginFailure::NoCredentials))
        ));
    }

    #[test]
    fn test_request_carries_xhr_headers_and_server_cookies() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", method_path("GetMatch").as_str())
            .match_header("content-type", JSON_CONTENT_TYPE)
            .match_header("accept", JSON_ACCEPT)
            .match_header("x-requested-with", "XMLHttpRequest")
            .match_header(
                "cookie",
                Matcher::Exact("ASP.NET_SessionId=B; FogisMobilDomarKlient.ASPXAUTH=A".to_string()),
            )
            .match_body(Matcher::Json(json!({"matchid": 12345})))
            .with_body(r#"{"d": "{\"matchid\": 12345, \"hemmalag\": \"IFK\"}"}"#)
            .create();

        let mut client = cookie_client(&server);
        let detail = client.fetch_match("12345").unwrap();
        assert_eq!(detail["hemmalag"], json!("IFK"));
        mock.assert();
    }

    #[test]
    fn test_get_sends_query_parameters() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", method_path("GetMatch").as_str())
            .match_query(Matcher::UrlEncoded("matchid".to_string(), "7".to_string()))
            .with_body(r#"{"matchid": 7}"#)
            .create();

        let mut client = cookie_client(&server);
        let data = client
            .execute(Endpoint::Match, json!({"matchid": 7}), Method::GET)
            .unwrap();
        assert_eq!(data, json!({"matchid": 7}));
        mock.assert();
    }

    #[test]
    fn test_malformed_json_is_a_data_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", method_path("GetMatch").as_str())
            .with_body("<html>error</html>")
            .create();

        let mut client = cookie_client(&server);
        assert!(matches!(client.fetch_match(1), Err(FogisError::DataError(_))));
    }

    #[test]
    fn test_wrong_shape_is_a_data_error_before_schema_check() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", method_path("GetMatchhandelselista").as_str())
            .with_body(r#"{"d": "{\"matchhandelseid\": 1}"}"#)
            .create();

        let mut client = cookie_client(&server);
        assert!(matches!(client.fetch_match_events(1), Err(FogisError::DataError(_))));
    }

    #[test]
    fn test_schema_drift_is_an_upstream_violation() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", method_path("GetMatch").as_str())
            .with_body(r#"{"d": {"matchid": "12345"}}"#)
            .create();

        let mut client = cookie_client(&server);
        assert!(matches!(
            client.fetch_match(12345),
            Err(FogisError::UpstreamContractViolation { .. })
        ));
    }

    #[test]
    fn test_http_error_is_a_request_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", method_path("GetMatch").as_str())
            .with_status(500)
            .create();

        let mut client = cookie_client(&server);
        assert!(matches!(client.fetch_match(1), Err(FogisError::RequestFailed { .. })));
    }

    #[test]
    fn test_match_list_without_collection_is_a_data_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", method_path("GetMatcherAttRapportera").as_str())
            .with_body(r#"{"anvandartyp": "Domare"}"#)
            .create();

        let mut client = cookie_client(&server);
        assert!(matches!(client.fetch_matches_list(None), Err(FogisError::DataError(_))));
    }

    #[test]
    fn test_contract_violation_sends_nothing() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", Matcher::Any).expect(0).create();

        let mut client = cookie_client(&server);
        let event = MatchEvent::new(12345, "mål", 10, 1, 1);
        assert!(matches!(
            client.report_match_event(&event),
            Err(FogisError::ContractViolation { .. })
        ));
        assert!(matches!(
            client.mark_reporting_finished(""),
            Err(FogisError::InvalidArgument(_))
        ));
        mock.assert();
    }

    #[test]
    fn test_delete_with_empty_body_is_success() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", method_path("RaderaMatchhandelse").as_str())
            .match_body(Matcher::Json(json!({"matchhandelseid": 99})))
            .with_body("")
            .create();

        let mut client = cookie_client(&server);
        assert_eq!(client.delete_match_event(99).unwrap(), json!({"success": true}));
    }

    #[test]
    fn test_team_players_list_is_normalized() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", method_path("GetMatchdeltagareListaForMatchlag").as_str())
            .with_body(r#"{"d": "[{\"spelareid\": 1}]"}"#)
            .create();

        let mut client = cookie_client(&server);
        assert_eq!(
            client.fetch_team_players(1001).unwrap(),
            json!({"spelare": [{"spelareid": 1}]})
        );
    }

    #[test]
    fn test_unverified_participant_is_reported_not_raised() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", method_path("SparaMatchdeltagare").as_str())
            .match_body(Matcher::PartialJson(json!({
                "matchdeltagareid": 501, "trojnummer": 10, "lagdelid": 0, "lagkapten": true
            })))
            .with_body(r#"{"success": true, "spelare": [{"matchdeltagareid": 502, "trojnummer": 7}]}"#)
            .create();

        let mut client = cookie_client(&server);
        let participant = MatchParticipant::new("501", 10, 0).captain(true);
        let saved = client.save_match_participant(&participant).unwrap();
        assert!(saved.success);
        assert!(!saved.verified);
        assert!(saved.updated_player.is_none());
        assert_eq!(saved.roster.len(), 1);
    }

    #[test]
    fn test_match_result_from_nested_records() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", method_path("GetMatchresultatlista").as_str())
            .with_body(
                json!({"d": json!([
                    {"matchid": 5, "matchresultattypid": 2, "matchlag1mal": 1, "matchlag2mal": 0},
                    {"matchid": 5, "matchresultattypid": 1, "matchlag1mal": 3, "matchlag2mal": 1}
                ])
                .to_string()})
                .to_string(),
            )
            .create();

        let mut client = cookie_client(&server);
        let result = client.fetch_match_result(5).unwrap();
        assert_eq!(result, FlatMatchResult::new(5, 3, 1).with_half_time(1, 0));
    }
}
