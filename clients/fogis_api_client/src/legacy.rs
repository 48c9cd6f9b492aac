//! The older call surface, kept for existing callers.
//!
//! Every call is forwarded to one [`FogisApiClient`]. What differs is the
//! default match filter, the official-action field names, event deletion via
//! `TaBortMatchhandelse`, stricter participant verification, cookies handed
//! out in server form and the error vocabulary.

use chrono::Local;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::client::{CompleteMatch, FogisApiClient, MatchReportingApi};
use crate::config::ClientConfig;
use crate::contracts::{Endpoint, FlatMatchResult, ResultPeriod};
use crate::cookies::{self, CookieMap};
use crate::error::FogisError;
use crate::types::{
    missing_fields, to_payload, FieldValue, MatchEvent, MatchListFilter, MatchParticipant,
    MatchResultInput, ParticipantSaveResult, TeamOfficialAction,
};

#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("FOGIS login failed: {0}")]
    Login(#[source] FogisError),

    #[error("FOGIS API request failed: {0}")]
    Request(#[source] FogisError),

    #[error("FOGIS data error: {0}")]
    Data(String),

    #[error("{0}")]
    Value(String),
}

impl From<FogisError> for LegacyError {
    fn from(err: FogisError) -> Self {
        match err {
            FogisError::LoginFailed(_) => LegacyError::Login(err),
            FogisError::RequestFailed { .. } | FogisError::ContractViolation { .. } => {
                LegacyError::Request(err)
            }
            FogisError::DataError(message) => LegacyError::Data(message),
            FogisError::UpstreamContractViolation { .. } => LegacyError::Data(err.to_string()),
            FogisError::InvalidArgument(message) => LegacyError::Value(message),
        }
    }
}

pub type LegacyResult<T> = std::result::Result<T, LegacyError>;

/// Official action in the older naming: `lagid` for the team and `minut`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyOfficialAction {
    #[serde(rename = "matchid", default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<FieldValue>,
    #[serde(rename = "lagid", default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<FieldValue>,
    #[serde(rename = "matchlagledareid", default, skip_serializing_if = "Option::is_none")]
    pub official_id: Option<FieldValue>,
    #[serde(rename = "matchlagledaretypid", default, skip_serializing_if = "Option::is_none")]
    pub action_type_id: Option<FieldValue>,
    #[serde(rename = "minut", default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<FieldValue>,
}

impl LegacyOfficialAction {
    pub const REQUIRED: &'static [&'static str] =
        &["matchid", "lagid", "matchlagledareid", "matchlagledaretypid"];
}

impl From<LegacyOfficialAction> for TeamOfficialAction {
    fn from(action: LegacyOfficialAction) -> Self {
        TeamOfficialAction {
            match_id: action.match_id,
            team_id: action.team_id,
            official_id: action.official_id,
            action_type_id: action.action_type_id,
            minute: action.minute,
        }
    }
}

/// The older call surface, one method per [`MatchReportingApi`] operation.
pub trait LegacyReportingApi {
    fn fetch_matches_list_json(&mut self, filter: Option<MatchListFilter>) -> LegacyResult<Value>;
    fn fetch_match_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Value>;
    fn fetch_match_players_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Value>;
    fn fetch_match_officials_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Value>;
    fn fetch_match_events_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Vec<Value>>;
    fn fetch_team_players_json(&mut self, team_id: impl Into<FieldValue>) -> LegacyResult<Value>;
    fn fetch_team_officials_json(&mut self, team_id: impl Into<FieldValue>) -> LegacyResult<Vec<Value>>;
    fn fetch_match_result_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<FlatMatchResult>;
    fn fetch_match_result_list_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Vec<ResultPeriod>>;
    fn report_match_event(&mut self, event: &MatchEvent) -> LegacyResult<Value>;
    fn report_match_result(&mut self, result: impl Into<MatchResultInput>) -> LegacyResult<Value>;
    fn delete_match_event(&mut self, event_id: impl Into<FieldValue>) -> LegacyResult<Value>;
    fn report_team_official_action(&mut self, action: LegacyOfficialAction) -> LegacyResult<Value>;
    fn save_match_participant(&mut self, participant: &MatchParticipant) -> LegacyResult<ParticipantSaveResult>;
    fn clear_match_events(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Value>;
    fn mark_reporting_finished(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Value>;
    fn find_match(
        &mut self,
        match_id: impl Into<FieldValue>,
        filter: Option<MatchListFilter>,
    ) -> LegacyResult<Option<Value>>;
    fn fetch_complete_match_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<CompleteMatch>;
}

pub struct LegacyClient {
    inner: FogisApiClient,
}

fn legacy_filter(filter: Option<MatchListFilter>) -> MatchListFilter {
    filter.unwrap_or_else(|| MatchListFilter::legacy_default(Local::now().date_naive()))
}

impl LegacyClient {
    pub fn new(
        config: ClientConfig,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> LegacyResult<Self> {
        Ok(Self {
            inner: FogisApiClient::with_credentials(config, username, password)?,
        })
    }

    pub fn with_cookies(config: ClientConfig, cookies: CookieMap) -> LegacyResult<Self> {
        Ok(Self {
            inner: FogisApiClient::with_cookies(config, cookies)?,
        })
    }

    pub fn from_client(inner: FogisApiClient) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &FogisApiClient {
        &self.inner
    }

    pub fn login(&mut self) -> LegacyResult<CookieMap> {
        let public = self.inner.login()?;
        Ok(cookies::to_server(&public))
    }

    pub fn cookies(&self) -> CookieMap {
        cookies::to_server(&self.inner.cookies())
    }

    pub fn set_cookies(&mut self, cookies: &CookieMap) -> LegacyResult<()> {
        Ok(self.inner.set_cookies(cookies)?)
    }

    pub fn clear_cookies(&mut self) -> LegacyResult<()> {
        Ok(self.inner.clear_cookies()?)
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.is_authenticated()
    }

    pub fn validate_cookies(&mut self) -> bool {
        self.inner.validate_cookies()
    }

    pub fn execute(&mut self, endpoint: Endpoint, payload: Value, method: Method) -> LegacyResult<Value> {
        Ok(self.inner.execute(endpoint, payload, method)?)
    }
}

impl LegacyReportingApi for LegacyClient {
    fn fetch_matches_list_json(&mut self, filter: Option<MatchListFilter>) -> LegacyResult<Value> {
        Ok(self.inner.fetch_matches_list(Some(legacy_filter(filter)))?)
    }

    fn fetch_match_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Value> {
        Ok(self.inner.fetch_match(match_id)?)
    }

    fn fetch_match_players_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Value> {
        Ok(self.inner.fetch_match_players(match_id)?)
    }

    fn fetch_match_officials_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Value> {
        Ok(self.inner.fetch_match_officials(match_id)?)
    }

    fn fetch_match_events_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Vec<Value>> {
        Ok(self.inner.fetch_match_events(match_id)?)
    }

    fn fetch_team_players_json(&mut self, team_id: impl Into<FieldValue>) -> LegacyResult<Value> {
        Ok(self.inner.fetch_team_players(team_id)?)
    }

    fn fetch_team_officials_json(&mut self, team_id: impl Into<FieldValue>) -> LegacyResult<Vec<Value>> {
        Ok(self.inner.fetch_team_officials(team_id)?)
    }

    fn fetch_match_result_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<FlatMatchResult> {
        Ok(self.inner.fetch_match_result(match_id)?)
    }

    fn fetch_match_result_list_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Vec<ResultPeriod>> {
        Ok(self.inner.fetch_match_result_list(match_id)?)
    }

    fn report_match_event(&mut self, event: &MatchEvent) -> LegacyResult<Value> {
        Ok(self.inner.report_match_event(event)?)
    }

    fn report_match_result(&mut self, result: impl Into<MatchResultInput>) -> LegacyResult<Value> {
        Ok(self.inner.report_match_result(result)?)
    }

    /// Deletes through `TaBortMatchhandelse`. A `null` answer counts as success.
    fn delete_match_event(&mut self, event_id: impl Into<FieldValue>) -> LegacyResult<Value> {
        let event_id = event_id.into().as_id("matchhandelseid")?;
        let data = self.inner.execute(
            Endpoint::RemoveEvent,
            json!({ "matchhandelseid": event_id }),
            Method::POST,
        )?;
        match data {
            Value::Null => Ok(json!({ "success": true })),
            Value::Object(_) => Ok(data),
            other => Err(LegacyError::Data(format!(
                "invalid delete match event response: {}",
                other
            ))),
        }
    }

    fn report_team_official_action(&mut self, action: LegacyOfficialAction) -> LegacyResult<Value> {
        let missing = missing_fields(&to_payload(&action)?, LegacyOfficialAction::REQUIRED);
        if !missing.is_empty() {
            return Err(LegacyError::Value(format!(
                "missing required field(s) in action data: {}",
                missing.join(", ")
            )));
        }
        Ok(self.inner.report_team_official_action(&action.into())?)
    }

    /// Fails unless the returned roster confirms the saved entry.
    fn save_match_participant(&mut self, participant: &MatchParticipant) -> LegacyResult<ParticipantSaveResult> {
        let saved = self.inner.save_match_participant(participant)?;
        if !saved.verified {
            return Err(LegacyError::Data(format!(
                "participant {} was not confirmed by the returned roster",
                participant
                    .participant_id
                    .as_ref()
                    .map_or_else(String::new, ToString::to_string)
            )));
        }
        Ok(saved)
    }

    fn clear_match_events(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Value> {
        Ok(self.inner.clear_match_events(match_id)?)
    }

    fn mark_reporting_finished(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<Value> {
        Ok(self.inner.mark_reporting_finished(match_id)?)
    }

    fn find_match(
        &mut self,
        match_id: impl Into<FieldValue>,
        filter: Option<MatchListFilter>,
    ) -> LegacyResult<Option<Value>> {
        Ok(self.inner.find_match(match_id, Some(legacy_filter(filter)))?)
    }

    fn fetch_complete_match_json(&mut self, match_id: impl Into<FieldValue>) -> LegacyResult<CompleteMatch> {
        Ok(self.inner.fetch_complete_match(match_id)?)
    }
}
