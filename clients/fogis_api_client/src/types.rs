use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::contracts::{self, FlatMatchResult, ResultPeriod, RESULT_LIST_KEY};
use crate::cookies::CookieMap;
use crate::error::{FogisError, Result};

/// A loosely-typed input value.
///
/// Callers may hand over identifiers as text; the literal form is what request
/// validation sees, and coercion to the wire type happens afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Integer view of the value, for identifiers passed as operation arguments.
    pub fn as_id(&self, name: &str) -> Result<i64> {
        contracts::coerce_integer(name, &self.to_json())
    }

    /// True for `""`, whitespace, `0` and `false`.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Bool(b) => !b,
            FieldValue::Int(i) => *i == 0,
            FieldValue::Float(f) => *f == 0.0,
            FieldValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! field_value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(value: $t) -> Self {
                FieldValue::Int(i64::from(value))
            }
        })*
    };
}

field_value_from_int!(i64, i32, u32, u16, u8);

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

#[derive(Clone)]
pub enum Credentials {
    Password { username: String, password: String },
    Cookies(CookieMap),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Cookies(cookies) => f
                .debug_tuple("Cookies")
                .field(&cookies.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

pub(crate) fn to_payload<T: Serialize>(record: &T) -> Result<Value> {
    serde_json::to_value(record)
        .map_err(|e| FogisError::InvalidArgument(format!("unserializable payload: {}", e)))
}

pub(crate) fn missing_fields(payload: &Value, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|field| payload.get(*field).map_or(true, Value::is_null))
        .collect()
}

pub(crate) fn require_fields(payload: &Value, required: &[&'static str], what: &str) -> Result<()> {
    let missing = missing_fields(payload, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FogisError::InvalidArgument(format!(
            "missing required field(s) in {}: {}",
            what,
            missing.join(", ")
        )))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    #[serde(rename = "matchhandelseid", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<FieldValue>,
    #[serde(rename = "matchid", default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<FieldValue>,
    #[serde(rename = "matchhandelsetypid", default, skip_serializing_if = "Option::is_none")]
    pub event_type_id: Option<FieldValue>,
    #[serde(rename = "matchminut", default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<FieldValue>,
    #[serde(rename = "sekund", default, skip_serializing_if = "Option::is_none")]
    pub second: Option<FieldValue>,
    #[serde(rename = "matchlagid", default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<FieldValue>,
    #[serde(rename = "spelareid", default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<FieldValue>,
    #[serde(rename = "assisterandeid", default, skip_serializing_if = "Option::is_none")]
    pub assist_player_id: Option<FieldValue>,
    #[serde(rename = "spelareid2", default, skip_serializing_if = "Option::is_none")]
    pub second_player_id: Option<FieldValue>,
    #[serde(rename = "matchdeltagareid2", default, skip_serializing_if = "Option::is_none")]
    pub second_participant_id: Option<FieldValue>,
    #[serde(rename = "period", default, skip_serializing_if = "Option::is_none")]
    pub period: Option<FieldValue>,
    #[serde(rename = "hemmamal", default, skip_serializing_if = "Option::is_none")]
    pub home_goals: Option<FieldValue>,
    #[serde(rename = "bortamal", default, skip_serializing_if = "Option::is_none")]
    pub away_goals: Option<FieldValue>,
    #[serde(rename = "planpositionx", default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<FieldValue>,
    #[serde(rename = "planpositiony", default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<FieldValue>,
    #[serde(rename = "relateradTillMatchhandelseID", default, skip_serializing_if = "Option::is_none")]
    pub related_event_id: Option<FieldValue>,
}

impl MatchEvent {
    pub const SUBSTITUTION: i64 = 17;

    pub const REQUIRED: &'static [&'static str] =
        &["matchid", "matchhandelsetypid", "matchminut", "matchlagid", "period"];

    pub fn new(
        match_id: impl Into<FieldValue>,
        event_type_id: impl Into<FieldValue>,
        minute: impl Into<FieldValue>,
        team_id: impl Into<FieldValue>,
        period: impl Into<FieldValue>,
    ) -> Self {
        Self {
            match_id: Some(match_id.into()),
            event_type_id: Some(event_type_id.into()),
            minute: Some(minute.into()),
            team_id: Some(team_id.into()),
            period: Some(period.into()),
            ..Self::default()
        }
    }

    pub fn player(mut self, player_id: impl Into<FieldValue>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    pub fn score(mut self, home: impl Into<FieldValue>, away: impl Into<FieldValue>) -> Self {
        self.home_goals = Some(home.into());
        self.away_goals = Some(away.into());
        self
    }

    pub fn substitution(mut self, player_in: impl Into<FieldValue>, participant_in: impl Into<FieldValue>) -> Self {
        self.second_player_id = Some(player_in.into());
        self.second_participant_id = Some(participant_in.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamOfficialAction {
    #[serde(rename = "matchid", default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<FieldValue>,
    #[serde(rename = "matchlagid", default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<FieldValue>,
    #[serde(rename = "matchlagledareid", default, skip_serializing_if = "Option::is_none")]
    pub official_id: Option<FieldValue>,
    #[serde(rename = "matchlagledaretypid", default, skip_serializing_if = "Option::is_none")]
    pub action_type_id: Option<FieldValue>,
    #[serde(rename = "matchminut", default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<FieldValue>,
}

impl TeamOfficialAction {
    pub const REQUIRED: &'static [&'static str] =
        &["matchid", "matchlagid", "matchlagledareid", "matchlagledaretypid"];

    pub fn new(
        match_id: impl Into<FieldValue>,
        team_id: impl Into<FieldValue>,
        official_id: impl Into<FieldValue>,
        action_type_id: impl Into<FieldValue>,
    ) -> Self {
        Self {
            match_id: Some(match_id.into()),
            team_id: Some(team_id.into()),
            official_id: Some(official_id.into()),
            action_type_id: Some(action_type_id.into()),
            minute: None,
        }
    }

    pub fn at_minute(mut self, minute: impl Into<FieldValue>) -> Self {
        self.minute = Some(minute.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchParticipant {
    #[serde(rename = "matchdeltagareid", default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<FieldValue>,
    #[serde(rename = "trojnummer", default, skip_serializing_if = "Option::is_none")]
    pub jersey_number: Option<FieldValue>,
    #[serde(rename = "lagdelid", default, skip_serializing_if = "Option::is_none")]
    pub team_part_id: Option<FieldValue>,
    #[serde(rename = "positionsnummerhv", default, skip_serializing_if = "Option::is_none")]
    pub position_number: Option<FieldValue>,
    #[serde(rename = "lagkapten", default, skip_serializing_if = "Option::is_none")]
    pub captain: Option<FieldValue>,
    #[serde(rename = "ersattare", default, skip_serializing_if = "Option::is_none")]
    pub substitute: Option<FieldValue>,
    #[serde(rename = "arSpelandeLedare", default, skip_serializing_if = "Option::is_none")]
    pub playing_leader: Option<FieldValue>,
    #[serde(rename = "ansvarig", default, skip_serializing_if = "Option::is_none")]
    pub responsible: Option<FieldValue>,
}

impl MatchParticipant {
    pub const REQUIRED: &'static [&'static str] = &["matchdeltagareid", "trojnummer", "lagdelid"];

    pub fn new(
        participant_id: impl Into<FieldValue>,
        jersey_number: impl Into<FieldValue>,
        team_part_id: impl Into<FieldValue>,
    ) -> Self {
        Self {
            participant_id: Some(participant_id.into()),
            jersey_number: Some(jersey_number.into()),
            team_part_id: Some(team_part_id.into()),
            ..Self::default()
        }
    }

    pub fn captain(mut self, captain: bool) -> Self {
        self.captain = Some(captain.into());
        self
    }

    pub fn substitute(mut self, substitute: bool) -> Self {
        self.substitute = Some(substitute.into());
        self
    }
}

/// Outcome of a roster edit, with the entry read back from the returned roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSaveResult {
    pub success: bool,
    pub verified: bool,
    pub updated_player: Option<Value>,
    pub roster: Vec<Value>,
}

/// A flat result as a caller supplies it, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatResultInput {
    #[serde(rename = "matchid", default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<FieldValue>,
    #[serde(rename = "hemmamal", default, skip_serializing_if = "Option::is_none")]
    pub home_goals: Option<FieldValue>,
    #[serde(rename = "bortamal", default, skip_serializing_if = "Option::is_none")]
    pub away_goals: Option<FieldValue>,
    #[serde(rename = "halvtidHemmamal", default, skip_serializing_if = "Option::is_none")]
    pub half_time_home: Option<FieldValue>,
    #[serde(rename = "halvtidBortamal", default, skip_serializing_if = "Option::is_none")]
    pub half_time_away: Option<FieldValue>,
    #[serde(rename = "forlangningHemmamal", default, skip_serializing_if = "Option::is_none")]
    pub extra_time_home: Option<FieldValue>,
    #[serde(rename = "forlangningBortamal", default, skip_serializing_if = "Option::is_none")]
    pub extra_time_away: Option<FieldValue>,
    #[serde(rename = "straffarHemmamal", default, skip_serializing_if = "Option::is_none")]
    pub penalties_home: Option<FieldValue>,
    #[serde(rename = "straffarBortamal", default, skip_serializing_if = "Option::is_none")]
    pub penalties_away: Option<FieldValue>,
}

impl FlatResultInput {
    pub const REQUIRED: &'static [&'static str] = &["matchid", "hemmamal", "bortamal"];
}

impl From<&FlatMatchResult> for FlatResultInput {
    fn from(flat: &FlatMatchResult) -> Self {
        Self {
            match_id: Some(flat.match_id.into()),
            home_goals: Some(flat.home_goals.into()),
            away_goals: Some(flat.away_goals.into()),
            half_time_home: flat.half_time_home.map(FieldValue::from),
            half_time_away: flat.half_time_away.map(FieldValue::from),
            extra_time_home: flat.extra_time_home.map(FieldValue::from),
            extra_time_away: flat.extra_time_away.map(FieldValue::from),
            penalties_home: flat.penalties_home.map(FieldValue::from),
            penalties_away: flat.penalties_away.map(FieldValue::from),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRecordInput {
    #[serde(rename = "matchid", default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<FieldValue>,
    #[serde(rename = "matchresultattypid", default, skip_serializing_if = "Option::is_none")]
    pub period: Option<FieldValue>,
    #[serde(rename = "matchlag1mal", default, skip_serializing_if = "Option::is_none")]
    pub home_goals: Option<FieldValue>,
    #[serde(rename = "matchlag2mal", default, skip_serializing_if = "Option::is_none")]
    pub away_goals: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wo: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ow: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ww: Option<FieldValue>,
}

impl From<&ResultPeriod> for ResultRecordInput {
    fn from(record: &ResultPeriod) -> Self {
        Self {
            match_id: Some(record.match_id.into()),
            period: Some(i64::from(record.period).into()),
            home_goals: Some(record.home_goals.into()),
            away_goals: Some(record.away_goals.into()),
            wo: Some(record.wo.into()),
            ow: Some(record.ow.into()),
            ww: Some(record.ww.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchResultInput {
    Nested {
        #[serde(rename = "matchresultatListaJSON")]
        records: Vec<ResultRecordInput>,
    },
    Flat(FlatResultInput),
}

impl From<FlatMatchResult> for MatchResultInput {
    fn from(flat: FlatMatchResult) -> Self {
        MatchResultInput::Flat(FlatResultInput::from(&flat))
    }
}

impl From<FlatResultInput> for MatchResultInput {
    fn from(flat: FlatResultInput) -> Self {
        MatchResultInput::Flat(flat)
    }
}

impl From<Vec<ResultPeriod>> for MatchResultInput {
    fn from(records: Vec<ResultPeriod>) -> Self {
        MatchResultInput::Nested {
            records: records.iter().map(ResultRecordInput::from).collect(),
        }
    }
}

impl MatchResultInput {
    pub(crate) fn nested_payload(records: &[ResultRecordInput]) -> Result<Value> {
        let mut payload = serde_json::Map::new();
        payload.insert(RESULT_LIST_KEY.to_string(), to_payload(&records)?);
        Ok(Value::Object(payload))
    }
}

/// Filter sent as `filter` to `GetMatcherAttRapportera`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchListFilter {
    #[serde(rename = "datumFran", default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(rename = "datumTill", default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(rename = "datumTyp", default, skip_serializing_if = "Option::is_none")]
    pub date_type: Option<i64>,
    #[serde(rename = "typ", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
    #[serde(rename = "alderskategori", default, skip_serializing_if = "Vec::is_empty")]
    pub age_categories: Vec<i64>,
    #[serde(rename = "kon", default, skip_serializing_if = "Vec::is_empty")]
    pub genders: Vec<i64>,
    #[serde(rename = "sparadDatum", default, skip_serializing_if = "Option::is_none")]
    pub saved_date: Option<NaiveDate>,
}

impl MatchListFilter {
    pub const DEFAULT_WINDOW_DAYS: i64 = 7;

    /// Window from `today` to a week ahead, with the adapter's cancelled/postponed status set.
    pub fn adapter_default(today: NaiveDate) -> Self {
        Self {
            from: Some(today),
            to: Some(today + Duration::days(Self::DEFAULT_WINDOW_DAYS)),
            date_type: Some(0),
            kind: Some("alla".to_string()),
            status: vec![
                "avbruten".to_string(),
                "uppskjuten".to_string(),
                "installd".to_string(),
            ],
            age_categories: vec![1, 2, 3, 4, 5],
            genders: vec![3, 2, 4],
            saved_date: Some(today),
        }
    }

    /// The older surface's default: unreported and in-progress matches this week.
    pub fn legacy_default(today: NaiveDate) -> Self {
        Self {
            from: Some(today),
            to: Some(today + Duration::days(Self::DEFAULT_WINDOW_DAYS)),
            date_type: Some(1),
            status: vec![
                "Ej rapporterad".to_string(),
                "Påbörjad rapportering".to_string(),
            ],
            ..Self::default()
        }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn with_status<I, S>(mut self, status: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.status = status.into_iter().map(Into::into).collect();
        self
    }
}
