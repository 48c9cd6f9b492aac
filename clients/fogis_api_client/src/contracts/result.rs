use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::error::{FogisError, Result};

/// Period identifiers used by `matchresultattypid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PeriodType {
    FullTime = 1,
    HalfTime = 2,
    ExtraTime = 3,
    Penalties = 4,
}

impl TryFrom<i64> for PeriodType {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(PeriodType::FullTime),
            2 => Ok(PeriodType::HalfTime),
            3 => Ok(PeriodType::ExtraTime),
            4 => Ok(PeriodType::Penalties),
            other => Err(format!("unknown result period type {}", other)),
        }
    }
}

impl From<PeriodType> for i64 {
    fn from(period: PeriodType) -> Self {
        period as i64
    }
}

/// One score with named fields per period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatMatchResult {
    #[serde(rename = "matchid")]
    pub match_id: i64,
    #[serde(rename = "hemmamal")]
    pub home_goals: i64,
    #[serde(rename = "bortamal")]
    pub away_goals: i64,
    #[serde(rename = "halvtidHemmamal", default, skip_serializing_if = "Option::is_none")]
    pub half_time_home: Option<i64>,
    #[serde(rename = "halvtidBortamal", default, skip_serializing_if = "Option::is_none")]
    pub half_time_away: Option<i64>,
    #[serde(rename = "forlangningHemmamal", default, skip_serializing_if = "Option::is_none")]
    pub extra_time_home: Option<i64>,
    #[serde(rename = "forlangningBortamal", default, skip_serializing_if = "Option::is_none")]
    pub extra_time_away: Option<i64>,
    #[serde(rename = "straffarHemmamal", default, skip_serializing_if = "Option::is_none")]
    pub penalties_home: Option<i64>,
    #[serde(rename = "straffarBortamal", default, skip_serializing_if = "Option::is_none")]
    pub penalties_away: Option<i64>,
}

impl FlatMatchResult {
    pub fn new(match_id: i64, home_goals: i64, away_goals: i64) -> Self {
        Self {
            match_id,
            home_goals,
            away_goals,
            half_time_home: None,
            half_time_away: None,
            extra_time_home: None,
            extra_time_away: None,
            penalties_home: None,
            penalties_away: None,
        }
    }

    pub fn with_half_time(mut self, home: i64, away: i64) -> Self {
        self.half_time_home = Some(home);
        self.half_time_away = Some(away);
        self
    }

    pub fn with_extra_time(mut self, home: i64, away: i64) -> Self {
        self.extra_time_home = Some(home);
        self.extra_time_away = Some(away);
        self
    }

    pub fn with_penalties(mut self, home: i64, away: i64) -> Self {
        self.penalties_home = Some(home);
        self.penalties_away = Some(away);
        self
    }
}

/// One entry of `matchresultatListaJSON`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPeriod {
    #[serde(rename = "matchid")]
    pub match_id: i64,
    #[serde(rename = "matchresultattypid")]
    pub period: PeriodType,
    #[serde(rename = "matchlag1mal")]
    pub home_goals: i64,
    #[serde(rename = "matchlag2mal")]
    pub away_goals: i64,
    #[serde(default)]
    pub wo: bool,
    #[serde(default)]
    pub ow: bool,
    #[serde(default)]
    pub ww: bool,
}

impl ResultPeriod {
    fn new(match_id: i64, period: PeriodType, home_goals: i64, away_goals: i64) -> Self {
        Self {
            match_id,
            period,
            home_goals,
            away_goals,
            wo: false,
            ow: false,
            ww: false,
        }
    }
}

fn optional_period(
    match_id: i64,
    period: PeriodType,
    home: Option<i64>,
    away: Option<i64>,
) -> Option<ResultPeriod> {
    if home.is_none() && away.is_none() {
        return None;
    }
    Some(ResultPeriod::new(
        match_id,
        period,
        home.unwrap_or(0),
        away.unwrap_or(0),
    ))
}

/// Expands a flat result into per-period records.
///
/// Full time and half time are always present (absent half-time scores become
/// 0-0); extra time and penalties appear only when one of their scores is set.
pub fn flat_to_nested(flat: &FlatMatchResult) -> Vec<ResultPeriod> {
    let mut periods = vec![
        ResultPeriod::new(flat.match_id, PeriodType::FullTime, flat.home_goals, flat.away_goals),
        ResultPeriod::new(
            flat.match_id,
            PeriodType::HalfTime,
            flat.half_time_home.unwrap_or(0),
            flat.half_time_away.unwrap_or(0),
        ),
    ];
    periods.extend(optional_period(
        flat.match_id,
        PeriodType::ExtraTime,
        flat.extra_time_home,
        flat.extra_time_away,
    ));
    periods.extend(optional_period(
        flat.match_id,
        PeriodType::Penalties,
        flat.penalties_home,
        flat.penalties_away,
    ));
    periods
}

/// Collapses per-period records into a flat result. Requires a full-time record.
pub fn nested_to_flat(nested: &[ResultPeriod]) -> Result<FlatMatchResult> {
    let find = |period: PeriodType| nested.iter().find(|record| record.period == period);

    let full_time = find(PeriodType::FullTime).ok_or_else(|| {
        FogisError::DataError("result list has no full-time record (matchresultattypid 1)".to_string())
    })?;

    let mut flat = FlatMatchResult::new(full_time.match_id, full_time.home_goals, full_time.away_goals);
    if let Some(half_time) = find(PeriodType::HalfTime) {
        flat = flat.with_half_time(half_time.home_goals, half_time.away_goals);
    }
    if let Some(extra_time) = find(PeriodType::ExtraTime) {
        flat = flat.with_extra_time(extra_time.home_goals, extra_time.away_goals);
    }
    if let Some(penalties) = find(PeriodType::Penalties) {
        flat = flat.with_penalties(penalties.home_goals, penalties.away_goals);
    }
    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_full_time_only_produces_two_records() {
        let nested = flat_to_nested(&FlatMatchResult::new(7, 3, 2));
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0].period, PeriodType::FullTime);
        assert_eq!(nested[1].period, PeriodType::HalfTime);
        assert_eq!((nested[1].home_goals, nested[1].away_goals), (0, 0));
    }

    #[test]
    fn test_extra_time_and_penalties_in_ascending_order() {
        let flat = FlatMatchResult::new(7, 2, 2)
            .with_half_time(1, 1)
            .with_extra_time(3, 3)
            .with_penalties(5, 4);
        let nested = flat_to_nested(&flat);
        let periods: Vec<i64> = nested.iter().map(|r| i64::from(r.period)).collect();
        assert_eq!(periods, vec![1, 2, 3, 4]);
        assert_eq!((nested[2].home_goals, nested[2].away_goals), (3, 3));
        assert_eq!((nested[3].home_goals, nested[3].away_goals), (5, 4));
    }

    #[test]
    fn test_single_sided_extra_time_defaults_other_side() {
        let mut flat = FlatMatchResult::new(7, 1, 1);
        flat.extra_time_home = Some(2);
        let nested = flat_to_nested(&flat);
        assert_eq!(nested.len(), 3);
        assert_eq!((nested[2].home_goals, nested[2].away_goals), (2, 0));
    }

    #[test]
    fn test_wire_shape_of_nested_records() {
        let flat = FlatMatchResult::new(12345, 2, 1).with_half_time(1, 0);
        let wire = serde_json::to_value(flat_to_nested(&flat)).unwrap();
        assert_eq!(
            wire,
            json!([
                {"matchid": 12345, "matchresultattypid": 1, "matchlag1mal": 2, "matchlag2mal": 1,
                 "wo": false, "ow": false, "ww": false},
                {"matchid": 12345, "matchresultattypid": 2, "matchlag1mal": 1, "matchlag2mal": 0,
                 "wo": false, "ow": false, "ww": false}
            ])
        );
    }

    #[test]
    fn test_round_trip_recovers_full_and_half_time() {
        for (home, away, ht_home, ht_away) in [(0, 0, 0, 0), (4, 1, 2, 1), (10, 9, 5, 7)] {
            let flat = FlatMatchResult::new(99, home, away).with_half_time(ht_home, ht_away);
            assert_eq!(nested_to_flat(&flat_to_nested(&flat)).unwrap(), flat);
        }
    }

    #[test]
    fn test_nested_without_full_time_is_an_error() {
        let nested = vec![ResultPeriod::new(1, PeriodType::HalfTime, 1, 0)];
        assert!(matches!(nested_to_flat(&nested), Err(FogisError::DataError(_))));
    }

    #[test]
    fn test_unknown_period_type_is_rejected() {
        let parsed: std::result::Result<ResultPeriod, _> = serde_json::from_value(json!({
            "matchid": 1, "matchresultattypid": 9, "matchlag1mal": 0, "matchlag2mal": 0
        }));
        assert!(parsed.is_err());
    }
}
