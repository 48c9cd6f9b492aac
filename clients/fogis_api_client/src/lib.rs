pub mod auth;
pub mod client;
pub mod config;
pub mod contracts;
pub mod cookies;
pub mod error;
pub mod legacy;
pub mod mock_server;
pub mod session;
pub mod types;

pub use client::{CompleteMatch, FogisApiClient, MatchReportingApi};
pub use config::{ClientConfig, HttpConfig, MockServerConfig};
pub use contracts::{Endpoint, FlatMatchResult, PeriodType, ResultPeriod};
pub use error::{FogisError, LoginFailure, Result};
pub use legacy::{LegacyClient, LegacyError, LegacyOfficialAction, LegacyReportingApi};
pub use mock_server::{MockFogisServer, MockServerHandle};
pub use types::{
    Credentials, FieldValue, MatchEvent, MatchListFilter, MatchParticipant, MatchResultInput,
    ParticipantSaveResult, TeamOfficialAction,
};
