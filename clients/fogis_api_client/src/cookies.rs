//! Cookie name normalization.
//!
//! The upstream issues cookies with dotted names (`ASP.NET_SessionId`). The
//! public surface of this crate uses underscored names so the keys survive
//! contexts where dots are awkward. Both directions drop empty values instead
//! of emitting empty-string keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SERVER_AUTH: &str = "FogisMobilDomarKlient.ASPXAUTH";
pub const SERVER_SESSION: &str = "ASP.NET_SessionId";
pub const PUBLIC_AUTH: &str = "FogisMobilDomarKlient_ASPXAUTH";
pub const PUBLIC_SESSION: &str = "ASP_NET_SessionId";

pub type CookieMap = BTreeMap<String, String>;

fn pick<'a>(cookies: &'a CookieMap, preferred: &str, fallback: &str) -> Option<&'a String> {
    cookies
        .get(preferred)
        .filter(|value| !value.is_empty())
        .or_else(|| cookies.get(fallback).filter(|value| !value.is_empty()))
}

pub fn to_public(cookies: &CookieMap) -> CookieMap {
    let mut result = CookieMap::new();
    if let Some(auth) = pick(cookies, PUBLIC_AUTH, SERVER_AUTH) {
        result.insert(PUBLIC_AUTH.to_string(), auth.clone());
    }
    if let Some(session) = pick(cookies, PUBLIC_SESSION, SERVER_SESSION) {
        result.insert(PUBLIC_SESSION.to_string(), session.clone());
    }
    result
}

pub fn to_server(cookies: &CookieMap) -> CookieMap {
    let mut result = CookieMap::new();
    if let Some(auth) = pick(cookies, PUBLIC_AUTH, SERVER_AUTH) {
        result.insert(SERVER_AUTH.to_string(), auth.clone());
    }
    if let Some(session) = pick(cookies, PUBLIC_SESSION, SERVER_SESSION) {
        result.insert(SERVER_SESSION.to_string(), session.clone());
    }
    result
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePair {
    pub auth: Option<String>,
    pub session_id: Option<String>,
}

impl CookiePair {
    /// Reads a pair from a map in either naming. Empty values count as absent.
    pub fn from_map(cookies: &CookieMap) -> Self {
        let public = to_public(cookies);
        Self {
            auth: public.get(PUBLIC_AUTH).cloned(),
            session_id: public.get(PUBLIC_SESSION).cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.auth.is_none() && self.session_id.is_none()
    }

    pub fn to_public(&self) -> CookieMap {
        let mut map = CookieMap::new();
        if let Some(auth) = &self.auth {
            map.insert(PUBLIC_AUTH.to_string(), auth.clone());
        }
        if let Some(session) = &self.session_id {
            map.insert(PUBLIC_SESSION.to_string(), session.clone());
        }
        map
    }

    pub fn to_server(&self) -> CookieMap {
        to_server(&self.to_public())
    }

    /// Renders the pair as a `Cookie` request header value in server form.
    pub fn header_value(&self) -> String {
        self.to_server()
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
