use axum::{
    extract::{Form, State},
    http::{
        header::{COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderName, StatusCode, Uri,
    },
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{info, warn};

use super::MockServerState;
use crate::auth::{
    EVENTVALIDATION, LOGIN_BUTTON_FIELD, LOGIN_BUTTON_VALUE, PASSWORD_FIELD, USERNAME_FIELD,
    VIEWSTATE,
};
use crate::cookies::{CookieMap, SERVER_AUTH, SERVER_SESSION};

const LOGIN_PATH: &str = "/mdk/Login.aspx?ReturnUrl=%2fmdk%2f";
const VIEWSTATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";

pub(crate) fn token(seed: &str) -> String {
    format!("{:x}", Sha256::digest(seed.as_bytes()))
}

/// Cookies sent with a request, merged across `Cookie` headers.
pub(crate) fn request_cookies(headers: &HeaderMap) -> CookieMap {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

pub(crate) fn has_auth_cookie(headers: &HeaderMap) -> bool {
    request_cookies(headers)
        .get(SERVER_AUTH)
        .map_or(false, |value| !value.is_empty())
}

fn set_cookie(name: &str, value: &str) -> (HeaderName, String) {
    (SET_COOKIE, format!("{}={}; path=/; HttpOnly", name, value))
}

fn hidden_input(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{}" id="{}" value="{}" />"#,
        name,
        name,
        html_escape::encode_double_quoted_attribute(value)
    )
}

fn form_field<'a>(form: &'a HashMap<String, String>, name: &str) -> &'a str {
    form.get(name).map(String::as_str).unwrap_or_default()
}

fn login_page(state: &MockServerState, error: Option<&str>) -> String {
    let seed = state.next_id();
    let hidden: String = [
        (VIEWSTATE, token(&format!("viewstate-{}", seed))),
        (VIEWSTATE_GENERATOR, "C2EE9ABB".to_string()),
        (EVENTVALIDATION, token(&format!("eventvalidation-{}", seed))),
    ]
    .iter()
    .map(|(name, value)| hidden_input(name, value))
    .collect();
    let error = error.map_or_else(String::new, |message| {
        format!(
            r#"<div class="validation-summary-errors">{}</div>"#,
            html_escape::encode_text(message)
        )
    });

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8" />
    <title>FOGIS - Logga in</title>
</head>
<body>
    <form method="post" action="./Login.aspx?ReturnUrl=%2fmdk%2f" id="aspnetForm">
        {hidden}
        {error}
        <label for="UserName">Användarnamn</label>
        <input name="{username}" type="text" id="UserName" />
        <label for="Password">Lösenord</label>
        <input name="{password}" type="password" id="Password" />
        <input type="submit" name="{button}" value="{button_value}" id="LoginButton" />
    </form>
</body>
</html>"#,
        hidden = hidden,
        error = error,
        username = USERNAME_FIELD,
        password = PASSWORD_FIELD,
        button = LOGIN_BUTTON_FIELD,
        button_value = LOGIN_BUTTON_VALUE,
    )
}

pub async fn login_page_handler(State(state): State<MockServerState>, uri: Uri) -> Response {
    state.history.record("GET", uri.path(), Value::Null);
    let session = token(&format!("session-{}", state.next_id()));
    (
        AppendHeaders([set_cookie(SERVER_SESSION, &session)]),
        Html(login_page(&state, None)),
    )
        .into_response()
}

#[axum::debug_handler]
pub async fn login_submit_handler(
    State(state): State<MockServerState>,
    headers: HeaderMap,
    uri: Uri,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let recorded: Map<String, Value> = form
        .iter()
        .map(|(name, value)| {
            let value = if name == PASSWORD_FIELD { "********" } else { value.as_str() };
            (name.clone(), Value::String(value.to_string()))
        })
        .collect();
    state.history.record("POST", uri.path(), Value::Object(recorded));

    let tokens_present =
        !form_field(&form, VIEWSTATE).is_empty() && !form_field(&form, EVENTVALIDATION).is_empty();
    let username = form_field(&form, USERNAME_FIELD);
    let credentials_match = username == state.config.username
        && form_field(&form, PASSWORD_FIELD) == state.config.password;

    if !tokens_present || !credentials_match {
        warn!("Rejected login attempt (tokens present: {})", tokens_present);
        return (
            StatusCode::OK,
            Html(login_page(&state, Some("Felaktigt användarnamn eller lösenord"))),
        )
            .into_response();
    }

    info!("Login accepted for {}", username);
    let auth = token(&format!("auth-{}-{}", username, state.next_id()));
    let mut cookies = vec![set_cookie(SERVER_AUTH, &auth)];
    if !request_cookies(&headers).contains_key(SERVER_SESSION) {
        let session = token(&format!("session-{}", state.next_id()));
        cookies.push(set_cookie(SERVER_SESSION, &session));
    }
    (StatusCode::FOUND, [(LOCATION, "/mdk/")], AppendHeaders(cookies)).into_response()
}

/// The start page of the application, or a redirect to the login page.
pub async fn home_handler(
    State(state): State<MockServerState>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    state.history.record("GET", uri.path(), Value::Null);
    if !has_auth_cookie(&headers) {
        return (StatusCode::FOUND, [(LOCATION, LOGIN_PATH)]).into_response();
    }
    Html(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8" /><title>FOGIS Domarrapport</title></head>
<body><h1>Välkommen till FOGIS</h1><div id="matchlista"></div></body>
</html>"#,
    )
    .into_response()
}
