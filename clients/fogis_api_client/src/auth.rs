use reqwest::header::{HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::{debug, info, warn, Span};

use crate::config::ClientConfig;
use crate::cookies::{CookiePair, SERVER_AUTH, SERVER_SESSION};
use crate::error::{FogisError, LoginFailure, Result};
use crate::session::HttpSession;

pub const VIEWSTATE: &str = "__VIEWSTATE";
pub const EVENTVALIDATION: &str = "__EVENTVALIDATION";

pub const USERNAME_FIELD: &str = "ctl00$MainContent$UserName";
pub const PASSWORD_FIELD: &str = "ctl00$MainContent$Password";
pub const LOGIN_BUTTON_FIELD: &str = "ctl00$MainContent$LoginButton";
pub const LOGIN_BUTTON_VALUE: &str = "Logga in";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSelectors {
    pub form: String,
    pub username: String,
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self {
            form: "form#aspnetForm".to_string(),
            username: format!("input[name='{}']", USERNAME_FIELD),
        }
    }
}

fn selector(css: &str) -> std::result::Result<Selector, LoginFailure> {
    Selector::parse(css)
        .map_err(|e| LoginFailure::LoginFormNotFound(format!("invalid selector {}: {:?}", css, e)))
}

fn has_hidden_input(form: &ElementRef<'_>, name: &str) -> std::result::Result<bool, LoginFailure> {
    let token = selector(&format!("input[type='hidden'][name='{}']", name))?;
    Ok(form.select(&token).next().is_some())
}

/// Extracts the hidden inputs of the login form.
///
/// Fails when the form or its username field is missing, or when either
/// anti-forgery token is absent.
pub fn scrape_login_form(
    html: &str,
    selectors: &LoginSelectors,
) -> std::result::Result<BTreeMap<String, String>, LoginFailure> {
    let document = Html::parse_document(html);
    let form_selector = selector(&selectors.form)?;
    let username_selector = selector(&selectors.username)?;
    let hidden_selector = selector("input[type='hidden']")?;

    let form = document.select(&form_selector).next().ok_or_else(|| {
        LoginFailure::LoginFormNotFound(format!("no element matches {}", selectors.form))
    })?;

    if form.select(&username_selector).next().is_none() {
        return Err(LoginFailure::LoginFormNotFound(format!(
            "no username field matches {} in the login form",
            selectors.username
        )));
    }

    let fields: BTreeMap<String, String> = form
        .select(&hidden_selector)
        .filter_map(|input| {
            let name = input.value().attr("name").filter(|name| !name.is_empty())?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    for token in [VIEWSTATE, EVENTVALIDATION] {
        if !has_hidden_input(&form, token)? {
            return Err(LoginFailure::MissingToken(token.to_string()));
        }
    }

    Ok(fields)
}

pub struct Authenticator {
    login_url: String,
    selectors: LoginSelectors,
    span: Span,
}

impl Authenticator {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            login_url: config.login_url(),
            selectors: LoginSelectors::default(),
            span: tracing::info_span!("fogis_auth"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_selectors(mut self, selectors: LoginSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    fn apply_browser_headers(session: &mut HttpSession) {
        let headers = [
            (USER_AGENT, BROWSER_USER_AGENT),
            (ACCEPT, BROWSER_ACCEPT),
            (ACCEPT_LANGUAGE, "sv-SE,sv;q=0.9,en;q=0.8"),
            (CONNECTION, "keep-alive"),
            (HeaderName::from_static("upgrade-insecure-requests"), "1"),
        ];
        for (name, value) in headers {
            session.set_default_header(name, HeaderValue::from_static(value));
        }
    }

    /// Runs the login handshake and returns the issued cookie pair.
    ///
    /// Leaves browser-like default headers on `session` as a side effect.
    pub fn authenticate(
        &self,
        session: &mut HttpSession,
        username: &str,
        password: &str,
    ) -> Result<CookiePair> {
        let _guard = self.span.enter();
        info!("Logging in at {}", self.login_url);

        Self::apply_browser_headers(session);

        let page = session
            .get(&self.login_url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| FogisError::request("fetching login page", e))?;

        let mut form = scrape_login_form(&page, &self.selectors).map_err(|failure| {
            warn!("Login page not usable: {}", failure);
            failure
        })?;
        debug!("Scraped login form with {} fields", form.len());

        form.insert(USERNAME_FIELD.to_string(), username.to_string());
        form.insert(PASSWORD_FIELD.to_string(), password.to_string());
        form.insert(LOGIN_BUTTON_FIELD.to_string(), LOGIN_BUTTON_VALUE.to_string());

        session
            .post(&self.login_url)
            .form(&form)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| FogisError::request("submitting login form", e))?;

        let auth = match session.cookie(&self.login_url, SERVER_AUTH) {
            Some(auth) if !auth.is_empty() => auth,
            _ => {
                warn!("Login rejected, no auth cookie issued");
                return Err(LoginFailure::InvalidCredentials.into());
            }
        };

        info!("Login succeeded");
        Ok(CookiePair {
            auth: Some(auth),
            session_id: session.cookie(&self.login_url, SERVER_SESSION),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use mockito::Matcher;

    fn login_page(hidden: &[(&str, &str)]) -> String {
        let inputs: String = hidden
            .iter()
            .map(|(name, value)| format!(r#"<input type="hidden" name="{}" value="{}" />"#, name, value))
            .collect();
        format!(
            r#"<html><body><form id="aspnetForm" method="post">{}
<input name="ctl00$MainContent$UserName" type="text" />
<input name="ctl00$MainContent$Password" type="password" />
<input type="submit" name="ctl00$MainContent$LoginButton" value="Logga in" />
</form></body></html>"#,
            inputs
        )
    }

    fn full_page() -> String {
        login_page(&[
            ("__VIEWSTATE", "vs"),
            ("__VIEWSTATEGENERATOR", "gen"),
            ("__EVENTVALIDATION", "ev"),
        ])
    }

    fn setup(server: &mockito::ServerGuard) -> (Authenticator, HttpSession) {
        let config = ClientConfig::with_base_url(format!("{}/mdk", server.url()));
        let session = HttpSession::new(&HttpConfig::default()).unwrap();
        (Authenticator::new(&config), session)
    }

    #[test]
    fn test_scrape_collects_hidden_fields() {
        let fields = scrape_login_form(&full_page(), &LoginSelectors::default()).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get("__VIEWSTATE").map(String::as_str), Some("vs"));
    }

    #[test]
    fn test_scrape_reports_missing_token() {
        let page = login_page(&[("__VIEWSTATE", "vs")]);
        assert_eq!(
            scrape_login_form(&page, &LoginSelectors::default()),
            Err(LoginFailure::MissingToken("__EVENTVALIDATION".to_string()))
        );
    }

    #[test]
    fn test_scrape_treats_wrong_username_selector_as_missing_form() {
        let selectors = LoginSelectors {
            username: "input[name='Email']".to_string(),
            ..LoginSelectors::default()
        };
        assert!(matches!(
            scrape_login_form(&full_page(), &selectors),
            Err(LoginFailure::LoginFormNotFound(_))
        ));
    }

    #[test]
    fn test_authenticate_success() {
        let mut server = mockito::Server::new();
        let page = server
            .mock("GET", Matcher::Regex(r"^/mdk/Login\.aspx".to_string()))
            .with_status(200)
            .with_header("set-cookie", "ASP.NET_SessionId=sid123; path=/")
            .with_body(full_page())
            .create();
        let submit = server
            .mock("POST", Matcher::Regex(r"^/mdk/Login\.aspx".to_string()))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("__VIEWSTATE".to_string(), "vs".to_string()),
                Matcher::UrlEncoded("__EVENTVALIDATION".to_string(), "ev".to_string()),
                Matcher::UrlEncoded(USERNAME_FIELD.to_string(), "ref".to_string()),
                Matcher::UrlEncoded(PASSWORD_FIELD.to_string(), "secret".to_string()),
                Matcher::UrlEncoded(LOGIN_BUTTON_FIELD.to_string(), "Logga in".to_string()),
            ]))
            .with_status(200)
            .with_header("set-cookie", "FogisMobilDomarKlient.ASPXAUTH=token456; path=/")
            .with_body("<html>welcome</html>")
            .create();

        let (auth, mut session) = setup(&server);
        let pair = auth.authenticate(&mut session, "ref", "secret").unwrap();

        assert_eq!(pair.auth.as_deref(), Some("token456"));
        assert_eq!(pair.session_id.as_deref(), Some("sid123"));
        assert!(session.default_headers().contains_key(ACCEPT_LANGUAGE));
        page.assert();
        submit.assert();
    }

    #[test]
    fn test_missing_event_validation_issues_no_post() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", Matcher::Regex(r"^/mdk/Login\.aspx".to_string()))
            .with_status(200)
            .with_body(login_page(&[("__VIEWSTATE", "vs")]))
            .create();
        let submit = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create();

        let (auth, mut session) = setup(&server);
        let err = auth.authenticate(&mut session, "ref", "secret").unwrap_err();

        assert!(matches!(
            err,
            FogisError::LoginFailed(LoginFailure::MissingToken(ref token)) if token == "__EVENTVALIDATION"
        ));
        assert!(err.to_string().contains("__EVENTVALIDATION"));
        submit.assert();
    }

    #[test]
    fn test_missing_form_is_reported() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", Matcher::Regex(r"^/mdk/Login\.aspx".to_string()))
            .with_status(200)
            .with_body("<html><body>maintenance</body></html>")
            .create();

        let (auth, mut session) = setup(&server);
        let err = auth.authenticate(&mut session, "ref", "secret").unwrap_err();
        assert!(matches!(
            err,
            FogisError::LoginFailed(LoginFailure::LoginFormNotFound(_))
        ));
    }

    #[test]
    fn test_no_auth_cookie_means_invalid_credentials() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", Matcher::Regex(r"^/mdk/Login\.aspx".to_string()))
            .with_status(200)
            .with_body(full_page())
            .create();
        server
            .mock("POST", Matcher::Regex(r"^/mdk/Login\.aspx".to_string()))
            .with_status(200)
            .with_body(full_page())
            .create();

        let (auth, mut session) = setup(&server);
        let err = auth.authenticate(&mut session, "ref", "wrong").unwrap_err();
        assert!(matches!(
            err,
            FogisError::LoginFailed(LoginFailure::InvalidCredentials)
        ));
    }

    #[test]
    fn test_login_page_error_status_is_a_request_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", Matcher::Regex(r"^/mdk/Login\.aspx".to_string()))
            .with_status(503)
            .create();

        let (auth, mut session) = setup(&server);
        let err = auth.authenticate(&mut session, "ref", "secret").unwrap_err();
        assert!(matches!(err, FogisError::RequestFailed { .. }));
    }
}
