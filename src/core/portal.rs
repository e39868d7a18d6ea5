use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use reqwest_middleware::ClientWithMiddleware;
use url::Url;

use crate::core::login_page::{self, LoginForm};
use crate::error::{ScrapeError, ScrapeResult};
use crate::http::log_middleware::RequestLogMiddleware;
use crate::model::credentials::Credentials;
use crate::utils::snapshot::Snapshots;

pub const DEFAULT_BASE_URL: &str = "https://www.timetable.ul.ie/";
pub const LOGIN_PATH: &str = "Login.aspx?ReturnUrl=%2fUA%2fDefault.aspx";
pub const TIMETABLE_LINK_TEXT: &str = "Student Timetable";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: Url,
    /// Applied to every request of the login sequence.
    pub timeout: Duration,
    pub snapshots: Snapshots,
}

impl PortalConfig {
    pub fn login_url(&self) -> ScrapeResult<Url> {
        Ok(self.base_url.join(LOGIN_PATH)?)
    }
}

/// A fetched page and the address it was finally served from.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub html: String,
}

/// Session against the timetable portal.
pub struct Portal {
    client: ClientWithMiddleware,
    cookie_store: Arc<CookieStoreMutex>,
    config: PortalConfig,
}

impl Portal {
    pub fn new(config: PortalConfig) -> ScrapeResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let cookie_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));

        let client = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&cookie_store))
            .timeout(config.timeout)
            .build()?;
        let client = reqwest_middleware::ClientBuilder::new(client)
            .with(RequestLogMiddleware)
            .build();

        Ok(Portal {
            client,
            cookie_store,
            config,
        })
    }

    /// Logs in and returns the HTML of the Student Timetable page.
    ///
    /// Every step that fails leaves the last page it saw in the snapshots
    /// directory.
    pub async fn fetch_timetable(&self, credentials: &Credentials) -> ScrapeResult<String> {
        let login_url = self.config.login_url()?;

        let login_page = self
            .get(login_url)
            .await
            .map_err(|err| self.fail("login_page", None, err))?;
        self.config.snapshots.save_action("login_page", &login_page.html);

        let form = login_page::parse_login_form(&login_page.html, &login_page.url)
            .map_err(|err| self.fail("login_form", Some(&login_page.html), err))?;

        info!("Logging in for user: {}", credentials.username);
        let dashboard = self
            .submit(&form, credentials)
            .await
            .map_err(|err| self.fail("login_button", Some(&login_page.html), err))?;
        self.config.snapshots.save_action("after_login", &dashboard.html);

        if login_page::has_password_field(&dashboard.html) {
            let err = ScrapeError::new("Login failed: the portal showed the login form again");
            return Err(self.fail("login_rejected", Some(&dashboard.html), err));
        }
        debug!("Session holds {} cookies", self.cookie_count());

        let timetable_url =
            login_page::find_link(&dashboard.html, &dashboard.url, TIMETABLE_LINK_TEXT)
                .map_err(|err| self.fail("timetable_link", Some(&dashboard.html), err))?;

        info!("Navigating to Student Timetable page...");
        let timetable = self
            .get(timetable_url)
            .await
            .map_err(|err| self.fail("timetable_page", Some(&dashboard.html), err))?;
        self.config.snapshots.save_action("content_capture", &timetable.html);

        info!("Successfully retrieved timetable HTML.");
        Ok(timetable.html)
    }

    async fn get(&self, url: Url) -> ScrapeResult<Page> {
        let response = self.client.get(url).send().await?;
        read_page(response).await
    }

    async fn submit(&self, form: &LoginForm, credentials: &Credentials) -> ScrapeResult<Page> {
        let response = self
            .client
            .post(form.action.clone())
            .form(&form.fill(credentials))
            .send()
            .await?;
        read_page(response).await
    }

    fn cookie_count(&self) -> usize {
        match self.cookie_store.lock() {
            Ok(store) => store.iter_any().count(),
            Err(_) => 0,
        }
    }

    fn fail(&self, step: &str, page: Option<&str>, err: ScrapeError) -> ScrapeError {
        if let Some(html) = page {
            self.config.snapshots.save_error(step, html);
        }
        if is_timeout(&err) {
            error!("Timeout error during {}: {}", step, err);
        } else {
            error!("Step {} failed: {}", step, err);
        }
        err.context(&format!("Portal step {} failed", step))
    }
}

async fn read_page(response: Response) -> ScrapeResult<Page> {
    let response = response.error_for_status()?;
    let url = response.url().clone();
    let html = response.text().await?;
    Ok(Page { url, html })
}

fn is_timeout(err: &ScrapeError) -> bool {
    let Some(source) = err.source_error() else {
        return false;
    };
    if let Some(err) = source.downcast_ref::<reqwest::Error>() {
        return err.is_timeout();
    }
    matches!(
        source.downcast_ref::<reqwest_middleware::Error>(),
        Some(reqwest_middleware::Error::Reqwest(err)) if err.is_timeout()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PortalConfig {
        PortalConfig {
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
            timeout: DEFAULT_TIMEOUT,
            snapshots: Snapshots::disabled(),
        }
    }

    #[test]
    fn login_url_is_under_base() {
        assert_eq!(
            config().login_url().unwrap().as_str(),
            "https://www.timetable.ul.ie/Login.aspx?ReturnUrl=%2fUA%2fDefault.aspx"
        );
    }

    #[test]
    fn plain_errors_are_not_timeouts() {
        assert!(!is_timeout(&ScrapeError::new("Login failed")));
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(!is_timeout(&ScrapeError::from(io)));
    }

    #[tokio::test]
    async fn unreachable_portal_is_an_error_value() {
        let mut config = config();
        config.base_url = Url::parse("http://127.0.0.1:9/").unwrap();
        config.timeout = Duration::from_secs(2);
        let portal = Portal::new(config).unwrap();
        let credentials = Credentials {
            username: "mock_user".into(),
            password: "mock_pass".into(),
        };
        let err = portal.fetch_timetable(&credentials).await.unwrap_err();
        assert!(err.message.starts_with("Portal step login_page failed"));
    }
}
