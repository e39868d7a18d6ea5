//! Reading the portal's login form and dashboard links.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{ScrapeError, ScrapeResult};
use crate::model::credentials::Credentials;

static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form").expect("Invalid form selector"));
static INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("Invalid input selector"));
static PASSWORD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("input[type=\"password\"]").expect("Invalid password selector")
});
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("Invalid link selector"));

/// The login form with its hidden state fields already collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub action: Url,
    pub username_field: String,
    pub password_field: String,
    fields: Vec<(String, String)>,
}

impl LoginForm {
    /// Form body with the credentials filled in, fields in page order.
    pub fn fill(&self, credentials: &Credentials) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(name, value)| {
                let value = if *name == self.username_field {
                    credentials.username.clone()
                } else if *name == self.password_field {
                    credentials.password.clone()
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect()
    }
}

/// Finds the form holding a password field and collects what it would submit.
pub fn parse_login_form(html: &str, page_url: &Url) -> ScrapeResult<LoginForm> {
    let document = Html::parse_document(html);
    let form = document
        .select(&FORM_SELECTOR)
        .find(|form| form.select(&PASSWORD_SELECTOR).next().is_some())
        .ok_or_else(|| ScrapeError::new("Login form not found on the portal page"))?;

    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => page_url.join(action)?,
        _ => page_url.clone(),
    };

    let mut fields = Vec::new();
    let mut username_field = None;
    let mut password_field = None;
    let mut submitted = false;

    for input in form.select(&INPUT_SELECTOR) {
        let Some(name) = input.value().attr("name") else {
            continue;
        };
        let value = input.value().attr("value").unwrap_or_default();
        match input_type(input).as_str() {
            "password" => {
                if password_field.is_none() {
                    password_field = Some(name.to_string());
                }
            }
            "text" | "email" => {
                if username_field.is_none() {
                    username_field = Some(name.to_string());
                }
            }
            "submit" => {
                // Only the button that was "clicked" is sent.
                if submitted {
                    continue;
                }
                submitted = true;
            }
            "checkbox" | "radio" => {
                if input.value().attr("checked").is_none() {
                    continue;
                }
            }
            "button" | "image" | "reset" | "file" => continue,
            _ => {}
        }
        fields.push((name.to_string(), value.to_string()));
    }

    let username_field =
        username_field.ok_or_else(|| ScrapeError::new("Cannot find the Username field"))?;
    let password_field =
        password_field.ok_or_else(|| ScrapeError::new("Cannot find the Password field"))?;

    Ok(LoginForm {
        action,
        username_field,
        password_field,
        fields,
    })
}

fn input_type(input: ElementRef<'_>) -> String {
    input
        .value()
        .attr("type")
        .unwrap_or("text")
        .trim()
        .to_ascii_lowercase()
}

/// Whether the page still asks for a password, i.e. the login did not go through.
pub fn has_password_field(html: &str) -> bool {
    Html::parse_document(html)
        .select(&PASSWORD_SELECTOR)
        .next()
        .is_some()
}

/// Resolves the first link whose visible text contains `text`.
pub fn find_link(html: &str, page_url: &Url, text: &str) -> ScrapeResult<Url> {
    let document = Html::parse_document(html);
    let link = document
        .select(&LINK_SELECTOR)
        .find(|link| {
            let label = link.text().collect::<Vec<_>>().join(" ");
            let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
            label.contains(text)
        })
        .ok_or_else(|| ScrapeError::new(format!("Cannot find the {} link", text)))?;

    let href = link.value().attr("href").unwrap_or_default().trim();
    if href.is_empty() || href.starts_with("javascript:") {
        return Err(ScrapeError::new(format!(
            "The {} link has no address to follow",
            text
        )));
    }
    Ok(page_url.join(href)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"
        <html><body>
        <form method="post" action="./Login.aspx?ReturnUrl=%2fUA%2fDefault.aspx" id="form1">
            <input type="hidden" name="__VIEWSTATE" value="abc123" />
            <input type="hidden" name="__EVENTVALIDATION" value="xyz" />
            <input name="ctl00$MainContent$UserName" type="text" id="UserName" />
            <input name="ctl00$MainContent$Password" type="password" id="Password" />
            <input type="checkbox" name="ctl00$MainContent$RememberMe" />
            <input type="submit" name="ctl00$MainContent$LoginButton" value="Login" />
            <input type="submit" name="ctl00$MainContent$Cancel" value="Cancel" />
        </form>
        </body></html>"#;

    fn page_url() -> Url {
        Url::parse("https://www.timetable.ul.ie/Login.aspx?ReturnUrl=%2fUA%2fDefault.aspx").unwrap()
    }

    #[test]
    fn collects_form_fields() {
        let form = parse_login_form(LOGIN_PAGE, &page_url()).unwrap();
        assert_eq!(
            form.action.as_str(),
            "https://www.timetable.ul.ie/Login.aspx?ReturnUrl=%2fUA%2fDefault.aspx"
        );
        assert_eq!(form.username_field, "ctl00$MainContent$UserName");
        assert_eq!(form.password_field, "ctl00$MainContent$Password");

        let credentials = Credentials {
            username: "student@studentmail.ul.ie".into(),
            password: "hunter2".into(),
        };
        let body = form.fill(&credentials);
        let names: Vec<_> = body.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "__VIEWSTATE",
                "__EVENTVALIDATION",
                "ctl00$MainContent$UserName",
                "ctl00$MainContent$Password",
                "ctl00$MainContent$LoginButton",
            ]
        );
        assert_eq!(body[0].1, "abc123");
        assert_eq!(body[2].1, "student@studentmail.ul.ie");
        assert_eq!(body[3].1, "hunter2");
        assert_eq!(body[4].1, "Login");
    }

    #[test]
    fn page_without_password_is_not_a_login_page() {
        let html = r#"<form><input name="q" type="text"></form>"#;
        let err = parse_login_form(html, &page_url()).unwrap_err();
        assert_eq!(err.message, "Login form not found on the portal page");
        assert!(!has_password_field(html));
        assert!(has_password_field(LOGIN_PAGE));
    }

    #[test]
    fn finds_timetable_link() {
        let html = r#"
            <a href="/UA/Other.aspx">Module Timetable</a>
            <a class="card" href="StudentTimetable.aspx">
                <img alt="Card image cap" src="x.png">
                <h5>Student
                    Timetable</h5>
            </a>"#;
        let base = Url::parse("https://www.timetable.ul.ie/UA/Default.aspx").unwrap();
        let url = find_link(html, &base, "Student Timetable").unwrap();
        assert_eq!(url.as_str(), "https://www.timetable.ul.ie/UA/StudentTimetable.aspx");
    }

    #[test]
    fn script_links_are_rejected() {
        let html = r#"<a href="javascript:__doPostBack('x','')">Student Timetable</a>"#;
        let base = Url::parse("https://www.timetable.ul.ie/UA/Default.aspx").unwrap();
        assert!(find_link(html, &base, "Student Timetable").is_err());
        assert!(find_link("<p>nothing</p>", &base, "Student Timetable").is_err());
    }
}
