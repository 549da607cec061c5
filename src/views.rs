// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTML views.
//!
//! Templates are compiled in and filled from a flat parameter mapping; the
//! markup itself is not part of the service contract.

use crate::models::Athlete;
use axum::response::Html;

const GET_STARTED_TEMPLATE: &str = include_str!("../templates/get_started.html");
const AUTHORIZED_TEMPLATE: &str = include_str!("../templates/authorized.html");
const ERROR_TEMPLATE: &str = include_str!("../templates/error.html");

/// Page heading shared by every view.
pub const GREETING: &str = "Strava Data";

/// Shown when no fetch has happened yet.
pub const NEVER_FETCHED: &str = "never";

/// Which page to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    GetStarted,
    Authorized,
    Error,
}

/// Flat parameter mapping handed to the templates.
#[derive(Debug, Clone)]
pub struct ViewParams {
    pub greeting: String,
    pub data_timestamp: String,
    pub oauth_url: String,
    pub authorized: bool,
    pub athlete_name: String,
    pub athlete_city: String,
    pub athlete_pic: String,
    /// Only used by the error view
    pub message: String,
}

impl ViewParams {
    pub fn new(oauth_url: &str, data_timestamp: Option<String>) -> Self {
        Self {
            greeting: GREETING.to_string(),
            data_timestamp: data_timestamp.unwrap_or_else(|| NEVER_FETCHED.to_string()),
            oauth_url: oauth_url.to_string(),
            authorized: false,
            athlete_name: String::new(),
            athlete_city: String::new(),
            athlete_pic: String::new(),
            message: String::new(),
        }
    }

    /// Mark authorized and fill the athlete fields.
    pub fn with_athlete(mut self, athlete: &Athlete) -> Self {
        self.authorized = true;
        self.athlete_name = athlete.display_name();
        self.athlete_city = athlete.city_or_empty().to_string();
        self.athlete_pic = athlete.profile_or_empty().to_string();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Template keys and their raw (unescaped) values.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("greeting", self.greeting.clone()),
            ("dataTimestamp", self.data_timestamp.clone()),
            ("oauthURL", self.oauth_url.clone()),
            ("authorized", self.authorized.to_string()),
            ("athleteName", self.athlete_name.clone()),
            ("athleteCity", self.athlete_city.clone()),
            ("athletePic", self.athlete_pic.clone()),
            ("message", self.message.clone()),
        ]
    }
}

/// Render a view with HTML-escaped parameters.
pub fn render(view: View, params: &ViewParams) -> Html<String> {
    let template = match view {
        View::GetStarted => GET_STARTED_TEMPLATE,
        View::Authorized => AUTHORIZED_TEMPLATE,
        View::Error => ERROR_TEMPLATE,
    };

    Html(fill_template(template, &params.to_pairs()))
}

/// Replace `{{key}}` placeholders in one pass over the template, so inserted
/// values are never scanned for placeholders themselves. Unknown keys are
/// left as-is.
fn fill_template(template: &str, pairs: &[(&str, String)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        let key = &after[..end];
        match pairs.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => rendered.push_str(&escape_html(value)),
            None => rendered.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }

    rendered.push_str(rest);
    rendered
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
