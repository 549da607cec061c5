// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Athlete profile as returned with the token exchange.

use serde::{Deserialize, Serialize};

/// Read-only athlete profile. Sourced from the token exchange response and
/// only ever displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Athlete {
    #[serde(rename = "firstname", default)]
    pub first_name: String,
    #[serde(rename = "lastname", default)]
    pub last_name: String,
    #[serde(default)]
    pub city: Option<String>,
    /// Profile picture URL
    #[serde(rename = "profile", default)]
    pub profile_image_url: Option<String>,
}

impl Athlete {
    /// "First Last", as shown in the views.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn city_or_empty(&self) -> &str {
        self.city.as_deref().unwrap_or("")
    }

    pub fn profile_or_empty(&self) -> &str {
        self.profile_image_url.as_deref().unwrap_or("")
    }
}
