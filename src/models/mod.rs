// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod athlete;
pub mod cursor;
pub mod session;
pub mod token;

pub use athlete::Athlete;
pub use cursor::FetchCursor;
pub use session::SessionRecord;
pub use token::TokenSet;
