//! The extraction pipeline.
//!
//! One operation is exposed to the boundary layer: authenticate, pull a
//! year of birthdays, and render them as a calendar document. Each request
//! owns its own `Session` and `TokenCache`; both die with the request.

mod birthdays;
mod entity;

use chrono::Local;
use tracing::info;

use crate::auth::authenticate;
use crate::error::Error;
use crate::ics::build_calendar;
use crate::session::{Credentials, Session};
use crate::tokens::TokenCache;

/// Log in, fetch every upcoming birthday, and serialize the calendar.
///
/// Credentials are used for this one request and dropped; nothing is
/// retried and no partial calendar is ever returned.
pub async fn get_birthdays(email: &str, password: &str) -> Result<String, Error> {
    let session = Session::new().map_err(Error::ClientSetup)?;
    let credentials = Credentials {
        email: email.to_string(),
        password: password.to_string(),
    };

    authenticate(&session, &credentials).await?;
    info!("session authenticated");

    let mut tokens = TokenCache::new();
    let today = Local::now().date_naive();
    let birthdays = birthdays::fetch_all(&session, &mut tokens, today).await?;

    Ok(build_calendar(&birthdays, today).to_ics())
}
