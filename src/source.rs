//! Registered external calendar feeds

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::FetchError;
use crate::identity::UserId;

/// The internal identifier of a calendar source
pub type SourceId = String;

/// An external iCal feed registered by a user.
///
/// Sources are read-heavy: they are fetched fresh on every calendar view, nothing of their
/// parsed content is persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarSource {
    pub id: SourceId,
    pub user_id: UserId,
    pub name: String,
    /// Feed location. `webcal://` URLs are accepted as-is and rewritten at fetch time.
    pub url: Url,
    /// Free-form provider tag, e.g. "web_ical" or "google"
    #[serde(rename = "type")]
    pub kind: String,
    /// Display hint for clients, any CSS color string
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CalendarSource {
    /// Register a new source with a fresh (random) id
    pub fn new<S: ToString, T: ToString>(
        user_id: &UserId,
        name: S,
        url: Url,
        kind: T,
        color: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_hyphenated().to_string(),
            user_id: user_id.clone(),
            name: name.to_string(),
            url,
            kind: kind.to_string(),
            color,
            created_at: Utc::now(),
        }
    }
}

/// Turn a registered feed URL into a fetchable one.
///
/// Calendar apps commonly hand out `webcal://` subscription links; those are plain HTTPS
/// feeds under a different scheme name.
pub fn normalize_feed_url(url: &Url) -> Result<Url, FetchError> {
    if url.scheme() != "webcal" {
        return Ok(url.clone());
    }

    let rewritten = format!("https{}", &url.as_str()["webcal".len()..]);
    Url::parse(&rewritten).map_err(|err| FetchError::InvalidUrl(format!("{}: {}", rewritten, err)))
}

/// Check a color display hint. Accepts anything the CSS color grammar accepts
/// ("#ff8800", "rgb(...)", named colors...).
pub fn validate_color(raw: &str) -> Result<(), String> {
    match csscolorparser::parse(raw) {
        Ok(_) => Ok(()),
        Err(err) => Err(format!("'{}' is not a valid color: {}", raw, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webcal_urls_are_rewritten_to_https() {
        let url = Url::parse("webcal://example.com/feed.ics").unwrap();
        let fetchable = normalize_feed_url(&url).unwrap();
        assert_eq!(fetchable.as_str(), "https://example.com/feed.ics");
    }

    #[test]
    fn other_schemes_are_left_alone() {
        let url = Url::parse("https://example.com/feed.ics").unwrap();
        assert_eq!(normalize_feed_url(&url).unwrap(), url);

        let http = Url::parse("http://example.com/feed.ics").unwrap();
        assert_eq!(normalize_feed_url(&http).unwrap(), http);
    }

    #[test]
    fn color_validation() {
        assert!(validate_color("#88cc00").is_ok());
        assert!(validate_color("tomato").is_ok());
        assert!(validate_color("clearly not a color").is_err());
    }
}
