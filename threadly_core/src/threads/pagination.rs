use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ThreadItem;
use crate::{config::CommentsConfig, error::CommentsError, models::comments::timestamp};

/// A page request as it arrives from a caller: both fields are raw strings
/// because they usually come straight off a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// `created_at` of the last item on the previous page.
    pub cursor: Option<String>,
    pub limit: Option<String>,
}

impl PageRequest {
    pub fn first(limit: i64) -> Self {
        Self {
            cursor: None,
            limit: Some(limit.to_string()),
        }
    }

    pub fn after(self, cursor: impl Into<String>) -> Self {
        Self {
            cursor: Some(cursor.into()),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T: ThreadItem> Page<T> {
    /// Builds a page from a fetch of `limit + 1` rows: the extra row only
    /// signals that another page exists and is dropped.
    pub fn from_overfetch(mut items: Vec<T>, limit: u64) -> Self {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let has_next = items.len() > limit;
        items.truncate(limit);

        let next_cursor = if has_next {
            items.last().map(|item| item.created_at().to_owned())
        } else {
            None
        };

        Page { items, next_cursor }
    }
}

/// Normalises a requested page size.
///
/// Anything that is not a finite positive number falls back to the default;
/// large values are clamped to the maximum. Fractions are floored, with a
/// floor of one.
pub fn normalize_limit(raw: Option<&str>, config: &CommentsConfig) -> u64 {
    let fallback = config.default_page_limit;

    let Some(requested) = raw.and_then(|raw| raw.trim().parse::<f64>().ok()) else {
        return fallback;
    };
    if !requested.is_finite() || requested <= 0.0 {
        return fallback;
    }

    let max = config.max_page_limit.max(1);
    if requested >= max as f64 {
        return max;
    }

    (requested.floor() as u64).max(1)
}

/// Parses a cursor into the stored timestamp format. Empty means "from the
/// start".
pub fn parse_cursor(raw: Option<&str>) -> Result<Option<String>, CommentsError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let at = DateTime::parse_from_rfc3339(raw)
        .map_err(|_| CommentsError::invalid("invalid cursor"))?
        .with_timezone(&Utc);

    Ok(Some(timestamp(at)))
}
