//! Picks the greeting a new session starts with.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::OrchestratorConfig;
use crate::store::KeyValueStore;

/// Store key holding the unix time of the first visit.
pub const FIRST_VISIT_KEY: &str = "palaver.first_visit_at";
/// Store key holding the unix time of the latest visit.
pub const LAST_VISIT_KEY: &str = "palaver.last_visit_at";

/// Returns the greeting for a session starting at `now` and records the
/// visit.
pub(crate) fn greet<'a>(
    store: &dyn KeyValueStore,
    config: &'a OrchestratorConfig,
    now: SystemTime,
) -> &'a str {
    let now_secs = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let read =
        |key: &str| store.get(key).and_then(|v| v.trim().parse::<u64>().ok());

    let returning = match (read(FIRST_VISIT_KEY), read(LAST_VISIT_KEY)) {
        (Some(_), Some(last)) => {
            let since = Duration::from_secs(now_secs.saturating_sub(last));
            since <= config.returning_window
        }
        _ => false,
    };

    let now_value = now_secs.to_string();
    if read(FIRST_VISIT_KEY).is_none() {
        store.set(FIRST_VISIT_KEY, &now_value);
    }
    store.set(LAST_VISIT_KEY, &now_value);

    if returning {
        debug!("returning visitor");
        &config.returning_greeting
    } else {
        &config.introduction_greeting
    }
}
