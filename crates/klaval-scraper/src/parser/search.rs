use crate::error::{Result, ScrapeError};
use crate::records::RacerIdentity;
use klaval_core::RacerId;
use serde::Deserialize;
use tracing::warn;

/// Ids come back as numbers from the live site but as strings from some
/// mirrors.
#[derive(Deserialize)]
#[serde(untagged)]
enum SearchId {
    Number(u64),
    Text(String),
}

#[derive(Deserialize)]
struct SearchRow(SearchId, String, String);

/// Decode the racer search response: a JSON array of
/// `[id, display_name, username]` tuples, in the site's order.
///
/// Rows with an unusable id are skipped.
pub fn parse_search_results(body: &str, url: &str) -> Result<Vec<RacerIdentity>> {
    let rows: Vec<SearchRow> =
        serde_json::from_str(body).map_err(|source| ScrapeError::InvalidJson {
            url: url.to_string(),
            source,
        })?;

    let identities = rows
        .into_iter()
        .filter_map(|SearchRow(id, display_name, username)| {
            let raw = match id {
                SearchId::Number(n) => n.to_string(),
                SearchId::Text(s) => s,
            };
            match RacerId::new(raw.as_str()) {
                Ok(id) => Some(RacerIdentity {
                    id,
                    display_name,
                    username,
                }),
                Err(e) => {
                    warn!(id = %raw, error = %e, "search result with unusable id skipped");
                    None
                }
            }
        })
        .collect();

    Ok(identities)
}
