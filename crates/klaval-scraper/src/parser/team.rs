use super::{css, first_text};
use crate::error::{Result, ScrapeError};
use crate::records::{RosterEntry, TeamRoster};
use klaval_core::{RacerId, TeamRole};
use scraper::Html;
use std::collections::HashSet;
use tracing::{debug, warn};

const ENTITY: &str = "team";

/// Extract the team name and its roster.
///
/// Each roster row yields the racer id (last path segment of the profile
/// link) and the role from the row's badge. Rows without a usable profile
/// link are skipped. A second leader badge is demoted to a regular member.
pub fn parse_team_roster(html: &str) -> Result<TeamRoster> {
    let document = Html::parse_document(html);

    let name = first_text(&document, "h1")?
        .ok_or_else(|| ScrapeError::extraction(ENTITY, "name", "no h1 header on page"))?;

    let table = css("table#tbl-daily-tracker")?;
    if document.select(&table).next().is_none() {
        return Err(ScrapeError::extraction(
            ENTITY,
            "roster",
            "member table #tbl-daily-tracker not found",
        ));
    }

    let rows = css("table#tbl-daily-tracker tbody tr")?;
    let first_cell = css("td")?;
    let profile_link = css("a[href]")?;
    let badge = css("div.badge")?;

    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut has_leader = false;

    for row in document.select(&rows) {
        let Some(cell) = row.select(&first_cell).next() else {
            continue;
        };

        let href = cell
            .select(&profile_link)
            .next()
            .and_then(|a| a.value().attr("href"));
        let Some(href) = href else {
            debug!(team = %name, "roster row without profile link skipped");
            continue;
        };

        let segment = href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let id = match RacerId::new(segment) {
            Ok(id) => id,
            Err(e) => {
                warn!(team = %name, href, error = %e, "roster row with unusable racer id skipped");
                continue;
            }
        };
        if !seen.insert(id.clone()) {
            continue;
        }

        let label = cell
            .select(&badge)
            .next()
            .and_then(|b| b.value().attr("title"));
        let mut role = TeamRole::from_badge(label);
        if role == TeamRole::Leader {
            if has_leader {
                warn!(team = %name, racer = %id, "second leader badge on roster, treated as regular");
                role = TeamRole::Regular;
            }
            has_leader = true;
        }

        entries.push(RosterEntry { id, role });
    }

    debug!(team = %name, members = entries.len(), "parsed team roster");
    Ok(TeamRoster { name, entries })
}
