use super::{css, display_name, first_text, text_of};
use crate::error::{Result, ScrapeError};
use crate::records::{QuestProgress, UserQuests};
use klaval_core::RacerId;
use scraper::Html;

const ENTITY: &str = "quests";

/// Extract quest names and progress, zipped positionally.
///
/// The in-progress quest is rendered in an `h5` header instead of the modal
/// list; when present it names the first entry.
pub fn parse_quests(html: &str, racer_id: &RacerId) -> Result<UserQuests> {
    let document = Html::parse_document(html);
    let display_name = display_name(&document, ENTITY)?;

    let links = css(r#"a[data-turbo-frame="modal"]"#)?;
    let mut names: Vec<String> = document.select(&links).map(text_of).collect();

    if let Some(active) = first_text(&document, "h5")? {
        match names.first_mut() {
            Some(first) => *first = active,
            None => names.push(active),
        }
    }

    let bars = css(r#"div[data-controller="progress"]"#)?;
    let progress = document
        .select(&bars)
        .map(|bar| {
            let raw = bar
                .value()
                .attr("data-progress-percentage-value")
                .ok_or_else(|| ScrapeError::extraction(ENTITY, "progress", "progress bar without value"))?;
            let value: f64 = super::parse_number(ENTITY, "progress", raw)?;
            let value = super::percentage(ENTITY, "progress", value)?;
            // Bounded to 0..=100 above.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Ok(value.round() as u8)
        })
        .collect::<Result<Vec<u8>>>()?;

    let quests = names
        .into_iter()
        .zip(progress)
        .map(|(name, progress)| QuestProgress { name, progress })
        .collect();

    Ok(UserQuests {
        racer_id: racer_id.clone(),
        display_name,
        quests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn racer() -> RacerId {
        RacerId::new("62812").expect("valid id")
    }

    #[test]
    fn test_active_quest_overrides_first_name() {
        let html = r#"
            <h3>SpeedyRacer</h3>
            <h5>Win 10 Races</h5>
            <a data-turbo-frame="modal" href="/q/1">Daily Quest</a>
            <a data-turbo-frame="modal" href="/q/2">Type 5,000 Words</a>
            <div data-controller="progress" data-progress-percentage-value="40"></div>
            <div data-controller="progress" data-progress-percentage-value="100"></div>
        "#;
        let quests = parse_quests(html, &racer()).expect("parse quests");
        assert_eq!(
            quests.quests,
            vec![
                QuestProgress {
                    name: "Win 10 Races".to_string(),
                    progress: 40
                },
                QuestProgress {
                    name: "Type 5,000 Words".to_string(),
                    progress: 100
                },
            ]
        );
    }

    #[test]
    fn test_without_active_quest() {
        let html = r#"
            <h3>SpeedyRacer</h3>
            <a data-turbo-frame="modal">Daily Quest</a>
            <div data-controller="progress" data-progress-percentage-value="12"></div>
            <div data-controller="progress" data-progress-percentage-value="80"></div>
        "#;
        let quests = parse_quests(html, &racer()).expect("parse quests");
        assert_eq!(quests.quests.len(), 1);
        assert_eq!(quests.quests[0].name, "Daily Quest");
        assert_eq!(quests.quests[0].progress, 12);
    }

    #[test]
    fn test_out_of_range_progress_is_error() {
        let html = r#"
            <h3>SpeedyRacer</h3>
            <a data-turbo-frame="modal">Daily Quest</a>
            <div data-controller="progress" data-progress-percentage-value="140"></div>
        "#;
        assert!(parse_quests(html, &racer()).is_err());
    }
}
