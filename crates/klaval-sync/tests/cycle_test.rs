use klaval_core::{PollingConfig, RacerId, TeamEventKind, TeamRole, TeamTag};
use klaval_scraper::{Crawler, ShopSection, SiteUrls, TeamSnapshot};
use klaval_session::{PageSource, ReplaySource, SessionError, Url};
use klaval_store::{CachedTeamState, PersistedState, SnapshotStore};
use klaval_sync::{CycleRunner, EventSink, NewShopOffer, SyncError, TeamEvent};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const BASE: &str = "https://klavia.io/";

const TEAM_PAGE: &str = r#"
    <html><body>
    <h1>Vyn Racing</h1>
    <table id="tbl-daily-tracker"><tbody>
      <tr><td><a href="/racers/1">Ace</a><div class="badge" title="Agent">A</div></td></tr>
      <tr><td><a href="/racers/3">Cee</a></td></tr>
    </tbody></table>
    </body></html>
"#;

fn urls() -> SiteUrls {
    SiteUrls::new(Url::parse(BASE).expect("valid base"))
}

fn id(s: &str) -> RacerId {
    RacerId::new(s).expect("valid id")
}

fn tag(s: &str) -> TeamTag {
    TeamTag::new(s).expect("valid tag")
}

fn shop_page(name: &str) -> String {
    format!(
        r#"<div class="row g-3"><div class="col-lg-6"><div class="mb-3"><img src="/shop/{name}.png"></div><h4>{name}</h4><strong>100</strong></div></div>"#
    )
}

/// Team VYN: 1 promoted, 2 left, 3 joined. Shop: Aurora (seen) and Blaze (new).
fn site() -> ReplaySource {
    let urls = urls();
    let search = |q: &str| urls.racer_search(q).expect("url").to_string();
    ReplaySource::new()
        .with_page(urls.team(&tag("VYN")).expect("url").to_string(), TEAM_PAGE)
        .with_page(search("1"), r#"[[1, "Ace Racer", "ace"]]"#)
        .with_page(search("2"), r#"[[2, "Bee Racer", "bee"]]"#)
        .with_page(search("3"), r#"[[3, "Cee Racer", "cee"]]"#)
        .with_page(
            urls.shop_section(ShopSection::Seasonal).expect("url").to_string(),
            shop_page("Aurora"),
        )
        .with_page(
            urls.shop_section(ShopSection::AlicesDeals).expect("url").to_string(),
            shop_page("Blaze"),
        )
}

fn crawler<S: PageSource>(source: S) -> Crawler<S> {
    Crawler::new(source, Url::parse(BASE).expect("valid base"))
}

fn polling() -> PollingConfig {
    PollingConfig {
        notify_pause_ms: 0,
        ..PollingConfig::default()
    }
}

async fn seeded_store(dir: &TempDir) -> Arc<SnapshotStore> {
    let store = SnapshotStore::new(dir.path().join("persistence.json"));
    store
        .track_team("guild-1", tag("VYN"))
        .await
        .expect("track team");
    store
        .update(|state| {
            if let Some(team) = state.teams.get_mut("guild-1") {
                team.cached_state = Some(CachedTeamState::from_roles([
                    (id("1"), TeamRole::Regular),
                    (id("2"), TeamRole::Agent),
                ]));
            }
            state.shop_offers.insert("Aurora".to_string());
        })
        .await
        .expect("seed state");
    Arc::new(store)
}

#[derive(Default)]
struct RecordingSink {
    fail: bool,
    teams: Mutex<Vec<(String, Vec<TeamEvent>)>>,
    offers: Mutex<Vec<NewShopOffer>>,
}

impl RecordingSink {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn team_events(&self) -> Vec<(String, Vec<TeamEvent>)> {
        self.teams.lock().expect("acquire sink lock").clone()
    }

    fn offer_names(&self) -> Vec<String> {
        self.offers
            .lock()
            .expect("acquire sink lock")
            .iter()
            .map(|o| o.offer.name.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingSink {
    async fn team_events(
        &self,
        tracking_id: &str,
        _team: &TeamSnapshot,
        events: &[TeamEvent],
    ) -> klaval_sync::Result<()> {
        if self.fail {
            return Err(SyncError::Sink("consumer offline".to_string()));
        }
        self.teams
            .lock()
            .expect("acquire sink lock")
            .push((tracking_id.to_string(), events.to_vec()));
        Ok(())
    }

    async fn shop_offers(&self, offers: &[NewShopOffer]) -> klaval_sync::Result<()> {
        if self.fail {
            return Err(SyncError::Sink("consumer offline".to_string()));
        }
        self.offers
            .lock()
            .expect("acquire sink lock")
            .extend_from_slice(offers);
        Ok(())
    }
}

fn labels(events: &[TeamEvent]) -> Vec<(TeamEventKind, String)> {
    events
        .iter()
        .map(|e| (e.kind(), e.racer_id().to_string()))
        .collect()
}

#[tokio::test]
async fn test_cycle_dispatches_then_persists() {
    let dir = TempDir::new().expect("create temp dir");
    let store = seeded_store(&dir).await;
    let sink = Arc::new(RecordingSink::default());
    let runner = CycleRunner::new(store.clone(), sink.clone(), &polling());
    let crawler = crawler(site());

    let report = runner.run(&crawler).await;
    assert_eq!(report.failures().count(), 0, "{report:?}");
    assert_eq!(report.events_dispatched(), 4);

    let dispatched = sink.team_events();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].0, "guild-1");
    assert_eq!(
        labels(&dispatched[0].1),
        vec![
            (TeamEventKind::NewMember, "3".to_string()),
            (TeamEventKind::MemberLeft, "2".to_string()),
            (TeamEventKind::Promotion, "1".to_string()),
        ]
    );
    match &dispatched[0].1[1] {
        TeamEvent::MemberLeft { identity, .. } => assert_eq!(
            identity.as_ref().map(|i| i.display_name.as_str()),
            Some("Bee Racer")
        ),
        other => panic!("expected a departure, got {other:?}"),
    }
    assert_eq!(sink.offer_names(), vec!["Blaze".to_string()]);

    let state = store.reload().await.expect("reload");
    let cached = state
        .team("guild-1")
        .and_then(|t| t.cached_state.as_ref())
        .expect("cached roster");
    assert_eq!(cached.role_of(&id("1")), Some(TeamRole::Agent));
    assert_eq!(cached.role_of(&id("3")), Some(TeamRole::Regular));
    assert!(!cached.contains(&id("2")));
    assert_eq!(
        state.shop_offers,
        BTreeSet::from(["Aurora".to_string(), "Blaze".to_string()])
    );

    // Nothing changed on the site, so nothing is reported again.
    let report = runner.run(&crawler).await;
    assert_eq!(report.events_dispatched(), 0);
    assert_eq!(sink.team_events().len(), 1);
    assert_eq!(sink.offer_names().len(), 1);
}

#[tokio::test]
async fn test_shop_page_without_offers_keeps_seen_offers() {
    let dir = TempDir::new().expect("create temp dir");
    let store = seeded_store(&dir).await;
    let sink = Arc::new(RecordingSink::default());
    let runner = CycleRunner::new(store.clone(), sink.clone(), &polling());

    runner.run(&crawler(site())).await;
    assert_eq!(sink.offer_names(), vec!["Blaze".to_string()]);
    let seen = store.reload().await.expect("reload").shop_offers;

    // maintenance page instead of the season shop
    let seasonal = urls()
        .shop_section(ShopSection::Seasonal)
        .expect("url")
        .to_string();
    let report = runner
        .run(&crawler(site().with_page(seasonal, "<p>Back soon</p>")))
        .await;
    let shop = report
        .subtasks
        .iter()
        .find(|s| s.subtask == "shop")
        .expect("shop sub-task");
    assert!(
        shop.error.as_deref().is_some_and(|e| e.contains("grid")),
        "{shop:?}"
    );
    assert_eq!(store.reload().await.expect("reload").shop_offers, seen);

    runner.run(&crawler(site())).await;
    assert_eq!(sink.offer_names(), vec!["Blaze".to_string()]);
}

#[tokio::test]
async fn test_failed_dispatch_keeps_previous_state() {
    let dir = TempDir::new().expect("create temp dir");
    let store = seeded_store(&dir).await;
    let before: PersistedState = store.reload().await.expect("reload");

    let failing = CycleRunner::new(
        store.clone(),
        Arc::new(RecordingSink::failing()),
        &polling(),
    );
    let report = failing.run(&crawler(site())).await;
    assert_eq!(report.failures().count(), 2);
    assert!(!report.requires_reauthentication());
    assert_eq!(store.reload().await.expect("reload"), before);

    // The same events come out once the consumer recovers.
    let sink = Arc::new(RecordingSink::default());
    let runner = CycleRunner::new(store.clone(), sink.clone(), &polling());
    let report = runner.run(&crawler(site())).await;
    assert_eq!(report.failures().count(), 0);
    assert_eq!(labels(&sink.team_events()[0].1).len(), 3);
    assert_eq!(sink.offer_names(), vec!["Blaze".to_string()]);
}

#[tokio::test]
async fn test_failing_team_does_not_block_siblings() {
    let dir = TempDir::new().expect("create temp dir");
    let store = seeded_store(&dir).await;
    store
        .track_team("guild-0", tag("GONE"))
        .await
        .expect("track team");
    let sink = Arc::new(RecordingSink::default());
    let runner = CycleRunner::new(store.clone(), sink.clone(), &polling());

    let report = runner.run(&crawler(site())).await;

    let outcomes: Vec<_> = report
        .subtasks
        .iter()
        .map(|s| (s.subtask.as_str(), s.is_success()))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("team guild-0 [GONE]", false),
            ("team guild-1 [VYN]", true),
            ("shop", true),
        ]
    );
    assert!(report.subtasks[0]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("404")));
    assert_eq!(sink.team_events().len(), 1);

    let state = store.reload().await.expect("reload");
    assert!(state
        .team("guild-0")
        .is_some_and(|t| t.cached_state.is_none()));
}

#[tokio::test]
async fn test_disabled_events_still_advance_state() {
    let dir = TempDir::new().expect("create temp dir");
    let store = seeded_store(&dir).await;
    store
        .set_notify_events("guild-1", BTreeSet::from([TeamEventKind::Promotion]))
        .await
        .expect("set notify events");
    let sink = Arc::new(RecordingSink::default());
    let runner = CycleRunner::new(store.clone(), sink.clone(), &polling());

    runner.run(&crawler(site())).await;

    let dispatched = sink.team_events();
    assert_eq!(
        labels(&dispatched[0].1),
        vec![(TeamEventKind::Promotion, "1".to_string())]
    );

    let state = store.reload().await.expect("reload");
    let cached = state
        .team("guild-1")
        .and_then(|t| t.cached_state.as_ref())
        .expect("cached roster");
    assert!(cached.contains(&id("3")));
    assert!(!cached.contains(&id("2")));
}

#[tokio::test]
async fn test_corrupt_state_fails_the_cycle() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("persistence.json");
    std::fs::write(&path, "{ not json").expect("write corrupt file");
    let sink = Arc::new(RecordingSink::default());
    let runner = CycleRunner::new(Arc::new(SnapshotStore::new(path)), sink.clone(), &polling());

    let source = ReplaySource::new();
    let report = runner.run(&crawler(source)).await;

    assert_eq!(report.subtasks.len(), 1);
    assert_eq!(report.subtasks[0].subtask, "load state");
    assert!(!report.subtasks[0].is_success());
    assert!(sink.team_events().is_empty());
}

/// Never answers.
struct StalledSource;

#[async_trait::async_trait]
impl PageSource for StalledSource {
    async fn fetch_text(&self, _url: &Url) -> Result<String, SessionError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_stalled_subtasks_time_out() {
    let dir = TempDir::new().expect("create temp dir");
    let store = seeded_store(&dir).await;
    let before = store.reload().await.expect("reload");
    let config = PollingConfig {
        subtask_timeout_secs: 5,
        notify_pause_ms: 0,
        ..PollingConfig::default()
    };
    let runner = CycleRunner::new(store.clone(), Arc::new(RecordingSink::default()), &config);

    let report = runner.run(&crawler(StalledSource)).await;

    assert_eq!(report.subtasks.len(), 2);
    for subtask in &report.subtasks {
        assert!(
            subtask
                .error
                .as_deref()
                .is_some_and(|e| e.contains("timed out")),
            "{subtask:?}"
        );
    }
    assert_eq!(store.reload().await.expect("reload"), before);
}
