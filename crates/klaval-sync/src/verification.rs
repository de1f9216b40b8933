//! Account ownership challenge.
//!
//! A racer proves they control an account by switching the selected car in
//! their garage to one picked at random.

use crate::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use klaval_core::{RacerId, VerificationConfig};
use klaval_scraper::{Car, Crawler, Garage};
use klaval_session::PageSource;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A pending request to select `required_car`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationChallenge {
    pub racer_id: RacerId,
    pub required_car: Car,
    pub issued_at: DateTime<Utc>,
}

impl VerificationChallenge {
    /// Pick a random owned car other than the one currently selected.
    ///
    /// # Errors
    /// `SyncError::Verification` if the racer owns fewer than two cars.
    pub fn issue(garage: &Garage, rng: &mut impl Rng) -> Result<Self> {
        if garage.cars.len() < 2 {
            return Err(SyncError::Verification(format!(
                "racer {} owns {} car(s), at least two are needed",
                garage.racer_id,
                garage.cars.len()
            )));
        }

        let selected = garage.selected_car.as_ref().map(|c| c.name.as_str());
        let candidates: Vec<&Car> = garage
            .cars
            .iter()
            .filter(|car| Some(car.name.as_str()) != selected)
            .collect();
        let required_car = candidates
            .choose(rng)
            .map(|car| (*car).clone())
            .ok_or_else(|| {
                SyncError::Verification(format!(
                    "racer {} owns no car besides the selected one",
                    garage.racer_id
                ))
            })?;

        info!(racer = %garage.racer_id, car = %required_car.name, "verification challenge issued");
        Ok(Self {
            racer_id: garage.racer_id.clone(),
            required_car,
            issued_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn is_satisfied_by(&self, garage: &Garage) -> bool {
        garage.racer_id == self.racer_id
            && garage
                .selected_car
                .as_ref()
                .is_some_and(|car| car.name == self.required_car.name)
    }
}

/// Poll the racer's garage until the challenge is met or the timeout passes.
///
/// Returns `Ok(false)` on timeout. Transient fetch failures are logged and
/// retried; an authentication failure ends the wait with an error.
pub async fn await_verification<S: PageSource>(
    crawler: &Crawler<S>,
    challenge: &VerificationChallenge,
    config: &VerificationConfig,
) -> Result<bool> {
    let deadline = Instant::now() + config.timeout();

    loop {
        tokio::time::sleep(config.poll_interval()).await;

        match crawler.garage(&challenge.racer_id).await {
            Ok(garage) if challenge.is_satisfied_by(&garage) => {
                info!(racer = %challenge.racer_id, "verification succeeded");
                return Ok(true);
            }
            Ok(garage) => debug!(
                racer = %challenge.racer_id,
                selected = ?garage.selected_car.map(|c| c.name),
                "challenge not met yet"
            ),
            Err(e) if e.is_authentication() => return Err(e.into()),
            Err(e) => warn!(racer = %challenge.racer_id, error = %e, "garage check failed"),
        }

        if Instant::now() >= deadline {
            info!(racer = %challenge.racer_id, "verification timed out");
            return Ok(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klaval_scraper::CarStats;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn car(name: &str) -> Car {
        Car {
            name: name.to_string(),
            image_url: format!("https://klavia.io/cars/{name}.png"),
        }
    }

    fn garage(cars: &[&str], selected: Option<&str>) -> Garage {
        Garage {
            racer_id: RacerId::new("42").expect("valid id"),
            display_name: "Speedy".to_string(),
            cars: cars.iter().map(|n| car(n)).collect(),
            selected_car: selected.map(car),
            selected_stats: CarStats::default(),
        }
    }

    #[test]
    fn test_issue_never_picks_selected_car() {
        let garage = garage(&["Alpha", "Bravo", "Charlie"], Some("Bravo"));
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let challenge = VerificationChallenge::issue(&garage, &mut rng).expect("issuable");
            assert_ne!(challenge.required_car.name, "Bravo");
            assert!(garage.cars.contains(&challenge.required_car));
        }
    }

    #[test]
    fn test_issue_requires_two_cars() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = VerificationChallenge::issue(&garage(&["Alpha"], None), &mut rng)
            .expect_err("single car");
        assert!(matches!(err, SyncError::Verification(_)));
    }

    #[test]
    fn test_issue_without_selection_picks_any_car() {
        let mut rng = StdRng::seed_from_u64(1);
        let challenge = VerificationChallenge::issue(&garage(&["Alpha", "Bravo"], None), &mut rng)
            .expect("issuable");
        assert!(["Alpha", "Bravo"].contains(&challenge.required_car.name.as_str()));
    }

    #[test]
    fn test_is_satisfied_by() {
        let mut rng = StdRng::seed_from_u64(3);
        let before = garage(&["Alpha", "Bravo"], Some("Alpha"));
        let challenge = VerificationChallenge::issue(&before, &mut rng).expect("issuable");
        assert_eq!(challenge.required_car.name, "Bravo");

        assert!(!challenge.is_satisfied_by(&before));
        assert!(challenge.is_satisfied_by(&garage(&["Alpha", "Bravo"], Some("Bravo"))));
        assert!(!challenge.is_satisfied_by(&garage(&["Alpha", "Bravo"], None)));
    }
}
