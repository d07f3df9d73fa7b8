//! Synthetic interaction sessions over the navigation graph.
//!
//! Each user walks the graph stochastically: mostly following navigation
//! edges, occasionally skipping to a random catalog item. A non-click on a
//! followed edge "bounces" the walker to a random item without recording the
//! reassignment itself.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::config::SimulatorConfig;
use crate::domain::interaction::InteractionEvent;
use crate::domain::item::ItemId;
use crate::errors::DomainError;

/// Per-source edge targets, as read back from the persisted graph. Sources
/// with no outgoing edges are simply absent.
pub type GraphTargets = HashMap<ItemId, Vec<ItemId>>;

/// Generates one synthetic session per user over a fixed catalog/graph
/// snapshot. Determinism comes from the injected RNG seed.
#[derive(Clone, Debug)]
pub struct SessionSimulator {
    config: SimulatorConfig,
}

impl SessionSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Simulates a full session for `user_id`, returning the events to be
    /// committed as one transactional unit. Timestamps increase strictly by
    /// step so "most recent click" queries are stable.
    pub fn simulate_session(
        &self,
        user_id: &str,
        catalog: &[ItemId],
        graph: &GraphTargets,
        started_at: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Result<Vec<InteractionEvent>, DomainError> {
        if catalog.is_empty() {
            return Err(DomainError::EmptyCatalog);
        }

        let length = rng
            .gen_range(self.config.min_session_steps..=self.config.max_session_steps)
            as usize;
        let mut events = Vec::with_capacity(length);

        // Cold-start seed: the entry point is always recorded as a click.
        let mut current = random_item(catalog, rng);
        events.push(InteractionEvent::new(user_id, current.clone(), true, started_at));

        for step in 1..length {
            let timestamp = started_at + Duration::seconds(step as i64);
            let targets = graph.get(&current).filter(|targets| !targets.is_empty());

            match targets {
                Some(targets) if rng.gen_bool(self.config.follow_path_probability) => {
                    let target = targets[rng.gen_range(0..targets.len())].clone();
                    let clicked = rng.gen_bool(self.config.follow_click_probability);
                    events.push(InteractionEvent::new(
                        user_id,
                        target.clone(),
                        clicked,
                        timestamp,
                    ));
                    current = if clicked {
                        target
                    } else {
                        // Bounce: reassign without recording an event for the
                        // reassignment itself.
                        random_item(catalog, rng)
                    };
                }
                _ => {
                    // No outgoing edges, or the random-skip branch.
                    let target = random_item(catalog, rng);
                    let clicked = rng.gen_bool(self.config.random_click_probability);
                    events.push(InteractionEvent::new(
                        user_id,
                        target.clone(),
                        clicked,
                        timestamp,
                    ));
                    current = target;
                }
            }
        }

        Ok(events)
    }
}

fn random_item(catalog: &[ItemId], rng: &mut impl Rng) -> ItemId {
    catalog[rng.gen_range(0..catalog.len())].clone()
}
