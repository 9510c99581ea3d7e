//! GuardEvaluator - gathers guard inputs from ports and runs access guards.

use std::sync::Arc;

use crate::domain::access::{AccessGuard, GuardInput, GuardOutcome, GuardRoutes};
use crate::domain::foundation::Viewer;
use crate::ports::{Clock, SettingsError, SiteSettings};

/// Runs access guards against the current settings and time.
///
/// Settings are read once per call, so every guard in a stack sees the
/// same snapshot.
pub struct GuardEvaluator {
    settings: Arc<dyn SiteSettings>,
    clock: Arc<dyn Clock>,
    routes: GuardRoutes,
}

impl GuardEvaluator {
    pub fn new(settings: Arc<dyn SiteSettings>, clock: Arc<dyn Clock>, routes: GuardRoutes) -> Self {
        Self {
            settings,
            clock,
            routes,
        }
    }

    pub fn routes(&self) -> &GuardRoutes {
        &self.routes
    }

    /// Evaluate a single guard for `viewer` requesting `path`.
    pub async fn evaluate(
        &self,
        guard: &AccessGuard,
        viewer: &Viewer,
        path: &str,
    ) -> Result<GuardOutcome, SettingsError> {
        self.evaluate_all(std::slice::from_ref(guard), viewer, path)
            .await
    }

    /// Evaluate guards in order; the first outcome other than `Proceed` wins.
    pub async fn evaluate_all(
        &self,
        guards: &[AccessGuard],
        viewer: &Viewer,
        path: &str,
    ) -> Result<GuardOutcome, SettingsError> {
        let settings = self.settings.snapshot().await?;
        let input = GuardInput {
            viewer,
            settings: &settings,
            now: self.clock.now(),
            path,
        };

        for guard in guards {
            let outcome = guard.evaluate(&input, &self.routes);
            if !outcome.is_proceed() {
                tracing::debug!(guard = guard.name(), path, outcome = ?outcome, "access guard stopped request");
                return Ok(outcome);
            }
        }

        Ok(GuardOutcome::Proceed)
    }
}

impl std::fmt::Debug for GuardEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardEvaluator")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}
