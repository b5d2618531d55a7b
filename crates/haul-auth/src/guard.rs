//! Role-gated access to protected screens.
//!
//! [`decide`] is the pure verdict; [`RoleGuard`] applies it, owning at most
//! one delayed redirect which is aborted as soon as a different verdict
//! replaces it.

use std::sync::Arc;
use std::time::Duration;

use haul_config::GuardConfig;
use haul_core::Role;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::context::AuthSnapshot;

const SIGN_IN_NOTICE: &str = "Please sign in to continue.";
const FORBIDDEN_NOTICE: &str = "You do not have access to this page.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum GuardDecision {
    Checking,
    Unauthorized { message: String },
    Redirecting { route: String },
    Authorized,
}

/// Where denied users are sent, and how long the notice stays up first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRoutes {
    pub public_route: String,
    pub dashboard_route: String,
    pub redirect_delay: Duration,
}

impl Default for GuardRoutes {
    fn default() -> Self {
        Self::from(&GuardConfig::default())
    }
}

impl From<&GuardConfig> for GuardRoutes {
    fn from(config: &GuardConfig) -> Self {
        Self {
            public_route: config.public_route.clone(),
            dashboard_route: config.dashboard_route.clone(),
            redirect_delay: Duration::from_millis(config.redirect_delay_ms),
        }
    }
}

/// Verdict for a screen requiring `required`, given the current auth state.
#[must_use]
pub fn decide(required: Role, snapshot: &AuthSnapshot, routes: &GuardRoutes) -> GuardDecision {
    if snapshot.loading {
        return GuardDecision::Checking;
    }
    if let Some(message) = &snapshot.error {
        return GuardDecision::Unauthorized {
            message: message.clone(),
        };
    }
    if snapshot.user.is_none() {
        return GuardDecision::Redirecting {
            route: routes.public_route.clone(),
        };
    }
    if snapshot.role != Some(required) {
        return GuardDecision::Redirecting {
            route: routes.dashboard_route.clone(),
        };
    }
    GuardDecision::Authorized
}

/// Side effects a guard drives: toasts, navigation, rendering.
pub trait GuardEffects: Send + Sync + 'static {
    fn notify(&self, message: &str);
    fn navigate(&self, route: &str);
    fn render(&self) {}
}

pub struct RoleGuard<E: GuardEffects> {
    required: Role,
    routes: GuardRoutes,
    effects: Arc<E>,
    last: Option<GuardDecision>,
    pending: Option<JoinHandle<()>>,
}

impl<E: GuardEffects> RoleGuard<E> {
    pub const fn new(required: Role, routes: GuardRoutes, effects: Arc<E>) -> Self {
        Self {
            required,
            routes,
            effects,
            last: None,
            pending: None,
        }
    }

    #[must_use]
    pub const fn required(&self) -> Role {
        self.required
    }

    /// Re-evaluate against `snapshot` and apply the verdict's side effects.
    ///
    /// A verdict equal to the previous one is a no-op, so a redirect that is
    /// already counting down keeps its original deadline. Must be called
    /// within a Tokio runtime.
    pub fn evaluate(&mut self, snapshot: &AuthSnapshot) -> GuardDecision {
        let decision = decide(self.required, snapshot, &self.routes);
        if self.last.as_ref() == Some(&decision) {
            return decision;
        }

        self.cancel_pending();
        match &decision {
            GuardDecision::Checking => {}
            GuardDecision::Unauthorized { message } => self.effects.notify(message),
            GuardDecision::Redirecting { route } => {
                let notice = if snapshot.user.is_none() {
                    SIGN_IN_NOTICE
                } else {
                    FORBIDDEN_NOTICE
                };
                self.effects.notify(notice);
                self.schedule_redirect(route.clone());
            }
            GuardDecision::Authorized => self.effects.render(),
        }

        tracing::debug!(required = %self.required, ?decision, "guard decision");
        self.last = Some(decision.clone());
        decision
    }

    /// Follow every snapshot published by an auth context until it goes away.
    pub async fn watch(mut self, mut snapshots: watch::Receiver<AuthSnapshot>) {
        loop {
            let snapshot = snapshots.borrow_and_update().clone();
            self.evaluate(&snapshot);
            if snapshots.changed().await.is_err() {
                break;
            }
        }
    }

    #[must_use]
    pub fn has_pending_redirect(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Abort a scheduled redirect, if any.
    pub fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            if !task.is_finished() {
                tracing::debug!(required = %self.required, "cancelling pending redirect");
            }
            task.abort();
        }
    }

    fn schedule_redirect(&mut self, route: String) {
        let effects = Arc::clone(&self.effects);
        let delay = self.routes.redirect_delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            effects.navigate(&route);
        }));
    }
}

impl<E: GuardEffects> Drop for RoleGuard<E> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haul_core::Identity;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Effect {
        Notify(String),
        Navigate(String),
        Render,
    }

    #[derive(Default)]
    struct Recorder {
        effects: Mutex<Vec<Effect>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Effect> {
            std::mem::take(&mut *self.effects.lock().expect("effects"))
        }
    }

    impl GuardEffects for Recorder {
        fn notify(&self, message: &str) {
            self.effects.lock().expect("effects").push(Effect::Notify(message.into()));
        }
        fn navigate(&self, route: &str) {
            self.effects.lock().expect("effects").push(Effect::Navigate(route.into()));
        }
        fn render(&self) {
            self.effects.lock().expect("effects").push(Effect::Render);
        }
    }

    fn snapshot(user: Option<&str>, role: Option<Role>, loading: bool, error: Option<&str>) -> AuthSnapshot {
        AuthSnapshot {
            user: user.map(Identity::new),
            role,
            loading,
            error: error.map(str::to_string),
        }
    }

    #[rstest]
    #[case::loading(Role::Admin, snapshot(None, None, true, None), GuardDecision::Checking)]
    #[case::loading_wins_over_error(Role::Admin, snapshot(None, None, true, Some("x")), GuardDecision::Checking)]
    #[case::error(
        Role::Admin,
        snapshot(Some("u"), Some(Role::Admin), false, Some("backend down")),
        GuardDecision::Unauthorized { message: "backend down".into() }
    )]
    #[case::signed_out(
        Role::Driver,
        snapshot(None, None, false, None),
        GuardDecision::Redirecting { route: "/".into() }
    )]
    #[case::wrong_role(
        Role::Dispatcher,
        snapshot(Some("u"), Some(Role::Driver), false, None),
        GuardDecision::Redirecting { route: "/dashboard".into() }
    )]
    #[case::awaiting_approval(
        Role::Client,
        snapshot(Some("u"), None, false, None),
        GuardDecision::Redirecting { route: "/dashboard".into() }
    )]
    #[case::authorized(Role::Admin, snapshot(Some("u"), Some(Role::Admin), false, None), GuardDecision::Authorized)]
    fn decision_table(#[case] required: Role, #[case] snapshot: AuthSnapshot, #[case] expected: GuardDecision) {
        assert_eq!(decide(required, &snapshot, &GuardRoutes::default()), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn redirect_fires_after_delay() {
        let recorder = Arc::new(Recorder::default());
        let mut guard = RoleGuard::new(Role::Driver, GuardRoutes::default(), Arc::clone(&recorder));

        guard.evaluate(&snapshot(None, None, false, None));
        assert_eq!(recorder.take(), vec![Effect::Notify(SIGN_IN_NOTICE.into())]);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(recorder.take().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(recorder.take(), vec![Effect::Navigate("/".into())]);
        assert!(!guard.has_pending_redirect());
    }

    #[tokio::test(start_paused = true)]
    async fn changed_decision_cancels_pending_redirect() {
        let recorder = Arc::new(Recorder::default());
        let mut guard = RoleGuard::new(Role::Admin, GuardRoutes::default(), Arc::clone(&recorder));

        guard.evaluate(&snapshot(Some("u"), Some(Role::Driver), false, None));
        assert!(guard.has_pending_redirect());
        tokio::time::sleep(Duration::from_millis(500)).await;

        let decision = guard.evaluate(&snapshot(Some("u"), Some(Role::Admin), false, None));
        assert_eq!(decision, GuardDecision::Authorized);
        assert!(!guard.has_pending_redirect());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            recorder.take(),
            vec![Effect::Notify(FORBIDDEN_NOTICE.into()), Effect::Render]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_decision_keeps_original_deadline() {
        let recorder = Arc::new(Recorder::default());
        let mut guard = RoleGuard::new(Role::Admin, GuardRoutes::default(), Arc::clone(&recorder));
        let signed_out = snapshot(None, None, false, None);

        guard.evaluate(&signed_out);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        guard.evaluate(&signed_out);
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(
            recorder.take(),
            vec![Effect::Notify(SIGN_IN_NOTICE.into()), Effect::Navigate("/".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_guard_cancels_redirect() {
        let recorder = Arc::new(Recorder::default());
        let mut guard = RoleGuard::new(Role::Admin, GuardRoutes::default(), Arc::clone(&recorder));
        guard.evaluate(&snapshot(None, None, false, None));
        drop(guard);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(recorder.take(), vec![Effect::Notify(SIGN_IN_NOTICE.into())]);
    }

    #[tokio::test]
    async fn error_notifies_without_navigation() {
        let recorder = Arc::new(Recorder::default());
        let mut guard = RoleGuard::new(Role::Admin, GuardRoutes::default(), Arc::clone(&recorder));

        guard.evaluate(&snapshot(None, None, false, Some("backend down")));
        assert!(!guard.has_pending_redirect());
        assert_eq!(recorder.take(), vec![Effect::Notify("backend down".into())]);
    }
}
