//! Resolver, context, and guard wired together the way a screen uses them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use haul_auth::cache::DEFAULT_SESSION_TTL;
use haul_auth::{
    AuthContext, GuardEffects, GuardRoutes, ManualClock, MemoryBackend, RoleGuard, SessionCache,
    SessionResolver,
};
use haul_core::{Identity, Role, SessionStatus};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    Notify,
    Navigate(String),
    Render,
}

#[derive(Default)]
struct Screen {
    effects: Mutex<Vec<Effect>>,
}

impl Screen {
    fn effects(&self) -> Vec<Effect> {
        self.effects.lock().expect("effects").clone()
    }
}

impl GuardEffects for Screen {
    fn notify(&self, _message: &str) {
        self.effects.lock().expect("effects").push(Effect::Notify);
    }
    fn navigate(&self, route: &str) {
        self.effects
            .lock()
            .expect("effects")
            .push(Effect::Navigate(route.into()));
    }
    fn render(&self) {
        self.effects.lock().expect("effects").push(Effect::Render);
    }
}

fn context(dir: &TempDir, backend: &MemoryBackend) -> AuthContext<MemoryBackend> {
    let clock = ManualClock::new(Utc::now());
    let cache = SessionCache::new(dir.path(), "gate", DEFAULT_SESSION_TTL, Arc::new(clock));
    AuthContext::new(SessionResolver::new(Arc::new(backend.clone()), cache))
}

fn watch_screen(
    context: &AuthContext<MemoryBackend>,
    required: Role,
) -> (Arc<Screen>, tokio::task::JoinHandle<()>) {
    let screen = Arc::new(Screen::default());
    let guard = RoleGuard::new(required, GuardRoutes::default(), Arc::clone(&screen));
    let task = tokio::spawn(guard.watch(context.subscribe()));
    (screen, task)
}

#[tokio::test(start_paused = true)]
async fn signed_out_visitor_is_sent_to_public_route() {
    let dir = TempDir::new().expect("tmp dir");
    let backend = MemoryBackend::new();
    let context = context(&dir, &backend);
    let (screen, task) = watch_screen(&context, Role::Driver);

    tokio::task::yield_now().await;
    assert!(screen.effects().is_empty(), "checking has no side effects");

    let snapshot = context.refresh().await;
    assert_eq!(snapshot.status(), SessionStatus::SignedOut);

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(
        screen.effects(),
        vec![Effect::Notify, Effect::Navigate("/".into())]
    );
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn wrong_role_is_sent_to_dashboard() {
    let dir = TempDir::new().expect("tmp dir");
    let backend = MemoryBackend::new();
    backend.sign_in(Identity::new("u-1"));
    backend.set_role("u-1", Some(Role::Driver));
    let context = context(&dir, &backend);
    let (screen, task) = watch_screen(&context, Role::Dispatcher);

    context.refresh().await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(
        screen.effects(),
        vec![Effect::Notify, Effect::Navigate("/dashboard".into())]
    );
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn matching_role_renders_content() {
    let dir = TempDir::new().expect("tmp dir");
    let backend = MemoryBackend::new();
    backend.sign_in(Identity::new("u-admin"));
    backend.set_role("u-admin", Some(Role::Admin));
    let context = context(&dir, &backend);
    let (screen, task) = watch_screen(&context, Role::Admin);

    context.refresh().await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(screen.effects(), vec![Effect::Render]);
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn role_granted_mid_delay_cancels_redirect() {
    let dir = TempDir::new().expect("tmp dir");
    let backend = MemoryBackend::new();
    backend.sign_in(Identity::new("u-1"));
    backend.set_role("u-1", Some(Role::Driver));
    let context = context(&dir, &backend);
    let (screen, task) = watch_screen(&context, Role::Admin);

    context.refresh().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    backend.set_role("u-1", Some(Role::Admin));
    let snapshot = context.refresh_fresh().await;
    assert_eq!(snapshot.role, Some(Role::Admin));

    tokio::time::sleep(Duration::from_secs(5)).await;
    let effects = screen.effects();
    assert!(
        !effects.iter().any(|e| matches!(e, Effect::Navigate(_))),
        "redirect should have been cancelled: {effects:?}"
    );
    assert_eq!(effects.last(), Some(&Effect::Render));
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn backend_failure_notifies_without_redirect() {
    let dir = TempDir::new().expect("tmp dir");
    let backend = MemoryBackend::new();
    backend.fail_identity_lookups(Some("connection reset"));
    let context = context(&dir, &backend);
    let (screen, task) = watch_screen(&context, Role::Client);

    let snapshot = context.refresh().await;
    assert!(snapshot.error.is_some());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(screen.effects(), vec![Effect::Notify]);
    task.abort();
}
