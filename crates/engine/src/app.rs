//! Application state and composition.

use std::sync::Arc;

use trionforge_domain::{SessionId, StatRules, TriggerCatalog};

use crate::infrastructure::{
    app_settings::AppSettings,
    clock::{SystemClock, SystemRandom},
    ports::{CharacterRepo, ClockPort, IdentityPort, ProfileRepo, RandomPort},
};
use crate::stores::SessionStore;
use crate::use_cases::{self, EditorContext, EditorSession, LimitProvider};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
    pub catalog: Arc<TriggerCatalog>,
    pub sessions: SessionStore,
}

/// Storage ports the use cases are built on.
pub struct Repositories {
    pub profile: Arc<dyn ProfileRepo>,
    pub character: Arc<dyn CharacterRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub auth: use_cases::AuthUseCases,
    pub editor: EditorContext,
}

impl App {
    pub fn new(
        settings: &AppSettings,
        catalog: TriggerCatalog,
        repositories: Repositories,
        identity: Arc<dyn IdentityPort>,
    ) -> Self {
        Self::with_ports(
            settings,
            catalog,
            repositories,
            identity,
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
        )
    }

    pub fn with_ports(
        settings: &AppSettings,
        catalog: TriggerCatalog,
        repositories: Repositories,
        identity: Arc<dyn IdentityPort>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let sessions = SessionStore::new(
            clock.clone(),
            settings.session_idle_timeout,
            settings.max_sessions,
        );
        let limits = Arc::new(LimitProvider::new(
            repositories.profile,
            random,
            settings.limit_policy,
            settings.limits_timeout,
        ));

        let editor = EditorContext {
            catalog: catalog.clone(),
            rules: Arc::new(StatRules::default()),
            vip: Arc::new(settings.vip_emails.clone()),
            limits,
            characters: repositories.character,
            clock,
        };

        let use_cases = UseCases {
            auth: use_cases::AuthUseCases::new(identity),
            editor,
        };

        Self {
            use_cases,
            catalog,
            sessions,
        }
    }

    /// Open a signed-out editor session.
    pub fn open_session(&self) -> SessionId {
        self.sessions
            .insert(EditorSession::new(self.use_cases.editor.clone()))
    }
}
