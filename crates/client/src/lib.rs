//! `campease-client`
//!
//! **Responsibility:** the client side of CampEase around the route guard.
//!
//! This crate provides:
//! - The session store with two-tier persistence
//! - The shared HTTP client (bearer injection)
//! - REST data services for camps, blogs, vehicles and notifications
//! - The guard runner that applies route-guard outcomes to navigation

pub mod config;
pub mod http;
pub mod navigation;
pub mod runner;
pub mod services;
pub mod session;
pub mod storage;

use std::sync::Arc;

use campease_auth::{RouteGuard, RoutePolicy, UnverifiedDecoder};

pub use config::{ClientConfig, ConfigError};
pub use http::{ApiClient, ApiError, BearerSource};
pub use navigation::{HistoryNavigator, Navigator, Notifier, RecordingNotifier, TracingNotifier};
pub use runner::GuardRunner;
pub use session::{Credentials, SessionError, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError, StorageTier};

/// Everything a client shell needs, wired around one session.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub session: SessionStore,
    pub api: ApiClient,
    pub guard: RouteGuard,
}

impl ClientContext {
    /// Open the persisted session storage and wire the services to it.
    pub fn open(config: &ClientConfig, policy: RoutePolicy) -> Result<Self, StorageError> {
        let storage = Arc::new(FileStorage::open(&config.storage_dir)?);
        Ok(Self::with_storage(config, policy, storage))
    }

    pub fn with_storage(config: &ClientConfig, policy: RoutePolicy, storage: Arc<dyn SessionStorage>) -> Self {
        let decoder = Arc::new(UnverifiedDecoder::new());
        let session = SessionStore::new(storage, ApiClient::new(&config.api_base_url), decoder.clone());
        let api = ApiClient::new(&config.api_base_url).with_bearer(Arc::new(session.clone()));
        let guard = RouteGuard::new(Arc::new(policy), decoder);

        Self { session, api, guard }
    }

    pub fn camps(&self) -> services::CampService {
        services::CampService::new(self.api.clone())
    }

    pub fn blogs(&self) -> services::BlogService {
        services::BlogService::new(self.api.clone())
    }

    pub fn vehicles(&self) -> services::VehicleService {
        services::VehicleService::new(self.api.clone())
    }

    pub fn notifications(&self) -> services::NotificationService {
        services::NotificationService::new(self.api.clone())
    }

    pub fn runner<N: Navigator, M: Notifier>(&self, navigator: N, notifier: M) -> GuardRunner<N, M> {
        GuardRunner::new(self.guard.clone(), self.session.clone(), navigator, notifier)
    }
}
