//! Permission gate consulted before a scan may start.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use dirscout_core::{PermissionCategory, PermissionDecision, PermissionStatus, PlatformKind};

/// Type alias for boxed futures returned by async backend methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Platform permission API.
///
/// Implementations wrap whatever the host platform offers for querying and
/// interactively requesting storage permissions.
pub trait PermissionBackend: Send + Sync {
    /// Current status of one category, without prompting.
    fn status(&self, category: PermissionCategory) -> PermissionStatus;

    /// Interactively request all of `categories` at once.
    ///
    /// Returns the status of each requested category after the prompt.
    fn request<'a>(
        &'a self,
        categories: &'a [PermissionCategory],
    ) -> BoxFuture<'a, Vec<(PermissionCategory, PermissionStatus)>>;
}

/// Backend for hosts where every category is always granted.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrantAll;

impl PermissionBackend for GrantAll {
    fn status(&self, _category: PermissionCategory) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn request<'a>(
        &'a self,
        categories: &'a [PermissionCategory],
    ) -> BoxFuture<'a, Vec<(PermissionCategory, PermissionStatus)>> {
        Box::pin(async move {
            categories
                .iter()
                .map(|c| (*c, PermissionStatus::Granted))
                .collect()
        })
    }
}

/// Decides whether a scan may proceed on a given platform.
#[derive(Clone)]
pub struct PermissionGate {
    backend: Arc<dyn PermissionBackend>,
}

impl PermissionGate {
    /// Create a gate over a platform backend.
    pub fn new(backend: impl PermissionBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Gate that never denies.
    pub fn unrestricted() -> Self {
        Self::new(GrantAll)
    }

    /// Check permissions for `platform`, prompting at most once.
    ///
    /// The scan is allowed if any category of the platform's tier ends up
    /// granted. Platforms without a permission model are always allowed and
    /// the backend is never consulted.
    pub async fn check(&self, platform: PlatformKind) -> PermissionDecision {
        if !platform.has_permission_model() {
            return PermissionDecision::unrestricted();
        }

        let categories = platform.required_categories();

        let denied: Vec<PermissionCategory> = categories
            .iter()
            .copied()
            .filter(|c| !self.backend.status(*c).is_granted())
            .collect();

        if denied.is_empty() {
            return PermissionDecision::new(true, categories.iter().copied());
        }

        debug!(?denied, "requesting storage permissions");
        let results = self.backend.request(categories).await;
        let granted = results
            .iter()
            .any(|(category, status)| categories.contains(category) && status.is_granted());

        if !granted {
            warn!(?categories, "storage permissions denied");
        }

        PermissionDecision::new(granted, categories.iter().copied())
    }
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend with fixed current grants and a fixed answer to the prompt.
    struct Scripted {
        granted_now: HashSet<PermissionCategory>,
        granted_after_prompt: HashSet<PermissionCategory>,
        requests: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(
            now: &[PermissionCategory],
            after: &[PermissionCategory],
        ) -> (Self, Arc<AtomicUsize>) {
            let requests = Arc::new(AtomicUsize::new(0));
            let backend = Self {
                granted_now: now.iter().copied().collect(),
                granted_after_prompt: after.iter().copied().collect(),
                requests: requests.clone(),
            };
            (backend, requests)
        }
    }

    impl PermissionBackend for Scripted {
        fn status(&self, category: PermissionCategory) -> PermissionStatus {
            if self.granted_now.contains(&category) {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            }
        }

        fn request<'a>(
            &'a self,
            categories: &'a [PermissionCategory],
        ) -> BoxFuture<'a, Vec<(PermissionCategory, PermissionStatus)>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                categories
                    .iter()
                    .map(|c| {
                        let status = if self.granted_after_prompt.contains(c) {
                            PermissionStatus::Granted
                        } else {
                            PermissionStatus::Denied
                        };
                        (*c, status)
                    })
                    .collect()
            })
        }
    }

    const MODERN: PlatformKind = PlatformKind::ScopedStorage { sdk_level: 34 };

    #[tokio::test]
    async fn test_unrestricted_platform_never_prompts() {
        let (backend, requests) = Scripted::new(&[], &[]);
        let gate = PermissionGate::new(backend);

        let decision = gate.check(PlatformKind::Unrestricted).await;
        assert!(decision.granted);
        assert!(decision.checked_categories.is_empty());
        assert_eq!(requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_already_granted_skips_prompt() {
        use PermissionCategory::*;
        let (backend, requests) = Scripted::new(&[Storage, Photos, Videos, Audio], &[]);
        let gate = PermissionGate::new(backend);

        let decision = gate.check(MODERN).await;
        assert!(decision.granted);
        assert_eq!(decision.checked_categories.len(), 4);
        assert_eq!(requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_single_grant_after_prompt_is_enough() {
        use PermissionCategory::*;
        let (backend, requests) = Scripted::new(&[], &[Audio]);
        let gate = PermissionGate::new(backend);

        let decision = gate.check(MODERN).await;
        assert!(decision.granted);
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_denial_after_single_prompt() {
        let (backend, requests) = Scripted::new(&[], &[]);
        let gate = PermissionGate::new(backend);

        let decision = gate
            .check(PlatformKind::ScopedStorage { sdk_level: 31 })
            .await;
        assert!(!decision.granted);
        assert!(
            decision
                .checked_categories
                .contains(&PermissionCategory::ManageExternalStorage)
        );
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_grant_all_backend() {
        let gate = PermissionGate::unrestricted();
        let decision = gate
            .check(PlatformKind::ScopedStorage { sdk_level: 21 })
            .await;
        assert!(decision.granted);
    }
}
