//! Permission vocabulary shared by the gate and its platform backends.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// SDK level from which per-media read permissions replace broad storage.
pub const MODERN_MEDIA_MIN_SDK: u32 = 33;
/// SDK level from which the manage-all storage permission exists.
pub const MANAGE_ALL_MIN_SDK: u32 = 30;

/// A platform permission that can gate access to shared storage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum PermissionCategory {
    Storage,
    Photos,
    Videos,
    Audio,
    #[strum(to_string = "Manage external storage")]
    ManageExternalStorage,
}

/// Current state of one permission category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// The kind of platform a scan runs on, as far as permissions are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlatformKind {
    /// No runtime permission model; scans always proceed.
    #[default]
    Unrestricted,
    /// Scoped storage with runtime permissions, keyed by SDK level.
    ScopedStorage { sdk_level: u32 },
}

impl PlatformKind {
    /// Categories that must be checked before scanning on this platform.
    ///
    /// Empty for platforms without a permission model.
    pub fn required_categories(self) -> &'static [PermissionCategory] {
        use PermissionCategory::*;

        match self {
            Self::Unrestricted => &[],
            Self::ScopedStorage { sdk_level } if sdk_level >= MODERN_MEDIA_MIN_SDK => {
                &[Storage, Photos, Videos, Audio]
            }
            Self::ScopedStorage { sdk_level } if sdk_level >= MANAGE_ALL_MIN_SDK => {
                &[ManageExternalStorage]
            }
            Self::ScopedStorage { .. } => &[Storage],
        }
    }

    /// Whether this platform has a runtime permission model at all.
    pub fn has_permission_model(self) -> bool {
        !matches!(self, Self::Unrestricted)
    }
}

/// Outcome of a permission check. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDecision {
    /// Whether the scan may proceed.
    pub granted: bool,
    /// Categories that were queried to reach the decision.
    pub checked_categories: BTreeSet<PermissionCategory>,
}

impl PermissionDecision {
    /// Decision for platforms without a permission model.
    pub fn unrestricted() -> Self {
        Self {
            granted: true,
            checked_categories: BTreeSet::new(),
        }
    }

    /// Create a decision over the given categories.
    pub fn new(granted: bool, categories: impl IntoIterator<Item = PermissionCategory>) -> Self {
        Self {
            granted,
            checked_categories: categories.into_iter().collect(),
        }
    }
}
