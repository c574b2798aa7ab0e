use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::info;

use crate::main_loop::Listener;

/// Permissions the capture screen depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    Microphone,
}

/// Everything that has to be granted before the preview starts
pub const REQUIRED_PERMISSIONS: [Permission; 2] = [Permission::Camera, Permission::Microphone];

/// Request code attached to the startup consent request
pub const REQUEST_CODE_PERMISSIONS: i32 = 10;

/// Outcome of a consent request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionResult {
    pub request_code: i32,
    pub grants: Vec<(Permission, bool)>,
}

impl PermissionResult {
    pub fn all_granted(&self) -> bool {
        self.grants.iter().all(|(_, granted)| *granted)
    }
}

/// Answers permission queries and runs the consent flow
pub trait PermissionGate: Send + Sync {
    /// Check whether a single permission is currently granted
    fn is_granted(&self, permission: Permission) -> bool;

    /// Check whether every permission in `permissions` is currently granted
    fn all_granted(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.is_granted(*p))
    }

    /// Ask for `permissions`
    ///
    /// The outcome arrives later through `reply`, never as a return value.
    fn request(
        &self,
        permissions: &[Permission],
        request_code: i32,
        reply: Listener<PermissionResult>,
    );
}

/// How a consent request is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentPolicy {
    /// Grant everything asked for
    Grant,
    /// Leave the grant table unchanged and report the asked-for permissions as denied
    #[default]
    Deny,
}

/// In-process grant table
///
/// Seeded from configuration; grants can also be flipped at runtime, which is
/// how a user revoking access from system settings is modelled.
pub struct StaticPermissionGate {
    granted: Mutex<HashSet<Permission>>,
    policy: ConsentPolicy,
}

impl StaticPermissionGate {
    pub fn new(granted: impl IntoIterator<Item = Permission>, policy: ConsentPolicy) -> Self {
        Self {
            granted: Mutex::new(granted.into_iter().collect()),
            policy,
        }
    }

    /// Gate with every required permission granted
    pub fn all_granted_gate() -> Self {
        Self::new(REQUIRED_PERMISSIONS, ConsentPolicy::Grant)
    }

    pub fn grant(&self, permission: Permission) {
        self.lock().insert(permission);
    }

    pub fn revoke(&self, permission: Permission) {
        self.lock().remove(&permission);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<Permission>> {
        // The set is always left consistent, so a poisoned lock is still usable
        self.granted.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PermissionGate for StaticPermissionGate {
    fn is_granted(&self, permission: Permission) -> bool {
        self.lock().contains(&permission)
    }

    fn request(
        &self,
        permissions: &[Permission],
        request_code: i32,
        reply: Listener<PermissionResult>,
    ) {
        info!(
            "Requesting permissions {:?} (request code {}, policy {:?})",
            permissions, request_code, self.policy
        );

        let grants = {
            let mut granted = self.lock();
            permissions
                .iter()
                .map(|p| match self.policy {
                    ConsentPolicy::Grant => {
                        granted.insert(*p);
                        (*p, true)
                    }
                    ConsentPolicy::Deny => (*p, granted.contains(p)),
                })
                .collect()
        };

        reply(PermissionResult {
            request_code,
            grants,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn capture_reply() -> (Listener<PermissionResult>, Arc<Mutex<Vec<PermissionResult>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reply: Listener<PermissionResult> = Arc::new(move |r: PermissionResult| sink.lock().unwrap().push(r));
        (reply, seen)
    }

    #[test]
    fn test_all_granted_needs_every_permission() {
        let gate = StaticPermissionGate::new([Permission::Camera], ConsentPolicy::Deny);

        assert!(gate.all_granted(&[Permission::Camera]));
        assert!(!gate.all_granted(&REQUIRED_PERMISSIONS));

        gate.grant(Permission::Microphone);
        assert!(gate.all_granted(&REQUIRED_PERMISSIONS));
    }

    #[test]
    fn test_deny_policy_keeps_existing_grants() {
        let gate = StaticPermissionGate::new([Permission::Camera], ConsentPolicy::Deny);
        let (reply, seen) = capture_reply();

        gate.request(&REQUIRED_PERMISSIONS, REQUEST_CODE_PERMISSIONS, reply);

        let results = seen.lock().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].request_code, 10);
        assert_eq!(
            results[0].grants,
            vec![(Permission::Camera, true), (Permission::Microphone, false)]
        );
        assert!(!gate.is_granted(Permission::Microphone));
    }

    #[test]
    fn test_grant_policy_updates_table() {
        let gate = StaticPermissionGate::new(std::iter::empty(), ConsentPolicy::Grant);
        let (reply, seen) = capture_reply();

        gate.request(&REQUIRED_PERMISSIONS, REQUEST_CODE_PERMISSIONS, reply);

        assert!(seen.lock().unwrap()[0].all_granted());
        assert!(gate.all_granted(&REQUIRED_PERMISSIONS));
    }
}
