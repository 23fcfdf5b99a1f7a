//! Platform notification boundary.
//!
//! The scheduler never touches a platform notification API directly. It
//! talks to two injected seams: a [`PermissionGate`] that answers and
//! requests the notification permission, and a [`NotificationSink`] that
//! performs the actual delivery. Both are trivial to fake in tests.
//!
//! An unsupported platform is indistinguishable from a denied permission:
//! both result in silent no-op delivery, never an error.

use serde::{Deserialize, Serialize};

/// Platform notification permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Not yet decided; a prompt may be shown.
    Prompt,
    /// The platform has no notification support at all.
    Unsupported,
}

/// Boundary wrapper around the platform's permission API.
pub trait PermissionGate: Send {
    /// Current permission state, without prompting.
    fn permission(&self) -> Permission;

    /// Show the platform permission prompt and block on the outcome.
    /// Only called when [`permission`](Self::permission) is `Prompt`.
    fn prompt(&mut self) -> Permission;
}

/// Delivery side effect. Implementations log their own failures; a
/// returned error is recorded by the dispatcher as a non-delivery.
pub trait NotificationSink: Send {
    fn show(&mut self, notification: &Notification) -> Result<(), Box<dyn std::error::Error>>;
}

/// Rendered notification handed to the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Replacement key: a new notification with the same tag replaces
    /// the previous one instead of stacking.
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub require_interaction: bool,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tag: tag.into(),
            icon: None,
            require_interaction: false,
        }
    }

    /// Diagnostic notification for verifying the delivery path end to end.
    pub fn test() -> Self {
        Self::new(
            "🎉 Test notification",
            "If you can see this, notifications are working!",
            "test",
        )
    }
}

/// Caches the permission decision and de-duplicates in-flight prompts.
///
/// The scheduler runs on a single-threaded event loop, so "concurrent"
/// requests are re-entrant ones: a second request arriving while the
/// prompt is open must not open a second prompt. Such a request reports
/// not-granted; the caller observes the real outcome once the original
/// prompt resolves.
pub struct PermissionBroker<G> {
    gate: G,
    prompting: bool,
}

impl<G: PermissionGate> PermissionBroker<G> {
    pub fn new(gate: G) -> Self {
        Self {
            gate,
            prompting: false,
        }
    }

    /// True only when the platform reports the permission as granted.
    pub fn has_permission(&self) -> bool {
        self.gate.permission() == Permission::Granted
    }

    /// Current permission state without prompting.
    pub fn permission(&self) -> Permission {
        self.gate.permission()
    }

    /// Whether the platform supports notifications at all.
    pub fn supported(&self) -> bool {
        self.gate.permission() != Permission::Unsupported
    }

    /// Request the permission, prompting at most once at a time.
    /// Returns the granted/denied outcome; unsupported reports denied.
    pub fn request(&mut self) -> bool {
        match self.gate.permission() {
            Permission::Granted => true,
            Permission::Denied | Permission::Unsupported => false,
            Permission::Prompt => {
                if self.prompting {
                    return false;
                }
                self.prompting = true;
                let outcome = self.gate.prompt();
                self.prompting = false;
                outcome == Permission::Granted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingGate {
        state: Permission,
        prompts: usize,
        grant_on_prompt: bool,
    }

    impl PermissionGate for CountingGate {
        fn permission(&self) -> Permission {
            self.state
        }

        fn prompt(&mut self) -> Permission {
            self.prompts += 1;
            self.state = if self.grant_on_prompt {
                Permission::Granted
            } else {
                Permission::Denied
            };
            self.state
        }
    }

    #[test]
    fn granted_request_does_not_prompt() {
        let mut broker = PermissionBroker::new(CountingGate {
            state: Permission::Granted,
            prompts: 0,
            grant_on_prompt: false,
        });
        assert!(broker.request());
        assert_eq!(broker.gate.prompts, 0);
    }

    #[test]
    fn undecided_request_prompts_once_and_caches() {
        let mut broker = PermissionBroker::new(CountingGate {
            state: Permission::Prompt,
            prompts: 0,
            grant_on_prompt: true,
        });
        assert!(broker.request());
        assert!(broker.request());
        assert_eq!(broker.gate.prompts, 1);
    }

    #[test]
    fn unsupported_reports_denied_without_prompting() {
        let mut broker = PermissionBroker::new(CountingGate {
            state: Permission::Unsupported,
            prompts: 0,
            grant_on_prompt: true,
        });
        assert!(!broker.request());
        assert!(!broker.has_permission());
        assert!(!broker.supported());
        assert_eq!(broker.gate.prompts, 0);
    }

    #[test]
    fn denied_prompt_outcome_is_reported() {
        let mut broker = PermissionBroker::new(CountingGate {
            state: Permission::Prompt,
            prompts: 0,
            grant_on_prompt: false,
        });
        assert!(!broker.request());
        assert!(!broker.has_permission());
    }
}
