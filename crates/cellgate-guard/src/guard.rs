//! The downgrade guard: session pool plus transition function.
//!
//! One guard instance owns every subscriber context and the verifier
//! seam. Events go in, exactly one action comes out per event; pool
//! exhaustion yields a synthetic fail-safe action without allocating.

use cellgate_core::{IssuerKey, RatBitmap, SubscriberId};

use crate::fsm::{transition, ActionRecord, EventRecord, GateState, GuardConfig};
use crate::permit::{PermitVerifier, SignaturePresenceVerifier};
use crate::session::SessionPool;

/// Gate 2 engine for all concurrent subscribers.
pub struct DowngradeGuard<V = SignaturePresenceVerifier> {
    pool: SessionPool,
    verifier: V,
    issuer_key: IssuerKey,
    config: GuardConfig,
}

impl<V: PermitVerifier> DowngradeGuard<V> {
    /// Creates a guard with the given configuration, issuer key, and
    /// signature verifier.
    #[must_use]
    pub fn new(config: GuardConfig, issuer_key: IssuerKey, verifier: V) -> Self {
        Self {
            pool: SessionPool::new(config.session_capacity),
            verifier,
            issuer_key,
            config,
        }
    }

    /// Processes one event, producing exactly one action.
    ///
    /// Allocates a context on a subscriber's first event. When the
    /// pool is exhausted the synthetic fail-safe action is emitted and
    /// nothing is allocated.
    pub fn handle(&mut self, event: &EventRecord) -> ActionRecord {
        let Some(ctx) = self.pool.get_or_allocate(event.subscriber) else {
            tracing::warn!(
                target: "security",
                subscriber = %event.subscriber,
                capacity = self.pool.capacity(),
                "session pool exhausted, refusing subscriber"
            );
            return ActionRecord {
                subscriber: event.subscriber,
                new_state: GateState::FailSafe,
                previous_state: GateState::Init,
                trigger: event.kind,
                allow_attach: false,
                request_permit: false,
                log_security: true,
                allowed_rats: RatBitmap::NONE,
                last: event.last,
            };
        };

        let action = transition(ctx, event, &self.verifier, &self.issuer_key, &self.config);

        tracing::debug!(
            subscriber = %action.subscriber,
            from = ?action.previous_state,
            to = ?action.new_state,
            trigger = ?action.trigger,
            "transition"
        );
        if action.log_security {
            tracing::warn!(
                target: "security",
                subscriber = %action.subscriber,
                from = ?action.previous_state,
                to = ?action.new_state,
                trigger = ?action.trigger,
                allow_attach = action.allow_attach,
                "security-relevant transition"
            );
        }

        action
    }

    /// Releases a subscriber's context on detach. Returns `true` if a
    /// context existed.
    pub fn detach(&mut self, subscriber: SubscriberId) -> bool {
        self.pool.release(subscriber)
    }

    /// Current state of a subscriber, if a context is allocated.
    #[must_use]
    pub fn state_of(&self, subscriber: SubscriberId) -> Option<GateState> {
        self.pool.get(subscriber).map(|ctx| ctx.state())
    }

    /// Number of allocated contexts.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.pool.active()
    }

    /// The guard's configuration.
    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}
