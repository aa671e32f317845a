//! Decides whether the fuser is enabled.
//!
//! Three sources, in precedence order:
//!   1. the value assigned through [`FuserEnabler::set_enabled`]
//!   2. the `SPECGUARD_FUSER_ENABLE` environment variable
//!   3. the capability predicate
//! `SPECGUARD_FUSER_FORCE_DISABLE` overrides all three.
//!
//! Enabling through 1 or 2 on a system that cannot run the fuser is an
//! error; the capability default never is.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use specguard_utils::env::{EnvSource, ProcessEnv, parse_enable, parse_strict_on};
use tracing::{debug, warn};

use super::FuserError;
use super::capability::Capability;

pub const ENABLE_ENV_VAR: &str = "SPECGUARD_FUSER_ENABLE";
pub const FORCE_DISABLE_ENV_VAR: &str = "SPECGUARD_FUSER_FORCE_DISABLE";

pub struct FuserEnabler {
    runtime_assigned: Mutex<Option<bool>>,
    startup_checked: OnceCell<()>,
    env_default: OnceCell<Option<bool>>,
    force_disable: OnceCell<bool>,
    capability: Arc<dyn Capability>,
    env: Arc<dyn EnvSource>,
}

impl FuserEnabler {
    /// Enabler reading the process environment.
    pub fn new(capability: Arc<dyn Capability>) -> Self {
        Self::with_env(capability, Arc::new(ProcessEnv))
    }

    pub fn with_env(capability: Arc<dyn Capability>, env: Arc<dyn EnvSource>) -> Self {
        Self {
            runtime_assigned: Mutex::new(None),
            startup_checked: OnceCell::new(),
            env_default: OnceCell::new(),
            force_disable: OnceCell::new(),
            capability,
            env,
        }
    }

    pub fn is_enabled(&self) -> Result<bool, FuserError> {
        let assigned = self.runtime_assigned.lock();
        self.resolve(*assigned)
    }

    /// Assigns the enabled state and returns the previous effective value.
    /// Disabling always succeeds.
    pub fn set_enabled(&self, enabled: bool) -> Result<bool, FuserError> {
        let mut assigned = self.runtime_assigned.lock();
        self.assert_can_be_enabled(enabled)?;
        let previous = match self.resolve(*assigned) {
            Ok(previous) => previous,
            // The environment asked for a fuser this system cannot run, so
            // it was never effectively on.
            Err(FuserError::Capability) if !enabled => false,
            Err(err) => return Err(err),
        };
        *assigned = Some(enabled);
        debug!(enabled, previous, "fuser enablement assigned");
        Ok(previous)
    }

    /// The value assigned through [`Self::set_enabled`], if any.
    pub fn explicit_override(&self) -> Option<bool> {
        *self.runtime_assigned.lock()
    }

    pub fn capability(&self) -> &dyn Capability {
        self.capability.as_ref()
    }

    /// Environment default, read once.
    pub fn env_default(&self) -> Option<bool> {
        *self.env_default.get_or_init(|| {
            let value = self.env.var(ENABLE_ENV_VAR).map(|raw| parse_enable(&raw));
            debug!(var = ENABLE_ENV_VAR, ?value, "read fuser environment default");
            value
        })
    }

    /// Force-disable flag, read once.
    pub fn force_disabled(&self) -> bool {
        *self.force_disable.get_or_init(|| {
            let value = self
                .env
                .var(FORCE_DISABLE_ENV_VAR)
                .is_some_and(|raw| parse_strict_on(&raw));
            debug!(var = FORCE_DISABLE_ENV_VAR, ?value, "read fuser force-disable flag");
            value
        })
    }

    fn resolve(&self, assigned: Option<bool>) -> Result<bool, FuserError> {
        // The environment default is validated once, unless an assignment
        // has already replaced it. A failed validation is retried on the
        // next query.
        self.startup_checked.get_or_try_init(|| {
            if assigned.is_none() {
                if let Some(from_env) = self.env_default() {
                    self.assert_can_be_enabled(from_env)?;
                }
            }
            Ok::<(), FuserError>(())
        })?;

        if self.force_disabled() {
            return Ok(false);
        }
        if let Some(assigned) = assigned {
            return Ok(assigned);
        }
        if let Some(from_env) = self.env_default() {
            return Ok(from_env);
        }
        Ok(self.capability.can_be_enabled())
    }

    fn assert_can_be_enabled(&self, enabled: bool) -> Result<(), FuserError> {
        if enabled && !self.capability.can_be_enabled() {
            warn!("attempted to enable the fuser without the required capabilities");
            return Err(FuserError::Capability);
        }
        Ok(())
    }
}

impl std::fmt::Debug for FuserEnabler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuserEnabler")
            .field("runtime_assigned", &*self.runtime_assigned.lock())
            .field("env_default", &self.env_default.get())
            .field("force_disable", &self.force_disable.get())
            .finish_non_exhaustive()
    }
}
