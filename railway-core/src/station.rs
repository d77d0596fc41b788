//! Stations: the individual stops of a tour and their lifecycle hooks.
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use crate::error::HookError;

/// Identifier matched against the `data-railway-station` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub String);

impl StationId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Whether a station points at a real element or floats in the viewport center.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum StationTarget {
    Targeted(StationId),
    Centered,
}

impl StationTarget {
    /// Resolve an optional id once; blank ids mean "no target".
    #[must_use]
    pub fn from_id(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::Targeted(StationId::from(id)),
            _ => Self::Centered,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Option<&StationId> {
        match self {
            Self::Targeted(id) => Some(id),
            Self::Centered => None,
        }
    }

    #[must_use]
    pub const fn is_centered(&self) -> bool {
        matches!(self, Self::Centered)
    }
}

pub type HookFuture = LocalBoxFuture<'static, Result<(), HookError>>;

/// Lifecycle callback run when arriving at or departing from a station.
#[derive(Clone)]
pub struct Hook(Rc<dyn Fn() -> HookFuture>);

impl Hook {
    /// Wrap an async callback.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<(), HookError>> + 'static,
    {
        Self(Rc::new(move || f().boxed_local()))
    }

    /// Wrap a plain side effect that cannot fail.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self(Rc::new(move || {
            f();
            futures::future::ready(Ok(())).boxed_local()
        }))
    }

    #[must_use]
    pub fn invoke(&self) -> HookFuture {
        (self.0)()
    }
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

/// Run an optional hook and ignore its failure.
///
/// Returns `false` when the hook existed and failed, which lets tests observe
/// the policy without the failure ever reaching navigation.
pub async fn run_best_effort(hook: Option<Hook>, label: &'static str) -> bool {
    let Some(hook) = hook else {
        return true;
    };
    match hook.invoke().await {
        Ok(()) => true,
        Err(err) => {
            log::debug!("ignoring {label} failure: {err}");
            false
        }
    }
}

/// One step of a tour. `C` is the rich content type (`String`, `yew::Html`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Station<C = String> {
    pub target: StationTarget,
    pub title: C,
    pub description: Option<C>,
    pub before_arrival: Option<Hook>,
    pub after_departure: Option<Hook>,
}

impl<C> Station<C> {
    /// Station highlighting the element tagged with `id`.
    pub fn targeted(id: impl Into<String>, title: C) -> Self {
        Self::new(StationTarget::from_id(Some(&id.into())), title)
    }

    /// Station rendered in the middle of the viewport.
    pub fn centered(title: C) -> Self {
        Self::new(StationTarget::Centered, title)
    }

    pub fn new(target: StationTarget, title: C) -> Self {
        Self {
            target,
            title,
            description: None,
            before_arrival: None,
            after_departure: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: C) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn before_arrival(mut self, hook: Hook) -> Self {
        self.before_arrival = Some(hook);
        self
    }

    #[must_use]
    pub fn after_departure(mut self, hook: Hook) -> Self {
        self.after_departure = Some(hook);
        self
    }
}
