//! Three-tier degradation.
//!
//! Every stage tries the model with a full prompt, then with a reduced one,
//! then falls back to a deterministic heuristic that cannot fail.

use projcraft_error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Primary,
    Secondary,
    Tertiary,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self != Tier::Primary
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value and the tier that produced it
#[derive(Debug)]
pub struct Degraded<T> {
    pub value: T,
    pub tier: Tier,
    /// Failures of the tiers that were tried before `tier`
    pub failures: Vec<Error>,
}

impl<T> Degraded<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Degraded<U> {
        Degraded {
            value: f(self.value),
            tier: self.tier,
            failures: self.failures,
        }
    }

    /// Short note for conversation messages, empty for primary results
    pub fn fallback_note(&self) -> String {
        match self.tier {
            Tier::Primary => String::new(),
            tier => format!(" ({} fallback)", tier),
        }
    }
}

/// Run `primary`, then `secondary`, then `tertiary`, stopping at the first
/// success. Later tiers are only built when needed.
pub async fn degrade<T, P, PF, S, SF>(
    stage: &'static str,
    primary: P,
    secondary: S,
    tertiary: impl FnOnce() -> T,
) -> Degraded<T>
where
    P: FnOnce() -> PF,
    PF: Future<Output = Result<T>>,
    S: FnOnce() -> SF,
    SF: Future<Output = Result<T>>,
{
    let mut failures = Vec::new();

    match primary().await {
        Ok(value) => return Degraded { value, tier: Tier::Primary, failures },
        Err(e) => {
            warn!(stage, tier = "primary", error = %e, "tier failed");
            failures.push(e);
        }
    }

    match secondary().await {
        Ok(value) => return Degraded { value, tier: Tier::Secondary, failures },
        Err(e) => {
            warn!(stage, tier = "secondary", error = %e, "tier failed");
            failures.push(e);
        }
    }

    Degraded {
        value: tertiary(),
        tier: Tier::Tertiary,
        failures,
    }
}
