#![forbid(unsafe_code)]

//! Mount configuration.
//!
//! The only knob is the reconciliation strategy. It can be set in code or
//! through the `OOF_RECONCILER` environment variable (`auto`, `replace`,
//! `patch`).

use std::env;
use std::fmt;
use std::str::FromStr;

use oof_dom::{PatchInPlace, Reconcile, ReplaceSubtree};

/// Environment variable read by [`MountConfig::from_env`].
pub const RECONCILER_ENV: &str = "OOF_RECONCILER";

/// How a re-rendered node replaces the mounted one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcileStrategy {
    /// Patch when the `incremental-patch` feature is compiled in, replace
    /// otherwise.
    #[default]
    Auto,
    /// Swap the whole subtree.
    Replace,
    /// Edit the mounted subtree in place.
    Patch,
}

impl ReconcileStrategy {
    /// The concrete strategy after resolving `Auto`.
    #[must_use]
    pub fn resolve(self) -> Self {
        match self {
            Self::Auto if cfg!(feature = "incremental-patch") => Self::Patch,
            Self::Auto => Self::Replace,
            Self::Patch if !cfg!(feature = "incremental-patch") => {
                tracing::warn!(
                    message = "config.patch_unavailable",
                    fallback = "replace"
                );
                Self::Replace
            }
            other => other,
        }
    }

    pub(crate) fn reconciler(self) -> Box<dyn Reconcile> {
        match self.resolve() {
            Self::Patch => Box::new(PatchInPlace),
            _ => Box::new(ReplaceSubtree),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Replace => "replace",
            Self::Patch => "patch",
        }
    }
}

impl fmt::Display for ReconcileStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reconciler `{0}` (expected auto, replace or patch)")]
pub struct ParseStrategyError(pub String);

impl FromStr for ReconcileStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "replace" => Ok(Self::Replace),
            "patch" | "incremental" => Ok(Self::Patch),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Options for mounting a component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MountConfig {
    pub strategy: ReconcileStrategy,
}

impl MountConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: ReconcileStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Defaults, overridden by `OOF_RECONCILER` when it is set. An
    /// unrecognized value is logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(value) = lookup(RECONCILER_ENV) {
            match value.parse() {
                Ok(strategy) => config.strategy = strategy,
                Err(error) => {
                    tracing::warn!(message = "config.invalid_env", var = RECONCILER_ENV, %error);
                }
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names() {
        assert_eq!("auto".parse(), Ok(ReconcileStrategy::Auto));
        assert_eq!("Replace".parse(), Ok(ReconcileStrategy::Replace));
        assert_eq!(" patch ".parse(), Ok(ReconcileStrategy::Patch));
        assert!("morph".parse::<ReconcileStrategy>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        for strategy in [
            ReconcileStrategy::Auto,
            ReconcileStrategy::Replace,
            ReconcileStrategy::Patch,
        ] {
            assert_eq!(strategy.to_string().parse(), Ok(strategy));
        }
    }

    #[cfg(feature = "incremental-patch")]
    #[test]
    fn auto_prefers_patch_when_available() {
        assert_eq!(ReconcileStrategy::Auto.resolve(), ReconcileStrategy::Patch);
        assert_eq!(ReconcileStrategy::Auto.reconciler().name(), "patch");
    }

    #[cfg(not(feature = "incremental-patch"))]
    #[test]
    fn auto_falls_back_to_replace() {
        assert_eq!(ReconcileStrategy::Auto.resolve(), ReconcileStrategy::Replace);
        assert_eq!(ReconcileStrategy::Patch.resolve(), ReconcileStrategy::Replace);
    }

    #[test]
    fn replace_is_always_available() {
        assert_eq!(ReconcileStrategy::Replace.reconciler().name(), "replace");
    }

    #[test]
    fn env_lookup_overrides_default() {
        let config = MountConfig::from_lookup(|key| {
            (key == RECONCILER_ENV).then(|| "replace".to_string())
        });
        assert_eq!(config.strategy, ReconcileStrategy::Replace);

        let ignored = MountConfig::from_lookup(|_| Some("bogus".to_string()));
        assert_eq!(ignored, MountConfig::default());

        let unset = MountConfig::from_lookup(|_| None);
        assert_eq!(unset.strategy, ReconcileStrategy::Auto);
    }
}
