//! Parser configuration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How a table cell with several actions is handled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AmbiguityPolicy {
    /// Pick one action using static precedence and associativity.
    #[default]
    Precedence,
    /// Fork one stack version per action and let merging decide.
    Glr,
}

/// Cooperative cancellation shared between a parse and its caller.
///
/// Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        CancellationFlag::default()
    }

    /// Ask every parse observing this flag to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits and policy for one parser.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    pub policy: AmbiguityPolicy,
    /// Most stack versions alive at once; the least preferred are pruned.
    pub max_versions: usize,
    /// Most forks over a whole parse.
    pub max_forks: usize,
    /// Most entries on one stack version.
    pub max_stack_depth: usize,
    /// Most tokens lexed by one parse.
    pub max_tokens: usize,
    /// Most reductions a version performs without consuming input.
    pub max_reductions_per_token: usize,
    pub timeout: Option<Duration>,
    pub cancellation: Option<CancellationFlag>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            policy: AmbiguityPolicy::Precedence,
            max_versions: 16,
            max_forks: 1 << 16,
            max_stack_depth: 1 << 20,
            max_tokens: 1 << 28,
            max_reductions_per_token: 10_000,
            timeout: None,
            cancellation: None,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_versions(mut self, max: usize) -> Self {
        self.max_versions = max.max(1);
        self
    }

    #[must_use]
    pub fn with_max_forks(mut self, max: usize) -> Self {
        self.max_forks = max;
        self
    }

    #[must_use]
    pub fn with_max_stack_depth(mut self, max: usize) -> Self {
        self.max_stack_depth = max;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    #[must_use]
    pub fn with_max_reductions_per_token(mut self, max: usize) -> Self {
        self.max_reductions_per_token = max;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Apply the settings present in `overrides`.
    #[must_use]
    pub fn merge(mut self, overrides: &OptionOverrides) -> Self {
        if let Some(policy) = overrides.policy {
            self.policy = policy;
        }
        if let Some(max) = overrides.max_versions {
            self = self.with_max_versions(max);
        }
        if let Some(max) = overrides.max_forks {
            self.max_forks = max;
        }
        if let Some(max) = overrides.max_stack_depth {
            self.max_stack_depth = max;
        }
        if let Some(max) = overrides.max_tokens {
            self.max_tokens = max;
        }
        if let Some(max) = overrides.max_reductions_per_token {
            self.max_reductions_per_token = max;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = Some(timeout);
        }
        self
    }
}

/// Partial settings layered onto [`ParseOptions`], e.g. from command-line
/// flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionOverrides {
    pub policy: Option<AmbiguityPolicy>,
    pub max_versions: Option<usize>,
    pub max_forks: Option<usize>,
    pub max_stack_depth: Option<usize>,
    pub max_tokens: Option<usize>,
    pub max_reductions_per_token: Option<usize>,
    pub timeout: Option<Duration>,
}

impl OptionOverrides {
    pub fn is_empty(&self) -> bool {
        *self == OptionOverrides::default()
    }
}
