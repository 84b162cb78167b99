//! Stack growth for recursive tree walks.
//!
//! Tree verification, compaction and structural comparison recurse over
//! nodes. Error recovery can produce arbitrarily deep right-nested trees, so
//! the recursive paths are wrapped in [`ensure_sufficient_stack`].
//!
//! On wasm the wrapper is a plain call.

/// Grow when less than this much stack remains.
const MIN_REMAINING: usize = 128 * 1024;

/// Size of each new stack segment.
const SEGMENT: usize = 2 * 1024 * 1024;

/// Run `f`, first moving to a fresh stack segment if this one is nearly
/// exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(MIN_REMAINING, SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::ensure_sufficient_stack;

    fn nest(n: u32) -> u32 {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { nest(n - 1) + 1 })
    }

    #[test]
    fn recursion_past_the_main_stack() {
        assert_eq!(nest(250_000), 250_000);
    }
}
