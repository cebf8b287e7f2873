//! Stack growth for recursive tree walks.
//!
//! The parser bounds how deep a submitted program may nest, but the bound is
//! still deeper than a 2 MiB blocking-pool thread can walk comfortably once
//! parse, lowering, evaluation and drop frames stack up. Wrapping each
//! recursive entry point in [`ensure_sufficient_stack`] moves the walk onto
//! a heap-allocated segment when the current stack runs low.
//!
//! On `wasm32` the call is a passthrough.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if the current one is nearly exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
