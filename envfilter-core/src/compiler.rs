//! compiler.rs - Manages the compilation and caching of full-match patterns.
//!
//! Rule patterns must match an entire variable value, never a substring, so
//! every pattern is anchored before compilation. Compiled expressions are kept
//! in a global, shared cache keyed by the source pattern to avoid recompiling
//! the same rule on every environment preparation pass.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::debug;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::MAX_PATTERN_LENGTH;
use crate::errors::{EnvFilterError, Result};

lazy_static! {
    /// A thread-safe, global cache for compiled patterns.
    static ref COMPILED_PATTERN_CACHE: RwLock<HashMap<String, Arc<Regex>>> = RwLock::new(HashMap::new());
}

/// Compiles `pattern` so that it only matches a whole value.
///
/// This is the low-level function that performs the actual regex compilation.
pub fn compile_full_match(pattern: &str) -> Result<Regex> {
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(EnvFilterError::PatternLengthExceeded(
            pattern.len(),
            MAX_PATTERN_LENGTH,
        ));
    }

    let anchored = format!(r"\A(?:{})\z", pattern);
    RegexBuilder::new(&anchored)
        .size_limit(10 * (1 << 20)) // 10 MB limit for compiled regex
        .build()
        .map_err(|e| EnvFilterError::PatternCompilation(pattern.to_string(), e))
}

/// Gets a compiled pattern from the cache or compiles it if not found.
///
/// Returns an `Arc` so that callers can hold on to the regex without keeping
/// the cache locked.
pub fn get_or_compile(pattern: &str) -> Result<Arc<Regex>> {
    {
        let cache = COMPILED_PATTERN_CACHE
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(regex) = cache.get(pattern) {
            debug!("Serving compiled pattern from cache: {:?}", pattern);
            return Ok(Arc::clone(regex));
        }
    } // Read lock is released here.

    let compiled = Arc::new(compile_full_match(pattern)?);
    COMPILED_PATTERN_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(pattern.to_string(), Arc::clone(&compiled));

    debug!("Compiled and cached pattern: {:?}", pattern);
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchoring_requires_whole_value() {
        let re = compile_full_match("secret.*").unwrap();
        assert!(re.is_match("secret123"));
        assert!(!re.is_match("my-secret123"));
        assert!(!re.is_match("secret\nmore"));
    }

    #[test]
    fn alternation_is_anchored_as_a_group() {
        let re = compile_full_match("foo|bar").unwrap();
        assert!(re.is_match("foo"));
        assert!(re.is_match("bar"));
        assert!(!re.is_match("foobar"));
        assert!(!re.is_match("xbar"));
    }

    #[test]
    fn invalid_pattern_is_a_pattern_error() {
        let err = compile_full_match("(unclosed").unwrap_err();
        assert!(err.is_pattern_error());
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn overlong_pattern_is_rejected() {
        let pattern = "a".repeat(MAX_PATTERN_LENGTH + 1);
        match compile_full_match(&pattern) {
            Err(EnvFilterError::PatternLengthExceeded(len, max)) => {
                assert_eq!(len, MAX_PATTERN_LENGTH + 1);
                assert_eq!(max, MAX_PATTERN_LENGTH);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn cache_returns_shared_instance() {
        let a = get_or_compile("cached-[0-9]+").unwrap();
        let b = get_or_compile("cached-[0-9]+").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
