//! Wildcard pattern matching and the compiled-regex cache backing it.
//!
//! Adapted directly from the glob-to-regex-cache shape used by the crate this one was built
//! from: a process-wide cache of compiled patterns keyed by the literal glob string, read-locked
//! on the fast path and write-locked (with a re-check) only when a genuinely new pattern needs
//! compiling.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

#[cfg(feature = "regex")]
use regex::Regex;

static PATTERN_CACHE: LazyLock<RwLock<HashMap<String, CompiledPattern>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

#[derive(Clone)]
enum CompiledPattern {
    Literal(String),
    #[cfg(feature = "regex")]
    Wildcard(Regex),
}

/// Translates a glob-style pattern (`*` meaning "any run of characters") into an anchored regex
/// source string.
#[cfg(feature = "regex")]
fn glob_to_regex_source(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 2);
    out.push('^');
    for (i, part) in glob.split('*').enumerate() {
        if i > 0 {
            out.push_str(".*");
        }
        out.push_str(&regex::escape(part));
    }
    out.push('$');
    out
}

fn get_or_compile(pattern: &str) -> CompiledPattern {
    {
        let cache = PATTERN_CACHE.read().expect("pattern cache poisoned");
        if let Some(compiled) = cache.get(pattern) {
            return compiled.clone();
        }
    }

    #[cfg(feature = "regex")]
    let compiled = if pattern.contains('*') {
        match Regex::new(&glob_to_regex_source(pattern)) {
            Ok(re) => CompiledPattern::Wildcard(re),
            Err(_) => CompiledPattern::Literal(pattern.to_string()),
        }
    } else {
        CompiledPattern::Literal(pattern.to_string())
    };
    #[cfg(not(feature = "regex"))]
    let compiled = CompiledPattern::Literal(pattern.to_string());

    let mut cache = PATTERN_CACHE.write().expect("pattern cache poisoned");
    if !cache.contains_key(pattern) {
        cache.insert(pattern.to_string(), compiled.clone());
    }
    compiled
}

/// Does `value` match `pattern`? Without the `regex` feature (or when `pattern` has no `*`),
/// this is literal string equality.
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    match get_or_compile(pattern) {
        CompiledPattern::Literal(lit) => lit == value,
        #[cfg(feature = "regex")]
        CompiledPattern::Wildcard(re) => re.is_match(value),
    }
}

/// Clears the pattern cache. Test-only; production callers never need to invalidate it since
/// glob→regex translation is a pure function of the pattern string.
#[cfg(test)]
pub(crate) fn clear_pattern_cache() {
    PATTERN_CACHE.write().expect("pattern cache poisoned").clear();
}
