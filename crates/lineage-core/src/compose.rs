//! Shallow member composition
//!
//! The single primitive behind extra-property injection, chain flattening
//! and mixin application. Later writers win.

use crate::value::{Members, Value};

/// Copy every member of `src` onto `dst`, overwriting same-named members
pub fn compose(dst: &mut Members, src: &Members) {
    compose_filtered(dst, src, |_| true);
}

/// Copy the members of `src` accepted by `keep` onto `dst`
pub fn compose_filtered(dst: &mut Members, src: &Members, keep: impl Fn(&Value) -> bool) {
    for (key, value) in src.iter() {
        if keep(value) {
            dst.insert(key, value.clone());
        }
    }
}
