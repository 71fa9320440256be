//! Property-based test generators using proptest.
//!
//! Provides strategies for configurations that are valid by construction,
//! plus key material on either side of the length limit.

use kvhost_core::{Configuration, Mode, MAX_ENCRYPTION_KEY_LEN};
use proptest::prelude::*;
use std::path::PathBuf;

/// Strategy for non-empty instance ids.
pub fn instance_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9._-]{0,31}").expect("Invalid regex")
}

/// Strategy for keys of at most 16 bytes, multi-byte characters included.
pub fn short_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-zA-Z0-9]{0,16}").expect("Invalid regex"),
        // a char is at most 4 bytes, so 4 arbitrary chars always fit
        prop::collection::vec(any::<char>(), 0..=4)
            .prop_map(|chars| chars.into_iter().collect::<String>()),
    ]
}

/// Strategy for keys longer than 16 bytes, including short-in-chars
/// multi-byte keys.
pub fn long_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-zA-Z0-9]{17,64}").expect("Invalid regex"),
        prop::string::string_regex("é{9,16}").expect("Invalid regex"),
        prop::string::string_regex("[日本語]{6,12}").expect("Invalid regex"),
    ]
}

/// Strategy for process modes.
pub fn mode_strategy() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::SingleProcess), Just(Mode::MultiProcess)]
}

/// Strategy for root directory overrides.
pub fn path_strategy() -> impl Strategy<Value = Option<PathBuf>> {
    prop::option::of(
        prop::string::string_regex("/[a-z]{1,8}(/[a-z0-9]{1,8}){0,3}")
            .expect("Invalid regex")
            .prop_map(PathBuf::from),
    )
}

/// Strategy for configurations that pass validation.
pub fn configuration_strategy() -> impl Strategy<Value = Configuration> {
    (
        prop::option::of(instance_id_strategy()),
        path_strategy(),
        prop::option::of(short_key_strategy()),
        prop::option::of(mode_strategy()),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(id, path, key, mode, read_only)| {
            let mut config = Configuration::new();
            if let Some(id) = id {
                config = config.with_id(id);
            }
            if let Some(path) = path {
                config = config.with_path(path);
            }
            if let Some(key) = key {
                config = config.with_encryption_key(key);
            }
            if let Some(mode) = mode {
                config = config.with_mode(mode);
            }
            if let Some(read_only) = read_only {
                config = config.with_read_only(read_only);
            }
            config
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn ids_are_never_empty(id in instance_id_strategy()) {
            prop_assert!(!id.is_empty());
        }

        #[test]
        fn short_keys_fit(key in short_key_strategy()) {
            prop_assert!(key.len() <= MAX_ENCRYPTION_KEY_LEN);
        }

        #[test]
        fn long_keys_overflow(key in long_key_strategy()) {
            prop_assert!(key.len() > MAX_ENCRYPTION_KEY_LEN);
        }
    }
}
