//! Named custom rules referenced by validation schemas.
//!
//! Schemas never embed logic directly: a field names a predicate with
//! `custom: <name>` and the name is resolved against a [`PredicateRegistry`]
//! when the schema is compiled at startup.

use std::collections::HashMap;

/// A custom rule. Returns the user-facing message when the value is rejected.
pub type Predicate = fn(&str) -> Result<(), String>;

/// Name of the built-in username rule.
pub const USERNAME_CHARSET: &str = "username_charset";
/// Name of the built-in password rule.
pub const PASSWORD_COMPLEXITY: &str = "password_complexity";

/// Registry mapping rule names to predicate implementations.
#[derive(Clone)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Predicate>,
}

impl PredicateRegistry {
    /// Create a registry with no predicates.
    pub fn empty() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in employee form rules.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(USERNAME_CHARSET, username_charset);
        registry.register(PASSWORD_COMPLEXITY, password_complexity);
        registry
    }

    /// Register (or replace) a predicate under the given name.
    pub fn register(&mut self, name: impl Into<String>, predicate: Predicate) {
        self.predicates.insert(name.into(), predicate);
    }

    /// Look up a predicate by name.
    pub fn get(&self, name: &str) -> Option<Predicate> {
        self.predicates.get(name).copied()
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Usernames need at least one digit and one lowercase letter.
pub fn username_charset(value: &str) -> Result<(), String> {
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_lower = value.chars().any(char::is_lowercase);

    if has_digit && has_lower {
        Ok(())
    } else {
        Err("Username must contain at least one number, and lowercase letter.".to_string())
    }
}

/// Passwords need at least one digit, one uppercase and one lowercase letter.
pub fn password_complexity(value: &str) -> Result<(), String> {
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_upper = value.chars().any(char::is_uppercase);
    let has_lower = value.chars().any(char::is_lowercase);

    if has_digit && has_upper && has_lower {
        Ok(())
    } else {
        Err("Password must contain at least one number, \
             one uppercase letter, and one lowercase letter."
            .to_string())
    }
}
