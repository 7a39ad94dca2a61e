/// Granted to every registered user.
pub const ROLE_USER: &str = "ROLE_USER";
/// Grants access to the user administration API.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Linear scan for `role` in a list of role names.
pub fn contains_role<S: AsRef<str>>(roles: &[S], role: &str) -> bool {
    roles.iter().any(|r| r.as_ref() == role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_role() {
        let roles = vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()];
        assert!(contains_role(&roles, ROLE_ADMIN));
        assert!(!contains_role(&[ROLE_USER], ROLE_ADMIN));
        assert!(!contains_role::<String>(&[], ROLE_USER));
    }
}
