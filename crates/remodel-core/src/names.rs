//! Naming convention utilities for artifact and interface names.

/// Convert an identifier to `kebab-case`.
///
/// ```text
/// "BaseModel"   → "base-model"
/// "userProfile" → "user-profile"
/// "already-ok"  → "already-ok"
/// ```
///
/// Path separators are preserved so nested symbols keep their directory
/// structure (`"admin/UserRole"` → `"admin/user-role"`).
pub fn kebab_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for ch in s.chars() {
        if ch == '_' {
            result.push('-');
            prev_lower = false;
        } else if ch == '/' {
            result.push('/');
            prev_lower = false;
        } else if ch.is_ascii_uppercase() {
            if prev_lower {
                result.push('-');
            }
            result.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            result.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    result
}

/// Convert a kebab/snake/path name to `PascalCase`.
///
/// ```text
/// "base-model" → "BaseModel"
/// "user"       → "User"
/// "admin/user" → "AdminUser"
/// ```
pub fn pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;
    for ch in s.chars() {
        if ch == '-' || ch == '_' || ch == '/' || ch == '.' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(ch.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}

/// Strip exactly one trailing `.ts` or `.js` suffix.
///
/// Inner dots survive: `"user.v2.ts"` → `"user.v2"`.
pub fn strip_source_ext(s: &str) -> &str {
    s.strip_suffix(".ts")
        .or_else(|| s.strip_suffix(".js"))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("BaseModel"), "base-model");
        assert_eq!(kebab_case("userProfile"), "user-profile");
        assert_eq!(kebab_case("already-ok"), "already-ok");
        assert_eq!(kebab_case("snake_name"), "snake-name");
        assert_eq!(kebab_case("admin/UserRole"), "admin/user-role");
        assert_eq!(kebab_case(""), "");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("base-model"), "BaseModel");
        assert_eq!(pascal_case("user"), "User");
        assert_eq!(pascal_case("admin/user"), "AdminUser");
        assert_eq!(pascal_case("js_model"), "JsModel");
        assert_eq!(pascal_case(""), "");
    }

    #[test]
    fn test_strip_source_ext() {
        assert_eq!(strip_source_ext("user.ts"), "user");
        assert_eq!(strip_source_ext("user.js"), "user");
        assert_eq!(strip_source_ext("user.v2.ts"), "user.v2");
        assert_eq!(strip_source_ext("user"), "user");
    }
}
