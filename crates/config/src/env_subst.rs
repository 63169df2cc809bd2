//! `${ENV_VAR}` expansion for raw config text.
//!
//! `${NAME:-fallback}` expands to `fallback` when `NAME` is unset or empty.
//! Unresolvable placeholders are left untouched so the parser reports them.

/// Replace `${ENV_VAR}` placeholders using the process environment.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // Unterminated placeholder: keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };

        let value = if name.is_empty() {
            None
        } else {
            lookup(name).filter(|v| !(fallback.is_some() && v.is_empty()))
        };

        match (value, fallback) {
            (Some(v), _) => out.push_str(&v),
            (None, Some(f)) if !name.is_empty() => out.push_str(f),
            _ => out.push_str(&rest[start..start + 2 + end + 1]),
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
