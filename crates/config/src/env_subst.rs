/// Replace `${ENV_VAR}` placeholders in a config file's raw contents.
///
/// Unresolvable or malformed placeholders are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            _ => {
                // No closing brace (or empty name): keep the literal text.
                out.push_str("${");
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "PORTERO_DB" => Some("/var/lib/portero.db".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_with("db_path = \"${PORTERO_DB}\"", lookup),
            "db_path = \"/var/lib/portero.db\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(substitute_with("x = \"${NOPE}\"", lookup), "x = \"${NOPE}\"");
    }

    #[test]
    fn leaves_unclosed_placeholder() {
        assert_eq!(substitute_with("x = ${PORTERO_DB", lookup), "x = ${PORTERO_DB");
    }

    #[test]
    fn substitutes_multiple() {
        assert_eq!(
            substitute_with("${PORTERO_DB}:${PORTERO_DB}", lookup),
            "/var/lib/portero.db:/var/lib/portero.db"
        );
    }
}
