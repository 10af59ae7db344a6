/// Replace `${ENV_VAR}` and `${ENV_VAR:-default}` placeholders in raw config
/// text before it is parsed.
///
/// Unset variables without a default are left as-is so the parse error (or
/// the literal value) points at the missing variable.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Malformed: emit the remainder literally.
            result.push_str(&rest[start..]);
            return result;
        };
        let expr = &after[..end];
        let (name, default) = match expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (expr, None),
        };
        match (lookup(name), default) {
            (Some(val), _) if !name.is_empty() => result.push_str(&val),
            (None, Some(default)) if !name.is_empty() => result.push_str(default),
            _ => {
                result.push_str("${");
                result.push_str(expr);
                result.push('}');
            },
        }
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        (name == "MXWA_OS").then(|| "Linux".to_string())
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(substitute_with("os=${MXWA_OS}!", lookup), "os=Linux!");
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_with("${MXWA_NONEXISTENT_XYZ}", lookup),
            "${MXWA_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn uses_default_for_unknown_var() {
        assert_eq!(substitute_with("${MXWA_PORT:-29318}", lookup), "29318");
        assert_eq!(substitute_with("${MXWA_OS:-Windows}", lookup), "Linux");
    }

    #[test]
    fn malformed_placeholder_is_literal() {
        assert_eq!(substitute_with("a ${MXWA_OS", lookup), "a ${MXWA_OS");
        assert_eq!(substitute_with("${}", lookup), "${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
