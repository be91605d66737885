use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Expand `$VAR` / `${VAR}` references and a leading `~/` in every string
/// value of a JSON config document
///
/// Expansion happens on the parsed tree rather than the raw text, so an
/// environment value containing quotes cannot corrupt the document. An
/// unset variable is an error; config loading fails rather than silently
/// forwarding a literal `$VAR` to an upstream.
pub fn expand_values(value: &mut Value) -> Result<(), String> {
    match value {
        Value::String(s) => {
            *s = expand_str(s)?;
            Ok(())
        }
        Value::Array(items) => items.iter_mut().try_for_each(expand_values),
        Value::Object(map) => map.values_mut().try_for_each(expand_values),
        _ => Ok(()),
    }
}

fn env_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Matches `${VAR}` (group 1) or `$VAR` (group 2)
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"))
}

fn expand_str(input: &str) -> Result<String, String> {
    let mut result = String::with_capacity(input.len());
    let mut last_end = 0;

    for captures in env_re().captures_iter(input) {
        let overall = captures.get(0).expect("match exists");
        let var_name = captures
            .get(1)
            .or_else(|| captures.get(2))
            .expect("one group matches")
            .as_str();

        result.push_str(&input[last_end..overall.start()]);

        match std::env::var(var_name) {
            Ok(val) => result.push_str(&val),
            Err(_) => return Err(format!("environment variable not found: `{var_name}`")),
        }

        last_end = overall.end();
    }
    result.push_str(&input[last_end..]);

    Ok(expand_home(&result))
}

/// Expand a leading `~/` to the user's home directory
fn expand_home(input: &str) -> String {
    if let Some(rest) = input.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return format!("{}/{rest}", home.display());
    }
    input.to_owned()
}
