/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Settings values are stored as text. Booleans written by the admin console use "true"/"false", but older rows use
/// "1"/"0". Anything unrecognised is `false`.
pub fn setting_is_enabled(value: Option<&str>) -> bool {
    parse_boolean_flag(value.map(String::from), false)
}
