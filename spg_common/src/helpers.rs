/// Interpret an environment flag such as `SPG_WEBHOOK_SIGNATURE_CHECKS`.
///
/// Truthy values are `1`, `true`, `yes` and `on`; falsy values are `0`, `false`, `no` and `off`, compared
/// case-insensitively after trimming. Anything else, including an unset variable, falls back to the default.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    let value = value.trim().to_ascii_lowercase();
    if matches!(value.as_str(), "1" | "true" | "yes" | "on") {
        return true;
    }
    if matches!(value.as_str(), "0" | "false" | "no" | "off") {
        return false;
    }
    default
}
