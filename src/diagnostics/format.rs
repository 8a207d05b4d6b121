/// Format a message by replacing `{}` placeholders with values, in order.
///
/// # Example
/// ```
/// use vellum::diagnostics::format_message;
/// let msg = format_message("Expected {}, got {}.", &["int", "string"]);
/// assert_eq!(msg, "Expected int, got string.");
/// ```
pub fn format_message(template: &str, values: &[&str]) -> String {
    let mut result = template.to_string();
    for value in values {
        result = result.replacen("{}", value, 1);
    }
    result
}
