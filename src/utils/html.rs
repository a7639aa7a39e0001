// src/utils/html.rs

/// Sanitizes the optional rich-text description attached to a question.
///
/// Whitelist based: formatting tags such as `<b>` or `<code>` survive, `<script>` is
/// removed together with its content and event-handler attributes are dropped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
