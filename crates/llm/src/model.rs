pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Model used when settings leave `model` blank.
pub fn default_model_for(provider_id: &str) -> &'static str {
    match provider_id.trim() {
        "openai" | "rig-openai" => DEFAULT_OPENAI_MODEL,
        _ => DEFAULT_GEMINI_MODEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_model_follows_the_provider() {
        assert_eq!(default_model_for("openai"), DEFAULT_OPENAI_MODEL);
        assert_eq!(default_model_for(" rig-openai "), DEFAULT_OPENAI_MODEL);
        assert_eq!(default_model_for("gemini"), DEFAULT_GEMINI_MODEL);
        assert_eq!(default_model_for(""), DEFAULT_GEMINI_MODEL);
    }
}
