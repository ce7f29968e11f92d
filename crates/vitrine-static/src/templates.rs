//! Templates for the configuration object delivered to the browser.

use minijinja::{context, Environment};

use crate::runtime::RuntimeConfig;

/// Template engine using minijinja.
///
/// Template names carry no file extension so minijinja applies no
/// auto-escaping; values are encoded with [`js_string`] before rendering.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the built-in templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template_owned("config_script".to_string(), CONFIG_SCRIPT_TEMPLATE.to_string())
            .expect("Failed to add config script template");

        env.add_template_owned("config_file".to_string(), CONFIG_FILE_TEMPLATE.to_string())
            .expect("Failed to add config file template");

        Self { env }
    }

    /// Render the inline `<script>` element assigning the configuration object.
    pub fn render_script(&self, config: &RuntimeConfig) -> Result<String, minijinja::Error> {
        self.render("config_script", Some(config))
    }

    /// Render a standalone `config.js`.
    ///
    /// Without a configuration the file is a stub whose fields are empty strings.
    pub fn render_file(&self, config: Option<&RuntimeConfig>) -> Result<String, minijinja::Error> {
        self.render("config_file", config)
    }

    fn render(
        &self,
        template: &str,
        config: Option<&RuntimeConfig>,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template)?;

        let (url, key) = match config {
            Some(c) => (js_string(&c.api_url), js_string(&c.api_key)),
            None => (js_string(""), js_string("")),
        };

        let mut out = tmpl.render(context! { url => url, key => key })?;
        out.push('\n');
        Ok(out)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a value as a JavaScript string literal safe to embed in `<script>`.
///
/// JSON string syntax handles quotes and backslashes; `<`, `>` and `&` are
/// additionally written as unicode escapes so no value can close the element.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

const CONFIG_SCRIPT_TEMPLATE: &str = r#"<script>
  window.CONFIG = {
    SUPABASE_URL: {{ url }},
    SUPABASE_KEY: {{ key }}
  };
</script>"#;

const CONFIG_FILE_TEMPLATE: &str = r#"// Generated by vitrine. Do not edit.
window.CONFIG = {
  SUPABASE_URL: {{ url }},
  SUPABASE_KEY: {{ key }}
};"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_inline_script() {
        let engine = TemplateEngine::new();
        let script = engine
            .render_script(&RuntimeConfig::new("https://x.test", "key123"))
            .unwrap();

        assert!(script.starts_with("<script>"));
        assert!(script.contains(r#"SUPABASE_URL: "https://x.test""#));
        assert!(script.contains(r#"SUPABASE_KEY: "key123""#));
        assert!(script.trim_end().ends_with("</script>"));
    }

    #[test]
    fn renders_stub_file() {
        let engine = TemplateEngine::new();
        let file = engine.render_file(None).unwrap();

        assert!(file.contains(r#"SUPABASE_URL: """#));
        assert!(file.contains(r#"SUPABASE_KEY: """#));
        assert!(!file.contains("<script>"));
    }

    #[test]
    fn escapes_quotes_and_markup() {
        assert_eq!(js_string(r#"a"b\c"#), r#""a\"b\\c""#);
        assert_eq!(js_string("</script>"), r#""\u003c/script\u003e""#);
        assert_eq!(js_string("a&b"), r#""a\u0026b""#);
    }

    #[test]
    fn hostile_value_cannot_close_script() {
        let engine = TemplateEngine::new();
        let script = engine
            .render_script(&RuntimeConfig::new("https://x.test", "</script><script>alert(1)"))
            .unwrap();

        assert_eq!(script.matches("</script>").count(), 1);
    }
}
