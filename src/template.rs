//! Template engine for file-defined responses.
//!
//! Uses Handlebars to render string leaves of a JSON body against the
//! structured mock request.

use crate::request::MockRequest;
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Template engine for rendering dynamic response data.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

/// Context for template rendering.
#[derive(Debug, Serialize)]
pub struct TemplateContext<'a> {
    /// Path parameters
    pub params: &'a HashMap<String, String>,
    /// Merged query parameters
    pub query: &'a Map<String, Value>,
    /// Parsed request body
    pub body: &'a Value,
    /// Request method
    pub method: &'a str,
    /// Matched request path
    pub path: &'a str,
}

impl<'a> TemplateContext<'a> {
    pub fn new(request: &'a MockRequest, method: &'a str, path: &'a str) -> Self {
        Self {
            params: &request.params,
            query: &request.query,
            body: &request.body,
            method,
            path,
        }
    }
}

impl TemplateEngine {
    /// Create a new template engine.
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        handlebars.register_helper("json", Box::new(json_helper));
        handlebars.register_helper("default", Box::new(default_helper));
        handlebars.register_helper("upper", Box::new(upper_helper));
        handlebars.register_helper("lower", Box::new(lower_helper));

        // Output is data, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Render a template string.
    pub fn render(&self, template: &str, ctx: &TemplateContext<'_>) -> Result<String, handlebars::RenderError> {
        self.handlebars.render_template(template, ctx)
    }

    /// Render every templated string inside a JSON value.
    pub fn render_json(&self, value: &Value, ctx: &TemplateContext<'_>) -> Result<Value, handlebars::RenderError> {
        match value {
            Value::String(s) => {
                if s.contains("{{") {
                    Ok(Value::String(self.render(s, ctx)?))
                } else {
                    Ok(value.clone())
                }
            }
            Value::Array(arr) => {
                let rendered: Result<Vec<_>, _> = arr.iter().map(|v| self.render_json(v, ctx)).collect();
                Ok(Value::Array(rendered?))
            }
            Value::Object(obj) => {
                let mut rendered = Map::new();
                for (k, v) in obj {
                    rendered.insert(k.clone(), self.render_json(v, ctx)?);
                }
                Ok(Value::Object(rendered))
            }
            _ => Ok(value.clone()),
        }
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

// Custom Handlebars helpers

fn json_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).map(|v| v.value().clone()).unwrap_or(Value::Null);
    out.write(&serde_json::to_string(&value).unwrap_or_default())?;
    Ok(())
}

fn default_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).map(|v| v.value());
    let default = h.param(1).and_then(|v| v.value().as_str()).unwrap_or("");

    match value {
        Some(Value::String(s)) if !s.is_empty() => out.write(s)?,
        Some(Value::String(_)) | Some(Value::Null) | None => out.write(default)?,
        Some(v) => out.write(&v.to_string())?,
    }
    Ok(())
}

fn upper_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&value.to_uppercase())?;
    Ok(())
}

fn lower_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&value.to_lowercase())?;
    Ok(())
}
