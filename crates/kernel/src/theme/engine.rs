//! Tera template engine with the site's custom filters.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tera::{Tera, Value};
use tracing::debug;

/// Loaded templates plus the site's filters.
pub struct ThemeEngine {
    tera: Tera,
}

impl ThemeEngine {
    /// Load every `**/*.html` template under `template_dir`.
    ///
    /// `files_url` is the public prefix uploaded photos are served from.
    pub fn new(template_dir: &Path, files_url: &str) -> Result<Self> {
        let glob = template_dir.join("**/*.html");
        let glob = glob
            .to_str()
            .with_context(|| format!("template path is not UTF-8: {}", template_dir.display()))?;

        let mut tera = Tera::new(glob)
            .with_context(|| format!("failed to parse templates in {}", template_dir.display()))?;
        register_filters(&mut tera, files_url);
        debug!(count = tera.get_template_names().count(), "templates loaded");

        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &tera::Context) -> tera::Result<String> {
        self.tera.render(template, context)
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine").finish_non_exhaustive()
    }
}

fn register_filters(tera: &mut Tera, files_url: &str) {
    tera.register_filter("format_date", |value: &Value, _: &HashMap<String, Value>| {
        Ok(Value::String(format_date(value).unwrap_or_default()))
    });

    tera.register_filter("money", |value: &Value, _: &HashMap<String, Value>| {
        Ok(Value::String(money(value).unwrap_or_default()))
    });

    let files_url = files_url.trim_end_matches('/').to_string();
    tera.register_filter("photo_url", move |value: &Value, _: &HashMap<String, Value>| {
        let uri = tera::try_get_value!("photo_url", "value", String, value);
        Ok(Value::String(photo_url(&files_url, &uri)))
    });
}

/// "12 December 2025" from an RFC 3339 string or a Unix timestamp.
fn format_date(value: &Value) -> Option<String> {
    let dt: DateTime<Utc> = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc),
        Value::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0)?,
        _ => return None,
    };
    Some(dt.format("%-d %B %Y").to_string())
}

/// "1234.50 €" from a decimal string or number.
fn money(value: &Value) -> Option<String> {
    let mut amount = match value {
        Value::String(s) => Decimal::from_str(s).ok()?,
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok()?,
        _ => return None,
    };
    amount.rescale(2);
    Some(format!("{amount} €"))
}

/// Public URL for a stored photo URI.
fn photo_url(files_url: &str, uri: &str) -> String {
    match uri.strip_prefix("local://") {
        Some(path) => format!("{files_url}/{path}"),
        None => uri.to_string(),
    }
}
