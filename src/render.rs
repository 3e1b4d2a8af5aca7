//! Markdown rendering of the preview notification.
//!
//! The body is a two-column markdown table assembled from a `minijinja`
//! template. Every interpolated value passes through the `html` filter, which
//! escapes `&`, `<`, `>`, `"`, and `'`.
//!
//! # Template Variables
//!
//! - `revision`: commit the preview was built from
//! - `console_url`: deployment console page
//! - `previews`: list of `{ url, qr_url }`; `qr_url` is absent when signing
//!   failed
//! - `metrics_url`: metrics dashboard
//! - `logs_url`: logs dashboard

use minijinja::{Environment, context};
use serde::Serialize;

use crate::error::NotifierError;
use crate::qr::SignedLink;

const TEMPLATE_NAME: &str = "preview_comment.md";

const COMMENT_TEMPLATE: &str = concat!(
    "|  Name | Link |\n|---------------------------------|------------------------|",
    "\n|<span aria-hidden=\"true\">🔨</span>  Latest commit |  {{ revision | html }} |",
    "\n|<span aria-hidden=\"true\">🦄</span>  Deployment Details |  ",
    "[ArgoCD]({{ console_url | html }}) |",
    "\n|<span aria-hidden=\"true\">🖥️</span>  Deployment Preview |  ",
    "{% for preview in previews %}",
    "<details><summary>{{ preview.url | html }}</summary><br>",
    "{% if preview.qr_url %}",
    "<img src=\"{{ preview.qr_url | html }}\" width=\"100\" height=\"100\">",
    "{% else %}<em>QR unavailable</em>{% endif %}",
    "</details>",
    "{% else %}Not available. No Ingress was configured.{% endfor %}|",
    "\n|<span aria-hidden=\"true\">📊</span>  Metrics |  ",
    "[Grafana]({{ metrics_url | html }}) |",
    "\n|<span aria-hidden=\"true\">📜</span>  Logs |  [Loki]({{ logs_url | html }}) |",
);

/// QR outcome for one external URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrImage {
    /// A signed image link was minted.
    Signed(SignedLink),
    /// Signing failed; the entry shows a placeholder.
    Unavailable,
}

/// One externally reachable preview URL with its QR outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    /// The externally reachable URL.
    pub url: String,
    /// QR image for the URL.
    pub qr: QrImage,
}

/// Facts gathered for one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentFacts {
    /// Commit the preview was built from.
    pub revision: String,
    /// Deployment console page.
    pub console_url: String,
    /// Preview URLs with their QR images.
    pub previews: Vec<PreviewEntry>,
    /// Metrics dashboard.
    pub metrics_url: String,
    /// Logs dashboard.
    pub logs_url: String,
}

#[derive(Debug, Serialize)]
struct TemplatePreview<'a> {
    url: &'a str,
    qr_url: Option<&'a str>,
}

impl<'a> From<&'a PreviewEntry> for TemplatePreview<'a> {
    fn from(entry: &'a PreviewEntry) -> Self {
        Self {
            url: entry.url.as_str(),
            qr_url: match &entry.qr {
                QrImage::Signed(link) => Some(link.as_str()),
                QrImage::Unavailable => None,
            },
        }
    }
}

/// Escapes the five HTML-reserved characters.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "minijinja filters receive owned arguments"
)]
fn html_filter(value: String) -> String {
    escape_html(&value)
}

/// Renders notification bodies from [`CommentFacts`].
pub struct CommentRenderer {
    env: Environment<'static>,
}

impl CommentRenderer {
    /// Compiles the comment template.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Render`] if the template fails to compile.
    pub fn new() -> Result<Self, NotifierError> {
        let mut env = Environment::new();
        env.add_filter("html", html_filter);
        env.add_template(TEMPLATE_NAME, COMMENT_TEMPLATE)
            .map_err(|error| NotifierError::Render {
                message: format!("invalid comment template: {error}"),
            })?;
        Ok(Self { env })
    }

    /// Renders the notification body.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Render`] when template evaluation fails.
    pub fn render(&self, facts: &CommentFacts) -> Result<String, NotifierError> {
        let previews: Vec<TemplatePreview<'_>> =
            facts.previews.iter().map(TemplatePreview::from).collect();

        self.env
            .get_template(TEMPLATE_NAME)
            .and_then(|template| {
                template.render(context! {
                    revision => facts.revision.as_str(),
                    console_url => facts.console_url.as_str(),
                    previews => previews,
                    metrics_url => facts.metrics_url.as_str(),
                    logs_url => facts.logs_url.as_str(),
                })
            })
            .map_err(|error| NotifierError::Render {
                message: error.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
