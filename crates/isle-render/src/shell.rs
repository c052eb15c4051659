//! HTML document shell.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use isle_core::{RenderConfig, RouteParams};

use crate::escape::{escape_attr, escape_html};

/// Body of the not-found document.
pub const NOT_FOUND_BODY: &str = "404 | Not Found";

/// Head content for the shell.
#[derive(Debug, Clone, Default)]
pub struct HeadContent {
    /// Page title.
    pub title: Option<String>,
    /// Meta tags.
    pub meta: Vec<(String, String)>,
    /// Link tags (stylesheets, etc.).
    pub links: Vec<String>,
}

impl HeadContent {
    /// Create new head content with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Add a meta tag.
    pub fn with_meta(mut self, name: &str, content: &str) -> Self {
        self.meta.push((name.to_string(), content.to_string()));
        self
    }

    /// Add a stylesheet link.
    pub fn with_stylesheet(mut self, href: &str) -> Self {
        self.links.push(format!(
            r#"<link rel="stylesheet" href="{}">"#,
            escape_attr(href)
        ));
        self
    }

    /// Render head content to HTML.
    pub fn render(&self) -> String {
        let mut html = String::from("<meta charset=\"UTF-8\">\n");

        if let Some(title) = &self.title {
            html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        }

        for (name, content) in &self.meta {
            html.push_str(&format!(
                r#"<meta name="{}" content="{}">"#,
                escape_attr(name),
                escape_attr(content)
            ));
            html.push('\n');
        }

        for link in &self.links {
            html.push_str(link);
            html.push('\n');
        }

        html
    }
}

/// A full HTML document wrapping a rendered page body.
///
/// The root element carries the route id in `data-entry-page` and the
/// base64-encoded route params JSON in `data-route-params`; each island
/// client unit used on the page is loaded as a module script.
#[derive(Debug, Clone)]
pub struct Document {
    pub lang: String,
    pub head: HeadContent,
    pub entry_page: String,
    pub route_params: String,
    pub body: String,
    pub scripts: Vec<String>,
}

impl Document {
    /// Create an empty document from render settings.
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            lang: config.lang.clone(),
            head: HeadContent::new(config.title.clone()),
            entry_page: String::new(),
            route_params: String::new(),
            body: String::new(),
            scripts: Vec::new(),
        }
    }

    /// The not-found document.
    pub fn not_found(config: &RenderConfig) -> Self {
        Self::new(config).with_body(escape_html(NOT_FOUND_BODY))
    }

    /// A server error document. The message is escaped.
    pub fn error(config: &RenderConfig, message: &str) -> Self {
        Self::new(config).with_body(format!(
            "<h1>500 | Internal Server Error</h1>\n<pre>{}</pre>",
            escape_html(message)
        ))
    }

    pub fn with_head(mut self, head: HeadContent) -> Self {
        self.head = head;
        self
    }

    /// Set the route id of the page.
    pub fn with_entry_page(mut self, route_id: impl Into<String>) -> Self {
        self.entry_page = route_id.into();
        self
    }

    /// Encode route params into the root element.
    pub fn with_route_params(mut self, params: &RouteParams) -> Self {
        self.route_params = encode_route_params(params);
        self
    }

    /// Set the rendered body HTML.
    pub fn with_body(mut self, html: impl Into<String>) -> Self {
        self.body = html.into();
        self
    }

    /// Add a module script by URL.
    pub fn with_script(mut self, src: impl Into<String>) -> Self {
        self.scripts.push(src.into());
        self
    }

    /// Render the full document.
    pub fn render(&self) -> String {
        let mut html = String::from("<!DOCTYPE html>\n");
        html.push_str(&format!(r#"<html lang="{}">"#, escape_attr(&self.lang)));
        html.push_str("\n<head>\n");
        html.push_str(&self.head.render());
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!(
            r#"<div id="app" data-entry-page="{}" data-route-params="{}">"#,
            escape_attr(&self.entry_page),
            escape_attr(&self.route_params)
        ));
        html.push('\n');
        html.push_str(&self.body);
        html.push_str("\n</div>\n");
        for src in &self.scripts {
            html.push_str(&format!(
                r#"<script type="module" src="{}"></script>"#,
                escape_attr(src)
            ));
            html.push('\n');
        }
        html.push_str("</body>\n</html>\n");
        html
    }
}

/// Base64 of the route params JSON.
pub fn encode_route_params(params: &RouteParams) -> String {
    STANDARD.encode(params.to_json().to_string())
}

/// Inverse of [`encode_route_params`].
pub fn decode_route_params(encoded: &str) -> Option<serde_json::Value> {
    let bytes = STANDARD.decode(encoded).ok()?;
    serde_json::from_slice(&bytes).ok()
}
