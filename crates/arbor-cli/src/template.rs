//! HTML page assembly.
//!
//! One minijinja template (user-supplied file or the builtin) receives the
//! server-rendered pieces and the script tags for the client bundles. The
//! pieces are trusted output of the render pass, so the template marks them
//! safe explicitly.

use crate::error::Result;
use arbor_core::bundle::PROPS_GLOBAL;
use arbor_core::cache::ArtifactSet;
use arbor_core::RenderOutput;
use minijinja::{context, Environment};
use rustc_hash::FxHashMap;
use std::path::Path;

const TEMPLATE_NAME: &str = "page.html";

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    {{ head | safe }}
    <style>{{ style | safe }}</style>
  </head>
  <body>
    {{ body_html | safe }}
    {{ script_tags | safe }}
  </body>
</html>
"#;

/// Compiled page template.
pub struct PageTemplate {
    env: Environment<'static>,
}

impl PageTemplate {
    /// Load the template from `path`, or compile the builtin.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let source = match path {
            Some(path) => std::fs::read_to_string(path)?,
            None => DEFAULT_TEMPLATE.to_string(),
        };
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source)?;
        Ok(Self { env })
    }

    /// Render the full page for one route.
    pub fn render_page(
        &self,
        render: &RenderOutput,
        artifacts: &ArtifactSet,
        params: Option<&FxHashMap<String, String>>,
        hmr: bool,
    ) -> Result<String> {
        let script_tags = script_tags(artifacts, params, hmr);
        let html = self.env.get_template(TEMPLATE_NAME)?.render(context! {
            head => render.head,
            style => render.css,
            body_html => render.html,
            script_tags => script_tags,
        })?;
        Ok(html)
    }
}

/// Client-side script tags: the props global, the module/nomodule bundle
/// pair, and (in dev) the reload client.
fn script_tags(
    artifacts: &ArtifactSet,
    params: Option<&FxHashMap<String, String>>,
    hmr: bool,
) -> String {
    let props = params
        .and_then(|p| serde_json::to_string(p).ok())
        .unwrap_or_else(|| "{}".to_string());

    let mut tags = format!("<script>window.{PROPS_GLOBAL} = {props};</script>\n");
    tags.push_str(&format!(
        "<script type=\"module\" src=\"/_js/{}\"></script>\n",
        artifacts.dom
    ));
    tags.push_str(&format!(
        "<script nomodule src=\"/_js/{}\"></script>\n",
        artifacts.iife
    ));
    if hmr {
        tags.push_str("<script type=\"module\" src=\"/@hmr-client\"></script>\n");
    }
    tags
}
