//! Rendering resolved sessions into a context block.

use async_trait::async_trait;
use hypr_core::SessionContext;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};

/// Outcome of a render call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    /// `data` holds the block.
    Ok,
    /// Rendering failed; no block.
    Error,
}

/// Renderer response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Outcome.
    pub status: RenderStatus,
    /// Rendered block when `status` is `ok`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Failure description when `status` is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderOutput {
    /// Successful render.
    pub fn ok(data: impl Into<String>) -> Self {
        Self {
            status: RenderStatus::Ok,
            data: Some(data.into()),
            error: None,
        }
    }

    /// Failed render.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RenderStatus::Error,
            data: None,
            error: Some(message.into()),
        }
    }

    /// The block, if the render succeeded and produced non-blank text.
    pub fn into_block(self) -> Option<String> {
        match self.status {
            RenderStatus::Ok => self.data.filter(|d| !d.trim().is_empty()),
            RenderStatus::Error => None,
        }
    }
}

/// Turns resolved sessions into the text block prepended to a user message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContextRenderer: Send + Sync {
    /// Render `contexts` in order.
    async fn render(&self, contexts: &[SessionContext]) -> RenderOutput;
}

// ─────────────────────────────────────────────────────────────────────────────
// Template renderer
// ─────────────────────────────────────────────────────────────────────────────

const TEMPLATE_NAME: &str = "context_block";

const CONTEXT_BLOCK_TEMPLATE: &str = r#"<context>
The user attached the following sessions. Use them to answer.
{% for s in sessions %}
<session index="{{ loop.index }}">
{% if s.title %}
Title: {{ s.title }}
{% endif %}
{% if s.date %}
Date: {{ s.date }}
{% endif %}
{% if s.event %}
Event: {{ s.event }}
{% endif %}
{% if s.participants %}
Participants: {{ s.participants | join(", ") }}
{% endif %}
{% if s.notes %}
Notes:
{{ s.notes }}
{% endif %}
{% if s.transcript %}
Transcript:
{% for line in s.transcript %}
{{ line }}
{% endfor %}
{% endif %}
</session>
{% endfor %}
</context>"#;

/// Flattened view of a session handed to the template.
#[derive(Debug, Serialize)]
struct SessionView<'a> {
    title: Option<&'a str>,
    date: Option<&'a str>,
    event: Option<&'a str>,
    participants: Vec<String>,
    notes: Option<&'a str>,
    transcript: Vec<String>,
}

impl<'a> From<&'a SessionContext> for SessionView<'a> {
    fn from(ctx: &'a SessionContext) -> Self {
        let notes = ctx
            .enhanced_content
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| ctx.raw_content.as_deref().filter(|s| !s.trim().is_empty()));
        let participants = ctx
            .participants
            .iter()
            .map(|p| match &p.job_title {
                Some(job) if !job.is_empty() => format!("{} ({job})", p.name),
                _ => p.name.clone(),
            })
            .collect();
        let transcript = ctx
            .transcript
            .iter()
            .flat_map(|t| t.segments.iter())
            .map(|seg| match &seg.speaker {
                Some(speaker) => format!("{speaker}: {}", seg.text),
                None => seg.text.clone(),
            })
            .collect();
        Self {
            title: ctx.title.as_deref(),
            date: ctx.date.as_deref(),
            event: ctx.event.as_ref().map(|e| e.name.as_str()),
            participants,
            notes,
            transcript,
        }
    }
}

/// Default renderer backed by an embedded `minijinja` template.
pub struct TemplateContextRenderer {
    env: Environment<'static>,
}

impl TemplateContextRenderer {
    /// Compile the embedded template.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template(TEMPLATE_NAME, CONTEXT_BLOCK_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render synchronously.
    pub fn render_sync(&self, contexts: &[SessionContext]) -> RenderOutput {
        let sessions: Vec<SessionView<'_>> = contexts.iter().map(SessionView::from).collect();
        let rendered = self
            .env
            .get_template(TEMPLATE_NAME)
            .and_then(|tmpl| tmpl.render(context! { sessions => sessions }));
        match rendered {
            Ok(block) => RenderOutput::ok(block),
            Err(e) => {
                tracing::warn!(error = %e, "context template failed");
                RenderOutput::error(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for TemplateContextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateContextRenderer").finish_non_exhaustive()
    }
}

#[async_trait]
impl ContextRenderer for TemplateContextRenderer {
    async fn render(&self, contexts: &[SessionContext]) -> RenderOutput {
        self.render_sync(contexts)
    }
}
