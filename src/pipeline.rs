//! Pipeline driver.
//!
//! Runs the stages strictly in order and never branches back:
//!
//! ```text
//! START → FETCHED → COMMENTED → (IMAGE_ATTEMPTED) → PUBLISHED | ABORTED
//! ```
//!
//! Only a missing article aborts. Commentary always yields text, a failed
//! image is carried forward as "no image", and a failed post is recorded as
//! the terminal outcome. Every failure becomes one diagnostic in the
//! [`RunReport`], logged with whether it was recovered.

use crate::api::AskAsync;
use crate::commentator::Commentator;
use crate::errors::StageFailure;
use crate::image::ImageRenderer;
use crate::models::{BodyOrigin, Diagnostic, RunOutcome, RunReport};
use crate::publisher::{PostClient, Publisher};
use crate::sources::NewsSource;
use chrono::Local;
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

/// Reason recorded when the source yields nothing.
pub const NO_ARTICLE: &str = "no article";

/// Position of a run in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    Fetched,
    Commented,
    ImageAttempted,
    Published,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Start => "START",
            RunState::Fetched => "FETCHED",
            RunState::Commented => "COMMENTED",
            RunState::ImageAttempted => "IMAGE_ATTEMPTED",
            RunState::Published => "PUBLISHED",
            RunState::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

/// Book-keeping for one run: current state and diagnostics so far.
#[derive(Debug)]
struct RunLog {
    state: RunState,
    diagnostics: Vec<Diagnostic>,
}

impl RunLog {
    fn new() -> Self {
        Self {
            state: RunState::Start,
            diagnostics: Vec::new(),
        }
    }

    fn advance(&mut self, next: RunState) {
        debug!(from = %self.state, to = %next, "Pipeline transition");
        self.state = next;
    }

    fn record(&mut self, failure: StageFailure) {
        if failure.is_fatal() {
            error!(kind = failure.kind(), recovered = false, "{}", failure);
        } else {
            warn!(kind = failure.kind(), recovered = true, "{}", failure);
        }
        self.diagnostics.push(failure.to_diagnostic());
    }
}

/// The four stages wired together.
///
/// `renderer` is `None` when image rendering is disabled; the stage is then
/// skipped without any call.
#[derive(Debug)]
pub struct Pipeline<N, A, R, C> {
    source: N,
    commentator: Commentator<A>,
    renderer: Option<R>,
    publisher: Publisher<C>,
}

impl<N, A, R, C> Pipeline<N, A, R, C>
where
    N: NewsSource,
    A: AskAsync,
    R: ImageRenderer,
    C: PostClient,
{
    pub fn new(
        source: N,
        commentator: Commentator<A>,
        renderer: Option<R>,
        publisher: Publisher<C>,
    ) -> Self {
        Self {
            source,
            commentator,
            renderer,
            publisher,
        }
    }

    #[cfg(test)]
    pub fn publisher(&self) -> &Publisher<C> {
        &self.publisher
    }

    /// Execute one run. Always returns a report; never panics on stage failure.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> RunReport {
        let now = Local::now();
        let local_date = now.date_naive().to_string();
        let local_time = now.format("%H:%M:%S").to_string();
        let mut log = RunLog::new();

        let Some(article) = self.source.fetch().await else {
            log.record(StageFailure::SourceUnavailable(
                "no item with a title and a usable link".to_string(),
            ));
            log.advance(RunState::Aborted);
            return RunReport {
                local_date,
                local_time,
                article: None,
                commentary: None,
                image_rendered: false,
                diagnostics: log.diagnostics,
                outcome: RunOutcome::Aborted {
                    reason: NO_ARTICLE.to_string(),
                },
            };
        };
        info!(title = %article.title, url = %article.url, "News fetched");
        log.advance(RunState::Fetched);

        let commentary = self.commentator.comment(&article.title, &article.summary).await;
        if commentary.origin == BodyOrigin::Placeholder {
            log.record(StageFailure::GenerationFailure(
                "no usable commentary; posting the placeholder".to_string(),
            ));
        }
        if commentary.image_prompt_fallback {
            log.record(StageFailure::GenerationFailure(
                "no image description; using the commentary as the image prompt".to_string(),
            ));
        }
        info!(body = %commentary.body, "Commentary ready");
        log.advance(RunState::Commented);

        let image = match &self.renderer {
            Some(renderer) => {
                let prompt = commentary
                    .image_prompt
                    .as_deref()
                    .unwrap_or(&commentary.body);
                let image = renderer.render(prompt).await;
                if image.is_none() {
                    log.record(StageFailure::ImageFailure(
                        "no image rendered; continuing without one".to_string(),
                    ));
                }
                log.advance(RunState::ImageAttempted);
                image
            }
            None => {
                debug!("Image rendering disabled; skipping");
                None
            }
        };
        let image_rendered = image.is_some();

        let outcome = self
            .publisher
            .publish(&commentary.body, &article.url, image)
            .await;
        if let Some(media_error) = &outcome.media_error {
            log.record(StageFailure::MediaUploadFailure(format!(
                "{}; posted without the image",
                media_error
            )));
        }
        if !outcome.success {
            log.record(StageFailure::PublishFailure(
                outcome
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        log.advance(RunState::Published);

        RunReport {
            local_date,
            local_time,
            article: Some(article),
            commentary: Some(commentary),
            image_rendered,
            diagnostics: log.diagnostics,
            outcome: RunOutcome::Published(outcome),
        }
    }
}
