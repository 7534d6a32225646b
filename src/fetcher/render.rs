use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::fetcher::{
    client,
    errors::FetchError,
    headless::{BrowserChannel, HeadlessRenderer, RenderRequest},
    types::RenderedPage,
};

pub use crate::fetcher::types::FetchMode;

/// Chooses static or headless fetching for a scan.
///
/// A static fetch rejected with 401/403 is escalated once to the headless
/// renderer. Nothing else is retried.
#[derive(Clone)]
pub struct RenderController {
    renderer: Arc<dyn HeadlessRenderer>,
    channel: BrowserChannel,
}

impl RenderController {
    pub fn new(renderer: Arc<dyn HeadlessRenderer>, channel: BrowserChannel) -> Self {
        Self { renderer, channel }
    }

    #[instrument(skip_all, fields(url = %url, mode = ?mode))]
    pub async fn fetch(&self, url: &str, mode: FetchMode) -> Result<RenderedPage, FetchError> {
        match mode {
            FetchMode::Headless => self.render(url).await,
            FetchMode::Static => match client::fetch(url).await {
                Ok(page) => Ok(page.into()),
                Err(FetchError::Authorization { status, .. }) => {
                    warn!(%status, "origin refused a direct fetch, retrying with headless browser");
                    self.render(url).await.map_err(|e| FetchError::Authorization {
                        status,
                        headless: Some(e.to_string()),
                    })
                }
                Err(e) => Err(e),
            },
        }
    }

    async fn render(&self, url: &str) -> Result<RenderedPage, FetchError> {
        let request = RenderRequest {
            url: url.to_string(),
            channel: self.channel,
        };
        let page = self.renderer.render(&request).await?;
        info!(final_url = %page.final_url, "headless render complete");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::headless::MockHeadlessRenderer;
    use crate::fetcher::types::SessionContext;
    use chrono::Utc;
    use url::Url;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn rendered(url: &str) -> RenderedPage {
        RenderedPage {
            html: "<img src=\"/a.jpg\">".to_string(),
            final_url: Url::parse(url).unwrap(),
            session: SessionContext::new(Some("sid=abc".into()), Some(url.to_string())),
            mode: FetchMode::Headless,
            fetched_at: Utc::now(),
        }
    }

    async fn forbidden_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gallery"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn forbidden_static_fetch_escalates_once() {
        let server = forbidden_server().await;
        let url = format!("{}/gallery", server.uri());

        let mut renderer = MockHeadlessRenderer::new();
        let expected_url = url.clone();
        renderer
            .expect_render()
            .withf(move |req| req.url == expected_url && req.channel == BrowserChannel::Chrome)
            .times(1)
            .returning(|req| Ok(rendered(&req.url)));

        let controller = RenderController::new(Arc::new(renderer), BrowserChannel::Chrome);
        let page = controller.fetch(&url, FetchMode::Static).await.unwrap();

        assert_eq!(page.mode, FetchMode::Headless);
        assert!(!page.session.is_empty());
        assert_eq!(page.session.cookie_header(), Some("sid=abc"));
    }

    #[tokio::test]
    async fn failed_escalation_reports_authorization_error() {
        let server = forbidden_server().await;
        let url = format!("{}/gallery", server.uri());

        let mut renderer = MockHeadlessRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_| Err(FetchError::RenderingUnavailable("no chrome".into())));

        let controller = RenderController::new(Arc::new(renderer), BrowserChannel::Auto);
        let err = controller.fetch(&url, FetchMode::Static).await.unwrap_err();

        match err {
            FetchError::Authorization { status, headless } => {
                assert_eq!(status.as_u16(), 403);
                assert!(headless.unwrap().contains("no chrome"));
            }
            other => panic!("expected Authorization, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_http_errors_do_not_escalate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut renderer = MockHeadlessRenderer::new();
        renderer.expect_render().times(0);

        let controller = RenderController::new(Arc::new(renderer), BrowserChannel::Auto);
        let err = controller
            .fetch(&format!("{}/missing", server.uri()), FetchMode::Static)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Http { status } if status.as_u16() == 404));
    }

    #[tokio::test]
    async fn static_success_has_empty_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><img src=\"a.png\"></body></html>")
                    .insert_header("Content-Type", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let mut renderer = MockHeadlessRenderer::new();
        renderer.expect_render().times(0);

        let controller = RenderController::new(Arc::new(renderer), BrowserChannel::Auto);
        let page = controller
            .fetch(&format!("{}/page", server.uri()), FetchMode::Static)
            .await
            .unwrap();

        assert_eq!(page.mode, FetchMode::Static);
        assert!(page.session.is_empty());
        assert!(page.html.contains("a.png"));
    }

    #[tokio::test]
    async fn headless_mode_skips_static_fetch() {
        let mut renderer = MockHeadlessRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_| Err(FetchError::RenderingUnavailable("no chrome".into())));

        let controller = RenderController::new(Arc::new(renderer), BrowserChannel::Auto);
        let err = controller
            .fetch("https://example.com/spa", FetchMode::Headless)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::RenderingUnavailable(_)));
    }
}
