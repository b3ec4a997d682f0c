//! Browser-backed element adapter.
//!
//! With the `browser` feature, [`Browser`] launches Chromium over the Chrome
//! `DevTools` Protocol (chromiumoxide) and hands out [`ChromiumAdapter`]s, one
//! page each. Element operations are evaluated in the page as JavaScript
//! built from [`Selector`](crate::locator::Selector) queries and polled until
//! the element shows up or the timeout elapses.

use crate::result::TabflowResult;
use std::future::Future;
use std::time::Duration;

/// Browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Relative URLs passed to `navigate` resolve against this
    pub base_url: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
            base_url: None,
            user_agent: None,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Resolve `url` against an optional base. Absolute URLs pass through.
#[must_use]
pub fn resolve_url(base: Option<&str>, url: &str) -> String {
    let absolute = url.contains("://") || url.starts_with("about:") || url.starts_with("data:");
    match base {
        Some(base) if !absolute => {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
        _ => url.to_string(),
    }
}

/// Run `check` every `interval` until it yields true or `timeout` elapses.
///
/// An error from `check` counts as "not yet": the page may be between execution
/// contexts after a navigation. Only an error from the final attempt is
/// returned.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
pub(crate) async fn poll_until<F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> TabflowResult<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TabflowResult<bool>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let last_error = match check().await {
            Ok(true) => return Ok(true),
            Ok(false) => None,
            Err(e) => {
                tracing::trace!(error = %e, "poll check failed, retrying");
                Some(e)
            }
        };
        if tokio::time::Instant::now() >= deadline {
            return last_error.map_or(Ok(false), Err);
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
mod cdp {
    use super::{poll_until, resolve_url, BrowserConfig};
    use crate::adapter::{resolve_option, ElementAdapter, MatchMode};
    use crate::dialog::{Dialog, DialogGuard, DialogResponse};
    use crate::locator::Selector;
    use crate::result::{TabflowError, TabflowResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::Deserialize;
    use std::time::Duration;

    const POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: CdpBrowser,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        pub async fn launch(config: BrowserConfig) -> TabflowResult<Self> {
            let mut builder =
                CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }
            if let Some(ref ua) = config.user_agent {
                builder = builder.arg(format!("--user-agent={ua}"));
            }

            let cdp_config = builder
                .build()
                .map_err(|message| TabflowError::BrowserLaunch { message })?;

            let (inner, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| TabflowError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::debug!(error = %e, "cdp handler");
                    }
                }
            });

            tracing::info!(headless = config.headless, "browser launched");
            Ok(Self {
                config,
                inner,
                handle,
            })
        }

        /// Open a page and wrap it in an adapter. One adapter is one session.
        pub async fn new_adapter(&self) -> TabflowResult<ChromiumAdapter> {
            let page = self
                .inner
                .new_page("about:blank")
                .await
                .map_err(|e| TabflowError::Page {
                    message: e.to_string(),
                })?;
            Ok(ChromiumAdapter {
                page,
                base_url: self.config.base_url.clone(),
            })
        }

        /// Close the browser
        pub async fn close(mut self) -> TabflowResult<()> {
            self.inner
                .close()
                .await
                .map_err(|e| TabflowError::BrowserLaunch {
                    message: e.to_string(),
                })?;
            let _ = self.inner.wait().await;
            self.handle.abort();
            Ok(())
        }
    }

    #[derive(Debug, Default, Deserialize)]
    struct Reply {
        found: bool,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        options: Vec<String>,
    }

    /// [`ElementAdapter`] over one Chromium page
    #[derive(Debug)]
    pub struct ChromiumAdapter {
        page: CdpPage,
        base_url: Option<String>,
    }

    impl ChromiumAdapter {
        async fn eval(&self, js: String) -> TabflowResult<serde_json::Value> {
            let result = self
                .page
                .evaluate(js)
                .await
                .map_err(|e| TabflowError::script(e.to_string()))?;
            result
                .into_value()
                .map_err(|e| TabflowError::script(e.to_string()))
        }

        /// Poll until the selector matches; false on timeout
        async fn poll(&self, selector: &Selector, timeout: Duration) -> TabflowResult<bool> {
            let query = format!("({}) > 0", selector.to_count_query());
            poll_until(timeout, POLL_INTERVAL, || {
                let js = query.clone();
                async move {
                    let found = self.eval(js).await? == serde_json::Value::Bool(true);
                    Ok::<_, TabflowError>(found)
                }
            })
            .await
        }

        /// Run `body` against the located element
        async fn on_element(
            &self,
            selector: &Selector,
            timeout: Duration,
            body: &str,
        ) -> TabflowResult<Reply> {
            let not_found = || TabflowError::ElementNotFound {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            };
            if !self.poll(selector, timeout).await? {
                return Err(not_found());
            }
            let reply: Reply = serde_json::from_value(self.eval(selector.with_element(body)).await?)?;
            if !reply.found {
                return Err(not_found());
            }
            match reply.error {
                Some(reason) => Err(TabflowError::ElementNotInteractable {
                    selector: selector.to_string(),
                    reason,
                }),
                None => Ok(reply),
            }
        }
    }

    const CLICK: &str = "if (el.disabled) { return { error: 'disabled' }; } \
        el.scrollIntoView({ block: 'center' }); el.click(); return {};";

    #[async_trait]
    impl ElementAdapter for ChromiumAdapter {
        async fn navigate(&mut self, url: &str) -> TabflowResult<()> {
            let target = resolve_url(self.base_url.as_deref(), url);
            tracing::debug!(url = %target, "navigate");
            self.page
                .goto(target.as_str())
                .await
                .map_err(|e| TabflowError::NavigationError {
                    url: target.clone(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn fill(
            &mut self,
            selector: &Selector,
            value: &str,
            timeout: Duration,
        ) -> TabflowResult<()> {
            let literal = serde_json::to_string(value)?;
            let body = format!(
                "if (el.disabled || el.readOnly) {{ return {{ error: 'disabled or read-only' }}; }} \
                 if (!('value' in el)) {{ return {{ error: 'not a form field' }}; }} \
                 el.focus(); el.value = {literal}; \
                 el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                 el.dispatchEvent(new Event('change', {{ bubbles: true }})); return {{}};"
            );
            self.on_element(selector, timeout, &body).await?;
            Ok(())
        }

        async fn click(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<()> {
            self.on_element(selector, timeout, CLICK).await?;
            Ok(())
        }

        async fn click_with_dialog(
            &mut self,
            selector: &Selector,
            response: DialogResponse,
            timeout: Duration,
        ) -> TabflowResult<Vec<Dialog>> {
            let mut guard = DialogGuard::arm(response);
            self.eval(guard.install_script()).await?;
            let clicked = self.on_element(selector, timeout, CLICK).await;
            // The click may have navigated away, taking the shim with it
            match self.eval(DialogGuard::restore_script().to_string()).await {
                Ok(raw) => match serde_json::from_value::<Vec<Dialog>>(raw) {
                    Ok(dialogs) => guard.record(dialogs),
                    Err(e) => tracing::debug!(error = %e, "unreadable dialog record"),
                },
                Err(e) => tracing::debug!(error = %e, "dialog shim already gone"),
            }
            let handled = guard.disarm();
            clicked?;
            Ok(handled)
        }

        async fn check(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<()> {
            // A label retargets to its control
            const CHECK: &str = "const t = el.tagName === 'LABEL' ? (el.control ?? el.querySelector('input')) : el; \
                if (!t) { return { error: 'label has no control' }; } \
                if (t.disabled) { return { error: 'disabled' }; } \
                if (t.type !== 'checkbox' && t.type !== 'radio') { return { error: 'not a checkbox' }; } \
                if (!t.checked) { t.click(); } return {};";
            self.on_element(selector, timeout, CHECK).await?;
            Ok(())
        }

        async fn select_option(
            &mut self,
            selector: &Selector,
            label: &str,
            mode: MatchMode,
            timeout: Duration,
        ) -> TabflowResult<String> {
            const OPTIONS: &str = "if (!el.options) { return { error: 'not a select element' }; } \
                if (el.disabled) { return { error: 'disabled' }; } \
                return { options: Array.from(el.options).map(o => o.text.trim()) };";
            let options = self.on_element(selector, timeout, OPTIONS).await?.options;
            let chosen = resolve_option(selector, &options, label, mode)?.to_string();
            let literal = serde_json::to_string(&chosen)?;
            let body = format!(
                "const o = Array.from(el.options).find(o => o.text.trim() === {literal}); \
                 if (!o) {{ return {{ error: 'option vanished' }}; }} \
                 el.value = o.value; o.selected = true; \
                 el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                 el.dispatchEvent(new Event('change', {{ bubbles: true }})); return {{}};"
            );
            self.on_element(selector, timeout, &body).await?;
            Ok(chosen)
        }

        async fn wait_for(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<()> {
            if self.poll(selector, timeout).await? {
                Ok(())
            } else {
                Err(TabflowError::Timeout {
                    what: selector.to_string(),
                    ms: timeout.as_millis() as u64,
                })
            }
        }

        async fn read_text(
            &mut self,
            selector: &Selector,
            timeout: Duration,
        ) -> TabflowResult<String> {
            const TEXT: &str = "return { text: String(el.innerText ?? el.textContent ?? '') };";
            let reply = self.on_element(selector, timeout, TEXT).await?;
            Ok(reply.text.unwrap_or_default().trim().to_string())
        }

        async fn read_value(
            &mut self,
            selector: &Selector,
            timeout: Duration,
        ) -> TabflowResult<String> {
            const VALUE: &str =
                "return { value: String('value' in el ? el.value : (el.textContent ?? '')) };";
            let reply = self.on_element(selector, timeout, VALUE).await?;
            Ok(reply.value.unwrap_or_default().trim().to_string())
        }

        async fn screenshot(&mut self) -> TabflowResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            let screenshot = self.page.execute(params).await.map_err(|e| TabflowError::Page {
                message: e.to_string(),
            })?;

            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| TabflowError::Page {
                    message: e.to_string(),
                })
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, ChromiumAdapter};
