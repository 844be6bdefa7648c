//! One crawl cycle: list, skip seen, visit, extract, filter, notify, record.
//!
//! The orchestrator owns budgets and pacing and is the only place that decides
//! whether an error ends the run. Per-link failures are logged and skipped;
//! session loss and an unready store abort. A link is recorded as seen only
//! after its message was delivered, so a run aborted anywhere can never leave
//! a link marked seen without a notification.

mod context;


pub use context::{LinkOutcome, RunContext, RunSummary};

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::CrawlConfig;
use crate::error::{NavigatorError, RunError};
use crate::extract::ExtractionRules;
use crate::model::{ItemRecord, ListingLink};
use crate::navigator::Navigator;
use crate::notify::{self, Notifier};
use crate::pacing::{Pacing, RandomPacing};
use crate::store::SeenStore;

pub struct Pipeline {
    config: CrawlConfig,
    rules: ExtractionRules,
    store: Arc<dyn SeenStore>,
    notifier: Arc<dyn Notifier>,
    pacing: Arc<dyn Pacing>,
}

impl Pipeline {
    pub fn new(
        config: CrawlConfig,
        rules: ExtractionRules,
        store: Arc<dyn SeenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let pacing = Arc::new(RandomPacing::new(config.pacing_min, config.pacing_max));
        Self {
            config,
            rules,
            store,
            notifier,
            pacing,
        }
    }

    pub fn with_pacing(mut self, pacing: Arc<dyn Pacing>) -> Self {
        self.pacing = pacing;
        self
    }

    /// Run one cycle. The navigator is closed on every exit path.
    pub async fn run<N: Navigator>(&self, mut navigator: N) -> Result<RunSummary, RunError> {
        let result = match self.ensure_store_ready().await {
            Ok(()) => self.run_cycle(&mut navigator).await,
            Err(e) => Err(e),
        };
        self.finish(navigator, result).await
    }

    /// Check the store, then start the browser with `launch` and run one cycle.
    ///
    /// No browser is started while the store is unready, so that failure is
    /// reported as such even when the browser is unavailable too.
    pub async fn launch_and_run<N, F, Fut>(&self, launch: F) -> Result<RunSummary, RunError>
    where
        N: Navigator,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<N, NavigatorError>>,
    {
        self.ensure_store_ready().await?;
        let mut navigator = launch().await.map_err(RunError::Session)?;

        let result = self.run_cycle(&mut navigator).await;
        self.finish(navigator, result).await
    }

    async fn ensure_store_ready(&self) -> Result<(), RunError> {
        self.store
            .ensure_ready()
            .await
            .map_err(RunError::StoreUnavailable)
    }

    async fn finish<N: Navigator>(
        &self,
        mut navigator: N,
        result: Result<RunSummary, RunError>,
    ) -> Result<RunSummary, RunError> {
        if let Err(e) = navigator.close().await {
            warn!(error = %e, "Failed to close browser session");
        }

        match &result {
            Ok(summary) => info!(
                notified = summary.notified,
                max = self.config.max_matches,
                visited = summary.visited,
                "Final matches sent"
            ),
            Err(e) => error!(error = %e, "Run aborted"),
        }
        result
    }

    async fn run_cycle<N: Navigator>(&self, nav: &mut N) -> Result<RunSummary, RunError> {
        let links = self.collect_links(nav).await?;
        let mut ctx = RunContext::default();
        ctx.summary.links_found = links.len();

        for link in &links {
            if ctx.cap_reached(self.config.max_matches) {
                info!(max = self.config.max_matches, "Match cap reached");
                break;
            }

            match self.store.has(link).await {
                Ok(true) => {
                    debug!(%link, "Already sent, skipping");
                    ctx.summary.already_seen += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    // Without a reliable answer the link could be a duplicate; leave it for next cycle.
                    error!(%link, error = %e, "Seen check failed, skipping");
                    ctx.summary.store_errors += 1;
                    continue;
                }
            }

            ctx.summary.visited += 1;
            match self.process_link(nav, link, &mut ctx).await {
                Ok(outcome) => ctx.record(outcome),
                Err(e) if e.is_fatal() => return Err(RunError::Session(e)),
                Err(e) => {
                    error!(%link, error = %e, "Failed on listing");
                    ctx.summary.link_errors += 1;
                }
            }

            self.pacing.pause().await;
        }

        Ok(ctx.summary)
    }

    async fn collect_links<N: Navigator>(&self, nav: &mut N) -> Result<Vec<ListingLink>, RunError> {
        let search_url = self.config.search_url.as_str();
        info!(url = search_url, "Loading listing page");
        nav.open(search_url, self.config.list_timeout).await?;
        tokio::time::sleep(self.config.list_settle).await;

        let steps = nav
            .autoscroll(self.config.scroll_max_steps, self.config.scroll_step_delay)
            .await?;
        debug!(steps, "Scrolling done");

        let html = nav.snapshot().await?;
        let found = self.rules.extract_listing_links(&html);
        let total = found.len();

        let mut seen = HashSet::new();
        let links: Vec<ListingLink> = found
            .into_iter()
            .filter(|l| seen.insert(l.clone()))
            .take(self.config.max_links)
            .collect();

        info!(found = total, considered = links.len(), "Collected listing links");
        Ok(links)
    }

    async fn process_link<N: Navigator>(
        &self,
        nav: &mut N,
        link: &ListingLink,
        ctx: &mut RunContext,
    ) -> Result<LinkOutcome, NavigatorError> {
        debug!(%link, "Visiting");
        nav.open(link.as_str(), self.config.detail_timeout).await?;
        tokio::time::sleep(self.config.detail_settle).await;

        let html = nav.snapshot().await?;
        let Some(item) = self.rules.extract_item_detail(&html, link).validate() else {
            debug!(%link, "Missing title, price or size, skipping");
            return Ok(LinkOutcome::Incomplete);
        };

        if self.rules.is_undesirable(&item.title) {
            info!(%link, title = %item.title, "Undesirable listing, skipping");
            return Ok(LinkOutcome::Undesirable);
        }

        Ok(self.notify(&item, ctx).await)
    }

    async fn notify(&self, item: &ItemRecord, ctx: &mut RunContext) -> LinkOutcome {
        if !ctx.preamble_sent {
            ctx.preamble_sent = true;
            let header = notify::header_message(&self.config.digest_label);
            for message in [notify::WAKE_MESSAGE, header.as_str()] {
                if let Err(e) = self.notifier.send(message).await {
                    error!(error = %e, "Preamble delivery failed");
                }
            }
        }

        if let Err(e) = self.notifier.send(&notify::item_message(item)).await {
            error!(link = %item.link, error = %e, "Delivery failed, listing stays unseen");
            return LinkOutcome::DeliveryFailed;
        }

        if let Err(e) = self.store.add(&item.link).await {
            error!(link = %item.link, error = %e, "Sent but could not record as seen");
            ctx.summary.store_errors += 1;
        }

        info!(
            link = %item.link,
            sent = ctx.summary.notified + 1,
            max = self.config.max_matches,
            "Sent listing"
        );
        LinkOutcome::Notified
    }
}
