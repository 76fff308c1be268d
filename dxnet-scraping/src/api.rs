use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use itertools::Itertools;
use log::{debug, info, warn};
use reqwest::header;
use scraper::Html;
use strum::IntoEnumIterator;
use tokio::time::sleep;
use url::Url;

use crate::cookie_store::{CookieStore, CookieStoreLoadError};
use crate::error::{PageError, PreconditionError};
use crate::parser::{self, Extracted};
use crate::schema::{
    BestScoreRecord, DetailedSongRecord, DifficultyQuery, PlayRecord, ScoreDifficulty, ScoreIdx,
    SortedScoreRecord,
};
use crate::urls;

pub struct DxNetClientInitializer<'p> {
    pub cookie_store_path: &'p Path,
    pub base: Url,
    /// `None` keeps the transport's default.
    pub timeout: Option<Duration>,
}

/// Client for the record pages of an already-authenticated DX NET session.
pub struct DxNetClient<'p> {
    client: reqwest::Client,
    cookie_store: CookieStore,
    cookie_store_path: Cow<'p, Path>,
    base: Url,
}

/// Outcome of a multi-difficulty sweep.  A partially failed sweep still
/// carries everything that was retrieved, so it is never confused with an
/// empty result.
#[derive(Debug)]
pub struct Sweep<T> {
    pub records: Vec<T>,
    pub skipped_blocks: usize,
    pub failed: Vec<ScoreDifficulty>,
}

impl<'p> DxNetClient<'p> {
    /// Client against the international deployment.
    pub fn new_intl(cookie_store_path: &'p Path) -> anyhow::Result<Self> {
        Self::new(DxNetClientInitializer {
            cookie_store_path,
            base: Url::parse(urls::INTL_BASE)?,
            timeout: None,
        })
    }

    pub fn new(args: DxNetClientInitializer<'p>) -> anyhow::Result<Self> {
        let cookie_store = match CookieStore::load(args.cookie_store_path) {
            Ok(cookie_store) => {
                info!("Cookie store was found.");
                cookie_store
            }
            Err(CookieStoreLoadError::NotFound) => {
                info!("Cookie store was not found; starting with an empty session.");
                CookieStore::default()
            }
            Err(e) => return Err(e.into()),
        };
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = args.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            cookie_store,
            cookie_store_path: Cow::Borrowed(args.cookie_store_path),
            base: args.base,
        })
    }

    /// Site-context guard: refuse to fetch anything unless the configured
    /// base points at a DX NET host.  Checked once per scrape operation.
    pub fn ensure_dx_net_origin(&self) -> Result<(), PreconditionError> {
        match self.base.host_str() {
            Some(host) if urls::DX_NET_HOSTS.contains(&host) => Ok(()),
            _ => Err(PreconditionError {
                url: self.base.to_string(),
            }),
        }
    }

    /// Scrapes the recent-play list.  Page-level failures propagate;
    /// block-level failures are isolated by the extractor.
    pub async fn scrape_recent_plays(&mut self) -> anyhow::Result<Extracted<PlayRecord>> {
        self.ensure_dx_net_origin()?;
        let url = urls::record_url(&self.base);
        let html = self.fetch_html(&url).await?;
        let extracted = parser::play_record::parse(&html);
        info!(
            "Extracted {} recent plays ({} skipped).",
            extracted.records.len(),
            extracted.skipped
        );
        Ok(extracted)
    }

    /// Scrapes one song's detail page across all its difficulties.
    pub async fn scrape_song_detail(&mut self, idx: &ScoreIdx) -> anyhow::Result<DetailedSongRecord> {
        self.ensure_dx_net_origin()?;
        let url = urls::music_detail_url(&self.base, idx);
        let html = self.fetch_html(&url).await?;
        parser::music_detail::parse(&html)
    }

    /// Sweeps the best-score pages of the given difficulties in order,
    /// pausing `interval` between consecutive requests.
    pub async fn scrape_best(
        &mut self,
        difficulties: &[ScoreDifficulty],
        interval: Duration,
    ) -> anyhow::Result<Sweep<BestScoreRecord>> {
        self.sweep_difficulties(
            difficulties,
            interval,
            urls::best_score_search_url,
            parser::best_score::parse,
        )
        .await
    }

    /// [`Self::scrape_best`] over all five difficulties, lowest tier first.
    pub async fn scrape_all_best(
        &mut self,
        interval: Duration,
    ) -> anyhow::Result<Sweep<BestScoreRecord>> {
        self.scrape_best(&ScoreDifficulty::iter().collect_vec(), interval)
            .await
    }

    /// Same sweep over the sort listing pages.
    pub async fn scrape_sorted(
        &mut self,
        difficulties: &[ScoreDifficulty],
        interval: Duration,
    ) -> anyhow::Result<Sweep<SortedScoreRecord>> {
        self.sweep_difficulties(
            difficulties,
            interval,
            urls::music_sort_url,
            parser::music_sort::parse,
        )
        .await
    }

    pub async fn scrape_all_sorted(
        &mut self,
        interval: Duration,
    ) -> anyhow::Result<Sweep<SortedScoreRecord>> {
        self.scrape_sorted(&ScoreDifficulty::iter().collect_vec(), interval)
            .await
    }

    /// One difficulty's total failure must not sink the others: it is
    /// recorded in `failed` and the sweep moves on after the usual pause.
    /// Dropping the returned future between requests abandons the sweep.
    async fn sweep_difficulties<T>(
        &mut self,
        difficulties: &[ScoreDifficulty],
        interval: Duration,
        url_for: impl Fn(&Url, DifficultyQuery) -> String,
        parse: impl Fn(&Html, ScoreDifficulty) -> Extracted<T>,
    ) -> anyhow::Result<Sweep<T>> {
        self.ensure_dx_net_origin()?;
        let mut sweep = Sweep {
            records: vec![],
            skipped_blocks: 0,
            failed: vec![],
        };
        for (i, &difficulty) in difficulties.iter().enumerate() {
            if i > 0 {
                // The pause keeps the crawl under the site's rate limiting;
                // requests are strictly sequential, never parallel.
                sleep(interval).await;
            }
            let url = url_for(&self.base, difficulty.into());
            match self.fetch_html(&url).await {
                Ok(html) => {
                    let extracted = parse(&html, difficulty);
                    info!(
                        "{difficulty:?}: {} records ({} blocks skipped).",
                        extracted.records.len(),
                        extracted.skipped
                    );
                    sweep.records.extend(extracted.records);
                    sweep.skipped_blocks += extracted.skipped;
                }
                Err(e) => {
                    warn!("Failed to retrieve the {difficulty:?} page: {e}");
                    sweep.failed.push(difficulty);
                }
            }
        }
        Ok(sweep)
    }

    async fn fetch_html(&mut self, url: &str) -> Result<Html, PageError> {
        let response = self
            .client
            .get(url)
            .header(
                header::COOKIE,
                format!("userId={}", self.cookie_store.user_id),
            )
            .send()
            .await?;
        self.update_session_cookie(&response);
        if !response.status().is_success() {
            return Err(PageError::Status {
                status: response.status(),
                url: url.to_owned(),
            });
        }
        let text = response.text().await?;
        Ok(Html::parse_document(&text))
    }

    fn update_session_cookie(&mut self, response: &reqwest::Response) {
        if let Some(cookie) = response.cookies().find(|cookie| cookie.name() == "userId") {
            debug!("Session cookie was renewed.");
            self.cookie_store.user_id = cookie.value().to_owned().into();
            if let Err(e) = self.cookie_store.save(self.cookie_store_path.as_ref()) {
                warn!("Could not save the cookie store: {e}");
            }
        }
    }
}
