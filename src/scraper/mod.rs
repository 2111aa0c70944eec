pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ScraperConfig;
use crate::error::{FetchError, Result, ScrapeError};
use crate::models::{League, Member};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use self::http_client::HttpClient;
use self::parsers::{find_fix_war_pid_links, parse_member_page};

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable page source. Politeness delays and retries belong here,
/// never in the parsing code.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get_text(&self, url: &Url) -> std::result::Result<String, FetchError>;
}

// ── chocolateclash scraper ────────────────────────────────────────────────────

pub struct ChocolateClashScraper<S = HttpClient> {
    source: S,
    league: League,
    base_url: Url,
}

impl ChocolateClashScraper<HttpClient> {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let league: League = config.league.parse()?;
        Self::with_source(league, HttpClient::new(config)?)
    }
}

impl<S: PageSource> ChocolateClashScraper<S> {
    pub fn with_source(league: League, source: S) -> Result<Self> {
        let base_url = Url::parse(&league.base_url()).map_err(FetchError::from)?;
        Ok(Self {
            source,
            league,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of a member page, e.g. `.../member.php?tag=%23PRQL2VJR&rlim=20&slim=20`.
    /// The tag may come with or without its leading '#'.
    pub fn member_url(&self, tag: &str, actions_limit: u32, attacks_limit: u32) -> Result<Url> {
        let mut url = self.base_url.join("member.php").map_err(FetchError::from)?;
        url.query_pairs_mut()
            .append_pair("tag", tag.trim())
            .append_pair("rlim", &actions_limit.to_string())
            .append_pair("slim", &attacks_limit.to_string());
        Ok(url)
    }

    /// Visit every war pid repair link on the member page so the next
    /// fetch sees corrected war data. Returns how many links were visited.
    ///
    /// Every link is tried; the first transport failure is reported.
    pub async fn fix_war_pid(&self, tag: &str, actions_limit: u32, attacks_limit: u32) -> Result<usize> {
        let url = self.member_url(tag, actions_limit, attacks_limit)?;
        info!("Fixing war pid issue: {} ({})", tag, self.league);

        let html = self
            .source
            .get_text(&url)
            .await
            .map_err(ScrapeError::FixWarPid)?;
        let links = find_fix_war_pid_links(&html, &self.base_url);

        let mut first_err = None;
        for link in &links {
            info!("Visiting fix url: {}", link);
            if let Err(e) = self.source.get_text(link).await {
                warn!("Fix url {} failed: {}", link, e);
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(ScrapeError::FixWarPid(e)),
            None => Ok(links.len()),
        }
    }

    /// Fetch and parse one member profile.
    ///
    /// With `fix` set, the war pid repair runs first and its failure aborts
    /// the request before the main fetch.
    pub async fn get_member(
        &self,
        tag: &str,
        actions_limit: u32,
        attacks_limit: u32,
        fix: bool,
    ) -> Result<Member> {
        if fix {
            let fixed = self.fix_war_pid(tag, actions_limit, attacks_limit).await?;
            debug!("{}: {} war pid fixes applied", tag, fixed);
        }

        let url = self.member_url(tag, actions_limit, attacks_limit)?;
        info!("Getting member: {} ({})", tag, self.league);
        let html = self.source.get_text(&url).await?;

        let member = parse_member_page(&html, &self.base_url);
        debug!(
            "{}: {} actions, {} attacks, {} notes",
            tag,
            member.actions.len(),
            member.attacks.len(),
            member.notes.len()
        );

        if member.tag.is_empty() {
            warn!("{}: no member header found on page", tag);
        }

        Ok(member)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
