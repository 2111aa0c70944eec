//! Scraper for chocolateclash member pages: identity, clan, donations,
//! action log, war attack log and notes.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod scraper;

pub use error::{FetchError, ScrapeError};
pub use models::{Action, Attack, Clan, League, Member, Note};
pub use scraper::{ChocolateClashScraper, PageSource};
