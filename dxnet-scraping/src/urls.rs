//! URL builders for the record pages.  The path suffixes must stay
//! byte-for-byte compatible with the live site.

use url::Url;

use crate::schema::{DifficultyQuery, ScoreIdx};

/// International deployment.  Base URLs always end with a slash.
pub const INTL_BASE: &str = "https://maimaidx-eng.com/maimai-mobile/";
/// Japanese deployment.
pub const JP_BASE: &str = "https://maimaidx.jp/maimai-mobile/";

/// Hosts the site-context guard accepts.
pub const DX_NET_HOSTS: &[&str] = &["maimaidx-eng.com", "maimaidx.jp"];

/// Recent-play list.
pub fn record_url(base: &Url) -> String {
    format!("{base}record/")
}

/// Best-score search, one page per difficulty (or the `ALL` sentinel).
pub fn best_score_search_url(base: &Url, difficulty: DifficultyQuery) -> String {
    format!(
        "{base}record/musicMybest/search/?diff={}",
        difficulty.query_value()
    )
}

/// Played-songs sort listing for one difficulty.
pub fn music_sort_url(base: &Url, difficulty: DifficultyQuery) -> String {
    format!(
        "{base}record/musicSort/search/?search=A&sort=1&playCheck=on&diff={}",
        difficulty.query_value()
    )
}

/// Per-song multi-difficulty detail page.
pub fn music_detail_url(base: &Url, idx: &ScoreIdx) -> String {
    format!("{base}record/musicDetail/?idx={idx}")
}

/// Full detail page of a single play.
pub fn play_log_detail_url(base: &Url, idx: &ScoreIdx) -> String {
    format!("{base}record/playlogDetail/?idx={idx}")
}
