//! Extractor for the played-songs sort listing
//! (`record/musicSort/search/`), used for leaderboard-style views.
//!
//! Same block shape as the best-score search, but with the sort page's own
//! selectors, the numeric half-unit level convention, and the output ordered
//! by descending achievement (ties keep document order).

use dxnet_scraping_utils::selector;
use itertools::Itertools;
use scraper::{ElementRef, Html};
use url::Url;

use crate::error::RecordError;
use crate::schema::{
    AchievementValue, LevelValue, ScoreDifficulty, SongIcon, SongName, SortedScoreRecord,
    ValueWithMax,
};

use super::{collect_blocks, decode, find, src_attr, text_of, Extracted};

pub fn parse(html: &Html, difficulty: ScoreDifficulty) -> Extracted<SortedScoreRecord> {
    let blocks = html.select(selector!(r#"div[class*="_score_back"]"#));
    let mut extracted = collect_blocks(blocks, "sort listing", |block| {
        parse_block(block, difficulty)
    });
    // Vec::sort_by is stable, so ties stay in document order.
    extracted
        .records
        .sort_by(|a, b| b.achievement().cmp(&a.achievement()));
    extracted
}

fn parse_block(
    block: ElementRef,
    difficulty: ScoreDifficulty,
) -> Result<SortedScoreRecord, RecordError> {
    let cover_img = find(block, selector!(".music_img img"), "cover image")?;
    let cover_src = src_attr(cover_img, "cover image")?;
    let music_id = decode::parse_music_id(cover_src)?;
    let cover_art = SongIcon::from(
        Url::parse(cover_src).map_err(|_| RecordError::decode("cover url", cover_src))?,
    );

    let song_name = SongName::from(text_of(find(
        block,
        selector!(".music_name_block"),
        "song name block",
    )?));

    let level_text = text_of(find(block, selector!(".music_lv_block"), "level block")?);
    let level: LevelValue = level_text
        .parse()
        .map_err(|_| RecordError::decode("level text", level_text.clone()))?;

    // No new-record markers or placement on this page; absent result blocks
    // mean zero, never an invented value.
    let score_blocks = block.select(selector!(".music_score_block")).collect_vec();
    let achievement = score_blocks
        .first()
        .map(|div| decode::parse_achievement_text(&text_of(*div)))
        .unwrap_or_else(|| AchievementValue::from(0));
    let (value, max) = match score_blocks.get(1) {
        Some(div) => decode::parse_deluxscore_text(&text_of(*div))?,
        None => (0, 0),
    };
    let deluxscore = ValueWithMax::new(value, max).map_err(|(value, max)| {
        RecordError::structure(format!("deluxe score {value} exceeds its maximum {max}"))
    })?;

    let icons = decode::route_result_icons(
        block
            .select(selector!(r#"img[src*="music_icon_"]"#))
            .filter_map(|img| img.attr("src")),
    )?;

    Ok(SortedScoreRecord::builder()
        .song_name(song_name)
        .difficulty(difficulty)
        .level(level)
        .achievement(achievement)
        .rank(icons.rank)
        .music_id(music_id)
        .cover_art(cover_art)
        .deluxscore(deluxscore)
        .full_combo_kind(icons.full_combo)
        .full_sync_kind(icons.full_sync)
        .build())
}
