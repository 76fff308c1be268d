//! Extractor for the recent-play list (`record/`).

use dxnet_scraping_utils::selector;
use scraper::{ElementRef, Html};

use crate::error::RecordError;
use crate::schema::{
    AchievementResult, DeluxscoreResult, PlayRecord, PlayedAt, ScoreIdx, ScoreMetadata,
    SongMetadata, SongName, ValueWithMax,
};

use super::{collect_blocks, decode, find, src_attr, text_of, Extracted};

pub fn parse(html: &Html) -> Extracted<PlayRecord> {
    collect_blocks(html.select(selector!("div.p_10")), "recent play", parse_block)
}

fn parse_block(block: ElementRef) -> Result<PlayRecord, RecordError> {
    let difficulty_img = find(block, selector!("img.playlog_diff"), "difficulty icon")?;
    let difficulty = decode::parse_difficulty_icon(src_attr(difficulty_img, "difficulty icon")?)?;

    let mut spans = block.select(selector!("div.sub_title > span"));
    let track_span = spans
        .next()
        .ok_or_else(|| RecordError::structure("track number span not found"))?;
    let track = decode::parse_track_number(&text_of(track_span))?;
    let time_span = spans
        .next()
        .ok_or_else(|| RecordError::structure("play time span not found"))?;
    let time = decode::parse_play_time(&text_of(time_span))?;

    // The clear icon shares the title container; `text()` only collects text
    // nodes, so the title comes out unharmed either way.
    let basic_block = find(block, selector!(".basic_block"), "title block")?;
    let clear_icon = basic_block
        .select(selector!("img"))
        .next()
        .map(|img| img.attr("src").unwrap_or(""));
    let cleared = decode::parse_clear_icon(clear_icon)?;
    let song_name = SongName::from(text_of(basic_block));

    let cover_img = find(block, selector!("img.music_img"), "cover image")?;
    let music_id = decode::parse_music_id(src_attr(cover_img, "cover image")?)?;

    let generation_img = find(
        block,
        selector!("img.playlog_music_kind_icon"),
        "chart variant icon",
    )?;
    let generation =
        decode::parse_generation_icon_or_deluxe(src_attr(generation_img, "chart variant icon")?);

    let result_block = find(block, selector!(".playlog_result_block"), "result block")?;
    let rank_img = find(result_block, selector!("img.playlog_scorerank"), "rank icon")?;
    let rank = decode::parse_rank_icon(src_attr(rank_img, "rank icon")?)?;
    let achievement_txt = find(
        result_block,
        selector!("div.playlog_achievement_txt"),
        "achievement text",
    )?;
    let achievement = decode::parse_achievement_text(&text_of(achievement_txt));
    let achievement_new_record = result_block
        .select(selector!(".playlog_achievement_newrecord"))
        .next()
        .is_some();

    let innerblock = find(
        result_block,
        selector!("div.playlog_result_innerblock"),
        "result innerblock",
    )?;
    let score_block = find(innerblock, selector!(".playlog_score_block"), "deluxe score block")?;
    let deluxscore_new_record = score_block
        .select(selector!(".playlog_deluxscore_newrecord"))
        .next()
        .is_some();
    let deluxscore_div = find(score_block, selector!("div"), "deluxe score text")?;
    let (value, max) = decode::parse_deluxscore_text(&text_of(deluxscore_div))?;
    let deluxscore = ValueWithMax::new(value, max)
        .map_err(|(value, max)| RecordError::structure(format!("deluxe score {value} exceeds its maximum {max}")))?;

    // After the score block come the combo icon, the sync icon, and (in
    // multiplayer) the placement icon, in that order.
    let mut icons = score_block
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|e| selector!("img").matches(e));
    let full_combo_img = icons
        .next()
        .ok_or_else(|| RecordError::structure("combo icon not found"))?;
    let full_combo = decode::parse_full_combo_icon(src_attr(full_combo_img, "combo icon")?)?;
    let full_sync_img = icons
        .next()
        .ok_or_else(|| RecordError::structure("sync icon not found"))?;
    let full_sync = decode::parse_full_sync_icon(src_attr(full_sync_img, "sync icon")?)?;
    let matching_rank =
        decode::parse_matching_rank_icon(icons.next().and_then(|img| img.attr("src")))?;

    let idx_input = find(block, selector!("input[name='idx']"), "detail idx input")?;
    let idx = ScoreIdx::from(
        idx_input
            .attr("value")
            .ok_or_else(|| RecordError::structure("detail idx input has no value"))?
            .to_owned(),
    );

    Ok(PlayRecord::builder()
        .played_at(PlayedAt::builder().idx(idx).time(time).track(track).build())
        .song_metadata(
            SongMetadata::builder()
                .name(song_name)
                .music_id(music_id)
                .build(),
        )
        .score_metadata(
            ScoreMetadata::builder()
                .generation(generation)
                .difficulty(difficulty)
                .build(),
        )
        .cleared(cleared)
        .achievement_result(
            AchievementResult::builder()
                .value(achievement)
                .new_record(achievement_new_record)
                .rank(rank)
                .build(),
        )
        .deluxscore_result(
            DeluxscoreResult::builder()
                .score(deluxscore)
                .new_record(deluxscore_new_record)
                .build(),
        )
        .full_combo_kind(full_combo)
        .full_sync_kind(full_sync)
        .matching_rank(matching_rank)
        .build())
}
