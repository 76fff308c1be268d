//! Extractor for the per-song multi-difficulty detail page
//! (`record/musicDetail/`).

use std::collections::BTreeMap;

use anyhow::Context;
use dxnet_scraping_utils::selector;
use itertools::Itertools;
use log::warn;
use scraper::{ElementRef, Html};

use crate::error::RecordError;
use crate::schema::{
    ArtistName, DetailedDifficultyRecord, DetailedSongRecord, LevelValue, ScoreDifficulty,
    ScoreMetadata, SongName, ValueWithMax,
};

use super::{decode, find, src_attr, text_of};

pub fn parse(html: &Html) -> anyhow::Result<DetailedSongRecord> {
    let basic_block = html
        .select(selector!(".basic_block"))
        .next()
        .context("Song header block not found")?;
    let cover_src = basic_block
        .select(selector!("img"))
        .next()
        .context("Cover image not found in the song header")?
        .attr("src")
        .context("Cover image has no src")?;
    let music_id = decode::parse_music_id(cover_src)?;

    let header_divs = basic_block.select(selector!(".w_250 div")).collect_vec();
    let song_name = SongName::from(text_of(
        *header_divs.get(1).context("Song name div not found")?,
    ));
    let artist = ArtistName::from(text_of(
        *header_divs.get(2).context("Artist div not found")?,
    ));

    // One block per difficulty, keyed by a fixed set of element identifiers.
    // Anything else on the page simply does not match the selector.
    let mut scores = BTreeMap::new();
    for block in html.select(selector!("#basic, #advanced, #expert, #master, #remaster")) {
        match parse_difficulty_block(block) {
            Ok(record) => {
                scores.insert(record.score_metadata().difficulty(), record);
            }
            Err(e) => warn!("Skipping a difficulty block: {e}"),
        }
    }

    Ok(DetailedSongRecord::builder()
        .music_id(music_id)
        .song_name(song_name)
        .artist(artist)
        .scores(scores)
        .build())
}

fn parse_difficulty_block(block: ElementRef) -> Result<DetailedDifficultyRecord, RecordError> {
    let difficulty = block
        .value()
        .id()
        .and_then(ScoreDifficulty::from_site_token)
        .ok_or_else(|| RecordError::structure("difficulty block has an unexpected id"))?;

    let generation_img = find(block, selector!("img.music_kind_icon"), "chart variant icon")?;
    let generation =
        decode::parse_generation_icon_or_deluxe(src_attr(generation_img, "chart variant icon")?);

    let level_text = text_of(find(block, selector!(".music_lv_back"), "level block")?);
    let level: LevelValue = level_text
        .parse()
        .map_err(|_| RecordError::decode("level text", level_text.clone()))?;

    // The icon group carries rank, combo, and sync at fixed positions.  A
    // count mismatch means the page shape changed; fail the block loudly
    // instead of misassigning fields.
    let icon_group = find(block, selector!(".t_r.f_r"), "result icon group")?;
    let icon_imgs = icon_group.select(selector!("img")).collect_vec();
    let [rank_img, combo_img, sync_img] = icon_imgs[..] else {
        return Err(RecordError::structure(format!(
            "expected exactly 3 result icons, found {}",
            icon_imgs.len()
        )));
    };
    let rank = decode::parse_rank_icon(src_attr(rank_img, "rank icon")?)?;
    let full_combo = decode::parse_full_combo_icon(src_attr(combo_img, "combo icon")?)?;
    let full_sync = decode::parse_full_sync_icon(src_attr(sync_img, "sync icon")?)?;

    let table = find(block, selector!(".black_block table"), "results table")?;
    let rows = table.select(selector!("tr")).collect_vec();
    let last_played_cell = rows
        .first()
        .and_then(|row| row.select(selector!("td")).last())
        .ok_or_else(|| RecordError::structure("last played row not found"))?;
    let last_played = decode::parse_play_time(&text_of(last_played_cell))?;
    let play_count_cell = rows
        .get(1)
        .and_then(|row| row.select(selector!("td")).last())
        .ok_or_else(|| RecordError::structure("play count row not found"))?;
    let play_count = decode::parse_play_count_text(&text_of(play_count_cell))?;

    let score_blocks = block.select(selector!(".music_score_block")).collect_vec();
    let achievement = decode::parse_achievement_text(&text_of(
        *score_blocks
            .first()
            .ok_or_else(|| RecordError::structure("achievement block not found"))?,
    ));
    let (value, max) = decode::parse_deluxscore_text(&text_of(
        *score_blocks
            .get(1)
            .ok_or_else(|| RecordError::structure("deluxe score block not found"))?,
    ))?;
    let deluxscore = ValueWithMax::new(value, max).map_err(|(value, max)| {
        RecordError::structure(format!("deluxe score {value} exceeds its maximum {max}"))
    })?;

    Ok(DetailedDifficultyRecord::builder()
        .score_metadata(
            ScoreMetadata::builder()
                .generation(generation)
                .difficulty(difficulty)
                .build(),
        )
        .level(level)
        .rank(rank)
        .full_combo_kind(full_combo)
        .full_sync_kind(full_sync)
        .last_played(last_played)
        .play_count(play_count)
        .achievement(achievement)
        .deluxscore(deluxscore)
        .build())
}
