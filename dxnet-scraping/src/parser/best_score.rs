//! Extractor for the per-difficulty best-score search page
//! (`record/musicMybest/search/`).

use dxnet_scraping_utils::selector;
use itertools::Itertools;
use scraper::{ElementRef, Html};
use url::Url;

use crate::error::RecordError;
use crate::schema::{
    AchievementValue, BestScoreRecord, ScoreDifficulty, ScoreLevel, SongIcon, SongName,
    ValueWithMax,
};

use super::{collect_blocks, decode, find, src_attr, text_of, Extracted};

pub fn parse(html: &Html, difficulty: ScoreDifficulty) -> Extracted<BestScoreRecord> {
    let blocks = html.select(selector!(
        ".music_basic_score_back, .music_advanced_score_back, .music_expert_score_back, \
         .music_master_score_back, .music_remaster_score_back"
    ));
    collect_blocks(blocks, "best score", |block| parse_block(block, difficulty))
}

fn parse_block(
    block: ElementRef,
    difficulty: ScoreDifficulty,
) -> Result<BestScoreRecord, RecordError> {
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

    let level_text = text_of(find(block, selector!(".music_lv_back"), "level block")?);
    let level: ScoreLevel = level_text
        .parse()
        .map_err(|_| RecordError::decode("level text", level_text.clone()))?;

    // Two stacked score blocks: achievement first, deluxe score second.
    // Either may be missing for an entry without a result; that is a zero,
    // not a failure.
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

    Ok(BestScoreRecord::builder()
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

#[cfg(test)]
mod tests {
    use scraper::Html;

    use crate::schema::{
        AchievementRank, FullComboKind, FullSyncKind, ScoreDifficulty, ScoreLevel,
    };

    use super::parse;

    const IMG: &str = "https://maimaidx-eng.com/maimai-mobile/img";

    fn page(blocks: &str) -> Html {
        Html::parse_document(&format!("<div class=\"wrapper\">{blocks}</div>"))
    }

    fn played_block() -> String {
        format!(
            r#"<div class="music_master_score_back">
              <div class="music_img"><img src="{IMG}/Music/a5c6705e2bfa3419.png"></div>
              <div class="music_lv_back">13+</div>
              <div class="music_name_block">Oshama Scramble!</div>
              <div class="music_score_block">100.1234%</div>
              <div class="music_score_block">2480 / 2500</div>
              <img src="{IMG}/music_icon_splus.png">
              <img src="{IMG}/music_icon_fcp.png">
              <img src="{IMG}/music_icon_back.png">
            </div>"#
        )
    }

    fn unplayed_block() -> String {
        format!(
            r#"<div class="music_master_score_back">
              <div class="music_img"><img src="{IMG}/Music/ffffffffffffffff.png"></div>
              <div class="music_lv_back">12</div>
              <div class="music_name_block">Untouched Song</div>
              <img src="{IMG}/music_icon_back.png">
              <img src="{IMG}/music_icon_back.png">
              <img src="{IMG}/music_icon_back.png">
            </div>"#
        )
    }

    #[test]
    fn parses_a_played_entry_end_to_end() {
        let html = page(&played_block());
        let extracted = parse(&html, ScoreDifficulty::Master);
        assert_eq!(extracted.skipped, 0);
        let [record] = &extracted.records[..] else {
            panic!("Expected exactly one record");
        };
        assert_eq!(record.song_name().as_ref() as &str, "Oshama Scramble!");
        assert_eq!(record.difficulty(), ScoreDifficulty::Master);
        assert_eq!(record.level(), ScoreLevel { level: 13, plus: true });
        assert_eq!(record.level().to_string(), "13+");
        assert_eq!(record.achievement().get(), 100_1234);
        assert_eq!(record.rank(), AchievementRank::SPlus);
        assert_eq!(record.music_id().as_ref() as &str, "a5c6705e2bfa3419");
        assert_eq!(record.deluxscore().value(), 2480);
        assert_eq!(record.deluxscore().max(), 2500);
        assert_eq!(record.full_combo_kind(), FullComboKind::FullComboPlus);
        assert_eq!(record.full_sync_kind(), FullSyncKind::Nothing);
    }

    #[test]
    fn entry_without_results_gets_zeroes_and_defaults() {
        let html = page(&unplayed_block());
        let extracted = parse(&html, ScoreDifficulty::Master);
        assert_eq!(extracted.skipped, 0);
        let record = &extracted.records[0];
        assert_eq!(record.achievement().get(), 0);
        assert_eq!(record.deluxscore().value(), 0);
        assert_eq!(record.deluxscore().max(), 0);
        assert_eq!(record.rank(), AchievementRank::D);
        assert_eq!(record.full_combo_kind(), FullComboKind::Nothing);
        assert_eq!(record.full_sync_kind(), FullSyncKind::Nothing);
    }

    #[test]
    fn a_block_without_a_cover_is_skipped() {
        let broken = played_block().replace("music_img", "music_missing");
        let html = page(&format!("{}{}", played_block(), broken));
        let extracted = parse(&html, ScoreDifficulty::Master);
        assert_eq!(extracted.records.len(), 1);
        assert_eq!(extracted.skipped, 1);
    }
}
