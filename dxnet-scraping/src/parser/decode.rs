//! Pure decoders from icon URLs and text fragments to schema values.
//!
//! Icon filenames are normalized to a bare stem (query string and directory
//! stripped, `music_icon_` prefix and underscores removed, lowercased) and
//! then matched *exactly* against ordered token tables.  The tables list the
//! most specific token first; exact matching is what keeps `s` from shadowing
//! `splus` and `fc` from shadowing `fcplus`.

use chrono::NaiveDateTime;
use dxnet_scraping_utils::regex;
use log::warn;

use crate::error::RecordError;
use crate::schema::{
    AchievementRank, AchievementValue, FullComboKind, FullSyncKind, MatchingRank, MusicId,
    PlayTime, ScoreDifficulty, ScoreGeneration, TrackIndex,
};

/// Normalized filename stem of an icon URL, or `None` for non-PNG sources.
fn icon_stem(url: &str) -> Option<String> {
    let lower = url.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or(&lower);
    let name = path.rsplit('/').next().unwrap_or(path);
    let stem = name.strip_suffix(".png")?;
    let stem = stem.strip_prefix("music_icon_").unwrap_or(stem);
    Some(stem.replace('_', ""))
}

/// Placeholder art shown where no result exists yet.
fn is_background(stem: &str) -> bool {
    ["back", "dummy", "base"]
        .iter()
        .any(|needle| stem.contains(needle))
}

fn lookup<T: Copy>(table: &[(&str, T)], stem: &str) -> Option<T> {
    table
        .iter()
        .find(|(token, _)| *token == stem)
        .map(|&(_, value)| value)
}

// Most specific token first.  Both the playlog spelling ("splus") and the
// music-icon spelling ("sp") are listed.
const RANK_TOKENS: &[(&str, AchievementRank)] = &[
    ("sssplus", AchievementRank::SSSPlus),
    ("sssp", AchievementRank::SSSPlus),
    ("sss", AchievementRank::SSS),
    ("ssplus", AchievementRank::SSPlus),
    ("ssp", AchievementRank::SSPlus),
    ("ss", AchievementRank::SS),
    ("splus", AchievementRank::SPlus),
    ("sp", AchievementRank::SPlus),
    ("s", AchievementRank::S),
    ("aaa", AchievementRank::AAA),
    ("aa", AchievementRank::AA),
    ("a", AchievementRank::A),
    ("bbb", AchievementRank::BBB),
    ("bb", AchievementRank::BB),
    ("b", AchievementRank::B),
    ("c", AchievementRank::C),
    ("d", AchievementRank::D),
];

const FULL_COMBO_TOKENS: &[(&str, FullComboKind)] = &[
    ("fcplus", FullComboKind::FullComboPlus),
    ("fcp", FullComboKind::FullComboPlus),
    ("fc", FullComboKind::FullCombo),
    ("applus", FullComboKind::AllPerfectPlus),
    ("app", FullComboKind::AllPerfectPlus),
    ("ap", FullComboKind::AllPerfect),
];

const FULL_SYNC_TOKENS: &[(&str, FullSyncKind)] = &[
    ("fsdplus", FullSyncKind::FullSyncDxPlus),
    ("fsdp", FullSyncKind::FullSyncDxPlus),
    ("fdxp", FullSyncKind::FullSyncDxPlus),
    ("fsd", FullSyncKind::FullSyncDx),
    ("fdx", FullSyncKind::FullSyncDx),
    ("fsplus", FullSyncKind::FullSyncPlus),
    ("fsp", FullSyncKind::FullSyncPlus),
    ("fs", FullSyncKind::FullSync),
    ("sync", FullSyncKind::SyncPlay),
];

/// Difficulty is load-bearing and never defaults silently.
pub fn parse_difficulty_icon(url: &str) -> Result<ScoreDifficulty, RecordError> {
    regex!(r"(?i)diff_([a-z]+)\.png")
        .captures(url)
        .and_then(|captures| ScoreDifficulty::from_site_token(&captures[1]))
        .ok_or_else(|| RecordError::decode("difficulty icon", url))
}

/// An absent icon is the regular "not cleared" presentation, not a failure.
pub fn parse_clear_icon(url: Option<&str>) -> Result<bool, RecordError> {
    let Some(url) = url.filter(|url| !url.is_empty()) else {
        return Ok(false);
    };
    match icon_stem(url).as_deref() {
        Some("clear") => Ok(true),
        _ => Err(RecordError::decode("clear icon", url)),
    }
}

pub fn parse_generation_icon(url: &str) -> Result<ScoreGeneration, RecordError> {
    let stem = icon_stem(url).ok_or_else(|| RecordError::decode("chart variant icon", url))?;
    if stem.contains("standard") || stem.contains("std") {
        Ok(ScoreGeneration::Standard)
    } else if stem.contains("dx") {
        Ok(ScoreGeneration::Deluxe)
    } else {
        Err(RecordError::decode("chart variant icon", url))
    }
}

/// The one decoder with a fallback: an unrecognized chart variant icon is
/// treated as deluxe, logged at warn level.  No other decoder may default.
pub fn parse_generation_icon_or_deluxe(url: &str) -> ScoreGeneration {
    parse_generation_icon(url).unwrap_or_else(|e| {
        warn!("{e}; assuming the deluxe chart variant");
        ScoreGeneration::Deluxe
    })
}

/// Background art decodes to D: it stands for "no result yet", which the
/// best-score pages render with the lowest rank slot.
pub fn parse_rank_icon(url: &str) -> Result<AchievementRank, RecordError> {
    let stem = icon_stem(url).ok_or_else(|| RecordError::decode("rank icon", url))?;
    if is_background(&stem) {
        return Ok(AchievementRank::D);
    }
    lookup(RANK_TOKENS, &stem).ok_or_else(|| RecordError::decode("rank icon", url))
}

pub fn parse_full_combo_icon(url: &str) -> Result<FullComboKind, RecordError> {
    let stem = icon_stem(url).ok_or_else(|| RecordError::decode("combo icon", url))?;
    if is_background(&stem) {
        return Ok(FullComboKind::Nothing);
    }
    lookup(FULL_COMBO_TOKENS, &stem).ok_or_else(|| RecordError::decode("combo icon", url))
}

pub fn parse_full_sync_icon(url: &str) -> Result<FullSyncKind, RecordError> {
    let stem = icon_stem(url).ok_or_else(|| RecordError::decode("sync icon", url))?;
    if is_background(&stem) {
        return Ok(FullSyncKind::Nothing);
    }
    lookup(FULL_SYNC_TOKENS, &stem).ok_or_else(|| RecordError::decode("sync icon", url))
}

/// `None` means the placement slot was not rendered (solo play).
pub fn parse_matching_rank_icon(url: Option<&str>) -> Result<Option<MatchingRank>, RecordError> {
    let Some(url) = url.filter(|url| !url.is_empty()) else {
        return Ok(None);
    };
    let stem = icon_stem(url).ok_or_else(|| RecordError::decode("placement icon", url))?;
    let rank = stem
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .and_then(|digit| MatchingRank::try_from(digit as u8).ok())
        .ok_or_else(|| RecordError::decode("placement icon", url))?;
    Ok(Some(rank))
}

/// `"2,485 / 2,500"` into `(2485, 2500)`.  The value/max relation is checked
/// later, when the pair is turned into a `ValueWithMax`.
pub fn parse_deluxscore_text(text: &str) -> Result<(u32, u32), RecordError> {
    let captures = regex!(r"^([0-9,]+)\s*/\s*([0-9,]+)$")
        .captures(text.trim())
        .ok_or_else(|| RecordError::decode("deluxe score", text))?;
    let parse = |s: &str| {
        s.replace(',', "")
            .parse::<u32>()
            .map_err(|_| RecordError::decode("deluxe score", text))
    };
    Ok((parse(&captures[1])?, parse(&captures[2])?))
}

/// Total: achievement text is sometimes split across sibling nodes, so a
/// best-effort concatenation arrives here and anything unusable becomes 0.
pub fn parse_achievement_text(text: &str) -> AchievementValue {
    let trimmed = text.trim().trim_end_matches('%').trim_end();
    let Some(captures) = regex!(r"^([0-9]{1,3})(?:\.([0-9]{1,4}))?$").captures(trimmed) else {
        return AchievementValue::from(0);
    };
    let integral: u32 = captures[1].parse().expect("pattern is integral");
    let fractional = match captures.get(2) {
        Some(m) => {
            let digits: u32 = m.as_str().parse().expect("pattern is integral");
            digits * 10u32.pow(4 - m.as_str().len() as u32)
        }
        None => 0,
    };
    AchievementValue::from(integral * 10000 + fractional)
}

pub fn parse_music_id(url: &str) -> Result<MusicId, RecordError> {
    regex!(r"Music/([0-9a-zA-Z]+)\.png")
        .captures(url)
        .map(|captures| MusicId::from(captures[1].to_owned()))
        .ok_or_else(|| RecordError::decode("music id", url))
}

pub fn parse_track_number(text: &str) -> Result<TrackIndex, RecordError> {
    regex!(r"(?i)TRACK\s*([0-9]+)")
        .captures(text)
        .and_then(|captures| captures[1].parse::<u8>().ok())
        .and_then(|value| TrackIndex::try_from(value).ok())
        .ok_or_else(|| RecordError::decode("track number", text))
}

/// Cumulative play count from the detail-page results table; the cell may
/// carry a counter suffix, so only the leading number is read.
pub fn parse_play_count_text(text: &str) -> Result<u32, RecordError> {
    regex!(r"([0-9][0-9,]*)")
        .captures(text)
        .and_then(|captures| captures[1].replace(',', "").parse().ok())
        .ok_or_else(|| RecordError::decode("play count", text))
}

pub fn parse_play_time(text: &str) -> Result<PlayTime, RecordError> {
    NaiveDateTime::parse_from_str(text.trim(), "%Y/%m/%d %H:%M")
        .map(Into::into)
        .map_err(|_| RecordError::decode("play time", text))
}

/// Rank, combo, and sync decoded from one block's icon set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ResultIcons {
    pub rank: AchievementRank,
    pub full_combo: FullComboKind,
    pub full_sync: FullSyncKind,
}

/// Routes each icon of a best-score or sort-listing block to its decoder.
/// Backgrounds are dropped first; then sync-family stems (`fs*`, `fdx*`,
/// `sync`) and combo-family stems (`fc*`, `ap*`) are peeled off, and whatever
/// remains must be a rank icon.  Missing icons leave the defaults
/// (D / nothing / nothing) in place.
pub fn route_result_icons<'a>(
    urls: impl IntoIterator<Item = &'a str>,
) -> Result<ResultIcons, RecordError> {
    let mut icons = ResultIcons {
        rank: AchievementRank::D,
        full_combo: FullComboKind::Nothing,
        full_sync: FullSyncKind::Nothing,
    };
    for url in urls {
        let Some(stem) = icon_stem(url) else {
            continue;
        };
        if is_background(&stem) {
            continue;
        }
        if stem == "sync" || stem.starts_with("fs") || stem.starts_with("fdx") {
            icons.full_sync = parse_full_sync_icon(url)?;
        } else if stem.starts_with("fc") || stem.starts_with("ap") {
            icons.full_combo = parse_full_combo_icon(url)?;
        } else {
            icons.rank = parse_rank_icon(url)?;
        }
    }
    Ok(icons)
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn playlog_icon(name: &str) -> String {
        format!("https://maimaidx-eng.com/maimai-mobile/img/playlog/{name}.png?ver=1.35")
    }

    fn music_icon(name: &str) -> String {
        format!("https://maimaidx-eng.com/maimai-mobile/img/music_icon_{name}.png")
    }

    #[test]
    fn difficulty_round_trip() {
        for difficulty in ScoreDifficulty::iter() {
            let url = format!(
                "https://maimaidx-eng.com/maimai-mobile/img/diff_{}.png",
                difficulty.site_token()
            );
            assert_eq!(parse_difficulty_icon(&url).unwrap(), difficulty);
        }
        assert!(parse_difficulty_icon("img/diff_utage.png").is_err());
        assert!(parse_difficulty_icon("img/clear.png").is_err());
    }

    #[test]
    fn plus_ranks_never_collapse_to_their_prefix() {
        // The `s`/`splus` class of collision; the specific tokens must win.
        for (name, expected) in [
            ("splus", AchievementRank::SPlus),
            ("ssplus", AchievementRank::SSPlus),
            ("sssplus", AchievementRank::SSSPlus),
        ] {
            assert_eq!(parse_rank_icon(&playlog_icon(name)).unwrap(), expected);
        }
        for (name, expected) in [
            ("sp", AchievementRank::SPlus),
            ("ssp", AchievementRank::SSPlus),
            ("sssp", AchievementRank::SSSPlus),
        ] {
            assert_eq!(parse_rank_icon(&music_icon(name)).unwrap(), expected);
        }
        assert_eq!(
            parse_rank_icon(&playlog_icon("s")).unwrap(),
            AchievementRank::S
        );
        assert_eq!(
            parse_rank_icon(&playlog_icon("ss")).unwrap(),
            AchievementRank::SS
        );
    }

    #[test]
    fn all_rank_tokens_decode() {
        for (name, expected) in [
            ("sss", AchievementRank::SSS),
            ("aaa", AchievementRank::AAA),
            ("aa", AchievementRank::AA),
            ("a", AchievementRank::A),
            ("bbb", AchievementRank::BBB),
            ("bb", AchievementRank::BB),
            ("b", AchievementRank::B),
            ("c", AchievementRank::C),
            ("d", AchievementRank::D),
        ] {
            assert_eq!(parse_rank_icon(&playlog_icon(name)).unwrap(), expected);
        }
        assert!(parse_rank_icon(&playlog_icon("e")).is_err());
    }

    #[test]
    fn backgrounds_decode_to_none_everywhere() {
        for name in ["fc_dummy", "sync_dummy", "back", "music_icon_back", "base"] {
            let url = playlog_icon(name);
            assert_eq!(
                parse_full_combo_icon(&url).unwrap(),
                FullComboKind::Nothing
            );
            assert_eq!(parse_full_sync_icon(&url).unwrap(), FullSyncKind::Nothing);
            assert_eq!(parse_rank_icon(&url).unwrap(), AchievementRank::D);
        }
    }

    #[test]
    fn plus_combo_and_sync_tokens_win_over_prefixes() {
        assert_eq!(
            parse_full_combo_icon(&playlog_icon("fcplus")).unwrap(),
            FullComboKind::FullComboPlus
        );
        assert_eq!(
            parse_full_combo_icon(&music_icon("fcp")).unwrap(),
            FullComboKind::FullComboPlus
        );
        assert_eq!(
            parse_full_combo_icon(&playlog_icon("applus")).unwrap(),
            FullComboKind::AllPerfectPlus
        );
        assert_eq!(
            parse_full_combo_icon(&playlog_icon("fc")).unwrap(),
            FullComboKind::FullCombo
        );
        assert_eq!(
            parse_full_sync_icon(&playlog_icon("fsdplus")).unwrap(),
            FullSyncKind::FullSyncDxPlus
        );
        assert_eq!(
            parse_full_sync_icon(&playlog_icon("fsdp")).unwrap(),
            FullSyncKind::FullSyncDxPlus
        );
        assert_eq!(
            parse_full_sync_icon(&music_icon("fdxp")).unwrap(),
            FullSyncKind::FullSyncDxPlus
        );
        assert_eq!(
            parse_full_sync_icon(&playlog_icon("fsp")).unwrap(),
            FullSyncKind::FullSyncPlus
        );
        assert_eq!(
            parse_full_sync_icon(&playlog_icon("fs")).unwrap(),
            FullSyncKind::FullSync
        );
        assert_eq!(
            parse_full_sync_icon(&playlog_icon("sync")).unwrap(),
            FullSyncKind::SyncPlay
        );
    }

    #[test]
    fn clear_icon_absent_means_not_cleared() {
        assert!(!parse_clear_icon(None).unwrap());
        assert!(!parse_clear_icon(Some("")).unwrap());
        assert!(parse_clear_icon(Some(&playlog_icon("clear"))).unwrap());
        assert!(parse_clear_icon(Some(&playlog_icon("mystery"))).is_err());
    }

    #[test]
    fn generation_icon_and_fallback_policy() {
        assert_eq!(
            parse_generation_icon("img/music_dx.png").unwrap(),
            ScoreGeneration::Deluxe
        );
        assert_eq!(
            parse_generation_icon("img/music_standard.png").unwrap(),
            ScoreGeneration::Standard
        );
        assert_eq!(
            parse_generation_icon("img/music_std.png").unwrap(),
            ScoreGeneration::Standard
        );
        assert!(parse_generation_icon("img/music_unknown.png").is_err());
        assert_eq!(
            parse_generation_icon_or_deluxe("img/music_unknown.png"),
            ScoreGeneration::Deluxe
        );
    }

    #[test]
    fn matching_rank_from_placement_icon() {
        assert_eq!(parse_matching_rank_icon(None).unwrap(), None);
        assert_eq!(
            parse_matching_rank_icon(Some(&playlog_icon("2nd")))
                .unwrap()
                .map(MatchingRank::get),
            Some(2)
        );
        assert_eq!(
            parse_matching_rank_icon(Some(&playlog_icon("1st")))
                .unwrap()
                .map(MatchingRank::get),
            Some(1)
        );
        assert!(parse_matching_rank_icon(Some(&playlog_icon("9th"))).is_err());
    }

    #[test]
    fn deluxscore_text() {
        assert_eq!(parse_deluxscore_text("2,485 / 2,500").unwrap(), (2485, 2500));
        assert_eq!(parse_deluxscore_text("0 / 0").unwrap(), (0, 0));
        assert_eq!(parse_deluxscore_text(" 1,000/2,000 ").unwrap(), (1000, 2000));
        assert!(parse_deluxscore_text("garbage").is_err());
    }

    #[test]
    fn achievement_text_is_total() {
        assert_eq!(parse_achievement_text("101.4514%").get(), 101_4514);
        assert_eq!(parse_achievement_text("100.1234%").get(), 100_1234);
        assert_eq!(parse_achievement_text("99.75%").get(), 99_7500);
        assert_eq!(parse_achievement_text("98%").get(), 98_0000);
        assert_eq!(parse_achievement_text("").get(), 0);
        assert_eq!(parse_achievement_text("unplayed").get(), 0);
    }

    #[test]
    fn music_id_from_cover_url() {
        assert_eq!(
            parse_music_id("https://maimaidx-eng.com/maimai-mobile/img/Music/a5c6705e2bfa3419.png")
                .unwrap(),
            MusicId::from("a5c6705e2bfa3419".to_owned())
        );
        assert!(parse_music_id("img/diff_basic.png").is_err());
    }

    #[test]
    fn track_number_from_subtitle() {
        assert_eq!(parse_track_number("TRACK 04").unwrap().get(), 4);
        assert_eq!(parse_track_number("track 12").unwrap().get(), 12);
        assert!(parse_track_number("no track here").is_err());
    }

    #[test]
    fn play_count_reads_the_leading_number() {
        assert_eq!(parse_play_count_text("12").unwrap(), 12);
        assert_eq!(parse_play_count_text("1,024 times").unwrap(), 1024);
        assert!(parse_play_count_text("never").is_err());
    }

    #[test]
    fn play_time_format() {
        let time = parse_play_time("2024/05/01 12:34").unwrap();
        assert_eq!(time.get().format("%Y/%m/%d %H:%M").to_string(), "2024/05/01 12:34");
        assert!(parse_play_time("yesterday").is_err());
    }

    #[test]
    fn icons_route_to_the_right_family() {
        let icons = route_result_icons([
            music_icon("back").as_str(),
            music_icon("sp").as_str(),
            music_icon("fcp").as_str(),
            music_icon("fsd").as_str(),
        ])
        .unwrap();
        assert_eq!(icons.rank, AchievementRank::SPlus);
        assert_eq!(icons.full_combo, FullComboKind::FullComboPlus);
        assert_eq!(icons.full_sync, FullSyncKind::FullSyncDx);

        // Order independent: routing is by stem, not by position.
        let shuffled = route_result_icons([
            music_icon("fsd").as_str(),
            music_icon("fcp").as_str(),
            music_icon("sp").as_str(),
        ])
        .unwrap();
        assert_eq!(icons, shuffled);

        // Nothing but background: all defaults.
        let empty = route_result_icons([music_icon("back").as_str()]).unwrap();
        assert_eq!(empty.rank, AchievementRank::D);
        assert_eq!(empty.full_combo, FullComboKind::Nothing);
        assert_eq!(empty.full_sync, FullSyncKind::Nothing);
    }
}
