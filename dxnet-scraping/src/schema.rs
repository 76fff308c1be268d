use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::bail;
use chrono::NaiveDateTime;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use strum::EnumIter;
use typed_builder::TypedBuilder;
use url::Url;

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, EnumIter,
)]
pub enum ScoreDifficulty {
    Basic,
    Advanced,
    Expert,
    Master,
    ReMaster,
}

impl ScoreDifficulty {
    /// 0-based value used by the `diff=` query parameter.
    pub fn ordinal(self) -> u8 {
        use ScoreDifficulty::*;
        match self {
            Basic => 0,
            Advanced => 1,
            Expert => 2,
            Master => 3,
            ReMaster => 4,
        }
    }

    /// Lowercase token the site uses both in icon filenames (`diff_master.png`)
    /// and as the block identifier on the music detail page.
    pub fn site_token(self) -> &'static str {
        use ScoreDifficulty::*;
        match self {
            Basic => "basic",
            Advanced => "advanced",
            Expert => "expert",
            Master => "master",
            ReMaster => "remaster",
        }
    }

    pub fn from_site_token(token: &str) -> Option<Self> {
        use ScoreDifficulty::*;
        Some(match &token.to_ascii_lowercase()[..] {
            "basic" => Basic,
            "advanced" => Advanced,
            "expert" => Expert,
            "master" => Master,
            "remaster" => ReMaster,
            _ => return None,
        })
    }
}

impl FromStr for ScoreDifficulty {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ScoreDifficulty::*;
        Ok(match s.chars().next() {
            Some('b' | 'B') => Basic,
            Some('a' | 'A') => Advanced,
            Some('e' | 'E') => Expert,
            Some('m' | 'M') => Master,
            Some('r' | 'R') => ReMaster,
            _ => bail!("Invalid score difficulty: {:?}", s),
        })
    }
}

/// Search pages accept either a single difficulty or the `ALL` sentinel
/// (`diff=99`).  The sentinel exists only at the query level; records always
/// carry a concrete [`ScoreDifficulty`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DifficultyQuery {
    All,
    Single(ScoreDifficulty),
}

impl DifficultyQuery {
    pub fn query_value(self) -> u8 {
        match self {
            DifficultyQuery::All => 99,
            DifficultyQuery::Single(difficulty) => difficulty.ordinal(),
        }
    }
}

impl From<ScoreDifficulty> for DifficultyQuery {
    fn from(difficulty: ScoreDifficulty) -> Self {
        DifficultyQuery::Single(difficulty)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ScoreGeneration {
    Standard,
    Deluxe,
}

/// Rank tiers in ascending order of the achievement band they represent,
/// so that the derived `Ord` matches the in-game ordering.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum AchievementRank {
    D,
    C,
    B,
    BB,
    BBB,
    A,
    AA,
    AAA,
    S,
    SPlus,
    SS,
    SSPlus,
    SSS,
    SSSPlus,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum FullComboKind {
    Nothing,
    FullCombo,
    FullComboPlus,
    AllPerfect,
    AllPerfectPlus,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum FullSyncKind {
    Nothing,
    SyncPlay,
    FullSync,
    FullSyncPlus,
    FullSyncDx,
    FullSyncDxPlus,
}

/// Achievement in ten-thousandths of a percent (`101.4514%` is `101_4514`).
/// Deliberately not range-checked: this is a display value taken verbatim
/// from the page.
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    derive_more::From,
    derive_more::Into,
    Serialize,
    Deserialize,
)]
pub struct AchievementValue(u32);

impl AchievementValue {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Display for AchievementValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:04}%", self.0 / 10000, self.0 % 10000)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct ValueWithMax<T: PartialOrd + Copy> {
    value: T,
    max: T,
}

impl<T: PartialOrd + Copy> ValueWithMax<T> {
    pub fn new(value: T, max: T) -> Result<Self, (T, T)> {
        if value <= max {
            Ok(Self { value, max })
        } else {
            Err((value, max))
        }
    }
}

/// Display level as shown on the best-score pages: an integer with an
/// optional `+` suffix ("this tier's upper half").
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ScoreLevel {
    pub level: u8,
    pub plus: bool,
}

impl ScoreLevel {
    pub fn new(level: u8, plus: bool) -> anyhow::Result<Self> {
        match (level, plus) {
            (0 | 16.., _) | (1..=6 | 15, true) => {
                bail!("Level out of range: {level}{}", if plus { "+" } else { "" })
            }
            _ => Ok(ScoreLevel { level, plus }),
        }
    }
}

impl FromStr for ScoreLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        let stripped = s.strip_suffix('+');
        let level = stripped.unwrap_or(s).parse()?;
        let plus = stripped.is_some();
        Self::new(level, plus)
    }
}

impl Display for ScoreLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.level, if self.plus { "+" } else { "" })
    }
}

/// Display level in half units, the numeric convention of the detail and
/// sort pages ("13" is 26, "13+" is 27, shown as 13.5).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct LevelValue(u8);

impl LevelValue {
    pub fn halves(self) -> u8 {
        self.0
    }
}

impl From<ScoreLevel> for LevelValue {
    fn from(level: ScoreLevel) -> Self {
        Self(level.level * 2 + level.plus as u8)
    }
}

impl FromStr for LevelValue {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(s.parse::<ScoreLevel>()?.into())
    }
}

impl Display for LevelValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0 / 2)?;
        if self.0 % 2 == 1 {
            write!(f, ".5")?;
        }
        Ok(())
    }
}

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
pub struct PlayTime(NaiveDateTime);

impl PlayTime {
    pub fn get(self) -> NaiveDateTime {
        self.0
    }
}

/// 1-based position of the play within its credit.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, derive_more::Display, Serialize, Deserialize,
)]
pub struct TrackIndex(u8);

impl TrackIndex {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for TrackIndex {
    type Error = u8;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1.. => Ok(Self(value)),
            _ => Err(value),
        }
    }
}

/// 1-based finishing position among synchronized co-players.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, derive_more::Display, Serialize, Deserialize,
)]
pub struct MatchingRank(u8);

impl MatchingRank {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MatchingRank {
    type Error = u8;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=4 => Ok(Self(value)),
            _ => Err(value),
        }
    }
}

/// Hash-like token identifying a song, extracted from its cover art URL.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    derive_more::From,
    derive_more::AsRef,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
#[as_ref(forward)]
pub struct MusicId(String);

/// Opaque key accepted by the detail pages (`?idx=`).
#[derive(
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    derive_more::From,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
pub struct ScoreIdx(String);

#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    derive_more::From,
    derive_more::AsRef,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
#[as_ref(forward)]
pub struct SongName(String);

#[derive(
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    derive_more::From,
    derive_more::AsRef,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
#[as_ref(forward)]
pub struct ArtistName(String);

#[derive(
    Clone, PartialEq, Eq, Debug, derive_more::From, derive_more::Display, Serialize, Deserialize,
)]
pub struct SongIcon(Url);

impl SongIcon {
    pub fn url(&self) -> &Url {
        &self.0
    }
}

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    TypedBuilder,
    CopyGetters,
    Serialize,
    Deserialize,
)]
#[getset(get_copy = "pub")]
pub struct ScoreMetadata {
    generation: ScoreGeneration,
    difficulty: ScoreDifficulty,
}

#[derive(PartialEq, Eq, Debug, TypedBuilder, Getters, CopyGetters, Serialize, Deserialize)]
pub struct PlayedAt {
    #[getset(get = "pub")]
    idx: ScoreIdx,
    #[getset(get_copy = "pub")]
    time: PlayTime,
    #[getset(get_copy = "pub")]
    track: TrackIndex,
}

#[derive(PartialEq, Eq, Debug, TypedBuilder, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct SongMetadata {
    name: SongName,
    music_id: MusicId,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, TypedBuilder, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct AchievementResult {
    value: AchievementValue,
    new_record: bool,
    rank: AchievementRank,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, TypedBuilder, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct DeluxscoreResult {
    score: ValueWithMax<u32>,
    new_record: bool,
}

/// One entry of the recent-play list.
#[derive(PartialEq, Eq, Debug, TypedBuilder, Getters, CopyGetters, Serialize, Deserialize)]
pub struct PlayRecord {
    #[getset(get = "pub")]
    played_at: PlayedAt,
    #[getset(get = "pub")]
    song_metadata: SongMetadata,
    #[getset(get_copy = "pub")]
    score_metadata: ScoreMetadata,
    #[getset(get_copy = "pub")]
    cleared: bool,
    #[getset(get_copy = "pub")]
    achievement_result: AchievementResult,
    #[getset(get_copy = "pub")]
    deluxscore_result: DeluxscoreResult,
    #[getset(get_copy = "pub")]
    full_combo_kind: FullComboKind,
    #[getset(get_copy = "pub")]
    full_sync_kind: FullSyncKind,
    #[getset(get_copy = "pub")]
    matching_rank: Option<MatchingRank>,
}

/// One song's top recorded attempt for one difficulty, from the
/// best-score search page.
#[derive(PartialEq, Eq, Debug, TypedBuilder, Getters, CopyGetters, Serialize, Deserialize)]
pub struct BestScoreRecord {
    #[getset(get = "pub")]
    song_name: SongName,
    #[getset(get_copy = "pub")]
    difficulty: ScoreDifficulty,
    #[getset(get_copy = "pub")]
    level: ScoreLevel,
    #[getset(get_copy = "pub")]
    achievement: AchievementValue,
    #[getset(get_copy = "pub")]
    rank: AchievementRank,
    #[getset(get = "pub")]
    music_id: MusicId,
    #[getset(get = "pub")]
    cover_art: SongIcon,
    #[getset(get_copy = "pub")]
    deluxscore: ValueWithMax<u32>,
    #[getset(get_copy = "pub")]
    full_combo_kind: FullComboKind,
    #[getset(get_copy = "pub")]
    full_sync_kind: FullSyncKind,
}

/// Same shape as [`BestScoreRecord`], but from the sort listing, whose level
/// column follows the numeric half-unit convention.
#[derive(PartialEq, Eq, Debug, TypedBuilder, Getters, CopyGetters, Serialize, Deserialize)]
pub struct SortedScoreRecord {
    #[getset(get = "pub")]
    song_name: SongName,
    #[getset(get_copy = "pub")]
    difficulty: ScoreDifficulty,
    #[getset(get_copy = "pub")]
    level: LevelValue,
    #[getset(get_copy = "pub")]
    achievement: AchievementValue,
    #[getset(get_copy = "pub")]
    rank: AchievementRank,
    #[getset(get = "pub")]
    music_id: MusicId,
    #[getset(get = "pub")]
    cover_art: SongIcon,
    #[getset(get_copy = "pub")]
    deluxscore: ValueWithMax<u32>,
    #[getset(get_copy = "pub")]
    full_combo_kind: FullComboKind,
    #[getset(get_copy = "pub")]
    full_sync_kind: FullSyncKind,
}

/// One song's results across all difficulties, from the detail page.
#[derive(PartialEq, Eq, Debug, TypedBuilder, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct DetailedSongRecord {
    music_id: MusicId,
    song_name: SongName,
    artist: ArtistName,
    scores: BTreeMap<ScoreDifficulty, DetailedDifficultyRecord>,
}

#[derive(PartialEq, Eq, Debug, TypedBuilder, Getters, CopyGetters, Serialize, Deserialize)]
pub struct DetailedDifficultyRecord {
    #[getset(get_copy = "pub")]
    score_metadata: ScoreMetadata,
    #[getset(get_copy = "pub")]
    level: LevelValue,
    #[getset(get_copy = "pub")]
    rank: AchievementRank,
    #[getset(get_copy = "pub")]
    full_combo_kind: FullComboKind,
    #[getset(get_copy = "pub")]
    full_sync_kind: FullSyncKind,
    #[getset(get_copy = "pub")]
    last_played: PlayTime,
    #[getset(get_copy = "pub")]
    play_count: u32,
    #[getset(get_copy = "pub")]
    achievement: AchievementValue,
    #[getset(get_copy = "pub")]
    deluxscore: ValueWithMax<u32>,
}
