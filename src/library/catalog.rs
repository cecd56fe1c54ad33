//! Built-in demo content installed by `songs seed` and `words seed`.

use chrono::{DateTime, TimeZone, Utc};

use super::{Genre, Song};
use crate::words::{Difficulty, Word};

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn builtin_songs() -> Vec<Song> {
    vec![
        Song {
            id: "1".to_string(),
            title: "Dreams of Ambition".to_string(),
            artist: "Mimi Coach".to_string(),
            genre: Genre::Jpop,
            audio_url: "/audio/dreams-of-ambition.mp3".to_string(),
            lyrics: "夢を追いかけて ambition 燃やして\n\
                     新しい morning comes with hope\n\
                     昨日の failure は past になって\n\
                     今日の challenge で stronger になる\n\
                     \n\
                     Every step I take, every breath I make\n\
                     この道を歩いて行こう\n\
                     Ambition in my heart, 決して諦めない\n\
                     輝く future が待ってる"
                .to_string(),
            word_ids: vec!["1".to_string()],
            duration_secs: 210,
            created_at: date(2024, 1, 20),
        },
        Song {
            id: "2".to_string(),
            title: "Serendipity Moments".to_string(),
            artist: "Chill Vibes".to_string(),
            genre: Genre::Chill,
            audio_url: "/audio/serendipity-moments.mp3".to_string(),
            lyrics: "偶然の出会い serendipity\n\
                     運命が微笑みかけて\n\
                     思いがけない happiness\n\
                     心が軽やかに踊る\n\
                     \n\
                     Like a gentle breeze in spring\n\
                     予期しない joy が来る\n\
                     Serendipity の魔法で\n\
                     世界が変わって見える"
                .to_string(),
            word_ids: vec!["2".to_string()],
            duration_secs: 195,
            created_at: date(2024, 1, 21),
        },
        Song {
            id: "3".to_string(),
            title: "Resilient Soul".to_string(),
            artist: "Acoustic Hearts".to_string(),
            genre: Genre::Acoustic,
            audio_url: "/audio/resilient-soul.mp3".to_string(),
            lyrics: "嵐が過ぎても resilience\n\
                     折れない心で立ち上がる\n\
                     傷ついても stronger\n\
                     涙も明日への bridge\n\
                     \n\
                     Every fall makes me rise\n\
                     困難も growth の chance\n\
                     Resilience は my power\n\
                     未来への希望の光"
                .to_string(),
            word_ids: vec!["3".to_string()],
            duration_secs: 230,
            created_at: date(2024, 1, 22),
        },
    ]
}

/// Demo words, owned by `user_id`.
pub fn builtin_words(user_id: &str) -> Vec<Word> {
    let word = |id: &str,
                english: &str,
                japanese: &str,
                pronunciation: &str,
                difficulty: Difficulty,
                category: &str,
                created_at: DateTime<Utc>,
                last_reviewed: Option<DateTime<Utc>>,
                mastery_level: u8| Word {
        id: id.to_string(),
        user_id: user_id.to_string(),
        english: english.to_string(),
        japanese: japanese.to_string(),
        pronunciation: Some(pronunciation.to_string()),
        difficulty,
        category: category.to_string(),
        created_at,
        last_reviewed,
        mastery_level,
    };

    vec![
        word(
            "1",
            "ambition",
            "野心、大志",
            "æmˈbɪʃən",
            Difficulty::Intermediate,
            "ビジネス",
            date(2024, 1, 15),
            Some(date(2024, 1, 20)),
            75,
        ),
        word(
            "2",
            "serendipity",
            "偶然の幸運",
            "ˌserənˈdɪpəti",
            Difficulty::Advanced,
            "感情",
            date(2024, 1, 16),
            Some(date(2024, 1, 21)),
            45,
        ),
        word(
            "3",
            "resilience",
            "回復力、復元力",
            "rɪˈzɪljəns",
            Difficulty::Intermediate,
            "性格",
            date(2024, 1, 17),
            None,
            60,
        ),
        word(
            "4",
            "wanderlust",
            "旅行熱、放浪癖",
            "ˈwɑndɚlʌst",
            Difficulty::Advanced,
            "旅行",
            date(2024, 1, 18),
            None,
            30,
        ),
        word(
            "5",
            "mindfulness",
            "マインドフルネス、注意深さ",
            "ˈmaɪndfəlnəs",
            Difficulty::Intermediate,
            "健康",
            date(2024, 1, 19),
            None,
            80,
        ),
    ]
}
