use super::*;
use crate::library::builtin_words;
use tempfile::tempdir;

fn draft(english: &str) -> WordDraft {
    WordDraft::new(english, "訳", None, Difficulty::Beginner, "テスト").unwrap()
}

mod store_tests {
    use super::*;

    #[test]
    fn test_list_is_newest_first_and_per_user() {
        let dir = tempdir().unwrap();
        let mut store = LocalWordStore::open(dir.path()).unwrap();

        store.add("alice", draft("first")).unwrap();
        store.add("alice", draft("second")).unwrap();
        store.add("bob", draft("other")).unwrap();

        let words = store.list_for_user("alice").unwrap();
        let english: Vec<_> = words.iter().map(|w| w.english.as_str()).collect();
        assert_eq!(english, vec!["second", "first"]);
        assert_eq!(words[0].mastery_level, 0);
        assert!(words[0].last_reviewed.is_none());
    }

    #[test]
    fn test_words_persist() {
        let dir = tempdir().unwrap();
        let id = {
            let mut store = LocalWordStore::open(dir.path()).unwrap();
            store.add("alice", draft("ambition")).unwrap().id
        };

        let store = LocalWordStore::open(dir.path()).unwrap();
        let words = store.list_for_user("alice").unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].id, id);
    }

    #[test]
    fn test_duplicate_word_is_rejected() {
        let dir = tempdir().unwrap();
        let mut store = LocalWordStore::open(dir.path()).unwrap();
        store.add("alice", draft("ambition")).unwrap();

        let err = store.add("alice", draft("Ambition")).unwrap_err();
        assert_eq!(err.code, StorageErrorCode::AlreadyExists);
        // Another user may have the same word
        assert!(store.add("bob", draft("ambition")).is_ok());
    }

    #[test]
    fn test_mastery_is_clamped_and_stamped() {
        let dir = tempdir().unwrap();
        let mut store = LocalWordStore::open(dir.path()).unwrap();
        let id = store.add("alice", draft("ambition")).unwrap().id;

        store.update_mastery("alice", &id, 150).unwrap();
        let word = store.list_for_user("alice").unwrap().remove(0);
        assert_eq!(word.mastery_level, 100);
        assert!(word.last_reviewed.is_some());

        store.update_mastery("alice", &id, -20).unwrap();
        assert_eq!(store.list_for_user("alice").unwrap()[0].mastery_level, 0);
    }

    #[test]
    fn test_update_and_delete() {
        let dir = tempdir().unwrap();
        let mut store = LocalWordStore::open(dir.path()).unwrap();
        let id = store.add("alice", draft("ambtion")).unwrap().id;

        let update = WordUpdate {
            english: Some("ambition".to_string()),
            difficulty: Some(Difficulty::Advanced),
            ..Default::default()
        };
        store.update("alice", &id, update).unwrap();
        let word = &store.list_for_user("alice").unwrap()[0];
        assert_eq!(word.english, "ambition");
        assert_eq!(word.difficulty, Difficulty::Advanced);
        assert_eq!(word.japanese, "訳");

        store.delete("alice", &id).unwrap();
        assert!(store.list_for_user("alice").unwrap().is_empty());
        assert_eq!(
            store.delete("alice", &id).unwrap_err().code,
            StorageErrorCode::NotFound
        );
    }

    #[test]
    fn test_other_users_words_are_protected() {
        let dir = tempdir().unwrap();
        let mut store = LocalWordStore::open(dir.path()).unwrap();
        let id = store.add("alice", draft("ambition")).unwrap().id;

        assert_eq!(
            store.delete("bob", &id).unwrap_err().code,
            StorageErrorCode::PermissionDenied
        );
        assert_eq!(
            store.update_mastery("bob", &id, 50).unwrap_err().code,
            StorageErrorCode::PermissionDenied
        );
    }

    #[test]
    fn test_anonymous_access_is_unauthenticated() {
        let dir = tempdir().unwrap();
        let mut store = LocalWordStore::open(dir.path()).unwrap();
        assert_eq!(
            store.list_for_user("").unwrap_err().code,
            StorageErrorCode::Unauthenticated
        );
        assert_eq!(
            store.add("", draft("x")).unwrap_err().code,
            StorageErrorCode::Unauthenticated
        );
    }

    #[test]
    fn test_subscribe_receives_snapshots() {
        let dir = tempdir().unwrap();
        let mut store = LocalWordStore::open(dir.path()).unwrap();
        let alice = store.subscribe("alice");
        let bob = store.subscribe("bob");

        assert!(alice.try_recv().unwrap().is_empty());
        assert!(bob.try_recv().unwrap().is_empty());

        store.add("alice", draft("ambition")).unwrap();
        assert_eq!(alice.try_recv().unwrap().len(), 1);
        assert!(bob.try_recv().is_err());

        // Dropped receivers are pruned without failing the write
        drop(alice);
        assert!(store.add("alice", draft("resilience")).is_ok());
    }

    #[test]
    fn test_seed_once_per_user() {
        let dir = tempdir().unwrap();
        let mut store = LocalWordStore::open(dir.path()).unwrap();

        assert_eq!(store.seed("alice").unwrap(), 5);
        assert_eq!(store.seed("alice").unwrap(), 0);
        assert_eq!(store.seed("bob").unwrap(), 5);

        let mut ids: Vec<_> = store
            .list_for_user("alice")
            .unwrap()
            .into_iter()
            .chain(store.list_for_user("bob").unwrap())
            .map(|w| w.id)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }
}

mod policy_tests {
    use super::*;

    #[test]
    fn test_todays_words() {
        let words = builtin_words("alice");
        let today: Vec<_> = todays_words(&words)
            .into_iter()
            .map(|w| w.english.as_str())
            .collect();
        // ambition is reviewed with 75; mindfulness has 80 but was never reviewed
        assert_eq!(
            today,
            vec!["serendipity", "resilience", "wanderlust", "mindfulness"]
        );
    }

    #[test]
    fn test_todays_words_limit() {
        let mut words = builtin_words("alice");
        words.extend(builtin_words("alice"));
        assert_eq!(todays_words(&words).len(), 5);
    }

    #[test]
    fn test_clamp_mastery() {
        assert_eq!(clamp_mastery(-5), 0);
        assert_eq!(clamp_mastery(42), 42);
        assert_eq!(clamp_mastery(101), 100);
    }

    #[test]
    fn test_filter() {
        let words = builtin_words("alice");
        let search = WordFilter {
            search: Some("幸運".to_string()),
            category: None,
        };
        assert_eq!(words.iter().filter(|w| search.matches(w)).count(), 1);

        let category = WordFilter {
            search: None,
            category: Some("旅行".to_string()),
        };
        let found: Vec<_> = words.iter().filter(|w| category.matches(w)).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].english, "wanderlust");
    }

    #[test]
    fn test_stats() {
        let stats = MasteryStats::from_words(&builtin_words("alice")).unwrap();
        assert_eq!(stats.total, 5);
        assert!((stats.average - 58.0).abs() < f64::EPSILON);
        assert_eq!(stats.mastered, 1);
        assert_eq!(stats.struggling, 2);
        assert!(MasteryStats::from_words(&[]).is_none());
    }
}

mod message_tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StorageError::new(StorageErrorCode::NotFound);
        assert_eq!(err.localized(Language::Ja), "指定された単語が見つかりません。");
        assert_eq!(err.localized(Language::En), "The word could not be found.");
        assert!(err.to_string().ends_with("(not-found)"));
    }

    #[test]
    fn test_draft_validation() {
        assert!(WordDraft::new(" ", "訳", None, Difficulty::Beginner, "c").is_err());
        let draft = WordDraft::new("word", "訳", Some("  "), Difficulty::Beginner, "c").unwrap();
        assert!(draft.pronunciation.is_none());
    }
}
