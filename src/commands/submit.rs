use anyhow::{Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::{
    classify::{Classifier, HuggingFaceClassifier},
    config::{ClassifierConfig, resolve_home},
    journal::{JournalEntry, JournalStore},
    runtime::Runtime,
};

/// Classify a journal entry and store it
#[tracing::instrument(skip(runtime, home, text))]
pub async fn submit<R: Runtime>(runtime: R, home: Option<PathBuf>, text: &str) -> Result<()> {
    let text = validate_text(text)?;
    let home = resolve_home(&runtime, home)?;
    let config = ClassifierConfig::from_runtime(&runtime)?;
    let classifier = HuggingFaceClassifier::new(&config)?;

    let entry = record_entry(&runtime, &classifier, &home, text).await?;
    println!("Emotion detected: {}", entry.classification());
    Ok(())
}

/// Opens the journal (enforcing its schema) before spending an inference
/// call, then stores the classified entry. The insert re-reads the journal,
/// so entries stored while classification was in flight are kept.
pub async fn record_entry<R, C>(
    runtime: &R,
    classifier: &C,
    home: &Path,
    text: &str,
) -> Result<JournalEntry>
where
    R: Runtime,
    C: Classifier + ?Sized,
{
    let mut store = JournalStore::open(runtime, home)?;
    debug!("Classifying entry of {} chars", text.chars().count());
    let result = classifier.classify(text).await;
    store.insert(text, &result)
}

/// Trims the entry and rejects it when nothing is left.
pub fn validate_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        bail!("Journal entry cannot be empty");
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassificationResult, MockClassifier};
    use crate::runtime::{MockRuntime, RealRuntime};
    use async_trait::async_trait;
    use mockall::predicate::eq;
    use std::time::Duration;
    use tempfile::tempdir;

    struct SlowClassifier(Duration);

    #[async_trait]
    impl Classifier for SlowClassifier {
        async fn classify(&self, _text: &str) -> ClassificationResult {
            tokio::time::sleep(self.0).await;
            ClassificationResult {
                label: "joy".into(),
                confidence: 80.0,
            }
        }
    }

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("  hello \n").unwrap(), "hello");
        let err = validate_text(" \t\n").unwrap_err();
        assert_eq!(err.to_string(), "Journal entry cannot be empty");
        assert!(validate_text("").is_err());
    }

    #[tokio::test]
    async fn test_record_entry_stores_classification() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify()
            .with(eq("Finally finished the project"))
            .times(1)
            .returning(|_| ClassificationResult {
                label: "joy".into(),
                confidence: 97.5,
            });

        let entry = record_entry(&runtime, &classifier, dir.path(), "Finally finished the project")
            .await
            .unwrap();

        assert_eq!(entry.id, 1);
        assert_eq!(entry.emotion, "joy");
        assert_eq!(entry.confidence, 97.5);

        let store = JournalStore::open(&runtime, dir.path()).unwrap();
        assert_eq!(store.recent(1), vec![entry]);
    }

    #[tokio::test]
    async fn test_record_entry_keeps_fallback_results() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify()
            .returning(|_| ClassificationResult::fallback());

        let entry = record_entry(&runtime, &classifier, dir.path(), "meh")
            .await
            .unwrap();

        assert_eq!(entry.emotion, "neutral");
        assert_eq!(entry.confidence, 50.0);
    }

    #[tokio::test]
    async fn test_overlapping_submits_both_persist() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let classifier = SlowClassifier(Duration::from_millis(200));

        let (first, second) = tokio::join!(
            record_entry(&runtime, &classifier, dir.path(), "Morning run"),
            record_entry(&runtime, &classifier, dir.path(), "Evening swim"),
        );

        let mut ids = vec![first.unwrap().id, second.unwrap().id];
        ids.sort();
        assert_eq!(ids, vec![1, 2]);

        let store = JournalStore::open(&runtime, dir.path()).unwrap();
        let mut texts: Vec<String> = store.recent(10).into_iter().map(|e| e.text).collect();
        texts.sort();
        assert_eq!(texts, vec!["Evening swim", "Morning run"]);
    }

    #[tokio::test]
    async fn test_record_entry_checks_schema_before_classifying() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Ok(r#"{"schema_version":42,"next_id":1,"entries":[]}"#.into()));

        let mut classifier = MockClassifier::new();
        classifier.expect_classify().never();

        let result = record_entry(
            &runtime,
            &classifier,
            Path::new("/home/user/.moodjournal"),
            "hello",
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_text_before_config() {
        let runtime = MockRuntime::new();
        let err = submit(runtime, None, "   ").await.unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[tokio::test]
    async fn test_submit_requires_token() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));

        let err = submit(runtime, Some(PathBuf::from("/tmp/unused")), "hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HUGGING_FACE_TOKEN"));
    }
}
