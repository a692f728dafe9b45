use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::course::{CourseInfoSource, CourseSnapshot};
use crate::error::WatchError;

/// Persisted registry shape: topic -> CRNs, both in file order
pub type TopicMap = IndexMap<String, Vec<String>>;

/// One watched (course, topic) pair
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEntry {
    /// Course being watched
    pub course: CourseSnapshot,
    /// Where to send the notification once it opens
    pub topic: String,
}

/// File-backed registry of watched courses.
///
/// The in-memory pair list is always derived from the file as a whole; it is
/// never patched in place.
pub struct CourseRegistry {
    path: PathBuf,
    term: String,
    source: Arc<dyn CourseInfoSource>,
    entries: Vec<WatchEntry>,
}

impl CourseRegistry {
    /// Load the registry at `path`, scoping every CRN to `term`.
    pub async fn load(
        path: impl Into<PathBuf>,
        term: impl Into<String>,
        source: Arc<dyn CourseInfoSource>,
    ) -> Result<Self, WatchError> {
        let mut registry = Self {
            path: path.into(),
            term: term.into(),
            source,
            entries: Vec::new(),
        };

        let topics = read_topics(&registry.path).await?;
        registry.rebuild(&topics);

        info!(
            "Loaded {} watched courses from {}",
            registry.entries.len(),
            registry.path.display()
        );
        Ok(registry)
    }

    /// Current (course, topic) pairs in poll order
    pub fn pairs(&self) -> &[WatchEntry] {
        &self.entries
    }

    /// Number of watched pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is left to watch
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Term code every entry is scoped to
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop watching `crn`.
    ///
    /// The file is re-read first so edits made since `load` are kept. Only the
    /// first topic listing `crn` loses it. Every topic with no CRNs is dropped
    /// from the rewritten file. The pair list is rebuilt from the re-read file
    /// either way, but the file is only rewritten when something was removed.
    pub async fn remove(&mut self, crn: &str) -> Result<bool, WatchError> {
        let mut topics = read_topics(&self.path).await?;
        let removed = remove_first(&mut topics, crn);

        self.rebuild(&topics);

        match removed {
            Some(topic) => {
                topics.retain(|_, crns| !crns.is_empty());
                write_topics(&self.path, &topics).await?;
                info!("Removed CRN {} from topic {}", crn, topic);
                Ok(true)
            }
            None => {
                debug!("CRN {} not present in {}", crn, self.path.display());
                Ok(false)
            }
        }
    }

    fn rebuild(&mut self, topics: &TopicMap) {
        let term = &self.term;
        let source = &self.source;

        let entries: Vec<WatchEntry> = topics
            .iter()
            .flat_map(|(topic, crns)| {
                crns.iter().map(move |crn| WatchEntry {
                    course: CourseSnapshot::new(crn.as_str(), term.as_str(), source.clone()),
                    topic: topic.clone(),
                })
            })
            .collect();

        self.entries = entries;
    }
}

/// Remove `crn` from the first topic that lists it, pruning the topic if it
/// ends up empty. Returns the topic it was removed from.
fn remove_first(topics: &mut TopicMap, crn: &str) -> Option<String> {
    let (index, position) = topics
        .values()
        .enumerate()
        .find_map(|(i, crns)| crns.iter().position(|c| c == crn).map(|p| (i, p)))?;

    let (topic, crns) = topics.get_index_mut(index)?;
    let topic = topic.clone();
    crns.remove(position);

    if crns.is_empty() {
        topics.shift_remove_index(index);
    }
    Some(topic)
}

async fn read_topics(path: &Path) -> Result<TopicMap, WatchError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| WatchError::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_str(&raw).map_err(|source| WatchError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_topics(path: &Path, topics: &TopicMap) -> Result<(), WatchError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    topics
        .serialize(&mut serializer)
        .map_err(|source| WatchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

    let storage_err = |source| WatchError::StorageUnavailable {
        path: path.to_path_buf(),
        source,
    };

    // Write beside the target and rename over it so readers never see a partial file
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &buf).await.map_err(storage_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(storage_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::RegistrationInfo;
    use crate::error::SourceError;
    use tempfile::TempDir;

    struct MockSource;

    #[async_trait::async_trait]
    impl CourseInfoSource for MockSource {
        async fn course_name(&self, crn: &str, _term: &str) -> Result<String, SourceError> {
            Ok(crn.to_string())
        }

        async fn registration_info(
            &self,
            _crn: &str,
            _term: &str,
        ) -> Result<RegistrationInfo, SourceError> {
            Ok(RegistrationInfo::default())
        }

        async fn prerequisites(&self, _crn: &str, _term: &str) -> Result<String, SourceError> {
            Ok(String::new())
        }
    }

    async fn registry_with(contents: &str) -> (TempDir, CourseRegistry) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("courses.json");
        std::fs::write(&path, contents).unwrap();
        let registry = CourseRegistry::load(&path, "202408", Arc::new(MockSource))
            .await
            .unwrap();
        (dir, registry)
    }

    fn flat(registry: &CourseRegistry) -> Vec<(String, String)> {
        registry
            .pairs()
            .iter()
            .map(|e| (e.course.crn().to_string(), e.topic.clone()))
            .collect()
    }

    fn on_disk(registry: &CourseRegistry) -> TopicMap {
        serde_json::from_str(&std::fs::read_to_string(registry.path()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn load_flattens_in_file_order() {
        let (_dir, registry) =
            registry_with(r#"{"zeta": ["3", "1"], "alpha": ["2"]}"#).await;

        assert_eq!(
            flat(&registry),
            vec![
                ("3".to_string(), "zeta".to_string()),
                ("1".to_string(), "zeta".to_string()),
                ("2".to_string(), "alpha".to_string()),
            ]
        );
        assert!(registry.pairs().iter().all(|e| e.course.term() == "202408"));
    }

    #[tokio::test]
    async fn load_rejects_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("courses.json");
        std::fs::write(&path, r#"{"topic": "12345"}"#).unwrap();

        let err = CourseRegistry::load(&path, "202408", Arc::new(MockSource))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WatchError::ConfigParse { .. }));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = CourseRegistry::load(dir.path().join("nope.json"), "202408", Arc::new(MockSource))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WatchError::StorageUnavailable { .. }));
    }

    #[tokio::test]
    async fn removing_unknown_crn_leaves_file_untouched() {
        let original = "{\"a\":[\"1\",\"2\"],   \"b\":[\"3\"]}\n";
        let (_dir, mut registry) = registry_with(original).await;

        assert!(!registry.remove("999").await.unwrap());
        assert_eq!(std::fs::read_to_string(registry.path()).unwrap(), original);
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn removal_is_idempotent() {
        let (_dir, mut registry) = registry_with(r#"{"a": ["1", "2"]}"#).await;

        assert!(registry.remove("1").await.unwrap());
        let after_first = std::fs::read_to_string(registry.path()).unwrap();

        assert!(!registry.remove("1").await.unwrap());
        assert_eq!(std::fs::read_to_string(registry.path()).unwrap(), after_first);
        assert_eq!(flat(&registry), vec![("2".to_string(), "a".to_string())]);
    }

    #[tokio::test]
    async fn removing_last_crn_prunes_topic() {
        let (_dir, mut registry) =
            registry_with(r#"{"a": ["1"], "b": ["2", "3"], "c": ["4"]}"#).await;

        for crn in ["1", "3", "2"] {
            registry.remove(crn).await.unwrap();
            assert!(on_disk(&registry).values().all(|crns| !crns.is_empty()));
        }

        let topics = on_disk(&registry);
        assert_eq!(topics.keys().collect::<Vec<_>>(), vec!["c"]);
        assert_eq!(flat(&registry), vec![("4".to_string(), "c".to_string())]);
    }

    #[tokio::test]
    async fn only_first_topic_loses_a_duplicated_crn() {
        let (_dir, mut registry) = registry_with(r#"{"a": ["7"], "b": ["7", "8"]}"#).await;

        assert!(registry.remove("7").await.unwrap());
        assert_eq!(
            flat(&registry),
            vec![
                ("7".to_string(), "b".to_string()),
                ("8".to_string(), "b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn remove_picks_up_external_edits() {
        let (_dir, mut registry) = registry_with(r#"{"a": ["1"]}"#).await;
        std::fs::write(registry.path(), r#"{"a": ["1"], "b": ["5"]}"#).unwrap();

        assert!(!registry.remove("42").await.unwrap());
        assert_eq!(flat(&registry).len(), 2);

        assert!(registry.remove("1").await.unwrap());
        assert_eq!(flat(&registry), vec![("5".to_string(), "b".to_string())]);
    }

    #[tokio::test]
    async fn rewrite_keeps_order_and_uses_four_space_indent() {
        let (_dir, mut registry) =
            registry_with(r#"{"z": ["1", "2", "3"], "m": ["4"], "a": ["5"]}"#).await;

        registry.remove("2").await.unwrap();

        let written = std::fs::read_to_string(registry.path()).unwrap();
        let expected = concat!(
            "{\n",
            "    \"z\": [\n",
            "        \"1\",\n",
            "        \"3\"\n",
            "    ],\n",
            "    \"m\": [\n",
            "        \"4\"\n",
            "    ],\n",
            "    \"a\": [\n",
            "        \"5\"\n",
            "    ]\n",
            "}"
        );
        assert_eq!(written, expected);
    }

    #[tokio::test]
    async fn rewrite_drops_topics_that_were_already_empty() {
        let (_dir, mut registry) = registry_with(r#"{"a": [], "b": ["1", "2"]}"#).await;

        assert!(registry.remove("1").await.unwrap());

        let topics = on_disk(&registry);
        assert_eq!(topics.keys().collect::<Vec<_>>(), vec!["b"]);
        assert!(topics.values().all(|crns| !crns.is_empty()));
    }

    #[tokio::test]
    async fn removing_last_crn_beside_empty_topic_leaves_empty_object() {
        let (_dir, mut registry) = registry_with(r#"{"a": [], "b": ["1"]}"#).await;

        registry.remove("1").await.unwrap();

        assert_eq!(std::fs::read_to_string(registry.path()).unwrap(), "{}");
        assert!(registry.is_empty());
    }
}
