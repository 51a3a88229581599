use crate::topic::{Topic, TopicImage};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const BUILTIN_TOPICS: &str = include_str!("../data/topics.json");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read topic catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse topics from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Topic id must not be empty")]
    EmptyId,
    #[error("Duplicate topic id: {0}")]
    DuplicateId(String),
}

/// A catalog file holds either a single topic or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum TopicFile {
    Many(Vec<Topic>),
    One(Box<Topic>),
}

impl TopicFile {
    fn into_topics(self) -> Vec<Topic> {
        match self {
            TopicFile::Many(topics) => topics,
            TopicFile::One(topic) => vec![*topic],
        }
    }
}

/// The immutable, ordered set of topics. Ids are unique and non-empty.
#[derive(Debug, Clone)]
pub struct Catalog {
    topics: Vec<Topic>,
}

impl Catalog {
    pub fn new(topics: Vec<Topic>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for topic in &topics {
            if topic.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if !seen.insert(topic.id.as_str()) {
                return Err(CatalogError::DuplicateId(topic.id.clone()));
            }
        }
        Ok(Self { topics })
    }

    /// The topics compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_TOPICS, "built-in catalog")
    }

    pub fn from_json(json: &str, origin: &str) -> Result<Self, CatalogError> {
        let file: TopicFile = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        Self::new(file.into_topics())
    }

    /// Loads every `*.json` file of `dir_path`, in file-name order.
    pub fn load_dir(dir_path: &Path) -> Result<Self, CatalogError> {
        let io_error = |source| CatalogError::Io {
            path: dir_path.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir_path).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut topics = Vec::new();
        for path in paths {
            let content = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            let file: TopicFile =
                serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                    origin: path.display().to_string(),
                    source,
                })?;
            topics.extend(file.into_topics());
        }

        tracing::debug!("Loaded {} topics from {}", topics.len(), dir_path.display());
        Self::new(topics)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|topic| topic.id == id)
    }

    pub fn find_relevant_image(&self, topic_id: &str, text: &str) -> Option<&TopicImage> {
        self.get_by_id(topic_id)?.find_relevant_image(text)
    }

    pub fn relevant_image_index(&self, topic_id: &str, text: &str) -> Option<usize> {
        self.get_by_id(topic_id)?.relevant_image_index(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn topic_json(id: &str) -> String {
        format!(
            r#"{{
                "id": "{id}",
                "title": "Title {id}",
                "summary": "Summary",
                "backgroundImage": "bg.jpg",
                "documentId": "doc-{id}",
                "persona": {{"name": "Guide", "traits": [], "voiceId": "v"}},
                "dynamicFirstMessage": "Hi",
                "dynamicSystemPrompt": "Prompt",
                "images": [{{"src": "{id}.jpg", "context": "c", "keywords": ["{id}"]}}]
            }}"#
        )
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        let ids: Vec<&str> = catalog.topics().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["apollo-11", "great-barrier-reef", "ancient-rome"]);
        assert!(catalog.topics().iter().all(|t| !t.images.is_empty()));
    }

    #[test]
    fn test_get_by_id_round_trips_every_topic() {
        let catalog = Catalog::builtin().unwrap();
        for topic in catalog.topics() {
            assert_eq!(catalog.get_by_id(&topic.id), Some(topic));
        }
    }

    #[test]
    fn test_unknown_ids_are_absent() {
        let catalog = Catalog::builtin().unwrap();
        for id in ["unknown-topic", "", "APOLLO-11", "apollo-11 "] {
            assert!(catalog.get_by_id(id).is_none(), "{id:?} should be absent");
            assert!(catalog.find_relevant_image(id, "rocket").is_none());
        }
    }

    #[test]
    fn test_builtin_relevant_images() {
        let catalog = Catalog::builtin().unwrap();

        let launch = catalog
            .find_relevant_image("apollo-11", "Tell me about the Saturn V launch")
            .unwrap();
        assert!(launch.keywords.contains(&"saturn v".to_string()));
        assert_eq!(
            catalog.relevant_image_index("apollo-11", "Tell me about the Saturn V launch"),
            Some(1)
        );

        // "rocket" belongs to the second image, "astronaut" to the first.
        assert_eq!(
            catalog.relevant_image_index("apollo-11", "the rocket carried an astronaut"),
            Some(0)
        );

        assert!(
            catalog
                .find_relevant_image("ancient-rome", "what did they eat for breakfast")
                .is_none()
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = format!("[{}, {}]", topic_json("a"), topic_json("a"));
        match Catalog::from_json(&json, "test") {
            Err(CatalogError::DuplicateId(id)) => assert_eq!(id, "a"),
            other => panic!("expected duplicate id error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_id_rejected() {
        let json = topic_json(" ");
        assert!(matches!(
            Catalog::from_json(&json, "test"),
            Err(CatalogError::EmptyId)
        ));
    }

    #[test]
    fn test_load_dir_reads_json_files_in_name_order() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let dir_path = dir.path();

        let mut second = File::create(dir_path.join("b.json"))?;
        write!(second, "[{}, {}]", topic_json("beta"), topic_json("gamma"))?;

        let mut first = File::create(dir_path.join("a.json"))?;
        write!(first, "{}", topic_json("alpha"))?;

        let mut ignored = File::create(dir_path.join("notes.md"))?;
        writeln!(ignored, "not a topic")?;
        std::fs::create_dir(dir_path.join("subdir.json"))?;

        let catalog = Catalog::load_dir(dir_path)?;
        let ids: Vec<&str> = catalog.topics().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
        Ok(())
    }

    #[test]
    fn test_load_dir_rejects_duplicates_across_files() -> anyhow::Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("one.json"))?.write_all(topic_json("x").as_bytes())?;
        File::create(dir.path().join("two.json"))?.write_all(topic_json("x").as_bytes())?;

        assert!(matches!(
            Catalog::load_dir(dir.path()),
            Err(CatalogError::DuplicateId(_))
        ));
        Ok(())
    }

    #[test]
    fn test_load_dir_reports_bad_json() -> anyhow::Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("bad.json"))?.write_all(b"{ not json")?;

        let err = Catalog::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
        Ok(())
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let result = Catalog::load_dir(Path::new("nonexistent_dir_for_testing_topics"));
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
