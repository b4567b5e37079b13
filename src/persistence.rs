// File: src/persistence.rs
use crate::core::classifier::TreeEnsemble;
use crate::core::codec::{EncoderSet, LabelEncoder};
use crate::error::LoadError;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Every trained artifact the predictor needs, in one bundle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelArtifacts {
    pub encoders: EncoderSet,
    pub target: LabelEncoder,
    pub classifier: TreeEnsemble,
}

impl ModelArtifacts {
    /// Cross-checks the classifier against the target vocabulary.
    pub fn validate(&self) -> Result<(), LoadError> {
        self.classifier.validate().map_err(LoadError::InvalidArtifact)?;
        if let Some(code) = self.classifier.classes.iter().find(|&&c| c >= self.target.len()) {
            return Err(LoadError::InvalidArtifact(format!(
                "classifier emits label code {code} but the target vocabulary has {} labels",
                self.target.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Bincode,
}

impl ArtifactFormat {
    /// `.json` is JSON; everything else is bincode.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ArtifactFormat::Json,
            _ => ArtifactFormat::Bincode,
        }
    }
}

pub fn load_artifacts(path: &Path) -> Result<ModelArtifacts, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let reader = BufReader::new(file);

    let artifacts: ModelArtifacts = match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => serde_json::from_reader(reader)?,
        ArtifactFormat::Bincode => bincode::deserialize_from(reader)?,
    };
    artifacts.validate()?;

    info!(
        "Loaded model artifacts from {} ({} trees)",
        path.display(),
        artifacts.classifier.trees.len()
    );
    Ok(artifacts)
}

/// Writes through a temp file in the destination directory so readers
/// never observe a partial bundle.
pub fn save_artifacts(artifacts: &ModelArtifacts, path: &Path) -> Result<(), LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: path.display().to_string(),
        source,
    };

    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir).map_err(io_err)?;

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        match ArtifactFormat::from_path(path) {
            ArtifactFormat::Json => serde_json::to_writer_pretty(&mut writer, artifacts)?,
            ArtifactFormat::Bincode => bincode::serialize_into(&mut writer, artifacts)?,
        }
        writer.flush().map_err(io_err)?;
    }

    temp_file.persist(path).map_err(|source| LoadError::Persist {
        path: path.display().to_string(),
        source,
    })?;
    info!("Saved model artifacts to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::DecisionTree;

    fn encoder(classes: &[&str]) -> LabelEncoder {
        LabelEncoder::new(classes.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn artifacts() -> ModelArtifacts {
        ModelArtifacts {
            encoders: EncoderSet {
                restaurant_id: encoder(&["R1"]),
                menu_category: encoder(&["Desserts"]),
                menu_item: encoder(&["Cake"]),
                ingredients: encoder(&["Flour,Sugar,Egg"]),
            },
            target: encoder(&["High", "Low"]),
            classifier: TreeEnsemble {
                classes: vec![0, 1],
                trees: vec![DecisionTree {
                    children_left: vec![1, -1, -1],
                    children_right: vec![2, -1, -1],
                    feature: vec![4, -2, -2],
                    threshold: vec![10.0, -2.0, -2.0],
                    value: vec![vec![1.0, 1.0], vec![0.0, 1.0], vec![1.0, 0.0]],
                }],
            },
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ArtifactFormat::from_path(Path::new("m/a.json")), ArtifactFormat::Json);
        assert_eq!(ArtifactFormat::from_path(Path::new("m/a.JSON")), ArtifactFormat::Json);
        assert_eq!(ArtifactFormat::from_path(Path::new("m/a.bin")), ArtifactFormat::Bincode);
        assert_eq!(ArtifactFormat::from_path(Path::new("m/a")), ArtifactFormat::Bincode);
    }

    #[test]
    fn test_bincode_export_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("artifacts.bin");
        save_artifacts(&artifacts(), &path).unwrap();

        let loaded = load_artifacts(&path).unwrap();
        assert_eq!(loaded.target.classes(), ["High", "Low"]);
        assert_eq!(loaded.encoders.menu_item.encode("Cake"), Some(0));
        assert_eq!(loaded.classifier.trees[0].n_nodes(), 3);
    }

    #[test]
    fn test_label_code_outside_target_rejected() {
        let mut bad = artifacts();
        bad.classifier.classes = vec![0, 2];
        assert!(matches!(bad.validate(), Err(LoadError::InvalidArtifact(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_artifacts(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
