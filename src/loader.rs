//! Document loader: turns files into [`Document`]s.
//!
//! Either loads an explicit list of paths or scans the configured folder
//! for allowed extensions. A file that cannot be loaded is logged and
//! skipped; it never aborts the batch.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::extract::{extract_text, FileKind};
use crate::models::Document;

pub struct DocumentLoader<'a> {
    config: &'a LoaderConfig,
}

impl<'a> DocumentLoader<'a> {
    pub fn new(config: &'a LoaderConfig) -> Self {
        Self { config }
    }

    /// Load `paths`, or every allowed file in the configured folder when `None`.
    pub fn load_documents(&self, paths: Option<&[PathBuf]>) -> Vec<Document> {
        let paths = match paths {
            Some(p) => p.to_vec(),
            None => self.scan_folder(),
        };

        let mut documents = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.load_document(path) {
                Ok(doc) if doc.content.is_empty() => {
                    tracing::warn!(path = %path.display(), "no text extracted, skipping");
                }
                Ok(doc) => documents.push(doc),
                Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to load document"),
            }
        }

        tracing::info!(
            loaded = documents.len(),
            candidates = paths.len(),
            "documents loaded"
        );
        documents
    }

    /// Load a single file.
    pub fn load_document(&self, path: &Path) -> Result<Document, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let ext = extension_of(path);
        let kind = FileKind::from_extension(&ext)
            .filter(|_| self.is_allowed(&ext))
            .ok_or_else(|| LoadError::UnsupportedType(format!(".{}", ext)))?;

        let bytes = std::fs::read(path).map_err(|e| LoadError::ReadFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let content = extract_text(&bytes, kind).map_err(|e| LoadError::ReadFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(Document {
            file_path: path.to_string_lossy().to_string(),
            content,
            file_type: format!(".{}", ext),
        })
    }

    /// Allowed files directly under the folder (or below it when recursive), sorted.
    pub fn scan_folder(&self) -> Vec<PathBuf> {
        let root = &self.config.folder;
        if !root.is_dir() {
            tracing::warn!(folder = %root.display(), "document folder does not exist");
            return Vec::new();
        }

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.is_allowed(&extension_of(p)))
            .collect();

        files.sort();
        files
    }

    fn is_allowed(&self, ext: &str) -> bool {
        self.config
            .extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> LoaderConfig {
        LoaderConfig {
            folder: dir.to_path_buf(),
            ..LoaderConfig::default()
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let cfg = config_for(tmp.path());
        let loader = DocumentLoader::new(&cfg);
        let err = loader.load_document(&tmp.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.md");
        fs::write(&path, "# heading").unwrap();
        let cfg = config_for(tmp.path());
        let err = DocumentLoader::new(&cfg).load_document(&path).unwrap_err();
        match err {
            LoadError::UnsupportedType(ext) => assert_eq!(ext, ".md"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extension_outside_allow_list_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("table.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();
        let cfg = LoaderConfig {
            folder: tmp.path().to_path_buf(),
            extensions: vec!["txt".to_string()],
            recursive: false,
        };
        let err = DocumentLoader::new(&cfg).load_document(&path).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedType(_)));
    }

    #[test]
    fn loads_text_with_type_tag() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Course.TXT");
        fs::write(&path, "  Python 기초 과정: 8주\n").unwrap();
        let cfg = config_for(tmp.path());
        let doc = DocumentLoader::new(&cfg).load_document(&path).unwrap();
        assert_eq!(doc.content, "Python 기초 과정: 8주");
        assert_eq!(doc.file_type, ".txt");
        assert!(doc.file_path.ends_with("Course.TXT"));
    }

    #[test]
    fn scan_filters_extensions_and_sorts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.txt"), "b").unwrap();
        fs::write(tmp.path().join("a.csv"), "x,y").unwrap();
        fs::write(tmp.path().join("c.md"), "c").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/d.txt"), "d").unwrap();

        let cfg = config_for(tmp.path());
        let files = DocumentLoader::new(&cfg).scan_folder();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.txt"]);

        let recursive = LoaderConfig {
            recursive: true,
            ..config_for(tmp.path())
        };
        assert_eq!(DocumentLoader::new(&recursive).scan_folder().len(), 3);
    }

    #[test]
    fn batch_skips_failures_and_empty_files() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.txt");
        let empty = tmp.path().join("empty.txt");
        let broken = tmp.path().join("broken.pdf");
        fs::write(&good, "수강료는 50만원입니다.").unwrap();
        fs::write(&empty, "   ").unwrap();
        fs::write(&broken, "not a pdf").unwrap();

        let cfg = config_for(tmp.path());
        let paths = vec![
            good.clone(),
            empty,
            broken,
            tmp.path().join("missing.txt"),
        ];
        let docs = DocumentLoader::new(&cfg).load_documents(Some(&paths));
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].file_path, good.to_string_lossy());
    }

    #[test]
    fn missing_folder_scans_nothing() {
        let cfg = config_for(Path::new("/definitely/not/a/folder"));
        assert!(DocumentLoader::new(&cfg).load_documents(None).is_empty());
    }
}
