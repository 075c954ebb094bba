use crate::config::SearchConfig;
use crate::document::{Document, ProductId};
use crate::engine::SearchIndex;
use crate::error::{Error, Result};
use crate::index::TermId;
use crate::model::DenseMatrix;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub vocabulary_size: u32,
    pub feature_count: u32,
    pub created_at: String,
    pub version: u32,
}

/// The named structures needed to restore a [`SearchIndex`] without rebuilding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexParts {
    pub inverted_index: HashMap<String, Vec<ProductId>>,
    pub tfidf_matrix: DenseMatrix,
    pub word_idx: HashMap<String, TermId>,
    pub doc_idx: HashMap<ProductId, usize>,
    pub inv_doc_freq: HashMap<String, f32>,
    pub term_freq: HashMap<ProductId, HashMap<String, f32>>,
    pub documents: HashMap<ProductId, Document>,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn inverted_index(&self) -> PathBuf { self.root.join("inverted_index.bin") }
    fn tfidf_matrix(&self) -> PathBuf { self.root.join("tfidf_matrix.bin") }
    fn word_idx(&self) -> PathBuf { self.root.join("word_idx.bin") }
    fn doc_idx(&self) -> PathBuf { self.root.join("doc_idx.bin") }
    fn inv_doc_freq(&self) -> PathBuf { self.root.join("inv_doc_freq.bin") }
    fn term_freq(&self) -> PathBuf { self.root.join("term_freq.bin") }
    fn documents(&self) -> PathBuf { self.root.join("documents.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    /// Whether a complete index appears to be stored here.
    pub fn exists(&self) -> bool { self.meta().is_file() }
}

fn save_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut w, value)?;
    w.flush()?;
    Ok(())
}

fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let r = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(r)?)
}

pub fn save_parts(paths: &IndexPaths, parts: &IndexParts) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_bin(&paths.inverted_index(), &parts.inverted_index)?;
    save_bin(&paths.tfidf_matrix(), &parts.tfidf_matrix)?;
    save_bin(&paths.word_idx(), &parts.word_idx)?;
    save_bin(&paths.doc_idx(), &parts.doc_idx)?;
    save_bin(&paths.inv_doc_freq(), &parts.inv_doc_freq)?;
    save_bin(&paths.term_freq(), &parts.term_freq)?;
    save_bin(&paths.documents(), &parts.documents)?;
    Ok(())
}

pub fn load_parts(paths: &IndexPaths) -> Result<IndexParts> {
    Ok(IndexParts {
        inverted_index: load_bin(&paths.inverted_index())?,
        tfidf_matrix: load_bin(&paths.tfidf_matrix())?,
        word_idx: load_bin(&paths.word_idx())?,
        doc_idx: load_bin(&paths.doc_idx())?,
        inv_doc_freq: load_bin(&paths.inv_doc_freq())?,
        term_freq: load_bin(&paths.term_freq())?,
        documents: load_bin(&paths.documents())?,
    })
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut w = BufWriter::new(File::create(paths.meta())?);
    serde_json::to_writer_pretty(&mut w, meta)?;
    w.flush()?;
    Ok(())
}

/// `NotFound` when no index has been written under `paths.root`.
pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let file = File::open(paths.meta()).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::NotFound(format!("index metadata {}", paths.meta().display())),
        _ => Error::Io(e),
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Write every structure of `index` plus `meta.json` under `paths.root`.
pub fn save_index(paths: &IndexPaths, index: &SearchIndex, created_at: &str) -> Result<MetaFile> {
    save_parts(paths, &index.to_parts())?;
    let meta = MetaFile {
        num_docs: index.document_count() as u32,
        vocabulary_size: index.vocabulary_size() as u32,
        feature_count: index.feature_count() as u32,
        created_at: created_at.to_string(),
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "index saved");
    Ok(meta)
}

/// Load a snapshot written by [`save_index`].
pub fn load_index(paths: &IndexPaths, config: SearchConfig) -> Result<SearchIndex> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        tracing::warn!(found = meta.version, expected = FORMAT_VERSION, "index format version differs");
    }
    let index = SearchIndex::from_parts(load_parts(paths)?, config)?;
    tracing::info!(root = %paths.root.display(), num_docs = index.document_count(), created_at = %meta.created_at, "index loaded");
    Ok(index)
}
