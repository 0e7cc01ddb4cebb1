//! Shared fixtures for integration tests
#![allow(dead_code)]

use cv_parser::{Archive, FileConfigStore, IdentifierEngine, LayeredStore, ScopeTemplateStore};
use std::path::PathBuf;
use std::sync::Arc;

pub type TestEngine =
    IdentifierEngine<Arc<Archive>, LayeredStore<FileConfigStore, ScopeTemplateStore<Arc<Archive>>>>;

pub const CMIP6_DATASET: &str = "CMIP6.FAFMIP.IPSL.IPSL-CM6A-LR.amip.r1i1p1f1.Amon.abs550aer.gm";

pub const CMIP5_FILENAME: &str = "tas_Amon_IPSL-CM5A-LR_1pctCO2_r1i1p1_185001-198912.nc";

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn archive() -> Arc<Archive> {
    Arc::new(Archive::from_dir(fixtures_dir().join("archive")).expect("fixture archive loads"))
}

/// File-store configurations first, scope templates as the fallback
pub fn engine() -> TestEngine {
    let archive = archive();
    let store = LayeredStore::new(
        FileConfigStore::new(fixtures_dir().join("parsers")),
        ScopeTemplateStore::new(Arc::clone(&archive)),
    );
    IdentifierEngine::new(archive, store)
}
