//! 이름 붙인 파라미터 묶음(카탈로그)을 eframe 저장소에 보관한다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::params::ParameterSet;

/// 저장소 키
pub const STORAGE_KEY: &str = "parameter_catalogs";
pub const MAX_ENTRIES: usize = 50;
pub const MAX_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("카탈로그는 최대 {}개까지 저장할 수 있습니다. 기존 항목을 삭제하세요.", MAX_ENTRIES)]
    LimitReached,
    #[error("카탈로그 전체 크기가 한도를 넘어 저장하지 못했습니다.")]
    TooLarge,
    #[error("카탈로그 \"{0}\"을(를) 찾을 수 없습니다.")]
    NotFound(String),
    #[error("저장된 카탈로그를 읽을 수 없습니다: {0}")]
    Corrupt(String),
}

/// 이름 → 파라미터 묶음.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, ParameterSet>,
}

impl Catalog {
    /// 저장된 카탈로그를 읽는다. 값이 없으면 빈 카탈로그.
    pub fn try_load(storage: &dyn eframe::Storage) -> Result<Self, CatalogError> {
        match storage.get_string(STORAGE_KEY) {
            Some(text) if !text.trim().is_empty() => {
                serde_json::from_str(&text).map_err(|e| CatalogError::Corrupt(e.to_string()))
            }
            _ => Ok(Self::default()),
        }
    }

    /// 손상된 데이터는 버리고 빈 카탈로그로 시작한다.
    pub fn load(storage: &dyn eframe::Storage) -> Self {
        Self::try_load(storage).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "카탈로그 초기화");
            Self::default()
        })
    }

    pub fn persist(&self, storage: &mut dyn eframe::Storage) -> Result<(), CatalogError> {
        let text = self.serialized()?;
        storage.set_string(STORAGE_KEY, text);
        storage.flush();
        tracing::debug!(entries = self.entries.len(), "카탈로그 저장");
        Ok(())
    }

    fn serialized(&self) -> Result<String, CatalogError> {
        serde_json::to_string(&self.entries).map_err(|e| CatalogError::Corrupt(e.to_string()))
    }

    /// 이름으로 저장한다. 같은 이름은 덮어쓴다.
    pub fn insert(&mut self, name: &str, params: ParameterSet) -> Result<(), CatalogError> {
        let name = name.trim();
        if !self.entries.contains_key(name) && self.entries.len() >= MAX_ENTRIES {
            return Err(CatalogError::LimitReached);
        }
        let mut candidate = self.entries.clone();
        candidate.insert(name.to_string(), params);
        let size = serde_json::to_string(&candidate)
            .map_err(|e| CatalogError::Corrupt(e.to_string()))?
            .len();
        if size > MAX_BYTES {
            return Err(CatalogError::TooLarge);
        }
        self.entries = candidate;
        tracing::info!(name, "카탈로그 항목 저장");
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<ParameterSet, CatalogError> {
        let removed = self
            .entries
            .remove(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        tracing::info!(name, "카탈로그 항목 삭제");
        Ok(removed)
    }

    pub fn get(&self, name: &str) -> Result<&ParameterSet, CatalogError> {
        self.entries
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 아직 쓰지 않은 기본 이름을 제안한다.
    pub fn suggest_name(&self) -> String {
        (self.entries.len() + 1..)
            .map(|n| format!("Parameters-{n:02}"))
            .find(|name| !self.entries.contains_key(name))
            .unwrap_or_else(|| "Parameters".to_string())
    }
}
