//! 파라미터 카탈로그 저장소 회귀 테스트(메모리 저장소 사용).
use std::collections::HashMap;

use insulation_thickness_toolbox::catalog::{Catalog, CatalogError, STORAGE_KEY};
use insulation_thickness_toolbox::params::{Environment, ParameterSet};
use insulation_thickness_toolbox::sweep::GeometryKind;

#[derive(Default)]
struct MemoryStorage {
    values: HashMap<String, String>,
    flushes: usize,
}

impl eframe::Storage for MemoryStorage {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_string(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

#[test]
fn persisted_catalog_loads_back() {
    let mut storage = MemoryStorage::default();
    let mut catalog = Catalog::default();
    let params = ParameterSet {
        conductivity: 0.038,
        convection: Some(12.0),
        geometry: Some(GeometryKind::Sphere),
        environment: Some(Environment::Interior),
        ..ParameterSet::default()
    };
    catalog.insert("Tank", params.clone()).expect("insert");
    catalog
        .insert("Line 2", ParameterSet::default())
        .expect("insert");
    catalog.persist(&mut storage).expect("persist");
    assert_eq!(storage.flushes, 1);

    let stored = storage.values.get(STORAGE_KEY).expect("stored text");
    let raw: serde_json::Value = serde_json::from_str(stored).expect("json");
    assert_eq!(raw["Tank"]["k"], serde_json::json!(0.038));
    assert_eq!(raw["Tank"]["tipo_calculo"], serde_json::json!("optimo_economico_esfera"));

    let loaded = Catalog::load(&storage);
    assert_eq!(loaded, catalog);
    assert_eq!(loaded.get("Tank").expect("tank"), &params);
    assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["Line 2", "Tank"]);
}

#[test]
fn corrupt_storage_starts_empty() {
    let mut storage = MemoryStorage::default();
    storage
        .values
        .insert(STORAGE_KEY.to_string(), "{not json".to_string());
    assert!(matches!(
        Catalog::try_load(&storage),
        Err(CatalogError::Corrupt(_))
    ));
    assert!(Catalog::load(&storage).is_empty());
}

#[test]
fn remove_and_missing_names() {
    let mut catalog = Catalog::default();
    catalog.insert("a", ParameterSet::default()).expect("insert");
    assert!(catalog.remove("a").is_ok());
    assert_eq!(
        catalog.remove("a"),
        Err(CatalogError::NotFound("a".into()))
    );
    assert_eq!(
        catalog.get("zzz").map(|_| ()),
        Err(CatalogError::NotFound("zzz".into()))
    );
}

#[test]
fn suggested_name_is_unused() {
    let mut catalog = Catalog::default();
    assert_eq!(catalog.suggest_name(), "Parameters-01");
    catalog
        .insert("Parameters-02", ParameterSet::default())
        .expect("insert");
    let name = catalog.suggest_name();
    assert!(catalog.get(&name).is_err());
}
