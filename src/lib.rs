//! 보온재 경제적 두께 스윕 도구의 핵심 로직. CLI와 GUI가 같은 라이브러리를 쓴다.

pub mod app;
pub mod catalog;
pub mod config;
pub mod dialog;
pub mod export;
pub mod i18n;
pub mod params;
pub mod point;
pub mod solver;
pub mod sweep;
pub mod ui_cli;
