//! Timetable grid service.
//!
//! Fetches a school timetable from a third-party API whose response shape
//! varies across deployments, caches it briefly, and turns its flat schedule
//! into per-class and per-teacher day × period grids.

pub mod cache;
pub mod config;
pub mod domain;
pub mod upstream;
pub mod web;
