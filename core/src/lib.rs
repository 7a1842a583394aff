//! Core library for the frond plant-care tracker: catalog parsing and
//! grouping, humidity inference, watering-schedule logic, the hosted
//! store seam, and care-guide rendering.

pub mod catalog;
pub mod guide;
pub mod humidity;
pub mod models;
pub mod schedule;
pub mod service;
pub mod settings;
