use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::models::Plant;

/// Category assigned to rows with a blank category field.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Relative directory plant images are served from.
pub const IMAGE_DIR: &str = "plants";

/// Parse a plant-care CSV from any reader.
///
/// Expected header:
/// `Plant Name,Image File,Category,Light,Water,Notes`
///
/// Only `Plant Name` is required; rows with a blank name are skipped and
/// missing columns parse as empty fields.
pub fn parse_catalog<R: Read>(reader: R) -> Result<Vec<Plant>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    // Build column index map (case-insensitive)
    let col =
        |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

    let Some(idx_name) = col("Plant Name") else {
        bail!("Missing required column: Plant Name");
    };
    let idx_image = col("Image File");
    let idx_category = col("Category");
    let idx_light = col("Light");
    let idx_water = col("Water");
    let idx_notes = col("Notes");

    let mut plants = Vec::new();

    for (line_num, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV row {}", line_num + 2))?;

        let field = |idx: Option<usize>| -> String {
            idx.and_then(|i| record.get(i)).unwrap_or("").trim().to_string()
        };

        let name = record.get(idx_name).unwrap_or("").trim().to_string();
        if name.is_empty() {
            continue; // skip blank rows
        }

        let mut category = field(idx_category);
        if category.is_empty() {
            category = DEFAULT_CATEGORY.to_string();
        }

        plants.push(Plant {
            name,
            category,
            light: field(idx_light),
            water: field(idx_water),
            notes: field(idx_notes),
            image: field(idx_image),
        });
    }

    Ok(plants)
}

/// Load and parse the catalog CSV at `path`.
pub fn load_catalog(path: &Path) -> Result<Vec<Plant>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open catalog file: {}", path.display()))?;
    parse_catalog(file)
}

/// Fail-open variant of [`load_catalog`]: any open or parse failure yields
/// an empty catalog with a stderr notice, so the page degrades to an empty
/// display instead of refusing to start.
#[must_use]
pub fn load_catalog_or_empty(path: &Path) -> Vec<Plant> {
    match load_catalog(path) {
        Ok(plants) => plants,
        Err(e) => {
            eprintln!("Warning: {e:#}; continuing with an empty catalog");
            Vec::new()
        }
    }
}

/// Look up a plant by name, case-insensitively.
#[must_use]
pub fn find_plant<'a>(plants: &'a [Plant], name: &str) -> Option<&'a Plant> {
    let wanted = name.trim().to_lowercase();
    plants.iter().find(|p| p.name.to_lowercase() == wanted)
}

/// Group plants by category, preserving first-occurrence category order
/// and source row order within each category.
#[must_use]
pub fn group_by_category(plants: &[Plant]) -> Vec<(String, Vec<Plant>)> {
    let mut groups: Vec<(String, Vec<Plant>)> = Vec::new();
    for plant in plants {
        match groups.iter_mut().find(|(category, _)| *category == plant.category) {
            Some((_, members)) => members.push(plant.clone()),
            None => groups.push((plant.category.clone(), vec![plant.clone()])),
        }
    }
    groups
}

/// Slug a plant name into an image-friendly token: parenthesized segments
/// dropped, everything non-alphanumeric collapsed to single underscores.
#[must_use]
pub fn slug_underscore(name: &str) -> String {
    let stripped = strip_parentheticals(name).to_lowercase();
    let mut slug = String::with_capacity(stripped.len());
    for ch in stripped.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Remove `(...)` segments. An unmatched `(` is kept as ordinary text.
fn strip_parentheticals(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('(') {
        out.push_str(&rest[..open]);
        match rest[open..].find(')') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Ensure a `.jpg` extension, normalizing `.jpeg` to `.jpg`. Empty input
/// stays empty.
#[must_use]
pub fn ensure_jpg_extension(file_name: &str) -> String {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if has_suffix_ignore_case(trimmed, ".jpeg") {
        return format!("{}.jpg", &trimmed[..trimmed.len() - 5]);
    }
    if has_suffix_ignore_case(trimmed, ".jpg") {
        return trimmed.to_string();
    }
    format!("{trimmed}.jpg")
}

fn has_suffix_ignore_case(s: &str, suffix: &str) -> bool {
    s.len() >= suffix.len()
        && s.is_char_boundary(s.len() - suffix.len())
        && s[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Final path segment, tolerating both `/` and `\` separators.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Ordered image paths to try for a plant: the CSV-provided file first
/// (basename only, `.jpg` ensured), then a slug of the plant name.
/// Duplicates are dropped, order preserved.
#[must_use]
pub fn image_candidates(plant: &Plant) -> Vec<String> {
    let mut candidates = Vec::new();
    let primary = ensure_jpg_extension(basename(&plant.image));
    if !primary.is_empty() {
        candidates.push(format!("{IMAGE_DIR}/{primary}"));
    }
    let slug = slug_underscore(&plant.name);
    if !slug.is_empty() {
        let fallback = format!("{IMAGE_DIR}/{slug}.jpg");
        if !candidates.contains(&fallback) {
            candidates.push(fallback);
        }
    }
    candidates
}
