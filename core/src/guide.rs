use std::fmt::Write as _;

use crate::catalog::group_by_category;
use crate::humidity::infer_humidity;
use crate::models::Plant;

/// Emoji-decorated heading text for a category section.
#[must_use]
pub fn category_heading(category: &str) -> String {
    match category {
        "Tropical & Foliage" => "🌺 Tropical & Foliage Plants".to_string(),
        "Succulents & Cacti" => "🌵 Succulents & Cacti".to_string(),
        "Uncategorized" => "🪴 Uncategorized".to_string(),
        other => format!("🌿 {other}"),
    }
}

/// Render the catalog as a markdown care guide: one numbered subsection
/// per plant, grouped by category in catalog order, with a closing
/// summary of per-category counts.
#[must_use]
pub fn render_markdown(plants: &[Plant]) -> String {
    let groups = group_by_category(plants);
    let mut out = String::new();

    out.push_str("# Plant Care Guide\n\n");
    out.push_str("Light, water, and humidity notes for every plant in the collection.\n\n");

    let mut index = 1;
    for (category, members) in &groups {
        let _ = writeln!(out, "## {}\n", category_heading(category));
        for plant in members {
            let humidity = infer_humidity(&plant.notes, &plant.category);
            let _ = writeln!(out, "### {index}. {}", plant.name);
            if !plant.image.is_empty() {
                let _ = writeln!(out, "- **Image File:** `{}`", plant.image);
            }
            let _ = writeln!(out, "- **Light:** {}", plant.light);
            let _ = writeln!(out, "- **Water:** {}", plant.water);
            let _ = writeln!(out, "- **Humidity:** {}", humidity.display_label());
            if !plant.notes.is_empty() {
                let _ = writeln!(out, "- **Notes:** {}", plant.notes);
            }
            out.push('\n');
            index += 1;
        }
    }

    out.push_str("## Summary\n\n");
    let _ = writeln!(
        out,
        "This collection contains **{} plants** across {} categories:",
        plants.len(),
        groups.len()
    );
    for (category, members) in &groups {
        let _ = writeln!(out, "- **{category}:** {} plants", members.len());
    }
    out
}

/// Render the catalog as a standalone HTML care guide with the same
/// content as the markdown variant.
#[must_use]
pub fn render_html(plants: &[Plant]) -> String {
    let groups = group_by_category(plants);
    let mut out = String::new();

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("    <meta charset=\"UTF-8\">\n");
    out.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    out.push_str("    <title>🌱 Plant Care Guide 🌱</title>\n");
    out.push_str("    <style>\n");
    out.push_str("        body {font-family: Arial, sans-serif; background: #f0f4f8; margin: 0; padding: 20px;}\n");
    out.push_str("        .container {max-width: 1200px; margin: auto;}\n");
    out.push_str("        .category-section {margin-bottom: 40px;}\n");
    out.push_str("        .plants-grid {display: grid; grid-template-columns: repeat(auto-fit, minmax(250px,1fr)); gap: 20px;}\n");
    out.push_str("        .plant-card {background: #fff; border-radius: 8px; padding: 15px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);}\n");
    out.push_str("        .plant-card h3 {margin: 10px 0;}\n");
    out.push_str("        .care-tips {list-style: none; padding: 0;}\n");
    out.push_str("        .care-tips li {margin-bottom: 5px;}\n");
    out.push_str("    </style>\n</head>\n<body>\n");
    out.push_str("    <div class=\"container\">\n");
    out.push_str("        <h1>🌱 Plant Care Guide 🌱</h1>\n");

    for (category, members) in &groups {
        out.push_str("        <div class=\"category-section\">\n");
        let _ = writeln!(out, "            <h2>{}</h2>", escape_html(&category_heading(category)));
        out.push_str("            <div class=\"plants-grid\">\n");
        for plant in members {
            let humidity = infer_humidity(&plant.notes, &plant.category);
            out.push_str("                <div class=\"plant-card\">\n");
            let _ = writeln!(out, "                    <h3>{}</h3>", escape_html(&plant.name));
            out.push_str("                    <ul class=\"care-tips\">\n");
            let _ = writeln!(
                out,
                "                        <li><strong>Light:</strong> {}</li>",
                escape_html(&plant.light)
            );
            let _ = writeln!(
                out,
                "                        <li><strong>Water:</strong> {}</li>",
                escape_html(&plant.water)
            );
            let _ = writeln!(
                out,
                "                        <li><strong>Humidity:</strong> {}</li>",
                humidity.display_label()
            );
            if !plant.notes.is_empty() {
                let _ = writeln!(
                    out,
                    "                        <li><strong>Notes:</strong> {}</li>",
                    escape_html(&plant.notes)
                );
            }
            out.push_str("                    </ul>\n");
            out.push_str("                </div>\n");
        }
        out.push_str("            </div>\n");
        out.push_str("        </div>\n");
    }

    out.push_str("    </div>\n</body>\n</html>\n");
    out
}

/// Minimal HTML text escaping for untrusted catalog fields.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plants() -> Vec<Plant> {
        vec![
            Plant {
                name: "Monstera Deliciosa".to_string(),
                category: "Tropical & Foliage".to_string(),
                light: "Bright indirect".to_string(),
                water: "Weekly".to_string(),
                notes: "Loves high humidity".to_string(),
                image: "monstera.jpg".to_string(),
            },
            Plant {
                name: "Aloe Vera".to_string(),
                category: "Succulents & Cacti".to_string(),
                light: "Bright direct".to_string(),
                water: "Every 3 weeks".to_string(),
                notes: String::new(),
                image: String::new(),
            },
            Plant {
                name: "Pothos".to_string(),
                category: "Tropical & Foliage".to_string(),
                light: "Any".to_string(),
                water: "When dry".to_string(),
                notes: String::new(),
                image: String::new(),
            },
        ]
    }

    #[test]
    fn test_markdown_sections_in_catalog_order() {
        let md = render_markdown(&sample_plants());
        let tropical = md.find("## 🌺 Tropical & Foliage Plants").unwrap();
        let succulents = md.find("## 🌵 Succulents & Cacti").unwrap();
        assert!(tropical < succulents);
    }

    #[test]
    fn test_markdown_numbers_plants_sequentially() {
        let md = render_markdown(&sample_plants());
        // Grouping reorders: both tropical plants precede the succulent.
        assert!(md.contains("### 1. Monstera Deliciosa"));
        assert!(md.contains("### 2. Pothos"));
        assert!(md.contains("### 3. Aloe Vera"));
    }

    #[test]
    fn test_markdown_summary_counts() {
        let md = render_markdown(&sample_plants());
        assert!(md.contains("**3 plants** across 2 categories"));
        assert!(md.contains("- **Tropical & Foliage:** 2 plants"));
        assert!(md.contains("- **Succulents & Cacti:** 1 plants"));
    }

    #[test]
    fn test_markdown_humidity_line() {
        let md = render_markdown(&sample_plants());
        assert!(md.contains("- **Humidity:** High (60–80%)"));
        assert!(md.contains("- **Humidity:** Low (30–40%)"));
    }

    #[test]
    fn test_markdown_skips_empty_optional_lines() {
        let md = render_markdown(&sample_plants());
        // Aloe has no image and no notes; its section carries neither line.
        let aloe = &md[md.find("### 3. Aloe Vera").unwrap()..md.find("## Summary").unwrap()];
        assert!(!aloe.contains("Image File"));
        assert!(!aloe.contains("**Notes:**"));
    }

    #[test]
    fn test_unknown_category_heading() {
        assert_eq!(category_heading("Ferns"), "🌿 Ferns");
        assert_eq!(category_heading("Uncategorized"), "🪴 Uncategorized");
    }

    #[test]
    fn test_html_is_escaped() {
        let mut plants = sample_plants();
        plants[0].name = "Mother-in-law's <Tongue> & Co".to_string();
        let html = render_html(&plants);
        assert!(html.contains("Mother-in-law&#39;s &lt;Tongue&gt; &amp; Co"));
        assert!(!html.contains("<Tongue>"));
    }

    #[test]
    fn test_html_structure() {
        let html = render_html(&sample_plants());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>🌱 Plant Care Guide 🌱</h1>"));
        assert!(html.contains("<h3>Aloe Vera</h3>"));
        assert!(html.contains("<li><strong>Water:</strong> Every 3 weeks</li>"));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
