// Interactive document scatter plot.
//
// One point per document at its reduced coordinate, coloured by topic, with
// the topic names written at the topic centroids. Hovering a point shows its
// document; clicking a legend entry hides or shows that topic.

use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;

use super::html::{escape, json_island, page};
use super::{check_alignment, hex, topic_centroids, topic_color, Viewport};
use crate::output::truncate_chars;
use crate::topics::{TopicModel, NOISE_TOPIC};

/// Hover text is cut to this many characters.
pub const HOVER_CHARS: usize = 120;

const WIDTH: f32 = 1200.0;
const HEIGHT: f32 = 750.0;
const MARGIN: f32 = 40.0;

#[derive(Serialize)]
struct PlotPoint<'a> {
    x: f32,
    y: f32,
    topic: i32,
    doc: String,
    name: &'a str,
}

#[derive(Serialize)]
struct LegendEntry<'a> {
    topic: i32,
    name: &'a str,
    count: usize,
    color: String,
}

#[derive(Serialize)]
struct PlotData<'a> {
    points: Vec<PlotPoint<'a>>,
    topics: Vec<LegendEntry<'a>>,
}

const SCRIPT: &str = r#"        const data = JSON.parse(document.getElementById('plot-data').textContent);
        const info = document.getElementById('info');
        document.querySelectorAll('circle.doc').forEach(function (c) {
            c.addEventListener('mouseenter', function () {
                const p = data.points[Number(c.dataset.i)];
                info.textContent = p.doc + '  [' + p.name + ']';
            });
            c.addEventListener('mouseleave', function () { info.textContent = ''; });
        });
        document.querySelectorAll('.legend li').forEach(function (item) {
            item.addEventListener('click', function () {
                const off = item.classList.toggle('off');
                document.querySelectorAll('[data-topic="' + item.dataset.topic + '"]').forEach(function (el) {
                    if (el !== item) { el.style.display = off ? 'none' : ''; }
                });
            });
        });"#;

/// Render the document scatter page.
pub fn render_document_scatter(
    model: &TopicModel,
    docs: &[String],
    coords: &[[f32; 2]],
) -> Result<String> {
    check_alignment(docs.len(), coords.len(), model.assignments.len())?;

    let viewport = Viewport::fit(coords, WIDTH, HEIGHT, MARGIN);

    let points: Vec<PlotPoint> = docs
        .iter()
        .zip(coords)
        .zip(&model.assignments)
        .map(|((doc, p), &topic)| PlotPoint {
            x: p[0],
            y: p[1],
            topic,
            doc: truncate_chars(doc, HOVER_CHARS),
            name: model.get_topic(topic).map(|t| t.name.as_str()).unwrap_or(""),
        })
        .collect();

    let legend: Vec<LegendEntry> = model
        .topics()
        .iter()
        .map(|t| LegendEntry {
            topic: t.id,
            name: &t.name,
            count: t.count,
            color: hex(topic_color(t.id)),
        })
        .collect();

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" width="{WIDTH}" height="{HEIGHT}">"#
    );

    // Noise first so topic points sit on top
    let order = (0..points.len())
        .filter(|&i| points[i].topic == NOISE_TOPIC)
        .chain((0..points.len()).filter(|&i| points[i].topic != NOISE_TOPIC));
    for i in order {
        let p = &points[i];
        let (x, y) = viewport.project([p.x, p.y]);
        let opacity = if p.topic == NOISE_TOPIC { 0.5 } else { 0.8 };
        write!(
            svg,
            r#"<circle class="doc" data-i="{i}" data-topic="{}" cx="{x:.2}" cy="{y:.2}" r="4" fill="{}" fill-opacity="{opacity}"><title>{}</title></circle>"#,
            p.topic,
            hex(topic_color(p.topic)),
            escape(&p.doc),
        )?;
    }

    for (topic, centroid) in topic_centroids(coords, &model.assignments) {
        let (x, y) = viewport.project(centroid);
        write!(
            svg,
            r##"<text class="annotation" data-topic="{topic}" x="{x:.2}" y="{y:.2}" text-anchor="middle" font-size="13" font-weight="bold" fill="#2a3f5f">{}</text>"##,
            escape(&model.label(topic)),
        )?;
    }
    svg.push_str("</svg>");

    let mut legend_html = String::from(r#"<ul class="legend">"#);
    for entry in &legend {
        write!(
            legend_html,
            r#"<li data-topic="{}"><span class="swatch" style="background:{}"></span>{} ({})</li>"#,
            entry.topic,
            entry.color,
            escape(entry.name),
            entry.count,
        )?;
    }
    legend_html.push_str("</ul>");

    let data = PlotData {
        points,
        topics: legend,
    };

    let body = format!(
        "    <div class=\"container\">\n{svg}\n{legend_html}\n    </div>\n    {}",
        json_island("plot-data", &data)?
    );

    Ok(page("Documents and Topics", &body, SCRIPT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::CountVectorizer;

    fn fixture() -> (TopicModel, Vec<String>, Vec<[f32; 2]>) {
        let docs: Vec<String> = vec![
            "rust compiler borrow checker",
            "rust compiler lifetimes",
            "bread flour <yeast>",
            "sourdough bread flour",
            "stray remark",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        let model = TopicModel::from_assignments(
            &docs,
            &[0, 0, 1, 1, -1],
            &CountVectorizer::english(),
        )
        .unwrap();
        let coords = vec![[0.0, 0.0], [0.5, 0.2], [5.0, 5.0], [5.2, 4.8], [2.0, 9.0]];
        (model, docs, coords)
    }

    #[test]
    fn test_scatter_has_one_point_per_document() {
        let (model, docs, coords) = fixture();
        let html = render_document_scatter(&model, &docs, &coords).unwrap();
        assert_eq!(html.matches("<circle class=\"doc\"").count(), docs.len());
        assert!(html.contains("plot-data"));
        assert!(html.contains(&model.get_topic(0).unwrap().name));
    }

    #[test]
    fn test_scatter_escapes_documents() {
        let (model, docs, coords) = fixture();
        let html = render_document_scatter(&model, &docs, &coords).unwrap();
        assert!(html.contains("&lt;yeast&gt;"));
        assert!(!html.contains("<yeast>"));
    }

    #[test]
    fn test_noise_drawn_first() {
        let (model, docs, coords) = fixture();
        let html = render_document_scatter(&model, &docs, &coords).unwrap();
        let first = html.find("<circle").unwrap();
        assert!(html[first..].starts_with(r#"<circle class="doc" data-i="4""#));
    }

    #[test]
    fn test_misaligned_coordinates_fail() {
        let (model, docs, coords) = fixture();
        assert!(render_document_scatter(&model, &docs, &coords[..3]).is_err());
    }
}
