// Hierarchical topic dendrogram.
//
// Leaves sit on the left axis, labelled with topic names; each merge is drawn
// at its Ward distance along the horizontal axis. Hovering a merge node shows
// the merged topic's name and the topics beneath it.

use std::fmt::Write as _;

use anyhow::Result;

use super::html::{escape, json_island, page};
use super::{hex, topic_color};
use crate::topics::HierarchicalTopics;

const ROW_HEIGHT: f32 = 28.0;
const LABEL_WIDTH: f32 = 320.0;
const TREE_WIDTH: f32 = 640.0;
const MARGIN: f32 = 30.0;
const LINK_COLOR: &str = "#636efa";

const SCRIPT: &str = r#"        const tree = JSON.parse(document.getElementById('tree-data').textContent);
        const info = document.getElementById('info');
        document.querySelectorAll('circle.merge').forEach(function (c) {
            c.addEventListener('mouseenter', function () {
                const m = tree.merges[Number(c.dataset.i)];
                info.textContent = m.parent_name + '  (topics: ' + m.topics.join(', ') + ', distance ' + m.distance.toFixed(3) + ')';
            });
            c.addEventListener('mouseleave', function () { info.textContent = ''; });
        });"#;

/// Render the dendrogram page.
pub fn render_topic_dendrogram(hierarchy: &HierarchicalTopics) -> Result<String> {
    let n = hierarchy.n_leaves();
    if n < 2 || hierarchy.merges.len() != n - 1 {
        anyhow::bail!(
            "Malformed topic hierarchy: {} leaves, {} merges",
            n,
            hierarchy.merges.len()
        );
    }

    let max_distance = hierarchy
        .merges
        .iter()
        .map(|m| m.distance)
        .fold(0.0_f64, f64::max);
    let scale = if max_distance > 0.0 { max_distance } else { 1.0 };

    let width = LABEL_WIDTH + TREE_WIDTH + 2.0 * MARGIN;
    let height = n as f32 * ROW_HEIGHT + 2.0 * MARGIN + 20.0;
    let x_of = |distance: f64| MARGIN + LABEL_WIDTH + (distance / scale) as f32 * TREE_WIDTH;

    // Position of every cluster id
    let mut pos = vec![(0.0_f32, 0.0_f32); n + hierarchy.merges.len()];
    for (row, leaf) in hierarchy.leaf_order().into_iter().enumerate() {
        if leaf >= n {
            anyhow::bail!("Leaf order refers to unknown leaf {leaf}");
        }
        pos[leaf] = (x_of(0.0), MARGIN + (row as f32 + 0.5) * ROW_HEIGHT);
    }

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}">"#
    );

    for (i, m) in hierarchy.merges.iter().enumerate() {
        let (Some(&(xl, yl)), Some(&(xr, yr))) = (pos.get(m.child_left_id), pos.get(m.child_right_id))
        else {
            anyhow::bail!("Merge {} refers to an unknown child", m.parent_id);
        };
        let xp = x_of(m.distance);
        let yp = (yl + yr) / 2.0;
        match pos.get_mut(m.parent_id) {
            Some(slot) => *slot = (xp, yp),
            None => anyhow::bail!("Merge id {} is out of range", m.parent_id),
        }

        write!(
            svg,
            r#"<path d="M{xl:.2},{yl:.2} H{xp:.2} V{yr:.2} H{xr:.2}" fill="none" stroke="{LINK_COLOR}" stroke-width="1.5"/>"#
        )?;
        write!(
            svg,
            r#"<circle class="merge" data-i="{i}" cx="{xp:.2}" cy="{yp:.2}" r="4" fill="{LINK_COLOR}"><title>{} ({})</title></circle>"#,
            escape(&m.parent_name),
            m.topics
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        )?;
    }

    for leaf in 0..n {
        let (x, y) = pos[leaf];
        let color = hex(topic_color(hierarchy.leaves[leaf]));
        write!(
            svg,
            r#"<circle cx="{x:.2}" cy="{y:.2}" r="3" fill="{color}"/><text x="{:.2}" y="{:.2}" text-anchor="end" font-size="12">{}</text>"#,
            x - 8.0,
            y + 4.0,
            escape(&hierarchy.leaf_names[leaf]),
        )?;
    }

    // Distance axis
    let axis_y = MARGIN + n as f32 * ROW_HEIGHT + 6.0;
    write!(
        svg,
        r##"<line x1="{:.2}" y1="{axis_y:.2}" x2="{:.2}" y2="{axis_y:.2}" stroke="#888"/>"##,
        x_of(0.0),
        x_of(scale),
    )?;
    for tick in 0..=4 {
        let d = scale * tick as f64 / 4.0;
        write!(
            svg,
            r##"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="11" fill="#555">{d:.2}</text>"##,
            x_of(d),
            axis_y + 16.0,
        )?;
    }
    svg.push_str("</svg>");

    let body = format!(
        "    <div class=\"container\">\n{svg}\n    </div>\n    {}",
        json_island("tree-data", hierarchy)?
    );

    Ok(page("Hierarchical Clustering", &body, SCRIPT))
}
