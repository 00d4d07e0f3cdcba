// Visualization rendering — the three artifacts built from a fitted model.
//
// Renderers take the model plus the coordinates computed once by the reducer.
// They never refit or recompute coordinates, and they return an error rather
// than panic when their inputs disagree in length.

pub mod datamap;
pub mod dendrogram;
pub mod html;
pub mod scatter;

use std::collections::BTreeMap;
use std::fmt;

use crate::topics::NOISE_TOPIC;

/// The three visualization outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    DocumentScatter,
    TopicDendrogram,
    Datamap,
}

impl Artifact {
    pub const ALL: [Artifact; 3] = [
        Artifact::DocumentScatter,
        Artifact::TopicDendrogram,
        Artifact::Datamap,
    ];

    /// What the console calls this artifact while building it.
    pub fn label(self) -> &'static str {
        match self {
            Artifact::DocumentScatter => "document visualization",
            Artifact::TopicDendrogram => "hierarchical clustering",
            Artifact::Datamap => "document datamap",
        }
    }

    /// Short description for the "view these files" hint.
    pub fn description(self) -> &'static str {
        match self {
            Artifact::DocumentScatter => "interactive document scatter plot",
            Artifact::TopicDendrogram => "hierarchical clustering dendrogram",
            Artifact::Datamap => "topic datamap",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Colour of documents without a topic.
pub const NOISE_COLOR: [u8; 3] = [207, 207, 207];

// D3 category20, darker members first
const PALETTE: [[u8; 3]; 20] = [
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
    [174, 199, 232],
    [255, 187, 120],
    [152, 223, 138],
    [255, 152, 150],
    [197, 176, 213],
    [196, 156, 148],
    [247, 182, 210],
    [199, 199, 199],
    [219, 219, 141],
    [158, 218, 229],
];

/// Palette colour of a topic; noise is always light grey.
pub fn topic_color(topic: i32) -> [u8; 3] {
    if topic == NOISE_TOPIC || topic < 0 {
        return NOISE_COLOR;
    }
    PALETTE[topic as usize % PALETTE.len()]
}

/// `#rrggbb` form of a colour.
pub fn hex(color: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

/// Fail unless every per-document sequence has the same length.
pub fn check_alignment(documents: usize, coordinates: usize, assignments: usize) -> anyhow::Result<()> {
    if documents != coordinates || documents != assignments {
        anyhow::bail!(
            "Misaligned visualization inputs: {documents} documents, {coordinates} coordinates, {assignments} topic assignments"
        );
    }
    Ok(())
}

/// Mean coordinate of each non-noise topic.
pub fn topic_centroids(coords: &[[f32; 2]], assignments: &[i32]) -> BTreeMap<i32, [f32; 2]> {
    let mut sums: BTreeMap<i32, ([f64; 2], usize)> = BTreeMap::new();
    for (p, &topic) in coords.iter().zip(assignments) {
        if topic == NOISE_TOPIC {
            continue;
        }
        let entry = sums.entry(topic).or_insert(([0.0, 0.0], 0));
        entry.0[0] += p[0] as f64;
        entry.0[1] += p[1] as f64;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(t, (s, n))| (t, [(s[0] / n as f64) as f32, (s[1] / n as f64) as f32]))
        .collect()
}

/// Data-space bounding box mapped onto a pixel canvas.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    min: [f32; 2],
    max: [f32; 2],
    width: f32,
    height: f32,
    margin: f32,
}

impl Viewport {
    /// Fit `points` into a `width` x `height` canvas with `margin` on each side.
    pub fn fit(points: &[[f32; 2]], width: f32, height: f32, margin: f32) -> Self {
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];
        for p in points {
            for d in 0..2 {
                min[d] = min[d].min(p[d]);
                max[d] = max[d].max(p[d]);
            }
        }
        if points.is_empty() {
            min = [0.0, 0.0];
            max = [1.0, 1.0];
        }
        // Degenerate axes get a unit extent around the single value
        for d in 0..2 {
            if max[d] - min[d] < f32::EPSILON {
                min[d] -= 0.5;
                max[d] += 0.5;
            }
        }
        Self {
            min,
            max,
            width,
            height,
            margin,
        }
    }

    /// Pixel position of a data point; y grows downwards.
    pub fn project(&self, p: [f32; 2]) -> (f32, f32) {
        let inner_w = self.width - 2.0 * self.margin;
        let inner_h = self.height - 2.0 * self.margin;
        let x = self.margin + (p[0] - self.min[0]) / (self.max[0] - self.min[0]) * inner_w;
        let y = self.margin + (self.max[1] - p[1]) / (self.max[1] - self.min[1]) * inner_h;
        (x, y)
    }
}
