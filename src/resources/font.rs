//! Typeface JSON fonts (`*.typeface.json`).
//!
//! The format stores one outline string per glyph in font units. The outline
//! is a flat list of commands:
//!
//! - `m x y` move to
//! - `l x y` line to
//! - `q x y cx cy` quadratic curve ending at `(x, y)` with control `(cx, cy)`
//! - `b x y c1x c1y c2x c2y` cubic curve ending at `(x, y)`
//!
//! Note that curves list their end point before the control points.

use std::{collections::HashMap, str::SplitWhitespace};

use lyon::math::point;
use lyon::path::Path;
use serde::Deserialize;

use crate::error::{Result, SceneError};

#[derive(Debug, Clone, Deserialize)]
pub struct Typeface {
    pub glyphs: HashMap<String, Glyph>,
    #[serde(rename = "familyName", default)]
    pub family_name: String,
    /// Font units per em.
    pub resolution: f32,
    #[serde(rename = "boundingBox")]
    pub bounding_box: FontBounds,
    #[serde(rename = "underlineThickness", default)]
    pub underline_thickness: f32,
    #[serde(default)]
    pub ascender: f32,
    #[serde(default)]
    pub descender: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FontBounds {
    #[serde(rename = "xMin")]
    pub x_min: f32,
    #[serde(rename = "xMax")]
    pub x_max: f32,
    #[serde(rename = "yMin")]
    pub y_min: f32,
    #[serde(rename = "yMax")]
    pub y_max: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Glyph {
    /// Horizontal advance in font units.
    pub ha: f32,
    #[serde(default)]
    pub x_min: f32,
    #[serde(default)]
    pub x_max: f32,
    /// Outline commands; absent for blank glyphs such as the space.
    #[serde(default)]
    pub o: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlineCommand {
    MoveTo([f32; 2]),
    LineTo([f32; 2]),
    QuadTo { ctrl: [f32; 2], to: [f32; 2] },
    CubicTo { ctrl1: [f32; 2], ctrl2: [f32; 2], to: [f32; 2] },
}

impl Glyph {
    pub fn outline(&self) -> Result<Vec<OutlineCommand>> {
        match &self.o {
            Some(o) => parse_outline(o),
            None => Ok(Vec::new()),
        }
    }
}

pub fn parse_outline(outline: &str) -> Result<Vec<OutlineCommand>> {
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();
    while let Some(op) = tokens.next() {
        let command = match op {
            "m" => OutlineCommand::MoveTo([number(&mut tokens, op)?, number(&mut tokens, op)?]),
            "l" => OutlineCommand::LineTo([number(&mut tokens, op)?, number(&mut tokens, op)?]),
            "q" => {
                let to = [number(&mut tokens, op)?, number(&mut tokens, op)?];
                let ctrl = [number(&mut tokens, op)?, number(&mut tokens, op)?];
                OutlineCommand::QuadTo { ctrl, to }
            }
            "b" => {
                let to = [number(&mut tokens, op)?, number(&mut tokens, op)?];
                let ctrl1 = [number(&mut tokens, op)?, number(&mut tokens, op)?];
                let ctrl2 = [number(&mut tokens, op)?, number(&mut tokens, op)?];
                OutlineCommand::CubicTo { ctrl1, ctrl2, to }
            }
            // some exporters emit `z`
            "z" => continue,
            other => {
                return Err(SceneError::Geometry(format!(
                    "unknown outline command `{other}`"
                )));
            }
        };
        commands.push(command);
    }
    Ok(commands)
}

fn number(tokens: &mut SplitWhitespace<'_>, op: &str) -> Result<f32> {
    let token = tokens
        .next()
        .ok_or_else(|| SceneError::Geometry(format!("outline command `{op}` is truncated")))?;
    token
        .parse::<f32>()
        .map_err(|e| SceneError::Geometry(format!("bad number `{token}` in `{op}`: {e}")))
}

impl Typeface {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let typeface: Typeface = serde_json::from_slice(bytes)
            .map_err(|e| SceneError::Geometry(format!("invalid typeface json: {e}")))?;
        if !(typeface.resolution > 0.0) {
            return Err(SceneError::Geometry(
                "typeface resolution must be positive".to_string(),
            ));
        }
        Ok(typeface)
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        let mut buf = [0u8; 4];
        self.glyphs.get(&*c.encode_utf8(&mut buf))
    }

    /// Distance between baselines at `size`.
    pub fn line_height(&self, size: f32) -> f32 {
        let bounds = self.bounding_box;
        (bounds.y_max - bounds.y_min + self.underline_thickness) * size / self.resolution
    }

    /// Lay out `text` on a baseline at the origin and return all glyph contours as one path.
    ///
    /// Units are scaled so one em equals `size`. Missing glyphs fall back to `?`
    /// and are skipped (with a warning) if that is missing too. `\n` starts a new line.
    pub fn text_path(&self, text: &str, size: f32) -> Result<Path> {
        let scale = size / self.resolution;
        let line_height = self.line_height(size);
        let mut builder = Path::builder();
        let (mut offset_x, mut offset_y) = (0.0f32, 0.0f32);

        for c in text.chars() {
            if c == '\n' {
                offset_x = 0.0;
                offset_y -= line_height;
                continue;
            }
            let Some(glyph) = self.glyph(c).or_else(|| self.glyph('?')) else {
                log::warn!(
                    "character `{c}` does not exist in font family {}",
                    self.family_name
                );
                continue;
            };

            let at = |p: [f32; 2]| point(p[0] * scale + offset_x, p[1] * scale + offset_y);
            let mut open = false;
            for command in glyph.outline()? {
                match command {
                    OutlineCommand::MoveTo(p) => {
                        if open {
                            builder.end(true);
                        }
                        builder.begin(at(p));
                        open = true;
                    }
                    OutlineCommand::LineTo(p) if open => {
                        builder.line_to(at(p));
                    }
                    OutlineCommand::QuadTo { ctrl, to } if open => {
                        builder.quadratic_bezier_to(at(ctrl), at(to));
                    }
                    OutlineCommand::CubicTo { ctrl1, ctrl2, to } if open => {
                        builder.cubic_bezier_to(at(ctrl1), at(ctrl2), at(to));
                    }
                    _ => {
                        return Err(SceneError::Geometry(format!(
                            "glyph `{c}` draws before its first move"
                        )));
                    }
                }
            }
            if open {
                builder.end(true);
            }
            offset_x += glyph.ha * scale;
        }
        Ok(builder.build())
    }
}
