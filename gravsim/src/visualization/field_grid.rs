//! Headless sampling of the gravitational field on a square lattice
//!
//! `FieldGrid` evaluates the active force calculator at every point of a
//! `(2n+1) x (2n+1)` lattice centred on the origin, spanning
//! `[-n*spacing, n*spacing]` on both axes. The result can be dumped as CSV
//! for plotting.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::simulation::engine::Engine;
use crate::simulation::states::{Body, NVec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    pub position: NVec2, // lattice point
    pub field: NVec2, // force per unit mass at that point
}

#[derive(Debug, Clone)]
pub struct FieldGrid {
    half_cells: usize,
    spacing: f64,
    samples: Vec<FieldSample>, // row-major, y outer, x inner, both ascending
}

impl FieldGrid {
    pub fn sample(engine: &Engine, bodies: &[Body], half_cells: usize, spacing: f64) -> Self {
        let n = half_cells as i64;
        let side = 2 * half_cells + 1;
        let mut samples = Vec::with_capacity(side * side);

        for iy in -n..=n {
            for ix in -n..=n {
                let position = NVec2::new(ix as f64 * spacing, iy as f64 * spacing);
                samples.push(FieldSample {
                    position,
                    field: engine.field_at(position, bodies),
                });
            }
        }

        log::debug!("sampled field on a {side}x{side} grid, spacing {spacing}");

        Self {
            half_cells,
            spacing,
            samples,
        }
    }

    /// Points per side, `2n + 1`
    pub fn side(&self) -> usize {
        2 * self.half_cells + 1
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn samples(&self) -> &[FieldSample] {
        &self.samples
    }

    /// Sample at lattice offset (ix, iy), each in `-n..=n`
    pub fn get(&self, ix: i64, iy: i64) -> Option<&FieldSample> {
        let n = self.half_cells as i64;
        if ix.unsigned_abs() > n as u64 || iy.unsigned_abs() > n as u64 {
            return None;
        }
        let row = (iy + n) as usize;
        let col = (ix + n) as usize;
        self.samples.get(row * self.side() + col)
    }

    /// Largest field magnitude on the grid, 0 for an empty field
    pub fn peak_magnitude(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.field.norm())
            .fold(0.0, f64::max)
    }

    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "x,y,gx,gy,magnitude")?;
        for s in &self.samples {
            writeln!(
                out,
                "{},{},{},{},{}",
                s.position.x,
                s.position.y,
                s.field.x,
                s.field.y,
                s.field.norm()
            )?;
        }
        Ok(())
    }

    pub fn to_csv(&self) -> String {
        let mut csv = String::from("x,y,gx,gy,magnitude\n");
        for s in &self.samples {
            // writing to a String cannot fail
            let _ = writeln!(
                csv,
                "{},{},{},{},{}",
                s.position.x,
                s.position.y,
                s.field.x,
                s.field.y,
                s.field.norm()
            );
        }
        csv
    }
}
