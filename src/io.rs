//! Particle I/O (component N): parsing and formatting functions
//! implementing the simulator's exact text column contract. These are
//! pure functions over `BufRead`/`Write`; which file gets opened, and
//! when, is left to the driver.

use crate::dim::Dim;
use crate::error::SimError;
use crate::particle::Particle;
use crate::vector::VectorOps;
use std::io::{self, BufRead, Write};

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

/// Parses a particle stream: `#`-comments ignored, an optional
/// non-numeric header line skipped once, then `2·d+2` whitespace-separated
/// fields per line in order `rₓ,r_y[,r_z],vₓ,v_y[,v_z],q,m`.
pub fn read_particles<Dm: Dim>(input: impl BufRead) -> Result<Vec<Particle<Dm>>, SimError> {
    let d = Dm::D;
    let expected_fields = 2 * d + 2;

    let mut particles = Vec::new();
    let mut header_checked = false;

    for (i, line) in input.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|_| SimError::InvalidInput { line: line_no })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();

        if !header_checked {
            header_checked = true;
            if fields.iter().any(|f| f.parse::<f64>().is_err()) {
                continue;
            }
        }

        if fields.len() != expected_fields {
            return Err(SimError::InvalidInput { line: line_no });
        }
        let mut values = [0.0_f64; 8];
        for (slot, field) in values.iter_mut().zip(fields.iter()) {
            *slot = field.parse().map_err(|_| SimError::InvalidInput { line: line_no })?;
        }

        let mut r = Dm::Vector::zero();
        let mut v = Dm::Vector::zero();
        for axis in 0..d {
            r = r.with_component(axis, values[axis]);
            v = v.with_component(axis, values[d + axis]);
        }
        let q = values[2 * d];
        let m = values[2 * d + 1];

        let particle = Particle::new(r, v, q, m).map_err(|_| SimError::InvalidInput { line: line_no })?;
        particles.push(particle);
    }

    Ok(particles)
}

/// Writes a particle stream per the output column contract.
pub fn write_particles<Dm: Dim>(mut out: impl Write, particles: &[Particle<Dm>], header: bool) -> io::Result<()> {
    let d = Dm::D;

    if header {
        let mut cols = Vec::with_capacity(2 * d + 2);
        for axis in 0..d {
            cols.push(format!("r{}", AXIS_NAMES[axis]));
        }
        for axis in 0..d {
            cols.push(format!("v{}", AXIS_NAMES[axis]));
        }
        cols.push("q".to_string());
        cols.push("m".to_string());
        writeln!(out, "{}", cols.join(" "))?;
    }

    for p in particles {
        let mut cols = Vec::with_capacity(2 * d + 2);
        for axis in 0..d {
            cols.push(format!("{:>14.4e}", p.r.component(axis)));
        }
        for axis in 0..d {
            cols.push(format!("{:>14.4e}", p.v.component(axis)));
        }
        cols.push(format_sig3(p.q(), 7));
        cols.push(format_sig3(p.mass(), 7));
        writeln!(out, "{}", cols.join(" "))?;
    }

    Ok(())
}

/// Fixed-notation formatting to 3 *significant* digits (not decimal
/// places), right-padded to `width` — the `q`/`m` columns' convention,
/// matching `std::setprecision(3)` in `defaultfloat` mode.
fn format_sig3(value: f64, width: usize) -> String {
    if value == 0.0 {
        return format!("{:>width$.2}", 0.0, width = width);
    }
    let exponent = value.abs().log10().floor() as i32;
    let decimals = (2 - exponent).max(0) as usize;
    format!("{:>width$.decimals$}", value, width = width, decimals = decimals)
}

/// `<basename>-<iter>.txt`, `iter` zero-padded to 5 digits.
pub fn snapshot_filename(basename: &str, iter: usize) -> String {
    format!("{basename}-{iter:05}.txt")
}
