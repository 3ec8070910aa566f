use std::{fs::File, io::BufWriter};

use anyhow::Result;
use nalgebra::Point3;
use std::io::Write;

use crate::ray::{Containment, Crossing};

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn containment_display() {
        assert_eq!(Containment::Inside.to_string(), "inside");
        assert_eq!(Containment::Outside.to_string(), "outside");
    }

    #[test]
    fn crossing_json_format() {
        let crossing = Crossing {
            distance: 4.5,
            state: Containment::Inside,
        };
        let json = serde_json::to_string(&crossing).unwrap();
        assert_eq!(json, r#"{"distance":4.5,"state":"inside"}"#);
    }
}

/// Write the crossing record to a file, one `distance state` line per
/// confirmed crossing.
pub fn writeup(crossings: &[Crossing]) -> Result<()> {
    let file = File::create("crossings")?;
    let mut writer = BufWriter::new(file);

    for crossing in crossings {
        writeln!(writer, "{} {}", crossing.distance, crossing.state)?;
    }

    Ok(())
}

/// Write the crossing record as JSON for downstream tooling.
pub fn writeup_json(crossings: &[Crossing]) -> Result<()> {
    let file = File::create("crossings.json")?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, crossings)?;

    Ok(())
}

/// Write probe containment results, one `x y z state` line per probe.
pub fn writeup_probes(probes: &[Point3<f32>], inside: &[bool]) -> Result<()> {
    let file = File::create("containment")?;
    let mut writer = BufWriter::new(file);

    for (point, &inside) in probes.iter().zip(inside.iter()) {
        let state = if inside {
            Containment::Inside
        } else {
            Containment::Outside
        };
        writeln!(writer, "{} {} {} {}", point.x, point.y, point.z, state)?;
    }

    Ok(())
}
