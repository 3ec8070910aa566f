//! Top-level orchestration of a configured cast.

use anyhow::Result;
use nalgebra::{Point3, Vector3};

use crate::containment;
use crate::geom::Mesh;
use crate::output;
use crate::ray::{Crossing, Ray};
use crate::settings::Settings;

/// A solvable containment problem: one configured ray cast against a
/// mesh, plus any number of containment probes.
#[derive(Debug, Clone)]
pub struct Cast {
    pub mesh: Mesh,
    pub settings: Settings,     // runtime settings
    pub record: Vec<Crossing>,  // crossing record of the configured ray
    pub probe_results: Vec<bool>, // one containment flag per probe
}

impl Cast {
    /// Loads the geometry named by the settings and prepares an empty
    /// result.
    pub fn new(settings: Settings) -> Result<Self> {
        let mesh = Mesh::from_file(&settings.geom_name)?;

        Ok(Self {
            mesh,
            settings,
            record: Vec::new(),
            probe_results: Vec::new(),
        })
    }

    /// Runs the configured ray trace, then the containment scan when
    /// probes are configured.
    pub fn solve(&mut self) -> Result<()> {
        let origin = Point3::from(self.settings.origin);
        let direction = Vector3::from(self.settings.direction);

        let mut ray = Ray::new(
            origin,
            direction,
            &self.mesh,
            self.settings.max_distance,
            self.settings.cast,
        )?;
        ray.trace()?;
        self.record = ray.into_crossings();

        println!("recorded {} crossings", self.record.len());
        for crossing in &self.record {
            println!("  {:.4} {}", crossing.distance, crossing.state);
        }

        if !self.settings.probes.is_empty() {
            let probes = self.probe_points();
            self.probe_results = containment::scan(
                &self.mesh,
                &probes,
                self.settings.cast,
                self.settings.seed,
            )?;
        }

        Ok(())
    }

    /// Writes the crossing record and probe results to the output files.
    pub fn writeup(&self) -> Result<()> {
        output::writeup(&self.record)?;
        output::writeup_json(&self.record)?;
        if !self.probe_results.is_empty() {
            output::writeup_probes(&self.probe_points(), &self.probe_results)?;
        }

        Ok(())
    }

    fn probe_points(&self) -> Vec<Point3<f32>> {
        self.settings.probes.iter().copied().map(Point3::from).collect()
    }
}
