use meshcast::{cast::Cast, containment, geom::Mesh, ray::Containment, settings};
use nalgebra::Point3;

// Tolerance on crossing distances, one forward step plus refinement slack
const TOL: f32 = 0.02;

#[test]
fn default_config_cube_pass_through() {
    let settings = settings::load_default_config().unwrap();
    let mut cast = Cast::new(settings).unwrap();
    cast.solve().unwrap();

    assert_eq!(cast.record.len(), 2);
    assert!(
        (cast.record[0].distance - 4.5).abs() < TOL,
        "distance: {}",
        cast.record[0].distance
    );
    assert_eq!(cast.record[0].state, Containment::Inside);
    assert!(
        (cast.record[1].distance - 5.5).abs() < TOL,
        "distance: {}",
        cast.record[1].distance
    );
    assert_eq!(cast.record[1].state, Containment::Outside);
}

#[test]
fn cube_cast_away_is_empty() {
    let mut settings = settings::load_default_config().unwrap();
    settings.direction = [0.0, 1.0, 0.0];

    let mut cast = Cast::new(settings).unwrap();
    cast.solve().unwrap();

    assert!(cast.record.is_empty());
}

#[test]
fn cube_cast_short_of_mesh_is_empty() {
    let mut settings = settings::load_default_config().unwrap();
    settings.max_distance = 4.0;

    let mut cast = Cast::new(settings).unwrap();
    cast.solve().unwrap();

    assert!(cast.record.is_empty());
}

#[test]
fn configured_probes_are_classified() {
    let mut settings = settings::load_default_config().unwrap();
    settings.probes = vec![[0.0, 0.0, 0.0], [0.25, -0.25, 0.1], [0.0, 2.0, 0.0]];
    settings.seed = Some(19);

    let mut cast = Cast::new(settings).unwrap();
    cast.solve().unwrap();

    assert_eq!(cast.probe_results, vec![true, true, false]);
}

#[test]
fn scan_agrees_with_itself_under_seed() {
    let mesh = Mesh::from_file("cube.obj").unwrap();
    let probes = vec![
        Point3::new(0.1, 0.1, 0.1),
        Point3::new(-0.3, 0.2, -0.4),
        Point3::new(1.5, 0.0, 0.0),
    ];

    let first = containment::scan(&mesh, &probes, Default::default(), Some(3)).unwrap();
    let second = containment::scan(&mesh, &probes, Default::default(), Some(3)).unwrap();

    assert_eq!(first, vec![true, true, false]);
    assert_eq!(first, second);
}
