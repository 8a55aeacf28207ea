#![no_main]

use libfuzzer_sys::arbitrary::{Arbitrary, Result, Unstructured};
use libfuzzer_sys::fuzz_target;
use threemf_merge::geometry::{bounding_box, rotate_vertices};
use threemf_merge::{Mesh, Packer, PackingAlgorithm, Rect, Vertex};

#[derive(Debug)]
struct FuzzInput {
    vertices: Vec<(f64, f64, f64)>,
    rotation: (f64, f64, f64),
    rects: Vec<(f64, f64)>,
    margin: f64,
    algorithm: u8,
}

impl<'a> Arbitrary<'a> for FuzzInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        let vertex_count = u.int_in_range(0..=64)?;
        let mut vertices = Vec::new();
        for _ in 0..vertex_count {
            vertices.push((u.arbitrary()?, u.arbitrary()?, u.arbitrary()?));
        }

        let rect_count = u.int_in_range(0..=32)?;
        let mut rects = Vec::new();
        for _ in 0..rect_count {
            let w: u16 = u.arbitrary()?;
            let h: u16 = u.arbitrary()?;
            rects.push((f64::from(w) / 10.0, f64::from(h) / 10.0));
        }

        Ok(FuzzInput {
            vertices,
            rotation: (u.arbitrary()?, u.arbitrary()?, u.arbitrary()?),
            rects,
            margin: f64::from(u.int_in_range(0u8..=50)?),
            algorithm: u.arbitrary()?,
        })
    }
}

fuzz_target!(|input: FuzzInput| {
    let mut mesh = Mesh::new();
    for (x, y, z) in &input.vertices {
        mesh.vertices.push(Vertex::new(*x, *y, *z));
    }
    let _ = rotate_vertices(&mut mesh, input.rotation.0, input.rotation.1, input.rotation.2);
    let _ = bounding_box(&mesh);

    let algorithm = match input.algorithm % 3 {
        0 => PackingAlgorithm::Shelf,
        1 => PackingAlgorithm::Guillotine,
        _ => PackingAlgorithm::Grid,
    };
    let rects: Vec<Rect> = input
        .rects
        .iter()
        .enumerate()
        .map(|(i, (w, h))| Rect::new(i, *w, *h))
        .collect();
    let placements = Packer::new(input.margin)
        .with_algorithm(algorithm)
        .pack(&rects);
    assert_eq!(placements.len(), rects.len());
});
