use log::debug;

use crate::device::{BufferId, Device, Topology, VertexArrayId, VertexAttribute};

/// A full-screen quad: four positions spanning clip space, drawn as a triangle strip.
#[rustfmt::skip]
pub const QUAD_VERTICES: [f32; 12] = [
    // positions
     1.0, -1.0, 0.0,  // bottom right
    -1.0, -1.0, 0.0,  // bottom left
     1.0,  1.0, 0.0,  // top right
    -1.0,  1.0, 0.0,  // top left
];

/// A single triangle with a color per corner.
#[rustfmt::skip]
pub const TRIANGLE_VERTICES: [f32; 18] = [
    // positions         colors
     0.5, -0.5, 0.0,     1.0, 0.0, 0.0,  // bottom right
    -0.5, -0.5, 0.0,     0.0, 1.0, 0.0,  // bottom left
     0.0,  0.5, 0.0,     0.0, 0.0, 1.0,  // top
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Quad,
    Triangle,
}

impl GeometryKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "quad" => Some(GeometryKind::Quad),
            "triangle" => Some(GeometryKind::Triangle),
            _ => None,
        }
    }
}

/// Static vertex data uploaded once, plus what's needed to draw it.
pub struct Geometry<D: Device> {
    device: D,
    vertex_array: VertexArrayId,
    buffer: BufferId,
    topology: Topology,
    count: usize,
}

impl<D: Device> Geometry<D> {
    pub fn upload(
        device: D,
        vertices: &[f32],
        attributes: &[VertexAttribute],
        topology: Topology,
    ) -> Self {
        // Every attribute shares the same interleaved stride.
        let stride = attributes.first().map(|a| a.stride).unwrap_or(0).max(1);
        let count = vertices.len() / stride;
        let (vertex_array, buffer) = device.create_vertex_array(vertices, attributes);

        debug!("uploaded {} vertices ({:?}) into vertex array {}", count, topology, vertex_array);

        Self { device, vertex_array, buffer, topology, count }
    }

    pub fn preset(device: D, kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Quad => Self::upload(
                device,
                &QUAD_VERTICES,
                &[VertexAttribute { index: 0, components: 3, stride: 3, offset: 0 }],
                Topology::TriangleStrip,
            ),
            GeometryKind::Triangle => Self::upload(
                device,
                &TRIANGLE_VERTICES,
                &[
                    VertexAttribute { index: 0, components: 3, stride: 6, offset: 0 },
                    VertexAttribute { index: 1, components: 3, stride: 6, offset: 3 },
                ],
                Topology::Triangles,
            ),
        }
    }

    pub fn topology(&self) -> Topology { self.topology }

    pub fn vertex_count(&self) -> usize { self.count }

    pub fn draw(&self) {
        self.device.draw_arrays(self.vertex_array, self.topology, 0, self.count);
    }
}

impl<D: Device> Drop for Geometry<D> {
    fn drop(&mut self) {
        self.device.delete_vertex_array(self.vertex_array, self.buffer);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::headless::HeadlessDevice;

    #[test]
    fn presets_count_whole_vertices() {
        let device = HeadlessDevice::new(2, 2);

        let quad = Geometry::preset(device.clone(), GeometryKind::Quad);
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.topology(), Topology::TriangleStrip);

        let triangle = Geometry::preset(device.clone(), GeometryKind::Triangle);
        assert_eq!(triangle.vertex_count(), 3);
        assert_eq!(triangle.topology(), Topology::Triangles);

        assert_eq!(device.live_vertex_arrays(), 2);
        drop(quad);
        drop(triangle);
        assert_eq!(device.live_vertex_arrays(), 0);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn geometry_names_parse() {
        assert_eq!(GeometryKind::from_name("quad"), Some(GeometryKind::Quad));
        assert_eq!(GeometryKind::from_name("triangle"), Some(GeometryKind::Triangle));
        assert_eq!(GeometryKind::from_name("cube"), None);
    }
}
