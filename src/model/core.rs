//! Core 3MF types and structures

use crate::geometry::Transform;

/// XML namespace of the 3MF core specification
pub const CORE_NAMESPACE: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";

/// 3MF namespaces understood by the merger
///
/// Only the production prefix is ever declared as required; the BambuStudio
/// namespace carries vendor metadata names and is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    /// Core 3MF specification (always required)
    Core,
    /// Production Extension
    Production,
    /// Bambu Studio vendor namespace
    BambuStudio,
}

impl Extension {
    /// Get the namespace URI for this extension
    pub fn namespace(&self) -> &'static str {
        match self {
            Extension::Core => CORE_NAMESPACE,
            Extension::Production => {
                "http://schemas.microsoft.com/3dmanufacturing/production/2015/06"
            }
            Extension::BambuStudio => "http://schemas.bambulab.com/package/2021",
        }
    }

    /// Get extension from namespace URI
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            CORE_NAMESPACE => Some(Extension::Core),
            "http://schemas.microsoft.com/3dmanufacturing/production/2015/06" => {
                Some(Extension::Production)
            }
            "http://schemas.bambulab.com/package/2021" => Some(Extension::BambuStudio),
            _ => None,
        }
    }

    /// Namespace prefix used when the extension is declared on `<model>`
    pub fn prefix(&self) -> &'static str {
        match self {
            Extension::Core => "",
            Extension::Production => "p",
            Extension::BambuStudio => "BambuStudio",
        }
    }
}

/// A 3D vertex with x, y, z coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Vertex {
    /// Create a new vertex
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    /// Index of first vertex
    pub v1: usize,
    /// Index of second vertex
    pub v2: usize,
    /// Index of third vertex
    pub v3: usize,
}

impl Triangle {
    /// Create a new triangle
    pub fn new(v1: usize, v2: usize, v3: usize) -> Self {
        Self { v1, v2, v3 }
    }
}

/// A 3D mesh containing vertices and triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// List of vertices
    pub vertices: Vec<Vertex>,
    /// List of triangles
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new mesh with pre-allocated capacity
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            triangles: Vec::with_capacity(triangles),
        }
    }

    /// Number of triangles (faces) in the mesh
    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    /// Append another mesh, re-basing its triangle indices onto this one
    pub fn append(&mut self, other: &Mesh) {
        let base = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| Triangle::new(t.v1 + base, t.v2 + base, t.v3 + base)),
        );
    }
}

/// A component that references another object with an optional transformation
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// ID of the referenced object
    pub objectid: usize,
    /// Optional affine transformation applied to the referenced object
    pub transform: Option<Transform>,
}

impl Component {
    /// Create a new component with the given object reference
    pub fn new(objectid: usize) -> Self {
        Self {
            objectid,
            transform: None,
        }
    }

    /// Create a new component with a transformation
    pub fn with_transform(objectid: usize, transform: Transform) -> Self {
        Self {
            objectid,
            transform: Some(transform),
        }
    }
}

/// Type of 3D object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectType {
    /// A standard model object
    #[default]
    Model,
    /// A support structure
    Support,
    /// A solid support structure
    SolidSupport,
    /// A surface object
    Surface,
    /// Other types
    Other,
}

impl ObjectType {
    /// Attribute value written to `type`
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Model => "model",
            ObjectType::Support => "support",
            ObjectType::SolidSupport => "solidsupport",
            ObjectType::Surface => "surface",
            ObjectType::Other => "other",
        }
    }

    /// Parse the `type` attribute; unknown values map to [`ObjectType::Other`]
    pub fn from_attribute(value: &str) -> Self {
        match value {
            "model" => ObjectType::Model,
            "support" => ObjectType::Support,
            "solidsupport" => ObjectType::SolidSupport,
            "surface" => ObjectType::Surface,
            _ => ObjectType::Other,
        }
    }
}

/// A 3D object that is either a mesh or an assembly of components
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Object ID
    pub id: usize,
    /// Object name (optional)
    pub name: Option<String>,
    /// Type of object
    pub object_type: ObjectType,
    /// Optional mesh data
    pub mesh: Option<Mesh>,
    /// Components that reference other objects (assemblies)
    pub components: Vec<Component>,
}

impl Object {
    /// Create a new object
    pub fn new(id: usize) -> Self {
        Self {
            id,
            name: None,
            object_type: ObjectType::Model,
            mesh: None,
            components: Vec::new(),
        }
    }

    /// Create a named mesh object
    pub fn with_mesh(id: usize, name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: Some(name.into()),
            mesh: Some(mesh),
            ..Self::new(id)
        }
    }

    /// Create a named assembly object
    pub fn with_components(
        id: usize,
        name: impl Into<String>,
        components: Vec<Component>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            components,
            ..Self::new(id)
        }
    }
}

/// Resources section containing objects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources {
    /// List of objects
    pub objects: Vec<Object>,
}

impl Resources {
    /// Create a new empty resources section
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an object by ID
    pub fn get_object(&self, id: usize) -> Option<&Object> {
        self.objects.iter().find(|o| o.id == id)
    }
}

/// An item to be built, referencing an object
#[derive(Debug, Clone, PartialEq)]
pub struct BuildItem {
    /// Reference to object ID
    pub objectid: usize,
    /// Optional placement transformation
    pub transform: Option<Transform>,
    /// Optional printable flag
    pub printable: Option<bool>,
}

impl BuildItem {
    /// Create a new build item
    pub fn new(objectid: usize) -> Self {
        Self {
            objectid,
            transform: None,
            printable: None,
        }
    }

    /// Create a printable build item placed with `transform`
    pub fn placed(objectid: usize, transform: Transform) -> Self {
        Self {
            objectid,
            transform: Some(transform),
            printable: Some(true),
        }
    }
}

/// Build section specifying which objects to manufacture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Build {
    /// List of items to build
    pub items: Vec<BuildItem>,
}

impl Build {
    /// Create a new empty build section
    pub fn new() -> Self {
        Self::default()
    }
}

/// Metadata entry of the model document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    /// Name of the metadata entry
    pub name: String,
    /// Value of the metadata entry
    pub value: String,
}

impl MetadataEntry {
    /// Create a new metadata entry
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Complete 3MF model document
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Unit of measurement (e.g., "millimeter", "inch")
    pub unit: String,
    /// Language tag written to `xml:lang`
    pub lang: String,
    /// Extensions declared on the root element besides the core namespace
    pub declared_extensions: Vec<Extension>,
    /// Extensions listed in `requiredextensions`
    pub required_extensions: Vec<Extension>,
    /// Metadata entries
    pub metadata: Vec<MetadataEntry>,
    /// Resources (objects)
    pub resources: Resources,
    /// Build specification
    pub build: Build,
}

impl Model {
    /// Create a new empty model
    pub fn new() -> Self {
        Self {
            unit: "millimeter".to_string(),
            lang: "en-US".to_string(),
            declared_extensions: Vec::new(),
            required_extensions: Vec::new(),
            metadata: Vec::new(),
            resources: Resources::new(),
            build: Build::new(),
        }
    }

    /// Get metadata value by name
    pub fn get_metadata(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }

    /// Check if metadata entry exists with the given name
    pub fn has_metadata(&self, name: &str) -> bool {
        self.metadata.iter().any(|entry| entry.name == name)
    }

    /// Iterate over objects that carry a mesh
    pub fn mesh_objects(&self) -> impl Iterator<Item = &Object> {
        self.resources.objects.iter().filter(|o| o.mesh.is_some())
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
