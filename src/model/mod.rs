//! Data structures representing 3MF models and slicer settings

mod core;
mod settings;

pub use core::{
    Build, BuildItem, CORE_NAMESPACE, Component, Extension, Mesh, MetadataEntry, Model, Object,
    ObjectType, Resources, Triangle, Vertex,
};

pub use settings::{
    AssembleItem, FILAMENT_MAP_MODE, IDENTITY_MATRIX, MeshStat, ModelInstance, NORMAL_PART,
    SettingsDocument, SettingsObject, SettingsPart, SettingsPlate,
};
