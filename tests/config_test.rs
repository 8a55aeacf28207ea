//! Loading merge descriptions from JSON

use std::path::{Path, PathBuf};

use threemf_merge::{Axes, MergeOptions, MergeSpec, PackingAlgorithm};

const SPEC_JSON: &str = r#"{
  "plates": [
    {
      "name": "Desk",
      "objects": [
        {
          "name": "lamp",
          "count": 2,
          "normalize_position": false,
          "parts": [
            { "name": "base", "file": "lamp_base.3mf", "filament": 1 },
            {
              "name": "shade",
              "file": "lamp_shade.3mf",
              "filament": 2,
              "rotation": { "x": 180 },
              "position": { "z": 40.5 }
            }
          ]
        },
        { "name": "cup", "parts": [{ "name": "cup", "file": "cup.3mf" }] }
      ]
    },
    { "objects": [{ "name": "peg", "parts": [{ "name": "peg", "file": "/abs/peg.3mf" }] }] }
  ]
}"#;

#[test]
fn test_spec_defaults_from_json() {
    let spec: MergeSpec = serde_json::from_str(SPEC_JSON).unwrap();
    spec.validate().unwrap();

    let lamp = &spec.plates[0].objects[0];
    assert_eq!(lamp.count, 2);
    assert!(!lamp.normalize_position);
    assert_eq!(lamp.parts[1].rotation, Axes::new(180.0, 0.0, 0.0));
    assert_eq!(lamp.parts[1].position, Axes::new(0.0, 0.0, 40.5));

    let cup = &spec.plates[0].objects[1];
    assert_eq!(cup.count, 1);
    assert!(cup.normalize_position);
    assert_eq!(cup.parts[0].filament, 0);
    assert_eq!(cup.parts[0].rotation, Axes::default());

    assert_eq!(spec.plates[1].name, None);
    assert_eq!(spec.expand().plates[1].name.as_deref(), Some("Plate 2"));
}

#[test]
fn test_expanded_json_spec() {
    let mut spec: MergeSpec = serde_json::from_str(SPEC_JSON).unwrap();
    spec.resolve_paths(Path::new("/models"));

    let expanded = spec.expand();
    let names: Vec<&str> = expanded.plates[0]
        .objects
        .iter()
        .map(|o| o.name.as_str())
        .collect();
    assert_eq!(names, vec!["lamp_1", "lamp_2", "cup"]);
    assert_eq!(expanded.plates[0].objects[1].parts[1].name, "lamp_2/shade");

    let files: Vec<PathBuf> = expanded.parts().map(|p| p.file.clone()).collect();
    assert_eq!(files[0], PathBuf::from("/models/lamp_base.3mf"));
    assert_eq!(files.last(), Some(&PathBuf::from("/abs/peg.3mf")));
    assert_eq!(
        spec.first_part().map(|p| p.file.clone()),
        Some(PathBuf::from("/models/lamp_base.3mf"))
    );
}

#[test]
fn test_invalid_json_values_are_caught() {
    let bad_filament = SPEC_JSON.replace("\"filament\": 2", "\"filament\": 7");
    let spec: MergeSpec = serde_json::from_str(&bad_filament).unwrap();
    let err = spec.validate().unwrap_err();
    assert!(err.to_string().contains("plates[0].objects[0].parts[1]"));

    let unnamed = SPEC_JSON.replace("\"name\": \"cup\", \"parts\"", "\"name\": \" \", \"parts\"");
    let spec: MergeSpec = serde_json::from_str(&unnamed).unwrap();
    assert!(spec.validate().is_err());

    let missing_file = r#"{ "plates": [{ "objects": [{ "name": "a", "parts": [{ "name": "a" }] }] }] }"#;
    assert!(serde_json::from_str::<MergeSpec>(missing_file).is_err());
}

#[test]
fn test_options_from_json() {
    let options: MergeOptions = serde_json::from_str(
        r#"{ "margin": 4, "algorithm": "compact", "plate_width": 180, "date": "2024-02-29" }"#,
    )
    .unwrap();
    options.validate().unwrap();
    assert_eq!(options.margin, 4.0);
    assert_eq!(options.algorithm, PackingAlgorithm::Guillotine);
    assert_eq!(options.effective_plate_width(), 180.0);
    assert_eq!(options.application, "threemf-merge");

    let defaults: MergeOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, MergeOptions::new());
    assert_eq!(defaults.effective_plate_width(), 256.0);

    for (name, algorithm) in [
        ("\"default\"", PackingAlgorithm::Shelf),
        ("\"shelf\"", PackingAlgorithm::Shelf),
        ("\"guillotine\"", PackingAlgorithm::Guillotine),
        ("\"grid\"", PackingAlgorithm::Grid),
    ] {
        assert_eq!(
            serde_json::from_str::<PackingAlgorithm>(name).unwrap(),
            algorithm
        );
    }
    assert!(serde_json::from_str::<PackingAlgorithm>("\"spiral\"").is_err());
    assert_eq!(
        serde_json::to_string(&PackingAlgorithm::Guillotine).unwrap(),
        "\"compact\""
    );

    let negative: MergeOptions = serde_json::from_str(r#"{ "margin": -2 }"#).unwrap();
    assert!(negative.validate().is_err());
}
