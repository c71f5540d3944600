// tests/config_load.rs
use drifter_tracks::Config;
use std::fs;

#[test]
fn json_and_toml_files_load() {
    let dir = tempfile::tempdir().unwrap();

    let p_json = dir.path().join("drifters.json");
    fs::write(
        &p_json,
        r#"{
  "Sources": [
    { "Url": "http://www.nefsc.noaa.gov/drifter/drift_ep_2014_1.dat", "Year": 2014, "Esns": [995094] }
  ],
  "Drifters": [
    { "Name": "charger", "Esns": [995094], "From": 0, "To": 1420070400 }
  ]
}"#,
    )
    .unwrap();
    let cfg = Config::load_from(&p_json).unwrap();
    assert_eq!(cfg.drifters[0].window_start, None);
    assert_eq!(cfg.drifters[0].window_end, Some(1_420_070_400));

    let p_toml = dir.path().join("drifters.toml");
    fs::write(
        &p_toml,
        r#"
[[sources]]
url = "tests/fixtures/drift_sample.dat"
year = 2014
esns = [995094, 995095]

[[drifters]]
name = "charger"
esns = [995094, 995095]
"#,
    )
    .unwrap();
    let cfg = Config::load_from(&p_toml).unwrap();
    assert_eq!(cfg.sources[0].transmitter_ids.len(), 2);
}

#[test]
fn malformed_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();

    let broken = dir.path().join("broken.json");
    fs::write(&broken, r#"{ "Sources": [ { "Url": 5 } ] }"#).unwrap();
    assert!(Config::load_from(&broken).is_err());

    let dup = dir.path().join("dup.json");
    fs::write(
        &dup,
        r#"{
  "Sources": [ { "Url": "x", "Year": 2020, "Esns": [1] } ],
  "Drifters": [ { "Name": "a", "Esns": [1] }, { "Name": "a", "Esns": [1] } ]
}"#,
    )
    .unwrap();
    let err = Config::load_from(&dup).unwrap_err();
    assert!(err.to_string().contains("duplicate"));

    assert!(Config::load_from(&dir.path().join("absent.json")).is_err());
}
