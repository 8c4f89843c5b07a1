use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_when_nothing_set() {
    let cfg = RelationsConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, RelationsConfig::default());
    assert!(cfg.auto_link);
    assert!(cfg.enforce_acyclic);
    assert!(cfg.standard_rules);
    assert_eq!(cfg.max_cascade_depth, DEFAULT_MAX_CASCADE_DEPTH);
}

#[test]
fn parses_overrides() {
    let cfg = RelationsConfig::from_lookup(lookup(&[
        ("RELATIONS_AUTO_LINK", "false"),
        ("RELATIONS_ENFORCE_ACYCLIC", "0"),
        ("RELATIONS_STANDARD_RULES", " No "),
        ("RELATIONS_MAX_CASCADE_DEPTH", "4"),
    ]))
    .unwrap();
    assert_eq!(
        cfg,
        RelationsConfig { auto_link: false, enforce_acyclic: false, standard_rules: false, max_cascade_depth: 4 }
    );
}

#[test]
fn rejects_bad_bool() {
    let err = RelationsConfig::from_lookup(lookup(&[("RELATIONS_AUTO_LINK", "maybe")])).unwrap_err();
    assert_eq!(err, ConfigError::InvalidBool { var: "RELATIONS_AUTO_LINK".into(), value: "maybe".into() });
}

#[test]
fn rejects_bad_depth() {
    let err = RelationsConfig::from_lookup(lookup(&[("RELATIONS_MAX_CASCADE_DEPTH", "-1")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    assert!(err.to_string().contains("RELATIONS_MAX_CASCADE_DEPTH"));
}

#[test]
fn from_env_without_relations_vars_uses_defaults() {
    let vars_set = std::env::vars().any(|(k, _)| k.starts_with("RELATIONS_"));
    if !vars_set {
        assert_eq!(RelationsConfig::from_env().unwrap(), RelationsConfig::default());
    }
}

#[test]
fn env_lookup_reads_process_environment() {
    assert_eq!(env_lookup("CARGO_MANIFEST_DIR").as_deref(), Some(env!("CARGO_MANIFEST_DIR")));
    assert_eq!(env_lookup("RELATIONS_NEVER_SET_IN_TESTS"), None);
}
