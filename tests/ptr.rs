use std::rc::Rc;
use std::sync::Arc;

use facet::Facet;
use facet_mapstructure::{Metadata, decode, decode_metadata, value, weak_decode};
use facet_testhelpers::test;

#[derive(Facet, Debug, Default, PartialEq)]
struct Inner {
    port: u16,
}

#[test]
fn option_some_and_absent() {
    #[derive(Facet, Debug, Default, PartialEq)]
    struct Config {
        name: Option<String>,
        alias: Option<String>,
    }

    let mut config = Config::default();
    decode(&value!({ "name": "n" }), &mut config).unwrap();
    assert_eq!(config.name.as_deref(), Some("n"));
    assert_eq!(config.alias, None);
}

#[test]
fn option_null_is_none() {
    #[derive(Facet, Debug, Default, PartialEq)]
    struct Config {
        name: Option<String>,
    }

    let mut config = Config::default();
    decode(&value!({ "name": null }), &mut config).unwrap();
    assert_eq!(config.name, None);
}

#[test]
fn option_of_struct() {
    #[derive(Facet, Debug, Default, PartialEq)]
    struct Config {
        inner: Option<Inner>,
    }

    let mut config = Config::default();
    decode(&value!({ "inner": { "port": 22 } }), &mut config).unwrap();
    assert_eq!(config.inner, Some(Inner { port: 22 }));
}

#[test]
fn failed_option_stays_none() {
    #[derive(Facet, Debug, Default, PartialEq)]
    struct Config {
        count: Option<u8>,
    }

    let mut config = Config::default();
    let err = decode(&value!({ "count": 1000 }), &mut config).unwrap_err();
    assert_eq!(
        err.field_errors()[0].to_string(),
        "cannot parse 'count', 1000 overflows u8"
    );
    assert_eq!(config.count, None);
}

#[test]
fn failed_option_keeps_its_current_value() {
    #[derive(Facet, Debug, Default, PartialEq)]
    struct Config {
        count: Option<u8>,
        inner: Option<Box<Inner>>,
    }

    let mut config = Config {
        count: Some(7),
        inner: Some(Box::new(Inner { port: 22 })),
    };
    let err = decode(&value!({ "count": (-1), "inner": { "port": "ssh" } }), &mut config)
        .unwrap_err();
    assert_eq!(err.field_errors().len(), 2);
    assert_eq!(config.count, Some(7));
    assert_eq!(config.inner, Some(Box::new(Inner { port: 22 })));
}

#[test]
fn boxed_values() {
    #[derive(Facet, Debug, Default, PartialEq)]
    struct Config {
        inner: Box<Inner>,
        label: Box<String>,
    }

    let mut config = Config::default();
    weak_decode(&value!({ "inner": { "port": "443" }, "label": 5 }), &mut config).unwrap();
    assert_eq!(config.inner.port, 443);
    assert_eq!(*config.label, "5");
}

#[test]
fn shared_pointers() {
    #[derive(Facet, Debug, Default, PartialEq)]
    struct Config {
        shared: Arc<Inner>,
        local: Rc<u32>,
    }

    let mut config = Config::default();
    decode(&value!({ "shared": { "port": 1 }, "local": 2 }), &mut config).unwrap();
    assert_eq!(config.shared.port, 1);
    assert_eq!(*config.local, 2);
}

#[test]
fn optional_paths_are_recorded_once_per_layer() {
    #[derive(Facet, Debug, Default, PartialEq)]
    struct Config {
        name: Option<String>,
    }

    let mut config = Config::default();
    let mut metadata = Metadata::new();
    decode_metadata(&value!({ "name": "n" }), &mut config, &mut metadata).unwrap();
    assert_eq!(metadata.keys, ["name", "name"]);
}
