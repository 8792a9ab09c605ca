//! This module handles conversion between iCal data and internal representations
//!
//! It is a wrapper around different Rust third-party libraries, since no single library
//! both parses _and_ generates iCal files the way this crate needs.

pub mod timezone;
mod parser;
pub use parser::{parse_feed, FeedEvent};
mod builder;
pub use builder::build_feed;

use ical::property::Property;

use crate::config::{ORG_NAME, PRODUCT_NAME};

pub fn default_prod_id() -> String {
    format!(
        "-//{}//{}//EN",
        ORG_NAME.lock().unwrap(),
        PRODUCT_NAME.lock().unwrap()
    )
}

/// Find a property by name in a component's property list
pub(crate) fn prop<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties.iter().find(|property| property.name == name)
}

/// Find a property and return its value
pub(crate) fn prop_value<'a>(properties: &'a [Property], name: &str) -> Option<&'a str> {
    prop(properties, name).and_then(|property| property.value.as_deref())
}

/// Return the first value of a property parameter (e.g. the `TZID` in
/// `DTSTART;TZID=Europe/Paris:...`)
pub(crate) fn prop_param<'a>(property: &'a Property, name: &str) -> Option<&'a str> {
    property.params.as_ref().and_then(|params| {
        params
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .and_then(|(_, values)| values.first())
            .map(|value| value.as_str())
    })
}
