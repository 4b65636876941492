//! District and state name canonicalization
//!
//! Two spellings exist for every district: the display form shown to users
//! ("East Champaran") and the query form the open-data API filters on
//! ("PURBI CHAMPARAN"). The exception tables below cover the names where the
//! two differ by more than casing; every other name maps by upper-casing one
//! way and title-casing the other.
//!
//! All tables are immutable and built once on first use.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Query form of the only state this service covers
pub const SUPPORTED_STATE: &str = "BIHAR";

/// Display/variant spelling (upper-cased) -> query form
static QUERY_FORMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("PURNEA", "PURNEA"),
        ("PURNIA", "PURNEA"),
        ("EAST CHAMPARAN", "PURBI CHAMPARAN"),
        ("WEST CHAMPARAN", "PASCHIM CHAMPARAN"),
    ])
});

/// Query form -> display form
static DISPLAY_FORMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("PURBI CHAMPARAN", "East Champaran"),
        ("PASCHIM CHAMPARAN", "West Champaran"),
        ("PURNEA", "Purnea"),
    ])
});

/// Reverse-geocoder spelling (upper-cased) -> query form
static GEOCODER_FORMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("PURBI CHAMPARAN", "PURBI CHAMPARAN"),
        ("PURBA CHAMPARAN", "PURBI CHAMPARAN"),
        ("EAST CHAMPARAN", "PURBI CHAMPARAN"),
        ("WEST CHAMPARAN", "PASCHIM CHAMPARAN"),
        ("PASCHIM CHAMPARAN", "PASCHIM CHAMPARAN"),
        ("PASHCHIM CHAMPARAN", "PASCHIM CHAMPARAN"),
        ("PURNIA", "PURNEA"),
        ("PURNEA", "PURNEA"),
    ])
});

/// Districts (query form) for which location auto-detection is offered
static SUPPORTED_DISTRICTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "PATNA",
        "NALANDA",
        "JEHANABAD",
        "SAMASTIPUR",
        "SUPAUL",
        "ROHTAS",
        "NAWADA",
        "PURBI CHAMPARAN",
        "MADHUBANI",
        "ARARIA",
    ])
});

/// Map any display name or spelling variant to the upstream query form
///
/// Never fails: names outside the exception table are upper-cased.
///
/// # Examples
/// ```
/// use mgnrega_common::names::to_query_form;
///
/// assert_eq!(to_query_form("East Champaran"), "PURBI CHAMPARAN");
/// assert_eq!(to_query_form("Purnia"), "PURNEA");
/// assert_eq!(to_query_form("Gaya"), "GAYA");
/// ```
pub fn to_query_form(display_name: &str) -> String {
    let upper = display_name.trim().to_uppercase();
    match QUERY_FORMS.get(upper.as_str()) {
        Some(query) => (*query).to_string(),
        None => upper,
    }
}

/// Map a query form (or any spelling variant) to the display form
///
/// Variants are first resolved to their query form, so "Purnia" and
/// "PURNEA" both display as "Purnea". Names outside the tables are
/// title-cased.
pub fn to_display_form(query_form: &str) -> String {
    let query = to_query_form(query_form);
    match DISPLAY_FORMS.get(query.as_str()) {
        Some(display) => (*display).to_string(),
        None => title_case(query_form),
    }
}

/// Store key for a district: its canonical display form
pub fn canonical_district(name: &str) -> String {
    to_display_form(name)
}

/// Map a reverse-geocoder district spelling to the upstream query form
pub fn geocoder_query_form(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    match GEOCODER_FORMS.get(upper.as_str()) {
        Some(query) => (*query).to_string(),
        None => upper,
    }
}

/// Whether location auto-detection covers this (state, district) pair
///
/// Both arguments are query forms.
pub fn is_supported_district(state: &str, district: &str) -> bool {
    state == SUPPORTED_STATE && SUPPORTED_DISTRICTS.contains(district)
}

/// Lower-case everything, then upper-case the first word character after
/// every word boundary ("kaimur (bhabua)" -> "Kaimur (Bhabua)")
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_boundary = true;

    for ch in input.trim().chars().flat_map(char::to_lowercase) {
        let is_word = ch.is_ascii_alphanumeric() || ch == '_';
        if is_word && at_boundary {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_boundary = !is_word;
    }

    out
}
