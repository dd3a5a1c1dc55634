//! Display names for contact folders.

use crate::models::ContactId;
use lazy_static::lazy_static;
use regex::Regex;

const CAMEL_BOUNDARY_PATTERN: &str = r"(\w)([A-Z])";

/// Turns a contact folder into a human readable name.
pub trait DisplayNameFormatter {
    fn display_name(&self, contact: &ContactId) -> String;
}

/// Splits concatenated names on interior capitals: `AnnaMaria_x1` becomes `Anna Maria`.
///
/// This is a rough heuristic. Only ASCII capitals start a new word, so names
/// such as `ÉmileZola` keep their first boundary, and runs of capitals are
/// split pairwise from the left (`ABC` becomes `A BC`). Two distinct folders
/// can end up with the same display name.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseSplitter;

impl DisplayNameFormatter for CamelCaseSplitter {
    fn display_name(&self, contact: &ContactId) -> String {
        lazy_static! {
            static ref CAMEL_BOUNDARY_RE: Regex = Regex::new(CAMEL_BOUNDARY_PATTERN).unwrap();
        }

        CAMEL_BOUNDARY_RE
            .replace_all(contact.stem(), "$1 $2")
            .into_owned()
    }
}

/// Keeps the folder stem untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct StemOnly;

impl DisplayNameFormatter for StemOnly {
    fn display_name(&self, contact: &ContactId) -> String {
        contact.stem().to_string()
    }
}
