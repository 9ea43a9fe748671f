//! Uninstall record parsing
//!
//! Decodes the values stored under one `...\Uninstall\<key>` sub-key into an
//! [`InstalledProgram`]. Installers write these values inconsistently (missing
//! fields, numbers stored as text, dates in two representations), so every
//! field has a defined fallback and parsing never fails.
//!
//! # Coercion rules
//!
//! | Field | Text | Numeric | Other / absent |
//! |---|---|---|---|
//! | string fields | as stored | decimal string | default (`"Unknown"` or `""`) |
//! | `estimated_size_kb` | parsed integer, else 0 | value if non-negative, else 0 | 0 |
//! | `install_date` | `yyyyMMdd`, else clock's now; empty text is unset | seconds since 1970-01-01 | unset |

use crate::clock::{Clock, SystemClock};
use crate::store::RegistryValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder for missing name, version, and publisher fields
pub const UNKNOWN: &str = "Unknown";

/// `chrono` pattern for text install dates (`yyyyMMdd`)
///
/// `chrono` formats are locale-independent, so the pattern needs no culture.
pub const INSTALL_DATE_FORMAT: &str = "%Y%m%d";

/// Registry value names read from an uninstall key
pub mod fields {
    /// Program name shown in "Apps & features"
    pub const DISPLAY_NAME: &str = "DisplayName";
    /// Icon path, optionally with `,index`
    pub const DISPLAY_ICON: &str = "DisplayIcon";
    /// Program version string
    pub const DISPLAY_VERSION: &str = "DisplayVersion";
    /// Support link
    pub const HELP_LINK: &str = "HelpLink";
    /// Vendor name
    pub const PUBLISHER: &str = "Publisher";
    /// Command line that removes the program
    pub const UNINSTALL_STRING: &str = "UninstallString";
    /// Product web page
    pub const URL_INFO_ABOUT: &str = "URLInfoAbout";
    /// Free-form comments
    pub const COMMENTS: &str = "Comments";
    /// Support contact
    pub const CONTACT: &str = "Contact";
    /// Installation directory
    pub const INSTALL_LOCATION: &str = "InstallLocation";
    /// Install date, `yyyyMMdd` text or epoch seconds
    pub const INSTALL_DATE: &str = "InstallDate";
    /// Size on disk in KB
    pub const ESTIMATED_SIZE: &str = "EstimatedSize";
    /// Misspelled size value written by some installers
    pub const ESTIMATED_SIZE_LEGACY: &str = "EstimateSize";
}

/// Metadata an installed program registered about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledProgram {
    /// Name of the uninstall sub-key this record was read from (empty if unknown)
    pub key_name: String,
    /// User-visible program name
    pub display_name: String,
    /// Icon path
    pub display_icon: String,
    /// Version string
    pub display_version: String,
    /// Support link
    pub help_link: String,
    /// Vendor
    pub publisher: String,
    /// Command line that removes the program
    pub uninstall_command: String,
    /// Product web page
    pub info_url: String,
    /// Free-form comments
    pub comments: String,
    /// Support contact
    pub contact: String,
    /// Installation directory
    pub install_location: String,
    /// When the program was installed, if recorded
    pub install_date: Option<NaiveDateTime>,
    /// Estimated size on disk in KB
    pub estimated_size_kb: u64,
}

impl Default for InstalledProgram {
    /// The record produced from a key with no values
    fn default() -> Self {
        Self {
            key_name: String::new(),
            display_name: UNKNOWN.to_string(),
            display_icon: String::new(),
            display_version: UNKNOWN.to_string(),
            help_link: String::new(),
            publisher: UNKNOWN.to_string(),
            uninstall_command: String::new(),
            info_url: String::new(),
            comments: String::new(),
            contact: String::new(),
            install_location: String::new(),
            install_date: None,
            estimated_size_kb: 0,
        }
    }
}

/// Decodes raw uninstall-key values into [`InstalledProgram`] records
#[derive(Debug, Clone, Default)]
pub struct RecordParser<C = SystemClock> {
    clock: C,
}

impl RecordParser<SystemClock> {
    /// Parser using the system clock
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> RecordParser<C> {
    /// Parser using `clock` as the fallback for unparsable text dates
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Build a record from the values of one uninstall key
    pub fn parse(&self, values: &HashMap<String, RegistryValue>) -> InstalledProgram {
        InstalledProgram {
            key_name: String::new(),
            display_name: text_field(values, fields::DISPLAY_NAME, UNKNOWN),
            display_icon: text_field(values, fields::DISPLAY_ICON, ""),
            display_version: text_field(values, fields::DISPLAY_VERSION, UNKNOWN),
            help_link: text_field(values, fields::HELP_LINK, ""),
            publisher: text_field(values, fields::PUBLISHER, UNKNOWN),
            uninstall_command: text_field(values, fields::UNINSTALL_STRING, ""),
            info_url: text_field(values, fields::URL_INFO_ABOUT, ""),
            comments: text_field(values, fields::COMMENTS, ""),
            contact: text_field(values, fields::CONTACT, ""),
            install_location: text_field(values, fields::INSTALL_LOCATION, ""),
            install_date: self.install_date(lookup(values, fields::INSTALL_DATE)),
            estimated_size_kb: estimated_size(
                lookup(values, fields::ESTIMATED_SIZE)
                    .or_else(|| lookup(values, fields::ESTIMATED_SIZE_LEGACY)),
            ),
        }
    }

    /// Decode an `InstallDate` value
    ///
    /// Text that does not match `yyyyMMdd` resolves to the clock's current time,
    /// while a missing value (or empty text) stays unset.
    pub fn install_date(&self, value: Option<&RegistryValue>) -> Option<NaiveDateTime> {
        match value? {
            RegistryValue::Text(text) if text.is_empty() => None,
            RegistryValue::Text(text) => Some(parse_date_text(text).unwrap_or_else(|| {
                tracing::debug!("Unparsable install date '{text}', using current time");
                self.clock.now()
            })),
            RegistryValue::Numeric(seconds) => {
                let date = from_epoch_seconds(*seconds);
                if date.is_none() {
                    tracing::debug!("Install date {seconds} is out of range");
                }
                date
            }
            RegistryValue::Other(_) => None,
        }
    }
}

/// Look up a value by name, ignoring ASCII case like the registry does
fn lookup<'a>(values: &'a HashMap<String, RegistryValue>, name: &str) -> Option<&'a RegistryValue> {
    values.get(name).or_else(|| {
        values
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn text_field(values: &HashMap<String, RegistryValue>, name: &str, default: &str) -> String {
    match lookup(values, name) {
        Some(RegistryValue::Text(text)) => text.clone(),
        Some(RegistryValue::Numeric(n)) => n.to_string(),
        Some(RegistryValue::Other(_)) | None => default.to_string(),
    }
}

fn estimated_size(value: Option<&RegistryValue>) -> u64 {
    match value {
        Some(RegistryValue::Numeric(n)) => u64::try_from(*n).unwrap_or(0),
        Some(RegistryValue::Text(text)) => text.trim().parse().unwrap_or(0),
        Some(RegistryValue::Other(_)) | None => 0,
    }
}

/// Parse exactly eight ASCII digits as `yyyyMMdd`
///
/// Years start at 0001; `0000` is rejected.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) || text.starts_with("0000") {
        return None;
    }
    NaiveDate::parse_from_str(text, INSTALL_DATE_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Unix epoch plus `seconds`, `None` if outside the representable range
pub fn from_epoch_seconds(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}
