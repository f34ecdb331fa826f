//! Selector-based record extraction
//!
//! Backs the CLI: each `[extract]` entry maps a field name to a CSS selector,
//! and the field value is the trimmed text of the first matching element.

use crate::crawler::ItemHook;
use crate::fetch::Page;
use crate::output::Record;
use crate::{ConfigError, ConfigResult};
use scraper::Selector;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds an item hook that extracts one text value per configured field
///
/// Pages where no selector matches produce no record.
///
/// # Returns
///
/// * `Ok(ItemHook)` - Hook ready to hand to the crawler
/// * `Err(ConfigError::Validation)` - A selector does not parse
pub fn selector_extractor(fields: &BTreeMap<String, String>) -> ConfigResult<ItemHook> {
    let fields = fields
        .iter()
        .map(|(field, selector)| {
            Selector::parse(selector)
                .map(|parsed| (field.clone(), parsed))
                .map_err(|e| {
                    ConfigError::Validation(format!(
                        "Invalid selector for extract field '{}': {:?}",
                        field, e
                    ))
                })
        })
        .collect::<ConfigResult<Vec<(String, Selector)>>>()?;

    Ok(Arc::new(move |page: &Page| extract_fields(page, &fields)))
}

fn extract_fields(page: &Page, fields: &[(String, Selector)]) -> Option<Record> {
    let document = page.html();
    let mut record = Record::new();

    for (field, selector) in fields {
        if let Some(element) = document.select(selector).next() {
            let text = element.text().collect::<String>().trim().to_string();
            record.insert(field.clone(), Value::String(text));
        }
    }

    if record.is_empty() {
        None
    } else {
        Some(record)
    }
}
