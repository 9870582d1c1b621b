//! Shirt create/edit form.
//!
//! The form carries the submitted text exactly as typed so that a failed
//! submission can be re-rendered unchanged. [`ShirtForm::validate`] turns it
//! into a [`ShirtInput`] or a set of field errors; nothing is saved unless
//! every field passes.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use super::types::ValidationErrors;
use crate::models::{Shirt, ShirtInput};

/// Column limits, matching the `shirt` table.
pub const TEAM_MAX_CHARS: usize = 100;
pub const PLAYER_MAX_CHARS: usize = 100;
pub const SEASON_MAX_CHARS: usize = 20;

/// `NUMERIC(10, 2)`: two fractional digits, eight integer digits.
const VALUE_DECIMAL_PLACES: u32 = 2;
const VALUE_MAX_INTEGER_DIGITS: u32 = 8;

const REQUIRED: &str = "This field is required.";

/// Raw shirt form values.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ShirtForm {
    pub team: String,
    pub player: String,
    pub season: String,
    pub purchase_details: String,
    pub estimated_value: String,
    pub personal_notes: String,
    pub external_ref: String,
    pub is_public: bool,
}

impl ShirtForm {
    /// Prefill from a stored shirt for editing.
    pub fn from_shirt(shirt: &Shirt) -> Self {
        Self {
            team: shirt.team.clone(),
            player: shirt.player.clone(),
            season: shirt.season.clone(),
            purchase_details: shirt.purchase_details.clone().unwrap_or_default(),
            estimated_value: shirt
                .estimated_value
                .map(|v| v.to_string())
                .unwrap_or_default(),
            personal_notes: shirt.personal_notes.clone().unwrap_or_default(),
            external_ref: shirt.external_ref.clone().unwrap_or_default(),
            is_public: shirt.is_public,
        }
    }

    /// Assign a submitted text field by name. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "team" => self.team = value,
            "player" => self.player = value,
            "season" => self.season = value,
            "purchase_details" => self.purchase_details = value,
            "estimated_value" => self.estimated_value = value,
            "personal_notes" => self.personal_notes = value,
            "external_ref" => self.external_ref = value,
            "is_public" => self.is_public = is_checked(&value),
            _ => {}
        }
    }

    /// Validate every field, collecting all errors.
    pub fn validate(&self) -> Result<ShirtInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let team = required_text(&mut errors, "team", &self.team, TEAM_MAX_CHARS);
        let player = required_text(&mut errors, "player", &self.player, PLAYER_MAX_CHARS);
        let season = required_text(&mut errors, "season", &self.season, SEASON_MAX_CHARS);

        let estimated_value = match parse_value(&self.estimated_value) {
            Ok(value) => value,
            Err(message) => {
                errors.add("estimated_value", message);
                None
            }
        };

        let input = ShirtInput {
            team,
            player,
            season,
            purchase_details: optional_text(&self.purchase_details),
            estimated_value,
            personal_notes: optional_text(&self.personal_notes),
            external_ref: optional_text(&self.external_ref),
            is_public: self.is_public,
        };

        errors.into_result(input)
    }
}

/// HTML checkbox semantics: present with any of the usual "on" values.
fn is_checked(value: &str) -> bool {
    matches!(value.trim(), "on" | "true" | "1" | "yes")
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    max_chars: usize,
) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, REQUIRED);
    } else if trimmed.chars().count() > max_chars {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {max_chars} characters (it has {}).",
                trimmed.chars().count()
            ),
        );
    }
    trimmed.to_string()
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse the optional estimated value.
fn parse_value(raw: &str) -> Result<Option<Decimal>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let value = Decimal::from_str(raw).map_err(|_| "Enter a number.".to_string())?;

    if value < Decimal::ZERO {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    if value.scale() > VALUE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {VALUE_DECIMAL_PLACES} decimal places."
        ));
    }
    if value.trunc() >= Decimal::from(10_i64.pow(VALUE_MAX_INTEGER_DIGITS)) {
        return Err(format!(
            "Ensure that there are no more than {VALUE_MAX_INTEGER_DIGITS} digits before the decimal point."
        ));
    }

    let mut value = value;
    value.rescale(VALUE_DECIMAL_PLACES);
    Ok(Some(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn valid_form() -> ShirtForm {
        ShirtForm {
            team: "AS Roma".to_string(),
            player: "Francesco Totti".to_string(),
            season: "2000/01".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_form_is_valid_and_private() {
        let input = valid_form().validate().unwrap();
        assert_eq!(input.team, "AS Roma");
        assert!(!input.is_public);
        assert_eq!(input.estimated_value, None);
        assert_eq!(input.purchase_details, None);
    }

    #[test]
    fn required_fields_are_reported_together() {
        let errors = ShirtForm::default().validate().unwrap_err();
        assert!(errors.has("team"));
        assert!(errors.has("player"));
        assert!(errors.has("season"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn text_is_trimmed_and_blank_optional_fields_are_none() {
        let mut form = valid_form();
        form.team = "  Lazio  ".to_string();
        form.personal_notes = "   ".to_string();
        form.external_ref = " https://example.com/shirt ".to_string();

        let input = form.validate().unwrap();
        assert_eq!(input.team, "Lazio");
        assert_eq!(input.personal_notes, None);
        assert_eq!(
            input.external_ref.as_deref(),
            Some("https://example.com/shirt")
        );
    }

    #[test]
    fn overlong_season_is_rejected() {
        let mut form = valid_form();
        form.season = "x".repeat(SEASON_MAX_CHARS + 1);
        let errors = form.validate().unwrap_err();
        assert!(errors.has("season"));
    }

    #[test]
    fn season_is_free_form() {
        for season in ["1998/99", "2021-2022", "Home 1990", "?"] {
            let mut form = valid_form();
            form.season = season.to_string();
            assert!(form.validate().is_ok(), "{season}");
        }
    }

    #[test]
    fn estimated_value_is_stored_with_two_decimals() {
        let mut form = valid_form();
        form.estimated_value = "120.5".to_string();
        let value = form.validate().unwrap().estimated_value.unwrap();
        assert_eq!(value.to_string(), "120.50");
    }

    #[test]
    fn estimated_value_rules() {
        for (raw, ok) in [
            ("0", true),
            ("99999999.99", true),
            ("-1", false),
            ("abc", false),
            ("1.234", false),
            ("100000000", false),
        ] {
            let mut form = valid_form();
            form.estimated_value = raw.to_string();
            assert_eq!(form.validate().is_ok(), ok, "{raw}");
        }
    }

    #[test]
    fn set_maps_field_names() {
        let mut form = ShirtForm::default();
        form.set("team", "Napoli".to_string());
        form.set("is_public", "on".to_string());
        form.set("owner_id", "someone-else".to_string());
        assert_eq!(form.team, "Napoli");
        assert!(form.is_public);
    }

    #[test]
    fn from_shirt_round_trips_through_validation() {
        let shirt = Shirt {
            id: uuid::Uuid::now_v7(),
            owner_id: uuid::Uuid::now_v7(),
            team: "Milan".to_string(),
            player: "Maldini".to_string(),
            season: "1993/94".to_string(),
            photo_uri: "local://shirts/m.jpg".to_string(),
            purchase_details: Some("Flea market".to_string()),
            estimated_value: Some(Decimal::new(25000, 2)),
            personal_notes: None,
            external_ref: None,
            is_public: true,
            created: chrono::Utc::now(),
        };

        let form = ShirtForm::from_shirt(&shirt);
        assert_eq!(form.estimated_value, "250.00");

        let input = form.validate().unwrap();
        assert_eq!(input.estimated_value, shirt.estimated_value);
        assert_eq!(input.purchase_details, shirt.purchase_details);
        assert!(input.is_public);
    }
}
