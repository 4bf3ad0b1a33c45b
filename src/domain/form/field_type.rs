//! Field type classification.
//!
//! Two closed sets drive collection behavior everywhere: which types are
//! collectable at all, and which of those are "complex" (answered through a
//! structured widget rather than free text). Panels are containers; they are
//! recursed into during flattening but never collected themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of form field types under collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    TextInput,
    MultilineInput,
    NumberInput,
    Email,
    Password,
    Tel,
    Url,
    DateInput,
    DatetimeInput,
    FileInput,
    DropDown,
    RadioGroup,
    CheckboxGroup,
    Checkbox,
    Range,
    Color,
    Captcha,
    Panel,
}

/// Widget flavor used when a complex field is prompted for individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    /// Yes/no toggle (single checkbox).
    Boolean,
    /// Pick from an option list (dropdown, radio group, checkbox group).
    Choice,
    /// Dedicated input control (date, file, range, color, ...).
    Field,
}

impl FieldType {
    /// Maps a raw definition type onto the closed set.
    ///
    /// Accepts both the canonical kebab-case names and the generic HTML
    /// input aliases (`text`, `textarea`, `select`, ...). Unknown types
    /// fall back to `TextInput` so a definition with exotic widgets still
    /// collects as free text.
    pub fn from_input_type(raw: &str) -> Self {
        match raw {
            "text" | "text-input" => Self::TextInput,
            "textarea" | "multiline-input" => Self::MultilineInput,
            "number" | "number-input" => Self::NumberInput,
            "email" => Self::Email,
            "password" => Self::Password,
            "tel" | "phone" => Self::Tel,
            "url" => Self::Url,
            "date" | "date-input" => Self::DateInput,
            "time" | "datetime" | "datetime-input" => Self::DatetimeInput,
            "file" | "file-input" => Self::FileInput,
            "select" | "select-one" | "drop-down" => Self::DropDown,
            "radio" | "radio-group" => Self::RadioGroup,
            "checkbox" | "checkbox-group" => Self::CheckboxGroup,
            "boolean" => Self::Checkbox,
            "range" => Self::Range,
            "color" => Self::Color,
            "captcha" => Self::Captcha,
            "panel" => Self::Panel,
            _ => Self::TextInput,
        }
    }

    /// True for container types that hold child fields.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Panel)
    }

    /// True if values of this type are collected through the conversation.
    ///
    /// Everything in the closed set except panels.
    pub fn is_collectable(&self) -> bool {
        !self.is_container()
    }

    /// True for types answered through a structured widget, never bundled
    /// into a free-text group question.
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            Self::DropDown
                | Self::RadioGroup
                | Self::CheckboxGroup
                | Self::Checkbox
                | Self::DateInput
                | Self::DatetimeInput
                | Self::FileInput
                | Self::Range
                | Self::Color
        )
    }

    /// Widget flavor for prompting a complex field individually.
    ///
    /// Returns `None` for simple types, which are asked in free text.
    pub fn widget_kind(&self) -> Option<WidgetKind> {
        if !self.is_complex() {
            return None;
        }
        Some(match self {
            Self::Checkbox => WidgetKind::Boolean,
            Self::DropDown | Self::RadioGroup | Self::CheckboxGroup => WidgetKind::Choice,
            _ => WidgetKind::Field,
        })
    }

    /// The canonical kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextInput => "text-input",
            Self::MultilineInput => "multiline-input",
            Self::NumberInput => "number-input",
            Self::Email => "email",
            Self::Password => "password",
            Self::Tel => "tel",
            Self::Url => "url",
            Self::DateInput => "date-input",
            Self::DatetimeInput => "datetime-input",
            Self::FileInput => "file-input",
            Self::DropDown => "drop-down",
            Self::RadioGroup => "radio-group",
            Self::CheckboxGroup => "checkbox-group",
            Self::Checkbox => "checkbox",
            Self::Range => "range",
            Self::Color => "color",
            Self::Captcha => "captcha",
            Self::Panel => "panel",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod classification {
        use super::*;

        #[test]
        fn complex_set_is_exactly_the_widget_types() {
            let complex = [
                FieldType::DropDown,
                FieldType::RadioGroup,
                FieldType::CheckboxGroup,
                FieldType::Checkbox,
                FieldType::DateInput,
                FieldType::DatetimeInput,
                FieldType::FileInput,
                FieldType::Range,
                FieldType::Color,
            ];
            for ft in complex {
                assert!(ft.is_complex(), "{} should be complex", ft);
            }

            let simple = [
                FieldType::TextInput,
                FieldType::MultilineInput,
                FieldType::NumberInput,
                FieldType::Email,
                FieldType::Password,
                FieldType::Tel,
                FieldType::Url,
                FieldType::Captcha,
            ];
            for ft in simple {
                assert!(!ft.is_complex(), "{} should be simple", ft);
            }
        }

        #[test]
        fn panel_is_a_container_and_never_collectable() {
            assert!(FieldType::Panel.is_container());
            assert!(!FieldType::Panel.is_collectable());
            assert!(!FieldType::Panel.is_complex());
        }

        #[test]
        fn every_leaf_type_is_collectable() {
            assert!(FieldType::TextInput.is_collectable());
            assert!(FieldType::Checkbox.is_collectable());
            assert!(FieldType::Captcha.is_collectable());
        }
    }

    mod widget_kinds {
        use super::*;

        #[test]
        fn single_checkbox_prompts_as_boolean() {
            assert_eq!(FieldType::Checkbox.widget_kind(), Some(WidgetKind::Boolean));
        }

        #[test]
        fn option_lists_prompt_as_choice() {
            assert_eq!(FieldType::DropDown.widget_kind(), Some(WidgetKind::Choice));
            assert_eq!(FieldType::RadioGroup.widget_kind(), Some(WidgetKind::Choice));
            assert_eq!(
                FieldType::CheckboxGroup.widget_kind(),
                Some(WidgetKind::Choice)
            );
        }

        #[test]
        fn remaining_complex_types_prompt_as_field() {
            assert_eq!(FieldType::DateInput.widget_kind(), Some(WidgetKind::Field));
            assert_eq!(FieldType::FileInput.widget_kind(), Some(WidgetKind::Field));
            assert_eq!(FieldType::Range.widget_kind(), Some(WidgetKind::Field));
            assert_eq!(FieldType::Color.widget_kind(), Some(WidgetKind::Field));
        }

        #[test]
        fn simple_types_have_no_widget() {
            assert_eq!(FieldType::Email.widget_kind(), None);
            assert_eq!(FieldType::TextInput.widget_kind(), None);
        }
    }

    mod wire_names {
        use super::*;

        #[test]
        fn serializes_to_kebab_case() {
            let json = serde_json::to_string(&FieldType::DropDown).unwrap();
            assert_eq!(json, "\"drop-down\"");
            let json = serde_json::to_string(&FieldType::DatetimeInput).unwrap();
            assert_eq!(json, "\"datetime-input\"");
        }

        #[test]
        fn deserializes_from_kebab_case() {
            let ft: FieldType = serde_json::from_str("\"checkbox-group\"").unwrap();
            assert_eq!(ft, FieldType::CheckboxGroup);
        }

        #[test]
        fn maps_generic_html_aliases() {
            assert_eq!(FieldType::from_input_type("text"), FieldType::TextInput);
            assert_eq!(
                FieldType::from_input_type("textarea"),
                FieldType::MultilineInput
            );
            assert_eq!(FieldType::from_input_type("select"), FieldType::DropDown);
            assert_eq!(FieldType::from_input_type("radio"), FieldType::RadioGroup);
            assert_eq!(
                FieldType::from_input_type("checkbox"),
                FieldType::CheckboxGroup
            );
            assert_eq!(FieldType::from_input_type("boolean"), FieldType::Checkbox);
            assert_eq!(FieldType::from_input_type("time"), FieldType::DatetimeInput);
        }

        #[test]
        fn unknown_types_fall_back_to_text_input() {
            assert_eq!(
                FieldType::from_input_type("signature-pad"),
                FieldType::TextInput
            );
        }

        #[test]
        fn display_matches_wire_name() {
            assert_eq!(FieldType::RadioGroup.to_string(), "radio-group");
        }
    }
}
