//! Enumerated columns stored as short strings, each with a Persian display label.

/// A closed set of stored values with display labels.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    /// Value as stored in the database and sent on the wire
    fn value(&self) -> &'static str;

    /// Localized display label
    fn label(&self) -> &'static str;

    /// Accepts either the stored value (case-insensitive) or the display label.
    fn parse_choice(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.value().eq_ignore_ascii_case(input) || c.label() == input)
    }

    fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(|c| c.value())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Declares a string-backed active enum together with its `Choice` impl.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => ($value:tt, $label:tt)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::utoipa::ToSchema,
            ::sea_orm::DeriveActiveEnum,
            ::sea_orm::EnumIter,
        )]
        #[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
        pub enum $name {
            $(
                #[sea_orm(string_value = $value)]
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $crate::entities::choice::Choice for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn value(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", $crate::entities::choice::Choice::value(self))
            }
        }
    };
}

pub(crate) use choice_enum;

/// Shown wherever a related record is missing.
pub const UNKNOWN_LABEL: &str = "نامشخص";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CallStatus, InstallmentStatus, ProfileStatus, ProfileType};

    #[test]
    fn test_parse_by_value_and_label() {
        assert_eq!(ProfileType::parse_choice("term-based"), Some(ProfileType::TermBased));
        assert_eq!(ProfileType::parse_choice("خودخوان"), Some(ProfileType::SelfStudy));
        assert_eq!(ProfileStatus::parse_choice(" OPTOUT "), Some(ProfileStatus::Optout));
        assert_eq!(ProfileStatus::parse_choice("معلق"), Some(ProfileStatus::Suspended));
        assert_eq!(ProfileStatus::parse_choice("archived"), None);
        assert_eq!(ProfileType::parse_choice(""), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(InstallmentStatus::Paid.label(), "پرداخت شده");
        assert_eq!(CallStatus::NotAnswered.value(), "not_answered");
        assert_eq!(CallStatus::NotAnswered.label(), "بی‌پاسخ");
        assert_eq!(ProfileStatus::Active.to_string(), "active");
    }

    #[test]
    fn test_allowed_values() {
        assert_eq!(ProfileStatus::allowed_values(), "active, suspended, optout");
    }

    #[test]
    fn test_serde_uses_stored_value() {
        let json = serde_json::to_string(&ProfileType::TermBased).unwrap();
        assert_eq!(json, "\"term-based\"");
        let parsed: CallStatus = serde_json::from_str("\"successful\"").unwrap();
        assert_eq!(parsed, CallStatus::Successful);
    }
}
