//! # alerthub-entity
//!
//! Domain entity models for AlertHub. Every struct in this crate represents a
//! database table row or a domain value object. Database entities derive
//! `sqlx::FromRow`; nested structures are stored as JSONB columns.

pub mod acknowledgment;
pub mod escalation;
pub mod notification;
pub mod user;

/// Implements `as_str`, `Display`, `FromStr` and an `ALL` listing for a
/// snake_case vocabulary enum.
macro_rules! vocabulary {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the value as its wire string.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = alerthub_core::AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(alerthub_core::AppError::validation(format!(
                        "Invalid {}: '{s}'. Expected one of: {}",
                        $what,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

pub(crate) use vocabulary;
